//! reqwest-backed index API client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::metrics;

use super::{
    parse_response, ActionEvent, ApiError, DailyCount, HealthResponse, IndexApi, MagnetResponse,
    MirrorItemDetail, MirrorListRequest, MirrorListResponse, MirrorsResponse, TorrentDetail,
    TorrentListRequest, TorrentListResponse,
};

/// Index API client over HTTP.
pub struct HttpIndexApi {
    client: Client,
    base_url: String,
}

impl HttpIndexApi {
    /// Create a client with the configured timeout and user agent.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn mirror_url(&self, mirror: &str, rest: &str) -> String {
        self.url(&format!(
            "/api/mirror/{}{}",
            urlencoding::encode(mirror),
            rest
        ))
    }

    /// Send a request and parse the body, recording the outcome under `endpoint`.
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            metrics::UPSTREAM_REQUESTS
                .with_label_values(&[endpoint, "error"])
                .inc();
            warn!(endpoint = endpoint, error = %e, "Index API request failed");
            if e.is_timeout() {
                ApiError::Timeout
            } else if e.is_connect() {
                ApiError::ConnectionFailed(e.to_string())
            } else {
                ApiError::Request(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        metrics::UPSTREAM_REQUESTS
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Request(format!("Failed to read response body: {}", e)))?;

        debug!(
            endpoint = endpoint,
            status = status,
            bytes = body.len(),
            "Index API response"
        );

        parse_response(status, &body)
    }
}

#[async_trait]
impl IndexApi for HttpIndexApi {
    fn name(&self) -> &str {
        "http"
    }

    async fn mirrors(&self) -> Result<MirrorsResponse, ApiError> {
        self.send("mirrors", self.client.get(self.url("/api/mirror")))
            .await
    }

    async fn list(
        &self,
        mirror: &str,
        request: &MirrorListRequest,
    ) -> Result<MirrorListResponse, ApiError> {
        let builder = self
            .client
            .get(self.mirror_url(mirror, "/list"))
            .query(request);
        self.send("list", builder).await
    }

    async fn view(&self, mirror: &str, id: u64) -> Result<MirrorItemDetail, ApiError> {
        let url = self.mirror_url(mirror, &format!("/view/{}", id));
        self.send("view", self.client.get(url)).await
    }

    async fn magnet(&self, mirror: &str, id: u64) -> Result<MagnetResponse, ApiError> {
        let url = self.mirror_url(mirror, &format!("/magnet/{}", id));
        self.send("magnet", self.client.get(url)).await
    }

    async fn torrents(
        &self,
        request: &TorrentListRequest,
    ) -> Result<TorrentListResponse, ApiError> {
        let builder = self.client.post(self.url("/api/torrents")).json(request);
        self.send("torrents", builder).await
    }

    async fn torrent(&self, id: &str) -> Result<TorrentDetail, ApiError> {
        let url = self.url(&format!("/api/torrent/{}", urlencoding::encode(id)));
        self.send("torrent", self.client.get(url)).await
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.send("health", self.client.get(self.url("/api/health")))
            .await
    }

    async fn torrents_per_day(&self) -> Result<Vec<DailyCount>, ApiError> {
        let url = self.url("/api/stats/torrents-per-day");
        self.send("torrents_per_day", self.client.get(url)).await
    }

    async fn actions(&self) -> Result<Vec<ActionEvent>, ApiError> {
        let url = self.url("/api/stats/actions");
        self.send("actions", self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ApiConfig {
        ApiConfig {
            url: url.to_string(),
            timeout_secs: 5,
            user_agent: "mirrorview-test".to_string(),
        }
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpIndexApi::new(&config("http://localhost:3000/")).unwrap();
        assert_eq!(api.base_url(), "http://localhost:3000");
        assert_eq!(api.url("/api/mirror"), "http://localhost:3000/api/mirror");
    }

    #[test]
    fn test_mirror_url_encodes_id() {
        let api = HttpIndexApi::new(&config("http://localhost:3000")).unwrap();
        assert_eq!(
            api.mirror_url("my mirror", "/view/7"),
            "http://localhost:3000/api/mirror/my%20mirror/view/7"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_error() {
        // Port 9 (discard) is not listening in test environments.
        let api = HttpIndexApi::new(&config("http://127.0.0.1:9")).unwrap();
        let err = api.mirrors().await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
