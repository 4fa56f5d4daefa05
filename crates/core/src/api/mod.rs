//! Index API client abstraction.
//!
//! This module provides an `IndexApi` trait over the external REST API that
//! serves mirrors, listings, item details and health data, plus an HTTP
//! implementation built on reqwest.

mod http;
mod types;

pub use http::HttpIndexApi;
pub use types::*;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::cache::FetchFailure;

/// Errors that can occur while talking to the index API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Index API connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Index API request timed out")]
    Timeout,

    #[error("Index API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse index API response: {0}")]
    Parse(String),

    #[error("Index API request failed: {0}")]
    Request(String),
}

impl ApiError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::ConnectionFailed(_) | ApiError::Timeout | ApiError::Request(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::Parse(_) => false,
        }
    }
}

impl FetchFailure for ApiError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// Map a raw response into a typed value.
///
/// Non-success statuses become `ApiError::Status` with the body truncated to
/// 200 characters.
pub fn parse_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            body: body.chars().take(200).collect(),
        });
    }
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Read access to the index API.
#[async_trait]
pub trait IndexApi: Send + Sync {
    /// Name of this backend for logging.
    fn name(&self) -> &str;

    /// Every mirror known to the proxy, hidden ones included.
    async fn mirrors(&self) -> Result<MirrorsResponse, ApiError>;

    /// One page of a mirror listing.
    async fn list(
        &self,
        mirror: &str,
        request: &MirrorListRequest,
    ) -> Result<MirrorListResponse, ApiError>;

    /// Detail of one item on a mirror.
    async fn view(&self, mirror: &str, id: u64) -> Result<MirrorItemDetail, ApiError>;

    /// Magnet link of one item on a mirror.
    async fn magnet(&self, mirror: &str, id: u64) -> Result<MagnetResponse, ApiError>;

    /// One page of the direct index listing.
    async fn torrents(&self, request: &TorrentListRequest)
        -> Result<TorrentListResponse, ApiError>;

    async fn torrent(&self, id: &str) -> Result<TorrentDetail, ApiError>;

    async fn health(&self) -> Result<HealthResponse, ApiError>;

    async fn torrents_per_day(&self) -> Result<Vec<DailyCount>, ApiError>;

    async fn actions(&self) -> Result<Vec<ActionEvent>, ApiError>;
}
