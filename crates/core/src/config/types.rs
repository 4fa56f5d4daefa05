use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub list: ListConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Attach a permissive CORS layer to every route.
    #[serde(default)]
    pub cors_allow_everyone: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allow_everyone: false,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Upstream index API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the index API (e.g., "http://localhost:3000")
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("mirrorview/{}", env!("CARGO_PKG_VERSION"))
}

/// Data-fetch cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// How long a list page is served without re-fetching.
    #[serde(default = "default_list_stale_secs")]
    pub list_stale_secs: u64,
    /// Staleness threshold for every other query (0 = always re-fetch).
    #[serde(default)]
    pub stale_secs: u64,
    /// Retries after the first failed attempt.
    #[serde(default = "default_retry")]
    pub retry: u32,
    /// Fixed delay between attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_stale_secs: default_list_stale_secs(),
            stale_secs: 0,
            retry: default_retry(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_list_stale_secs() -> u64 {
    5 * 60
}

fn default_retry() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

/// Listing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListConfig {
    /// Items per page when the URL does not say otherwise.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Pages shown past the current one when the backend reports no total.
    #[serde(default = "default_lookahead_pages")]
    pub lookahead_pages: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            lookahead_pages: default_lookahead_pages(),
        }
    }
}

fn default_page_size() -> u32 {
    75
}

fn default_lookahead_pages() -> u32 {
    5
}

/// Sanitized config for API responses (credentials redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub api: SanitizedApiConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub list: ListConfig,
}

/// Sanitized API config (URL password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedApiConfig {
    pub url: String,
    pub credentials_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let (url, credentials_configured) = redact_url(&config.api.url);
        Self {
            api: SanitizedApiConfig {
                url,
                credentials_configured,
                timeout_secs: config.api.timeout_secs,
            },
            server: config.server.clone(),
            cache: config.cache.clone(),
            list: config.list.clone(),
        }
    }
}

/// Strip userinfo from a URL, reporting whether any was present.
fn redact_url(raw: &str) -> (String, bool) {
    match reqwest::Url::parse(raw) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            let _ = url.set_username("");
            let _ = url.set_password(None);
            (url.to_string(), true)
        }
        _ => (raw.to_string(), false),
    }
}
