use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::CacheConfig;

/// Identity of a cached query: a scope plus ordered parameter parts.
///
/// Two keys are equal only when every part is equal, so callers must build
/// parts from normalized values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    scope: &'static str,
    parts: Vec<String>,
}

impl QueryKey {
    pub fn new(scope: &'static str) -> Self {
        Self {
            scope,
            parts: Vec::new(),
        }
    }

    /// Append one part.
    pub fn part(mut self, part: impl ToString) -> Self {
        self.parts.push(part.to_string());
        self
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scope)?;
        for part in &self.parts {
            write!(f, "/{}", part)?;
        }
        Ok(())
    }
}

/// Staleness and retry policy for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// A stored value younger than this is served without fetching.
    pub stale_time: Duration,
    /// Attempts after the first failed one.
    pub retry: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retry: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl FetchOptions {
    /// Policy for list pages: served from cache for five minutes.
    pub fn list() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            ..Self::default()
        }
    }

    /// Policy for non-list queries from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            stale_time: Duration::from_secs(config.stale_secs),
            retry: config.retry,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Policy for list pages from configuration.
    pub fn list_from_config(config: &CacheConfig) -> Self {
        Self {
            stale_time: Duration::from_secs(config.list_stale_secs),
            ..Self::from_config(config)
        }
    }

    pub fn with_retry(mut self, retry: u32, retry_delay: Duration) -> Self {
        self.retry = retry;
        self.retry_delay = retry_delay;
        self
    }

    /// Total attempts a fetch may make.
    pub fn max_attempts(&self) -> u32 {
        self.retry.saturating_add(1)
    }
}

/// Errors surfaced by `QueryCache::fetch`.
///
/// Cloneable because every waiter on a shared fetch receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Fetch of {key} failed after {attempts} attempt(s): {message}")]
    Failed {
        key: String,
        attempts: u32,
        message: String,
    },

    #[error("Cached value for {key} has a different type than requested")]
    TypeMismatch { key: String },

    #[error("Fetch task for {key} stopped before finishing: {message}")]
    Aborted { key: String, message: String },
}

impl FetchError {
    /// Human-readable detail without the key prefix.
    pub fn message(&self) -> &str {
        match self {
            FetchError::Failed { message, .. } | FetchError::Aborted { message, .. } => message,
            FetchError::TypeMismatch { .. } => "cached value has an unexpected type",
        }
    }
}

/// Error returned by a fetcher.
///
/// Fetches retry only errors that report themselves as retryable.
pub trait FetchFailure: fmt::Display {
    fn is_retryable(&self) -> bool {
        true
    }
}

impl FetchFailure for String {}

impl FetchFailure for &'static str {}

/// Counters over the lifetime of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Lookups that joined a fetch already in flight.
    pub shared: u64,
    /// Fetcher invocations that started a new fetch.
    pub fetches: u64,
    /// Fetches that failed after all retries.
    pub failures: u64,
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub fetching: bool,
    /// Age of the stored value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<u64>,
    /// Message of the last failed fetch; cleared by the next success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of fetches started for this key.
    pub fetches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = QueryKey::new("list").part("nyaa").part(1).part("0_0");
        assert_eq!(key.to_string(), "list/nyaa/1/0_0");
        assert_eq!(key.scope(), "list");
        assert_eq!(key.parts().len(), 3);
    }

    #[test]
    fn test_key_equality_is_structural() {
        // "a/b" as one part must not collide with "a" then "b".
        let joined = QueryKey::new("x").part("a/b");
        let split = QueryKey::new("x").part("a").part("b");
        assert_ne!(joined, split);
    }

    #[test]
    fn test_option_presets() {
        let default = FetchOptions::default();
        assert_eq!(default.stale_time, Duration::ZERO);
        assert_eq!(default.retry, 3);
        assert_eq!(default.max_attempts(), 4);
        assert_eq!(default.retry_delay, Duration::from_secs(1));

        let list = FetchOptions::list();
        assert_eq!(list.stale_time, Duration::from_secs(300));
        assert_eq!(list.retry, 3);
    }

    #[test]
    fn test_options_from_config() {
        let config = CacheConfig {
            list_stale_secs: 60,
            stale_secs: 5,
            retry: 1,
            retry_delay_ms: 250,
        };
        let list = FetchOptions::list_from_config(&config);
        assert_eq!(list.stale_time, Duration::from_secs(60));
        assert_eq!(list.retry, 1);
        assert_eq!(list.retry_delay, Duration::from_millis(250));

        let other = FetchOptions::from_config(&config);
        assert_eq!(other.stale_time, Duration::from_secs(5));
    }
}
