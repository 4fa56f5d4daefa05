//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Data-fetch cache (hits, misses, shared in-flight waits)
//! - Fetch attempts and retries
//! - Upstream index API requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by scope and outcome.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirrorview_cache_lookups_total", "Total cache lookups"),
        &["scope", "result"], // "hit", "miss", "shared"
    )
    .unwrap()
});

/// Number of keys currently held by the cache.
pub static CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mirrorview_cache_entries", "Number of cache entries").unwrap()
});

// =============================================================================
// Fetch Metrics
// =============================================================================

/// Fetch attempts by scope and outcome.
pub static FETCH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirrorview_fetch_attempts_total", "Total fetch attempts"),
        &["scope", "outcome"], // "success", "failure"
    )
    .unwrap()
});

/// Fetches that failed after exhausting every retry.
pub static FETCH_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mirrorview_fetch_failures_total",
            "Fetches that failed after all retries",
        ),
        &["scope"],
    )
    .unwrap()
});

/// Duration of a whole fetch including retries.
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mirrorview_fetch_duration_seconds",
            "Duration of fetches including retries",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["scope"],
    )
    .unwrap()
});

// =============================================================================
// Upstream Metrics
// =============================================================================

/// Upstream index API requests by endpoint and status.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mirrorview_upstream_requests_total",
            "Total requests sent to the index API",
        ),
        &["endpoint", "status"], // "ok", "error", or the HTTP status code
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CACHE_ENTRIES.clone()),
        // Fetch
        Box::new(FETCH_ATTEMPTS.clone()),
        Box::new(FETCH_FAILURES.clone()),
        Box::new(FETCH_DURATION.clone()),
        // Upstream
        Box::new(UPSTREAM_REQUESTS.clone()),
    ]
}
