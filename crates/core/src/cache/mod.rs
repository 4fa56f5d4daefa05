//! Keyed data-fetch cache with request de-duplication.
//!
//! `QueryCache` stores one value per `QueryKey` and makes sure at most one
//! fetch per key is in flight: concurrent callers await the same shared
//! future. Fetches run on their own task, so they finish and populate the
//! cache even when every caller stops waiting.
//!
//! The cache is an explicit service object. Wrap it in an `Arc` (or clone
//! it, clones share state) and hand it to whatever needs it.

mod types;

pub use types::*;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::metrics;

type Value = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<Value, FetchError>>>;

struct CacheEntry {
    value: Option<Value>,
    fetched_at: Option<Instant>,
    error: Option<String>,
    in_flight: Option<SharedFetch>,
    /// Id of the latest fetch started for this entry, unique across the
    /// whole cache. A finishing fetch only writes back when it still matches,
    /// so a fetch that outlived an `invalidate` cannot land in a new entry.
    generation: u64,
    fetches: u64,
}

impl CacheEntry {
    fn empty() -> Self {
        Self {
            value: None,
            fetched_at: None,
            error: None,
            in_flight: None,
            generation: 0,
            fetches: 0,
        }
    }

    fn fresh_value(&self, options: &FetchOptions) -> Option<Value> {
        if self.error.is_some() {
            return None;
        }
        let fetched_at = self.fetched_at?;
        if fetched_at.elapsed() < options.stale_time {
            self.value.clone()
        } else {
            None
        }
    }
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    shared: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
    next_generation: AtomicU64,
}

impl Inner {
    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        // Entries stay consistent even if a holder panicked: every write is
        // a single field assignment.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn complete(&self, key: &QueryKey, generation: u64, result: &Result<Value, FetchError>) {
        if result.is_err() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key) else {
            debug!(key = %key, "Fetch finished for an invalidated key, result not stored");
            return;
        };
        if entry.generation != generation {
            debug!(key = %key, "Fetch superseded, result not stored");
            return;
        }

        entry.in_flight = None;
        match result {
            Ok(value) => {
                entry.value = Some(Arc::clone(value));
                entry.fetched_at = Some(Instant::now());
                entry.error = None;
            }
            Err(e) => {
                entry.error = Some(e.message().to_string());
            }
        }
    }
}

/// Keyed cache of fetched values.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, fetching it when absent, stale or
    /// previously failed.
    ///
    /// `fetcher` is invoked once per attempt, up to `1 + options.retry`
    /// times with `options.retry_delay` between attempts. An error that is
    /// not retryable ends the fetch after its attempt.
    pub async fn fetch<T, F, Fut, E>(
        &self,
        key: QueryKey,
        options: &FetchOptions,
        fetcher: F,
    ) -> Result<Arc<T>, FetchError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: FetchFailure + Send + 'static,
    {
        let scope = key.scope();
        let pending = {
            let mut entries = self.inner.entries();
            let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::empty);

            if let Some(value) = entry.fresh_value(options) {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                metrics::CACHE_LOOKUPS
                    .with_label_values(&[scope, "hit"])
                    .inc();
                debug!(key = %key, "Cache hit");
                return downcast(&key, value);
            }

            if let Some(in_flight) = &entry.in_flight {
                self.inner.shared.fetch_add(1, Ordering::Relaxed);
                metrics::CACHE_LOOKUPS
                    .with_label_values(&[scope, "shared"])
                    .inc();
                debug!(key = %key, "Joining in-flight fetch");
                in_flight.clone()
            } else {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                self.inner.fetches.fetch_add(1, Ordering::Relaxed);
                metrics::CACHE_LOOKUPS
                    .with_label_values(&[scope, "miss"])
                    .inc();
                debug!(key = %key, "Cache miss, fetching");

                entry.generation =
                    self.inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
                entry.fetches += 1;
                let in_flight = self.spawn_fetch(key.clone(), entry.generation, *options, fetcher);
                entry.in_flight = Some(in_flight.clone());
                metrics::CACHE_ENTRIES.set(entries.len() as i64);
                in_flight
            }
        };

        let value = pending.await?;
        downcast(&key, value)
    }

    fn spawn_fetch<T, F, Fut, E>(
        &self,
        key: QueryKey,
        generation: u64,
        options: FetchOptions,
        fetcher: F,
    ) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: FetchFailure + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = run_with_retry(&task_key, &options, fetcher).await;
            inner.complete(&task_key, generation, &result);
            result
        });

        let inner = Arc::clone(&self.inner);
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let result = Err(FetchError::Aborted {
                        key: key.to_string(),
                        message: e.to_string(),
                    });
                    inner.complete(&key, generation, &result);
                    result
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Latest successfully fetched value for `key`, without fetching.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entries = self.inner.entries();
        let value = entries.get(key)?.value.clone()?;
        value.downcast::<T>().ok()
    }

    /// Drop one entry. A fetch in flight for it still resolves for its
    /// waiters but is not stored.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut entries = self.inner.entries();
        let removed = entries.remove(key).is_some();
        metrics::CACHE_ENTRIES.set(entries.len() as i64);
        if removed {
            debug!(key = %key, "Invalidated cache entry");
        }
        removed
    }

    /// Drop every entry of a scope, returning how many were removed.
    pub fn invalidate_scope(&self, scope: &str) -> usize {
        let mut entries = self.inner.entries();
        let before = entries.len();
        entries.retain(|key, _| key.scope() != scope);
        let removed = before - entries.len();
        metrics::CACHE_ENTRIES.set(entries.len() as i64);
        debug!(scope = scope, removed = removed, "Invalidated cache scope");
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) -> usize {
        let mut entries = self.inner.entries();
        let removed = entries.len();
        entries.clear();
        metrics::CACHE_ENTRIES.set(0);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.entries().len(),
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            shared: self.inner.shared.load(Ordering::Relaxed),
            fetches: self.inner.fetches.load(Ordering::Relaxed),
            failures: self.inner.failures.load(Ordering::Relaxed),
        }
    }

    pub fn status(&self, key: &QueryKey) -> Option<CacheStatus> {
        let entries = self.inner.entries();
        let entry = entries.get(key)?;
        Some(CacheStatus {
            fetching: entry.in_flight.is_some(),
            age_ms: entry
                .fetched_at
                .map(|at| at.elapsed().as_millis() as u64),
            error: entry.error.clone(),
            fetches: entry.fetches,
        })
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: Value) -> Result<Arc<T>, FetchError> {
    value.downcast::<T>().map_err(|_| {
        warn!(key = %key, "Cached value has an unexpected type");
        FetchError::TypeMismatch {
            key: key.to_string(),
        }
    })
}

async fn run_with_retry<T, F, Fut, E>(
    key: &QueryKey,
    options: &FetchOptions,
    fetcher: F,
) -> Result<Value, FetchError>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: FetchFailure,
{
    let scope = key.scope();
    let timer = metrics::FETCH_DURATION
        .with_label_values(&[scope])
        .start_timer();
    let max_attempts = options.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match fetcher().await {
            Ok(value) => {
                metrics::FETCH_ATTEMPTS
                    .with_label_values(&[scope, "success"])
                    .inc();
                timer.observe_duration();
                debug!(key = %key, attempt = attempt, "Fetch succeeded");
                return Ok(Arc::new(value) as Value);
            }
            Err(e) => {
                metrics::FETCH_ATTEMPTS
                    .with_label_values(&[scope, "failure"])
                    .inc();
                if attempt >= max_attempts || !e.is_retryable() {
                    metrics::FETCH_FAILURES.with_label_values(&[scope]).inc();
                    timer.observe_duration();
                    warn!(key = %key, attempts = attempt, error = %e, "Fetch failed");
                    return Err(FetchError::Failed {
                        key: key.to_string(),
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
                warn!(
                    key = %key,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %e,
                    "Fetch attempt failed, retrying"
                );
                tokio::time::sleep(options.retry_delay).await;
            }
        }
    }
}
