//! Mock index API for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::api::{
    ActionEvent, ApiError, DailyCount, HealthResponse, IndexApi, MagnetResponse, Mirror,
    MirrorItemDetail, MirrorListItem, MirrorListRequest, MirrorListResponse, MirrorsResponse,
    Torrent, TorrentDetail, TorrentListRequest, TorrentListResponse,
};

/// A recorded call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Trait method name ("list", "torrents", ...).
    pub method: &'static str,
    /// Arguments rendered for matching.
    pub args: String,
    pub timestamp: Instant,
}

#[derive(Debug, Default)]
struct Failures {
    remaining: u32,
    error: Option<ApiError>,
}

/// Mock implementation of the `IndexApi` trait.
///
/// Provides controllable behavior for testing:
/// - Return configured mirrors, listings and details
/// - Record every call for assertions
/// - Fail the next N calls and delay responses
///
/// # Example
///
/// ```rust,ignore
/// use mirrorview_core::testing::{fixtures, MockIndexApi};
///
/// let api = MockIndexApi::new();
/// api.set_mirror_list("nyaa", fixtures::mirror_items(3)).await;
/// api.fail_next(2).await;
///
/// // Two failures, then the listing.
/// assert!(api.list("nyaa", &Default::default()).await.is_err());
/// assert!(api.list("nyaa", &Default::default()).await.is_err());
/// assert_eq!(api.list("nyaa", &Default::default()).await?.items.len(), 3);
/// ```
pub struct MockIndexApi {
    mirrors: Arc<RwLock<Vec<Mirror>>>,
    mirror_lists: Arc<RwLock<HashMap<String, Vec<MirrorListItem>>>>,
    items: Arc<RwLock<HashMap<(String, u64), MirrorItemDetail>>>,
    torrents: Arc<RwLock<(Vec<Torrent>, u64)>>,
    torrent_details: Arc<RwLock<HashMap<String, TorrentDetail>>>,
    health: Arc<RwLock<HealthResponse>>,
    torrents_per_day: Arc<RwLock<Vec<DailyCount>>>,
    actions: Arc<RwLock<Vec<ActionEvent>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    list_requests: Arc<RwLock<Vec<MirrorListRequest>>>,
    torrent_requests: Arc<RwLock<Vec<TorrentListRequest>>>,
    failures: Arc<RwLock<Failures>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl std::fmt::Debug for MockIndexApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockIndexApi")
            .field("mirrors", &"<mirrors>")
            .field("calls", &"<calls>")
            .field("failures", &"<failures>")
            .finish()
    }
}

impl Default for MockIndexApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIndexApi {
    /// Create a mock with no mirrors and empty listings.
    pub fn new() -> Self {
        Self {
            mirrors: Arc::new(RwLock::new(Vec::new())),
            mirror_lists: Arc::new(RwLock::new(HashMap::new())),
            items: Arc::new(RwLock::new(HashMap::new())),
            torrents: Arc::new(RwLock::new((Vec::new(), 0))),
            torrent_details: Arc::new(RwLock::new(HashMap::new())),
            health: Arc::new(RwLock::new(HealthResponse {
                mirrors: Vec::new(),
            })),
            torrents_per_day: Arc::new(RwLock::new(Vec::new())),
            actions: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            list_requests: Arc::new(RwLock::new(Vec::new())),
            torrent_requests: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(Failures::default())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_mirrors(&self, mirrors: Vec<Mirror>) {
        *self.mirrors.write().await = mirrors;
    }

    /// Items returned for every page of a mirror listing.
    pub async fn set_mirror_list(&self, mirror: &str, items: Vec<MirrorListItem>) {
        self.mirror_lists
            .write()
            .await
            .insert(mirror.to_string(), items);
    }

    pub async fn set_item(&self, mirror: &str, item: MirrorItemDetail) {
        self.items
            .write()
            .await
            .insert((mirror.to_string(), item.id), item);
    }

    /// Torrents returned for every page, with the reported total.
    pub async fn set_torrents(&self, torrents: Vec<Torrent>, total: u64) {
        *self.torrents.write().await = (torrents, total);
    }

    pub async fn set_torrent_detail(&self, id: &str, detail: TorrentDetail) {
        self.torrent_details
            .write()
            .await
            .insert(id.to_string(), detail);
    }

    pub async fn set_health(&self, health: HealthResponse) {
        *self.health.write().await = health;
    }

    pub async fn set_stats(&self, per_day: Vec<DailyCount>, actions: Vec<ActionEvent>) {
        *self.torrents_per_day.write().await = per_day;
        *self.actions.write().await = actions;
    }

    /// Fail the next `count` calls with a connection error.
    pub async fn fail_next(&self, count: u32) {
        self.fail_next_with(count, ApiError::ConnectionFailed("mock failure".to_string()))
            .await;
    }

    /// Fail the next `count` calls with `error`.
    pub async fn fail_next_with(&self, count: u32, error: ApiError) {
        let mut failures = self.failures.write().await;
        failures.remaining = count;
        failures.error = Some(error);
    }

    /// Delay every response by `delay`.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Number of calls made to one method.
    pub async fn call_count(&self, method: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub async fn list_requests(&self) -> Vec<MirrorListRequest> {
        self.list_requests.read().await.clone()
    }

    pub async fn torrent_requests(&self) -> Vec<TorrentListRequest> {
        self.torrent_requests.read().await.clone()
    }

    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
        self.list_requests.write().await.clear();
        self.torrent_requests.write().await.clear();
    }

    /// Record the call, apply the delay, then consume an injected failure.
    async fn begin(&self, method: &'static str, args: String) -> Result<(), ApiError> {
        self.calls.write().await.push(RecordedCall {
            method,
            args,
            timestamp: Instant::now(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut failures = self.failures.write().await;
        if failures.remaining > 0 {
            failures.remaining -= 1;
            let error = failures
                .error
                .clone()
                .unwrap_or_else(|| ApiError::ConnectionFailed("mock failure".to_string()));
            return Err(error);
        }
        Ok(())
    }
}

fn not_found(what: String) -> ApiError {
    ApiError::Status {
        status: 404,
        body: format!("{} not found", what),
    }
}

#[async_trait]
impl IndexApi for MockIndexApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn mirrors(&self) -> Result<MirrorsResponse, ApiError> {
        self.begin("mirrors", String::new()).await?;
        Ok(MirrorsResponse {
            items: self.mirrors.read().await.clone(),
        })
    }

    async fn list(
        &self,
        mirror: &str,
        request: &MirrorListRequest,
    ) -> Result<MirrorListResponse, ApiError> {
        self.list_requests.write().await.push(request.clone());
        self.begin("list", mirror.to_string()).await?;
        let items = self
            .mirror_lists
            .read()
            .await
            .get(mirror)
            .cloned()
            .unwrap_or_default();
        Ok(MirrorListResponse { items })
    }

    async fn view(&self, mirror: &str, id: u64) -> Result<MirrorItemDetail, ApiError> {
        self.begin("view", format!("{}/{}", mirror, id)).await?;
        self.items
            .read()
            .await
            .get(&(mirror.to_string(), id))
            .cloned()
            .ok_or_else(|| not_found(format!("item {}/{}", mirror, id)))
    }

    async fn magnet(&self, mirror: &str, id: u64) -> Result<MagnetResponse, ApiError> {
        self.begin("magnet", format!("{}/{}", mirror, id)).await?;
        self.items
            .read()
            .await
            .get(&(mirror.to_string(), id))
            .and_then(|item| item.magnet_link.clone())
            .map(|magnet_link| MagnetResponse { magnet_link })
            .ok_or_else(|| not_found(format!("magnet {}/{}", mirror, id)))
    }

    async fn torrents(
        &self,
        request: &TorrentListRequest,
    ) -> Result<TorrentListResponse, ApiError> {
        self.torrent_requests.write().await.push(request.clone());
        self.begin("torrents", String::new()).await?;
        let (torrents, total) = self.torrents.read().await.clone();
        Ok(TorrentListResponse {
            count: torrents.len() as u64,
            torrents,
            offset: request.offset.unwrap_or(0),
            total,
        })
    }

    async fn torrent(&self, id: &str) -> Result<TorrentDetail, ApiError> {
        self.begin("torrent", id.to_string()).await?;
        self.torrent_details
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("torrent {}", id)))
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.begin("health", String::new()).await?;
        Ok(self.health.read().await.clone())
    }

    async fn torrents_per_day(&self) -> Result<Vec<DailyCount>, ApiError> {
        self.begin("torrents_per_day", String::new()).await?;
        Ok(self.torrents_per_day.read().await.clone())
    }

    async fn actions(&self) -> Result<Vec<ActionEvent>, ApiError> {
        self.begin("actions", String::new()).await?;
        Ok(self.actions.read().await.clone())
    }
}
