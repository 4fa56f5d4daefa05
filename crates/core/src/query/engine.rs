//! List query engine.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{
    ActionEvent, DailyCount, HealthResponse, IndexApi, MagnetResponse, Mirror, MirrorItemDetail,
    MirrorListRequest, MirrorListResponse, TorrentDetail, TorrentListRequest, TorrentListResponse,
};
use crate::cache::{FetchError, QueryCache, QueryKey};
use crate::search::SearchState;

use super::{EngineOptions, ListItem, ListPage, ListSource, MirrorResolution, PageCount};

/// Runs listing and detail queries through the shared cache.
pub struct ListQueryEngine {
    api: Arc<dyn IndexApi>,
    cache: Arc<QueryCache>,
    options: EngineOptions,
}

impl std::fmt::Debug for ListQueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListQueryEngine")
            .field("api", &self.api.name())
            .field("options", &self.options)
            .finish()
    }
}

impl ListQueryEngine {
    pub fn new(api: Arc<dyn IndexApi>, cache: Arc<QueryCache>, options: EngineOptions) -> Self {
        Self {
            api,
            cache,
            options,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Normalize a state for a source: fix the page size and drop sorts the
    /// source cannot express.
    fn effective_state(&self, source: &ListSource, state: &SearchState) -> SearchState {
        let page_size = if state.page_size == 0 {
            self.options.page_size
        } else {
            state.page_size
        };
        let mut state = SearchState {
            page_size,
            ..state.clone()
        }
        .normalized();
        if let Some(sort) = state.sort {
            if source.param_style().sort_name(sort.field).is_none() {
                state.sort = None;
            }
        }
        state
    }

    /// Cache key for a listing. Built from the normalized state so equal
    /// effective parameters share one entry.
    pub fn list_key(&self, source: &ListSource, state: &SearchState) -> QueryKey {
        let state = self.effective_state(source, state);
        let style = source.param_style();
        let sort = state.sort.and_then(|s| style.sort_name(s.field)).unwrap_or("");
        let order = state.sort.map(|s| s.order.as_str()).unwrap_or("");
        let term = state.term.clone().unwrap_or_default();

        match source {
            ListSource::Mirror(mirror) => QueryKey::new("list")
                .part(mirror)
                .part(state.page)
                .part(state.category)
                .part(sort)
                .part(order)
                .part(state.filter)
                .part(term),
            ListSource::Torrents => QueryKey::new("torrents")
                .part(term)
                .part(state.category)
                .part(state.filter)
                .part(sort)
                .part(order)
                .part(state.offset())
                .part(state.page_size),
        }
    }

    /// Fetch one page of a listing.
    ///
    /// Out-of-range pages come back as they are, possibly empty.
    pub async fn query(
        &self,
        source: &ListSource,
        state: &SearchState,
    ) -> Result<ListPage, FetchError> {
        let state = self.effective_state(source, state);
        let key = self.list_key(source, &state);

        match source {
            ListSource::Mirror(mirror) => {
                let api = Arc::clone(&self.api);
                let mirror = mirror.clone();
                let request = MirrorListRequest::from(&state);
                let response = self
                    .cache
                    .fetch(key, &self.options.list, move || {
                        let api = Arc::clone(&api);
                        let mirror = mirror.clone();
                        let request = request.clone();
                        async move { api.list(&mirror, &request).await }
                    })
                    .await?;
                Ok(self.mirror_page(&state, &response))
            }
            ListSource::Torrents => {
                let api = Arc::clone(&self.api);
                let request = TorrentListRequest::from(&state);
                let response = self
                    .cache
                    .fetch(key, &self.options.list, move || {
                        let api = Arc::clone(&api);
                        let request = request.clone();
                        async move { api.torrents(&request).await }
                    })
                    .await?;
                Ok(self.torrents_page(&state, &response))
            }
        }
    }

    /// Warm the cache for a listing.
    pub async fn prefetch(
        &self,
        source: &ListSource,
        state: &SearchState,
    ) -> Result<(), FetchError> {
        let page = self.query(source, state).await?;
        debug!(
            source = ?source,
            items = page.count,
            "Prefetched listing"
        );
        Ok(())
    }

    /// Build a page from whatever the cache holds for this listing, without
    /// fetching.
    pub fn read(&self, source: &ListSource, state: &SearchState) -> Option<ListPage> {
        let state = self.effective_state(source, state);
        let key = self.list_key(source, &state);
        match source {
            ListSource::Mirror(_) => self
                .cache
                .peek::<MirrorListResponse>(&key)
                .map(|response| self.mirror_page(&state, &response)),
            ListSource::Torrents => self
                .cache
                .peek::<TorrentListResponse>(&key)
                .map(|response| self.torrents_page(&state, &response)),
        }
    }

    fn mirror_page(&self, state: &SearchState, response: &MirrorListResponse) -> ListPage {
        let items: Vec<ListItem> = response.items.iter().map(ListItem::from).collect();
        let offset = state.offset();
        let current_page = (offset / u64::from(state.page_size)) as u32 + 1;
        ListPage {
            count: items.len(),
            items,
            offset,
            total: None,
            page_size: state.page_size,
            current_page,
            page_count: PageCount::estimated(current_page, self.options.lookahead_pages),
        }
    }

    fn torrents_page(&self, state: &SearchState, response: &TorrentListResponse) -> ListPage {
        let items: Vec<ListItem> = response.torrents.iter().map(ListItem::from).collect();
        let current_page = (response.offset / u64::from(state.page_size)) as u32 + 1;
        ListPage {
            count: items.len(),
            items,
            offset: response.offset,
            total: Some(response.total),
            page_size: state.page_size,
            current_page,
            page_count: PageCount::exact(response.total, state.page_size),
        }
    }

    /// Every mirror, hidden ones included.
    pub async fn mirrors(&self) -> Result<Arc<Vec<Mirror>>, FetchError> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(QueryKey::new("mirrors"), &self.options.default, move || {
                let api = Arc::clone(&api);
                async move { api.mirrors().await.map(|r| r.items) }
            })
            .await
    }

    /// Mirrors shown in the directory.
    pub async fn visible_mirrors(&self) -> Result<Vec<Mirror>, FetchError> {
        let mirrors = self.mirrors().await?;
        Ok(mirrors.iter().filter(|m| !m.hidden).cloned().collect())
    }

    /// Look up a mirror by id. Hidden mirrors resolve; unknown ids redirect.
    pub async fn resolve_mirror(&self, id: &str) -> Result<MirrorResolution, FetchError> {
        let mirrors = self.mirrors().await?;
        match mirrors.iter().find(|m| m.id == id) {
            Some(mirror) => Ok(MirrorResolution::Found(mirror.clone())),
            None => {
                info!(mirror = id, "Unknown mirror, redirecting home");
                Ok(MirrorResolution::Redirect)
            }
        }
    }

    pub async fn item(&self, mirror: &str, id: u64) -> Result<Arc<MirrorItemDetail>, FetchError> {
        let api = Arc::clone(&self.api);
        let mirror = mirror.to_string();
        let key = QueryKey::new("item").part(&mirror).part(id);
        self.cache
            .fetch(key, &self.options.default, move || {
                let api = Arc::clone(&api);
                let mirror = mirror.clone();
                async move { api.view(&mirror, id).await }
            })
            .await
    }

    pub async fn magnet(&self, mirror: &str, id: u64) -> Result<Arc<MagnetResponse>, FetchError> {
        let api = Arc::clone(&self.api);
        let mirror = mirror.to_string();
        let key = QueryKey::new("magnet").part(&mirror).part(id);
        self.cache
            .fetch(key, &self.options.default, move || {
                let api = Arc::clone(&api);
                let mirror = mirror.clone();
                async move { api.magnet(&mirror, id).await }
            })
            .await
    }

    pub async fn torrent(&self, id: &str) -> Result<Arc<TorrentDetail>, FetchError> {
        let api = Arc::clone(&self.api);
        let id = id.to_string();
        let key = QueryKey::new("torrent").part(&id);
        self.cache
            .fetch(key, &self.options.default, move || {
                let api = Arc::clone(&api);
                let id = id.clone();
                async move { api.torrent(&id).await }
            })
            .await
    }

    pub async fn health(&self) -> Result<Arc<HealthResponse>, FetchError> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(QueryKey::new("health"), &self.options.default, move || {
                let api = Arc::clone(&api);
                async move { api.health().await }
            })
            .await
    }

    pub async fn torrents_per_day(&self) -> Result<Arc<Vec<DailyCount>>, FetchError> {
        let api = Arc::clone(&self.api);
        let key = QueryKey::new("stats").part("torrents-per-day");
        self.cache
            .fetch(key, &self.options.default, move || {
                let api = Arc::clone(&api);
                async move { api.torrents_per_day().await }
            })
            .await
    }

    pub async fn actions(&self) -> Result<Arc<Vec<ActionEvent>>, FetchError> {
        let api = Arc::clone(&self.api);
        let key = QueryKey::new("stats").part("actions");
        self.cache
            .fetch(key, &self.options.default, move || {
                let api = Arc::clone(&api);
                async move { api.actions().await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MirrorType;
    use crate::cache::FetchOptions;
    use crate::search::{CategoryId, Sort, SortField};
    use crate::testing::{fixtures, MockIndexApi};
    use std::time::Duration;

    fn engine(api: Arc<MockIndexApi>) -> ListQueryEngine {
        let quick = FetchOptions::default().with_retry(0, Duration::from_millis(1));
        let options = EngineOptions {
            list: FetchOptions {
                stale_time: Duration::from_secs(300),
                ..quick
            },
            default: quick,
            ..EngineOptions::default()
        };
        ListQueryEngine::new(api, Arc::new(QueryCache::new()), options)
    }

    #[test]
    fn test_list_key_formats() {
        let engine = engine(Arc::new(MockIndexApi::new()));
        let state = SearchState {
            term: Some("  frieren ".to_string()),
            category: CategoryId::new(1, 2),
            sort: Some(Sort::desc(SortField::Seeders)),
            page: 2,
            ..Default::default()
        };

        let mirror = engine.list_key(&ListSource::Mirror("nyaa".into()), &state);
        assert_eq!(mirror.to_string(), "list/nyaa/2/1_2/seeders/desc/0/frieren");

        let torrents = engine.list_key(&ListSource::Torrents, &state);
        assert_eq!(
            torrents.to_string(),
            "torrents/frieren/1_2/0/seeders/desc/75/75"
        );
    }

    #[test]
    fn test_unset_page_size_uses_engine_default() {
        let api = Arc::new(MockIndexApi::new());
        let engine = ListQueryEngine::new(
            api,
            Arc::new(QueryCache::new()),
            EngineOptions {
                page_size: 20,
                ..EngineOptions::default()
            },
        );
        let state = SearchState {
            page: 3,
            page_size: 0,
            ..Default::default()
        };

        let key = engine.list_key(&ListSource::Torrents, &state);
        assert_eq!(key.parts()[5], "40");
        assert_eq!(key.parts()[6], "20");
    }

    #[test]
    fn test_unsupported_sort_shares_unsorted_key() {
        let engine = engine(Arc::new(MockIndexApi::new()));
        let sorted = SearchState::default().with_sort(Some(Sort::desc(SortField::Comments)));
        assert_eq!(
            engine.list_key(&ListSource::Torrents, &sorted),
            engine.list_key(&ListSource::Torrents, &SearchState::default())
        );
    }

    #[tokio::test]
    async fn test_mirror_query_estimates_page_count() {
        let api = Arc::new(MockIndexApi::new());
        api.set_mirror_list("nyaa", fixtures::mirror_items(3)).await;
        let engine = engine(api.clone());

        let page = engine
            .query(
                &ListSource::Mirror("nyaa".into()),
                &SearchState::default().with_page(4),
            )
            .await
            .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.total, None);
        assert_eq!(page.current_page, 4);
        assert_eq!(page.offset, 225);
        assert_eq!(page.page_count, PageCount::Estimated(9));
    }

    #[tokio::test]
    async fn test_torrents_query_exact_page_count() {
        let api = Arc::new(MockIndexApi::new());
        api.set_torrents(fixtures::torrents(10), 160).await;
        let engine = engine(api.clone());

        let page = engine
            .query(&ListSource::Torrents, &SearchState::default().with_page(2))
            .await
            .unwrap();
        assert_eq!(page.offset, 75);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total, Some(160));
        assert_eq!(page.page_count, PageCount::Exact(3));

        let requests = api.torrent_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].offset, Some(75));
        assert_eq!(requests[0].limit, Some(75));
    }

    #[tokio::test]
    async fn test_equal_states_share_one_fetch() {
        let api = Arc::new(MockIndexApi::new());
        api.set_mirror_list("nyaa", fixtures::mirror_items(1)).await;
        let engine = engine(api.clone());
        let source = ListSource::Mirror("nyaa".into());

        let padded = SearchState {
            term: Some(" x ".to_string()),
            ..Default::default()
        };
        let trimmed = SearchState {
            term: Some("x".to_string()),
            ..Default::default()
        };
        engine.query(&source, &padded).await.unwrap();
        engine.query(&source, &trimmed).await.unwrap();
        assert_eq!(api.call_count("list").await, 1);
    }

    #[tokio::test]
    async fn test_prefetch_then_read() {
        let api = Arc::new(MockIndexApi::new());
        api.set_mirror_list("nyaa", fixtures::mirror_items(2)).await;
        let engine = engine(api.clone());
        let source = ListSource::Mirror("nyaa".into());
        let state = SearchState::default();

        assert!(engine.read(&source, &state).is_none());
        engine.prefetch(&source, &state).await.unwrap();
        let page = engine.read(&source, &state).unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(api.call_count("list").await, 1);
    }

    #[tokio::test]
    async fn test_resolve_mirror() {
        let api = Arc::new(MockIndexApi::new());
        api.set_mirrors(vec![
            fixtures::mirror("nyaa", MirrorType::Normal, false),
            fixtures::mirror("secret", MirrorType::Adult, true),
        ])
        .await;
        let engine = engine(api.clone());

        assert!(matches!(
            engine.resolve_mirror("secret").await.unwrap(),
            MirrorResolution::Found(m) if m.ty == MirrorType::Adult
        ));
        assert_eq!(
            engine.resolve_mirror("gone").await.unwrap(),
            MirrorResolution::Redirect
        );
        assert_eq!(engine.visible_mirrors().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_surfaces_fetch_error() {
        let api = Arc::new(MockIndexApi::new());
        api.fail_next(1).await;
        let engine = engine(api.clone());

        let err = engine
            .query(&ListSource::Torrents, &SearchState::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Failed { attempts: 1, .. }));
    }
}
