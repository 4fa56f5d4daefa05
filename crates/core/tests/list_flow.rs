//! List flow integration tests.
//!
//! These tests drive the engine and controllers together against the mock
//! index API:
//! - URL decode → query → pager → navigation round trips
//! - Request de-duplication and retry through the shared cache
//! - Stale-response suppression when the user moves on

use std::sync::Arc;
use std::time::Duration;

use mirrorview_core::{
    api::{ApiError, MirrorType},
    build_window,
    cache::FetchOptions,
    taxonomy_for,
    testing::{fixtures, MockIndexApi},
    CategoryId, EngineOptions, Filter, HistoryMode, ListQueryEngine, ListSession, ListSource,
    PageCount, PaginationController, ParamStyle, QueryCache, QueryParams, SearchCodec, SearchForm,
    SearchState, Sort, SortController, SortField,
};

/// Test helper wiring a mock API into an engine with fast retries.
struct TestHarness {
    api: Arc<MockIndexApi>,
    cache: Arc<QueryCache>,
    engine: ListQueryEngine,
}

impl TestHarness {
    fn new() -> Self {
        let api = Arc::new(MockIndexApi::new());
        let cache = Arc::new(QueryCache::new());
        let fast = FetchOptions::default().with_retry(3, Duration::from_millis(5));
        let options = EngineOptions {
            list: FetchOptions {
                stale_time: Duration::from_secs(300),
                ..fast
            },
            default: fast,
            ..EngineOptions::default()
        };
        let engine = ListQueryEngine::new(api.clone(), cache.clone(), options);
        Self { api, cache, engine }
    }
}

fn mirror_codec() -> SearchCodec {
    SearchCodec::new(ParamStyle::Mirror, taxonomy_for(MirrorType::Normal), 75)
}

fn torrents_codec() -> SearchCodec {
    SearchCodec::new(ParamStyle::Torrents, taxonomy_for(MirrorType::Normal), 75)
}

#[test]
fn test_decode_encode_round_trip() {
    let codec = mirror_codec();
    let states = [
        SearchState::default(),
        SearchState {
            term: Some("one piece".to_string()),
            category: CategoryId::new(1, 2),
            filter: Filter::TrustedOnly,
            sort: Some(Sort::asc(SortField::Size)),
            page: 7,
            page_size: 75,
        },
        SearchState {
            term: Some("  padded  ".to_string()),
            page: 0,
            ..Default::default()
        },
    ];

    for state in states {
        let encoded = codec.encode(&state);
        let decoded = codec.decode(&QueryParams::parse(&encoded));
        assert_eq!(decoded, codec.normalize(&state), "query: {encoded}");
        assert!(codec.is_canonical(&encoded));
    }
}

#[test]
fn test_empty_query_decodes_to_defaults() {
    let codec = torrents_codec();
    let state = codec.decode(&QueryParams::parse(""));
    assert_eq!(state, SearchState::default());
    assert_eq!(codec.encode(&state), "");
}

#[test]
fn test_category_change_on_page_three_returns_to_first_page() {
    let codec = mirror_codec();
    let start = codec.decode(&QueryParams::parse("p=3&q=bocchi"));
    assert_eq!(start.page, 3);

    let mut form = SearchForm::new(&codec, start);
    let nav = form.set_category(CategoryId::new(1, 0)).unwrap();
    assert_eq!(nav.state.page, 1);
    assert_eq!(nav.mode, HistoryMode::Push);
    assert_eq!(nav.query, "c=1_0&q=bocchi");
}

#[test]
fn test_sort_cycle_through_urls() {
    let codec = torrents_codec();
    let controller = SortController::new(&codec);
    let mut state = SearchState::default();
    let mut queries = Vec::new();
    for _ in 0..3 {
        let nav = controller.toggle(&state, SortField::Downloads);
        queries.push(nav.query.clone());
        state = nav.state;
    }
    assert_eq!(
        queries,
        vec![
            "sort=downloads&sort_order=desc",
            "sort=downloads&sort_order=asc",
            "",
        ]
    );
}

#[tokio::test]
async fn test_torrents_page_feeds_pager() {
    let harness = TestHarness::new();
    harness.api.set_torrents(fixtures::torrents(75), 1000).await;

    let codec = torrents_codec();
    let state = codec.decode(&QueryParams::parse("offset=750"));
    assert_eq!(state.page, 11);

    let page = tokio_test::assert_ok!(harness.engine.query(&ListSource::Torrents, &state).await);
    assert_eq!(page.current_page, 11);
    assert_eq!(page.page_count, PageCount::Exact(14));

    let window = build_window(page.current_page, page.page_count.value());
    assert_eq!(window.pages(), vec![1, 10, 11, 12, 14]);

    let pager = PaginationController::new(&codec);
    assert!(pager.on_page_change(&state, 15, page.page_count.value()).is_none());
    let nav = pager.on_page_change(&state, 14, page.page_count.value()).unwrap();
    assert_eq!(nav.mode, HistoryMode::Replace);
    assert_eq!(nav.query, "offset=975");
}

#[tokio::test]
async fn test_out_of_range_mirror_page_is_reported_as_is() {
    let harness = TestHarness::new();
    harness.api.set_mirror_list("nyaa", Vec::new()).await;

    let page = harness
        .engine
        .query(
            &ListSource::Mirror("nyaa".into()),
            &SearchState::default().with_page(500),
        )
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.current_page, 500);
    assert_eq!(page.page_count, PageCount::Estimated(505));
}

#[tokio::test]
async fn test_concurrent_identical_queries_hit_network_once() {
    let harness = TestHarness::new();
    harness.api.set_mirror_list("nyaa", fixtures::mirror_items(5)).await;
    harness.api.set_delay(Some(Duration::from_millis(50))).await;

    let source = ListSource::Mirror("nyaa".into());
    let state = SearchState::default();
    let (a, b, c) = tokio::join!(
        harness.engine.query(&source, &state),
        harness.engine.query(&source, &state),
        harness.engine.query(&source, &state),
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(c.unwrap().count, 5);
    assert_eq!(harness.api.call_count("list").await, 1);
}

#[tokio::test]
async fn test_two_failures_then_success_with_three_retries() {
    let harness = TestHarness::new();
    harness.api.set_torrents(fixtures::torrents(3), 3).await;
    harness
        .api
        .fail_next_with(2, ApiError::Timeout)
        .await;

    let page = harness
        .engine
        .query(&ListSource::Torrents, &SearchState::default())
        .await
        .unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(harness.api.call_count("torrents").await, 3);
    assert_eq!(harness.cache.stats().failures, 0);
}

#[tokio::test]
async fn test_superseded_response_is_discarded() {
    let harness = TestHarness::new();
    harness.api.set_mirror_list("nyaa", fixtures::mirror_items(2)).await;
    let source = ListSource::Mirror("nyaa".into());
    let session = ListSession::new();

    let slow = session.begin(SearchState::default().with_page(2));
    let fast = session.begin(SearchState::default().with_page(3));

    let fast_page = harness.engine.query(&source, fast.state()).await.unwrap();
    let slow_page = harness.engine.query(&source, slow.state()).await.unwrap();

    assert!(session.complete(&fast, fast_page).is_some());
    assert!(session.complete(&slow, slow_page).is_none());
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let harness = TestHarness::new();
    harness.api.set_mirror_list("nyaa", fixtures::mirror_items(1)).await;
    let source = ListSource::Mirror("nyaa".into());
    let state = SearchState::default();

    harness.engine.query(&source, &state).await.unwrap();
    harness.engine.query(&source, &state).await.unwrap();
    assert_eq!(harness.api.call_count("list").await, 1);

    assert_eq!(harness.cache.invalidate_scope("list"), 1);
    harness.engine.query(&source, &state).await.unwrap();
    assert_eq!(harness.api.call_count("list").await, 2);
}

#[tokio::test]
async fn test_adult_mirror_rejects_general_categories() {
    let codec = SearchCodec::new(ParamStyle::Mirror, taxonomy_for(MirrorType::Adult), 75);
    let state = codec.decode(&QueryParams::parse("c=6_1&f=2"));
    assert_eq!(state.category, CategoryId::ALL);
    assert_eq!(state.filter, Filter::TrustedOnly);
    assert!(codec.try_decode(&QueryParams::parse("c=6_1")).is_err());
    assert!(!codec.is_canonical("c=6_1&f=2"));
    assert_eq!(codec.canonicalize("c=6_1&f=2"), "f=2");
}
