//! JSON view models shared by the page handlers.
//!
//! A list view carries everything a page needs to render a listing: the
//! rows, the pager with ready-made URLs, the sortable column headers, the
//! search bar options and the mirror header.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use mirrorview_core::{
    build_window, controller::with_query, CategoryId, CategoryLabel, FetchError, Filter,
    ListItem, ListPage, Mirror, PageLink, PaginationController, SearchCodec, SearchForm,
    SearchState, SortController, SortField, SortIndicator,
};

use crate::metrics::{REDIRECTS_TOTAL, VIEW_ERRORS_TOTAL};

// ============================================================================
// Errors and redirects
// ============================================================================

/// Body returned when a region could not be loaded.
#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub error: String,
    pub message: String,
    /// Same page again; the retry action.
    pub retry_url: String,
}

impl ErrorView {
    pub fn from_fetch(err: &FetchError, retry_url: impl Into<String>) -> Self {
        let error = match err {
            FetchError::Failed { .. } => "fetch_failed",
            FetchError::TypeMismatch { .. } => "type_mismatch",
            FetchError::Aborted { .. } => "aborted",
        };
        Self {
            error: error.to_string(),
            message: err.message().to_string(),
            retry_url: retry_url.into(),
        }
    }
}

/// 502 with an error view, counted per view.
pub fn fetch_failed(view: &'static str, err: &FetchError, retry_url: impl Into<String>) -> Response {
    warn!(view = view, error = %err, "View fetch failed");
    VIEW_ERRORS_TOTAL.with_label_values(&[view]).inc();
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorView::from_fetch(err, retry_url)),
    )
        .into_response()
}

/// 308 to the canonical form of a listing URL.
pub fn canonical_redirect(path: &str, query: &str) -> Response {
    REDIRECTS_TOTAL.with_label_values(&["canonical_query"]).inc();
    Redirect::permanent(&with_query(path, query)).into_response()
}

/// 307 back to the mirror directory.
pub fn redirect_home() -> Response {
    REDIRECTS_TOTAL.with_label_values(&["unknown_mirror"]).inc();
    Redirect::temporary("/").into_response()
}

// ============================================================================
// List view
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ItemRow {
    #[serde(flatten)]
    pub item: ListItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_label: Option<CategoryLabel>,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PagerLinkView {
    #[serde(flatten)]
    pub link: PageLink,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PagerView {
    pub current_page: u32,
    pub page_count: u32,
    /// False when the page count is only an estimate.
    pub exact: bool,
    pub links: Vec<PagerLinkView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ColumnView {
    pub field: SortField,
    pub indicator: SortIndicator,
    /// Where clicking the header leads.
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SearchBarView {
    pub term: String,
    pub categories: Vec<OptionView>,
    pub filters: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
pub struct ListView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<Mirror>,
    pub state: SearchState,
    /// Canonical query string of this page.
    pub query: String,
    pub items: Vec<ItemRow>,
    pub count: usize,
    pub offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub pager: PagerView,
    pub columns: Vec<ColumnView>,
    pub search: SearchBarView,
    /// Header region; empty when the mirror directory could not be loaded.
    pub mirrors: Vec<Mirror>,
}

/// Builds a `ListView` for one listing path.
pub struct ListViewBuilder<'a> {
    codec: &'a SearchCodec,
    path: String,
    item_path: String,
}

impl<'a> ListViewBuilder<'a> {
    /// `path` is the listing URL path, `item_path` the prefix item ids are
    /// appended to.
    pub fn new(codec: &'a SearchCodec, path: impl Into<String>, item_path: impl Into<String>) -> Self {
        Self {
            codec,
            path: path.into(),
            item_path: item_path.into(),
        }
    }

    pub fn build(
        &self,
        state: &SearchState,
        page: ListPage,
        mirror: Option<Mirror>,
        mirrors: Vec<Mirror>,
    ) -> ListView {
        let state = self.codec.normalize(state);
        let pager = self.pager(&state, &page);
        let taxonomy = self.codec.taxonomy();
        let items = page
            .items
            .into_iter()
            .map(|item| ItemRow {
                category_label: taxonomy.resolve(item.category),
                url: format!("{}/{}", self.item_path, urlencoding::encode(&item.id)),
                item,
            })
            .collect();

        ListView {
            mirror,
            query: self.codec.encode(&state),
            items,
            count: page.count,
            offset: page.offset,
            total: page.total,
            pager,
            columns: self.columns(&state),
            search: self.search_bar(&state),
            mirrors,
            state,
        }
    }

    fn pager(&self, state: &SearchState, page: &ListPage) -> PagerView {
        let controller = PaginationController::new(self.codec);
        let page_count = page.page_count.value();
        let window = build_window(page.current_page, page_count);
        let url_for = |number: u32| {
            controller
                .on_page_change(state, number, page_count)
                .map(|nav| nav.url(&self.path))
        };

        PagerView {
            current_page: page.current_page,
            page_count,
            exact: page.page_count.is_exact(),
            links: window
                .links
                .iter()
                .map(|link| PagerLinkView {
                    link: *link,
                    url: match link {
                        PageLink::Page { number, .. } => url_for(*number),
                        PageLink::Ellipsis => None,
                    },
                })
                .collect(),
            previous_url: window.previous.and_then(url_for),
            next_url: window.next.and_then(url_for),
        }
    }

    fn columns(&self, state: &SearchState) -> Vec<ColumnView> {
        let controller = SortController::new(self.codec);
        SortField::ALL
            .into_iter()
            .filter(|field| controller.is_sortable(*field))
            .map(|field| ColumnView {
                field,
                indicator: controller.indicator(state, field),
                url: controller.toggle(state, field).url(&self.path),
            })
            .collect()
    }

    fn search_bar(&self, state: &SearchState) -> SearchBarView {
        let current = with_query(&self.path, &self.codec.encode(state));

        let categories = self
            .codec
            .taxonomy()
            .options()
            .into_iter()
            .map(|option| {
                let mut form = SearchForm::new(self.codec, state.clone());
                OptionView {
                    value: option.id.to_string(),
                    label: option.label,
                    selected: option.id == state.category,
                    url: form
                        .set_category(option.id)
                        .map(|nav| nav.url(&self.path))
                        .unwrap_or_else(|| current.clone()),
                }
            })
            .collect();

        let filters = Filter::ALL
            .into_iter()
            .map(|filter| {
                let mut form = SearchForm::new(self.codec, state.clone());
                OptionView {
                    value: filter.as_str().to_string(),
                    label: filter.label().to_string(),
                    selected: filter == state.filter,
                    url: form
                        .set_filter(filter)
                        .map(|nav| nav.url(&self.path))
                        .unwrap_or_else(|| current.clone()),
                }
            })
            .collect();

        let form = SearchForm::new(self.codec, state.clone());
        SearchBarView {
            term: form.draft().to_string(),
            categories,
            filters,
        }
    }
}

/// Labels for a raw category string as sent by the upstream API.
pub fn label_for(codec: &SearchCodec, raw: &str) -> Option<CategoryLabel> {
    raw.parse::<CategoryId>()
        .ok()
        .and_then(|id| codec.taxonomy().resolve(id))
}
