//! User-intent controllers.
//!
//! Each controller takes the current `SearchState` and returns the next one
//! wrapped in a `Navigation`; none of them touch the network or the cache.

mod navigation;
pub mod pagination;
pub mod search_form;
pub mod sort;

pub use navigation::{with_query, HistoryMode, Navigation};
pub use pagination::{build_window, PageLink, PaginationController, PaginationWindow};
pub use search_form::SearchForm;
pub use sort::{SortController, SortIndicator};
