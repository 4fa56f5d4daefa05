pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod metrics;
pub mod query;
pub mod search;
pub mod taxonomy;
pub mod testing;

pub use api::{ApiError, HttpIndexApi, IndexApi, Mirror, MirrorType};
pub use cache::{CacheStats, FetchError, FetchFailure, FetchOptions, QueryCache, QueryKey};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use controller::{
    build_window, HistoryMode, Navigation, PageLink, PaginationController, PaginationWindow,
    SearchForm, SortController, SortIndicator,
};
pub use query::{
    EngineOptions, ListItem, ListPage, ListQueryEngine, ListSession, ListSource, MirrorResolution,
    PageCount, Ticket,
};
pub use search::{
    CategoryId, DecodeError, Filter, ParamStyle, QueryParams, SearchCodec, SearchState, Sort,
    SortField, SortOrder,
};
pub use taxonomy::{taxonomy_for, CategoryLabel, CategoryOption, Taxonomy};
