use std::sync::Arc;

use mirrorview_core::{
    taxonomy_for, Config, EngineOptions, IndexApi, ListQueryEngine, MirrorType, ParamStyle,
    QueryCache, SanitizedConfig, SearchCodec,
};

/// Shared application state
pub struct AppState {
    config: Config,
    cache: Arc<QueryCache>,
    engine: ListQueryEngine,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn IndexApi>) -> Self {
        let cache = Arc::new(QueryCache::new());
        let engine = ListQueryEngine::new(
            api,
            Arc::clone(&cache),
            EngineOptions::from_config(&config),
        );
        Self {
            config,
            cache,
            engine,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn engine(&self) -> &ListQueryEngine {
        &self.engine
    }

    /// Codec for a mirror listing of the given type.
    pub fn mirror_codec(&self, ty: MirrorType) -> SearchCodec {
        SearchCodec::new(
            ParamStyle::Mirror,
            taxonomy_for(ty),
            self.config.list.page_size,
        )
    }

    /// Codec for the direct index listing.
    pub fn torrents_codec(&self) -> SearchCodec {
        SearchCodec::new(
            ParamStyle::Torrents,
            taxonomy_for(MirrorType::Normal),
            self.config.list.page_size,
        )
    }
}
