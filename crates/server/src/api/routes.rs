use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, mirror, status, torrents};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors_allow_everyone = state.config().server.cors_allow_everyone;

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Cache
        .route("/cache", get(handlers::cache_stats))
        .route("/cache/invalidate", post(handlers::invalidate_cache))
        .with_state(Arc::clone(&state));

    // Page view models
    let view_routes = Router::new()
        .route("/", get(mirror::list_mirrors))
        .route("/mirrors", get(mirror::list_mirrors))
        .route("/m/{mirror}", get(mirror::mirror_list))
        .route("/m/{mirror}/view/{id}", get(mirror::mirror_item))
        .route("/m/{mirror}/magnet/{id}", get(mirror::mirror_magnet))
        .route("/torrents", get(torrents::torrent_list))
        .route("/torrents/{id}", get(torrents::torrent_detail))
        .route("/status", get(status::status))
        .route("/stats", get(status::stats))
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .merge(view_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http());

    if cors_allow_everyone {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
