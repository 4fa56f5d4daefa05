use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use mirrorview_core::{CacheStats, SanitizedConfig};

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// GET /api/v1/cache
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.cache().stats())
}

#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    /// Key scope to drop ("list", "item", "mirrors", ...). Everything when absent.
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub removed: usize,
}

/// POST /api/v1/cache/invalidate
///
/// The retry action: drops cached entries so the next view refetches.
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InvalidateResponse>, impl IntoResponse> {
    let request = if body.is_empty() {
        InvalidateRequest::default()
    } else {
        match serde_json::from_slice::<InvalidateRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Invalid request body: {}", e),
                    }),
                ))
            }
        }
    };
    let removed = match request.scope.as_deref() {
        Some(scope) => state.cache().invalidate_scope(scope),
        None => state.cache().clear(),
    };
    info!(scope = ?request.scope, removed = removed, "Cache invalidated");
    Ok(Json(InvalidateResponse { removed }))
}
