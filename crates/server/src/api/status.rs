//! Upstream health and statistics views.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use mirrorview_core::{
    api::{ActionEvent, DailyCount, MirrorHealth, RequestLogEntry},
    FetchError,
};

use super::views::{fetch_failed, ErrorView};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MirrorStatus {
    pub id: String,
    pub name: String,
    pub total: usize,
    pub failed: usize,
    pub cached: usize,
    /// Share of successful requests, 0.0 to 1.0. `None` without requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_request: Option<DateTime<Utc>>,
    pub requests: Vec<RequestLogEntry>,
}

impl From<&MirrorHealth> for MirrorStatus {
    fn from(health: &MirrorHealth) -> Self {
        let requests = &health.requests;
        let total = requests.len();
        let failed = requests.iter().filter(|r| !r.success()).count();
        let cached = requests.iter().filter(|r| r.cached()).count();
        let (success_rate, avg_response_ms) = if total == 0 {
            (None, None)
        } else {
            let sum: f64 = requests.iter().map(RequestLogEntry::response_time_ms).sum();
            (
                Some((total - failed) as f64 / total as f64),
                Some(sum / total as f64),
            )
        };

        Self {
            id: health.id.clone(),
            name: health.name.clone(),
            total,
            failed,
            cached,
            success_rate,
            avg_response_ms,
            last_request: requests.iter().map(RequestLogEntry::timestamp).max(),
            requests: requests.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub mirrors: Vec<MirrorStatus>,
}

/// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> Response {
    match state.engine().health().await {
        Ok(health) => Json(StatusView {
            mirrors: health.mirrors.iter().map(MirrorStatus::from).collect(),
        })
        .into_response(),
        Err(e) => fetch_failed("status", &e, "/status"),
    }
}

/// One independently loaded part of a page.
#[derive(Debug, Serialize)]
pub struct Region<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
}

impl<T: Clone> Region<T> {
    fn from_result(result: Result<Arc<T>, FetchError>, retry_url: &str) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(T::clone(&data)),
                error: None,
            },
            Err(e) => Self {
                data: None,
                error: Some(ErrorView::from_fetch(&e, retry_url)),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsView {
    pub torrents_per_day: Region<Vec<DailyCount>>,
    pub actions: Region<Vec<ActionEvent>>,
}

/// GET /stats
///
/// Both regions load concurrently; one failing leaves the other intact.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsView> {
    let engine = state.engine();
    let (per_day, actions) = tokio::join!(engine.torrents_per_day(), engine.actions());
    Json(StatsView {
        torrents_per_day: Region::from_result(per_day, "/stats"),
        actions: Region::from_result(actions, "/stats"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorview_core::testing::fixtures;

    #[test]
    fn test_mirror_status_summary() {
        let health = fixtures::health("nyaa");
        let status = MirrorStatus::from(&health.mirrors[0]);

        assert_eq!(status.total, 2);
        assert_eq!(status.failed, 1);
        assert_eq!(status.cached, 0);
        assert_eq!(status.success_rate, Some(0.5));
        let avg = status.avg_response_ms.unwrap();
        assert!((avg - 2600.0).abs() < 1e-6);
        assert!(status.last_request.is_some());
    }

    #[test]
    fn test_mirror_status_without_requests() {
        let health = MirrorHealth {
            id: "idle".to_string(),
            name: "Idle".to_string(),
            requests: Vec::new(),
        };
        let status = MirrorStatus::from(&health);
        assert_eq!(status.total, 0);
        assert!(status.success_rate.is_none());
        assert!(status.avg_response_ms.is_none());
        assert!(status.last_request.is_none());
    }
}
