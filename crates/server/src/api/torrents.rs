//! Direct index listing and torrent detail handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use mirrorview_core::{
    api::TorrentDetail, controller::with_query, query::parse_pub_date, CategoryLabel, ListSource,
    QueryParams,
};

use super::views::{canonical_redirect, fetch_failed, label_for, ListViewBuilder};
use crate::state::AppState;

const TORRENTS_PATH: &str = "/torrents";

#[derive(Debug, Serialize)]
pub struct TorrentView {
    pub torrent: TorrentDetail,
    /// `pub_date` parsed from the index's RFC 2822 string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_label: Option<CategoryLabel>,
    pub list_url: String,
}

/// GET /torrents?term&category&filter&sort&sort_order&offset&limit
pub async fn torrent_list(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Response {
    let codec = state.torrents_codec();
    let raw = raw.unwrap_or_default();
    if !codec.is_canonical(&raw) {
        let canonical = codec.canonicalize(&raw);
        debug!(from = %raw, to = %canonical, "Redirecting to canonical query");
        return canonical_redirect(TORRENTS_PATH, &canonical);
    }

    let engine = state.engine();
    let search = codec.decode(&QueryParams::parse(&raw));
    let source = ListSource::Torrents;
    let retry_url = with_query(TORRENTS_PATH, &raw);

    let (listing, header) = tokio::join!(
        engine.prefetch(&source, &search),
        engine.visible_mirrors()
    );
    if let Err(e) = listing {
        return fetch_failed("torrent_list", &e, retry_url);
    }
    let page = match engine.read(&source, &search) {
        Some(page) => page,
        None => match engine.query(&source, &search).await {
            Ok(page) => page,
            Err(e) => return fetch_failed("torrent_list", &e, retry_url),
        },
    };

    let header = header.unwrap_or_else(|e| {
        warn!(error = %e, "Mirror header unavailable, rendering without it");
        Vec::new()
    });

    let view =
        ListViewBuilder::new(&codec, TORRENTS_PATH, TORRENTS_PATH).build(&search, page, None, header);
    Json(view).into_response()
}

/// GET /torrents/{id}
pub async fn torrent_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.engine().torrent(&id).await {
        Ok(torrent) => {
            let codec = state.torrents_codec();
            Json(TorrentView {
                published: parse_pub_date(&torrent.pub_date),
                category_label: label_for(&codec, &torrent.category_id),
                torrent: (*torrent).clone(),
                list_url: TORRENTS_PATH.to_string(),
            })
            .into_response()
        }
        Err(e) => fetch_failed(
            "torrent_detail",
            &e,
            format!("{}/{}", TORRENTS_PATH, urlencoding::encode(&id)),
        ),
    }
}
