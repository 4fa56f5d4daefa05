//! Mirror directory and per-mirror page handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

use mirrorview_core::{
    api::{MagnetResponse, MirrorItemDetail},
    controller::with_query,
    taxonomy_for, CategoryLabel, CategoryOption, ListSource, Mirror, MirrorResolution, MirrorType,
    QueryParams, SearchCodec,
};

use super::views::{
    canonical_redirect, fetch_failed, label_for, redirect_home, ListViewBuilder,
};
use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MirrorEntry {
    #[serde(flatten)]
    pub mirror: Mirror,
    pub url: String,
    pub categories: Vec<CategoryOption>,
}

#[derive(Debug, Serialize)]
pub struct MirrorDirectoryView {
    pub mirrors: Vec<MirrorEntry>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<Mirror>,
    pub item: MirrorItemDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_label: Option<CategoryLabel>,
    pub list_url: String,
    pub magnet_url: String,
}

/// Mirror lookup outcome for a page under `/m/{mirror}`.
enum Resolved {
    Mirror(Mirror),
    /// Directory unavailable; the page renders without mirror details.
    Unknown,
    Redirect,
}

async fn resolve(state: &AppState, id: &str) -> Resolved {
    match state.engine().resolve_mirror(id).await {
        Ok(MirrorResolution::Found(mirror)) => Resolved::Mirror(mirror),
        Ok(MirrorResolution::Redirect) => Resolved::Redirect,
        Err(e) => {
            warn!(mirror = id, error = %e, "Mirror directory unavailable");
            Resolved::Unknown
        }
    }
}

/// Codec of the first taxonomy that accepts every parameter, general first.
fn guess_codec(state: &AppState, params: &QueryParams) -> SearchCodec {
    let general = state.mirror_codec(MirrorType::Normal);
    if general.try_decode(params).is_ok() {
        return general;
    }
    let adult = state.mirror_codec(MirrorType::Adult);
    if adult.try_decode(params).is_ok() {
        adult
    } else {
        general
    }
}

fn mirror_path(id: &str) -> String {
    format!("/m/{}", urlencoding::encode(id))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / and GET /mirrors
///
/// Visible mirrors with the category options of their taxonomy.
pub async fn list_mirrors(State(state): State<Arc<AppState>>) -> Response {
    match state.engine().visible_mirrors().await {
        Ok(mirrors) => {
            let mirrors = mirrors
                .into_iter()
                .map(|mirror| MirrorEntry {
                    url: mirror_path(&mirror.id),
                    categories: taxonomy_for(mirror.ty).options(),
                    mirror,
                })
                .collect();
            Json(MirrorDirectoryView { mirrors }).into_response()
        }
        Err(e) => fetch_failed("mirrors", &e, "/"),
    }
}

/// GET /m/{mirror}?p&c&s&o&f&q
///
/// List view of one mirror. Non-canonical queries redirect to their
/// canonical form; unknown mirrors redirect home.
pub async fn mirror_list(
    State(state): State<Arc<AppState>>,
    Path(mirror_id): Path<String>,
    RawQuery(raw): RawQuery,
) -> Response {
    let engine = state.engine();
    let (resolved, header) = tokio::join!(resolve(&state, &mirror_id), engine.visible_mirrors());

    let mirror = match resolved {
        Resolved::Redirect => return redirect_home(),
        Resolved::Mirror(mirror) => Some(mirror),
        Resolved::Unknown => None,
    };
    let path = mirror_path(&mirror_id);
    let raw = raw.unwrap_or_default();
    let params = QueryParams::parse(&raw);

    let codec = match &mirror {
        Some(mirror) => {
            let codec = state.mirror_codec(mirror.ty);
            if !codec.is_canonical(&raw) {
                let canonical = codec.canonicalize(&raw);
                debug!(mirror = %mirror_id, from = %raw, to = %canonical, "Redirecting to canonical query");
                return canonical_redirect(&path, &canonical);
            }
            codec
        }
        // Without the directory the taxonomy is a guess, so the URL is
        // rendered as given and never rewritten.
        None => guess_codec(&state, &params),
    };

    let search = codec.decode(&params);
    let source = ListSource::Mirror(mirror_id.clone());
    let retry_url = with_query(&path, &raw);

    if let Err(e) = engine.prefetch(&source, &search).await {
        return fetch_failed("mirror_list", &e, retry_url);
    }
    let page = match engine.read(&source, &search) {
        Some(page) => page,
        // Invalidated between prefetch and read
        None => match engine.query(&source, &search).await {
            Ok(page) => page,
            Err(e) => return fetch_failed("mirror_list", &e, retry_url),
        },
    };

    let header = header.unwrap_or_else(|e| {
        warn!(error = %e, "Mirror header unavailable, rendering without it");
        Vec::new()
    });

    let item_path = format!("{}/view", path);
    let view = ListViewBuilder::new(&codec, path, item_path).build(&search, page, mirror, header);
    Json(view).into_response()
}

/// GET /m/{mirror}/view/{id}
pub async fn mirror_item(
    State(state): State<Arc<AppState>>,
    Path((mirror_id, id)): Path<(String, u64)>,
) -> Response {
    let mirror = match resolve(&state, &mirror_id).await {
        Resolved::Redirect => return redirect_home(),
        Resolved::Mirror(mirror) => Some(mirror),
        Resolved::Unknown => None,
    };
    let path = mirror_path(&mirror_id);

    match state.engine().item(&mirror_id, id).await {
        Ok(item) => {
            let ty = mirror.as_ref().map(|m| m.ty).unwrap_or(MirrorType::Normal);
            let codec = state.mirror_codec(ty);
            Json(ItemView {
                category_label: label_for(&codec, &item.category),
                item: (*item).clone(),
                list_url: path.clone(),
                magnet_url: format!("{}/magnet/{}", path, id),
                mirror,
            })
            .into_response()
        }
        Err(e) => fetch_failed("mirror_item", &e, format!("{}/view/{}", path, id)),
    }
}

/// GET /m/{mirror}/magnet/{id}
///
/// The magnet link on its own, for clients that copy it to the clipboard.
pub async fn mirror_magnet(
    State(state): State<Arc<AppState>>,
    Path((mirror_id, id)): Path<(String, u64)>,
) -> Response {
    if let Resolved::Redirect = resolve(&state, &mirror_id).await {
        return redirect_home();
    }

    match state.engine().magnet(&mirror_id, id).await {
        Ok(magnet) => Json(MagnetResponse::clone(&magnet)).into_response(),
        Err(e) => fetch_failed(
            "mirror_magnet",
            &e,
            format!("{}/magnet/{}", mirror_path(&mirror_id), id),
        ),
    }
}
