//! Wire types of the index API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::{CategoryId, Filter, ParamStyle, SearchState, SortOrder};

/// Which category taxonomy a mirror uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorType {
    #[default]
    Normal,
    Adult,
}

/// A mirror the proxy can query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirror {
    pub id: String,
    pub name: String,
    /// Hidden mirrors are reachable by id but not listed.
    #[serde(default)]
    pub hidden: bool,
    #[serde(rename = "type", default)]
    pub ty: MirrorType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorsResponse {
    pub items: Vec<Mirror>,
}

/// Query sent to `GET /api/mirror/{mirror}/list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorListRequest {
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(rename = "o", default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(rename = "f", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(rename = "q", default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl From<&SearchState> for MirrorListRequest {
    fn from(state: &SearchState) -> Self {
        let state = state.normalized();
        let sort = state
            .sort
            .and_then(|s| ParamStyle::Mirror.sort_name(s.field).map(|name| (name, s.order)));
        Self {
            page: Some(state.page),
            category: Some(state.category),
            sort: sort.map(|(name, _)| name.to_string()),
            order: sort.map(|(_, order)| order),
            filter: Some(state.filter),
            query: state.term,
        }
    }
}

/// One row of a mirror listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorListItem {
    pub id: u64,
    pub title: String,
    pub pub_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub size: u64,
    pub seeders: u64,
    pub leechers: u64,
    pub downloads: u64,
    pub comments: u64,
    pub trusted: bool,
    pub remake: bool,
}

/// Mirror listings carry no offset or total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorListResponse {
    pub items: Vec<MirrorListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorViewComment {
    pub id: u64,
    pub user: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_date: Option<DateTime<Utc>>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorViewFile {
    pub id: u64,
    pub name: String,
    pub size: u64,
}

/// Item detail from `GET /api/mirror/{mirror}/view/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorItemDetail {
    pub id: u64,
    pub title: String,
    pub pub_date: DateTime<Utc>,
    /// Markdown source, passed through untouched.
    pub description_md: String,
    pub category: String,
    pub size: u64,
    pub seeders: u64,
    pub leechers: u64,
    pub downloads: u64,
    pub trusted: bool,
    pub remake: bool,
    #[serde(default)]
    pub comments: Vec<MirrorViewComment>,
    #[serde(default)]
    pub files: Vec<MirrorViewFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagnetResponse {
    pub magnet_link: String,
}

/// Body of `POST /api/torrents`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl From<&SearchState> for TorrentListRequest {
    fn from(state: &SearchState) -> Self {
        let state = state.normalized();
        let sort = state.sort.and_then(|s| {
            ParamStyle::Torrents
                .sort_name(s.field)
                .map(|name| (name, s.order))
        });
        Self {
            offset: Some(state.offset()),
            limit: Some(state.page_size),
            term: state.term,
            category: Some(state.category),
            filter: Some(state.filter),
            sort: sort.map(|(name, _)| name.to_string()),
            sort_order: sort.map(|(_, order)| order),
        }
    }
}

/// One record of the direct index listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Torrent {
    pub title: String,
    pub link: String,
    pub guid: String,
    /// Publish date as reported by the feed (RFC 2822 or RFC 3339).
    pub pub_date: String,
    pub seeders: u64,
    pub leechers: u64,
    pub downloads: u64,
    pub info_hash: String,
    pub category_id: String,
    pub category: String,
    pub size: u64,
    pub comments: u64,
    pub trusted: bool,
    pub remake: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_link: Option<String>,
    #[serde(default, alias = "downoad_link", skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentListResponse {
    pub torrents: Vec<Torrent>,
    pub offset: u64,
    pub count: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFile {
    pub name: String,
    /// Human-readable size as scraped ("1.2 GiB").
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentComment {
    pub id: String,
    pub user: String,
    pub avatar: String,
    pub date: String,
    pub content: String,
}

/// Detail from `GET /api/torrent/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentDetail {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub pub_date: String,
    pub seeders: u64,
    pub leechers: u64,
    pub downloads: u64,
    pub info_hash: String,
    pub category_id: String,
    pub category: String,
    pub size: u64,
    pub trusted: bool,
    pub remake: bool,
    pub description: String,
    pub description_markdown: String,
    pub uploader: String,
    pub magnet_link: String,
    #[serde(alias = "downoad_link")]
    pub download_link: String,
    #[serde(default)]
    pub files: Vec<TorrentFile>,
    #[serde(default)]
    pub comments: Vec<TorrentComment>,
}

/// One logged upstream request: when, what, whether it worked, whether it
/// was served from the mirror's cache, and how long it took in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry(
    pub DateTime<Utc>,
    pub String,
    pub bool,
    pub bool,
    pub f64,
);

impl RequestLogEntry {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn path(&self) -> &str {
        &self.1
    }

    pub fn success(&self) -> bool {
        self.2
    }

    pub fn cached(&self) -> bool {
        self.3
    }

    pub fn response_time_ms(&self) -> f64 {
        self.4 * 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorHealth {
    pub id: String,
    pub name: String,
    pub requests: Vec<RequestLogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub mirrors: Vec<MirrorHealth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub date: String,
    pub event_type: String,
    #[serde(default)]
    pub event_data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Sort, SortField};

    #[test]
    fn test_mirror_defaults() {
        let json = r#"{"id": "nyaa", "name": "Nyaa"}"#;
        let mirror: Mirror = serde_json::from_str(json).unwrap();
        assert!(!mirror.hidden);
        assert_eq!(mirror.ty, MirrorType::Normal);

        let json = r#"{"id": "sk", "name": "Sk", "hidden": true, "type": "adult"}"#;
        let mirror: Mirror = serde_json::from_str(json).unwrap();
        assert!(mirror.hidden);
        assert_eq!(mirror.ty, MirrorType::Adult);
    }

    #[test]
    fn test_mirror_list_request_from_state() {
        let state = SearchState {
            term: Some(" bocchi ".to_string()),
            category: CategoryId::new(1, 2),
            sort: Some(Sort::asc(SortField::Date)),
            page: 4,
            ..Default::default()
        };
        let request = MirrorListRequest::from(&state);
        assert_eq!(request.page, Some(4));
        assert_eq!(request.sort.as_deref(), Some("id"));
        assert_eq!(request.order, Some(SortOrder::Asc));
        assert_eq!(request.query.as_deref(), Some("bocchi"));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["c"], "1_2");
        assert_eq!(json["f"], "0");
    }

    #[test]
    fn test_torrent_list_request_skips_unsorted() {
        let state = SearchState::default().with_page(2);
        let request = TorrentListRequest::from(&state);
        assert_eq!(request.offset, Some(75));
        assert_eq!(request.limit, Some(75));
        assert!(request.sort.is_none());

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("sort"));
        assert!(!json.contains("term"));
    }

    #[test]
    fn test_torrent_accepts_misspelled_download_link() {
        let json = r#"{
            "title": "t", "link": "l", "guid": "g", "pub_date": "Mon, 01 Jan 2024 00:00:00 +0000",
            "seeders": 1, "leechers": 2, "downloads": 3, "info_hash": "abc",
            "category_id": "1_2", "category": "Anime - English", "size": 10,
            "comments": 0, "trusted": false, "remake": false,
            "downoad_link": "https://example.invalid/download/1.torrent"
        }"#;
        let torrent: Torrent = serde_json::from_str(json).unwrap();
        assert_eq!(
            torrent.download_link.as_deref(),
            Some("https://example.invalid/download/1.torrent")
        );
    }

    #[test]
    fn test_request_log_entry_from_tuple() {
        let json = r#"["2024-06-15T10:30:00Z", "/mirror/list?p=1", true, false, 0.25]"#;
        let entry: RequestLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.path(), "/mirror/list?p=1");
        assert!(entry.success());
        assert!(!entry.cached());
        assert_eq!(entry.response_time_ms(), 250.0);
    }
}
