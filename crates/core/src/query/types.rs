use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::api::{Mirror, MirrorListItem, Torrent};
use crate::cache::FetchOptions;
use crate::config::Config;
use crate::search::{CategoryId, ParamStyle, DEFAULT_PAGE_SIZE};

/// Where a listing comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListSource {
    /// A mirror behind the proxy, by id.
    Mirror(String),
    /// The direct index.
    Torrents,
}

impl ListSource {
    pub fn param_style(&self) -> ParamStyle {
        match self {
            ListSource::Mirror(_) => ParamStyle::Mirror,
            ListSource::Torrents => ParamStyle::Torrents,
        }
    }
}

/// One row of a listing, whichever backend produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<DateTime<Utc>>,
    pub category: CategoryId,
    pub size: u64,
    pub seeders: u64,
    pub leechers: u64,
    pub downloads: u64,
    pub comments: u64,
    pub trusted: bool,
    pub remake: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnet_link: Option<String>,
}

impl From<&MirrorListItem> for ListItem {
    fn from(item: &MirrorListItem) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            pub_date: Some(item.pub_date),
            category: parse_category(&item.category),
            size: item.size,
            seeders: item.seeders,
            leechers: item.leechers,
            downloads: item.downloads,
            comments: item.comments,
            trusted: item.trusted,
            remake: item.remake,
            magnet_link: None,
        }
    }
}

impl From<&Torrent> for ListItem {
    fn from(torrent: &Torrent) -> Self {
        Self {
            id: torrent_id(torrent),
            title: torrent.title.clone(),
            pub_date: parse_pub_date(&torrent.pub_date),
            category: parse_category(&torrent.category_id),
            size: torrent.size,
            seeders: torrent.seeders,
            leechers: torrent.leechers,
            downloads: torrent.downloads,
            comments: torrent.comments,
            trusted: torrent.trusted,
            remake: torrent.remake,
            magnet_link: torrent.magnet_link.clone(),
        }
    }
}

/// The id of a torrent is the last path segment of its guid ("/view/123").
fn torrent_id(torrent: &Torrent) -> String {
    torrent
        .guid
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(&torrent.guid)
        .to_string()
}

fn parse_category(raw: &str) -> CategoryId {
    raw.parse().unwrap_or_else(|_| {
        debug!(category = raw, "Unparseable item category, using all");
        CategoryId::ALL
    })
}

/// Parse a feed date: RFC 2822, RFC 3339, or a bare ISO timestamp.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

/// How many pages a listing has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCount {
    /// Derived from a total reported by the backend.
    Exact(u32),
    /// Backend reports no total; a fixed number of pages past the current one.
    Estimated(u32),
}

impl PageCount {
    pub fn value(&self) -> u32 {
        match self {
            PageCount::Exact(n) | PageCount::Estimated(n) => *n,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, PageCount::Exact(_))
    }

    /// `ceil(total / page_size)`, with a zero page size treated as the default.
    pub fn exact(total: u64, page_size: u32) -> Self {
        let size = u64::from(if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        });
        PageCount::Exact(total.div_ceil(size).min(u64::from(u32::MAX)) as u32)
    }

    pub fn estimated(current_page: u32, lookahead: u32) -> Self {
        PageCount::Estimated(current_page.saturating_add(lookahead))
    }
}

/// One page of results plus what the pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    /// In server order.
    pub items: Vec<ListItem>,
    pub offset: u64,
    pub count: usize,
    /// Absent when the backend does not report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub page_size: u32,
    pub current_page: u32,
    pub page_count: PageCount,
}

impl ListPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of looking up a mirror id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorResolution {
    Found(Mirror),
    /// The id no longer resolves; send the user home.
    Redirect,
}

/// Policies and sizes used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub list: FetchOptions,
    pub default: FetchOptions,
    pub page_size: u32,
    pub lookahead_pages: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            list: FetchOptions::list(),
            default: FetchOptions::default(),
            page_size: DEFAULT_PAGE_SIZE,
            lookahead_pages: 5,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            list: FetchOptions::list_from_config(&config.cache),
            default: FetchOptions::from_config(&config.cache),
            page_size: config.list.page_size,
            lookahead_pages: config.list.lookahead_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_page_count_exact() {
        assert_eq!(PageCount::exact(0, 75), PageCount::Exact(0));
        assert_eq!(PageCount::exact(75, 75), PageCount::Exact(1));
        assert_eq!(PageCount::exact(76, 75), PageCount::Exact(2));
        assert_eq!(PageCount::exact(150, 0), PageCount::Exact(2));
    }

    #[test]
    fn test_page_count_estimated() {
        let count = PageCount::estimated(3, 5);
        assert_eq!(count.value(), 8);
        assert!(!count.is_exact());
    }

    #[test]
    fn test_parse_pub_date_formats() {
        let rfc2822 = parse_pub_date("Sat, 15 Jun 2024 10:30:00 -0000").unwrap();
        assert_eq!(rfc2822.year(), 2024);
        assert_eq!(rfc2822.day(), 15);

        let rfc3339 = parse_pub_date("2024-06-15T10:30:00+02:00").unwrap();
        assert_eq!(rfc3339.to_rfc3339(), "2024-06-15T08:30:00+00:00");

        assert!(parse_pub_date("2024-06-15T10:30:00").is_some());
        assert!(parse_pub_date("yesterday").is_none());
    }

    #[test]
    fn test_torrent_id_from_guid() {
        let json = r#"{
            "title": "t", "link": "l", "guid": "https://nyaa.si/view/1834567",
            "pub_date": "Sat, 15 Jun 2024 10:30:00 -0000",
            "seeders": 1, "leechers": 2, "downloads": 3, "info_hash": "abc",
            "category_id": "1_2", "category": "Anime - English", "size": 10,
            "comments": 4, "trusted": true, "remake": false
        }"#;
        let torrent: Torrent = serde_json::from_str(json).unwrap();
        let item = ListItem::from(&torrent);
        assert_eq!(item.id, "1834567");
        assert_eq!(item.category, CategoryId::new(1, 2));
        assert_eq!(item.comments, 4);
        assert!(item.trusted);
    }

    #[test]
    fn test_unknown_category_falls_back_to_all() {
        assert_eq!(parse_category("Anime"), CategoryId::ALL);
        assert_eq!(parse_category("3_1"), CategoryId::new(3, 1));
    }
}
