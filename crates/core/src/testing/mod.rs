//! Testing utilities and mock implementations.
//!
//! `MockIndexApi` stands in for the upstream index API so the engine and
//! the server can be exercised end-to-end without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirrorview_core::testing::{fixtures, MockIndexApi};
//!
//! let api = MockIndexApi::new();
//! api.set_mirrors(vec![fixtures::mirror("nyaa", MirrorType::Normal, false)]).await;
//! api.set_mirror_list("nyaa", fixtures::mirror_items(10)).await;
//!
//! // Use in ListQueryEngine or AppState...
//! ```

mod mock_index_api;

pub use mock_index_api::{MockIndexApi, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::api::{
        ActionEvent, DailyCount, HealthResponse, Mirror, MirrorHealth, MirrorItemDetail,
        MirrorListItem, MirrorType, MirrorViewComment, MirrorViewFile, RequestLogEntry, Torrent,
        TorrentDetail, TorrentFile,
    };

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day.clamp(1, 28), 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    pub fn mirror(id: &str, ty: MirrorType, hidden: bool) -> Mirror {
        Mirror {
            id: id.to_string(),
            name: format!("Mirror {}", id),
            hidden,
            ty,
        }
    }

    /// A mirror list item with reasonable defaults.
    pub fn mirror_item(id: u64) -> MirrorListItem {
        MirrorListItem {
            id,
            title: format!("[Group] Show - {:02} [1080p].mkv", id),
            pub_date: date((id % 28) as u32 + 1),
            description: None,
            category: "1_2".to_string(),
            size: 1024 * 1024 * 700, // 700 MB
            seeders: 100 + id,
            leechers: 10,
            downloads: 1000,
            comments: id % 3,
            trusted: id % 2 == 0,
            remake: false,
        }
    }

    /// `count` items with ids counting down, the order a newest-first listing uses.
    pub fn mirror_items(count: u64) -> Vec<MirrorListItem> {
        (1..=count).rev().map(mirror_item).collect()
    }

    pub fn item_detail(id: u64) -> MirrorItemDetail {
        let item = mirror_item(id);
        MirrorItemDetail {
            id,
            title: item.title,
            pub_date: item.pub_date,
            description_md: "# Release\n\n* 1080p\n* Softsubs".to_string(),
            category: item.category,
            size: item.size,
            seeders: item.seeders,
            leechers: item.leechers,
            downloads: item.downloads,
            trusted: item.trusted,
            remake: item.remake,
            comments: vec![MirrorViewComment {
                id: 1,
                user: "viewer".to_string(),
                date: item.pub_date,
                edited_date: None,
                content: "Thanks!".to_string(),
                avatar: None,
            }],
            files: vec![MirrorViewFile {
                id: 1,
                name: format!("Show - {:02}.mkv", id),
                size: item.size,
            }],
            magnet_link: Some(format!("magnet:?xt=urn:btih:{:040x}", id)),
        }
    }

    /// A direct-index torrent record.
    pub fn torrent(id: u64) -> Torrent {
        Torrent {
            title: format!("[Group] Movie {} [BD 1080p]", id),
            link: format!("https://index.invalid/download/{}.torrent", id),
            guid: format!("https://index.invalid/view/{}", id),
            pub_date: "Sat, 15 Jun 2024 10:30:00 -0000".to_string(),
            seeders: 50,
            leechers: 5,
            downloads: 500,
            info_hash: format!("{:040x}", id),
            category_id: "1_2".to_string(),
            category: "Anime - English-translated".to_string(),
            size: 1024 * 1024 * 1024 * 4, // 4 GB
            comments: 0,
            trusted: true,
            remake: false,
            description: None,
            magnet_link: Some(format!("magnet:?xt=urn:btih:{:040x}", id)),
            download_link: None,
        }
    }

    pub fn torrents(count: u64) -> Vec<Torrent> {
        (1..=count).map(torrent).collect()
    }

    pub fn torrent_detail(id: u64) -> TorrentDetail {
        let torrent = torrent(id);
        TorrentDetail {
            title: torrent.title,
            link: torrent.link.clone(),
            guid: torrent.guid,
            pub_date: torrent.pub_date,
            seeders: torrent.seeders,
            leechers: torrent.leechers,
            downloads: torrent.downloads,
            info_hash: torrent.info_hash,
            category_id: torrent.category_id,
            category: torrent.category,
            size: torrent.size,
            trusted: torrent.trusted,
            remake: torrent.remake,
            description: "<p>Release</p>".to_string(),
            description_markdown: "Release".to_string(),
            uploader: "uploader".to_string(),
            magnet_link: torrent.magnet_link.unwrap_or_default(),
            download_link: torrent.link,
            files: vec![TorrentFile {
                name: format!("Movie {}.mkv", id),
                size: "4.0 GiB".to_string(),
            }],
            comments: Vec::new(),
        }
    }

    /// Health for one mirror with a successful and a failed request.
    pub fn health(mirror_id: &str) -> HealthResponse {
        HealthResponse {
            mirrors: vec![MirrorHealth {
                id: mirror_id.to_string(),
                name: format!("Mirror {}", mirror_id),
                requests: vec![
                    RequestLogEntry(date(1), "/list?p=1".to_string(), true, false, 0.2),
                    RequestLogEntry(date(1), "/view/1".to_string(), false, false, 5.0),
                ],
            }],
        }
    }

    pub fn daily_counts() -> Vec<DailyCount> {
        vec![
            DailyCount {
                date: "2024-06-14".to_string(),
                count: 120,
            },
            DailyCount {
                date: "2024-06-15".to_string(),
                count: 98,
            },
        ]
    }

    pub fn actions() -> Vec<ActionEvent> {
        vec![ActionEvent {
            date: "2024-06-15T10:00:00Z".to_string(),
            event_type: "search".to_string(),
            event_data: serde_json::json!({ "term": "frieren" }),
        }]
    }
}
