//! Page window construction and page-change handling.

use serde::Serialize;

use crate::search::{SearchCodec, SearchState};

use super::Navigation;

/// One slot of the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageLink {
    Page { number: u32, active: bool },
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationWindow {
    pub links: Vec<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<u32>,
}

impl PaginationWindow {
    /// Page numbers in display order, ellipses skipped.
    pub fn pages(&self) -> Vec<u32> {
        self.links
            .iter()
            .filter_map(|link| match link {
                PageLink::Page { number, .. } => Some(*number),
                PageLink::Ellipsis => None,
            })
            .collect()
    }
}

/// Pager for `current` out of `total` pages: the first page, neighbours of
/// the current one, and the last page, with ellipses over the gaps.
pub fn build_window(current: u32, total: u32) -> PaginationWindow {
    let mut links = vec![PageLink::Page {
        number: 1,
        active: current == 1,
    }];

    if current > 3 {
        links.push(PageLink::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = current.saturating_add(1).min(total.saturating_sub(1));
    for number in start..=end {
        links.push(PageLink::Page {
            number,
            active: number == current,
        });
    }

    if current.saturating_add(2) < total {
        links.push(PageLink::Ellipsis);
    }

    if total > 1 {
        links.push(PageLink::Page {
            number: total,
            active: current == total,
        });
    }

    PaginationWindow {
        links,
        // Past the end, "previous" leads back to the last page.
        previous: (current > 1 && total > 0).then(|| (current - 1).min(total)),
        next: (current < total).then(|| current + 1),
    }
}

pub struct PaginationController<'a> {
    codec: &'a SearchCodec,
}

impl<'a> PaginationController<'a> {
    pub fn new(codec: &'a SearchCodec) -> Self {
        Self { codec }
    }

    /// Move to `page`, replacing the history entry. Out-of-range pages are
    /// ignored.
    pub fn on_page_change(
        &self,
        state: &SearchState,
        page: u32,
        page_count: u32,
    ) -> Option<Navigation> {
        if page < 1 || page > page_count {
            return None;
        }
        Some(Navigation::replace(self.codec, state.with_page(page)))
    }

    pub fn previous(&self, state: &SearchState, page_count: u32) -> Option<Navigation> {
        let page = state.page.checked_sub(1)?.min(page_count);
        self.on_page_change(state, page, page_count)
    }

    pub fn next(&self, state: &SearchState, page_count: u32) -> Option<Navigation> {
        self.on_page_change(state, state.page.saturating_add(1), page_count)
    }
}
