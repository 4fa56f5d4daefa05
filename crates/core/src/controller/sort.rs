//! Column sort state machine.
//!
//! Each column cycles unsorted → descending → ascending → unsorted. Only one
//! column is active at a time; activating another column starts it at
//! descending.

use serde::Serialize;

use crate::search::{SearchCodec, SearchState, Sort, SortField, SortOrder};

use super::Navigation;

/// What a column header shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortIndicator {
    Inactive,
    Descending,
    Ascending,
}

/// Sort to apply after clicking `field` while `current` is active.
pub fn next_sort(current: Option<Sort>, field: SortField) -> Option<Sort> {
    match current {
        Some(sort) if sort.field == field => match sort.order {
            SortOrder::Desc => Some(Sort::asc(field)),
            SortOrder::Asc => None,
        },
        _ => Some(Sort::desc(field)),
    }
}

pub struct SortController<'a> {
    codec: &'a SearchCodec,
}

impl<'a> SortController<'a> {
    pub fn new(codec: &'a SearchCodec) -> Self {
        Self { codec }
    }

    /// Advance `field` one step. The page is kept as it is.
    pub fn toggle(&self, state: &SearchState, field: SortField) -> Navigation {
        let next = state.with_sort(next_sort(state.sort, field));
        Navigation::push(self.codec, next)
    }

    pub fn indicator(&self, state: &SearchState, field: SortField) -> SortIndicator {
        indicator(state, field)
    }

    /// Whether this listing style can sort by `field` at all.
    pub fn is_sortable(&self, field: SortField) -> bool {
        self.codec.style().sort_name(field).is_some()
    }
}

pub fn indicator(state: &SearchState, field: SortField) -> SortIndicator {
    match state.sort {
        Some(Sort {
            field: active,
            order,
        }) if active == field => match order {
            SortOrder::Desc => SortIndicator::Descending,
            SortOrder::Asc => SortIndicator::Ascending,
        },
        _ => SortIndicator::Inactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MirrorType;
    use crate::controller::HistoryMode;
    use crate::search::{ParamStyle, DEFAULT_PAGE_SIZE};
    use crate::taxonomy::taxonomy_for;

    fn codec() -> SearchCodec {
        SearchCodec::new(
            ParamStyle::Mirror,
            taxonomy_for(MirrorType::Normal),
            DEFAULT_PAGE_SIZE,
        )
    }

    #[test]
    fn test_full_cycle() {
        let codec = codec();
        let controller = SortController::new(&codec);
        let start = SearchState::default();

        let first = controller.toggle(&start, SortField::Seeders);
        assert_eq!(first.state.sort, Some(Sort::desc(SortField::Seeders)));
        assert_eq!(first.mode, HistoryMode::Push);
        assert_eq!(first.query, "s=seeders&o=desc");

        let second = controller.toggle(&first.state, SortField::Seeders);
        assert_eq!(second.state.sort, Some(Sort::asc(SortField::Seeders)));

        let third = controller.toggle(&second.state, SortField::Seeders);
        assert_eq!(third.state.sort, None);
        assert_eq!(third.query, "");
    }

    #[test]
    fn test_switching_column_starts_descending() {
        let codec = codec();
        let controller = SortController::new(&codec);
        let state = SearchState::default().with_sort(Some(Sort::asc(SortField::Size)));

        let next = controller.toggle(&state, SortField::Date);
        assert_eq!(next.state.sort, Some(Sort::desc(SortField::Date)));
        assert_eq!(next.query, "s=id&o=desc");
    }

    #[test]
    fn test_toggle_keeps_page() {
        let codec = codec();
        let controller = SortController::new(&codec);
        let state = SearchState::default().with_page(4);
        let next = controller.toggle(&state, SortField::Size);
        assert_eq!(next.state.page, 4);
    }

    #[test]
    fn test_indicator() {
        let state = SearchState::default().with_sort(Some(Sort::desc(SortField::Leechers)));
        assert_eq!(
            indicator(&state, SortField::Leechers),
            SortIndicator::Descending
        );
        assert_eq!(indicator(&state, SortField::Size), SortIndicator::Inactive);
        assert_eq!(
            indicator(&SearchState::default(), SortField::Leechers),
            SortIndicator::Inactive
        );
    }

    #[test]
    fn test_comments_not_sortable_in_torrents_style() {
        let codec = SearchCodec::new(
            ParamStyle::Torrents,
            taxonomy_for(MirrorType::Normal),
            DEFAULT_PAGE_SIZE,
        );
        let controller = SortController::new(&codec);
        assert!(!controller.is_sortable(SortField::Comments));
        assert!(controller.is_sortable(SortField::Date));
    }
}
