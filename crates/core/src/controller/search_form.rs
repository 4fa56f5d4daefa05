//! Search bar state: committed search state plus an uncommitted draft term.

use crate::search::{normalize_term, CategoryId, Filter, SearchCodec, SearchState};

use super::Navigation;

pub struct SearchForm<'a> {
    codec: &'a SearchCodec,
    committed: SearchState,
    draft: String,
}

impl<'a> SearchForm<'a> {
    pub fn new(codec: &'a SearchCodec, state: SearchState) -> Self {
        let committed = codec.normalize(&state);
        let draft = committed.term.clone().unwrap_or_default();
        Self {
            codec,
            committed,
            draft,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.committed
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Adopt a state coming from outside (back/forward navigation). The
    /// draft follows the committed term.
    pub fn sync(&mut self, state: SearchState) {
        self.committed = self.codec.normalize(&state);
        self.draft = self.committed.term.clone().unwrap_or_default();
    }

    /// Change category immediately; `None` if it is unchanged.
    pub fn set_category(&mut self, category: CategoryId) -> Option<Navigation> {
        if self.committed.category == category {
            return None;
        }
        Some(self.commit(self.committed.with_category(category)))
    }

    /// Change filter immediately; `None` if it is unchanged.
    pub fn set_filter(&mut self, filter: Filter) -> Option<Navigation> {
        if self.committed.filter == filter {
            return None;
        }
        Some(self.commit(self.committed.with_filter(filter)))
    }

    /// Update the draft only; nothing navigates until `submit`.
    pub fn edit_term(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Commit the trimmed draft. `None` when it matches the committed term.
    pub fn submit(&mut self) -> Option<Navigation> {
        let term = normalize_term(Some(&self.draft));
        self.draft = term.clone().unwrap_or_default();
        if term == self.committed.term {
            return None;
        }
        Some(self.commit(self.committed.with_term(term)))
    }

    fn commit(&mut self, state: SearchState) -> Navigation {
        let navigation = Navigation::push(self.codec, state);
        self.committed = navigation.state.clone();
        navigation
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
    fn test_category_change_resets_page() {
        let codec = codec();
        let mut form = SearchForm::new(&codec, SearchState::default().with_page(3));

        let nav = form.set_category(CategoryId::new(1, 2)).unwrap();
        assert_eq!(nav.state.page, 1);
        assert_eq!(nav.mode, HistoryMode::Push);
        assert_eq!(nav.query, "c=1_2");
        assert_eq!(form.state().category, CategoryId::new(1, 2));
    }

    #[test]
    fn test_unchanged_values_do_not_navigate() {
        let codec = codec();
        let mut form = SearchForm::new(&codec, SearchState::default());
        assert!(form.set_category(CategoryId::ALL).is_none());
        assert!(form.set_filter(Filter::NoFilter).is_none());
        assert!(form.set_filter(Filter::TrustedOnly).is_some());
        assert!(form.set_filter(Filter::TrustedOnly).is_none());
    }

    #[test]
    fn test_edit_then_submit() {
        let codec = codec();
        let mut form = SearchForm::new(&codec, SearchState::default().with_page(5));

        form.edit_term("  one piece ");
        assert_eq!(form.state().term, None);
        assert_eq!(form.draft(), "  one piece ");

        let nav = form.submit().unwrap();
        assert_eq!(nav.state.term.as_deref(), Some("one piece"));
        assert_eq!(nav.state.page, 1);
        assert_eq!(nav.query, "q=one%20piece");
        assert_eq!(form.draft(), "one piece");

        // Same term again: nothing happens.
        form.edit_term("one piece   ");
        assert!(form.submit().is_none());
    }

    #[test]
    fn test_submit_blank_clears_term() {
        let codec = codec();
        let state = SearchState {
            term: Some("naruto".to_string()),
            ..Default::default()
        };
        let mut form = SearchForm::new(&codec, state);
        form.edit_term("   ");
        let nav = form.submit().unwrap();
        assert_eq!(nav.state.term, None);
        assert_eq!(nav.query, "");
    }

    #[test]
    fn test_sync_replaces_draft() {
        let codec = codec();
        let mut form = SearchForm::new(&codec, SearchState::default());
        form.edit_term("unsent");
        form.sync(SearchState {
            term: Some("bleach".to_string()),
            ..Default::default()
        });
        assert_eq!(form.draft(), "bleach");
        assert_eq!(form.state().term.as_deref(), Some("bleach"));
    }
}
