use serde::Serialize;

use crate::search::{SearchCodec, SearchState};

/// How a navigation enters the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    Push,
    Replace,
}

/// A new search state to move to, with its canonical query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub state: SearchState,
    pub mode: HistoryMode,
    /// Canonical query string, without leading `?`.
    pub query: String,
}

impl Navigation {
    pub fn new(codec: &SearchCodec, state: SearchState, mode: HistoryMode) -> Self {
        let state = codec.normalize(&state);
        let query = codec.encode(&state);
        Self { state, mode, query }
    }

    pub fn push(codec: &SearchCodec, state: SearchState) -> Self {
        Self::new(codec, state, HistoryMode::Push)
    }

    pub fn replace(codec: &SearchCodec, state: SearchState) -> Self {
        Self::new(codec, state, HistoryMode::Replace)
    }

    /// `path` with the query appended, or `path` alone when the query is empty.
    pub fn url(&self, path: &str) -> String {
        with_query(path, &self.query)
    }
}

/// Append a query string to a path.
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MirrorType;
    use crate::search::{ParamStyle, DEFAULT_PAGE_SIZE};
    use crate::taxonomy::taxonomy_for;

    #[test]
    fn test_navigation_url() {
        let codec = SearchCodec::new(
            ParamStyle::Mirror,
            taxonomy_for(MirrorType::Normal),
            DEFAULT_PAGE_SIZE,
        );
        let nav = Navigation::push(&codec, SearchState::default());
        assert_eq!(nav.url("/m/nyaa"), "/m/nyaa");

        let nav = Navigation::replace(&codec, SearchState::default().with_page(3));
        assert_eq!(nav.mode, HistoryMode::Replace);
        assert_eq!(nav.url("/m/nyaa"), "/m/nyaa?p=3");
    }
}
