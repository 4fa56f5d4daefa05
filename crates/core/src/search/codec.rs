//! Mapping between `SearchState` and canonical URL query strings.

use std::borrow::Cow;
use tracing::debug;

use super::types::{
    effective_page_size, normalize_term, CategoryId, DecodeError, Filter, SearchState, Sort,
    SortField, SortOrder,
};
use crate::taxonomy::Taxonomy;

/// Parameter naming scheme of a listing URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// Mirror listings: `p c s o f q`, 1-based page, fixed page size.
    Mirror,
    /// Direct index listings: `term category filter sort sort_order offset limit`,
    /// 0-based item offset and an explicit page size.
    Torrents,
}

struct Keys {
    term: &'static str,
    category: &'static str,
    filter: &'static str,
    sort: &'static str,
    order: &'static str,
}

impl ParamStyle {
    fn keys(&self) -> Keys {
        match self {
            ParamStyle::Mirror => Keys {
                term: "q",
                category: "c",
                filter: "f",
                sort: "s",
                order: "o",
            },
            ParamStyle::Torrents => Keys {
                term: "term",
                category: "category",
                filter: "filter",
                sort: "sort",
                order: "sort_order",
            },
        }
    }

    /// Wire name of a sort field, or `None` if this style cannot sort by it.
    pub fn sort_name(&self, field: SortField) -> Option<&'static str> {
        match (self, field) {
            (ParamStyle::Mirror, SortField::Date) => Some("id"),
            (ParamStyle::Torrents, SortField::Date) => Some("date"),
            (ParamStyle::Mirror, SortField::Comments) => Some("comments"),
            (ParamStyle::Torrents, SortField::Comments) => None,
            (_, SortField::Size) => Some("size"),
            (_, SortField::Seeders) => Some("seeders"),
            (_, SortField::Leechers) => Some("leechers"),
            (_, SortField::Downloads) => Some("downloads"),
        }
    }

    pub fn parse_sort_field(&self, value: &str) -> Option<SortField> {
        SortField::ALL
            .into_iter()
            .find(|field| self.sort_name(*field) == Some(value))
    }
}

/// Decoded query-string pairs. Repeated keys keep the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string. A leading `?` is ignored and `+` means space.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = raw
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self { pairs }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => spaced,
    }
}

/// Bidirectional codec between search state and URL parameters.
pub struct SearchCodec {
    style: ParamStyle,
    taxonomy: &'static dyn Taxonomy,
    default_page_size: u32,
}

impl std::fmt::Debug for SearchCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCodec")
            .field("style", &self.style)
            .field("taxonomy", &self.taxonomy.name())
            .field("default_page_size", &self.default_page_size)
            .finish()
    }
}

impl SearchCodec {
    pub fn new(style: ParamStyle, taxonomy: &'static dyn Taxonomy, default_page_size: u32) -> Self {
        Self {
            style,
            taxonomy,
            default_page_size: effective_page_size(default_page_size),
        }
    }

    pub fn style(&self) -> ParamStyle {
        self.style
    }

    pub fn taxonomy(&self) -> &'static dyn Taxonomy {
        self.taxonomy
    }

    /// The state an empty query string decodes to.
    pub fn defaults(&self) -> SearchState {
        SearchState {
            page_size: self.default_page_size,
            ..SearchState::default()
        }
    }

    /// Strict decode: the first malformed parameter is an error.
    pub fn try_decode(&self, params: &QueryParams) -> Result<SearchState, DecodeError> {
        let (state, mut errors) = self.decode_fields(params);
        if errors.is_empty() {
            Ok(state)
        } else {
            Err(errors.remove(0))
        }
    }

    /// Lenient decode: each malformed parameter falls back to its default.
    pub fn decode(&self, params: &QueryParams) -> SearchState {
        let (state, errors) = self.decode_fields(params);
        for error in errors {
            debug!(error = %error, "Ignoring search parameter");
        }
        state
    }

    /// Canonical query string (without leading `?`). Default values are omitted.
    pub fn encode(&self, state: &SearchState) -> String {
        let state = self.normalize(state);
        let keys = self.style.keys();
        let mut out: Vec<(&str, String)> = Vec::new();

        match self.style {
            ParamStyle::Mirror => {
                if state.page != 1 {
                    out.push(("p", state.page.to_string()));
                }
                self.push_filters(&mut out, &keys, &state, false);
            }
            ParamStyle::Torrents => {
                self.push_filters(&mut out, &keys, &state, true);
                let offset = state.offset();
                if offset != 0 {
                    out.push(("offset", offset.to_string()));
                }
                if state.page_size != self.default_page_size {
                    out.push(("limit", state.page_size.to_string()));
                }
            }
        }

        out.iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// What `decode(encode(state))` yields: the state with every field
    /// brought into the form this codec can represent.
    pub fn normalize(&self, state: &SearchState) -> SearchState {
        let mut state = state.normalized();
        if !self.taxonomy.contains(state.category) {
            state.category = CategoryId::ALL;
        }
        if let Some(sort) = state.sort {
            if self.style.sort_name(sort.field).is_none() {
                state.sort = None;
            }
        }
        if self.style == ParamStyle::Mirror {
            state.page_size = self.default_page_size;
        }
        state
    }

    /// Whether `raw` already is the canonical encoding of what it decodes to.
    pub fn is_canonical(&self, raw: &str) -> bool {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        self.canonicalize(raw) == raw
    }

    pub fn canonicalize(&self, raw: &str) -> String {
        self.encode(&self.decode(&QueryParams::parse(raw)))
    }

    /// Term, category, filter and sort in the style's parameter order.
    fn push_filters(
        &self,
        out: &mut Vec<(&'static str, String)>,
        keys: &Keys,
        state: &SearchState,
        term_first: bool,
    ) {
        let term = state.term.as_ref().map(|t| (keys.term, t.clone()));
        if term_first {
            out.extend(term.clone());
        }
        if state.category != CategoryId::ALL {
            out.push((keys.category, state.category.to_string()));
        }
        if term_first && state.filter != Filter::NoFilter {
            out.push((keys.filter, state.filter.as_str().to_string()));
        }
        if let Some(sort) = state.sort {
            if let Some(name) = self.style.sort_name(sort.field) {
                out.push((keys.sort, name.to_string()));
                out.push((keys.order, sort.order.as_str().to_string()));
            }
        }
        if !term_first {
            if state.filter != Filter::NoFilter {
                out.push((keys.filter, state.filter.as_str().to_string()));
            }
            out.extend(term);
        }
    }

    fn decode_fields(&self, params: &QueryParams) -> (SearchState, Vec<DecodeError>) {
        let keys = self.style.keys();
        let mut errors = Vec::new();
        let mut state = self.defaults();

        state.term = normalize_term(params.get(keys.term));

        if let Some(raw) = params.get(keys.category) {
            match raw.parse::<CategoryId>() {
                Ok(id) if self.taxonomy.contains(id) => state.category = id,
                Ok(_) => errors.push(DecodeError::UnknownCategory(raw.to_string())),
                Err(e) => errors.push(e),
            }
        }

        if let Some(raw) = params.get(keys.filter) {
            match raw.parse::<Filter>() {
                Ok(filter) => state.filter = filter,
                Err(e) => errors.push(e),
            }
        }

        let field = match params.get(keys.sort) {
            Some(raw) => match self.style.parse_sort_field(raw) {
                Some(field) => Some(field),
                None => {
                    errors.push(invalid(keys.sort, raw));
                    None
                }
            },
            None => None,
        };
        let order = match params.get(keys.order) {
            Some(raw) => match raw.parse::<SortOrder>() {
                Ok(order) => Some(order),
                Err(_) => {
                    errors.push(invalid(keys.order, raw));
                    None
                }
            },
            None => None,
        };
        // An order without a field is meaningless and dropped.
        state.sort = field.map(|field| Sort {
            field,
            order: order.unwrap_or(SortOrder::Desc),
        });

        match self.style {
            ParamStyle::Mirror => {
                if let Some(raw) = params.get("p") {
                    match raw.parse::<u32>() {
                        Ok(page) if page >= 1 => state.page = page,
                        _ => errors.push(invalid("p", raw)),
                    }
                }
            }
            ParamStyle::Torrents => {
                if let Some(raw) = params.get("limit") {
                    match raw.parse::<u32>() {
                        Ok(limit) if limit > 0 => state.page_size = limit,
                        _ => errors.push(invalid("limit", raw)),
                    }
                }
                if let Some(raw) = params.get("offset") {
                    match raw.parse::<u64>() {
                        Ok(offset) => {
                            let page = offset / u64::from(state.page_size) + 1;
                            state.page = u32::try_from(page).unwrap_or(u32::MAX);
                        }
                        Err(_) => errors.push(invalid("offset", raw)),
                    }
                }
            }
        }

        (state, errors)
    }
}

fn invalid(param: &'static str, value: &str) -> DecodeError {
    DecodeError::InvalidValue {
        param,
        value: value.to_string(),
    }
}
