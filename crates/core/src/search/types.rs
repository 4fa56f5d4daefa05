//! Search state and its enumerated fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Page size used when none is configured or requested.
pub const DEFAULT_PAGE_SIZE: u32 = 75;

/// Errors produced while decoding search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Invalid value for parameter '{param}': {value:?}")]
    InvalidValue { param: &'static str, value: String },

    #[error("Unknown category for this mirror: {0}")]
    UnknownCategory(String),
}

/// A two-level category id, `{major}_{minor}`.
///
/// `0_0` selects everything, a `_0` minor selects every subcategory of the major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId {
    pub major: u8,
    pub minor: u8,
}

impl CategoryId {
    pub const ALL: CategoryId = CategoryId { major: 0, minor: 0 };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Whether this id covers every subcategory of its major.
    pub fn is_major(&self) -> bool {
        self.minor == 0
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.major, self.minor)
    }
}

impl FromStr for CategoryId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecodeError::InvalidValue {
            param: "category",
            value: s.to_string(),
        };
        let (major, minor) = s.split_once('_').ok_or_else(invalid)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(major) || !digits(minor) {
            return Err(invalid());
        }
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for CategoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CategoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Result filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    #[serde(rename = "0")]
    NoFilter,
    #[serde(rename = "1")]
    NoRemakes,
    #[serde(rename = "2")]
    TrustedOnly,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::NoFilter, Filter::NoRemakes, Filter::TrustedOnly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::NoFilter => "0",
            Filter::NoRemakes => "1",
            Filter::TrustedOnly => "2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::NoFilter => "No filter",
            Filter::NoRemakes => "No remakes",
            Filter::TrustedOnly => "Trusted only",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Filter::NoFilter),
            "1" => Ok(Filter::NoRemakes),
            "2" => Ok(Filter::TrustedOnly),
            _ => Err(DecodeError::InvalidValue {
                param: "filter",
                value: s.to_string(),
            }),
        }
    }
}

/// Sortable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Publish date. Mirrors sort by item id, which follows publish order.
    Date,
    Size,
    Comments,
    Seeders,
    Leechers,
    Downloads,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Date,
        SortField::Size,
        SortField::Comments,
        SortField::Seeders,
        SortField::Leechers,
        SortField::Downloads,
    ];
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(DecodeError::InvalidValue {
                param: "sort_order",
                value: s.to_string(),
            }),
        }
    }
}

/// An active sort: field and order always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            order: SortOrder::Desc,
        }
    }

    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            order: SortOrder::Asc,
        }
    }
}

/// The user's current query, sort and page intent.
///
/// Values are replaced, never edited in place: every `with_*` method
/// returns a new state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    pub category: CategoryId,
    pub filter: Filter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            term: None,
            category: CategoryId::ALL,
            filter: Filter::NoFilter,
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchState {
    /// Trim the term, drop empty terms, and clamp page numbers and sizes
    /// into their valid ranges.
    pub fn normalized(&self) -> Self {
        Self {
            term: normalize_term(self.term.as_deref()),
            category: self.category,
            filter: self.filter,
            sort: self.sort,
            page: self.page.max(1),
            page_size: effective_page_size(self.page_size),
        }
    }

    /// 0-based offset of the first item of this page.
    pub fn offset(&self) -> u64 {
        let state = self.normalized();
        u64::from(state.page - 1) * u64::from(state.page_size)
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort: Option<Sort>) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }

    /// Change category and go back to the first page.
    pub fn with_category(&self, category: CategoryId) -> Self {
        Self {
            category,
            page: 1,
            ..self.clone()
        }
    }

    /// Change filter and go back to the first page.
    pub fn with_filter(&self, filter: Filter) -> Self {
        Self {
            filter,
            page: 1,
            ..self.clone()
        }
    }

    /// Change term and go back to the first page.
    pub fn with_term(&self, term: Option<String>) -> Self {
        Self {
            term: normalize_term(term.as_deref()),
            page: 1,
            ..self.clone()
        }
    }
}

/// Trimmed term, or `None` when nothing is left.
pub fn normalize_term(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Page size with the zero case replaced by the default.
pub fn effective_page_size(page_size: u32) -> u32 {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}
