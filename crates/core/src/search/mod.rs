//! Search state and its URL representation.
//!
//! A `SearchState` is the normalized form of what the user asked for
//! (term, category, filter, sort, page). The URL is the source of truth:
//! `SearchCodec` decodes query parameters into a state and encodes a state
//! back into a canonical query string.

mod codec;
mod types;

pub use codec::{ParamStyle, QueryParams, SearchCodec};
pub use types::*;
