//! List queries over the index API.
//!
//! `ListQueryEngine` turns a `SearchState` and a `ListSource` into a
//! `ListPage`, deriving cache keys from the normalized state so equal
//! effective parameters always share one cache entry. `ListSession`
//! discards responses that arrive for a state the consumer has moved past.

mod engine;
mod session;
mod types;

pub use engine::ListQueryEngine;
pub use session::{ListSession, Ticket};
pub use types::*;
