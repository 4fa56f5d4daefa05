//! View-model server over the mirrorview engine.
//!
//! Exposes listings, item details and status pages as JSON so a front end
//! (or a test) can drive the query engine over HTTP.

pub mod api;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use state::AppState;
