pub mod handlers;
pub mod middleware;
pub mod mirror;
pub mod routes;
pub mod status;
pub mod torrents;
pub mod views;

pub use routes::create_router;
