pub mod app;
pub mod config;
pub mod error;
pub mod import;
pub mod live_feed;
pub mod loader;
pub mod routes;
pub mod state;
