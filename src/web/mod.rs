//! Dashboard pages and JSON API

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{configure_routes, start_web_server, AppState};
