pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod server;
pub mod time;

pub use error::BookingError;
pub use models::*;

/// Default server URL for the bookd API
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// API version prefix
pub const API_VERSION: &str = "v1";

/// Application name, used for the local config directory
pub const APP_NAME: &str = "bookd";
