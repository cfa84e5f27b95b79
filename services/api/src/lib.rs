//! API service
//!
//! HTTP surface of the video-sharing backend: user registration and login,
//! video upload, feed, search and owner-only deletion.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use catalog::VideoCatalog;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
