//! API service models

pub mod video;

pub use video::{FeedPage, FeedQuery, NewVideo, OwnerSummary, SearchQuery, Video, VideoWithOwner};
