//! Video persistence
//!
//! The catalog talks to videos through [`VideoStore`]; owner fields are joined
//! by the store so every listing comes back ready to serialize.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewVideo, Video, VideoWithOwner};

pub mod memory;
pub mod video;

pub use memory::MemoryVideoStore;
pub use video::VideoRepository;

/// Storage access for video records
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert a published video
    async fn insert(&self, new_video: &NewVideo) -> DatabaseResult<Video>;

    /// Find a video by ID, published or not
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<VideoWithOwner>>;

    /// Published videos, newest first
    async fn list_published(&self, offset: i64, limit: i64)
    -> DatabaseResult<Vec<VideoWithOwner>>;

    /// Published videos whose title or owner name contains any of `terms`
    ///
    /// Terms are already lower-cased.
    async fn search_published(
        &self,
        terms: &[String],
        limit: i64,
    ) -> DatabaseResult<Vec<VideoWithOwner>>;

    /// Videos of one owner, newest first
    async fn list_by_owner(&self, owner_id: Uuid, published_only: bool)
    -> DatabaseResult<Vec<Video>>;

    /// Hard delete, returning whether a row was removed
    async fn delete(&self, id: Uuid) -> DatabaseResult<bool>;
}
