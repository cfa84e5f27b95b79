//! Video catalog
//!
//! Owns video records: creation, the public feed, search and owner-only
//! deletion. Mutations always take the owner from the authenticated identity.

use auth::repositories::UserStore;
use chrono::Utc;
use common::error::DatabaseError;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{FeedPage, NewVideo, Video, VideoWithOwner, video::MAX_PAGE_SIZE},
    repositories::VideoStore,
};

/// Longest accepted title, whitespace not counted
pub const MAX_TITLE_CHARS: usize = 35;

/// Most results returned by a search
pub const SEARCH_LIMIT: i64 = 12;

/// Catalog failures
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("Video not found")]
    NotFound,

    /// Owner id does not resolve to a user
    #[error("User not found")]
    OwnerNotFound,

    #[error("You are not allowed to delete this video")]
    Forbidden,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Check a title and return it trimmed
pub fn validate_title(title: &str) -> CatalogResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CatalogError::Validation("Title is required".to_string()));
    }

    if title.chars().filter(|c| !c.is_whitespace()).count() > MAX_TITLE_CHARS {
        return Err(CatalogError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }

    Ok(title.to_string())
}

/// Lower-cased whitespace-separated search terms
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Video catalog
#[derive(Clone)]
pub struct VideoCatalog {
    videos: Arc<dyn VideoStore>,
    users: Arc<dyn UserStore>,
}

impl VideoCatalog {
    pub fn new(videos: Arc<dyn VideoStore>, users: Arc<dyn UserStore>) -> Self {
        Self { videos, users }
    }

    /// Record a published video owned by `owner_id`
    pub async fn create_video(
        &self,
        owner_id: Uuid,
        title: &str,
        video_file: String,
        thumbnail: String,
        duration: f64,
    ) -> CatalogResult<Video> {
        let title = validate_title(title)?;

        if self.users.find_by_id(owner_id).await?.is_none() {
            return Err(CatalogError::OwnerNotFound);
        }

        let video = self
            .videos
            .insert(&NewVideo {
                owner_id,
                title,
                video_file,
                thumbnail,
                duration: if duration.is_finite() && duration > 0.0 {
                    duration
                } else {
                    0.0
                },
            })
            .await?;

        info!("Video {} created by {}", video.id, owner_id);
        Ok(video)
    }

    /// One page of published videos, newest first
    pub async fn list_feed(&self, page: i64, page_size: i64) -> CatalogResult<FeedPage> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(page_size);

        let videos = self.videos.list_published(offset, page_size).await?;
        let has_more = videos.len() as i64 == page_size;

        Ok(FeedPage {
            videos,
            timestamp: Utc::now(),
            current_page: page,
            has_more,
        })
    }

    /// A video regardless of its publication flag
    pub async fn get_by_id(&self, id: Uuid) -> CatalogResult<VideoWithOwner> {
        self.videos
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound)
    }

    /// Delete a video on behalf of its owner
    pub async fn delete_by_id(&self, id: Uuid, requester_id: Uuid) -> CatalogResult<()> {
        let video = self.get_by_id(id).await?;

        if video.video.owner_id != requester_id {
            return Err(CatalogError::Forbidden);
        }

        if !self.videos.delete(id).await? {
            return Err(CatalogError::NotFound);
        }

        info!("Video {} deleted by its owner {}", id, requester_id);
        Ok(())
    }

    /// Published videos matching any term by title or owner name
    pub async fn search(&self, query: &str) -> CatalogResult<Vec<VideoWithOwner>> {
        let terms = search_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.videos.search_published(&terms, SEARCH_LIMIT).await?)
    }

    /// Every video of an owner, published or not
    pub async fn list_by_owner(&self, owner_id: Uuid) -> CatalogResult<Vec<Video>> {
        Ok(self.videos.list_by_owner(owner_id, false).await?)
    }

    /// Published videos of an owner
    pub async fn list_published_by_owner(&self, owner_id: Uuid) -> CatalogResult<Vec<Video>> {
        Ok(self.videos.list_by_owner(owner_id, true).await?)
    }
}
