//! In-process video store for tests and local development

use async_trait::async_trait;
use auth::repositories::UserStore;
use chrono::Utc;
use common::error::DatabaseResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::VideoStore;
use crate::models::{NewVideo, OwnerSummary, Video, VideoWithOwner, video::DEFAULT_VIEWS};

/// Video store backed by an insertion-ordered list
///
/// Owner fields are joined through the user store, mirroring the LEFT JOIN of
/// the PostgreSQL repository.
#[derive(Clone)]
pub struct MemoryVideoStore {
    videos: Arc<RwLock<Vec<Video>>>,
    users: Arc<dyn UserStore>,
}

impl MemoryVideoStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            videos: Arc::default(),
            users,
        }
    }

    /// Flip the publication flag of a stored video
    pub async fn set_published(&self, id: Uuid, published: bool) -> bool {
        let mut videos = self.videos.write().await;
        match videos.iter_mut().find(|v| v.id == id) {
            Some(video) => {
                video.is_published = published;
                video.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Newest first; later insertions win ties
    async fn newest_first(&self) -> Vec<Video> {
        let mut videos: Vec<Video> = self.videos.read().await.iter().rev().cloned().collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        videos
    }

    async fn with_owner(&self, video: Video) -> DatabaseResult<VideoWithOwner> {
        let owner = self
            .users
            .find_by_id(video.owner_id)
            .await?
            .map(|user| OwnerSummary {
                id: user.id,
                username: user.username,
                full_name: user.full_name,
                avatar: user.avatar,
            });

        Ok(VideoWithOwner { video, owner })
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn insert(&self, new_video: &NewVideo) -> DatabaseResult<Video> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            video_file: new_video.video_file.clone(),
            thumbnail: new_video.thumbnail.clone(),
            title: new_video.title.clone(),
            duration: new_video.duration,
            views: DEFAULT_VIEWS.to_string(),
            is_published: true,
            owner_id: new_video.owner_id,
            created_at: now,
            updated_at: now,
        };

        self.videos.write().await.push(video.clone());
        Ok(video)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<VideoWithOwner>> {
        let video = self.videos.read().await.iter().find(|v| v.id == id).cloned();

        match video {
            Some(video) => Ok(Some(self.with_owner(video).await?)),
            None => Ok(None),
        }
    }

    async fn list_published(
        &self,
        offset: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<VideoWithOwner>> {
        let page: Vec<Video> = self
            .newest_first()
            .await
            .into_iter()
            .filter(|v| v.is_published)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        let mut result = Vec::with_capacity(page.len());
        for video in page {
            result.push(self.with_owner(video).await?);
        }
        Ok(result)
    }

    async fn search_published(
        &self,
        terms: &[String],
        limit: i64,
    ) -> DatabaseResult<Vec<VideoWithOwner>> {
        let mut result = Vec::new();

        for video in self.newest_first().await.into_iter().filter(|v| v.is_published) {
            if result.len() as i64 >= limit {
                break;
            }

            let candidate = self.with_owner(video).await?;
            let title = candidate.video.title.to_lowercase();
            let owner_name = candidate
                .owner
                .as_ref()
                .map(|o| o.full_name.to_lowercase())
                .unwrap_or_default();

            if terms
                .iter()
                .any(|term| title.contains(term.as_str()) || owner_name.contains(term.as_str()))
            {
                result.push(candidate);
            }
        }

        Ok(result)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        published_only: bool,
    ) -> DatabaseResult<Vec<Video>> {
        Ok(self
            .newest_first()
            .await
            .into_iter()
            .filter(|v| v.owner_id == owner_id && (v.is_published || !published_only))
            .collect())
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut videos = self.videos.write().await;
        let before = videos.len();
        videos.retain(|v| v.id != id);
        Ok(videos.len() < before)
    }
}
