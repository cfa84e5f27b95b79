//! Video models for the API service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Placeholder view count shown for every video
pub const DEFAULT_VIEWS: &str = "108k";

/// Default feed page size
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Largest accepted feed page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Video entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub duration: f64,
    pub views: String,
    pub is_published: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public owner fields joined onto a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

/// Video with its owner, `owner` is null when the owner no longer exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: Video,
    pub owner: Option<OwnerSummary>,
}

/// Row shape of a video LEFT JOINed with its owner
#[derive(Debug, FromRow)]
pub struct VideoOwnerRow {
    #[sqlx(flatten)]
    pub video: Video,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub owner_avatar: Option<String>,
}

impl From<VideoOwnerRow> for VideoWithOwner {
    fn from(row: VideoOwnerRow) -> Self {
        let owner = match (row.owner_username, row.owner_full_name, row.owner_avatar) {
            (Some(username), Some(full_name), Some(avatar)) => Some(OwnerSummary {
                id: row.video.owner_id,
                username,
                full_name,
                avatar,
            }),
            _ => None,
        };

        VideoWithOwner {
            video: row.video,
            owner,
        }
    }
}

/// Video creation payload; URLs come from the publisher
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub owner_id: Uuid,
    pub title: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
}

/// Query parameters for the feed
///
/// Values are parsed leniently: anything unparsable falls back to the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl FeedQuery {
    /// 1-based page number
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Page size within 1..=100
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Search query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// One page of the public feed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub videos: Vec<VideoWithOwner>,
    pub timestamp: DateTime<Utc>,
    pub current_page: i64,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> FeedQuery {
        FeedQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_feed_query_defaults() {
        let q = query(None, None);
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 12);
    }

    #[test]
    fn test_feed_query_bounds() {
        assert_eq!(query(Some("0"), Some("0")).page(), 1);
        assert_eq!(query(Some("-4"), Some("0")).limit(), 1);
        assert_eq!(query(Some("3"), Some("500")).limit(), 100);
        assert_eq!(query(Some("abc"), Some("x")).page(), 1);
        assert_eq!(query(Some("abc"), Some("x")).limit(), 12);
        assert_eq!(query(Some(" 2 "), Some("5")).page(), 2);
    }

    #[test]
    fn test_video_with_owner_serializes_flat() {
        let now = Utc::now();
        let owner_id = Uuid::new_v4();
        let video = VideoWithOwner {
            video: Video {
                id: Uuid::new_v4(),
                video_file: "https://cdn.test/v.mp4".to_string(),
                thumbnail: "https://cdn.test/t.png".to_string(),
                title: "Hello World".to_string(),
                duration: 12.5,
                views: DEFAULT_VIEWS.to_string(),
                is_published: true,
                owner_id,
                created_at: now,
                updated_at: now,
            },
            owner: Some(OwnerSummary {
                id: owner_id,
                username: "alice".to_string(),
                full_name: "Alice Liddell".to_string(),
                avatar: "https://cdn.test/a.png".to_string(),
            }),
        };

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["title"], "Hello World");
        assert_eq!(json["videoFile"], "https://cdn.test/v.mp4");
        assert_eq!(json["isPublished"], true);
        assert_eq!(json["views"], "108k");
        assert_eq!(json["owner"]["fullName"], "Alice Liddell");
    }
}
