//! Video repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::VideoStore;
use crate::models::{NewVideo, Video, VideoWithOwner, video::{DEFAULT_VIEWS, VideoOwnerRow}};

const VIDEO_COLUMNS: &str = "id, video_file, thumbnail, title, duration, views, is_published, \
                             owner_id, created_at, updated_at";

const VIDEO_WITH_OWNER: &str = r#"
    SELECT v.id, v.video_file, v.thumbnail, v.title, v.duration, v.views, v.is_published,
           v.owner_id, v.created_at, v.updated_at,
           u.username AS owner_username, u.full_name AS owner_full_name, u.avatar AS owner_avatar
    FROM videos v
    LEFT JOIN users u ON u.id = v.owner_id
"#;

/// Video repository
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    /// Create a new video repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so terms match literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn insert(&self, new_video: &NewVideo) -> DatabaseResult<Video> {
        info!("Creating video '{}' for {}", new_video.title, new_video.owner_id);

        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO videos (id, video_file, thumbnail, title, duration, views, is_published,
                                owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8, $8)
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_video.video_file)
            .bind(&new_video.thumbnail)
            .bind(&new_video.title)
            .bind(new_video.duration)
            .bind(DEFAULT_VIEWS)
            .bind(new_video.owner_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<VideoWithOwner>> {
        let query = format!("{VIDEO_WITH_OWNER} WHERE v.id = $1");

        let row = sqlx::query_as::<_, VideoOwnerRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(row.map(VideoWithOwner::from))
    }

    async fn list_published(
        &self,
        offset: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<VideoWithOwner>> {
        let query = format!(
            "{VIDEO_WITH_OWNER} WHERE v.is_published \
             ORDER BY v.created_at DESC, v.id DESC LIMIT $1 OFFSET $2"
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(rows.into_iter().map(VideoWithOwner::from).collect())
    }

    async fn search_published(
        &self,
        terms: &[String],
        limit: i64,
    ) -> DatabaseResult<Vec<VideoWithOwner>> {
        let patterns: Vec<String> = terms.iter().map(|t| like_pattern(t)).collect();
        let query = format!(
            r#"{VIDEO_WITH_OWNER}
            WHERE v.is_published
              AND EXISTS (
                  SELECT 1 FROM unnest($1::text[]) AS p(pattern)
                  WHERE v.title ILIKE p.pattern ESCAPE '\'
                     OR u.full_name ILIKE p.pattern ESCAPE '\'
              )
            ORDER BY v.created_at DESC, v.id DESC
            LIMIT $2"#
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&query)
            .bind(&patterns)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(rows.into_iter().map(VideoWithOwner::from).collect())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        published_only: bool,
    ) -> DatabaseResult<Vec<Video>> {
        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos \
             WHERE owner_id = $1 AND (is_published OR NOT $2) \
             ORDER BY created_at DESC, id DESC"
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(owner_id)
            .bind(published_only)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("hello"), "%hello%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\"), "%c:\\\\%");
    }
}
