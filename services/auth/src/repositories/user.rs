//! User repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, password_hash, \
                            watch_history, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, new_user: &NewUser, password_hash: &str) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let query = format!(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.full_name)
            .bind(&new_user.avatar)
            .bind(&new_user.cover_image)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    async fn find_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> DatabaseResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(username_or_email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> DatabaseResult<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                cover_image = COALESCE($3, cover_image),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&changes.full_name)
            .bind(&changes.cover_image)
            .bind(&changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET watch_history = array_append(watch_history, $2) WHERE id = $1",
        )
        .bind(id)
        .bind(video_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
