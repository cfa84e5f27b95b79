//! In-process user store for tests and local development

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, User, UserChanges};

/// User store backed by a map guarded by an async lock
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user outright, leaving anything that references it untouched
    pub async fn remove(&self, id: Uuid) -> bool {
        self.users.write().await.remove(&id).is_some()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new_user: &NewUser, password_hash: &str) -> DatabaseResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::UniqueViolation("users_username_key".into()));
        }
        if users.values().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::UniqueViolation("users_email_key".into()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            full_name: new_user.full_name.clone(),
            avatar: new_user.avatar.clone(),
            cover_image: new_user.cover_image.clone(),
            password_hash: password_hash.to_string(),
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> DatabaseResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username_or_email || u.email == username_or_email)
            .cloned())
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> DatabaseResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(full_name) = &changes.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(cover_image) = &changes.cover_image {
            user.cover_image = Some(cover_image.clone());
        }
        if let Some(password_hash) = &changes.password_hash {
            user.password_hash = password_hash.clone();
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> DatabaseResult<bool> {
        match self.users.write().await.get_mut(&id) {
            Some(user) => {
                user.watch_history.push(video_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
