//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::jwt::Identity;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Identity embedded in this user's session tokens
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// New user creation payload
///
/// The password travels separately so it never sits next to persisted fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

impl NewUser {
    /// Lower-case and trim the identity fields, trim the display name
    pub fn normalized(self) -> Self {
        NewUser {
            username: normalize_identifier(&self.username),
            email: normalize_identifier(&self.email),
            full_name: self.full_name.trim().to_string(),
            avatar: self.avatar.trim().to_string(),
            cover_image: self
                .cover_image
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        }
    }
}

/// User update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub cover_image: Option<String>,
    pub password: Option<String>,
}

/// Column-level changes handed to the store; the password is already hashed
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub cover_image: Option<String>,
    pub password_hash: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginCredentials {
    #[serde(alias = "email", alias = "username", default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Normalize a username or email for storage and lookup
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}
