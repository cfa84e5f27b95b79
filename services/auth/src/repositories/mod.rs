//! User persistence
//!
//! The credential store talks to users through [`UserStore`], so the same
//! logic runs against PostgreSQL in production and against the in-process
//! store in tests and local development.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewUser, User, UserChanges};

pub mod memory;
pub mod user;

pub use memory::MemoryUserStore;
pub use user::UserRepository;

/// CRUD access to user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a normalized user with an already hashed password
    async fn insert(&self, new_user: &NewUser, password_hash: &str) -> DatabaseResult<User>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    /// Find a user whose username or email equals `username_or_email`
    async fn find_by_username_or_email(&self, username_or_email: &str)
    -> DatabaseResult<Option<User>>;

    /// Apply column changes, returning the updated user if it exists
    async fn update(&self, id: Uuid, changes: &UserChanges) -> DatabaseResult<Option<User>>;

    /// Append a video to the user's watch history
    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> DatabaseResult<bool>;
}
