//! Credential store: user records plus password hashing and verification
//!
//! A password is hashed exactly once per value: on registration, and again
//! only when an update actually carries a new password.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{CredentialError, CredentialResult},
    models::{NewUser, UpdateUser, User, UserChanges, normalize_identifier},
    repositories::UserStore,
    validation,
};

/// Credential store
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn UserStore>,
}

impl CredentialStore {
    /// Create a credential store over a user store
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Register a user, storing only a one-way hash of `raw_password`
    pub async fn create(&self, new_user: NewUser, raw_password: &str) -> CredentialResult<User> {
        let new_user = new_user.normalized();
        validation::validate_new_user(&new_user, raw_password)
            .map_err(CredentialError::Validation)?;

        if self.is_taken(&new_user.username, &new_user.email).await? {
            return Err(CredentialError::Duplicate);
        }

        let password_hash = hash_password(raw_password)?;
        let user = self.store.insert(&new_user, &password_hash).await?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Whether a username or email is already registered
    pub async fn is_taken(&self, username: &str, email: &str) -> CredentialResult<bool> {
        let username = normalize_identifier(username);
        let email = normalize_identifier(email);

        if self.store.find_by_username_or_email(&username).await?.is_some() {
            return Ok(true);
        }

        Ok(self.store.find_by_username_or_email(&email).await?.is_some())
    }

    /// Compare a raw password against a stored hash
    ///
    /// A mismatch is `Ok(false)`; only a malformed stored hash is an error.
    pub fn verify(stored_hash: &str, raw_password: &str) -> CredentialResult<bool> {
        let parsed_hash = PasswordHash::new(stored_hash)
            .map_err(|e| CredentialError::MalformedHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(raw_password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Look up a user by username or email and check the password
    ///
    /// Returns `None` both for unknown identifiers and wrong passwords.
    pub async fn authenticate(
        &self,
        identifier: &str,
        raw_password: &str,
    ) -> CredentialResult<Option<User>> {
        let Some(user) = self.find_by_identifier(identifier).await? else {
            return Ok(None);
        };

        if Self::verify(&user.password_hash, raw_password)? {
            Ok(Some(user))
        } else {
            warn!("Password mismatch for user {}", user.id);
            Ok(None)
        }
    }

    /// Find a user by username or email, ignoring case and surrounding spaces
    pub async fn find_by_identifier(&self, identifier: &str) -> CredentialResult<Option<User>> {
        let identifier = normalize_identifier(identifier);
        if identifier.is_empty() {
            return Ok(None);
        }

        Ok(self.store.find_by_username_or_email(&identifier).await?)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> CredentialResult<Option<User>> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Update profile fields; the password is re-hashed only when it is part of the change
    pub async fn update(&self, id: Uuid, changes: UpdateUser) -> CredentialResult<User> {
        let full_name = match changes.full_name {
            Some(name) => {
                validation::validate_required("Full name", &name)
                    .map_err(CredentialError::Validation)?;
                Some(name.trim().to_string())
            }
            None => None,
        };

        let password_hash = match changes.password {
            Some(password) => {
                validation::validate_required("Password", &password)
                    .map_err(CredentialError::Validation)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            full_name,
            cover_image: changes.cover_image,
            password_hash,
        };

        self.store
            .update(id, &changes)
            .await?
            .ok_or(CredentialError::NotFound)
    }

    /// Append a video to the user's watch history
    pub async fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> CredentialResult<()> {
        if self.store.push_watch_history(user_id, video_id).await? {
            Ok(())
        } else {
            Err(CredentialError::NotFound)
        }
    }
}

fn hash_password(raw_password: &str) -> CredentialResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());

    Argon2::default()
        .hash_password(raw_password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}
