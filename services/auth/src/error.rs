//! Error types for the authentication crate

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{ApiResponse, error::DatabaseError};
use thiserror::Error;

/// Session token failures
#[derive(Error, Debug)]
pub enum AuthError {
    /// No token in the cookie or the Authorization header
    #[error("Unauthorized request")]
    MissingToken,

    /// Bad signature, malformed payload or expired token
    #[error("Invalid access token")]
    InvalidToken,

    /// The token could not be signed
    #[error("Failed to sign session token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::Signing(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        ApiResponse::error(self.status_code(), message).into_response()
    }
}

/// Credential store failures
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Missing or malformed registration field
    #[error("{0}")]
    Validation(String),

    /// Username or email already taken
    #[error("User with email or username already exists")]
    Duplicate,

    /// No user with the requested id
    #[error("User not found")]
    NotFound,

    /// The stored hash could not be parsed
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    /// Hashing the password failed
    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for CredentialError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(_) => CredentialError::Duplicate,
            other => CredentialError::Database(other),
        }
    }
}

/// Type alias for credential store results
pub type CredentialResult<T> = Result<T, CredentialError>;
