//! Custom error types for the API service

use auth::{AuthError, CredentialError};
use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{ApiResponse, error::DatabaseError};
use media::{PublishFailure, UploadError};
use thiserror::Error;
use tracing::error;

use crate::catalog::CatalogError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or rejected credentials
    #[error("{0}")]
    Authentication(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Staging or publishing a file failed
    #[error("{0}")]
    Upload(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Internal(_) | ApiError::Database(_) => {
                error!("{}", self);
                "Internal server error".to_string()
            }
            ApiError::Validation(msg)
            | ApiError::Authentication(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Upload(msg) => msg,
        };

        ApiResponse::error(status, message).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken => {
                ApiError::Authentication(err.to_string())
            }
            AuthError::Signing(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Validation(msg) => ApiError::Validation(msg),
            CredentialError::Duplicate => ApiError::Validation(err.to_string()),
            CredentialError::NotFound => ApiError::NotFound(err.to_string()),
            CredentialError::MalformedHash(_) | CredentialError::Hashing(_) => {
                ApiError::Internal(err.to_string())
            }
            CredentialError::Database(db) => ApiError::Database(db),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(_) => ApiError::Internal(err.to_string()),
            other => ApiError::Upload(other.to_string()),
        }
    }
}

impl From<PublishFailure> for ApiError {
    fn from(failure: PublishFailure) -> Self {
        ApiError::Upload(format!("Failed to upload file: {}", failure))
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => ApiError::Validation(msg),
            CatalogError::NotFound | CatalogError::OwnerNotFound => {
                ApiError::NotFound(err.to_string())
            }
            CatalogError::Forbidden => ApiError::Forbidden(err.to_string()),
            CatalogError::Database(db) => ApiError::Database(db),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Upload(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
