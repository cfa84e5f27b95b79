//! Error types for the media crate

use axum::extract::multipart::MultipartError;
use thiserror::Error;

/// Upload staging failures
#[derive(Error, Debug)]
pub enum UploadError {
    /// Declared media type is neither `video/*` nor `image/*`
    #[error("Unsupported file type! Only video and image files are allowed.")]
    UnsupportedType(String),

    /// A file field outside the declared set, or a second file for one field
    #[error("Unexpected field")]
    UnexpectedField(String),

    /// A required file field was not sent
    #[error("{0} file is required")]
    MissingFile(String),

    /// A file grew past the per-file ceiling while streaming
    #[error("File too large: {field} exceeds {limit} bytes")]
    TooLarge { field: String, limit: u64 },

    /// The multipart body could not be parsed
    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    /// Writing to the scratch directory failed
    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Multipart(err.body_text())
    }
}

/// Object storage provider failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ObjectStoreError(pub String);

/// Type alias for staging results
pub type UploadResult<T> = Result<T, UploadError>;
