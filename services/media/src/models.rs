use serde::{Deserialize, Serialize};
use std::fmt;

/// Technical metadata read from a media file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub duration: Option<f64>,
}

/// Result of pushing one staged file to object storage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedMedia {
    /// Canonical public URL of the object
    pub url: String,
    /// Object key inside the bucket
    pub key: String,
    /// Duration in seconds, 0 when unknown or not a video
    pub duration: f64,
    /// Size of the uploaded file
    pub bytes: u64,
}

/// Why a staged file could not be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishFailure {
    MissingFile,
    UnreadableFile,
    ProviderRejected(String),
}

impl fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishFailure::MissingFile => write!(f, "staged file is missing"),
            PublishFailure::UnreadableFile => write!(f, "staged file is not readable"),
            PublishFailure::ProviderRejected(message) => {
                write!(f, "object storage rejected the upload: {}", message)
            }
        }
    }
}

/// Outcome of a publish call
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published(PublishedMedia),
    Failed(PublishFailure),
}

impl PublishOutcome {
    pub fn into_result(self) -> Result<PublishedMedia, PublishFailure> {
        match self {
            PublishOutcome::Published(media) => Ok(media),
            PublishOutcome::Failed(failure) => Err(failure),
        }
    }
}
