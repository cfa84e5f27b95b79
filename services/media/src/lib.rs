//! Media library
//!
//! Upload staging to local scratch storage and publication of staged files
//! to object storage.

pub mod error;
pub mod metadata_extractor;
pub mod models;
pub mod publisher;
pub mod staging;
pub mod store;

pub use error::{ObjectStoreError, UploadError, UploadResult};
pub use models::{PublishFailure, PublishOutcome, PublishedMedia};
pub use publisher::Publisher;
pub use staging::{FileField, StagedFile, StagedUpload, StagingConfig, UploadStaging};
pub use store::{MemoryObjectStore, ObjectStore, S3ObjectStore, StorageBackend, StorageConfig};
