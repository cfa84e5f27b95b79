//! Remote publisher
//!
//! Pushes staged files to object storage. The scratch file is gone when
//! [`Publisher::publish`] returns, whatever the outcome.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    metadata_extractor::MetadataExtractor,
    models::{PublishFailure, PublishOutcome, PublishedMedia},
    staging::StagedFile,
    store::ObjectStore,
};

/// Remote publisher
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    key_prefix: String,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Upload a staged file once and delete its scratch copy
    pub async fn publish(&self, file: StagedFile) -> PublishOutcome {
        let outcome = self.upload(&file).await;
        file.discard().await;

        match &outcome {
            PublishOutcome::Published(media) => {
                info!("Published {} as {} ({} bytes)", file.field(), media.url, media.bytes)
            }
            PublishOutcome::Failed(failure) => {
                warn!("Failed to publish {}: {}", file.field(), failure)
            }
        }

        outcome
    }

    async fn upload(&self, file: &StagedFile) -> PublishOutcome {
        let bytes = match check_readable(file.path()).await {
            Ok(bytes) => bytes,
            Err(failure) => return PublishOutcome::Failed(failure),
        };

        let duration = if file.is_video() {
            MetadataExtractor::probe_duration(file.path())
                .await
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let key = self.object_key(file);
        match self
            .store
            .put_file(&key, file.path(), file.content_type())
            .await
        {
            Ok(url) => PublishOutcome::Published(PublishedMedia {
                url,
                key,
                duration,
                bytes,
            }),
            Err(e) => PublishOutcome::Failed(PublishFailure::ProviderRejected(e.0)),
        }
    }

    /// `<prefix><videos|images>/<uuid>[.<ext>]`
    fn object_key(&self, file: &StagedFile) -> String {
        let folder = if file.is_video() { "videos" } else { "images" };
        let extension = file
            .original_name()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();

        format!("{}{}/{}{}", self.key_prefix, folder, Uuid::new_v4(), extension)
    }
}

/// Size of the file if it is a regular file we can open
async fn check_readable(path: &Path) -> Result<u64, PublishFailure> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PublishFailure::MissingFile);
        }
        Err(_) => return Err(PublishFailure::UnreadableFile),
    };

    if !metadata.is_file() {
        return Err(PublishFailure::UnreadableFile);
    }

    tokio::fs::File::open(path)
        .await
        .map_err(|_| PublishFailure::UnreadableFile)?;

    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use tempfile::TempDir;

    fn publisher() -> (MemoryObjectStore, Publisher) {
        let store = MemoryObjectStore::new("https://cdn.test");
        let publisher = Publisher::new(Arc::new(store.clone()), "uploads/");
        (store, publisher)
    }

    fn staged(dir: &TempDir, name: &str, content_type: &str, bytes: &[u8]) -> StagedFile {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        StagedFile::new(
            "thumbnail",
            path,
            content_type,
            Some("Thumb.PNG".to_string()),
            bytes.len() as u64,
        )
    }

    #[tokio::test]
    async fn test_publish_success_removes_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let (store, publisher) = publisher();
        let file = staged(&dir, "thumbnail-1-1", "image/png", b"png bytes");
        let path = file.path().to_path_buf();

        let media = publisher.publish(file).await.into_result().unwrap();

        assert!(!path.exists());
        assert!(media.key.starts_with("uploads/images/"));
        assert!(media.key.ends_with(".png"));
        assert_eq!(media.url, format!("https://cdn.test/{}", media.key));
        assert_eq!(media.bytes, 9);
        assert_eq!(media.duration, 0.0);

        let object = store.get(&media.key).await.unwrap();
        assert_eq!(object.bytes, b"png bytes");
        assert_eq!(object.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_publish_failure_removes_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let (store, publisher) = publisher();
        store.reject_uploads(true);
        let file = staged(&dir, "thumbnail-2-2", "image/png", b"png bytes");
        let path = file.path().to_path_buf();

        let outcome = publisher.publish(file).await;

        assert!(!path.exists());
        assert!(matches!(
            outcome,
            PublishOutcome::Failed(PublishFailure::ProviderRejected(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_publish_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (store, publisher) = publisher();
        let file = StagedFile::new(
            "videoFile",
            dir.path().join("gone"),
            "video/mp4",
            None,
            0,
        );

        assert_eq!(
            publisher.publish(file).await,
            PublishOutcome::Failed(PublishFailure::MissingFile)
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_publish_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, publisher) = publisher();
        let sub = dir.path().join("not-a-file");
        std::fs::create_dir(&sub).unwrap();
        let file = StagedFile::new("videoFile", sub, "video/mp4", None, 0);

        assert_eq!(
            publisher.publish(file).await,
            PublishOutcome::Failed(PublishFailure::UnreadableFile)
        );
    }

    #[tokio::test]
    async fn test_unprobeable_video_publishes_with_zero_duration() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, publisher) = publisher();
        let file = staged(&dir, "videoFile-3-3", "video/mp4", b"not really mp4");

        let media = publisher.publish(file).await.into_result().unwrap();

        assert!(media.key.starts_with("uploads/videos/"));
        assert_eq!(media.duration, 0.0);
    }
}
