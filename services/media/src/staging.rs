//! Upload staging
//!
//! Streams multipart file fields to a local scratch directory under unique
//! names. Every staged file is owned by a [`StagedFile`] guard: whatever is not
//! handed to the publisher is removed from disk when the guard is dropped.

use anyhow::Result;
use axum::extract::Multipart;
use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{UploadError, UploadResult};

/// Default per-file ceiling: 100 MB
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Default scratch directory
pub const DEFAULT_SCRATCH_DIR: &str = "./public/temp";

/// Staging configuration
#[derive(Debug, Clone)]
pub struct StagingConfig {
    pub scratch_dir: PathBuf,
    pub max_file_bytes: u64,
}

impl StagingConfig {
    /// Create a new StagingConfig from environment variables
    ///
    /// # Environment Variables
    /// - `UPLOAD_SCRATCH_DIR`: Local directory for staged files (default: ./public/temp)
    /// - `UPLOAD_MAX_FILE_BYTES`: Per-file size ceiling in bytes (default: 104857600)
    pub fn from_env() -> Result<Self> {
        let scratch_dir = std::env::var("UPLOAD_SCRATCH_DIR")
            .unwrap_or_else(|_| DEFAULT_SCRATCH_DIR.to_string());

        let max_file_bytes = match std::env::var("UPLOAD_MAX_FILE_BYTES") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("Invalid UPLOAD_MAX_FILE_BYTES: {}", e))?,
            Err(_) => DEFAULT_MAX_FILE_BYTES,
        };

        Ok(StagingConfig {
            scratch_dir: PathBuf::from(scratch_dir),
            max_file_bytes,
        })
    }
}

/// A file field accepted by an endpoint; at most one file per field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileField {
    pub name: &'static str,
    pub required: bool,
}

impl FileField {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

/// A file written to the scratch directory
///
/// The file is deleted when the guard is dropped.
#[derive(Debug)]
pub struct StagedFile {
    field: String,
    path: PathBuf,
    content_type: String,
    original_name: Option<String>,
    size: u64,
}

impl StagedFile {
    /// Wrap a file that already sits in scratch storage
    pub fn new(
        field: impl Into<String>,
        path: impl Into<PathBuf>,
        content_type: impl Into<String>,
        original_name: Option<String>,
        size: u64,
    ) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
            content_type: content_type.into(),
            original_name,
            size,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }

    /// Remove the scratch file now
    pub async fn discard(&self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove scratch file {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed unpublished scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove scratch file {}: {}", self.path.display(), e),
        }
    }
}

/// Files and text fields read from one multipart body
#[derive(Debug, Default)]
pub struct StagedUpload {
    files: HashMap<String, StagedFile>,
    fields: HashMap<String, String>,
}

impl StagedUpload {
    /// Take ownership of the file staged for `field`
    pub fn take_file(&mut self, field: &str) -> Option<StagedFile> {
        self.files.remove(field)
    }

    /// Value of a text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Upload staging area
#[derive(Debug, Clone)]
pub struct UploadStaging {
    config: StagingConfig,
}

impl UploadStaging {
    pub fn new(config: StagingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Stream every part of `multipart` to scratch storage or the text map
    ///
    /// On error, files staged so far are removed before returning.
    pub async fn stage(
        &self,
        mut multipart: Multipart,
        accepted: &[FileField],
    ) -> UploadResult<StagedUpload> {
        fs::create_dir_all(&self.config.scratch_dir).await?;

        let mut upload = StagedUpload::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(original_name) = field.file_name().map(str::to_string) else {
                let value = field.text().await?;
                upload.fields.insert(name, value);
                continue;
            };

            let declared = accepted.iter().any(|f| f.name == name);
            if !declared || upload.files.contains_key(&name) {
                return Err(UploadError::UnexpectedField(name));
            }

            let content_type = field.content_type().unwrap_or_default().to_string();
            if !is_accepted_media_type(&content_type) {
                return Err(UploadError::UnsupportedType(content_type));
            }

            let path = self.config.scratch_dir.join(scratch_file_name(&name));
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await?;

            let mut staged = StagedFile::new(
                name.clone(),
                path,
                content_type,
                Some(original_name),
                0,
            );

            while let Some(chunk) = field.chunk().await? {
                staged.size += chunk.len() as u64;
                if staged.size > self.config.max_file_bytes {
                    return Err(UploadError::TooLarge {
                        field: name,
                        limit: self.config.max_file_bytes,
                    });
                }
                file.write_all(&chunk).await?;
            }
            file.flush().await?;

            debug!(
                "Staged {} ({} bytes) at {}",
                name,
                staged.size,
                staged.path.display()
            );
            upload.files.insert(name, staged);
        }

        if let Some(missing) = accepted
            .iter()
            .find(|field| field.required && !upload.files.contains_key(field.name))
        {
            return Err(UploadError::MissingFile(missing.name.to_string()));
        }

        info!("Staged {} file(s)", upload.files.len());
        Ok(upload)
    }
}

fn is_accepted_media_type(content_type: &str) -> bool {
    content_type.starts_with("video/") || content_type.starts_with("image/")
}

/// `<field>-<unix millis>-<random 0..1e9>`
fn scratch_file_name(field: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);

    format!("{}-{}-{}", field, millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, header::CONTENT_TYPE},
    };
    use serial_test::serial;
    use tempfile::TempDir;

    const BOUNDARY: &str = "staging-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str, &'a [u8]),
    }

    async fn multipart(parts: &[Part<'_>]) -> Multipart {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
                Part::File(name, file_name, content_type, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    fn staging(max_file_bytes: u64) -> (TempDir, UploadStaging) {
        let dir = tempfile::tempdir().unwrap();
        let staging = UploadStaging::new(StagingConfig {
            scratch_dir: dir.path().join("temp"),
            max_file_bytes,
        });
        (dir, staging)
    }

    fn scratch_entries(staging: &UploadStaging) -> usize {
        std::fs::read_dir(&staging.config().scratch_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    const VIDEO_FIELDS: &[FileField] = &[
        FileField::required("videoFile"),
        FileField::required("thumbnail"),
    ];

    #[tokio::test]
    async fn test_stage_files_and_text_fields() {
        let (_dir, staging) = staging(DEFAULT_MAX_FILE_BYTES);
        let body = multipart(&[
            Part::Text("title", "Hello World"),
            Part::File("videoFile", "clip.mp4", "video/mp4", b"fake video bytes"),
            Part::File("thumbnail", "thumb.png", "image/png", b"fake png"),
        ])
        .await;

        let mut upload = staging.stage(body, VIDEO_FIELDS).await.unwrap();

        assert_eq!(upload.text("title"), Some("Hello World"));

        let video = upload.take_file("videoFile").unwrap();
        assert_eq!(video.content_type(), "video/mp4");
        assert_eq!(video.original_name(), Some("clip.mp4"));
        assert_eq!(video.size(), 16);
        assert!(video.is_video());
        assert_eq!(std::fs::read(video.path()).unwrap(), b"fake video bytes");

        let file_name = video.path().file_name().unwrap().to_str().unwrap();
        let parts: Vec<&str> = file_name.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "videoFile");
        assert!(parts[1].parse::<u128>().is_ok());
        assert!(parts[2].parse::<u32>().unwrap() < 1_000_000_000);
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected() {
        let (_dir, staging) = staging(DEFAULT_MAX_FILE_BYTES);
        let body = multipart(&[Part::File(
            "videoFile",
            "notes.txt",
            "text/plain",
            b"hello",
        )])
        .await;

        let err = staging.stage(body, VIDEO_FIELDS).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type! Only video and image files are allowed."
        );
        assert_eq!(scratch_entries(&staging), 0);
    }

    #[tokio::test]
    async fn test_unknown_and_repeated_fields_rejected() {
        let (_dir, staging) = staging(DEFAULT_MAX_FILE_BYTES);
        let body = multipart(&[Part::File("poster", "p.png", "image/png", b"png")]).await;
        let err = staging.stage(body, VIDEO_FIELDS).await.unwrap_err();
        assert_eq!(err.to_string(), "Unexpected field");

        let body = multipart(&[
            Part::File("thumbnail", "a.png", "image/png", b"a"),
            Part::File("thumbnail", "b.png", "image/png", b"b"),
        ])
        .await;
        let err = staging.stage(body, VIDEO_FIELDS).await.unwrap_err();
        assert!(matches!(err, UploadError::UnexpectedField(ref f) if f == "thumbnail"));
        assert_eq!(scratch_entries(&staging), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_removed() {
        let (_dir, staging) = staging(8);
        let body = multipart(&[Part::File(
            "videoFile",
            "clip.mp4",
            "video/mp4",
            b"more than eight bytes",
        )])
        .await;

        let err = staging.stage(body, VIDEO_FIELDS).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { limit: 8, .. }));
        assert_eq!(scratch_entries(&staging), 0);
    }

    #[tokio::test]
    async fn test_missing_required_file() {
        let (_dir, staging) = staging(DEFAULT_MAX_FILE_BYTES);
        let body = multipart(&[
            Part::Text("title", "No thumbnail"),
            Part::File("videoFile", "clip.mp4", "video/mp4", b"video"),
        ])
        .await;

        let err = staging.stage(body, VIDEO_FIELDS).await.unwrap_err();
        assert!(matches!(err, UploadError::MissingFile(ref f) if f == "thumbnail"));
        assert_eq!(scratch_entries(&staging), 0);
    }

    #[tokio::test]
    async fn test_optional_file_may_be_absent() {
        let (_dir, staging) = staging(DEFAULT_MAX_FILE_BYTES);
        let body = multipart(&[Part::File("avatar", "me.jpg", "image/jpeg", b"jpeg")]).await;

        let mut upload = staging
            .stage(
                body,
                &[FileField::required("avatar"), FileField::optional("coverImage")],
            )
            .await
            .unwrap();

        assert!(upload.take_file("coverImage").is_none());
        assert!(upload.take_file("avatar").is_some());
        assert!(upload.take_file("avatar").is_none());
    }

    #[tokio::test]
    async fn test_dropping_upload_removes_scratch_files() {
        let (_dir, staging) = staging(DEFAULT_MAX_FILE_BYTES);
        let body = multipart(&[
            Part::File("videoFile", "clip.mp4", "video/mp4", b"video"),
            Part::File("thumbnail", "thumb.png", "image/png", b"png"),
        ])
        .await;

        let upload = staging.stage(body, VIDEO_FIELDS).await.unwrap();
        assert_eq!(scratch_entries(&staging), 2);

        drop(upload);
        assert_eq!(scratch_entries(&staging), 0);
    }

    #[test]
    #[serial]
    fn test_staging_config_from_env() {
        unsafe {
            std::env::remove_var("UPLOAD_SCRATCH_DIR");
            std::env::remove_var("UPLOAD_MAX_FILE_BYTES");
        }
        let config = StagingConfig::from_env().unwrap();
        assert_eq!(config.scratch_dir, PathBuf::from(DEFAULT_SCRATCH_DIR));
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);

        unsafe {
            std::env::set_var("UPLOAD_SCRATCH_DIR", "/tmp/vidshare-scratch");
            std::env::set_var("UPLOAD_MAX_FILE_BYTES", "1024");
        }
        let config = StagingConfig::from_env().unwrap();
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp/vidshare-scratch"));
        assert_eq!(config.max_file_bytes, 1024);

        unsafe {
            std::env::set_var("UPLOAD_MAX_FILE_BYTES", "lots");
        }
        assert!(StagingConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("UPLOAD_SCRATCH_DIR");
            std::env::remove_var("UPLOAD_MAX_FILE_BYTES");
        }
    }
}
