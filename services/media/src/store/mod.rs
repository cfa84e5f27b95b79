//! Durable object storage
//!
//! The publisher only sees [`ObjectStore`]; production uses S3 (or any
//! S3-compatible provider), tests and local development use the in-process
//! backend.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::error::ObjectStoreError;

pub mod memory;
pub mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Upload access to an object storage provider
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the local file at `path` under `key`, returning its public URL
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<String, ObjectStoreError>;
}

/// Which object store backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Memory,
}

/// Object storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers
    pub endpoint: Option<String>,
    /// Base URL objects are served from
    pub public_base_url: Option<String>,
    /// Prefix prepended to every object key
    pub key_prefix: String,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `STORAGE_BACKEND`: `s3` or `memory` (default: s3)
    /// - `S3_BUCKET`: Bucket name (default: vidshare-media)
    /// - `S3_REGION`: Region (default: us-east-1)
    /// - `S3_ENDPOINT`: Endpoint override for S3-compatible providers
    /// - `S3_PUBLIC_BASE_URL`: Base of the canonical object URLs
    /// - `S3_KEY_PREFIX`: Key prefix (default: empty)
    pub fn from_env() -> Result<Self> {
        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "memory" => StorageBackend::Memory,
            other => anyhow::bail!("Unknown STORAGE_BACKEND: {}", other),
        };

        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Ok(StorageConfig {
            backend,
            bucket: non_empty("S3_BUCKET").unwrap_or_else(|| "vidshare-media".to_string()),
            region: non_empty("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint: non_empty("S3_ENDPOINT"),
            public_base_url: non_empty("S3_PUBLIC_BASE_URL"),
            key_prefix: std::env::var("S3_KEY_PREFIX").unwrap_or_default(),
        })
    }

    /// Canonical URL of an object
    pub fn object_url(&self, key: &str) -> String {
        if let Some(base) = &self.public_base_url {
            return format!("{}/{}", base.trim_end_matches('/'), key);
        }

        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config() -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::S3,
            bucket: "media".to_string(),
            region: "eu-central-1".to_string(),
            endpoint: None,
            public_base_url: None,
            key_prefix: String::new(),
        }
    }

    #[test]
    fn test_object_url_variants() {
        let mut config = config();
        assert_eq!(
            config.object_url("videos/a.mp4"),
            "https://media.s3.eu-central-1.amazonaws.com/videos/a.mp4"
        );

        config.endpoint = Some("http://localhost:9000/".to_string());
        assert_eq!(
            config.object_url("videos/a.mp4"),
            "http://localhost:9000/media/videos/a.mp4"
        );

        config.public_base_url = Some("https://cdn.example.com/".to_string());
        assert_eq!(
            config.object_url("videos/a.mp4"),
            "https://cdn.example.com/videos/a.mp4"
        );
    }

    #[test]
    #[serial]
    fn test_storage_config_from_env() {
        unsafe {
            std::env::set_var("STORAGE_BACKEND", "Memory");
            std::env::set_var("S3_BUCKET", "clips");
            std::env::set_var("S3_ENDPOINT", "");
            std::env::remove_var("S3_KEY_PREFIX");
        }
        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.bucket, "clips");
        assert_eq!(config.endpoint, None);
        assert_eq!(config.key_prefix, "");

        unsafe {
            std::env::set_var("STORAGE_BACKEND", "ftp");
        }
        assert!(StorageConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("STORAGE_BACKEND");
            std::env::remove_var("S3_BUCKET");
            std::env::remove_var("S3_ENDPOINT");
        }
    }
}
