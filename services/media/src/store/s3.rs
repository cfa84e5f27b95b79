use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, config::Region, error::DisplayErrorContext, primitives::ByteStream};
use std::path::Path;
use tracing::{error, info};

use super::{ObjectStore, StorageConfig};
use crate::error::ObjectStoreError;

/// S3 or S3-compatible object store
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    config: StorageConfig,
}

impl S3ObjectStore {
    /// Build a client from the default AWS credential chain
    pub async fn connect(config: StorageConfig) -> Result<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(
            "Using S3 bucket {} in {}{}",
            config.bucket,
            config.region,
            config
                .endpoint
                .as_deref()
                .map(|e| format!(" via {}", e))
                .unwrap_or_default()
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
            config,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| ObjectStoreError(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("S3 rejected upload of {}: {}", key, DisplayErrorContext(&e));
                ObjectStoreError(DisplayErrorContext(&e).to_string())
            })?;

        Ok(self.config.object_url(key))
    }
}
