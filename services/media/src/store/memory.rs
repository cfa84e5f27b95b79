//! In-process object store for tests and local development

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::RwLock;

use super::ObjectStore;
use crate::error::ObjectStoreError;

/// An object held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Object store keeping uploads in a map
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    base_url: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    rejecting: Arc<AtomicBool>,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Arc::default(),
            rejecting: Arc::default(),
        }
    }

    /// Make every following upload fail (or succeed again)
    pub fn reject_uploads(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("http://localhost:8000/media")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(ObjectStoreError("upload rejected".to_string()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ObjectStoreError(e.to_string()))?;

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );

        Ok(format!("{}/{}", self.base_url, key))
    }
}
