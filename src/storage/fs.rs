//! Filesystem-backed object store
//!
//! Each bucket is a directory under the root; each object is a file.
//! Writes go to a temp file first and are renamed into place, so readers
//! never observe a partially written object.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use super::{validate_key, ObjectStore};

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`; the directory is created lazily
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_key(bucket)?;
        validate_key(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> StorageResult<String> {
        let path = self.object_path(bucket, key)?;
        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;

        let temp_path = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        let size = data.len();
        tokio::fs::write(&temp_path, data).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        debug!(bucket, key, size, "stored object");
        Ok(key.to_string())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
