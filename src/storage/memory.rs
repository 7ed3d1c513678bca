//! In-memory object store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::{StorageError, StorageResult};
use super::{validate_key, ObjectStore};

/// Object store holding everything in a map keyed by `(bucket, key)`
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .read()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> StorageResult<String> {
        validate_key(bucket)?;
        validate_key(key)?;
        self.objects
            .write()
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(key.to_string())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.objects
            .write()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
