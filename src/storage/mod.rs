//! Object store contract
//!
//! Uploaded documents live in a bucket/key namespace. The ingestion
//! pipeline reads them back by key; the upload path writes them.

mod error;
mod fs;
mod memory;


pub use error::{StorageError, StorageResult};
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

use async_trait::async_trait;

/// Bucketed blob storage.
///
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the whole object at `bucket/key`
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Store `data` at `bucket/key`, replacing any previous object. Returns the key.
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Remove `bucket/key`; removing a missing object is not an error
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;
}

/// Reject keys that could escape their bucket
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let invalid = key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key == "."
        || key == ".."
        || key.contains('\0');

    if invalid {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}
