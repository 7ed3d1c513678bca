//! Object store error types

use thiserror::Error;

/// Object store errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Invalid object key: {key:?}")]
    InvalidKey { key: String },

    #[error("Object store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Result type for object store operations
pub type StorageResult<T> = Result<T, StorageError>;
