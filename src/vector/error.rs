//! Vector index error types

use thiserror::Error;

/// Vector index errors
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Failed to connect to vector index: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Failed to create collection: {reason}")]
    CollectionCreationFailed { reason: String },

    #[error("Failed to upsert vectors: {reason}")]
    UpsertFailed { reason: String },

    #[error("Failed to search vectors: {reason}")]
    SearchFailed { reason: String },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: u64, actual: u64 },

    #[error("Malformed point payload: {reason}")]
    MalformedPayload { reason: String },
}

impl VectorError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VectorError::ConnectionFailed { .. }
                | VectorError::UpsertFailed { .. }
                | VectorError::SearchFailed { .. }
        )
    }
}

/// Result type for vector operations
pub type VectorResult<T> = Result<T, VectorError>;
