//! Error types for the work queue

use thiserror::Error;

/// Work queue errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Backend unreachable; callers back off and retry
    #[error("Queue unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Invalid queue name: {name:?}")]
    InvalidName { name: String },
}

impl QueueError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::Unavailable { .. })
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
