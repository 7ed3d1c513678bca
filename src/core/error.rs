//! Error types for the gateway
//!
//! Each component owns its error enum; `GatewayError` gathers them for
//! callers that drive several components at once (startup, the binary).

use thiserror::Error;

use crate::ai::AiError;
use crate::ingestion::{ProcessError, SubmitError};
use crate::logging::LoggingError;
use crate::query::QueryError;
use crate::queue::QueueError;
use crate::storage::StorageError;
use crate::transport::TransportError;
use crate::vector::VectorError;

use super::config::ConfigError;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Vector index error: {0}")]
    Vector(#[from] VectorError),

    #[error("AI capability error: {0}")]
    Ai(#[from] AiError),

    #[error("Ingestion error: {0}")]
    Process(#[from] ProcessError),

    #[error("Upload error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Whether retrying the failed operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Queue(e) => e.is_retryable(),
            GatewayError::Vector(e) => e.is_retryable(),
            GatewayError::Ai(e) => e.is_retryable(),
            _ => false,
        }
    }
}
