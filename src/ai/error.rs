//! Error types for the AI capability client

use thiserror::Error;

/// AI capability errors
#[derive(Debug, Error)]
pub enum AiError {
    /// Service could not be reached
    #[error("AI service unavailable: {reason}")]
    Unavailable { reason: String },

    /// Request timed out
    #[error("AI request timed out: {reason}")]
    Timeout { reason: String },

    /// Service answered with a non-success status
    #[error("AI service rejected request: HTTP {status}: {reason}")]
    Rejected { status: u16, reason: String },

    /// Response body could not be decoded
    #[error("Malformed AI response: {reason}")]
    Protocol { reason: String },

    /// Payload exceeds the configured message ceiling
    #[error("Message too large: {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge { size: usize, limit: usize },

    /// Client setup or request construction failed
    #[error("AI client error: {reason}")]
    Client { reason: String },
}

impl AiError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Unavailable { .. } | AiError::Timeout { .. } => true,
            AiError::Rejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AiError::Timeout {
                reason: err.to_string(),
            }
        } else if err.is_connect() {
            AiError::Unavailable {
                reason: format!("Connection failed: {}", err),
            }
        } else if err.is_decode() {
            AiError::Protocol {
                reason: err.to_string(),
            }
        } else {
            AiError::Client {
                reason: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(err: serde_json::Error) -> Self {
        AiError::Protocol {
            reason: err.to_string(),
        }
    }
}

/// Result type for AI capability operations
pub type AiResult<T> = Result<T, AiError>;
