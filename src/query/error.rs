//! Query path error types

use thiserror::Error;

/// Stage failures of the query path. Surfaced to the caller in-band as a
/// single `Error` event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Failed to embed query: {reason}")]
    Embed { reason: String },

    #[error("Failed to retrieve context: {reason}")]
    Retrieve { reason: String },

    #[error("Generation failed: {reason}")]
    Generate { reason: String },
}
