//! Error types for document ingestion

use thiserror::Error;

/// Failure of a single ETL run. Aborts the remaining steps for that job.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Object store unreachable or key missing
    #[error("Failed to fetch '{key}': {reason}")]
    Fetch { key: String, reason: String },

    /// Parse/embed call failed
    #[error("Failed to parse '{key}': {reason}")]
    Parse { key: String, reason: String },

    /// Index write failed
    #[error("Failed to upsert points for '{key}': {reason}")]
    Upsert { key: String, reason: String },

    /// Queue payload could not be decoded into a job
    #[error("Invalid job payload: {reason}")]
    InvalidJob { reason: String },
}

impl ProcessError {
    /// Storage key of the affected job, if known
    pub fn storage_key(&self) -> Option<&str> {
        match self {
            ProcessError::Fetch { key, .. }
            | ProcessError::Parse { key, .. }
            | ProcessError::Upsert { key, .. } => Some(key),
            ProcessError::InvalidJob { .. } => None,
        }
    }
}

/// Failure to accept an uploaded document
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Uploaded document is empty")]
    EmptyDocument,

    #[error("Failed to store document: {reason}")]
    Store { reason: String },

    #[error("Failed to enqueue document '{key}': {reason}")]
    Enqueue { key: String, reason: String },
}
