//! Ingestion job descriptors
//!
//! A job identifies one uploaded artifact awaiting ETL processing. On the
//! wire it is either a JSON object or, for compatibility with producers that
//! only push the key, the bare storage key string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One uploaded document awaiting processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Persisted document record, when the upload path tracks one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<u64>,

    /// Object key inside the document bucket
    pub storage_key: String,

    /// When the job was pushed onto the queue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enqueued_at: Option<DateTime<Utc>>,
}

impl JobDescriptor {
    /// Create a job for a storage key
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            document_id: None,
            storage_key: storage_key.into(),
            enqueued_at: None,
        }
    }

    /// Attach a persisted document id
    pub fn with_document_id(mut self, document_id: u64) -> Self {
        self.document_id = Some(document_id);
        self
    }

    /// Stamp the enqueue time
    pub fn enqueued_now(mut self) -> Self {
        self.enqueued_at = Some(Utc::now());
        self
    }

    /// Decode a queue payload.
    ///
    /// JSON objects are decoded as descriptors; anything else is taken to be
    /// a bare storage key. Returns `None` for blank payloads.
    pub fn from_payload(payload: &str) -> Option<Self> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with('{') {
            return serde_json::from_str::<JobDescriptor>(trimmed)
                .ok()
                .filter(|job| !job.storage_key.trim().is_empty());
        }

        Some(Self::new(trimmed))
    }

    /// Encode as a queue payload
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
