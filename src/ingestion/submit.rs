//! Upload submission: store the document, then enqueue it

use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use super::error::SubmitError;
use crate::core::types::JobDescriptor;
use crate::queue::WorkQueue;
use crate::storage::ObjectStore;

/// Fresh object key: a time-ordered UUID plus the original extension
pub fn object_key_for(filename: &str) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}{}", Uuid::now_v7(), extension)
}

/// Store `data` under a fresh key and push a job for it.
///
/// If the push fails the stored object is deleted again, so an accepted
/// upload is always queued and a rejected one leaves nothing behind.
pub async fn submit_document(
    store: &dyn ObjectStore,
    queue: &dyn WorkQueue,
    bucket: &str,
    queue_name: &str,
    filename: &str,
    data: Vec<u8>,
) -> Result<JobDescriptor, SubmitError> {
    if data.is_empty() {
        return Err(SubmitError::EmptyDocument);
    }

    let size = data.len();
    let key = store
        .put(bucket, &object_key_for(filename), data)
        .await
        .map_err(|e| SubmitError::Store {
            reason: e.to_string(),
        })?;

    let job = JobDescriptor::new(key.clone()).enqueued_now();
    let enqueue = match job.to_payload() {
        Ok(payload) => queue.push(queue_name, payload).await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    if let Err(reason) = enqueue {
        if let Err(e) = store.delete(bucket, &key).await {
            warn!(storage_key = %key, error = %e, "failed to remove orphaned upload");
        }
        return Err(SubmitError::Enqueue { key, reason });
    }

    info!(filename, storage_key = %key, size, "document accepted for ingestion");
    Ok(job)
}
