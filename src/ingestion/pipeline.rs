//! ETL pipeline: object store -> AI capability -> vector index

use std::sync::Arc;

use tracing::debug;

use super::error::ProcessError;
use crate::ai::AiCapability;
use crate::core::types::{Chunk, IndexPoint, JobDescriptor};
use crate::storage::ObjectStore;
use crate::vector::VectorIndex;

/// Map chunks to index points, in emission order.
///
/// Every point gets a fresh id, so running the same chunks twice yields
/// two disjoint sets of points.
pub fn build_points(filename: &str, chunks: Vec<Chunk>) -> Vec<IndexPoint> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| IndexPoint::from_chunk(filename, i, chunk))
        .collect()
}

/// Moves one document from the object store into the vector index
pub struct EtlPipeline {
    store: Arc<dyn ObjectStore>,
    ai: Arc<dyn AiCapability>,
    index: Arc<dyn VectorIndex>,
    bucket: String,
    collection: String,
}

impl EtlPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        ai: Arc<dyn AiCapability>,
        index: Arc<dyn VectorIndex>,
        bucket: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            ai,
            index,
            bucket: bucket.into(),
            collection: collection.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Run the job and return the number of points written.
    ///
    /// Steps run strictly in order and the first failure aborts the rest.
    /// Nothing is rolled back: a parse that succeeds before a failed upsert
    /// leaves no trace.
    pub async fn process(&self, job: &JobDescriptor) -> Result<usize, ProcessError> {
        let key = job.storage_key.as_str();

        let data = self
            .store
            .get(&self.bucket, key)
            .await
            .map_err(|e| ProcessError::Fetch {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        debug!(storage_key = key, bytes = data.len(), "fetched document");

        let chunks = self
            .ai
            .parse_and_embed(data, key)
            .await
            .map_err(|e| ProcessError::Parse {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let points = build_points(key, chunks);
        let count = points.len();
        if count == 0 {
            debug!(storage_key = key, "document produced no chunks, skipping upsert");
            return Ok(0);
        }

        self.index
            .upsert(&self.collection, points)
            .await
            .map_err(|e| ProcessError::Upsert {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(count)
    }
}
