//! Vector index contract
//!
//! Ingestion writes points in batches; the query path reads the top-K
//! nearest neighbours. Both go through [`VectorIndex`], so the in-memory
//! index and the Qdrant adapter are interchangeable.

mod error;
mod memory;
#[cfg(feature = "qdrant")]
mod qdrant;


pub use error::{VectorError, VectorResult};
pub use memory::{Distance, MemoryVectorIndex};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantIndex;

use async_trait::async_trait;

use crate::core::types::{IndexPoint, ScoredPoint};

/// Similarity index over fixed-dimension vectors grouped in named collections
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create `collection` with cosine distance if it does not exist yet
    async fn ensure_collection(&self, collection: &str, dimension: u64) -> VectorResult<()>;

    /// Write all points in one call. Every vector must match the collection's dimension.
    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> VectorResult<()>;

    /// Return up to `top_k` hits ordered by descending similarity
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> VectorResult<Vec<ScoredPoint>>;
}
