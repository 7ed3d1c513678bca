//! Document chunk and index point types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of parsed document text with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub content: String,

    /// Source page (1-based for paged formats, 0 when unknown)
    pub page_number: i32,

    /// Position in the parser's emission order
    #[serde(default)]
    pub order_index: usize,

    /// Embedding vector
    pub vector: Vec<f32>,
}

/// Metadata stored alongside each vector in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointPayload {
    pub filename: String,
    pub content: String,
    pub page_number: i32,
    pub chunk_index: usize,
}

/// One entry in the vector index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPoint {
    /// Fresh per point; re-processing a document yields new ids
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

impl IndexPoint {
    /// Build a point for a chunk at position `chunk_index` of `filename`
    pub fn from_chunk(filename: &str, chunk_index: usize, chunk: Chunk) -> Self {
        Self {
            id: Uuid::new_v4(),
            vector: chunk.vector,
            payload: PointPayload {
                filename: filename.to_string(),
                content: chunk.content,
                page_number: chunk.page_number,
                chunk_index,
            },
        }
    }
}

/// A similarity query hit
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: Uuid,
    pub score: f32,
    pub payload: PointPayload,
}

/// Read-only projection of a hit used for prompt assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDoc {
    pub content: String,
    pub filename: String,
    pub page_number: i32,
}

impl From<ScoredPoint> for RetrievedDoc {
    fn from(point: ScoredPoint) -> Self {
        Self {
            content: point.payload.content,
            filename: point.payload.filename,
            page_number: point.payload.page_number,
        }
    }
}
