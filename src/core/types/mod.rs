//! Core data types for the gateway
//!
//! This module defines the data structures that cross component boundaries:
//! jobs on the work queue, chunks and points on the ingestion path, and the
//! tagged events relayed to callers on the query path.

pub mod document;
pub mod job;
pub mod stream;

// Re-export commonly used types
pub use document::{Chunk, IndexPoint, PointPayload, RetrievedDoc, ScoredPoint};
pub use job::JobDescriptor;
pub use stream::{AskRequest, GenerateRequest, GenerationItem, SourceRef, StreamEvent};
