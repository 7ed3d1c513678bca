//! RAG Gateway - asynchronous ingestion and streaming query core
//!
//! This crate provides:
//! - A worker pool that drains a work queue and runs the ETL pipeline
//!   (object store, parse and embed, vector index upsert)
//! - A query orchestrator that streams progress, answer deltas and cited
//!   sources while upstream generation is still running
//! - A bounded, cancellable stream bridge between producer and consumer
//! - A thin HTTP transport framing answers as server-sent events

pub mod ai;
pub mod bridge;
pub mod core;
pub mod ingestion;
pub mod logging;
pub mod query;
pub mod queue;
pub mod storage;
pub mod transport;
pub mod vector;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use crate::core::config::GatewayConfig;
pub use crate::core::error::{GatewayError, Result};
pub use crate::core::types::{AskRequest, JobDescriptor, StreamEvent};
pub use ai::{AiCapability, HttpAiClient};
pub use ingestion::{EtlPipeline, IngestionWorkerPool, WorkerPoolHandle};
pub use query::{AnswerStream, QueryOrchestrator};
pub use queue::{MemoryQueue, WorkQueue};
pub use storage::{FsObjectStore, ObjectStore};
pub use vector::{MemoryVectorIndex, VectorIndex};
