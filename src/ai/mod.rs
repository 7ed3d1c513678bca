//! AI capability contract
//!
//! The parsing, embedding and generation models live in a remote service.
//! This module defines what the gateway needs from it and an HTTP client
//! that speaks to it.

mod error;
mod http;


pub use error::{AiError, AiResult};
pub use http::HttpAiClient;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::core::types::{Chunk, GenerateRequest, GenerationItem};

/// Lazily produced generation output. Dropping the stream abandons the
/// upstream call.
pub type GenerationStream = BoxStream<'static, AiResult<GenerationItem>>;

/// Remote parse, embed and generate operations
#[async_trait]
pub trait AiCapability: Send + Sync {
    /// Embed a single piece of text
    async fn embed(&self, text: &str) -> AiResult<Vec<f32>>;

    /// Split a document into chunks and embed each one.
    /// Chunks come back in emission order with `order_index` stamped.
    async fn parse_and_embed(&self, data: Vec<u8>, filename: &str) -> AiResult<Vec<Chunk>>;

    /// Start a streamed generation
    async fn generate_stream(&self, request: GenerateRequest) -> AiResult<GenerationStream>;
}
