//! HTTP transport
//!
//! A thin axum surface over the core: answers are framed as server-sent
//! events, uploads are stored and queued, stored files can be downloaded.
//! No authentication happens here.

mod error;
mod routes;
mod sse;


pub use error::TransportError;
pub use routes::{router, serve, AppState, UploadParams, UploadResponse};
pub use sse::into_sse;
