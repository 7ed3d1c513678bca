//! Work queue contract
//!
//! A durable FIFO of job payloads with push and blocking pop. Workers pop
//! with a bounded wait so that they can notice shutdown between waits.

mod error;
mod memory;


pub use error::{QueueError, QueueResult};
pub use memory::MemoryQueue;

use std::time::Duration;

use async_trait::async_trait;

/// FIFO job queue shared by uploaders and ingestion workers.
///
/// Implementations must be safe for concurrent use; each popped payload
/// goes to exactly one caller.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Append a payload to the tail of `queue`
    async fn push(&self, queue: &str, payload: String) -> QueueResult<()>;

    /// Remove the head of `queue`, waiting up to `timeout` for one to arrive.
    ///
    /// A zero timeout waits indefinitely. Returns `(queue, payload)` or
    /// `None` when the wait elapsed.
    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> QueueResult<Option<(String, String)>>;
}
