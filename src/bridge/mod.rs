//! Stream Bridge
//!
//! Bounded hand-off from exactly one producer task to exactly one consumer.
//! Guarantees:
//! - items arrive in send order
//! - `send` waits while the buffer is full, and fails instead of waiting
//!   forever once the consumer is gone
//! - `close` is idempotent and safe after a failed send
//!
//! The query orchestrator uses it to hand `StreamEvent`s to the transport,
//! but nothing here is specific to events.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use thiserror::Error;
use tokio::sync::mpsc;


/// Default number of buffered items
pub const DEFAULT_CAPACITY: usize = 10;

/// Bridge send failures
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// The consumer dropped its end; the producer should stop
    #[error("stream consumer disconnected")]
    Disconnected,

    /// The producer already closed this bridge
    #[error("stream bridge already closed")]
    Closed,
}

/// Create a bridge holding at most `capacity` undelivered items.
///
/// A capacity of zero is raised to one.
pub fn channel<T>(capacity: usize) -> (BridgeSender<T>, BridgeReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (BridgeSender { tx: Some(tx) }, BridgeReceiver { rx })
}

/// Producer half. Not `Clone`: a bridge has a single producer.
#[derive(Debug)]
pub struct BridgeSender<T> {
    tx: Option<mpsc::Sender<T>>,
}

impl<T> BridgeSender<T> {
    /// Deliver one item, waiting for room if the buffer is full
    pub async fn send(&self, item: T) -> Result<(), BridgeError> {
        let tx = self.tx.as_ref().ok_or(BridgeError::Closed)?;
        tx.send(item).await.map_err(|_| BridgeError::Disconnected)
    }

    /// Signal end-of-sequence. Items already sent are still delivered.
    pub fn close(&mut self) {
        self.tx.take();
    }

    /// True once either side has ended the sequence
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }

    /// Resolves when the consumer goes away (or immediately if closed)
    pub async fn consumer_gone(&self) {
        if let Some(tx) = &self.tx {
            tx.closed().await;
        }
    }
}

/// Consumer half. Dropping it disconnects the producer.
#[derive(Debug)]
pub struct BridgeReceiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> BridgeReceiver<T> {
    /// Next item, or `None` once the producer closed and the buffer drained
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stop accepting new items; buffered ones can still be received
    pub fn disconnect(&mut self) {
        self.rx.close();
    }
}

impl<T> Stream for BridgeReceiver<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}
