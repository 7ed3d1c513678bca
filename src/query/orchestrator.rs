//! Query orchestrator
//!
//! Each call to [`QueryOrchestrator::stream_answer`] spawns one producer
//! task that owns a child of the caller's cancellation token. The returned
//! [`AnswerStream`] cancels that token when dropped, so a consumer that goes
//! away stops the producer and releases the upstream generation call.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use super::error::QueryError;
use super::progress;
use super::prompt::{build_prompt, format_context};
use crate::ai::AiCapability;
use crate::bridge::{self, BridgeError, BridgeReceiver, BridgeSender};
use crate::core::types::{AskRequest, GenerateRequest, GenerationItem, RetrievedDoc, StreamEvent};
use crate::vector::VectorIndex;

/// Why a producer stopped before exhausting the upstream stream
enum Halt {
    Failed(QueryError),
    Disconnected,
}

impl From<QueryError> for Halt {
    fn from(err: QueryError) -> Self {
        Halt::Failed(err)
    }
}

impl From<BridgeError> for Halt {
    fn from(_: BridgeError) -> Self {
        Halt::Disconnected
    }
}

/// Translate one generation item into events: upstream thinking, then the
/// answer delta, then cited sources. Empty fields produce nothing.
pub fn relay_events(item: GenerationItem) -> Vec<StreamEvent> {
    let mut events = Vec::with_capacity(2 + item.source_docs.len());
    if !item.thinking_log.is_empty() {
        events.push(StreamEvent::thinking(item.thinking_log));
    }
    if !item.answer_delta.is_empty() {
        events.push(StreamEvent::answer_delta(item.answer_delta));
    }
    events.extend(
        item.source_docs
            .into_iter()
            .map(|doc| StreamEvent::source_doc(doc.filename, doc.page)),
    );
    events
}

/// Drives retrieval-augmented answers
#[derive(Clone)]
pub struct QueryOrchestrator {
    ai: Arc<dyn AiCapability>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    top_k: usize,
    bridge_capacity: usize,
}

impl QueryOrchestrator {
    pub fn new(
        ai: Arc<dyn AiCapability>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            ai,
            index,
            collection: collection.into(),
            top_k,
            bridge_capacity: bridge::DEFAULT_CAPACITY,
        }
    }

    pub fn with_bridge_capacity(mut self, capacity: usize) -> Self {
        self.bridge_capacity = capacity;
        self
    }

    /// Start answering `request` and return the event sequence.
    ///
    /// The sequence starts with a `Thinking` event and ends either when the
    /// upstream generation completes or right after a single `Error` event.
    /// Cancelling `cancel` (or dropping the stream) stops it early.
    pub fn stream_answer(&self, request: AskRequest, cancel: &CancellationToken) -> AnswerStream {
        let (mut tx, rx) = bridge::channel(self.bridge_capacity);
        let token = cancel.child_token();
        let producer_token = token.clone();
        let this = self.clone();

        let task = tokio::spawn(async move {
            let session_id = request.session_id.clone();
            let outcome = tokio::select! {
                biased;
                _ = producer_token.cancelled() => None,
                outcome = this.produce(request, &tx) => Some(outcome),
            };

            match outcome {
                None => debug!(session_id = %session_id, "query cancelled by caller"),
                Some(Ok(())) => debug!(session_id = %session_id, "answer stream complete"),
                Some(Err(Halt::Disconnected)) => {
                    debug!(session_id = %session_id, "answer consumer disconnected");
                }
                Some(Err(Halt::Failed(e))) => {
                    warn!(session_id = %session_id, error = %e, "query failed");
                    // A full bridge must not hold the producer past cancellation
                    tokio::select! {
                        biased;
                        _ = producer_token.cancelled() => {
                            debug!(session_id = %session_id, "query cancelled before error was delivered");
                        }
                        _ = tx.send(StreamEvent::error(e.to_string())) => {}
                    }
                }
            }
            tx.close();
        });

        AnswerStream {
            rx,
            guard: token.drop_guard(),
            task,
        }
    }

    async fn produce(
        &self,
        request: AskRequest,
        tx: &BridgeSender<StreamEvent>,
    ) -> Result<(), Halt> {
        tx.send(StreamEvent::thinking(progress::UNDERSTANDING)).await?;
        let vector = self
            .ai
            .embed(&request.query)
            .await
            .map_err(|e| QueryError::Embed {
                reason: e.to_string(),
            })?;

        tx.send(StreamEvent::thinking(progress::RETRIEVING)).await?;
        let docs: Vec<RetrievedDoc> = self
            .index
            .query(&self.collection, &vector, self.top_k)
            .await
            .map_err(|e| QueryError::Retrieve {
                reason: e.to_string(),
            })?
            .into_iter()
            .map(RetrievedDoc::from)
            .collect();

        let context = if docs.is_empty() {
            tx.send(StreamEvent::thinking(progress::NO_DOCUMENTS)).await?;
            String::new()
        } else {
            tx.send(StreamEvent::thinking(progress::found(docs.len()))).await?;
            format_context(&docs)
        };
        info!(
            session_id = %request.session_id,
            retrieved = docs.len(),
            "context assembled"
        );

        tx.send(StreamEvent::thinking(progress::GENERATING)).await?;
        let generate = GenerateRequest {
            prompt: build_prompt(&context, &request.query),
            session_id: request.session_id,
            use_graph: request.use_graph,
        };
        let mut upstream = self
            .ai
            .generate_stream(generate)
            .await
            .map_err(|e| QueryError::Generate {
                reason: e.to_string(),
            })?;

        while let Some(item) = upstream.next().await {
            let item = item.map_err(|e| QueryError::Generate {
                reason: e.to_string(),
            })?;
            for event in relay_events(item) {
                tx.send(event).await?;
            }
        }
        Ok(())
    }
}

/// Consumer side of one answer. Dropping it cancels the producer.
pub struct AnswerStream {
    rx: BridgeReceiver<StreamEvent>,
    guard: DropGuard,
    task: JoinHandle<()>,
}

impl AnswerStream {
    /// Next event, or `None` once the sequence has ended
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Stop the producer and wait until it has released its resources
    pub async fn cancel(self) {
        let AnswerStream { rx, guard, task } = self;
        drop(guard);
        drop(rx);
        if let Err(e) = task.await {
            warn!(error = %e, "answer producer terminated abnormally");
        }
    }
}

impl Stream for AnswerStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamEvent>> {
        self.rx.poll_next_unpin(cx)
    }
}
