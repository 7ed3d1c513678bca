//! Test doubles for the collaborator traits

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use parking_lot::Mutex;

use crate::ai::{AiCapability, AiError, AiResult, GenerationStream};
use crate::core::types::{Chunk, GenerateRequest, GenerationItem, IndexPoint, ScoredPoint};
use crate::queue::{MemoryQueue, QueueError, QueueResult, WorkQueue};
use crate::vector::{MemoryVectorIndex, VectorError, VectorIndex, VectorResult};

pub(crate) const DIM: usize = 4;

/// Build `n` chunks with distinct unit-ish vectors
pub(crate) fn sample_chunks(n: usize) -> Vec<Chunk> {
    (0..n)
        .map(|i| {
            let mut vector = vec![0.0; DIM];
            vector[i % DIM] = 1.0;
            vector[(i + 1) % DIM] += 0.1 * i as f32;
            Chunk {
                content: format!("chunk {}", i),
                page_number: (i / 2 + 1) as i32,
                order_index: i,
                vector,
            }
        })
        .collect()
}

/// One step of a scripted generation stream
#[derive(Debug, Clone)]
pub(crate) enum GenStep {
    Item(GenerationItem),
    Fail,
    /// Never yields again
    Hang,
}

/// Scriptable AI capability
pub(crate) struct FakeAi {
    chunks: Mutex<HashMap<String, Vec<Chunk>>>,
    script: Mutex<Vec<GenStep>>,
    pub fail_embed: AtomicBool,
    pub fail_parse: AtomicBool,
    pub fail_generate: AtomicBool,
    pub parse_delay: Mutex<Option<Duration>>,
    pub parse_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub last_request: Mutex<Option<GenerateRequest>>,
    /// Set when the last generation stream handed out is dropped
    pub stream_dropped: Arc<AtomicBool>,
}

impl FakeAi {
    pub(crate) fn new() -> Self {
        Self {
            chunks: Mutex::new(HashMap::new()),
            script: Mutex::new(Vec::new()),
            fail_embed: AtomicBool::new(false),
            fail_parse: AtomicBool::new(false),
            fail_generate: AtomicBool::new(false),
            parse_delay: Mutex::new(None),
            parse_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            stream_dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn with_chunks(self, filename: &str, chunks: Vec<Chunk>) -> Self {
        self.chunks.lock().insert(filename.to_string(), chunks);
        self
    }

    pub(crate) fn with_script(self, steps: Vec<GenStep>) -> Self {
        *self.script.lock() = steps;
        self
    }

    pub(crate) fn with_parse_delay(self, delay: Duration) -> Self {
        *self.parse_delay.lock() = Some(delay);
        self
    }
}

fn upstream_error(what: &str) -> AiError {
    AiError::Unavailable {
        reason: format!("{} failed", what),
    }
}

#[async_trait]
impl AiCapability for FakeAi {
    async fn embed(&self, text: &str) -> AiResult<Vec<f32>> {
        if self.fail_embed.load(Ordering::SeqCst) {
            return Err(upstream_error("embed"));
        }
        let mut vector = vec![0.0; DIM];
        vector[text.len() % DIM] = 1.0;
        Ok(vector)
    }

    async fn parse_and_embed(&self, _data: Vec<u8>, filename: &str) -> AiResult<Vec<Chunk>> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.parse_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_parse.load(Ordering::SeqCst) {
            return Err(upstream_error("parse"));
        }
        Ok(self.chunks.lock().get(filename).cloned().unwrap_or_default())
    }

    async fn generate_stream(&self, request: GenerateRequest) -> AiResult<GenerationStream> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request);
        if self.fail_generate.load(Ordering::SeqCst) {
            return Err(upstream_error("generate"));
        }

        let steps = self.script.lock().clone();
        let hang = steps.iter().any(|s| matches!(s, GenStep::Hang));
        let items: Vec<AiResult<GenerationItem>> = steps
            .into_iter()
            .take_while(|s| !matches!(s, GenStep::Hang))
            .map(|s| match s {
                GenStep::Item(item) => Ok(item),
                _ => Err(upstream_error("generation stream")),
            })
            .collect();

        let inner = if hang {
            stream::iter(items).chain(stream::pending()).boxed()
        } else {
            stream::iter(items).boxed()
        };

        self.stream_dropped.store(false, Ordering::SeqCst);
        Ok(DropFlagStream {
            inner,
            dropped: self.stream_dropped.clone(),
        }
        .boxed())
    }
}

/// Records when the upstream stream is released
struct DropFlagStream {
    inner: GenerationStream,
    dropped: Arc<AtomicBool>,
}

impl Stream for DropFlagStream {
    type Item = AiResult<GenerationItem>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.poll_next_unpin(cx)
    }
}

impl Drop for DropFlagStream {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// Memory index that counts calls and can be told to fail
#[derive(Default)]
pub(crate) struct RecordingIndex {
    pub inner: MemoryVectorIndex,
    pub fail_upsert: AtomicBool,
    pub fail_query: AtomicBool,
    pub upsert_calls: AtomicUsize,
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn ensure_collection(&self, collection: &str, dimension: u64) -> VectorResult<()> {
        self.inner.ensure_collection(collection, dimension).await
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> VectorResult<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(VectorError::UpsertFailed {
                reason: "index offline".to_string(),
            });
        }
        self.inner.upsert(collection, points).await
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> VectorResult<Vec<ScoredPoint>> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(VectorError::SearchFailed {
                reason: "index offline".to_string(),
            });
        }
        self.inner.query(collection, vector, top_k).await
    }
}

/// Memory queue whose first `failures` pops report the queue unavailable
pub(crate) struct FlakyQueue {
    pub inner: MemoryQueue,
    failures: AtomicUsize,
    pub fail_push: AtomicBool,
}

impl FlakyQueue {
    pub(crate) fn new(failures: usize) -> Self {
        Self {
            inner: MemoryQueue::new(),
            failures: AtomicUsize::new(failures),
            fail_push: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl WorkQueue for FlakyQueue {
    async fn push(&self, queue: &str, payload: String) -> QueueResult<()> {
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable {
                reason: "connection refused".to_string(),
            });
        }
        self.inner.push(queue, payload).await
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> QueueResult<Option<(String, String)>> {
        let remaining = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if remaining.is_ok() {
            return Err(QueueError::Unavailable {
                reason: "connection refused".to_string(),
            });
        }
        self.inner.blocking_pop(queue, timeout).await
    }
}
