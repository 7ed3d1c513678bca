//! In-process work queue
//!
//! Named FIFOs behind a mutex, with a `Notify` to wake waiting poppers.
//! Suitable when uploads and workers share one process; contents do not
//! survive a restart.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::trace;

use super::error::{QueueError, QueueResult};
use super::WorkQueue;

/// In-memory named FIFO queues
#[derive(Debug, Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, VecDeque<String>>>,
    notify: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads waiting in `queue`
    pub fn len(&self, queue: &str) -> usize {
        self.queues.lock().get(queue).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }

    fn try_pop(&self, queue: &str) -> Option<String> {
        self.queues.lock().get_mut(queue).and_then(VecDeque::pop_front)
    }

    fn check_name(queue: &str) -> QueueResult<()> {
        if queue.trim().is_empty() {
            return Err(QueueError::InvalidName {
                name: queue.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn push(&self, queue: &str, payload: String) -> QueueResult<()> {
        Self::check_name(queue)?;
        {
            let mut queues = self.queues.lock();
            queues.entry(queue.to_string()).or_default().push_back(payload);
        }
        trace!(queue, "pushed job payload");
        self.notify.notify_waiters();
        Ok(())
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> QueueResult<Option<(String, String)>> {
        Self::check_name(queue)?;
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);

        loop {
            // Register interest before checking so a push in between is not missed
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(payload) = self.try_pop(queue) {
                return Ok(Some((queue.to_string(), payload)));
            }

            match deadline {
                None => notified.await,
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
            }
        }
    }
}
