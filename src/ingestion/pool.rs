//! Ingestion worker pool
//!
//! `start` spawns the workers and returns at once. Each worker loops:
//! pop one job, run the pipeline, log the outcome. The pop is raced
//! against the pool's cancellation token so shutdown never waits on an
//! empty queue; a job that is already running is allowed to finish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::error::ProcessError;
use super::pipeline::EtlPipeline;
use crate::core::config::QueueConfig;
use crate::core::types::JobDescriptor;
use crate::queue::WorkQueue;

/// Counters shared by all workers of a pool
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Jobs that completed all pipeline steps
    pub processed: AtomicU64,
    /// Jobs dropped after a failure (including undecodable payloads)
    pub failed: AtomicU64,
    /// Pop attempts that hit an unavailable queue
    pub queue_errors: AtomicU64,
    /// Points written across all jobs
    pub points_written: AtomicU64,
}

impl PoolStats {
    /// Create a snapshot of current stats
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            processed: self.processed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            queue_errors: self.queue_errors.load(Ordering::SeqCst),
            points_written: self.points_written.load(Ordering::SeqCst),
        }
    }
}

/// Snapshot of pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatsSnapshot {
    pub processed: u64,
    pub failed: u64,
    pub queue_errors: u64,
    pub points_written: u64,
}

#[derive(Debug, Clone)]
struct WorkerSettings {
    queue_name: String,
    pop_timeout: Duration,
    unavailable_backoff: Duration,
}

/// Fixed-size pool of ingestion workers sharing one queue and pipeline
pub struct IngestionWorkerPool {
    queue: Arc<dyn WorkQueue>,
    pipeline: Arc<EtlPipeline>,
    settings: WorkerSettings,
    stats: Arc<PoolStats>,
}

impl IngestionWorkerPool {
    pub fn new(queue: Arc<dyn WorkQueue>, pipeline: Arc<EtlPipeline>, config: &QueueConfig) -> Self {
        Self {
            queue,
            pipeline,
            settings: WorkerSettings {
                queue_name: config.name.clone(),
                pop_timeout: config.pop_timeout(),
                unavailable_backoff: config.unavailable_backoff(),
            },
            stats: Arc::new(PoolStats::default()),
        }
    }

    /// Get statistics
    pub fn stats(&self) -> &Arc<PoolStats> {
        &self.stats
    }

    /// Spawn `pool_size` workers. Cancelling `shutdown` (or calling
    /// [`WorkerPoolHandle::shutdown`]) stops them.
    pub fn start(&self, pool_size: usize, shutdown: &CancellationToken) -> WorkerPoolHandle {
        let cancel = shutdown.child_token();

        let workers = (0..pool_size)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    self.queue.clone(),
                    self.pipeline.clone(),
                    self.settings.clone(),
                    self.stats.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        info!(
            pool_size,
            queue = %self.settings.queue_name,
            "ingestion worker pool started"
        );

        WorkerPoolHandle {
            cancel,
            workers,
            stats: self.stats.clone(),
        }
    }
}

/// Owner of a running pool's tasks
pub struct WorkerPoolHandle {
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<PoolStats>,
}

impl WorkerPoolHandle {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    /// Signal every worker to stop and wait for all of them
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Wait for the workers to exit without signalling them
    pub async fn join(self) {
        for (worker_id, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                warn!(worker_id, error = %e, "ingestion worker terminated abnormally");
            }
        }
        info!("ingestion worker pool stopped");
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<dyn WorkQueue>,
    pipeline: Arc<EtlPipeline>,
    settings: WorkerSettings,
    stats: Arc<PoolStats>,
    cancel: CancellationToken,
) {
    info!(worker_id, "ingestion worker started");

    loop {
        let popped = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = queue.blocking_pop(&settings.queue_name, settings.pop_timeout) => result,
        };

        let payload = match popped {
            Ok(Some((_, payload))) => payload,
            Ok(None) => continue,
            Err(e) => {
                stats.queue_errors.fetch_add(1, Ordering::SeqCst);
                warn!(
                    worker_id,
                    error = %e,
                    backoff_secs = settings.unavailable_backoff.as_secs_f64(),
                    "work queue unavailable, backing off"
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(settings.unavailable_backoff) => continue,
                }
            }
        };

        let Some(job) = JobDescriptor::from_payload(&payload) else {
            stats.failed.fetch_add(1, Ordering::SeqCst);
            let e = ProcessError::InvalidJob {
                reason: format!("undecodable payload {:?}", payload),
            };
            error!(worker_id, error = %e, "discarding job");
            continue;
        };

        match pipeline.process(&job).await {
            Ok(points) => {
                stats.processed.fetch_add(1, Ordering::SeqCst);
                stats.points_written.fetch_add(points as u64, Ordering::SeqCst);
                info!(
                    worker_id,
                    storage_key = %job.storage_key,
                    points,
                    "document indexed"
                );
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::SeqCst);
                error!(
                    worker_id,
                    storage_key = %job.storage_key,
                    error = %e,
                    "document ingestion failed"
                );
            }
        }
    }

    info!(worker_id, "ingestion worker stopped");
}
