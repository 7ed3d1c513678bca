//! Document ingestion
//!
//! Uploads land in the object store and a job is pushed onto the work
//! queue. A fixed pool of workers drains the queue; each job runs the ETL
//! pipeline (fetch, parse and embed, batch upsert) exactly once.
//!
//! Failures are terminal for the affected job only: they are logged and
//! counted, never retried or requeued.

mod error;
mod pipeline;
mod pool;
mod submit;


pub use error::{ProcessError, SubmitError};
pub use pipeline::{build_points, EtlPipeline};
pub use pool::{IngestionWorkerPool, PoolStats, PoolStatsSnapshot, WorkerPoolHandle};
pub use submit::{object_key_for, submit_document};
