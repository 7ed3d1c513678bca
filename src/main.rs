//! RAG Gateway server
//!
//! Wires the object store, work queue, vector index and AI client together,
//! starts the ingestion pool and serves HTTP until ctrl-c.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use rag_gateway::core::config::GatewayConfig;
use rag_gateway::logging::LoggingSystem;
use rag_gateway::transport::{self, AppState};
use rag_gateway::{
    AiCapability, EtlPipeline, FsObjectStore, HttpAiClient, IngestionWorkerPool, MemoryQueue,
    ObjectStore, QueryOrchestrator, VectorIndex, WorkQueue,
};

#[cfg(feature = "qdrant")]
fn build_index(config: &GatewayConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let index = rag_gateway::vector::QdrantIndex::connect(&config.vector.qdrant_url)
        .context("failed to connect to Qdrant")?;
    Ok(Arc::new(index))
}

#[cfg(not(feature = "qdrant"))]
fn build_index(_config: &GatewayConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    tracing::warn!("built without the `qdrant` feature; using the in-memory vector index");
    Ok(Arc::new(rag_gateway::MemoryVectorIndex::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::load().context("failed to load configuration")?;

    // Keep the logging system alive so the file writer is flushed on exit
    let _logging_system = match LoggingSystem::init(config.logging.clone()) {
        Ok(system) => Some(system),
        Err(e) => {
            eprintln!("Failed to initialize logging system: {}. Using basic logging.", e);
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
                .init();
            None
        }
    };

    tracing::info!("Starting RAG gateway...");

    let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(&config.storage.root_dir));
    let queue: Arc<dyn WorkQueue> = Arc::new(MemoryQueue::new());
    let index = build_index(&config)?;
    let ai: Arc<dyn AiCapability> =
        Arc::new(HttpAiClient::new(&config.ai).context("failed to create AI client")?);

    index
        .ensure_collection(&config.vector.collection, config.vector.vector_size)
        .await
        .context("failed to prepare vector collection")?;

    let shutdown = CancellationToken::new();

    let pipeline = Arc::new(EtlPipeline::new(
        store.clone(),
        ai.clone(),
        index.clone(),
        config.storage.bucket.clone(),
        config.vector.collection.clone(),
    ));
    let pool = IngestionWorkerPool::new(queue.clone(), pipeline, &config.queue);
    let workers = pool.start(config.ingestion.pool_size, &shutdown);

    let orchestrator = QueryOrchestrator::new(
        ai,
        index,
        config.vector.collection.clone(),
        config.vector.top_k as usize,
    )
    .with_bridge_capacity(config.query.bridge_capacity);

    let state = AppState {
        orchestrator,
        store,
        queue,
        bucket: config.storage.bucket.clone(),
        queue_name: config.queue.name.clone(),
        shutdown: shutdown.clone(),
    };
    let router = transport::router(state, config.server.max_upload_bytes);
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind_addr))?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                signal_token.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
    });

    let served = transport::serve(addr, router, shutdown.clone()).await;

    shutdown.cancel();
    workers.shutdown().await;
    tracing::info!("RAG gateway stopped");

    served.context("HTTP transport failed")
}
