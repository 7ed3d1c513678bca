//! Routes and handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use super::error::TransportError;
use super::sse::into_sse;
use crate::core::types::AskRequest;
use crate::ingestion::{submit_document, SubmitError};
use crate::query::QueryOrchestrator;
use crate::queue::WorkQueue;
use crate::storage::{ObjectStore, StorageError};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: QueryOrchestrator,
    pub store: Arc<dyn ObjectStore>,
    pub queue: Arc<dyn WorkQueue>,
    pub bucket: String,
    pub queue_name: String,
    /// Parent of every per-request cancellation scope
    pub shutdown: CancellationToken,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub storage_key: String,
    pub status: String,
}

/// Build the router with all routes and middleware
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/v1/chat/stream", post(chat_stream))
        .route("/api/v1/upload", post(upload))
        .route("/api/v1/file/:key", get(get_file))
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` is cancelled
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), TransportError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TransportError::BindFailed {
            reason: e.to_string(),
        })?;
    info!("HTTP transport listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| TransportError::Internal {
            reason: e.to_string(),
        })
}

/// Route: POST /api/v1/chat/stream
async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, TransportError> {
    if request.query.trim().is_empty() {
        return Err(TransportError::BadRequest {
            reason: "query must not be empty".to_string(),
        });
    }

    debug!(session_id = %request.session_id, "starting answer stream");
    let answer = state.orchestrator.stream_answer(request, &state.shutdown);
    Ok(into_sse(answer))
}

/// Route: POST /api/v1/upload?filename=..
async fn upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, TransportError> {
    let job = submit_document(
        state.store.as_ref(),
        state.queue.as_ref(),
        &state.bucket,
        &state.queue_name,
        &params.filename,
        body.to_vec(),
    )
    .await
    .map_err(|e| match e {
        SubmitError::EmptyDocument => TransportError::BadRequest {
            reason: e.to_string(),
        },
        SubmitError::Store { .. } => TransportError::Internal {
            reason: e.to_string(),
        },
        SubmitError::Enqueue { .. } => TransportError::Unavailable {
            reason: e.to_string(),
        },
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            filename: params.filename,
            storage_key: job.storage_key,
            status: "queued".to_string(),
        }),
    ))
}

/// Route: GET /api/v1/file/:key
async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, TransportError> {
    let data = state
        .store
        .get(&state.bucket, &key)
        .await
        .map_err(|e| match e {
            StorageError::NotFound { .. } | StorageError::InvalidKey { .. } => {
                TransportError::NotFound { key: key.clone() }
            }
            other => TransportError::Internal {
                reason: other.to_string(),
            },
        })?;

    let headers = [
        (header::CONTENT_TYPE, content_type_for(&key)),
        (header::CACHE_CONTROL, "private, max-age=3600"),
    ];
    Ok((StatusCode::OK, headers, data).into_response())
}

pub(super) fn content_type_for(key: &str) -> &'static str {
    let extension = key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
