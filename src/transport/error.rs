//! Transport error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors returned to HTTP callers
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Bad request: {reason}")]
    BadRequest { reason: String },

    #[error("Not found: {key}")]
    NotFound { key: String },

    #[error("Service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Server bind failed: {reason}")]
    BindFailed { reason: String },

    #[error("Internal server error: {reason}")]
    Internal { reason: String },
}

impl TransportError {
    pub fn status(&self) -> StatusCode {
        match self {
            TransportError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            TransportError::NotFound { .. } => StatusCode::NOT_FOUND,
            TransportError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TransportError::BindFailed { .. } | TransportError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
