use std::net::SocketAddr;

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use invaudit_config::ConfigError;
use invaudit_io::IoError;
use invaudit_recon::ReconError;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;

/// Request-level failures, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// None of the accepted form field names was present.
    #[error("missing file field '{0}'")]
    MissingField(&'static str),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("invalid file in '{field}': {source}")]
    InvalidFile {
        field: &'static str,
        #[source]
        source: IoError,
    },

    #[error("invalid file in '{field}': {source}")]
    Normalize {
        field: &'static str,
        #[source]
        source: ReconError,
    },

    #[error("failed to render report: {0}")]
    Render(IoError),

    /// The blocking task running the work panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(#[from] JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Multipart(e) => e.status(),
            ApiError::Render(_) | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "request rejected: {}", self);
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Start-up failures of the service.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("loader configuration: {0}")]
    Loader(#[from] ReconError),

    #[error("invalid CORS origin '{0}'")]
    Origin(String),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
