//! Error types for the dev server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for dev server operations.
pub type Result<T, E = ServerError> = std::result::Result<T, E>;

/// Errors raised by the dev server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The accept loop stopped with an error.
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON request body.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The request cannot be served as sent.
    #[error("{0}")]
    BadRequest(String),
}

impl ServerError {
    /// Creates a [`ServerError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }
        (status, self.to_string()).into_response()
    }
}
