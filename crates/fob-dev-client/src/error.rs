//! Error types for dev server connections.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T, E = TransportError> = std::result::Result<T, E>;

/// Failure talking to the dev server.
///
/// Stream clients recover from these on their own; they only reach callers
/// of the transport seam and of platform discovery.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("Failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    /// The established connection failed.
    #[error("Connection error: {0}")]
    Protocol(String),

    /// The platform listing could not be fetched.
    #[error("Failed to fetch platforms from {url}: {message}")]
    Discovery { url: String, message: String },
}

impl TransportError {
    pub fn connect(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Connect {
            url: url.into(),
            message: message.to_string(),
        }
    }
}
