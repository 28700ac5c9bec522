//! Error types for symbolication.
//!
//! None of these ever fail a whole request: the [`Symbolicator`](crate::Symbolicator)
//! logs them and degrades the affected frame or code excerpt instead.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading a bundle, a source map or a source file.
#[derive(Debug, Error)]
pub enum SymbolicateError {
    /// The bundle reader could not provide the requested file
    #[error("Failed to read {url}: {message}")]
    Read {
        /// Bundle URL or logical file identifier
        url: String,
        /// Reader-specific description of the failure
        message: String,
    },

    /// The source map text could not be decoded
    #[error("Invalid source map for {url}: {message}")]
    Decode {
        /// Bundle URL the source map belongs to
        url: String,
        /// Decoder error description
        message: String,
    },

    /// A project source file could not be read from disk
    #[error("Failed to read source file {}: {source}", .path.display())]
    Io {
        /// Absolute path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A resolved source path points outside the project root
    #[error("Source {0} resolves outside the project root")]
    OutsideProject(String),
}

impl SymbolicateError {
    /// Creates a [`SymbolicateError::Read`] for readers that only have a message.
    pub fn read(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SymbolicateError::Read {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias using [`SymbolicateError`].
pub type Result<T, E = SymbolicateError> = std::result::Result<T, E>;
