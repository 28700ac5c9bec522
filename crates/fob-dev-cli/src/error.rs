//! Error handling for the fob-dev CLI.
//!
//! Config errors name the field and a hint; server errors keep their source.
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_dev_cli::error::{Result, ResultExt};
//!
//! fn cwd() -> Result<std::path::PathBuf> {
//!     std::env::current_dir().context("Failed to get current directory")
//! }
//! ```

mod diagnostic;

use fob_dev_server::ServerError;
use std::path::PathBuf;
use thiserror::Error;

pub use diagnostic::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (missing file, bad fields, invalid values)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors from file system or terminal operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dev server failed to bind or serve
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file doesn't exist at the expected location
    #[error("Config file not found: {}\n\nHint: Create a fob-dev.config.json file or specify --config <path>", .0.display())]
    NotFound(PathBuf),

    /// Merged configuration cannot be extracted
    #[error("Invalid configuration: {0}\n\nHint: Check fob-dev.config.json and FOB_DEV_* variables for field names and types")]
    Extract(#[from] Box<figment::Error>),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Prefixes the error message with `msg`.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
