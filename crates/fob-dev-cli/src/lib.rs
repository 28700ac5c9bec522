//! Command-line interface of the fob dev server.
//!
//! - [`error`] - CLI error types with actionable hints
//! - [`logger`] - `tracing` setup, including forwarding to dashboard clients
//! - [`ui`] - status messages on stderr
//! - `commands` - `serve`, `monitor` and `check`
//! - `config` - `fob-dev.config.json` loading and validation
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_dev_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     let _sink = logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
