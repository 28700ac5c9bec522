//! Miette diagnostic conversion for CLI errors.

use crate::error::{CliError, ConfigError};
use fob_dev_server::ServerError;
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => config_error_to_miette(e),
        CliError::Server(ServerError::Bind { addr, source }) => miette::miette!(
            help = "Stop the other process or pick a different --port",
            "Failed to bind to {}: {}",
            addr,
            source
        ),
        _ => miette::miette!("{}", err),
    }
}

/// Convert ConfigError to miette Report
pub fn config_error_to_miette(err: ConfigError) -> Report {
    match err {
        ConfigError::InvalidValue { field, value, hint } => {
            miette::miette!(help = hint, "Invalid value for '{}': {}", field, value)
        }
        _ => miette::miette!("Configuration error: {}", err),
    }
}
