//! Command-line interface definition for `fob-dev`.
//!
//! # Command Structure
//!
//! - `fob-dev serve` - Run the dev server until Ctrl+C
//! - `fob-dev monitor` - Follow a running server's dashboard channels
//! - `fob-dev check` - Validate configuration or print its JSON schema

mod commands;
mod tests;
mod validation;

use clap::Parser;

pub use commands::{CheckArgs, Command, MonitorArgs, ServeArgs};
pub use validation::{parse_host, parse_port};

/// fob-dev - development companion server for the fob bundler
#[derive(Parser, Debug)]
#[command(
    name = "fob-dev",
    version,
    about = "Development companion server for the fob bundler",
    long_about = "fob-dev tracks per-platform builds, pushes build and hot-update events to\n\
                  connected clients and symbolicates runtime stack traces against the\n\
                  bundler's source maps."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
