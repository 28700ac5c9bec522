use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::validation::{parse_host, parse_port};

/// Available fob-dev subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the development server
    ///
    /// Serves the build event channels, the symbolication endpoint and the
    /// bundler notification routes until Ctrl+C.
    Serve(ServeArgs),

    /// Follow the dashboard channels of a running server
    ///
    /// Prints control and per-platform events as they arrive. Type `r` and
    /// Enter to reconnect every channel.
    Monitor(MonitorArgs),

    /// Validate configuration
    ///
    /// Loads fob-dev.config.json with environment overrides and prints the
    /// effective configuration.
    Check(CheckArgs),
}

/// Arguments for the serve command
///
/// Flags left unset fall back to the config file, then to `FOB_DEV_*`
/// environment variables, then to defaults.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on [default: 8081]
    #[arg(short, long, value_parser = parse_port)]
    pub port: Option<u16>,

    /// Host or IP address to bind [default: localhost]
    #[arg(long, value_parser = parse_host)]
    pub host: Option<String>,

    /// Project root that source paths in source maps resolve against
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Directory the bundler writes per-platform output into
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Advertise https URLs (TLS terminated by a proxy)
    #[arg(long)]
    pub https: bool,

    /// Path to a config file [default: fob-dev.config.json]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the monitor command
#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Host of the running server
    #[arg(long, default_value = "localhost", value_parser = parse_host)]
    pub host: String,

    /// Port of the running server
    #[arg(short, long, default_value_t = 8081, value_parser = parse_port)]
    pub port: u16,

    /// Connect with wss/https
    #[arg(long)]
    pub secure: bool,

    /// Connection attempts per channel before giving up
    #[arg(long, default_value_t = 5, value_name = "N")]
    pub retries: u32,

    /// Seconds between connection attempts
    #[arg(long, default_value_t = 5, value_name = "SECS")]
    pub retry_delay: u64,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to a config file [default: fob-dev.config.json]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the JSON schema of the config file instead
    #[arg(long)]
    pub schema: bool,
}
