//! `fob-dev` entry point.
//!
//! Parses arguments, initializes logging and dispatches to a command.

use clap::Parser;
use fob_dev_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let log_sink = logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Serve(serve_args) => commands::serve_execute(serve_args, log_sink).await,
        cli::Command::Monitor(monitor_args) => commands::monitor_execute(monitor_args).await,
        cli::Command::Check(check_args) => commands::check_execute(check_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
