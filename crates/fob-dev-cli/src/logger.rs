//! Logging setup for `fob-dev`.
//!
//! One registry carries two layers: a compact formatter on stderr and the
//! [`DashboardLogLayer`], which forwards the same events to dashboard
//! clients once a server attaches the returned [`LogSink`].
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_dev_cli::logger::init_logger;
//! use tracing::info;
//!
//! let _sink = init_logger(false, false, false);
//! info!("Starting server");
//! ```

use fob_dev_server::{DashboardLogLayer, LogSink};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither a flag nor `RUST_LOG` says otherwise.
const DEFAULT_FILTER: &str = "fob_dev=info,fob_symbolicate=info";

/// Initialize the tracing subscriber with the specified options.
///
/// Must be called once, before any logging occurs.
///
/// The level is picked in this order:
/// 1. `--verbose`: DEBUG for fob crates
/// 2. `--quiet`: ERROR only
/// 3. `RUST_LOG`
/// 4. INFO for fob crates
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) -> LogSink {
    init_logger_with_filter(filter_for(verbose, quiet), no_color)
}

/// Initialize logger with a custom environment filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) -> LogSink {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    let (dashboard_layer, sink) = DashboardLogLayer::new(Level::INFO);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(dashboard_layer)
        .init();

    sink
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("fob_dev=debug,fob_symbolicate=debug")
    } else if quiet {
        EnvFilter::new("fob_dev=error,fob_symbolicate=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can only be installed once per process, so these
    // tests cover the pieces around it.

    #[test]
    fn test_filter_flags() {
        assert_eq!(
            filter_for(true, false).to_string(),
            EnvFilter::new("fob_dev=debug,fob_symbolicate=debug").to_string()
        );
        assert_eq!(
            filter_for(false, true).to_string(),
            EnvFilter::new("fob_dev=error,fob_symbolicate=error").to_string()
        );
    }
}
