//! Serve command implementation.
//!
//! Loads configuration, starts the dev server and runs it until Ctrl+C.
//! Server logs are forwarded to dashboard clients while it runs.

use crate::cli::ServeArgs;
use crate::commands::utils;
use crate::config::DevServerConfig;
use crate::error::Result;
use crate::ui;
use fob_dev_server::{DevServer, DevServerContext, DiskBundleSource, LogSink};
use std::sync::Arc;
use tokio::signal;

/// Execute the serve command.
///
/// # Errors
///
/// Returns errors for invalid configuration or when the address cannot be
/// bound.
pub async fn execute(args: ServeArgs, log_sink: LogSink) -> Result<()> {
    let cwd = utils::get_cwd()?;
    let config = DevServerConfig::load(&args, &cwd)?;
    config.validate(&cwd)?;
    let server_config = config.to_server_config(&cwd)?;

    ui::info(&format!("Project root: {}", server_config.root.display()));
    ui::info(&format!("Build output: {}", server_config.out_dir.display()));
    if !server_config.out_dir.is_dir() {
        ui::warning("Build output directory does not exist yet");
    }

    let context = Arc::new(DevServerContext::new(server_config.addr.port()));
    let bundles = Arc::new(DiskBundleSource::new(&server_config.out_dir));
    let url = server_config.server_url();
    let server = DevServer::new(server_config, Arc::clone(&context), bundles);

    log_sink.attach(&context);
    ui::success(&format!("Listening on {}", url));
    ui::info("Press Ctrl+C to stop");

    let result = server
        .start(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            ui::info("Shutting down development server...");
        })
        .await;
    log_sink.detach();

    result?;
    ui::success("Development server stopped");
    Ok(())
}
