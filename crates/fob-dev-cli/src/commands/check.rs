//! Check command implementation.
//!
//! Validates configuration without starting the server.

use crate::cli::CheckArgs;
use crate::commands::utils;
use crate::config::DevServerConfig;
use crate::error::Result;
use crate::ui;

/// Execute the check command.
///
/// With `--schema`, prints the config file's JSON schema. Otherwise loads
/// the config file and `FOB_DEV_*` overrides, validates them and prints the
/// effective configuration as JSON on stdout.
///
/// # Errors
///
/// Returns errors for unreadable or invalid configuration.
pub async fn execute(args: CheckArgs) -> Result<()> {
    if args.schema {
        println!(
            "{}",
            serde_json::to_string_pretty(&DevServerConfig::json_schema())?
        );
        return Ok(());
    }

    let cwd = utils::get_cwd()?;
    match DevServerConfig::config_file(args.config.as_deref(), &cwd)? {
        Some(path) => ui::info(&format!("Checking {}", path.display())),
        None => ui::warning("No fob-dev.config.json found, using defaults"),
    }

    let config = DevServerConfig::load_file(args.config.as_deref(), &cwd)?;
    config.validate(&cwd)?;
    config.to_server_config(&cwd)?;

    let out_dir = cwd.join(&config.out_dir);
    if !out_dir.is_dir() {
        ui::warning(&format!(
            "Build output directory {} does not exist yet",
            out_dir.display()
        ));
    }

    println!("{}", serde_json::to_string_pretty(&config)?);
    ui::success("Configuration is valid!");
    Ok(())
}
