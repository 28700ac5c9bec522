use crate::error::{Result, ResultExt};
use std::path::PathBuf;

/// Get the current working directory.
pub fn get_cwd() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}
