use crate::config::DevServerConfig;
use crate::error::{ConfigError, Result};
use std::path::Path;

impl DevServerConfig {
    /// Validate configuration before use.
    ///
    /// Relative `root` resolves against `cwd`. A missing `outDir` is fine:
    /// the bundler creates it on its first build.
    pub fn validate(&self, cwd: &Path) -> Result<()> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                value: "0".to_string(),
                hint: "Use a port between 1 and 65535".to_string(),
            }
            .into());
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "host".to_string(),
                value: String::new(),
                hint: "Use a host name or IP address such as localhost or 0.0.0.0".to_string(),
            }
            .into());
        }

        let root = cwd.join(&self.root);
        if !root.is_dir() {
            return Err(ConfigError::InvalidValue {
                field: "root".to_string(),
                value: root.display().to_string(),
                hint: "Point root at an existing project directory".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
