use crate::cli::ServeArgs;
use crate::config::DevServerConfig;
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "fob-dev.config.json";

/// Prefix of environment overrides, e.g. `FOB_DEV_PORT=9000` or
/// `FOB_DEV_SYMBOLICATE__CONTEXT_LINES_ABOVE=4`.
pub const ENV_PREFIX: &str = "FOB_DEV_";

/// Flags that were actually passed; unset ones are not serialized so they
/// don't mask lower-priority sources.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    https: Option<bool>,
}

/// Values read from `FOB_DEV_*` variables.
///
/// Variable names are snake case (`FOB_DEV_OUT_DIR`) while the file uses
/// camel case, so the environment is extracted on its own and re-serialized
/// under the file's key names.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
struct EnvOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    https: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbolicate: Option<SymbolicateOverrides>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
struct SymbolicateOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    context_lines_above: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_lines_below: Option<usize>,
}

impl EnvOverrides {
    fn from_env() -> Result<Self> {
        Figment::from(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)).into())
    }
}

impl From<&ServeArgs> for CliOverrides {
    fn from(args: &ServeArgs) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            root: args.root.clone(),
            out_dir: args.out_dir.clone(),
            https: args.https.then_some(true),
        }
    }
}

impl DevServerConfig {
    /// Load configuration for `serve`.
    ///
    /// Relative paths (the config file and the default lookup) resolve
    /// against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `--config` file is missing or the merged
    /// sources don't form a valid configuration.
    pub fn load(args: &ServeArgs, cwd: &Path) -> Result<Self> {
        let figment = Self::figment(args.config.as_deref(), cwd)?
            .merge(Serialized::defaults(CliOverrides::from(args)));
        Self::extract(figment)
    }

    /// Load configuration without CLI overrides (used by `check`).
    pub fn load_file(config_path: Option<&Path>, cwd: &Path) -> Result<Self> {
        Self::extract(Self::figment(config_path, cwd)?)
    }

    /// The config file that would be read, if any.
    pub fn config_file(config_path: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
        match config_path {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Ok(Some(path))
            }
            None => {
                let default_path = cwd.join(CONFIG_FILE_NAME);
                Ok(default_path.is_file().then_some(default_path))
            }
        }
    }

    fn figment(config_path: Option<&Path>, cwd: &Path) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = Self::config_file(config_path, cwd)? {
            tracing::debug!(path = %path.display(), "Loading config file");
            figment = figment.merge(Json::file(path));
        }

        Ok(figment.merge(Serialized::defaults(EnvOverrides::from_env()?)))
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)).into())
    }
}
