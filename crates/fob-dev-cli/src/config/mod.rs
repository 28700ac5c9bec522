//! Configuration of the `serve` command with multi-source loading.
//!
//! Priority: CLI > Environment (`FOB_DEV_*`) > File > Defaults

mod conversions;
mod defaults;
mod loading;
mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use defaults::*;
pub use loading::{CONFIG_FILE_NAME, ENV_PREFIX};

/// Dev server configuration - loaded from fob-dev.config.json, the
/// environment and CLI args.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DevServerConfig {
    /// Host name or IP address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on (1-65535)
    #[serde(default = "default_port")]
    #[schemars(range(min = 1))]
    pub port: u16,

    /// Project root that source paths in source maps resolve against
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory the bundler writes per-platform output into
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Advertise https URLs (TLS terminated by a proxy)
    #[serde(default)]
    pub https: bool,

    /// Symbolication settings
    #[serde(default)]
    pub symbolicate: SymbolicateConfig,
}

/// Code excerpt settings for symbolication responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SymbolicateConfig {
    /// Source lines shown above the failing line
    #[serde(default = "default_context_lines_above")]
    pub context_lines_above: usize,

    /// Source lines shown below the failing line
    #[serde(default = "default_context_lines_below")]
    pub context_lines_below: usize,
}

impl Default for SymbolicateConfig {
    fn default() -> Self {
        Self {
            context_lines_above: default_context_lines_above(),
            context_lines_below: default_context_lines_below(),
        }
    }
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root: default_root(),
            out_dir: default_out_dir(),
            https: false,
            symbolicate: SymbolicateConfig::default(),
        }
    }
}

impl DevServerConfig {
    /// Generate JSON Schema for fob-dev.config.json.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(DevServerConfig);
        schema.to_value()
    }
}
