//! Wire envelopes for the fob development server.
//!
//! Every message that crosses a dev-server WebSocket is one of the types in
//! this crate, JSON encoded with camelCase field names:
//!
//! - [`DashboardMessage`] - control and per-platform dashboard channels
//! - [`MethodMessage`] - method-style messages for `/message` clients
//!
//! Hot-update payloads are opaque to the server and travel as raw JSON.
//!
//! The server encodes these, the reconnecting client in `fob-dev-client`
//! decodes them.

mod compilation;
mod log;

pub use compilation::{CompilationEvent, PlatformInfo, ProgressData};
pub use log::{LogEntry, LogType};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope carried by dashboard channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DashboardMessage {
    /// A build lifecycle notification.
    Compilation { event: CompilationEvent },

    /// A server log line.
    Log { entry: LogEntry },
}

impl DashboardMessage {
    /// Returns the platform of a `watchRun` event, if this is one.
    ///
    /// Build starts are what dashboard clients use to discover platforms
    /// that came online after they connected.
    pub fn build_started_platform(&self) -> Option<(&str, Option<u16>)> {
        match self {
            DashboardMessage::Compilation {
                event: CompilationEvent::WatchRun { platform, port },
            } => Some((platform.as_str(), *port)),
            _ => None,
        }
    }
}

impl From<CompilationEvent> for DashboardMessage {
    fn from(event: CompilationEvent) -> Self {
        DashboardMessage::Compilation { event }
    }
}

impl From<LogEntry> for DashboardMessage {
    fn from(entry: LogEntry) -> Self {
        DashboardMessage::Log { entry }
    }
}

/// Protocol version stamped on every [`MethodMessage`].
pub const MESSAGE_PROTOCOL_VERSION: u8 = 2;

/// Method-style message broadcast to `/message` clients,
/// e.g. `{"version":2,"method":"reload"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodMessage {
    #[serde(default = "default_version")]
    pub version: u8,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

fn default_version() -> u8 {
    MESSAGE_PROTOCOL_VERSION
}

impl MethodMessage {
    /// Creates a message without parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            version: MESSAGE_PROTOCOL_VERSION,
            method: method.into(),
            params: None,
        }
    }

    /// Adds a parameter, creating the parameter map on first use.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}
