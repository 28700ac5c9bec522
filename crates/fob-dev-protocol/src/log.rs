//! Log entries forwarded to dashboard clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogType {
    /// Maps a numeric log level (10 trace ... 60 fatal) to a log type.
    ///
    /// Unknown levels are reported as `info`.
    pub fn from_level(level: u64) -> Self {
        match level {
            10 | 20 => LogType::Debug,
            30 => LogType::Info,
            40 => LogType::Warn,
            50 | 60 => LogType::Error,
            _ => LogType::Info,
        }
    }
}

/// A single log line as shown by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub log_type: LogType,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Component that emitted the log, empty when unknown.
    #[serde(default)]
    pub issuer: String,
    pub message: Vec<Value>,
}

impl LogEntry {
    /// Builds an entry from a structured JSON log record.
    ///
    /// `level` and `time` are lifted into the entry, `pid` and `hostname` are
    /// dropped, and whatever remains becomes the single message item.
    pub fn from_json_record(record: Value) -> Option<Self> {
        let Value::Object(mut fields) = record else {
            return None;
        };

        let level = fields.remove("level").and_then(|v| v.as_u64()).unwrap_or(30);
        let timestamp = fields.remove("time").and_then(|v| v.as_i64()).unwrap_or(0);
        fields.remove("pid");
        fields.remove("hostname");

        Some(Self {
            log_type: LogType::from_level(level),
            timestamp,
            issuer: String::new(),
            message: vec![Value::Object(fields)],
        })
    }
}
