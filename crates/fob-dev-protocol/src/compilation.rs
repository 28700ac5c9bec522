//! Build lifecycle events.

use serde::{Deserialize, Serialize};

/// One platform the server is compiling for, as listed by `/api/platforms`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub id: String,
    pub port: u16,
}

/// Compilation progress of a single platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    /// Number of modules built.
    pub completed: u64,
    /// Total number of modules detected as part of the compilation.
    pub total: u64,
}

impl ProgressData {
    /// Completion as a whole percentage, `0` while the total is unknown.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed.min(self.total) * 100 / self.total;
        pct as u8
    }
}

/// Build lifecycle event, tagged by `name` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum CompilationEvent {
    /// A (re)build started.
    #[serde(rename_all = "camelCase")]
    WatchRun {
        platform: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
    },

    /// A build finished.
    #[serde(rename_all = "camelCase")]
    Done {
        platform: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },

    /// Progress of the running build.
    #[serde(rename_all = "camelCase")]
    Progress {
        platform: String,
        #[serde(flatten)]
        progress: ProgressData,
    },
}

impl CompilationEvent {
    /// Platform the event belongs to.
    pub fn platform(&self) -> &str {
        match self {
            CompilationEvent::WatchRun { platform, .. }
            | CompilationEvent::Done { platform, .. }
            | CompilationEvent::Progress { platform, .. } => platform,
        }
    }
}
