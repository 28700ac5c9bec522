//! Build event hub shared by the bundler hooks and the HTTP surface.
//!
//! The bundler reports lifecycle transitions here; the context records them
//! per platform and fans them out to the subscribers registered in its
//! [`ClientRegistry`]. Fan-out happens synchronously inside each call.

use crate::registry::{Audience, ClientFilter, ClientRegistry, Subscription};
use chrono::{DateTime, Utc};
use fob_dev_protocol::{
    CompilationEvent, DashboardMessage, LogEntry, MethodMessage, PlatformInfo, ProgressData,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Build state of one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum BuildStatus {
    /// No build has been reported yet.
    NotStarted,
    /// A build is running.
    #[serde(rename_all = "camelCase")]
    InProgress { started_at: DateTime<Utc> },
    /// The last build finished.
    #[serde(rename_all = "camelCase")]
    Idle {
        finished_at: DateTime<Utc>,
        duration_ms: Option<u64>,
    },
}

impl BuildStatus {
    /// Check if a build is currently running.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress { .. })
    }
}

/// Progress counters of one platform, as reported to status consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatus {
    pub status: BuildStatus,
    pub builds_started: u64,
    pub builds_completed: u64,
    pub progress: ProgressData,
}

impl PlatformStatus {
    fn new() -> Self {
        Self {
            status: BuildStatus::NotStarted,
            builds_started: 0,
            builds_completed: 0,
            progress: ProgressData::default(),
        }
    }
}

/// Shared dev server context.
pub struct DevServerContext {
    registry: ClientRegistry,
    platforms: RwLock<BTreeMap<String, PlatformStatus>>,
    port: u16,
}

/// Shared context handle.
pub type SharedContext = Arc<DevServerContext>;

impl DevServerContext {
    /// Creates a context for a server listening on `port`.
    ///
    /// The port is advertised in `watchRun` events and platform listings.
    pub fn new(port: u16) -> Self {
        Self {
            registry: ClientRegistry::new(),
            platforms: RwLock::new(BTreeMap::new()),
            port,
        }
    }

    /// Port advertised to dashboard clients.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Makes a platform visible to discovery before its first build.
    pub fn register_platform(&self, platform: &str) {
        self.platforms
            .write()
            .entry(platform.to_string())
            .or_insert_with(PlatformStatus::new);
    }

    /// Records a build start and announces it on the control channel and the
    /// platform's dashboard channel.
    pub fn notify_build_start(&self, platform: &str) {
        {
            let mut platforms = self.platforms.write();
            let entry = platforms
                .entry(platform.to_string())
                .or_insert_with(PlatformStatus::new);
            entry.status = BuildStatus::InProgress {
                started_at: Utc::now(),
            };
            entry.builds_started += 1;
            entry.progress = ProgressData::default();
        }

        tracing::info!(platform, "Compiling");
        self.broadcast_compilation(CompilationEvent::WatchRun {
            platform: platform.to_string(),
            port: Some(self.port),
        });
    }

    /// Records a build end and announces it like [`notify_build_start`].
    ///
    /// An end without a matching start is counted as a completed build.
    ///
    /// [`notify_build_start`]: DevServerContext::notify_build_start
    pub fn notify_build_end(&self, platform: &str) {
        let duration_ms = {
            let mut platforms = self.platforms.write();
            let entry = platforms
                .entry(platform.to_string())
                .or_insert_with(PlatformStatus::new);

            let finished_at = Utc::now();
            let duration_ms = match entry.status {
                BuildStatus::InProgress { started_at } => {
                    let elapsed = finished_at.signed_duration_since(started_at);
                    Some(elapsed.num_milliseconds().max(0) as u64)
                }
                _ => {
                    tracing::debug!(platform, "Build ended without a recorded start");
                    None
                }
            };

            entry.status = BuildStatus::Idle {
                finished_at,
                duration_ms,
            };
            entry.builds_completed += 1;
            duration_ms
        };

        match duration_ms {
            Some(ms) => tracing::info!(platform, duration_ms = ms, "Compiled"),
            None => tracing::info!(platform, "Compiled"),
        }
        self.broadcast_compilation(CompilationEvent::Done {
            platform: platform.to_string(),
            duration_ms,
        });
    }

    /// Records build progress and sends it to the platform's dashboard channel.
    pub fn report_progress(&self, platform: &str, progress: ProgressData) {
        {
            let mut platforms = self.platforms.write();
            let entry = platforms
                .entry(platform.to_string())
                .or_insert_with(PlatformStatus::new);
            entry.progress = progress;
        }

        let message = DashboardMessage::from(CompilationEvent::Progress {
            platform: platform.to_string(),
            progress,
        });
        if let Some(text) = encode(&message) {
            self.registry.broadcast(
                Audience::Dashboard {
                    platform: Some(platform),
                },
                &text,
            );
        }
    }

    /// Sends a hot-update payload to the HMR clients of `platform`.
    ///
    /// When `client_ids` is given only those clients receive it.
    pub fn broadcast_to_hmr_clients<E: Serialize + ?Sized>(
        &self,
        event: &E,
        platform: &str,
        client_ids: Option<&[String]>,
    ) -> usize {
        let Some(text) = encode(event) else {
            return 0;
        };
        let delivered = self.registry.broadcast(
            Audience::Hmr {
                platform,
                client_ids,
            },
            &text,
        );
        tracing::debug!(platform, delivered, "Broadcast HMR event");
        delivered
    }

    /// Sends a method-style message to every message client.
    pub fn broadcast_to_message_clients(&self, message: &MethodMessage) -> usize {
        let Some(text) = encode(message) else {
            return 0;
        };
        let delivered = self.registry.broadcast(Audience::Messages, &text);
        tracing::debug!(method = %message.method, delivered, "Broadcast message");
        delivered
    }

    /// Sends a log entry to the control channel.
    ///
    /// Never logs itself, so it is safe to call from a tracing layer.
    pub fn broadcast_log(&self, entry: LogEntry) -> usize {
        match serde_json::to_string(&DashboardMessage::from(entry)) {
            Ok(text) => self
                .registry
                .broadcast(Audience::Dashboard { platform: None }, &text),
            Err(_) => 0,
        }
    }

    /// Registers a transport-level subscriber.
    pub fn subscribe(&self, filter: ClientFilter) -> (Subscription, UnboundedReceiver<String>) {
        self.registry.subscribe(filter)
    }

    /// Status of one platform, if it has been seen.
    pub fn platform_status(&self, platform: &str) -> Option<PlatformStatus> {
        self.platforms.read().get(platform).cloned()
    }

    /// Status of every known platform, ordered by platform id.
    pub fn statuses(&self) -> BTreeMap<String, PlatformStatus> {
        self.platforms.read().clone()
    }

    /// Every known platform, ordered by id.
    pub fn platforms(&self) -> Vec<PlatformInfo> {
        self.platforms
            .read()
            .keys()
            .map(|id| PlatformInfo {
                id: id.clone(),
                port: self.port,
            })
            .collect()
    }

    /// Number of connected transport-level clients.
    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    fn broadcast_compilation(&self, event: CompilationEvent) {
        let platform = event.platform().to_string();
        let Some(text) = encode(&DashboardMessage::from(event)) else {
            return;
        };

        self.registry
            .broadcast(Audience::Dashboard { platform: None }, &text);
        self.registry.broadcast(
            Audience::Dashboard {
                platform: Some(&platform),
            },
            &text,
        );
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode broadcast");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn next_json(rx: &mut UnboundedReceiver<String>) -> Value {
        let text = rx.try_recv().expect("expected a broadcast");
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_build_lifecycle_counters() {
        let context = DevServerContext::new(8081);
        assert!(context.platform_status("ios").is_none());

        context.notify_build_start("ios");
        let status = context.platform_status("ios").unwrap();
        assert!(status.status.is_in_progress());
        assert_eq!(status.builds_started, 1);
        assert_eq!(status.builds_completed, 0);

        context.notify_build_end("ios");
        let status = context.platform_status("ios").unwrap();
        assert!(matches!(
            status.status,
            BuildStatus::Idle {
                duration_ms: Some(_),
                ..
            }
        ));
        assert_eq!(status.builds_completed, 1);
    }

    #[test]
    fn test_build_end_without_start_is_accepted() {
        let context = DevServerContext::new(8081);
        let (_sub, mut rx) = context.subscribe(ClientFilter::Dashboard { platform: None });

        context.notify_build_end("android");

        let status = context.platform_status("android").unwrap();
        assert_eq!(status.builds_started, 0);
        assert_eq!(status.builds_completed, 1);
        assert_eq!(
            next_json(&mut rx),
            json!({
                "kind": "compilation",
                "event": { "name": "done", "platform": "android" }
            })
        );
    }

    #[test]
    fn test_build_start_reaches_control_and_platform_channels() {
        let context = DevServerContext::new(8081);
        let (_control, mut control_rx) =
            context.subscribe(ClientFilter::Dashboard { platform: None });
        let (_ios, mut ios_rx) = context.subscribe(ClientFilter::Dashboard {
            platform: Some("ios".to_string()),
        });
        let (_android, mut android_rx) = context.subscribe(ClientFilter::Dashboard {
            platform: Some("android".to_string()),
        });

        context.notify_build_start("ios");

        let expected = json!({
            "kind": "compilation",
            "event": { "name": "watchRun", "platform": "ios", "port": 8081 }
        });
        assert_eq!(next_json(&mut control_rx), expected);
        assert_eq!(next_json(&mut ios_rx), expected);
        assert!(android_rx.try_recv().is_err());
    }

    #[test]
    fn test_progress_goes_to_platform_channel_only() {
        let context = DevServerContext::new(8081);
        let (_control, mut control_rx) =
            context.subscribe(ClientFilter::Dashboard { platform: None });
        let (_ios, mut ios_rx) = context.subscribe(ClientFilter::Dashboard {
            platform: Some("ios".to_string()),
        });

        let progress = ProgressData {
            completed: 3,
            total: 4,
        };
        context.report_progress("ios", progress);

        assert_eq!(
            next_json(&mut ios_rx),
            json!({
                "kind": "compilation",
                "event": { "name": "progress", "platform": "ios", "completed": 3, "total": 4 }
            })
        );
        assert!(control_rx.try_recv().is_err());
        assert_eq!(context.platform_status("ios").unwrap().progress, progress);
    }

    #[test]
    fn test_hmr_broadcast_respects_client_ids() {
        let context = DevServerContext::new(8081);
        let (_a, mut a_rx) = context.subscribe(ClientFilter::Hmr {
            platform: "ios".to_string(),
            client_id: Some("a".to_string()),
        });
        let (_b, mut b_rx) = context.subscribe(ClientFilter::Hmr {
            platform: "ios".to_string(),
            client_id: Some("b".to_string()),
        });

        let event = json!({ "action": "built", "hash": "abc" });
        let only_b = vec!["b".to_string()];

        assert_eq!(
            context.broadcast_to_hmr_clients(&event, "ios", Some(only_b.as_slice())),
            1
        );
        assert!(a_rx.try_recv().is_err());
        assert_eq!(next_json(&mut b_rx), event);

        assert_eq!(context.broadcast_to_hmr_clients(&event, "ios", None), 2);
        assert_eq!(context.broadcast_to_hmr_clients(&event, "android", None), 0);
    }

    #[test]
    fn test_message_broadcast_has_no_replay() {
        let context = DevServerContext::new(8081);
        let reload = MethodMessage::new("reload");

        assert_eq!(context.broadcast_to_message_clients(&reload), 0);

        let (_sub, mut rx) = context.subscribe(ClientFilter::Messages);
        assert!(rx.try_recv().is_err());

        assert_eq!(context.broadcast_to_message_clients(&reload), 1);
        assert_eq!(next_json(&mut rx), json!({ "version": 2, "method": "reload" }));
    }

    #[test]
    fn test_platforms_are_sorted_and_carry_port() {
        let context = DevServerContext::new(9000);
        context.notify_build_start("ios");
        context.register_platform("android");
        context.register_platform("ios");

        assert_eq!(
            context.platforms(),
            vec![
                PlatformInfo {
                    id: "android".to_string(),
                    port: 9000
                },
                PlatformInfo {
                    id: "ios".to_string(),
                    port: 9000
                },
            ]
        );
        assert_eq!(context.platform_status("ios").unwrap().builds_started, 1);
    }

    #[test]
    fn test_client_count_tracks_subscriptions() {
        let context = DevServerContext::new(8081);
        let (sub, _rx) = context.subscribe(ClientFilter::Messages);
        assert_eq!(context.client_count(), 1);
        sub.cancel();
        assert_eq!(context.client_count(), 0);
    }
}
