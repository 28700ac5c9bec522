//! Control channel plus one stream per platform.
//!
//! The [`StreamAggregator`] keeps the live channel set of a dashboard:
//!
//! 1. one control-channel client, opened on start,
//! 2. one client per platform returned by discovery,
//! 3. one more client whenever the control channel announces a build start
//!    (`watchRun`) for a platform not in the set yet.
//!
//! When the control channel completes (its retries are spent) the platform
//! set is cleared. [`StreamAggregator::retry_all`] rebuilds everything with
//! fresh retry budgets.

use crate::client::{ChannelEvent, ResilientStreamClient, StreamSubscription};
use crate::config::{Endpoints, RetryPolicy};
use crate::discovery::PlatformDiscovery;
use crate::state::ConnectionState;
use crate::transport::Connector;
use fob_dev_protocol::DashboardMessage;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Stream client carrying dashboard messages.
pub type DashboardClient = ResilientStreamClient<DashboardMessage>;

/// What the channel set looks like right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSetSnapshot {
    /// Bumped by every [`StreamAggregator::retry_all`].
    pub generation: u64,
    /// Platforms with an open client, sorted.
    pub platforms: Vec<String>,
}

struct Channels {
    generation: u64,
    control: Arc<DashboardClient>,
    platforms: BTreeMap<String, Arc<DashboardClient>>,
    tasks: Vec<JoinHandle<()>>,
}

struct Inner {
    endpoints: Endpoints,
    policy: RetryPolicy,
    connector: Arc<dyn Connector>,
    discovery: Arc<dyn PlatformDiscovery>,
    channels: RwLock<Channels>,
    changes: watch::Sender<ChannelSetSnapshot>,
}

/// Maintains the live set of dashboard channels.
///
/// Must be created inside a tokio runtime.
pub struct StreamAggregator {
    inner: Arc<Inner>,
}

impl StreamAggregator {
    /// Opens the control channel and starts platform discovery.
    pub fn start(
        endpoints: Endpoints,
        policy: RetryPolicy,
        connector: Arc<dyn Connector>,
        discovery: Arc<dyn PlatformDiscovery>,
    ) -> Self {
        let (control, events) = DashboardClient::connect_observed(
            endpoints.control_url(),
            Arc::clone(&connector),
            policy,
        );
        let (changes, _) = watch::channel(ChannelSetSnapshot::default());

        let inner = Arc::new(Inner {
            endpoints,
            policy,
            connector,
            discovery,
            channels: RwLock::new(Channels {
                generation: 0,
                control: Arc::new(control),
                platforms: BTreeMap::new(),
                tasks: Vec::new(),
            }),
            changes,
        });

        inner.spawn_watchers(events);
        Self { inner }
    }

    /// Platforms with an open client, sorted.
    pub fn platforms(&self) -> Vec<String> {
        self.inner.channels.read().platforms.keys().cloned().collect()
    }

    /// The control-channel client.
    pub fn control_connection(&self) -> Arc<DashboardClient> {
        Arc::clone(&self.inner.channels.read().control)
    }

    /// The client of one platform, if it is in the set.
    pub fn compiler_connection(&self, platform: &str) -> Option<Arc<DashboardClient>> {
        self.inner.channels.read().platforms.get(platform).cloned()
    }

    /// Notifies on every change of the channel set.
    pub fn watch(&self) -> watch::Receiver<ChannelSetSnapshot> {
        self.inner.changes.subscribe()
    }

    /// Current channel set.
    pub fn snapshot(&self) -> ChannelSetSnapshot {
        self.inner.channels.read().snapshot()
    }

    /// Discards every client and reconnects from scratch.
    ///
    /// Old clients are torn down; their observers see their streams end.
    /// Subscribe to the new [`control_connection`] to keep listening.
    ///
    /// [`control_connection`]: StreamAggregator::control_connection
    pub fn retry_all(&self) {
        let (control, events) = DashboardClient::connect_observed(
            self.inner.endpoints.control_url(),
            Arc::clone(&self.inner.connector),
            self.inner.policy,
        );

        let (old_control, old_platforms) = {
            let mut channels = self.inner.channels.write();
            for task in channels.tasks.drain(..) {
                task.abort();
            }
            channels.generation += 1;
            let old_control = std::mem::replace(&mut channels.control, Arc::new(control));
            let old_platforms = std::mem::take(&mut channels.platforms);
            (old_control, old_platforms)
        };

        old_control.teardown();
        for client in old_platforms.values() {
            client.teardown();
        }

        info!("Reconnecting all dashboard channels");
        self.inner.spawn_watchers(events);
        self.inner.publish();
    }
}

impl Drop for StreamAggregator {
    fn drop(&mut self) {
        let channels = self.inner.channels.read();
        for task in &channels.tasks {
            task.abort();
        }
        channels.control.teardown();
        for client in channels.platforms.values() {
            client.teardown();
        }
    }
}

impl Channels {
    fn snapshot(&self) -> ChannelSetSnapshot {
        ChannelSetSnapshot {
            generation: self.generation,
            platforms: self.platforms.keys().cloned().collect(),
        }
    }
}

impl Inner {
    /// Starts the control watcher and discovery for the current generation.
    ///
    /// `events` must observe the current control client from its first attempt.
    fn spawn_watchers(self: &Arc<Self>, events: StreamSubscription<DashboardMessage>) {
        let mut channels = self.channels.write();
        let generation = channels.generation;

        let control_task = tokio::spawn(watch_control(Arc::downgrade(self), generation, events));
        let discovery_task = tokio::spawn(discover(Arc::downgrade(self), generation));
        channels.tasks.push(control_task);
        channels.tasks.push(discovery_task);
    }

    /// Opens a platform client unless the platform is already in the set.
    ///
    /// Ignored when `generation` is stale or its control channel is
    /// exhausted. Returns `true` if a client was opened.
    fn open_platform(&self, generation: u64, platform: &str, port: Option<u16>) -> bool {
        let opened = {
            let mut channels = self.channels.write();
            if channels.generation != generation
                || channels.control.state() == ConnectionState::Exhausted
                || channels.platforms.contains_key(platform)
            {
                false
            } else {
                let endpoints = match port {
                    Some(port) => self.endpoints.with_port(port),
                    None => self.endpoints.clone(),
                };
                let client = DashboardClient::connect(
                    endpoints.platform_url(platform),
                    Arc::clone(&self.connector),
                    self.policy,
                );
                channels
                    .platforms
                    .insert(platform.to_string(), Arc::new(client));
                true
            }
        };

        if opened {
            info!(platform, "Opened platform channel");
            self.publish();
        }
        opened
    }

    /// Drops every platform client of `generation`.
    fn clear_platforms(&self, generation: u64) {
        let cleared = {
            let mut channels = self.channels.write();
            if channels.generation != generation {
                return;
            }
            std::mem::take(&mut channels.platforms)
        };

        for client in cleared.values() {
            client.teardown();
        }
        if !cleared.is_empty() {
            debug!(count = cleared.len(), "Cleared platform channels");
        }
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.channels.read().snapshot();
        self.changes.send_replace(snapshot);
    }
}

async fn watch_control(
    inner: Weak<Inner>,
    generation: u64,
    mut events: StreamSubscription<DashboardMessage>,
) {
    while let Some(event) = events.recv().await {
        let Some(aggregator) = inner.upgrade() else {
            return;
        };

        match event {
            ChannelEvent::Message(message) => {
                if let Some((platform, port)) = message.build_started_platform() {
                    aggregator.open_platform(generation, platform, port);
                }
            }
            ChannelEvent::Close { retries_left: 0 } => {
                aggregator.clear_platforms(generation);
            }
            _ => {}
        }
    }

    // The control stream completed.
    if let Some(aggregator) = inner.upgrade() {
        aggregator.clear_platforms(generation);
    }
}

async fn discover(inner: Weak<Inner>, generation: u64) {
    let Some(discovery) = inner.upgrade().map(|aggregator| Arc::clone(&aggregator.discovery))
    else {
        return;
    };

    match discovery.platforms().await {
        Ok(platforms) => {
            let Some(aggregator) = inner.upgrade() else {
                return;
            };
            debug!(count = platforms.len(), "Discovered platforms");
            for platform in platforms {
                aggregator.open_platform(generation, &platform.id, Some(platform.port));
            }
        }
        Err(e) => error!(error = %e, "Platform discovery failed"),
    }
}
