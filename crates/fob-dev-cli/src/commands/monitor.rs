//! Monitor command implementation.
//!
//! Connects a [`StreamAggregator`] to a running server and prints every
//! channel event on stdout, one line each. Typing `r` and Enter reconnects
//! all channels with fresh retry budgets.

use crate::cli::MonitorArgs;
use crate::error::{Result, ResultExt};
use crate::ui;
use fob_dev_client::{
    ChannelEvent, ChannelSetSnapshot, DashboardClient, Endpoints, HttpPlatformDiscovery,
    RetryPolicy, StreamAggregator, WsConnector,
};
use fob_dev_protocol::{CompilationEvent, DashboardMessage, LogEntry};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

const CONTROL: &str = "control";

type Line = (String, ChannelEvent<DashboardMessage>);

/// Execute the monitor command.
///
/// Runs until Ctrl+C. Channels that exhaust their retries stay down until
/// the next `r`.
pub async fn execute(args: MonitorArgs) -> Result<()> {
    let endpoints = Endpoints {
        host: args.host,
        port: args.port,
        secure: args.secure,
    };
    let policy = RetryPolicy {
        attempts: args.retries.max(1),
        delay: Duration::from_secs(args.retry_delay),
    };

    ui::info(&format!("Connecting to {}", endpoints.control_url()));
    let aggregator = StreamAggregator::start(
        endpoints.clone(),
        policy,
        Arc::new(WsConnector),
        Arc::new(HttpPlatformDiscovery::new(&endpoints)),
    );
    ui::info("Type r + Enter to reconnect all channels, Ctrl+C to quit");

    let (lines_tx, mut lines) = mpsc::unbounded_channel::<Line>();
    let mut forwarders = Forwarders::new(lines_tx);
    let mut changes = aggregator.watch();
    let initial = changes.borrow_and_update().clone();
    forwarders.sync(&aggregator, &initial);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some((channel, event)) = lines.recv() => {
                println!("{}", describe_event(&channel, &event));
            }

            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = changes.borrow_and_update().clone();
                println!("{}", describe_snapshot(&snapshot));
                forwarders.sync(&aggregator, &snapshot);
            }

            line = stdin.next_line(), if stdin_open => match line.context("Failed to read stdin")? {
                Some(line) if line.trim().eq_ignore_ascii_case("r") => {
                    ui::info("Reconnecting all channels...");
                    aggregator.retry_all();
                }
                Some(_) => {}
                None => stdin_open = false,
            },

            _ = signal::ctrl_c() => {
                break;
            }
        }
    }

    forwarders.clear();
    Ok(())
}

/// One printing task per subscribed channel.
struct Forwarders {
    generation: Option<u64>,
    tasks: HashMap<String, JoinHandle<()>>,
    lines: UnboundedSender<Line>,
}

impl Forwarders {
    fn new(lines: UnboundedSender<Line>) -> Self {
        Self {
            generation: None,
            tasks: HashMap::new(),
            lines,
        }
    }

    /// Subscribes to channels new in `snapshot` and drops gone ones.
    ///
    /// A new generation means every client was replaced, control included.
    fn sync(&mut self, aggregator: &StreamAggregator, snapshot: &ChannelSetSnapshot) {
        if self.generation != Some(snapshot.generation) {
            self.clear();
            self.generation = Some(snapshot.generation);
            self.spawn(CONTROL, aggregator.control_connection());
        }

        self.tasks.retain(|channel, task| {
            let keep = channel == CONTROL || snapshot.platforms.contains(channel);
            if !keep {
                task.abort();
            }
            keep
        });

        for platform in &snapshot.platforms {
            if self.tasks.contains_key(platform) {
                continue;
            }
            if let Some(client) = aggregator.compiler_connection(platform) {
                self.spawn(platform, client);
            }
        }
    }

    fn spawn(&mut self, channel: &str, client: Arc<DashboardClient>) {
        let mut events = client.subscribe();
        let lines = self.lines.clone();
        let label = channel.to_string();
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if lines.send((label.clone(), event)).is_err() {
                    return;
                }
            }
        });
        self.tasks.insert(channel.to_string(), task);
    }

    fn clear(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// One output line for a channel event.
pub fn describe_event(channel: &str, event: &ChannelEvent<DashboardMessage>) -> String {
    let text = match event {
        ChannelEvent::Init { retries_left } => {
            format!("connecting ({} retries left)", retries_left)
        }
        ChannelEvent::Open => "connected".to_string(),
        ChannelEvent::Close { retries_left: 0 } => "closed, giving up".to_string(),
        ChannelEvent::Close { retries_left } => {
            format!("closed ({} retries left)", retries_left)
        }
        ChannelEvent::Message(message) => describe_message(message),
    };
    format!("[{}] {}", channel, text)
}

fn describe_message(message: &DashboardMessage) -> String {
    match message {
        DashboardMessage::Compilation { event } => match event {
            CompilationEvent::WatchRun { platform, .. } => {
                format!("{}: build started", platform)
            }
            CompilationEvent::Done {
                platform,
                duration_ms: Some(ms),
            } => format!(
                "{}: build finished in {}",
                platform,
                ui::format_duration(Duration::from_millis(*ms))
            ),
            CompilationEvent::Done { platform, .. } => format!("{}: build finished", platform),
            CompilationEvent::Progress { platform, progress } => format!(
                "{}: {}% ({}/{})",
                platform,
                progress.percent(),
                progress.completed,
                progress.total
            ),
        },
        DashboardMessage::Log { entry } => describe_log(entry),
    }
}

fn describe_log(entry: &LogEntry) -> String {
    let level = serde_json::to_value(entry.log_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let text: Vec<String> = entry
        .message
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    if entry.issuer.is_empty() {
        format!("{} {}", level, text.join(" "))
    } else {
        format!("{} {}: {}", level, entry.issuer, text.join(" "))
    }
}

/// One output line for a channel set change.
pub fn describe_snapshot(snapshot: &ChannelSetSnapshot) -> String {
    if snapshot.platforms.is_empty() {
        format!("[channels] generation {}: no platforms", snapshot.generation)
    } else {
        format!(
            "[channels] generation {}: {}",
            snapshot.generation,
            snapshot.platforms.join(", ")
        )
    }
}
