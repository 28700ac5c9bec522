//! Forwards server logs to dashboard clients.
//!
//! The logging registry is built before the server context exists, so the
//! layer writes into a [`LogSink`] that the server attaches to its context
//! once it starts. Events are dropped while nothing is attached.

use crate::context::DevServerContext;
use fob_dev_protocol::{LogEntry, LogType};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// Late-bound destination of forwarded log entries.
#[derive(Clone, Default)]
pub struct LogSink {
    context: Arc<RwLock<Weak<DevServerContext>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts forwarding to `context`, replacing any previous target.
    pub fn attach(&self, context: &Arc<DevServerContext>) {
        *self.context.write() = Arc::downgrade(context);
    }

    /// Stops forwarding.
    pub fn detach(&self) {
        *self.context.write() = Weak::new();
    }

    fn forward(&self, entry: LogEntry) {
        let context = self.context.read().upgrade();
        if let Some(context) = context {
            context.broadcast_log(entry);
        }
    }
}

/// Tracing layer sending events at or above a level to the control channel.
pub struct DashboardLogLayer {
    sink: LogSink,
    max_level: Level,
}

impl DashboardLogLayer {
    /// Creates a layer forwarding events as verbose as `max_level` and
    /// returns the sink the server attaches to.
    pub fn new(max_level: Level) -> (Self, LogSink) {
        let sink = LogSink::new();
        let layer = Self {
            sink: sink.clone(),
            max_level,
        };
        (layer, sink)
    }
}

impl<S: Subscriber> Layer<S> for DashboardLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.max_level {
            return;
        }
        if FORWARDING.with(|active| active.replace(true)) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut message = Vec::with_capacity(2);
        if let Some(text) = visitor.message {
            message.push(Value::String(text));
        }
        if !visitor.fields.is_empty() {
            message.push(Value::Object(visitor.fields));
        }

        self.sink.forward(LogEntry {
            log_type: log_type(metadata.level()),
            timestamp: chrono::Utc::now().timestamp_millis(),
            issuer: metadata.target().to_string(),
            message,
        });

        FORWARDING.with(|active| active.set(false));
    }
}

fn log_type(level: &Level) -> LogType {
    match *level {
        Level::ERROR => LogType::Error,
        Level::WARN => LogType::Warn,
        Level::INFO => LogType::Info,
        _ => LogType::Debug,
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}
