//! Scripted in-memory transport.

#![allow(dead_code)]

use async_trait::async_trait;
use fob_dev_client::{Connection, Connector, TransportError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// How the next connection to a URL behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Connecting fails.
    Refuse,
    /// Opens, then closes right away.
    CloseImmediately,
    /// Opens and stays open; fed through [`FakeConnector::send`].
    Live,
}

struct Attempt {
    url: String,
    feed: Option<UnboundedSender<String>>,
    closed: Arc<AtomicBool>,
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, VecDeque<Script>>,
    default: Option<Script>,
    attempts: Vec<Attempt>,
}

/// Connector whose connections are driven by the test.
#[derive(Clone, Default)]
pub struct FakeConnector {
    state: Arc<Mutex<State>>,
}

impl FakeConnector {
    /// Every connection behaves like `script` unless scripted per URL.
    pub fn new(default: Script) -> Self {
        let connector = Self::default();
        connector.state.lock().default = Some(default);
        connector
    }

    /// Queues behaviours for the next connections to `url`.
    pub fn script(&self, url: &str, scripts: impl IntoIterator<Item = Script>) {
        self.state
            .lock()
            .scripts
            .entry(url.to_string())
            .or_default()
            .extend(scripts);
    }

    /// Connection attempts made so far, refused ones included.
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts.len()
    }

    /// Connection attempts made to `url`.
    pub fn attempts_to(&self, url: &str) -> usize {
        self.state
            .lock()
            .attempts
            .iter()
            .filter(|a| a.url == url)
            .count()
    }

    /// Sends text over the most recent live connection to `url`.
    pub fn send(&self, url: &str, text: &str) -> bool {
        let state = self.state.lock();
        state
            .attempts
            .iter()
            .rev()
            .filter(|a| a.url == url)
            .find_map(|a| a.feed.as_ref())
            .is_some_and(|feed| feed.send(text.to_string()).is_ok())
    }

    /// Closes the most recent live connection to `url` from the server side.
    pub fn disconnect(&self, url: &str) {
        let mut state = self.state.lock();
        if let Some(attempt) = state
            .attempts
            .iter_mut()
            .rev()
            .find(|a| a.url == url && a.feed.is_some())
        {
            attempt.feed = None;
        }
    }

    /// Whether the client closed the most recent connection to `url`.
    pub fn client_closed(&self, url: &str) -> bool {
        let state = self.state.lock();
        state
            .attempts
            .iter()
            .rev()
            .find(|a| a.url == url)
            .is_some_and(|a| a.closed.load(Ordering::SeqCst))
    }

    /// Waits until `url` has seen `count` attempts.
    pub async fn wait_for_attempts(&self, url: &str, count: usize) {
        for _ in 0..1000 {
            if self.attempts_to(url) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{url} never reached {count} connection attempts");
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, TransportError> {
        let mut state = self.state.lock();
        let script = state
            .scripts
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .or(state.default)
            .unwrap_or(Script::Live);

        let closed = Arc::new(AtomicBool::new(false));
        let (feed, connection) = match script {
            Script::Refuse => {
                state.attempts.push(Attempt {
                    url: url.to_string(),
                    feed: None,
                    closed,
                });
                return Err(TransportError::connect(url, "connection refused"));
            }
            Script::CloseImmediately => {
                let (tx, rx) = mpsc::unbounded_channel();
                drop(tx);
                (None, FakeConnection::new(rx, Arc::clone(&closed)))
            }
            Script::Live => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Some(tx), FakeConnection::new(rx, Arc::clone(&closed)))
            }
        };

        state.attempts.push(Attempt {
            url: url.to_string(),
            feed,
            closed,
        });
        Ok(Box::new(connection))
    }
}

struct FakeConnection {
    inbound: UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl FakeConnection {
    fn new(inbound: UnboundedReceiver<String>, closed: Arc<AtomicBool>) -> Self {
        Self { inbound, closed }
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn next_message(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A `watchRun` control message.
pub fn watch_run(platform: &str, port: u16) -> String {
    format!(
        r#"{{"kind":"compilation","event":{{"name":"watchRun","platform":"{platform}","port":{port}}}}}"#
    )
}
