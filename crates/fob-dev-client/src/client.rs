//! Reconnecting stream client.
//!
//! A [`ResilientStreamClient`] owns one logical channel to the dev server.
//! A background task connects, decodes inbound JSON into `T` and fans every
//! [`ChannelEvent`] out to all current observers. When the transport closes
//! the task waits a fixed delay and reconnects, until the retry budget is
//! spent; then every observer sees the end of its stream.

use crate::config::RetryPolicy;
use crate::state::{ConnectionRecord, ConnectionState};
use crate::transport::{Connection, Connector};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Event seen by an observer of a stream client.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent<T> {
    /// A connection attempt is starting.
    Init { retries_left: u32 },
    /// The transport opened.
    Open,
    /// The transport closed or could not be opened.
    Close { retries_left: u32 },
    /// A decoded inbound message.
    Message(T),
}

struct Observers<T> {
    next_id: u64,
    senders: HashMap<u64, UnboundedSender<ChannelEvent<T>>>,
    completed: bool,
}

struct Shared<T> {
    url: String,
    observers: Mutex<Observers<T>>,
    record: Mutex<ConnectionRecord>,
}

impl<T: Clone> Shared<T> {
    fn emit(&self, event: ChannelEvent<T>) {
        let observers = self.observers.lock();
        for tx in observers.senders.values() {
            // A closed receiver is removed when its subscription drops.
            let _ = tx.send(event.clone());
        }
    }

    /// Ends every observer stream; later subscribers start out completed.
    fn complete(&self) {
        let mut observers = self.observers.lock();
        observers.completed = true;
        observers.senders.clear();
    }
}

/// Reconnecting, retry-bounded subscription source over one channel.
///
/// Must be created inside a tokio runtime. Dropping the client tears it
/// down: the transport is closed and observers receive nothing further.
pub struct ResilientStreamClient<T> {
    shared: Arc<Shared<T>>,
    shutdown: watch::Sender<bool>,
}

impl<T> ResilientStreamClient<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    /// Starts connecting to `url` in the background.
    pub fn connect(url: impl Into<String>, connector: Arc<dyn Connector>, policy: RetryPolicy) -> Self {
        Self::connect_observed(url, connector, policy).0
    }

    /// Like [`connect`](Self::connect), with one observer attached before
    /// the background task starts, so it sees the first `Init`.
    pub fn connect_observed(
        url: impl Into<String>,
        connector: Arc<dyn Connector>,
        policy: RetryPolicy,
    ) -> (Self, StreamSubscription<T>) {
        let shared = Arc::new(Shared {
            url: url.into(),
            observers: Mutex::new(Observers {
                next_id: 0,
                senders: HashMap::new(),
                completed: false,
            }),
            record: Mutex::new(ConnectionRecord::new(policy.attempts)),
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        let client = Self { shared, shutdown };
        let subscription = client.subscribe();

        tokio::spawn(run(Arc::clone(&client.shared), connector, policy, shutdown_rx));

        (client, subscription)
    }

    /// Attaches an observer.
    ///
    /// The observer receives every event from now on; past events are not
    /// replayed. Dropping the returned [`StreamSubscription`] detaches it
    /// without affecting the transport or other observers.
    pub fn subscribe(&self) -> StreamSubscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut observers = self.shared.observers.lock();

        let id = observers.next_id;
        observers.next_id += 1;
        if !observers.completed {
            observers.senders.insert(id, tx);
        }

        StreamSubscription {
            id,
            events: rx,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// URL this client connects to.
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.record.lock().state()
    }

    /// Attempts left, including the current one.
    pub fn retries_left(&self) -> u32 {
        self.shared.record.lock().retries_left()
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.shared.observers.lock().senders.len()
    }

    /// Stops the client: closes the transport and ends every observer stream.
    pub fn teardown(&self) {
        self.shared.complete();
        self.shutdown.send_replace(true);
    }
}

impl<T> Drop for ResilientStreamClient<T> {
    fn drop(&mut self) {
        {
            let mut observers = self.shared.observers.lock();
            observers.completed = true;
            observers.senders.clear();
        }
        self.shutdown.send_replace(true);
    }
}

/// One observer of a [`ResilientStreamClient`].
pub struct StreamSubscription<T> {
    id: u64,
    events: UnboundedReceiver<ChannelEvent<T>>,
    shared: Weak<Shared<T>>,
}

impl<T> StreamSubscription<T> {
    /// Next event, or `None` once the stream has completed.
    pub async fn recv(&mut self) -> Option<ChannelEvent<T>> {
        self.events.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ChannelEvent<T>> {
        self.events.try_recv().ok()
    }

    /// Detaches the observer.
    pub fn unsubscribe(self) {}
}

impl<T> Drop for StreamSubscription<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.observers.lock().senders.remove(&self.id);
        }
    }
}

enum Ended {
    Closed,
    Shutdown,
}

async fn run<T>(
    shared: Arc<Shared<T>>,
    connector: Arc<dyn Connector>,
    policy: RetryPolicy,
    mut shutdown: watch::Receiver<bool>,
) where
    T: DeserializeOwned + Clone + Send + 'static,
{
    let url = shared.url.clone();

    loop {
        let retries_left = shared.record.lock().init();
        shared.emit(ChannelEvent::Init { retries_left });
        debug!(%url, retries_left, "Connecting");

        let connected = tokio::select! {
            _ = shutdown.changed() => return,
            result = connector.connect(&url) => result,
        };

        match connected {
            Ok(mut connection) => {
                shared.record.lock().on_open();
                shared.emit(ChannelEvent::Open);
                info!(%url, "Connected");

                let ended = pump(&shared, connection.as_mut(), &mut shutdown).await;
                if let Ended::Shutdown = ended {
                    connection.close().await;
                    debug!(%url, "Stream client stopped");
                    return;
                }
            }
            Err(e) => warn!(%url, error = %e, "Connection failed"),
        }

        let Some(retries_left) = shared.record.lock().on_close() else {
            return;
        };
        shared.emit(ChannelEvent::Close { retries_left });

        if shared.record.lock().is_exhausted() {
            warn!(%url, "Connection retries exhausted");
            shared.complete();
            return;
        }

        debug!(%url, delay = ?policy.delay, retries_left, "Reconnecting after delay");
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(policy.delay) => {}
        }
        shared.record.lock().on_reconnect();
    }
}

/// Forwards messages until the transport closes or the client is stopped.
async fn pump<T>(
    shared: &Shared<T>,
    connection: &mut dyn Connection,
    shutdown: &mut watch::Receiver<bool>,
) -> Ended
where
    T: DeserializeOwned + Clone,
{
    loop {
        tokio::select! {
            _ = shutdown.changed() => return Ended::Shutdown,
            inbound = connection.next_message() => match inbound {
                Some(Ok(text)) => match serde_json::from_str::<T>(&text) {
                    Ok(payload) => shared.emit(ChannelEvent::Message(payload)),
                    Err(e) => error!(url = %shared.url, error = %e, "Malformed message"),
                },
                Some(Err(e)) => {
                    warn!(url = %shared.url, error = %e, "Connection lost");
                    return Ended::Closed;
                }
                None => return Ended::Closed,
            },
        }
    }
}
