//! Transport-level subscribers of the dev server.
//!
//! Every open WebSocket session registers one entry with a [`ClientFilter`]
//! describing which broadcasts it wants. Broadcasting is synchronous and
//! best-effort: text is handed to every matching live sender, senders whose
//! session is gone are pruned, and nothing is kept for later subscribers.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// What a subscriber listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFilter {
    /// Hot-update payloads for one platform, optionally as a specific client.
    Hmr {
        platform: String,
        client_id: Option<String>,
    },
    /// Method-style messages.
    Messages,
    /// Dashboard events: the control channel when `platform` is `None`,
    /// otherwise one platform's channel.
    Dashboard { platform: Option<String> },
}

/// Addressee of a single broadcast.
#[derive(Debug, Clone, Copy)]
pub enum Audience<'a> {
    /// HMR clients of `platform`, restricted to `client_ids` when given.
    Hmr {
        platform: &'a str,
        client_ids: Option<&'a [String]>,
    },
    Messages,
    /// The control channel (`None`) or a platform's dashboard channel.
    Dashboard { platform: Option<&'a str> },
}

impl ClientFilter {
    /// Returns `true` if a subscriber with this filter receives `audience`.
    pub fn accepts(&self, audience: &Audience<'_>) -> bool {
        match (self, audience) {
            (
                ClientFilter::Hmr {
                    platform,
                    client_id,
                },
                Audience::Hmr {
                    platform: target,
                    client_ids,
                },
            ) => {
                if platform.as_str() != *target {
                    return false;
                }
                match client_ids {
                    None => true,
                    Some(ids) => client_id
                        .as_ref()
                        .is_some_and(|id| ids.iter().any(|wanted| wanted == id)),
                }
            }
            (ClientFilter::Messages, Audience::Messages) => true,
            (ClientFilter::Dashboard { platform }, Audience::Dashboard { platform: target }) => {
                platform.as_deref() == *target
            }
            _ => false,
        }
    }
}

struct ClientEntry {
    filter: ClientFilter,
    tx: UnboundedSender<String>,
}

type Clients = RwLock<HashMap<usize, ClientEntry>>;

/// Registry of connected clients.
pub struct ClientRegistry {
    clients: Arc<Clients>,
    next_id: AtomicUsize,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Registers a subscriber.
    ///
    /// The returned [`Subscription`] is the cancel token: dropping it removes
    /// the subscriber. The receiver yields JSON text for every matching
    /// broadcast from now on.
    pub fn subscribe(&self, filter: ClientFilter) -> (Subscription, UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        tracing::debug!(client = id, ?filter, "Client subscribed");
        self.clients.write().insert(id, ClientEntry { filter, tx });

        let subscription = Subscription {
            id,
            clients: Arc::downgrade(&self.clients),
        };
        (subscription, rx)
    }

    /// Sends `text` to every subscriber accepting `audience`.
    ///
    /// Returns the number of subscribers the text was delivered to.
    pub fn broadcast(&self, audience: Audience<'_>, text: &str) -> usize {
        let mut delivered = 0;
        let mut failed_ids = Vec::new();

        {
            let clients = self.clients.read();
            for (id, entry) in clients.iter() {
                if !entry.filter.accepts(&audience) {
                    continue;
                }
                if entry.tx.send(text.to_string()).is_ok() {
                    delivered += 1;
                } else {
                    failed_ids.push(*id);
                }
            }
        }

        if !failed_ids.is_empty() {
            let mut clients = self.clients.write();
            for id in failed_ids {
                clients.remove(&id);
            }
        }

        delivered
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration handle of one subscriber.
///
/// The subscriber is removed when this is dropped or cancelled.
#[must_use = "dropping a subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: usize,
    clients: Weak<Clients>,
}

impl Subscription {
    /// Registry id of the subscriber.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Removes the subscriber.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(clients) = self.clients.upgrade() {
            if clients.write().remove(&self.id).is_some() {
                tracing::debug!(client = self.id, "Client unsubscribed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hmr(platform: &str, client_id: Option<&str>) -> ClientFilter {
        ClientFilter::Hmr {
            platform: platform.to_string(),
            client_id: client_id.map(str::to_string),
        }
    }

    #[test]
    fn test_hmr_filter_matches_platform_and_ids() {
        let ids = vec!["a".to_string()];

        let all_ios = Audience::Hmr {
            platform: "ios",
            client_ids: None,
        };
        let only_a = Audience::Hmr {
            platform: "ios",
            client_ids: Some(ids.as_slice()),
        };

        assert!(hmr("ios", None).accepts(&all_ios));
        assert!(hmr("ios", Some("b")).accepts(&all_ios));
        assert!(!hmr("android", None).accepts(&all_ios));

        assert!(hmr("ios", Some("a")).accepts(&only_a));
        assert!(!hmr("ios", Some("b")).accepts(&only_a));
        assert!(!hmr("ios", None).accepts(&only_a));
    }

    #[test]
    fn test_dashboard_filter_separates_channels() {
        let control = ClientFilter::Dashboard { platform: None };
        let ios = ClientFilter::Dashboard {
            platform: Some("ios".to_string()),
        };

        assert!(control.accepts(&Audience::Dashboard { platform: None }));
        assert!(!control.accepts(&Audience::Dashboard {
            platform: Some("ios")
        }));
        assert!(ios.accepts(&Audience::Dashboard {
            platform: Some("ios")
        }));
        assert!(!ios.accepts(&Audience::Messages));
    }

    #[test]
    fn test_broadcast_reaches_current_subscribers_only() {
        let registry = ClientRegistry::new();

        assert_eq!(registry.broadcast(Audience::Messages, "early"), 0);

        let (_sub, mut rx) = registry.subscribe(ClientFilter::Messages);
        let (_other, mut other_rx) = registry.subscribe(ClientFilter::Dashboard { platform: None });

        assert_eq!(registry.broadcast(Audience::Messages, "hello"), 1);
        assert_eq!(rx.try_recv().unwrap(), "hello");
        assert!(rx.try_recv().is_err());
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_and_cancel_unsubscribe() {
        let registry = ClientRegistry::new();
        let (first, _rx1) = registry.subscribe(ClientFilter::Messages);
        let (second, _rx2) = registry.subscribe(ClientFilter::Messages);
        assert_eq!(registry.len(), 2);
        assert_ne!(first.id(), second.id());

        drop(first);
        assert_eq!(registry.len(), 1);

        second.cancel();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_prunes_closed_receivers() {
        let registry = ClientRegistry::new();
        let (_sub, rx) = registry.subscribe(ClientFilter::Messages);
        drop(rx);

        assert_eq!(registry.broadcast(Audience::Messages, "gone"), 0);
        assert!(registry.is_empty());
    }
}
