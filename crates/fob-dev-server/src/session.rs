//! WebSocket sessions of registered clients.

use crate::registry::Subscription;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::UnboundedReceiver;

/// Pumps broadcasts into the socket until either side goes away.
///
/// Inbound text is ignored; clients only listen. The subscription is
/// released when the session ends.
pub(crate) async fn run(
    socket: WebSocket,
    subscription: Subscription,
    mut broadcasts: UnboundedReceiver<String>,
) {
    let client = subscription.id();
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(client, "WebSocket session opened");

    loop {
        tokio::select! {
            outgoing = broadcasts.recv() => {
                let Some(text) = outgoing else {
                    break;
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(client, error = %e, "WebSocket receive failed");
                        break;
                    }
                }
            }
        }
    }

    drop(subscription);
    tracing::debug!(client, "WebSocket session closed");
}
