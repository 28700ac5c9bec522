//! The duplex channel a stream client runs over.
//!
//! [`WsConnector`] is the real WebSocket transport; tests substitute their
//! own [`Connector`] to script opens and closes.

use crate::error::{Result, TransportError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Opens connections.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a connection to `url`.
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>>;
}

/// One open connection.
#[async_trait]
pub trait Connection: Send {
    /// Next inbound text message; `None` once the peer has closed.
    async fn next_message(&mut self) -> Option<Result<String>>;

    /// Closes the connection.
    async fn close(&mut self);
}

/// WebSocket transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::connect(url, e))?;
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_message(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(WsMessage::Close(_)) => return None,
                Ok(_) => {
                    // Ping/Pong/Binary
                }
                Err(e) => return Some(Err(TransportError::Protocol(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.send(WsMessage::Close(None)).await {
            tracing::debug!(error = %e, "Failed to send close frame");
        }
    }
}
