//! Reconnecting dashboard streams for the fob dev server.
//!
//! - [`ResilientStreamClient`] wraps one WebSocket channel with a bounded,
//!   fixed-delay retry budget and fans its events out to any number of
//!   observers
//! - [`StreamAggregator`] keeps a control channel plus one channel per
//!   platform, discovering platforms over HTTP and from build starts
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_dev_client::{
//!     ChannelEvent, Endpoints, HttpPlatformDiscovery, RetryPolicy, StreamAggregator, WsConnector,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let endpoints = Endpoints::new("localhost", 8081);
//! let aggregator = StreamAggregator::start(
//!     endpoints.clone(),
//!     RetryPolicy::default(),
//!     Arc::new(WsConnector),
//!     Arc::new(HttpPlatformDiscovery::new(&endpoints)),
//! );
//!
//! let mut control = aggregator.control_connection().subscribe();
//! while let Some(event) = control.recv().await {
//!     if let ChannelEvent::Message(message) = event {
//!         println!("{message:?}");
//!     }
//! }
//! # }
//! ```

pub mod aggregator;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod state;
pub mod transport;

pub use aggregator::{ChannelSetSnapshot, DashboardClient, StreamAggregator};
pub use client::{ChannelEvent, ResilientStreamClient, StreamSubscription};
pub use config::{Endpoints, RetryPolicy};
pub use discovery::{HttpPlatformDiscovery, PlatformDiscovery, StaticPlatforms};
pub use error::{Result, TransportError};
pub use state::{ConnectionRecord, ConnectionState};
pub use transport::{Connection, Connector, WsConnector};
