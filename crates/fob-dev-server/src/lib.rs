//! Development server for the fob bundler.
//!
//! The server sits between the bundler and everything that watches it:
//!
//! - [`DevServerContext`] records per-platform build lifecycle events and
//!   fans them out to subscribed clients
//! - [`DevServer`] exposes the context over HTTP and WebSockets, and
//!   symbolicates stack traces against the live build output
//! - [`DashboardLogLayer`] mirrors server logs to dashboard clients
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_dev_server::{DevServer, DevServerContext, DiskBundleSource, ServerConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> fob_dev_server::Result<()> {
//! let config = ServerConfig::new("127.0.0.1:8081".parse().unwrap(), ".", "dist");
//! let context = Arc::new(DevServerContext::new(config.addr.port()));
//! let bundles = Arc::new(DiskBundleSource::new(&config.out_dir));
//!
//! // Bundler hooks report through the shared context.
//! context.notify_build_start("ios");
//!
//! DevServer::new(config, context, bundles)
//!     .start(std::future::pending())
//!     .await
//! # }
//! ```

pub mod bundles;
pub mod config;
pub mod context;
pub mod error;
pub mod log_layer;
pub mod registry;
pub mod server;
mod session;

pub use bundles::{BundleSource, DiskBundleSource, PlatformBundleReader};
pub use config::ServerConfig;
pub use context::{BuildStatus, DevServerContext, PlatformStatus, SharedContext};
pub use error::{Result, ServerError};
pub use log_layer::{DashboardLogLayer, LogSink};
pub use registry::{Audience, ClientFilter, ClientRegistry, Subscription};
pub use server::DevServer;
