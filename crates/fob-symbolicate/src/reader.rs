//! Access to the bundles produced by the dev build.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Reads bundle files and their source maps from the live dev build.
///
/// Both operations take the frame's `file` identifier, usually a bundle URL
/// such as `http://localhost:8081/index.bundle?platform=ios`.
#[async_trait]
pub trait BundleReader: Send + Sync {
    /// Reads the whole bundle file.
    async fn read_file(&self, file_url: &str) -> Result<String>;

    /// Reads the source map of the bundle.
    async fn read_source_map(&self, file_url: &str) -> Result<String>;
}

#[async_trait]
impl<T> BundleReader for Arc<T>
where
    T: BundleReader + ?Sized,
{
    async fn read_file(&self, file_url: &str) -> Result<String> {
        (**self).read_file(file_url).await
    }

    async fn read_source_map(&self, file_url: &str) -> Result<String> {
        (**self).read_source_map(file_url).await
    }
}
