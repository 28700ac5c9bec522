//! Bundles produced by the dev build, per platform.

use async_trait::async_trait;
use fob_symbolicate::{BundleReader, SymbolicateError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

type ReadResult<T> = fob_symbolicate::Result<T>;

/// Supplies bundle text and source maps for any platform.
#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Reads the bundle that `file_url` points at.
    async fn read_file(&self, platform: &str, file_url: &str) -> ReadResult<String>;

    /// Reads the source map of the bundle that `file_url` points at.
    async fn read_source_map(&self, platform: &str, file_url: &str) -> ReadResult<String>;

    /// Platforms with output available, used to seed discovery.
    async fn platforms(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Reads bundles written by the bundler to `<out_dir>/<platform>/`.
///
/// `http://localhost:8081/index.bundle?platform=ios` maps to
/// `<out_dir>/ios/index.bundle`, and its source map to
/// `<out_dir>/ios/index.bundle.map`.
#[derive(Debug, Clone)]
pub struct DiskBundleSource {
    out_dir: PathBuf,
}

impl DiskBundleSource {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Resolves the on-disk path of a bundle URL.
    ///
    /// Returns `None` for URLs without a path and for platform names that are
    /// not a single directory name.
    pub fn bundle_path(&self, platform: &str, file_url: &str) -> Option<PathBuf> {
        if platform.is_empty() || platform.contains(['/', '\\']) || platform == ".." {
            return None;
        }

        let base = Url::parse("http://localhost/").ok()?;
        let url = base.join(file_url).ok()?;

        let platform_dir = path_clean::clean(self.out_dir.join(platform));
        let relative = url.path().trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }

        let path = path_clean::clean(platform_dir.join(relative));
        path.starts_with(&platform_dir).then_some(path)
    }

    async fn read(&self, file_url: &str, path: Option<PathBuf>) -> ReadResult<String> {
        let path = path.ok_or_else(|| {
            SymbolicateError::read(file_url, "URL does not point into the build output")
        })?;
        tracing::debug!(path = %path.display(), "Reading bundle output");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SymbolicateError::Io { path, source })
    }
}

#[async_trait]
impl BundleSource for DiskBundleSource {
    async fn read_file(&self, platform: &str, file_url: &str) -> ReadResult<String> {
        self.read(file_url, self.bundle_path(platform, file_url))
            .await
    }

    async fn read_source_map(&self, platform: &str, file_url: &str) -> ReadResult<String> {
        let path = self.bundle_path(platform, file_url).map(|mut path| {
            path.as_mut_os_string().push(".map");
            path
        });
        self.read(file_url, path).await
    }

    async fn platforms(&self) -> Vec<String> {
        let mut platforms = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&self.out_dir).await else {
            return platforms;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_dir = entry
                .file_type()
                .await
                .map(|ft| ft.is_dir())
                .unwrap_or(false);
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    platforms.push(name.to_string());
                }
            }
        }

        platforms.sort();
        platforms
    }
}

/// Binds a [`BundleSource`] to one platform for the symbolicator.
pub struct PlatformBundleReader {
    source: Arc<dyn BundleSource>,
    platform: String,
}

impl PlatformBundleReader {
    pub fn new(source: Arc<dyn BundleSource>, platform: impl Into<String>) -> Self {
        Self {
            source,
            platform: platform.into(),
        }
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }
}

#[async_trait]
impl BundleReader for PlatformBundleReader {
    async fn read_file(&self, file_url: &str) -> ReadResult<String> {
        self.source.read_file(&self.platform, file_url).await
    }

    async fn read_source_map(&self, file_url: &str) -> ReadResult<String> {
        self.source.read_source_map(&self.platform, file_url).await
    }
}
