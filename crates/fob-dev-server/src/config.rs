//! Runtime configuration of the dev server.

use fob_symbolicate::CodeFrameOptions;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Resolved dev server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub addr: SocketAddr,

    /// Advertise `https` URLs. TLS itself is terminated by a proxy.
    pub https: bool,

    /// Project root that resolved source paths are relative to.
    pub root: PathBuf,

    /// Directory the bundler writes per-platform output into.
    pub out_dir: PathBuf,

    /// Excerpt rendering for symbolication responses.
    pub code_frame: CodeFrameOptions,
}

impl ServerConfig {
    pub fn new(addr: SocketAddr, root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            addr,
            https: false,
            root: root.into(),
            out_dir: out_dir.into(),
            code_frame: CodeFrameOptions::default(),
        }
    }

    /// Get the server URL for display.
    pub fn server_url(&self) -> String {
        let protocol = if self.https { "https" } else { "http" };
        format!("{}://{}", protocol, self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url() {
        let mut config = ServerConfig::new("127.0.0.1:8081".parse().unwrap(), "/app", "/app/dist");
        assert_eq!(config.server_url(), "http://127.0.0.1:8081");

        config.https = true;
        assert_eq!(config.server_url(), "https://127.0.0.1:8081");
    }
}
