//! Where the dev server lives and how hard to try reaching it.

use std::time::Duration;

/// Reconnection budget of a stream client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Connection attempts before the stream completes.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// Address of a dev server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub host: String,
    pub port: u16,
    /// Use `wss`/`https`.
    pub secure: bool,
}

impl Endpoints {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            secure: false,
        }
    }

    /// Same server, different port.
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }

    /// WebSocket URL of `path`.
    pub fn ws_url(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}:{}{path}", self.host, self.port)
    }

    /// HTTP URL of `path`.
    pub fn http_url(&self, path: &str) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}:{}{path}", self.host, self.port)
    }

    /// Control channel URL.
    pub fn control_url(&self) -> String {
        self.ws_url("/api/dashboard")
    }

    /// Dashboard channel URL of one platform.
    pub fn platform_url(&self, platform: &str) -> String {
        self.ws_url(&format!("/api/dashboard/{platform}"))
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new("localhost", 8081)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_urls() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.control_url(), "ws://localhost:8081/api/dashboard");
        assert_eq!(
            endpoints.with_port(9000).platform_url("ios"),
            "ws://localhost:9000/api/dashboard/ios"
        );

        let secure = Endpoints {
            secure: true,
            ..Endpoints::new("10.0.2.2", 8081)
        };
        assert_eq!(
            secure.http_url("/api/platforms"),
            "https://10.0.2.2:8081/api/platforms"
        );
    }
}
