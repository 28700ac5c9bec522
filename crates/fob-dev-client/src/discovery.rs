//! Platform discovery.

use crate::config::Endpoints;
use crate::error::{Result, TransportError};
use async_trait::async_trait;
use fob_dev_protocol::PlatformInfo;

/// Lists the platforms a dev server is compiling for.
#[async_trait]
pub trait PlatformDiscovery: Send + Sync + 'static {
    async fn platforms(&self) -> Result<Vec<PlatformInfo>>;
}

/// Fetches `GET /api/platforms` from the dev server.
#[derive(Debug, Clone)]
pub struct HttpPlatformDiscovery {
    client: reqwest::Client,
    url: String,
}

impl HttpPlatformDiscovery {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: endpoints.http_url("/api/platforms"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PlatformDiscovery for HttpPlatformDiscovery {
    async fn platforms(&self) -> Result<Vec<PlatformInfo>> {
        let discovery_error = |e: reqwest::Error| TransportError::Discovery {
            url: self.url.clone(),
            message: e.to_string(),
        };

        self.client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(discovery_error)?
            .json::<Vec<PlatformInfo>>()
            .await
            .map_err(discovery_error)
    }
}

/// Discovery that always reports the same platforms.
#[derive(Debug, Clone, Default)]
pub struct StaticPlatforms(pub Vec<PlatformInfo>);

#[async_trait]
impl PlatformDiscovery for StaticPlatforms {
    async fn platforms(&self) -> Result<Vec<PlatformInfo>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_discovery_url() {
        let discovery = HttpPlatformDiscovery::new(&Endpoints::new("127.0.0.1", 8081));
        assert_eq!(discovery.url(), "http://127.0.0.1:8081/api/platforms");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_discovery_error() {
        // Port 9 (discard) is closed on test machines.
        let discovery = HttpPlatformDiscovery::new(&Endpoints::new("127.0.0.1", 9));
        let err = discovery.platforms().await.unwrap_err();
        assert!(matches!(err, TransportError::Discovery { .. }));
    }
}
