use crate::config::DevServerConfig;
use crate::error::{ConfigError, Result};
use fob_dev_server::ServerConfig;
use fob_symbolicate::CodeFrameOptions;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::Path;

impl DevServerConfig {
    /// Resolve into the server's runtime settings.
    ///
    /// Host names are resolved here; IPv4 addresses are preferred.
    pub fn to_server_config(&self, cwd: &Path) -> Result<ServerConfig> {
        let addr = self.socket_addr()?;
        let mut config = ServerConfig::new(addr, cwd.join(&self.root), cwd.join(&self.out_dir));
        config.https = self.https;
        config.code_frame = CodeFrameOptions {
            lines_above: self.symbolicate.context_lines_above,
            lines_below: self.symbolicate.context_lines_below,
            ..CodeFrameOptions::default()
        };
        Ok(config)
    }

    fn socket_addr(&self) -> Result<SocketAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        let unresolved = |hint: String| ConfigError::InvalidValue {
            field: "host".to_string(),
            value: self.host.clone(),
            hint,
        };

        let addrs: Vec<SocketAddr> = (host, self.port)
            .to_socket_addrs()
            .map_err(|e| unresolved(format!("Cannot resolve host: {}", e)))?
            .collect();

        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| unresolved("Host resolved to no addresses".to_string()).into())
    }
}
