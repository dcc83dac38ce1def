//! HTTP server configuration.

use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;

use super::ConfigError;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Configuration for the HTTP listener.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl ServerConfig {
    /// Returns the bind host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the bind port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::invalid("server.host", "not a valid IP address"))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_localhost() {
        let config = ServerConfig::default();
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn bad_host_is_rejected() {
        let config = ServerConfig {
            host: "not-an-ip".to_string(),
            port: 8080,
        };
        assert!(config.validate().is_err());
    }
}
