//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::{GatewayError, DEFAULT_HOST, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT};

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the request body limit
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Apply the `PORT` variable when present
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<Self> {
        if let Some(port) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| GatewayError::InvalidConfig(format!("PORT is not a port: {port}")))?;
        }
        Ok(self)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                GatewayError::InvalidConfig(format!("{}:{} is not a socket address", self.host, self.port))
            })
    }

    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
