//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::{duration_secs, option_duration_secs};
use crate::error::ConfigError;

/// Host the geometry server listens on
pub const DEFAULT_HOST: &str = "localhost";

/// Port the geometry server listens on
pub const DEFAULT_PORT: u16 = 9999;

/// Where and how to reach the geometry server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host name or address
    pub host: String,

    /// Server port
    pub port: u16,

    /// How long to wait for the TCP connection, in seconds (0 = no limit)
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Per-read/write socket timeout, in seconds. Unset blocks indefinitely,
    /// which a long-running server computation may need.
    #[serde(default, with = "option_duration_secs", skip_serializing_if = "Option::is_none")]
    pub io_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            io_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Config for an explicit host and port, other settings default
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the server address (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check values that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0".to_string()));
        }
        Ok(())
    }
}
