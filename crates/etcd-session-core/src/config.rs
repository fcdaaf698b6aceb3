//! Store configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for [`crate::EtcdStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// etcd host
    #[serde(default = "default_host")]
    pub host: String,
    /// etcd client port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout applied by the etcd client
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    2379
}

fn default_request_timeout_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Connection endpoint, `http://<host>:<port>`
    #[must_use]
    pub fn endpoint(&self) -> String {
        endpoint(&self.host, self.port)
    }

    /// Request timeout as a [`Duration`]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Format a connection endpoint
pub(crate) fn endpoint(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 2379);
        assert_eq!(config.endpoint(), "http://localhost:2379");
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"port": 4001}"#).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 4001);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
