//! etcd v2 keys API client
//!
//! Every call is a single blocking HTTP request; the client keeps no session
//! with the server beyond the HTTP connection pool `reqwest` manages.

use super::{KvClient, KvError, KvNode, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Path of the keys API below the endpoint
const KEYS_PATH: &str = "v2/keys";

/// etcd error code for a missing key
const ERROR_KEY_NOT_FOUND: u32 = 100;

/// Configuration for [`EtcdClient`]
#[derive(Debug, Clone)]
pub struct EtcdClientConfig {
    /// Base endpoint, e.g. `http://localhost:2379`
    pub endpoint: String,
    /// Timeout applied to every request
    pub request_timeout: Duration,
}

impl Default for EtcdClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:2379".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl EtcdClientConfig {
    /// Create a configuration for the given endpoint
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct KeysResponse {
    node: Option<KvNode>,
}

#[derive(Debug, Deserialize)]
struct EtcdErrorBody {
    #[serde(rename = "errorCode")]
    error_code: u32,
    message: String,
    #[serde(default)]
    cause: Option<String>,
}

/// Blocking etcd v2 client
pub struct EtcdClient {
    http: Client,
    endpoint: Url,
}

impl EtcdClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is not an absolute base URL or the HTTP
    /// client cannot be built
    pub fn new(config: EtcdClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| KvError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(KvError::InvalidEndpoint(config.endpoint));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| KvError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        info!(endpoint = %endpoint, timeout = ?config.request_timeout, "Initializing etcd client");
        Ok(Self { http, endpoint })
    }

    /// Endpoint this client talks to
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the keys API URL for a key, percent-encoding each segment
    fn key_url(&self, key: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| KvError::InvalidEndpoint(self.endpoint.to_string()))?;
            segments.pop_if_empty();
            segments.extend(KEYS_PATH.split('/'));
            segments.extend(key.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn send(key: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|e| KvError::Unavailable(format!("etcd request for {} failed: {}", key, e)))?;
        Self::check(key, response)
    }

    /// Map a non-success response to the error taxonomy
    fn check(key: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let parsed = serde_json::from_str::<EtcdErrorBody>(&body).ok();

        if status == StatusCode::NOT_FOUND
            || parsed
                .as_ref()
                .is_some_and(|e| e.error_code == ERROR_KEY_NOT_FOUND)
        {
            return Err(KvError::KeyNotFound(key.to_string()));
        }

        let message = match parsed {
            Some(EtcdErrorBody {
                message,
                cause: Some(cause),
                ..
            }) => format!("{} ({})", message, cause),
            Some(e) => e.message,
            None => body,
        };
        Err(KvError::Unsuccessful {
            status: status.as_u16(),
            message,
        })
    }

    fn read_node(key: &str, response: Response) -> Result<KvNode> {
        let body: KeysResponse = response
            .json()
            .map_err(|e| KvError::InvalidResponse(format!("{}: {}", key, e)))?;
        body.node
            .ok_or_else(|| KvError::InvalidResponse(format!("no node returned for {}", key)))
    }
}

impl KvClient for EtcdClient {
    fn get(&self, key: &str) -> Result<KvNode> {
        let url = self.key_url(key)?;
        let response = Self::send(key, self.http.get(url))?;
        debug!(key = %key, "etcd GET");
        Self::read_node(key, response)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let url = self.key_url(key)?;
        Self::send(key, self.http.put(url).form(&[("value", value)]))?;
        debug!(key = %key, bytes = value.len(), "etcd PUT");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let url = self.key_url(key)?;
        Self::send(key, self.http.delete(url))?;
        debug!(key = %key, "etcd DELETE");
        Ok(())
    }

    fn delete_dir_recursive(&self, prefix: &str) -> Result<()> {
        let url = self.key_url(prefix)?;
        Self::send(
            prefix,
            self.http.delete(url).query(&[("recursive", "true")]),
        )?;
        debug!(prefix = %prefix, "etcd recursive DELETE");
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<KvNode>> {
        let url = self.key_url(prefix)?;
        let response = Self::send(prefix, self.http.get(url))?;
        let node = Self::read_node(prefix, response)?;
        debug!(prefix = %prefix, children = node.nodes.len(), "etcd list");
        Ok(node.nodes)
    }
}

#[cfg(test)]
mod tests;
