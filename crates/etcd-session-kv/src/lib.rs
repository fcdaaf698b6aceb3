//! Etcd Session KV - Remote key-value capability
//!
//! This crate provides the narrow client surface the session store consumes:
//! - `KvClient`: blocking get/set/delete/list over a hierarchical namespace
//! - `EtcdClient`: etcd v2 keys API over HTTP
//! - `MemoryKv`: in-process namespace (development/testing)
//!
//! Retries, pooling and timeouts belong to the client implementation, never to
//! the callers of this trait.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod etcd;
mod memory;

pub use error::{KvError, Result};
pub use etcd::{EtcdClient, EtcdClientConfig};
pub use memory::MemoryKv;

use serde::Deserialize;

/// A node in the hierarchical namespace
///
/// Leaves carry a `value`; directories carry `nodes` when they were listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KvNode {
    /// Absolute key, e.g. `/sessions/abc`
    pub key: String,
    /// Leaf value (absent for directories)
    #[serde(default)]
    pub value: Option<String>,
    /// Whether this node is a directory
    #[serde(default)]
    pub dir: bool,
    /// Children (only populated by listings)
    #[serde(default)]
    pub nodes: Vec<KvNode>,
    /// Index of the last modification
    #[serde(default, rename = "modifiedIndex")]
    pub modified_index: u64,
}

impl KvNode {
    /// Last path segment of the key
    #[must_use]
    pub fn name(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// Blocking client capability over a remote hierarchical key-value service
pub trait KvClient: Send + Sync {
    /// Point read of a single key
    fn get(&self, key: &str) -> Result<KvNode>;

    /// Point write of a text value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a single key
    fn delete(&self, key: &str) -> Result<()>;

    /// Delete a directory and everything beneath it
    fn delete_dir_recursive(&self, prefix: &str) -> Result<()>;

    /// List the immediate children of a directory
    fn list(&self, prefix: &str) -> Result<Vec<KvNode>>;
}
