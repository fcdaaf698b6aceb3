//! In-memory namespace (for development/testing)
//!
//! Emulates the etcd directory semantics the session store relies on:
//! missing keys are `KeyNotFound`, `list` yields immediate children and
//! intermediate directories exist implicitly while they have descendants.

use super::error::handle_lock_poison;
use super::{KvClient, KvError, KvNode, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    /// Leaf key (no leading slash) -> (value, modified index)
    entries: BTreeMap<String, (String, u64)>,
    index: u64,
}

impl Inner {
    fn has_descendants(&self, dir: &str) -> bool {
        let prefix = dir_prefix(dir);
        self.entries
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }
}

/// In-memory key-value namespace
#[derive(Debug, Default)]
pub struct MemoryKv {
    inner: RwLock<Inner>,
}

fn normalize(key: &str) -> String {
    key.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn dir_prefix(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    }
}

fn leaf_node(key: &str, value: &str, index: u64) -> KvNode {
    KvNode {
        key: format!("/{}", key),
        value: Some(value.to_string()),
        dir: false,
        nodes: Vec::new(),
        modified_index: index,
    }
}

impl MemoryKv {
    /// Create an empty namespace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leaf entries across the whole namespace
    pub fn len(&self) -> Result<usize> {
        let inner = self.inner.read().map_err(handle_lock_poison)?;
        Ok(inner.entries.len())
    }

    /// Whether the namespace holds no leaves
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl KvClient for MemoryKv {
    fn get(&self, key: &str) -> Result<KvNode> {
        let key = normalize(key);
        let inner = self.inner.read().map_err(handle_lock_poison)?;

        if let Some((value, index)) = inner.entries.get(&key) {
            return Ok(leaf_node(&key, value, *index));
        }
        if inner.has_descendants(&key) {
            return Ok(KvNode {
                key: format!("/{}", key),
                dir: true,
                ..KvNode::default()
            });
        }
        Err(KvError::KeyNotFound(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = normalize(key);
        let mut inner = self.inner.write().map_err(handle_lock_poison)?;

        if inner.has_descendants(&key) {
            return Err(KvError::Unsuccessful {
                status: 403,
                message: format!("Not a file ({})", key),
            });
        }
        let mut parent = key.as_str();
        while let Some((p, _)) = parent.rsplit_once('/') {
            if inner.entries.contains_key(p) {
                return Err(KvError::Unsuccessful {
                    status: 403,
                    message: format!("Not a directory ({})", p),
                });
            }
            parent = p;
        }

        inner.index += 1;
        let index = inner.index;
        inner.entries.insert(key.clone(), (value.to_string(), index));
        debug!(key = %key, index, "MemoryKv set");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let key = normalize(key);
        let mut inner = self.inner.write().map_err(handle_lock_poison)?;

        if inner.entries.remove(&key).is_some() {
            inner.index += 1;
            return Ok(());
        }
        if inner.has_descendants(&key) {
            return Err(KvError::Unsuccessful {
                status: 403,
                message: format!("Not a file ({})", key),
            });
        }
        Err(KvError::KeyNotFound(key))
    }

    fn delete_dir_recursive(&self, prefix: &str) -> Result<()> {
        let dir = normalize(prefix);
        let mut inner = self.inner.write().map_err(handle_lock_poison)?;

        let child_prefix = dir_prefix(&dir);
        let before = inner.entries.len();
        inner
            .entries
            .retain(|k, _| *k != dir && !k.starts_with(&child_prefix));
        let removed = before - inner.entries.len();

        if removed == 0 {
            return Err(KvError::KeyNotFound(dir));
        }
        inner.index += 1;
        debug!(prefix = %dir, removed, "MemoryKv recursive delete");
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<KvNode>> {
        let dir = normalize(prefix);
        let inner = self.inner.read().map_err(handle_lock_poison)?;

        if inner.entries.contains_key(&dir) {
            // Listing a leaf yields the leaf itself with no children
            return Ok(Vec::new());
        }

        let child_prefix = dir_prefix(&dir);
        let mut leaves = Vec::new();
        let mut dirs = BTreeSet::new();
        for (key, (value, index)) in inner.entries.range(child_prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&child_prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((child_dir, _)) => {
                    dirs.insert(format!("{}{}", child_prefix, child_dir));
                }
                None => leaves.push(leaf_node(key, value, *index)),
            }
        }

        if leaves.is_empty() && dirs.is_empty() && !dir.is_empty() {
            return Err(KvError::KeyNotFound(dir));
        }

        let mut nodes: Vec<KvNode> = dirs
            .into_iter()
            .map(|key| KvNode {
                key: format!("/{}", key),
                dir: true,
                ..KvNode::default()
            })
            .collect();
        nodes.extend(leaves);
        Ok(nodes)
    }
}
