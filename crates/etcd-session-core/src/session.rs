//! Session entity
//!
//! A session is owned by the host session manager. The store only ever looks
//! at its identifier and at the bytes the bound serializer produces for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: String,
    /// Session attributes
    #[serde(default)]
    attributes: BTreeMap<String, serde_json::Value>,
    /// Creation timestamp
    pub creation_time: DateTime<Utc>,
    /// Last access timestamp
    pub last_accessed_time: DateTime<Utc>,
    /// Seconds of inactivity before the session expires (`None` = never)
    #[serde(default)]
    pub max_inactive_interval: Option<u64>,
    /// Created in this process and not yet persisted or loaded
    #[serde(skip)]
    is_new: bool,
}

impl Session {
    /// Create a new, empty session
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
            creation_time: now,
            last_accessed_time: now,
            max_inactive_interval: None,
            is_new: true,
        }
    }

    /// Set the inactivity timeout
    #[must_use]
    pub fn with_max_inactive_interval(mut self, secs: u64) -> Self {
        self.max_inactive_interval = Some(secs);
        self
    }

    /// Session identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this session was freshly created rather than loaded
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Get an attribute
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }

    /// Set an attribute, returning the previous value
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.attributes.insert(name.into(), value)
    }

    /// Remove an attribute
    pub fn remove_attribute(&mut self, name: &str) -> Option<serde_json::Value> {
        self.attributes.remove(name)
    }

    /// All attributes
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.attributes
    }

    /// Record an access
    pub fn access(&mut self) {
        self.last_accessed_time = Utc::now();
        self.is_new = false;
    }

    /// Whether the session has outlived its inactivity timeout at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let Some(limit) = self.max_inactive_interval else {
            return false;
        };
        let idle = (now - self.last_accessed_time).num_seconds();
        u64::try_from(idle).is_ok_and(|idle| idle > limit)
    }
}

#[cfg(test)]
mod tests;
