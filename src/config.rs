//! Application configuration types

use etcd_session_core::{StandardManager, StoreConfig};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
}

/// Session manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Manager name; also tags the sessions it serializes
    #[serde(default = "default_manager_name")]
    pub name: String,
    /// Inactivity timeout applied to sessions the manager creates
    #[serde(default)]
    pub max_inactive_interval_secs: Option<u64>,
}

fn default_manager_name() -> String {
    "StandardManager".to_string()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: default_manager_name(),
            max_inactive_interval_secs: None,
        }
    }
}

impl ManagerConfig {
    /// Build the manager this configuration describes
    pub fn build(&self) -> StandardManager {
        let manager = StandardManager::with_name(self.name.clone());
        match self.max_inactive_interval_secs {
            Some(secs) => manager.with_max_inactive_interval(secs),
            None => manager,
        }
    }
}
