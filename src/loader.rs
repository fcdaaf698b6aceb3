//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Load configuration from `./config` and the environment
pub fn load_config() -> Result<AppConfig> {
    load_config_from(Path::new("config"), true)
}

/// Load configuration from a config directory
///
/// Sources, lowest priority first: embedded defaults, `<dir>/default.toml`,
/// `<dir>/<ETCD_SESSION_ENV>.toml`, `<dir>/local.toml`, then `ETCD_SESSION_*`
/// environment variables when `with_env` is set.
pub fn load_config_from(dir: &Path, with_env: bool) -> Result<AppConfig> {
    let profile = std::env::var("ETCD_SESSION_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::from(dir.join("default")).required(false))
        .add_source(File::from(dir.join(profile)).required(false))
        .add_source(File::from(dir.join("local")).required(false));

    if with_env {
        // 3. Environment variables (highest priority), e.g. ETCD_SESSION_STORE__PORT
        builder = builder.add_source(
            Environment::with_prefix("ETCD_SESSION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
    }

    builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_embedded_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(dir.path(), false).unwrap();

        assert_eq!(config.store.host, "localhost");
        assert_eq!(config.store.port, 2379);
        assert_eq!(config.manager.name, "StandardManager");
        assert_eq!(config.manager.max_inactive_interval_secs, Some(1800));
    }

    #[test]
    fn test_local_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("local.toml"),
            "[store]\nhost = \"etcd.internal\"\nport = 4001\n",
        )
        .unwrap();

        let config = load_config_from(dir.path(), false).unwrap();
        assert_eq!(config.store.host, "etcd.internal");
        assert_eq!(config.store.port, 4001);
        assert_eq!(config.store.request_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("local.toml"), "[store]\nport = 700000\n").unwrap();

        assert!(load_config_from(dir.path(), false).is_err());
    }

    #[test]
    fn test_manager_config_builds_manager() {
        use etcd_session_core::SessionManager;

        let config = AppConfig::default();
        let manager = config.manager.build();
        assert_eq!(manager.name(), "StandardManager");
        assert_eq!(manager.create_session("abc").max_inactive_interval, None);
    }
}
