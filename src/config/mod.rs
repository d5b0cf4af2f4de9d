//! Configuration management for viewercount
//!
//! Defaults, then the TOML file, then environment/CLI overrides. The result
//! is validated once all layers are applied.

pub mod overrides;
pub mod schema;

pub use overrides::ConfigOverrides;
pub use schema::Config;

use crate::error::{ViewerError, ViewerResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
    explicit: bool,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            explicit: false,
        }
    }

    /// Create a config manager with a custom path
    ///
    /// Unlike the default path, a custom path must exist when loading.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            explicit: true,
        }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("viewercount")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults if the default file is absent
    pub async fn load(&self) -> ViewerResult<Config> {
        if !self.config_path.exists() {
            if self.explicit {
                return Err(ViewerError::ConfigNotFound(self.config_path.clone()));
            }
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ViewerResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ViewerError::io(format!("reading config from {}", path.display()), e))?;

        debug!("Loaded config from {}", path.display());
        toml::from_str(&content).map_err(|e| ViewerError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the file, apply overrides and validate
    pub async fn load_effective(&self, overrides: &ConfigOverrides) -> ViewerResult<Config> {
        let mut config = self.load().await?;
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ViewerResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ViewerError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ViewerResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ViewerError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, ViewerError::ConfigNotFound(_)));
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.server.port = 8080;
        config.sessions.max_sessions = 42;

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.sessions.max_sessions, 42);
    }

    #[tokio::test]
    async fn malformed_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[sessions\nmax_sessions = 1").unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        match err {
            ViewerError::ConfigParse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn effective_config_applies_overrides_over_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9000\n[sessions]\ntimeout_ms = 5000\n").unwrap();

        let overrides = ConfigOverrides {
            port: Some(9100),
            ..Default::default()
        };
        let config = ConfigManager::with_path(path)
            .load_effective(&overrides)
            .await
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.sessions.timeout_ms, 5000);
    }
}
