//! Configuration management for miniature

pub mod schema;

pub use schema::Config;

use crate::error::{MiniatureError, MiniatureResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "MINIATURE_CONFIG";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("miniature")
            .join("config.toml")
    }

    /// Path this manager reads and writes
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub async fn load(&self) -> MiniatureResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> MiniatureResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| MiniatureError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| MiniatureError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> MiniatureResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                MiniatureError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            MiniatureError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
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
    async fn load_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        let config = manager.load().await.unwrap();
        assert_eq!(config.git.default_branch, "main");
    }

    #[tokio::test]
    async fn save_and_reload() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("nested/config.toml"));

        let mut config = Config::default();
        config.git.default_branch = "trunk".to_string();
        manager.save(&config).await.unwrap();

        let reloaded = manager.load().await.unwrap();
        assert_eq!(reloaded.git.default_branch, "trunk");
    }

    #[tokio::test]
    async fn invalid_toml_is_config_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let manager = ConfigManager::with_path(path);
        let result = manager.load().await;
        assert!(matches!(result, Err(MiniatureError::ConfigInvalid { .. })));
    }
}
