//! Configuration management for offline-shell

pub mod schema;

pub use schema::Config;

use crate::error::{ShellError, ShellResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

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
            .join("offline-shell")
            .join("config.toml")
    }

    /// Get the data directory, honoring `storage.dir`
    pub fn data_dir(config: &Config) -> PathBuf {
        config.storage.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("offline-shell")
        })
    }

    /// Root directory holding one subdirectory per cache generation
    pub fn caches_dir(config: &Config) -> PathBuf {
        Self::data_dir(config).join("caches")
    }

    /// Persisted registration record
    pub fn registration_path(config: &Config) -> PathBuf {
        Self::data_dir(config).join("registration.json")
    }

    /// Load configuration, falling back to defaults if missing
    pub async fn load(&self) -> ShellResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ShellResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShellError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| ShellError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ShellResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShellError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Write a default configuration file
    pub async fn init(&self, force: bool) -> ShellResult<()> {
        if self.config_path.exists() && !force {
            return Err(ShellError::ConfigExists(self.config_path.clone()));
        }
        self.save(&Config::default()).await
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ShellResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellError::ConfigDirCreate {
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
