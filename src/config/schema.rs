//! Configuration schema for offline-shell
//!
//! Configuration is stored at `~/.config/offline-shell/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application shell files fetched into every fresh generation
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/utils.js",
    "/app.js",
    "/manifest.json",
    "/icons/icon-192x192.png",
    "/icons/icon-512x512.png",
];

/// Generation label; bump it to force re-precaching of all assets
pub const DEFAULT_VERSION: &str = "v1";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Origin the shell is served from
    pub origin: OriginConfig,

    /// Offline cache settings
    pub cache: CacheConfig,

    /// On-disk storage settings
    pub storage: StorageConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Origin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL relative request paths are resolved against
    pub base_url: String,

    /// Overall timeout for a single network fetch
    pub timeout_secs: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Offline cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Current generation label
    pub version: String,

    /// Paths that must be stored before a generation is usable
    pub manifest: Vec<String>,

    /// Only write 2xx network responses through to the cache
    pub only_cache_ok: bool,

    /// Activate a freshly installed worker without waiting for a signal
    pub skip_waiting_on_install: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(|p| p.to_string()).collect(),
            only_cache_ok: true,
            skip_waiting_on_install: false,
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory (defaults to the platform local data dir)
    pub dir: Option<PathBuf>,
}
