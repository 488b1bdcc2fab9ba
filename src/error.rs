//! Error types for offline-shell
//!
//! All modules use `ShellResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for offline-shell operations
pub type ShellResult<T> = Result<T, ShellError>;

/// All errors that can occur in offline-shell
#[derive(Error, Debug)]
pub enum ShellError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Configuration already exists at {0}")]
    ConfigExists(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Network errors
    #[error("Network error for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Unsupported request method: {0}")]
    InvalidMethod(String),

    // Cache storage errors
    #[error("Invalid cache generation label: '{0}'")]
    InvalidLabel(String),

    #[error("Cache generation not found: {0}")]
    GenerationNotFound(String),

    #[error("Precache failed for generation {version}: {reason}")]
    PrecacheFailed { version: String, reason: String },

    // Lifecycle errors
    #[error("Invalid worker transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("No waiting worker to activate")]
    NoWaitingWorker,

    #[error("No active worker controls this origin")]
    NoActiveWorker,

    #[error("Invalid worker message: {0}")]
    InvalidMessage(String),

    // Bluetooth errors
    #[error("Bluetooth is not available on this device")]
    BluetoothUnavailable,

    #[error("Scan cancelled or permission denied")]
    BluetoothCancelled,

    #[error("Not connected to a GATT server")]
    NotConnected,

    #[error("Bluetooth error: {0}")]
    Bluetooth(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShellError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Network { .. } => Some("Check that the origin is reachable: offline-shell config show"),
            Self::PrecacheFailed { .. } => Some("Fix the failing manifest entry and run: offline-shell install"),
            Self::NoWaitingWorker => Some("Install a new version first: offline-shell install --label <version>"),
            Self::NoActiveWorker => Some("Run: offline-shell install"),
            Self::ConfigExists(_) => Some("Use --force to overwrite"),
            Self::BluetoothUnavailable => Some("Enable the Bluetooth adapter and try again"),
            _ => None,
        }
    }
}
