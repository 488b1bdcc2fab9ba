//! Worker lifecycle state and persisted registration record

use crate::error::{ShellError, ShellResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// Lifecycle state of a worker instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    /// Precached and waiting for control
    Installed,
    Activating,
    Activated,
    /// Discarded after a failed install or superseded by a newer worker
    Redundant,
}

impl WorkerState {
    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::{Activated, Activating, Installed, Installing, Redundant};
        matches!(
            (*self, next),
            (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (Installing | Installed | Activating | Activated, Redundant)
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// One worker instance, bound to a single generation label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Unique worker ID
    pub id: Uuid,

    /// Generation label this worker owns
    pub version: String,

    /// Current lifecycle state
    pub state: WorkerState,

    /// When the worker started installing
    pub created_at: DateTime<Utc>,

    /// When the state last changed
    pub updated_at: DateTime<Utc>,
}

impl WorkerRecord {
    /// Create a worker in the `Installing` state
    pub fn new(version: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            version: version.into(),
            state: WorkerState::Installing,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow
    pub fn transition(&mut self, next: WorkerState) -> ShellResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ShellError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Persisted view of which workers control the origin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Worker controlling clients
    pub active: Option<WorkerRecord>,

    /// Installed worker waiting for a skip-waiting signal
    pub waiting: Option<WorkerRecord>,
}

impl RegistrationRecord {
    /// Load the record, or an empty one if the file does not exist
    pub async fn load(path: &Path) -> ShellResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            ShellError::io(format!("reading registration {}", path.display()), e)
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Save the record to file
    pub async fn save(&self, path: &Path) -> ShellResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellError::io("creating data directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            ShellError::io(format!("writing registration {}", path.display()), e)
        })?;

        Ok(())
    }
}
