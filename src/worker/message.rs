//! Messages pages post to the worker

use crate::error::{ShellError, ShellResult};
use serde::{Deserialize, Serialize};

/// Page-to-worker message, tagged by its `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate the waiting worker now
    SkipWaiting,
}

impl WorkerMessage {
    /// Parse a raw JSON message
    pub fn parse(raw: &str) -> ShellResult<Self> {
        serde_json::from_str(raw).map_err(|e| ShellError::InvalidMessage(e.to_string()))
    }

    /// Encode as the JSON a page would post
    pub fn to_json(&self) -> ShellResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
