//! Page-side view of controller changes

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Notification sent to open pages when a worker takes control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerChange {
    pub worker_id: Uuid,
    pub version: String,
}

/// An open page controlled by the registration.
///
/// Reloads once per controller change; the `refreshing` guard swallows
/// further notifications until the reload has completed.
#[derive(Debug)]
pub struct PageClient {
    id: Uuid,
    receiver: broadcast::Receiver<ControllerChange>,
    controller: Option<ControllerChange>,
    refreshing: bool,
    reloads: u32,
}

impl PageClient {
    pub(crate) fn new(receiver: broadcast::Receiver<ControllerChange>) -> Self {
        Self {
            id: Uuid::new_v4(),
            receiver,
            controller: None,
            refreshing: false,
            reloads: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Latest controller seen by this page
    pub fn controller(&self) -> Option<&ControllerChange> {
        self.controller.as_ref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn reload_count(&self) -> u32 {
        self.reloads
    }

    /// Handle a notification. Returns true if it triggered a reload.
    pub fn on_controller_change(&mut self, change: ControllerChange) -> bool {
        self.controller = Some(change);
        if self.refreshing {
            debug!("Page {} already reloading, ignoring controller change", self.id);
            return false;
        }
        self.refreshing = true;
        self.reloads += 1;
        info!("Page {} reloading for new controller", self.id);
        true
    }

    /// The reload finished and the page is fresh again
    pub fn complete_reload(&mut self) {
        self.refreshing = false;
    }

    /// Handle every notification already queued. Returns the reloads triggered.
    pub fn poll(&mut self) -> usize {
        let mut triggered = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(change) => {
                    if self.on_controller_change(change) {
                        triggered += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Page {} missed {} controller changes", self.id, skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        triggered
    }

    /// Wait for the next notification; `None` once the registration is gone
    pub async fn next_change(&mut self) -> Option<ControllerChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Page {} missed {} controller changes", self.id, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
