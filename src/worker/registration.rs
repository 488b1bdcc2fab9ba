//! Registration: hosts worker instances and drives their lifecycle

use crate::cache::{validate_label, CacheStorage};
use crate::error::{ShellError, ShellResult};
use crate::network::{Network, Request};
use crate::worker::client::{ControllerChange, PageClient};
use crate::worker::manager::{FetchOutcome, OfflineCacheManager, WorkerSettings};
use crate::worker::message::WorkerMessage;
use crate::worker::state::{RegistrationRecord, WorkerRecord, WorkerState};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const CLIENT_CHANNEL_CAPACITY: usize = 16;

/// What `register` did with the requested version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Installed and took control immediately
    Activated(WorkerRecord),
    /// Installed; waiting for a skip-waiting signal
    Waiting(WorkerRecord),
    /// This version already controls the origin
    AlreadyActive(WorkerRecord),
    /// This version is already installed and waiting
    AlreadyWaiting(WorkerRecord),
}

impl InstallOutcome {
    pub fn worker(&self) -> &WorkerRecord {
        match self {
            Self::Activated(w) | Self::Waiting(w) | Self::AlreadyActive(w) | Self::AlreadyWaiting(w) => w,
        }
    }
}

/// The lifecycle host for one origin.
///
/// Owns the active and waiting workers, runs install and activate, routes
/// fetches to the active controller and notifies subscribed pages when
/// control changes.
pub struct Registration {
    record: RegistrationRecord,
    settings: WorkerSettings,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    controller_tx: broadcast::Sender<ControllerChange>,
}

impl Registration {
    pub fn new(
        record: RegistrationRecord,
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        let (controller_tx, _) = broadcast::channel(CLIENT_CHANNEL_CAPACITY);
        Self {
            record,
            settings,
            storage,
            network,
            controller_tx,
        }
    }

    pub fn record(&self) -> &RegistrationRecord {
        &self.record
    }

    pub fn active(&self) -> Option<&WorkerRecord> {
        self.record.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&WorkerRecord> {
        self.record.waiting.as_ref()
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Open a page that will be told about controller changes
    pub fn subscribe(&self) -> PageClient {
        PageClient::new(self.controller_tx.subscribe())
    }

    /// Cache manager for a worker bound to `version`
    pub fn manager(&self, version: &str) -> OfflineCacheManager {
        OfflineCacheManager::new(
            version,
            self.settings.clone(),
            self.storage.clone(),
            self.network.clone(),
        )
    }

    /// Cache manager of the active worker, if any
    pub fn controller(&self) -> Option<OfflineCacheManager> {
        self.record.active.as_ref().map(|w| self.manager(&w.version))
    }

    /// Install a worker for `version`.
    ///
    /// A failed install leaves the current active and waiting workers alone.
    /// A successful one replaces any older waiting worker and activates
    /// straight away when nothing is active yet (or when configured to skip
    /// waiting on install).
    pub async fn register(&mut self, version: &str) -> ShellResult<InstallOutcome> {
        validate_label(version)?;

        if let Some(active) = self.record.active.as_ref().filter(|w| w.version == version) {
            info!("Generation {} is already active", version);
            return Ok(InstallOutcome::AlreadyActive(active.clone()));
        }
        if let Some(waiting) = self.record.waiting.as_ref().filter(|w| w.version == version) {
            info!("Generation {} is already waiting", version);
            return Ok(InstallOutcome::AlreadyWaiting(waiting.clone()));
        }

        let mut worker = WorkerRecord::new(version);
        info!("Installing worker {} for generation {}", worker.id, version);

        if let Err(e) = self.manager(version).install().await {
            worker.transition(WorkerState::Redundant)?;
            warn!("Install of generation {} failed; current controller kept", version);
            return Err(e);
        }
        worker.transition(WorkerState::Installed)?;

        if let Some(mut replaced) = self.record.waiting.take() {
            replaced.transition(WorkerState::Redundant)?;
            info!(
                "Waiting worker for {} replaced by {}",
                replaced.version, version
            );
        }
        self.record.waiting = Some(worker.clone());

        if self.record.active.is_none() || self.settings.skip_waiting_on_install {
            let activated = self.activate_waiting().await?;
            return Ok(InstallOutcome::Activated(activated));
        }

        info!("Worker for {} installed and waiting", version);
        Ok(InstallOutcome::Waiting(worker))
    }

    /// Handle a raw JSON message posted by a page
    pub async fn post_message(&mut self, raw: &str) -> ShellResult<WorkerRecord> {
        match WorkerMessage::parse(raw)? {
            WorkerMessage::SkipWaiting => self.skip_waiting().await,
        }
    }

    /// Activate the waiting worker without waiting for pages to close
    pub async fn skip_waiting(&mut self) -> ShellResult<WorkerRecord> {
        if self.record.waiting.is_none() {
            return Err(ShellError::NoWaitingWorker);
        }
        self.activate_waiting().await
    }

    /// Route a request through the active controller
    pub async fn handle_fetch(&self, request: &Request) -> ShellResult<FetchOutcome> {
        match self.controller() {
            Some(manager) => manager.handle_fetch(request).await,
            None => {
                debug!("No controller; {} {} passes through", request.method, request.url);
                Ok(FetchOutcome::Passthrough)
            }
        }
    }

    async fn activate_waiting(&mut self) -> ShellResult<WorkerRecord> {
        let installed = self.record.waiting.take().ok_or(ShellError::NoWaitingWorker)?;
        let mut worker = installed.clone();
        worker.transition(WorkerState::Activating)?;

        let deleted = match self.manager(&worker.version).activate().await {
            Ok(deleted) => deleted,
            Err(e) => {
                // Stays installed so the activation can be signalled again
                self.record.waiting = Some(installed);
                return Err(e);
            }
        };
        worker.transition(WorkerState::Activated)?;

        if let Some(mut previous) = self.record.active.take() {
            previous.transition(WorkerState::Redundant)?;
            info!("Worker for {} superseded", previous.version);
        }
        self.record.active = Some(worker.clone());
        info!(
            "Worker {} active for generation {} ({} old generation(s) removed)",
            worker.id,
            worker.version,
            deleted.len()
        );

        self.claim(&worker);
        Ok(worker)
    }

    fn claim(&self, worker: &WorkerRecord) {
        let change = ControllerChange {
            worker_id: worker.id,
            version: worker.version.clone(),
        };
        match self.controller_tx.send(change) {
            Ok(clients) => debug!("Claimed {} open client(s)", clients),
            Err(_) => debug!("No open clients to claim"),
        }
    }
}
