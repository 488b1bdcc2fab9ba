//! CLI command implementations

pub mod activate;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod install;
pub mod status;

pub use activate::execute as activate;
pub use cache::execute as cache;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use status::execute as status;

use crate::cache::{CacheStorage, DiskStorage};
use crate::config::{Config, ConfigManager};
use crate::error::ShellResult;
use crate::network::HttpNetwork;
use crate::worker::{Registration, RegistrationRecord, WorkerSettings};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub(crate) static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
pub(crate) static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Spinner on stderr; hidden when stderr is not a terminal
pub(crate) fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Registration loaded from the data directory, plus where to persist it
pub(crate) struct LoadedRegistration {
    pub registration: Registration,
    pub record_path: PathBuf,
}

impl LoadedRegistration {
    /// Open the disk-backed registration described by `config`
    pub async fn open(config: &Config) -> ShellResult<Self> {
        let record_path = ConfigManager::registration_path(config);
        let record = RegistrationRecord::load(&record_path).await?;

        let caches_dir = ConfigManager::caches_dir(config);
        debug!(
            "Opening registration at {} (caches in {})",
            record_path.display(),
            caches_dir.display()
        );
        let storage: Arc<dyn CacheStorage> = Arc::new(DiskStorage::new(caches_dir));
        let network = Arc::new(HttpNetwork::new(
            config.origin.base_url.clone(),
            Duration::from_secs(config.origin.timeout_secs),
        ));

        let registration = Registration::new(
            record,
            WorkerSettings::from_config(&config.cache),
            storage,
            network,
        );

        Ok(Self {
            registration,
            record_path,
        })
    }

    /// Persist the registration record
    pub async fn save(&self) -> ShellResult<()> {
        self.registration.record().save(&self.record_path).await
    }
}
