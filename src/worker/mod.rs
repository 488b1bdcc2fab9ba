//! Offline cache worker
//!
//! A worker instance owns one cache generation and moves through
//! `installing → installed → activating → activated`, ending `redundant`
//! once superseded or if its install fails.
//!
//! | Event | Handler |
//! |-------|---------|
//! | install | `OfflineCacheManager::install` (atomic precache) |
//! | activate | `OfflineCacheManager::activate` (drop old generations) + claim pages |
//! | fetch | `OfflineCacheManager::handle_fetch` (network first, cache fallback) |
//! | message | `Registration::post_message` (`SKIP_WAITING`) |

pub mod client;
pub mod manager;
pub mod message;
pub mod registration;
pub mod state;

pub use client::{ControllerChange, PageClient};
pub use manager::{FetchOutcome, OfflineCacheManager, WorkerSettings};
pub use message::WorkerMessage;
pub use registration::{InstallOutcome, Registration};
pub use state::{RegistrationRecord, WorkerRecord, WorkerState};
