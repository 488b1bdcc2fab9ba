//! offline-shell - network-first offline cache for an app shell
//!
//! Precaches a fixed set of shell resources into versioned cache
//! generations, answers requests network-first with a cache fallback and
//! rotates generations through a worker install/activate lifecycle. Also
//! carries a small Bluetooth GATT session client for the app's device page.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod gatt;
pub mod network;
pub mod worker;

pub use error::{ShellError, ShellResult};
