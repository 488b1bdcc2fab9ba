//! Versioned response cache
//!
//! Responses are grouped into generations named by a version label. Exactly
//! one generation is current; activation deletes the rest.
//!
//! # Backends
//!
//! | Backend | Persistence | Use |
//! |---------|-------------|-----|
//! | `DiskStorage` | JSON files per entry | CLI host |
//! | `MemoryStorage` | process memory | embedding, tests |

pub mod disk;
pub mod entry;
pub mod memory;
pub mod storage;

pub use disk::DiskStorage;
pub use entry::{CacheEntry, RequestKey};
pub use memory::MemoryStorage;
pub use storage::{validate_label, CacheStorage};
