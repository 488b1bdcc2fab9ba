//! Storage abstraction for cache generations
//!
//! Provides a trait over named generations of request/response entries that
//! can be implemented by different backends (files on disk, memory).

use crate::cache::entry::{CacheEntry, RequestKey};
use crate::error::{ShellError, ShellResult};
use crate::network::Response;
use async_trait::async_trait;

/// Named generations of cached responses
///
/// Every operation is atomic on its own, but operations are not locked
/// against each other: a `put` racing a `delete` of the same generation is
/// last-writer-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if needed. Returns true if created.
    async fn open(&self, label: &str) -> ShellResult<bool>;

    /// Check whether a generation exists
    async fn has(&self, label: &str) -> ShellResult<bool>;

    /// All generation labels, sorted
    async fn generations(&self) -> ShellResult<Vec<String>>;

    /// Delete a generation and everything in it. Returns true if it existed.
    async fn delete(&self, label: &str) -> ShellResult<bool>;

    /// Store one response, overwriting any entry for the same key
    async fn put(&self, label: &str, key: &RequestKey, response: &Response) -> ShellResult<()>;

    /// Store a batch of responses; either all become visible or none do
    async fn put_all(&self, label: &str, entries: &[(RequestKey, Response)]) -> ShellResult<()>;

    /// Look up an entry by key
    async fn lookup(&self, label: &str, key: &RequestKey) -> ShellResult<Option<CacheEntry>>;

    /// All entries of a generation, sorted by key
    async fn entries(&self, label: &str) -> ShellResult<Vec<CacheEntry>>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Reject labels that cannot safely name a directory
pub fn validate_label(label: &str) -> ShellResult<()> {
    let invalid = label.is_empty()
        || label.starts_with('.')
        || label.contains('/')
        || label.contains('\\')
        || label.contains("..")
        || label.chars().any(char::is_control);

    if invalid {
        return Err(ShellError::InvalidLabel(label.to_string()));
    }
    Ok(())
}
