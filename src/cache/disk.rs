//! File-backed cache storage
//!
//! Layout: one directory per generation under the storage root, one JSON file
//! per entry named by the key digest.
//!
//! ```text
//! caches/
//!   v1/
//!     3f9a0c1d2b4e5f60.json
//!     ...
//!   .staging-<uuid>/      (batch write in progress)
//! ```

use crate::cache::entry::{CacheEntry, RequestKey};
use crate::cache::storage::{validate_label, CacheStorage};
use crate::error::{ShellError, ShellResult};
use crate::network::Response;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Generations stored as directories of JSON entries
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, label: &str) -> PathBuf {
        self.root.join(label)
    }

    fn entry_file_name(key: &RequestKey) -> String {
        format!("{}.json", key.digest())
    }

    async fn write_entry(dir: &Path, entry: &CacheEntry) -> ShellResult<PathBuf> {
        let content = serde_json::to_string(entry)?;
        let path = dir.join(Self::entry_file_name(&entry.key));
        fs::write(&path, content)
            .await
            .map_err(|e| ShellError::io(format!("writing cache entry {}", path.display()), e))?;
        Ok(path)
    }

    async fn read_entry(path: &Path) -> ShellResult<Option<CacheEntry>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShellError::io(format!("reading cache entry {}", path.display()), e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn stage_batch(staging: &Path, entries: &[CacheEntry]) -> ShellResult<()> {
        fs::create_dir_all(staging)
            .await
            .map_err(|e| ShellError::io(format!("creating {}", staging.display()), e))?;
        for entry in entries {
            Self::write_entry(staging, entry).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, label: &str) -> ShellResult<bool> {
        validate_label(label)?;
        let dir = self.generation_dir(label);
        if dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellError::io(format!("creating generation {}", dir.display()), e))?;
        debug!("Created cache generation {}", label);
        Ok(true)
    }

    async fn has(&self, label: &str) -> ShellResult<bool> {
        validate_label(label)?;
        Ok(self.generation_dir(label).is_dir())
    }

    async fn generations(&self) -> ShellResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut labels = vec![];
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| ShellError::io("reading cache storage root", e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ShellError::io("reading cache storage entry", e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            labels.push(name);
        }

        labels.sort();
        Ok(labels)
    }

    async fn delete(&self, label: &str) -> ShellResult<bool> {
        validate_label(label)?;
        let dir = self.generation_dir(label);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| ShellError::io(format!("deleting generation {}", dir.display()), e))?;
        debug!("Deleted cache generation {}", label);
        Ok(true)
    }

    async fn put(&self, label: &str, key: &RequestKey, response: &Response) -> ShellResult<()> {
        validate_label(label)?;
        let dir = self.generation_dir(label);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellError::io(format!("creating generation {}", dir.display()), e))?;

        // Write beside the target, then rename over it
        let entry = CacheEntry::new(key.clone(), response.clone());
        let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        let content = serde_json::to_string(&entry)?;
        fs::write(&tmp, content)
            .await
            .map_err(|e| ShellError::io(format!("writing {}", tmp.display()), e))?;

        let target = dir.join(Self::entry_file_name(key));
        fs::rename(&tmp, &target)
            .await
            .map_err(|e| ShellError::io(format!("committing {}", target.display()), e))
    }

    async fn put_all(&self, label: &str, entries: &[(RequestKey, Response)]) -> ShellResult<()> {
        validate_label(label)?;
        let entries: Vec<CacheEntry> = entries
            .iter()
            .map(|(key, response)| CacheEntry::new(key.clone(), response.clone()))
            .collect();

        let staging = self.root.join(format!(".staging-{}", Uuid::new_v4()));
        if let Err(e) = Self::stage_batch(&staging, &entries).await {
            let _ = fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        let dir = self.generation_dir(label);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellError::io(format!("creating generation {}", dir.display()), e))?;

        // Repeated keys share one staged file
        let names: BTreeSet<String> = entries.iter().map(|e| Self::entry_file_name(&e.key)).collect();
        for name in names {
            fs::rename(staging.join(&name), dir.join(&name))
                .await
                .map_err(|e| ShellError::io(format!("committing {}", name), e))?;
        }

        if let Err(e) = fs::remove_dir_all(&staging).await {
            warn!("Failed to remove staging dir {}: {}", staging.display(), e);
        }
        Ok(())
    }

    async fn lookup(&self, label: &str, key: &RequestKey) -> ShellResult<Option<CacheEntry>> {
        validate_label(label)?;
        let path = self.generation_dir(label).join(Self::entry_file_name(key));
        let entry = Self::read_entry(&path).await?;
        // Digest collisions fall through as a miss
        Ok(entry.filter(|e| &e.key == key))
    }

    async fn entries(&self, label: &str) -> ShellResult<Vec<CacheEntry>> {
        validate_label(label)?;
        let dir = self.generation_dir(label);
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut entries = vec![];
        let mut listing = fs::read_dir(&dir)
            .await
            .map_err(|e| ShellError::io(format!("reading generation {}", dir.display()), e))?;

        while let Some(item) = listing
            .next_entry()
            .await
            .map_err(|e| ShellError::io("reading generation entry", e))?
        {
            let path = item.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match Self::read_entry(&path).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable cache entry {}: {}", path.display(), e),
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
