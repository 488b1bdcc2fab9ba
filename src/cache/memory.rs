//! In-memory cache storage

use crate::cache::entry::{CacheEntry, RequestKey};
use crate::cache::storage::{validate_label, CacheStorage};
use crate::error::ShellResult;
use crate::network::Response;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

type Generation = HashMap<RequestKey, CacheEntry>;

/// Generations held in process memory; lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    generations: RwLock<BTreeMap<String, Generation>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, label: &str) -> ShellResult<bool> {
        validate_label(label)?;
        let mut generations = self.generations.write().await;
        if generations.contains_key(label) {
            return Ok(false);
        }
        generations.insert(label.to_string(), Generation::new());
        Ok(true)
    }

    async fn has(&self, label: &str) -> ShellResult<bool> {
        Ok(self.generations.read().await.contains_key(label))
    }

    async fn generations(&self) -> ShellResult<Vec<String>> {
        Ok(self.generations.read().await.keys().cloned().collect())
    }

    async fn delete(&self, label: &str) -> ShellResult<bool> {
        Ok(self.generations.write().await.remove(label).is_some())
    }

    async fn put(&self, label: &str, key: &RequestKey, response: &Response) -> ShellResult<()> {
        validate_label(label)?;
        let entry = CacheEntry::new(key.clone(), response.clone());
        self.generations
            .write()
            .await
            .entry(label.to_string())
            .or_default()
            .insert(key.clone(), entry);
        Ok(())
    }

    async fn put_all(&self, label: &str, entries: &[(RequestKey, Response)]) -> ShellResult<()> {
        validate_label(label)?;
        // One write guard for the whole batch
        let mut generations = self.generations.write().await;
        let generation = generations.entry(label.to_string()).or_default();
        for (key, response) in entries {
            generation.insert(key.clone(), CacheEntry::new(key.clone(), response.clone()));
        }
        Ok(())
    }

    async fn lookup(&self, label: &str, key: &RequestKey) -> ShellResult<Option<CacheEntry>> {
        Ok(self
            .generations
            .read()
            .await
            .get(label)
            .and_then(|generation| generation.get(key))
            .cloned())
    }

    async fn entries(&self, label: &str) -> ShellResult<Vec<CacheEntry>> {
        let generations = self.generations.read().await;
        let mut entries: Vec<CacheEntry> = generations
            .get(label)
            .map(|generation| generation.values().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
