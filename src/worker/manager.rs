//! Offline cache manager: install, activate and fetch handling for one worker

use crate::cache::{validate_label, CacheStorage, RequestKey};
use crate::config::schema::CacheConfig;
use crate::error::{ShellError, ShellResult};
use crate::network::{Network, Request, Response};
use futures_util::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings every worker instance is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Paths precached on install, in order
    pub manifest: Vec<String>,

    /// Only write 2xx network responses through to the cache
    pub only_cache_ok: bool,

    /// Activate right after install even if another worker is active
    pub skip_waiting_on_install: bool,
}

impl WorkerSettings {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            manifest: config.manifest.clone(),
            only_cache_ok: config.only_cache_ok,
            skip_waiting_on_install: config.skip_waiting_on_install,
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// Result of handing a request to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the caller sends the request itself
    Passthrough,
    /// Fresh from the network (and written through to the cache)
    Network(Response),
    /// Network failed; served from the current generation
    Cache(Response),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Passthrough => None,
            Self::Network(response) | Self::Cache(response) => Some(response),
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Network(_) => "network",
            Self::Cache(_) => "cache",
        }
    }
}

/// Cache behavior of a single worker instance, bound to one generation
///
/// Cheap to clone; clones share storage and network, so concurrent fetches
/// are just concurrent calls to `handle_fetch`.
#[derive(Clone)]
pub struct OfflineCacheManager {
    version: String,
    settings: WorkerSettings,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl OfflineCacheManager {
    pub fn new(
        version: impl Into<String>,
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            version: version.into(),
            settings,
            storage,
            network,
        }
    }

    /// Generation label this manager reads and writes
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Precache every manifest path into the generation.
    ///
    /// All fetches must return a 2xx response before anything is written;
    /// the entries are then committed as one batch. On failure a generation
    /// created by this call is removed again. Returns the number of entries.
    pub async fn install(&self) -> ShellResult<usize> {
        validate_label(&self.version)?;
        let created = self.storage.open(&self.version).await?;

        match self.precache().await {
            Ok(count) => {
                info!("Precached {} resources into {}", count, self.version);
                Ok(count)
            }
            Err(e) => {
                if created {
                    if let Err(cleanup) = self.storage.delete(&self.version).await {
                        warn!("Failed to discard generation {}: {}", self.version, cleanup);
                    }
                }
                Err(ShellError::PrecacheFailed {
                    version: self.version.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn precache(&self) -> ShellResult<usize> {
        let fetches = self.settings.manifest.iter().map(|path| async move {
            let request = Request::get(path.as_str());
            let response = self.network.fetch(&request).await?;
            if !response.is_ok() {
                return Err(ShellError::network(
                    path.as_str(),
                    format!("unexpected status {}", response.status),
                ));
            }
            debug!("Fetched {} ({} bytes)", path, response.body.len());
            Ok::<_, ShellError>((self.key_for(&request), response))
        });

        let entries = try_join_all(fetches).await?;
        self.storage.put_all(&self.version, &entries).await?;
        Ok(entries.len())
    }

    /// Delete every generation except this one. Returns the deleted labels.
    pub async fn activate(&self) -> ShellResult<Vec<String>> {
        let mut deleted = vec![];
        for label in self.storage.generations().await? {
            if label == self.version {
                continue;
            }
            self.storage.delete(&label).await?;
            info!("Deleted old cache generation {}", label);
            deleted.push(label);
        }
        Ok(deleted)
    }

    /// Network first, falling back to the current generation.
    ///
    /// Non-GET requests are never intercepted. A network failure with no
    /// cached entry is returned to the caller unchanged.
    pub async fn handle_fetch(&self, request: &Request) -> ShellResult<FetchOutcome> {
        if !request.method.is_get() {
            debug!("Not intercepting {} {}", request.method, request.url);
            return Ok(FetchOutcome::Passthrough);
        }

        let key = self.key_for(request);
        match self.network.fetch(request).await {
            Ok(response) => {
                self.write_through(&key, &response).await;
                Ok(FetchOutcome::Network(response))
            }
            Err(network_err) => {
                debug!("Network failed for {}: {}", key, network_err);
                match self.storage.lookup(&self.version, &key).await {
                    Ok(Some(entry)) => {
                        info!("Serving {} from cache {}", key, self.version);
                        Ok(FetchOutcome::Cache(entry.response))
                    }
                    Ok(None) => Err(network_err),
                    Err(e) => {
                        warn!("Cache lookup failed for {}: {}", key, e);
                        Err(network_err)
                    }
                }
            }
        }
    }

    /// Relative and absolute spellings of one resource share a key
    fn key_for(&self, request: &Request) -> RequestKey {
        RequestKey::new(request.method, self.network.resolve(&request.url))
    }

    async fn write_through(&self, key: &RequestKey, response: &Response) {
        if self.settings.only_cache_ok && !response.is_ok() {
            debug!("Not caching {} (status {})", key, response.status);
            return;
        }
        if let Err(e) = self.storage.put(&self.version, key, response).await {
            warn!("Failed to cache {}: {}", key, e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{settings, FakeNetwork};
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::network::Method;
    use std::sync::atomic::Ordering;

    fn manager(
        version: &str,
        manifest: &[&str],
        network: Arc<FakeNetwork>,
    ) -> (OfflineCacheManager, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let manager = OfflineCacheManager::new(version, settings(manifest), storage.clone(), network);
        (manager, storage)
    }

    #[tokio::test]
    async fn install_precaches_every_manifest_path() {
        let network = FakeNetwork::with_routes(&[("/", "root"), ("/app.js", "js")]);
        let (manager, storage) = manager("v1", &["/", "/app.js"], network);

        assert_eq!(manager.install().await.unwrap(), 2);

        for path in ["/", "/app.js"] {
            let entry = storage.lookup("v1", &RequestKey::get(path)).await.unwrap();
            assert!(entry.is_some(), "{path} should be precached");
        }
    }

    #[tokio::test]
    async fn install_is_atomic_on_failure() {
        let network = FakeNetwork::with_routes(&[("/a", "a")]);
        let (manager, storage) = manager("v1", &["/a", "/b"], network);

        let err = manager.install().await.unwrap_err();
        assert!(matches!(err, ShellError::PrecacheFailed { ref version, .. } if version == "v1"));

        assert!(storage.lookup("v1", &RequestKey::get("/a")).await.unwrap().is_none());
        assert!(!storage.has("v1").await.unwrap());
    }

    #[tokio::test]
    async fn install_rejects_error_status() {
        let network = FakeNetwork::with_routes(&[("/", "root")]);
        network.route("/missing.css", Response::new(404, "not found"));
        let (manager, storage) = manager("v1", &["/", "/missing.css"], network);

        let err = manager.install().await.unwrap_err();
        assert!(err.to_string().contains("unexpected status 404"));
        assert!(storage.generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_reinstall_keeps_existing_generation() {
        let network = FakeNetwork::with_routes(&[("/", "root")]);
        let (manager, storage) = manager("v1", &["/"], network.clone());
        manager.install().await.unwrap();

        network.set_offline(true);
        assert!(manager.install().await.is_err());
        assert!(storage.lookup("v1", &RequestKey::get("/")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn activate_deletes_other_generations() {
        let network = FakeNetwork::with_routes(&[]);
        let (manager, storage) = manager("v2", &[], network);
        storage.open("v0").await.unwrap();
        storage.open("v1").await.unwrap();
        storage.open("v2").await.unwrap();

        let deleted = manager.activate().await.unwrap();

        assert_eq!(deleted, vec!["v0".to_string(), "v1".to_string()]);
        assert_eq!(storage.generations().await.unwrap(), vec!["v2".to_string()]);
    }

    #[tokio::test]
    async fn fetch_writes_through_exact_response() {
        let network = FakeNetwork::with_routes(&[]);
        let fresh = Response::new(200, "fresh").with_header("etag", "\"abc\"");
        network.route("/data.json", fresh.clone());
        let (manager, storage) = manager("v1", &[], network);

        let outcome = manager.handle_fetch(&Request::get("/data.json")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Network(fresh.clone()));

        let entry = storage
            .lookup("v1", &RequestKey::get("/data.json"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.response, fresh);
    }

    #[tokio::test]
    async fn fetch_falls_back_to_cache_when_offline() {
        let network = FakeNetwork::with_routes(&[("/styles.css", "body{}")]);
        let (manager, _storage) = manager("v1", &[], network.clone());
        manager.handle_fetch(&Request::get("/styles.css")).await.unwrap();

        network.set_offline(true);
        let outcome = manager.handle_fetch(&Request::get("/styles.css")).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Cache(Response::new(200, "body{}")));
        assert_eq!(outcome.source(), "cache");
    }

    #[tokio::test]
    async fn fetch_miss_while_offline_propagates_network_error() {
        let network = FakeNetwork::with_routes(&[]);
        network.set_offline(true);
        let (manager, _storage) = manager("v1", &[], network);

        let err = manager.handle_fetch(&Request::get("/never-seen")).await.unwrap_err();
        assert_eq!(err.to_string(), "Network error for /never-seen: offline");
    }

    #[tokio::test]
    async fn fetch_overwrites_stale_entry() {
        let network = FakeNetwork::with_routes(&[("/app.js", "old")]);
        let (manager, storage) = manager("v1", &[], network.clone());
        manager.handle_fetch(&Request::get("/app.js")).await.unwrap();

        network.route("/app.js", Response::new(200, "new"));
        manager.handle_fetch(&Request::get("/app.js")).await.unwrap();

        let entry = storage.lookup("v1", &RequestKey::get("/app.js")).await.unwrap().unwrap();
        assert_eq!(entry.response.body, b"new");
    }

    #[tokio::test]
    async fn non_get_is_never_intercepted() {
        let network = FakeNetwork::with_routes(&[("/submit", "ok")]);
        let (manager, storage) = manager("v1", &[], network.clone());

        let request = Request::new(Method::Post, "/submit").with_body("x=1");
        let outcome = manager.handle_fetch(&request).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Passthrough);
        assert_eq!(network.calls.load(Ordering::SeqCst), 0);
        assert!(storage.entries("v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_status_cached_when_filter_disabled() {
        let network = FakeNetwork::with_routes(&[]);
        network.route("/gone", Response::new(410, "gone"));
        let (manager, storage) = manager("v1", &[], network);
        assert!(!manager.settings.only_cache_ok);

        manager.handle_fetch(&Request::get("/gone")).await.unwrap();
        assert!(storage.lookup("v1", &RequestKey::get("/gone")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn transient_error_keeps_good_copy_by_default() {
        let network = FakeNetwork::with_routes(&[("/app.js", "app")]);
        let storage = Arc::new(MemoryStorage::new());
        let manager = OfflineCacheManager::new(
            "v1",
            WorkerSettings::default(),
            storage.clone(),
            network.clone(),
        );

        manager.handle_fetch(&Request::get("/app.js")).await.unwrap();
        network.route("/app.js", Response::new(503, "unavailable"));
        let outcome = manager.handle_fetch(&Request::get("/app.js")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Network(Response::new(503, "unavailable")));

        network.set_offline(true);
        let outcome = manager.handle_fetch(&Request::get("/app.js")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Cache(Response::new(200, "app")));
    }

    #[tokio::test]
    async fn only_cache_ok_skips_error_status() {
        let network = FakeNetwork::with_routes(&[]);
        network.route("/gone", Response::new(410, "gone"));
        let storage = Arc::new(MemoryStorage::new());
        let mut worker_settings = settings(&[]);
        worker_settings.only_cache_ok = true;
        let manager = OfflineCacheManager::new("v1", worker_settings, storage.clone(), network);

        let outcome = manager.handle_fetch(&Request::get("/gone")).await.unwrap();

        assert_eq!(outcome.response().map(|r| r.status), Some(410));
        assert!(storage.lookup("v1", &RequestKey::get("/gone")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_fetches_all_cached() {
        let network = FakeNetwork::with_routes(&[("/1", "one"), ("/2", "two"), ("/3", "three")]);
        let (manager, storage) = manager("v1", &[], network);

        let requests: Vec<Request> = ["/1", "/2", "/3"].iter().map(|p| Request::get(*p)).collect();
        let outcomes =
            futures_util::future::join_all(requests.iter().map(|r| manager.handle_fetch(r))).await;

        assert!(outcomes.iter().all(|o| matches!(o, Ok(FetchOutcome::Network(_)))));
        assert_eq!(storage.entries("v1").await.unwrap().len(), 3);
    }
}
