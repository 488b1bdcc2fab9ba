//! End-to-end worker lifecycle against on-disk storage

use async_trait::async_trait;
use offline_shell::cache::{CacheStorage, DiskStorage, RequestKey};
use offline_shell::network::{Method, Network, Request, Response};
use offline_shell::worker::{
    FetchOutcome, InstallOutcome, Registration, RegistrationRecord, WorkerSettings, WorkerState,
};
use offline_shell::{ShellError, ShellResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Origin whose content and reachability tests can change
#[derive(Default)]
struct Origin {
    pages: Mutex<HashMap<String, Response>>,
    down: AtomicBool,
    /// When set, relative paths resolve against it like `HttpNetwork`
    base_url: Option<String>,
}

impl Origin {
    fn serving(pages: &[(&str, &str)]) -> Arc<Self> {
        let origin = Arc::new(Self::default());
        for (path, body) in pages {
            origin.serve(path, 200, body);
        }
        origin
    }

    fn serve(&self, path: &str, status: u16, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(path.to_string(), Response::new(status, body.as_bytes().to_vec()));
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn path_of<'a>(&self, url: &'a str) -> &'a str {
        match &self.base_url {
            Some(base) => url.strip_prefix(base.as_str()).unwrap_or(url),
            None => url,
        }
    }
}

#[async_trait]
impl Network for Origin {
    async fn fetch(&self, request: &Request) -> ShellResult<Response> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ShellError::network(&request.url, "connection refused"));
        }
        self.pages
            .lock()
            .unwrap()
            .get(self.path_of(&request.url))
            .cloned()
            .ok_or_else(|| ShellError::network(&request.url, "no route"))
    }

    fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if url.starts_with('/') => format!("{}{}", base, url),
            _ => url.to_string(),
        }
    }
}

const MANIFEST: &[&str] = &["/", "/index.html", "/app.js"];

struct Harness {
    _temp: TempDir,
    caches: PathBuf,
    record_path: PathBuf,
    origin: Arc<Origin>,
}

impl Harness {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        Self {
            caches: temp.path().join("caches"),
            record_path: temp.path().join("registration.json"),
            _temp: temp,
            origin: Origin::serving(&[
                ("/", "root v1"),
                ("/index.html", "index v1"),
                ("/app.js", "app v1"),
            ]),
        }
    }

    /// Same shell, served from an origin that resolves relative paths
    fn with_base_url(base_url: &str) -> Self {
        let mut harness = Self::new();
        let pages = std::mem::take(&mut *harness.origin.pages.lock().unwrap());
        harness.origin = Arc::new(Origin {
            pages: Mutex::new(pages),
            base_url: Some(base_url.to_string()),
            ..Origin::default()
        });
        harness
    }

    fn storage(&self) -> Arc<DiskStorage> {
        Arc::new(DiskStorage::new(&self.caches))
    }

    /// Fresh process: reload the persisted record and reopen storage
    async fn open(&self) -> Registration {
        let record = RegistrationRecord::load(&self.record_path).await.unwrap();
        Registration::new(
            record,
            WorkerSettings {
                manifest: MANIFEST.iter().map(|p| p.to_string()).collect(),
                ..WorkerSettings::default()
            },
            self.storage(),
            self.origin.clone(),
        )
    }

    async fn save(&self, registration: &Registration) {
        registration.record().save(&self.record_path).await.unwrap();
    }
}

fn body(outcome: &FetchOutcome) -> String {
    String::from_utf8(outcome.response().unwrap().body.clone()).unwrap()
}

async fn labels(path: &Path) -> Vec<String> {
    DiskStorage::new(path).generations().await.unwrap()
}

#[tokio::test]
async fn first_install_controls_and_serves_offline() {
    let h = Harness::new();
    let mut registration = h.open().await;

    let outcome = registration.register("v1").await.unwrap();
    assert!(matches!(outcome, InstallOutcome::Activated(_)));
    h.save(&registration).await;

    // Restart, go offline, every precached path still resolves
    let registration = h.open().await;
    assert_eq!(registration.active().unwrap().state, WorkerState::Activated);
    h.origin.set_down(true);

    for path in MANIFEST {
        let outcome = registration.handle_fetch(&Request::get(*path)).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Cache(_)), "{path} should come from cache");
    }
    assert_eq!(
        body(&registration.handle_fetch(&Request::get("/app.js")).await.unwrap()),
        "app v1"
    );
}

#[tokio::test]
async fn uncached_path_offline_surfaces_network_error() {
    let h = Harness::new();
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();
    h.origin.set_down(true);

    let err = registration
        .handle_fetch(&Request::get("/never-seen"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShellError::Network { ref url, .. } if url == "/never-seen"));
}

#[tokio::test]
async fn online_fetch_refreshes_cached_copy() {
    let h = Harness::new();
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();

    h.origin.serve("/index.html", 200, "index v1.1");
    let outcome = registration.handle_fetch(&Request::get("/index.html")).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Network(_)));
    assert_eq!(body(&outcome), "index v1.1");

    h.origin.set_down(true);
    let outcome = registration.handle_fetch(&Request::get("/index.html")).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Cache(_)));
    assert_eq!(body(&outcome), "index v1.1");
}

#[tokio::test]
async fn runtime_fetches_are_cached_for_later() {
    let h = Harness::new();
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();

    h.origin.serve("/data.json", 200, "{}");
    registration.handle_fetch(&Request::get("/data.json")).await.unwrap();

    let entry = h
        .storage()
        .lookup("v1", &RequestKey::get("/data.json"))
        .await
        .unwrap();
    assert!(entry.is_some());
}

#[tokio::test]
async fn post_requests_are_never_cached() {
    let h = Harness::new();
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();

    let request = Request::new(Method::Post, "/").with_body(b"form".to_vec());
    let outcome = registration.handle_fetch(&request).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Passthrough);

    let key = RequestKey::new(Method::Post, "/");
    assert!(h.storage().lookup("v1", &key).await.unwrap().is_none());
}

#[tokio::test]
async fn upgrade_waits_then_replaces_old_generation() {
    let h = Harness::new();
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();
    h.save(&registration).await;

    h.origin.serve("/app.js", 200, "app v2");
    let mut registration = h.open().await;
    let mut page = registration.subscribe();
    let outcome = registration.register("v2").await.unwrap();
    assert!(matches!(outcome, InstallOutcome::Waiting(_)));
    h.save(&registration).await;

    // Still controlled by v1 while v2 waits
    assert_eq!(labels(&h.caches).await, vec!["v1", "v2"]);
    h.origin.set_down(true);
    let outcome = registration.handle_fetch(&Request::get("/app.js")).await.unwrap();
    assert_eq!(body(&outcome), "app v1");

    // Skip-waiting from a new process
    let mut registration = h.open().await;
    let mut page_after_restart = registration.subscribe();
    let worker = registration
        .post_message(r#"{"type":"SKIP_WAITING"}"#)
        .await
        .unwrap();
    assert_eq!(worker.version, "v2");
    assert_eq!(worker.state, WorkerState::Activated);
    h.save(&registration).await;

    assert_eq!(labels(&h.caches).await, vec!["v2"]);
    assert_eq!(page_after_restart.poll(), 1);
    assert!(page_after_restart.is_refreshing());
    // Pages subscribed to a previous process are not notified
    assert_eq!(page.poll(), 0);

    let outcome = registration.handle_fetch(&Request::get("/app.js")).await.unwrap();
    assert_eq!(body(&outcome), "app v2");

    let record = RegistrationRecord::load(&h.record_path).await.unwrap();
    assert_eq!(record.active.unwrap().version, "v2");
    assert!(record.waiting.is_none());
}

#[tokio::test]
async fn failed_upgrade_keeps_current_generation() {
    let h = Harness::new();
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();

    h.origin.serve("/index.html", 500, "boom");
    let err = registration.register("v2").await.unwrap_err();
    assert!(matches!(err, ShellError::PrecacheFailed { ref version, .. } if version == "v2"));

    assert_eq!(labels(&h.caches).await, vec!["v1"]);
    assert_eq!(registration.active().unwrap().version, "v1");
    assert!(registration.waiting().is_none());

    h.origin.set_down(true);
    let outcome = registration.handle_fetch(&Request::get("/index.html")).await.unwrap();
    assert_eq!(body(&outcome), "index v1");
}

#[tokio::test]
async fn reinstalling_active_version_is_a_no_op() {
    let h = Harness::new();
    let mut registration = h.open().await;
    let first = registration.register("v1").await.unwrap();
    let again = registration.register("v1").await.unwrap();

    assert!(matches!(again, InstallOutcome::AlreadyActive(_)));
    assert_eq!(first.worker().id, again.worker().id);
}

#[tokio::test]
async fn malformed_message_is_rejected() {
    let h = Harness::new();
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();

    let err = registration.post_message("skip").await.unwrap_err();
    assert!(matches!(err, ShellError::InvalidMessage(_)));
}

#[tokio::test]
async fn precached_asset_found_by_absolute_url_offline() {
    let h = Harness::with_base_url("http://localhost:8080");
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();
    h.save(&registration).await;

    let registration = h.open().await;
    h.origin.set_down(true);

    for url in ["/app.js", "http://localhost:8080/app.js"] {
        let outcome = registration.handle_fetch(&Request::get(url)).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Cache(_)), "{url} should come from cache");
        assert_eq!(body(&outcome), "app v1");
    }

    let entries = h.storage().entries("v1").await.unwrap();
    assert_eq!(entries.len(), MANIFEST.len());
    assert!(entries.iter().all(|e| e.key.url.starts_with("http://localhost:8080/")));
}

#[tokio::test]
async fn runtime_fetch_by_relative_path_served_by_absolute_url_offline() {
    let h = Harness::with_base_url("http://localhost:8080");
    let mut registration = h.open().await;
    registration.register("v1").await.unwrap();

    h.origin.serve("/data.json", 200, "{\"n\":1}");
    registration.handle_fetch(&Request::get("/data.json")).await.unwrap();

    h.origin.set_down(true);
    let outcome = registration
        .handle_fetch(&Request::get("http://localhost:8080/data.json"))
        .await
        .unwrap();
    assert_eq!(body(&outcome), "{\"n\":1}");
}
