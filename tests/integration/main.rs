//! Integration tests for offline-shell

mod lifecycle;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn shell() -> Command {
        cargo_bin_cmd!("offline-shell")
    }

    /// Config pointing at an unreachable origin with storage inside `dir`
    fn offline_config(dir: &Path) -> PathBuf {
        let path = dir.join("config.toml");
        let content = format!(
            r#"
[origin]
base_url = "http://127.0.0.1:9"
timeout_secs = 2

[cache]
version = "v1"
manifest = ["/", "/app.js"]

[storage]
dir = "{}"
"#,
            dir.join("data").display().to_string().replace('\\', "/")
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    fn shell_with(config: &Path) -> Command {
        let mut cmd = shell();
        cmd.env("OFFLINE_SHELL_CONFIG", config);
        cmd
    }

    #[test]
    fn help_displays() {
        shell()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline cache"));
    }

    #[test]
    fn version_displays() {
        shell()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline-shell"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        shell_with(&path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        let config = offline_config(temp.path());
        shell_with(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("127.0.0.1:9"));
    }

    #[test]
    fn config_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        shell_with(&path).args(["config", "init"]).assert().success();
        assert!(path.exists());

        shell_with(&path)
            .args(["config", "init"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"))
            .stderr(predicate::str::contains("--force"));

        shell_with(&path)
            .args(["config", "init", "--force"])
            .assert()
            .success();
    }

    #[test]
    fn missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        shell_with(&temp.path().join("absent.toml"))
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }

    #[test]
    fn status_without_workers() {
        let temp = TempDir::new().unwrap();
        let config = offline_config(temp.path());
        shell_with(&config)
            .args(["status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("active="))
            .stdout(predicate::str::contains("waiting="));
    }

    #[test]
    fn install_fails_when_origin_unreachable() {
        let temp = TempDir::new().unwrap();
        let config = offline_config(temp.path());
        shell_with(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Precache failed"));

        // Nothing was committed
        shell_with(&config)
            .args(["cache", "generations"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn activate_without_waiting_worker() {
        let temp = TempDir::new().unwrap();
        let config = offline_config(temp.path());
        shell_with(&config)
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No waiting worker"));
    }

    #[test]
    fn fetch_uncontrolled_passes_network_error_through() {
        let temp = TempDir::new().unwrap();
        let config = offline_config(temp.path());
        shell_with(&config)
            .args(["fetch", "/index.html"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network error"));
    }

    #[test]
    fn fetch_rejects_unknown_method() {
        let temp = TempDir::new().unwrap();
        let config = offline_config(temp.path());
        shell_with(&config)
            .args(["fetch", "-X", "BREW", "/pot"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported request method"));
    }

    #[test]
    fn cache_list_without_active_worker() {
        let temp = TempDir::new().unwrap();
        let config = offline_config(temp.path());
        shell_with(&config)
            .args(["cache", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No active worker"))
            .stderr(predicate::str::contains("offline-shell install"));
    }
}
