//! Integration tests for the sso-bridge binary.
//!
//! Every test points `--config` at a temporary file so the user's own
//! configuration is never read.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::json;

// =============================================================================
// Test Fixtures
// =============================================================================

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        dir.child("config.toml")
            .write_str(
                r#"
[login]
username = "household"
secret = "hunter2"

[storage]
provider = "file"
"#,
            )
            .unwrap();
        Self { dir }
    }

    fn config_path(&self) -> std::path::PathBuf {
        self.dir.child("config.toml").path().to_path_buf()
    }

    fn store_path(&self) -> std::path::PathBuf {
        self.dir.child("storage.json").path().to_path_buf()
    }

    fn write_store(&self, token: &str) {
        let record = json!({
            "Servers": [{
                "Id": "server-1",
                "Name": "Living room",
                "Users": [{"Id": "user-1", "AccessToken": token}]
            }]
        });
        let entries = json!({
            "servercredentials3": record.to_string(),
            "pin_validated": "true"
        });
        self.dir
            .child("storage.json")
            .write_str(&entries.to_string())
            .unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("sso-bridge").unwrap();
        cmd.arg("--config").arg(self.config_path());
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

// =============================================================================
// probe / logout
// =============================================================================

#[test]
fn probe_reports_signed_out_for_missing_store() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["probe", "--store"])
        .arg(ws.store_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("signed out"));
}

#[test]
fn probe_reports_authenticated_with_token() {
    let ws = Workspace::new();
    ws.write_store("token-1");
    ws.cmd()
        .args(["probe", "--store"])
        .arg(ws.store_path())
        .assert()
        .success()
        .stdout(predicate::str::diff("authenticated\n"));
}

#[test]
fn probe_treats_empty_token_as_signed_out() {
    let ws = Workspace::new();
    ws.write_store("");
    ws.cmd()
        .args(["probe", "--store"])
        .arg(ws.store_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("signed out"));
}

#[test]
fn logout_clears_users_but_keeps_servers() {
    let ws = Workspace::new();
    ws.write_store("token-1");

    ws.cmd()
        .args(["logout", "--store"])
        .arg(ws.store_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared cached credentials."));

    ws.cmd()
        .args(["probe", "--store"])
        .arg(ws.store_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("signed out"));

    let stored = std::fs::read_to_string(ws.store_path()).unwrap();
    assert!(stored.contains("server-1"));
    assert!(!stored.contains("token-1"));
    assert!(!stored.contains("pin_validated"));
}

#[test]
fn quiet_logout_prints_nothing() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["--quiet", "logout", "--store"])
        .arg(ws.store_path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// =============================================================================
// config
// =============================================================================

#[test]
fn config_show_redacts_secret() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("household"))
        .stdout(predicate::str::contains("[REDACTED]"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn config_path_prints_explicit_file() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn invalid_config_fails() {
    let ws = Workspace::new();
    ws.dir
        .child("config.toml")
        .write_str("[storage]\nprovider = \"carrier-pigeon\"\n")
        .unwrap();
    ws.cmd()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

// =============================================================================
// misc
// =============================================================================

#[test]
fn completion_generates_script() {
    Command::cargo_bin("sso-bridge")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sso-bridge"));
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("sso-bridge")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("login"));
}

#[test]
fn debug_and_quiet_are_exclusive() {
    Command::cargo_bin("sso-bridge")
        .unwrap()
        .args(["--debug", "--quiet", "probe"])
        .assert()
        .failure();
}
