use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

/// A `symfetch` command isolated in `dir` with an explicit config.
fn symfetch_cmd(dir: &Path, config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("symfetch"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("SOCORRO_SYMBOL_UPLOAD_URL")
        .env_remove("SOCORRO_SYMBOL_UPLOAD_TOKEN_FILE")
        .env_remove("TASK_ID")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("symfetch.yaml");
    let state = dir.join("state");
    std::fs::write(
        &path,
        format!(
            "state_dir: {}\nupload_url: http://127.0.0.1:1/upload\nupload_attempts: 1\nupload_retry_delay_secs: 0\n{extra}",
            state.display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    symfetch_cmd(dir.path(), &config)
        .assert()
        .code(1)
        .stderr(contains("Usage"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    symfetch_cmd(dir.path(), &config)
        .args(["upload", "--bogus"])
        .assert()
        .code(1);
}

#[test]
fn help_exits_zero() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    symfetch_cmd(dir.path(), &config)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("fetch").and(contains("upload")).and(contains("trigger")));
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    symfetch_cmd(dir.path(), &dir.path().join("nope.yaml"))
        .args(["upload", "symbols.zip"])
        .assert()
        .code(1)
        .stderr(contains("config not found"));
}

#[test]
fn upload_of_missing_zip_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "auth_token: secret\n");
    symfetch_cmd(dir.path(), &config)
        .args(["upload", "missing.zip"])
        .assert()
        .code(1)
        .stderr(contains("does not exist"));
}

#[test]
fn upload_without_token_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    std::fs::write(dir.path().join("symbols.zip"), b"PK").unwrap();
    symfetch_cmd(dir.path(), &config)
        .args(["upload", "symbols.zip"])
        .assert()
        .code(1)
        .stderr(contains("auth token"));
}

#[test]
fn upload_with_unreachable_server_fails_and_keeps_zip() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    let token = dir.path().join("token");
    std::fs::write(&token, "secret\n").unwrap();
    let zip = dir.path().join("symbols.zip");
    std::fs::write(&zip, b"PK").unwrap();

    symfetch_cmd(dir.path(), &config)
        .env("SOCORRO_SYMBOL_UPLOAD_TOKEN_FILE", &token)
        .args(["upload", "symbols.zip"])
        .assert()
        .code(1)
        .stderr(contains("giving up"));
    assert!(zip.exists());
}

#[test]
fn fetch_with_unreachable_feed_fails_but_writes_skiplist() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "auth_token: secret\n");
    let state = dir.path().join("state");

    symfetch_cmd(dir.path(), &config)
        .args(["fetch", "http://127.0.0.1:1/missing-symbols.txt"])
        .assert()
        .code(1);

    assert!(state.join("skiplist.txt").exists());
    let log = std::fs::read_to_string(state.join("symsrv-fetch.log")).unwrap();
    assert!(log.contains("symbol fetch run failed"), "log was: {log}");
    assert!(!state.join("verbose.log").exists());
}

#[test]
fn fetch_without_token_still_reads_feed_and_writes_skiplist() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    let state = dir.path().join("state");
    symfetch_cmd(dir.path(), &config)
        .args(["-v", "fetch", "http://127.0.0.1:1/feed"])
        .assert()
        .code(1)
        .stderr(contains("symbol fetch run failed").and(contains("auth token").not()));
    assert!(state.join("skiplist.txt").exists());
    assert!(state.join("verbose.log").exists());
}

#[test]
fn trigger_without_templates_fails() {
    let dir = TempDir::new().unwrap();
    let templates = dir.path().join("tasks");
    std::fs::create_dir_all(&templates).unwrap();
    let config = write_config(dir.path(), "");
    symfetch_cmd(dir.path(), &config)
        .arg("trigger")
        .arg("--templates")
        .arg(&templates)
        .env("TASK_ID", "DECISION")
        .assert()
        .code(1)
        .stderr(contains("no task templates"));
}
