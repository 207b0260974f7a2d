//! Binary-level tests for the `myai` command line

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

mod common;
use common::temp_config_file;

fn myai(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("myai").expect("binary built");
    cmd.env_remove("MYAI_API_BASE")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.join("missing.yaml"))
        .arg("--storage-path")
        .arg(dir.join("state.db"));
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("myai")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("image"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("myai")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let (_dir, config_path) = temp_config_file("api:\n  base_url: \"ftp://example.com\"\n");
    let storage = TempDir::new().unwrap();

    Command::cargo_bin("myai")
        .unwrap()
        .env_remove("MYAI_API_BASE")
        .arg("--config")
        .arg(&config_path)
        .arg("--storage-path")
        .arg(storage.path().join("state.db"))
        .args(["sessions", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_sessions_list_on_empty_store() {
    let dir = TempDir::new().unwrap();
    myai(dir.path())
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No chat sessions found."));
}

#[test]
fn test_image_rejects_empty_prompt_without_network() {
    let dir = TempDir::new().unwrap();
    myai(dir.path())
        .args(["--api-base", "http://127.0.0.1:9", "image", "   "])
        .assert()
        .failure();
}

#[test]
fn test_export_then_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let export_path = dir.path().join("export.json");

    myai(dir.path())
        .args(["export", "--output"])
        .arg(&export_path)
        .assert()
        .success();

    let written = std::fs::read_to_string(&export_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert!(value["chatHistory"].is_array());
    assert!(value["imageHistory"].is_array());
    assert!(value["exportDate"].is_string());

    let import_path = dir.path().join("import.json");
    std::fs::write(
        &import_path,
        r#"{"chatHistory":[{"role":"user","content":"imported hello","timestamp":"2024-01-01T10:00:00Z"}],"imageHistory":[]}"#,
    )
    .unwrap();
    myai(dir.path())
        .arg("import")
        .arg(&import_path)
        .assert()
        .success();
}

#[test]
fn test_import_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "not json").unwrap();

    myai(dir.path()).arg("import").arg(&bad).assert().failure();
}
