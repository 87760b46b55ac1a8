//! CLI Integration Tests
//!
//! Tests the `checklist` binary directly using assert_cmd to exercise main.rs code paths.

// Skip all CLI tests during coverage builds
#![cfg(not(coverage))]
#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use checklist_editor::excel::codec::{self, SheetCells};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A `checklist` command pointed at a database inside `dir`, with no ambient env
fn checklist(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("checklist").unwrap();
    cmd.current_dir(dir)
        .env_remove("CHECKLIST_CONFIG")
        .env_remove("CHECKLIST_USER")
        .env_remove("CHECKLIST_PASSWORD")
        .env("CHECKLIST_DB", dir.join("checklist.db"));
    cmd
}

fn as_user(dir: &Path) -> Command {
    let mut cmd = checklist(dir);
    cmd.args(["--user", "user", "--password", "user123"]);
    cmd
}

fn as_admin(dir: &Path) -> Command {
    let mut cmd = checklist(dir);
    cmd.args(["--user", "admin", "--password", "admin123"]);
    cmd
}

fn write_workbook(dir: &Path) -> PathBuf {
    let path = dir.join("checks.xlsx");
    let sheet = SheetCells::from_rows(
        "Checks",
        vec![
            vec!["Item", "Status"],
            vec!["Check power", "Pending"],
            vec!["Check fuses", "Pending"],
        ],
    );
    fs::write(&path, codec::write_workbook(&[sheet]).unwrap()).unwrap();
    path
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    Command::cargo_bin("checklist")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("checklist"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("checklist")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("checklist"));
}

#[test]
fn test_import_help() {
    Command::cargo_bin("checklist")
        .unwrap()
        .args(["import", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("atomic"));
}

#[test]
fn test_unknown_subcommand() {
    Command::cargo_bin("checklist")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// WORKFLOW TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_init_creates_default_accounts() {
    let dir = TempDir::new().unwrap();
    checklist(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin"));
    assert!(dir.path().join("checklist.db").exists());
}

#[test]
fn test_requires_login() {
    let dir = TempDir::new().unwrap();
    checklist(dir.path()).arg("init").assert().success();
    checklist(dir.path())
        .arg("sheets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_wrong_password() {
    let dir = TempDir::new().unwrap();
    checklist(dir.path()).arg("init").assert().success();
    checklist(dir.path())
        .args(["--user", "user", "--password", "nope", "sheets"])
        .assert()
        .failure();
}

#[test]
fn test_import_show_set_export() {
    let dir = TempDir::new().unwrap();
    let workbook = write_workbook(dir.path());
    checklist(dir.path()).arg("init").assert().success();

    as_user(dir.path())
        .arg("import")
        .arg(&workbook)
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded 1 worksheets successfully"));

    as_user(dir.path())
        .arg("sheets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checks"));

    as_user(dir.path())
        .args(["set", "Checks", "0", "1", "Done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B2"));

    as_user(dir.path())
        .args(["show", "Checks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Done"))
        .stdout(predicate::str::contains("Check fuses"));

    let out_dir = dir.path().join("exports");
    as_user(dir.path())
        .arg("export")
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(".xlsx"));

    let exported: Vec<PathBuf> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(exported.len(), 1);
    let book = codec::read_workbook_path(&exported[0]).unwrap();
    assert_eq!(book[0].text(1, 1), "Done");
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    let workbook = write_workbook(dir.path());
    checklist(dir.path()).arg("init").assert().success();

    let output = as_user(dir.path())
        .arg("--json")
        .arg("import")
        .arg(&workbook)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["data"]["worksheets"][0]["name"], "Checks");
    assert_eq!(report["data"]["worksheets"][0]["total_rows"], 2);
    assert!(report["run_id"].as_str().is_some());
}

#[test]
fn test_user_admin_commands() {
    let dir = TempDir::new().unwrap();
    checklist(dir.path()).arg("init").assert().success();

    as_user(dir.path())
        .args(["user", "list"])
        .assert()
        .failure();

    as_admin(dir.path())
        .args(["user", "add", "tech", "pw", "--department", "Field"])
        .assert()
        .success();

    as_admin(dir.path())
        .args(["user", "add", "tech", "pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already exists"));

    as_admin(dir.path())
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tech"));
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("checklist.yaml");
    fs::write(
        &config,
        "database: from-config.db\ndefault_accounts:\n  - username: boss\n    password: secret\n    role: admin\n",
    )
    .unwrap();

    Command::cargo_bin("checklist")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("CHECKLIST_DB")
        .args(["--config"])
        .arg(&config)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("boss"));
    assert!(dir.path().join("from-config.db").exists());
}

#[test]
fn test_bad_role_is_json_failure_report() {
    let dir = TempDir::new().unwrap();
    checklist(dir.path()).arg("init").assert().success();

    let output = as_admin(dir.path())
        .args(["--json", "user", "add", "tech", "pw", "--role", "superuser"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], false);
    assert!(report["message"].as_str().unwrap().contains("superuser"));
}

#[test]
fn test_bad_config_is_json_failure_report() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("checklist.yaml");
    fs::write(&config, "databse: typo.db\n").unwrap();

    let output = checklist(dir.path())
        .arg("--json")
        .arg("--config")
        .arg(&config)
        .arg("sheets")
        .output()
        .unwrap();
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], false);
    assert!(report["run_id"].as_str().is_some());
}
