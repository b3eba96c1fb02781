//! Integration tests for the `list`, `mark` and `completions` commands.

mod common;

use common::TestEnv;
use predicates::prelude::*;

// ============================================================================
// List
// ============================================================================

/// Before any run every migration is missing and no database is created.
#[test]
fn test_list_before_run() {
    let env = TestEnv::new();

    let output = env
        .command()
        .arg("list")
        .output()
        .expect("Failed to run list command");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "header plus one line per migration");
    assert!(lines[0].starts_with("NAME"));
    assert!(lines[1].starts_with("create_users_table"));
    assert!(lines[1].contains("missing"));
    assert!(lines[2].starts_with("add_password_column"));
    assert!(!env.db_path.exists());
}

/// JSON output reflects the ledger after a run.
#[test]
fn test_list_json_after_run() {
    let env = TestEnv::new();
    env.run_ok();

    let json = env.list_json();
    let entries = json.as_array().expect("expected a JSON array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "create_users_table");
    assert_eq!(entries[0]["status"], "succeeded");
    assert!(entries[0]["last_update"].is_string());
    assert_eq!(entries[1]["name"], "add_password_column");
    assert_eq!(entries[1]["status"], "succeeded");
}

/// CSV output has a lowercase header row.
#[test]
fn test_list_csv() {
    let env = TestEnv::new();

    env.command()
        .args(["list", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("name,status,last_update\n"))
        .stdout(predicate::str::contains("create_users_table,missing,\n"));
}

/// The format flag is case-insensitive.
#[test]
fn test_list_format_case_insensitive() {
    let env = TestEnv::new();

    env.command()
        .args(["list", "--format", "JSON"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}

// ============================================================================
// Mark
// ============================================================================

/// Marking a migration failed makes the next run retry it.
#[test]
fn test_mark_failed_then_rerun() {
    let env = TestEnv::new();
    env.run_ok();

    env.command()
        .args(["mark", "add_password_column", "--failed"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Marked add_password_column as failed"));
    assert_eq!(env.installed("add_password_column"), Some(false));

    let json = env.list_json();
    assert_eq!(json[1]["status"], "failed");

    // the column already exists, so the retried migration aborts
    env.command().arg("run").assert().code(1);
    assert_eq!(env.installed("add_password_column"), Some(false));
}

/// Marking on a fresh database creates the ledger.
#[test]
fn test_mark_installed_on_fresh_database() {
    let env = TestEnv::new();

    env.command()
        .args(["mark", "create_users_table"])
        .assert()
        .success();
    assert_eq!(env.installed("create_users_table"), Some(true));
}

/// Only registered names can be marked.
#[test]
fn test_mark_unknown_migration() {
    let env = TestEnv::new();

    env.command()
        .args(["mark", "drop_everything"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("drop_everything"));
    assert!(!env.db_path.exists());
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let env = TestEnv::new();

    env.command_bare()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stepwise"));
}
