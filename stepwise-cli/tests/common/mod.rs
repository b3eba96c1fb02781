//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with a scratch database and flag directory
//! - Command builder helpers
//! - Direct ledger inspection

use assert_cmd::Command;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment variables the binary reads, cleared for every command.
const CLEARED_VARS: [&str; 10] = [
    "DB_URI",
    "SCHEMA_VERSION",
    "REDIS_HOST",
    "MIGRATE_TABLE",
    "STEPWISE_CONFIG",
    "STEPWISE_MAX_WAIT",
    "STEPWISE_LOG_MODE",
    "STEPWISE_OUTPUT_FORMAT",
    "STEPWISE_RESTORE_FROM",
    "DATABASE_TO_RESTORE",
];

/// Test environment with an isolated database and flag directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Path to the `SQLite` database file
    pub db_path: PathBuf,
    /// Directory holding lock files
    pub flag_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    ///
    /// Neither the database nor the flag directory exists yet; the binary
    /// creates both.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let db_path = temp_path.join("app.db");
        let flag_dir = temp_path.join("flags");

        Self {
            temp_dir,
            temp_path,
            db_path,
            flag_dir,
        }
    }

    /// Get a command builder with no configuration at all.
    ///
    /// Runs inside the temp directory so no stray `stepwise.yaml` is found.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("stepwise").expect("Failed to find stepwise binary");
        cmd.current_dir(&self.temp_path).env_remove("MIGRATE_URI");
        for var in CLEARED_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Get a command builder pointed at this environment's database.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.env("MIGRATE_URI", format!("sqlite://{}", self.db_path.display()))
            .env("FLAG_LOCATION", &self.flag_dir)
            .env("CREATE_FLAG_LOCATION", "true");
        cmd
    }

    /// Same as [`TestEnv::command`] with a schema version set.
    pub fn versioned_command(&self, version: &str) -> Command {
        let mut cmd = self.command();
        cmd.env("SCHEMA_VERSION", version);
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Path of the lock file for `version`.
    pub fn lock_file(&self, version: &str) -> PathBuf {
        self.flag_dir.join(format!("migrate-{version}.complete"))
    }

    /// Run `stepwise run` and assert it succeeds.
    pub fn run_ok(&self) {
        self.command().arg("run").assert().success();
    }

    /// Run `stepwise list --format json` and parse the output.
    pub fn list_json(&self) -> serde_json::Value {
        let output = self
            .command()
            .args(["list", "--format", "json"])
            .output()
            .expect("Failed to run list command");

        assert!(
            output.status.success(),
            "List failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("Invalid JSON output")
    }

    /// Open the scratch database directly.
    pub fn connect(&self) -> Connection {
        Connection::open(&self.db_path).expect("Failed to open database")
    }

    /// Ledger `installed` flag for `name`, if a record exists.
    pub fn installed(&self, name: &str) -> Option<bool> {
        self.connect()
            .query_row(
                "SELECT installed FROM ewh_implemented_features WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .ok()
    }

    /// Whether `table` has a column named `column`.
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        let conn = self.connect();
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("Failed to read table info");
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(1))
            .expect("Failed to query table info")
            .collect::<Result<_, _>>()
            .expect("Failed to read column names");
        names.iter().any(|name| name == column)
    }
}
