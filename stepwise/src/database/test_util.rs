//! Shared test utilities for database unit tests.

use tempfile::tempdir;

use crate::database::{Database, DatabaseConfig};

/// Creates a temporary database with an empty ledger.
///
/// # Panics
///
/// Panics if the temporary directory or database cannot be created.
#[must_use]
pub fn create_test_database() -> Database {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::open(DatabaseConfig::new(path).create_ledger()).unwrap();

    // Prevent the TempDir from being dropped immediately
    std::mem::forget(dir);

    db
}
