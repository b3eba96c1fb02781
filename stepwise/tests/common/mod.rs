//! Common test utilities for integration tests.

use std::path::Path;

use stepwise::database::{Database, DatabaseConfig};
use stepwise::Settings;
use tempfile::TempDir;

/// A scratch database plus flag directory.
pub struct Scratch {
    pub dir: TempDir,
    pub settings: Settings,
}

impl Scratch {
    /// Settings pointing at `app.db` and a `flags` directory inside a fresh
    /// temporary directory. The flag directory is created on demand.
    #[allow(dead_code)]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(format!("sqlite://{}", dir.path().join("app.db").display()))
            .with_flag_location(dir.path().join("flags"), true);
        Self { dir, settings }
    }

    /// Same as [`Scratch::new`] with a schema version set.
    #[allow(dead_code)]
    pub fn versioned(version: &str) -> Self {
        let mut scratch = Self::new();
        scratch.settings = scratch.settings.with_schema_version(version);
        scratch
    }

    /// An autocommit handle on the scratch database, creating the ledger.
    #[allow(dead_code)]
    pub fn ledger(&self) -> Database {
        Database::open(
            DatabaseConfig::from_settings(&self.settings)
                .unwrap()
                .create_ledger(),
        )
        .unwrap()
    }

    /// A transactional handle as a migration body would receive it.
    #[allow(dead_code)]
    pub fn handle_for(&self, migration: &str) -> Database {
        Database::open(
            DatabaseConfig::from_settings(&self.settings)
                .unwrap()
                .for_migration(migration),
        )
        .unwrap()
    }

    /// Path of a file inside the scratch directory.
    #[allow(dead_code)]
    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

/// Counts rows of a table.
#[allow(dead_code)]
pub fn count(db: &Database, table: &str) -> i64 {
    db.query_count(&format!("SELECT COUNT(*) FROM {table}"), [])
        .unwrap()
}

/// Whether the lock file for `version` exists in `flags`.
#[allow(dead_code)]
pub fn lock_exists(flags: &Path, version: &str) -> bool {
    flags.join(format!("migrate-{version}.complete")).exists()
}
