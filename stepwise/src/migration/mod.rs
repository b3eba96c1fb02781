//! Migration registration and execution.
//!
//! Migrations are registered into a [`MigrationRegistry`], which fixes their
//! run order. A [`MigrationRunner`] applies the pending ones, recording each
//! outcome in the feature ledger, and [`with_schema_lock`] makes sure a
//! batch completes at most once per schema version.
//!
//! # Examples
//!
//! ```no_run
//! use stepwise::config::ConfigBuilder;
//! use stepwise::migration::{run_batch, MigrationRegistry};
//!
//! let mut registry = MigrationRegistry::new();
//! let users = registry
//!     .register("create_users", |db| {
//!         db.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!         Ok(true)
//!     })
//!     .unwrap();
//! registry
//!     .register_with_requires("add_email", [&users], |db| {
//!         db.execute_batch("ALTER TABLE users ADD COLUMN email TEXT")?;
//!         Ok(true)
//!     })
//!     .unwrap();
//!
//! let settings = ConfigBuilder::new().build().unwrap();
//! let succeeded = run_batch(&settings, &registry).unwrap();
//! ```

mod hooks;
mod lock;
mod registry;
mod runner;
mod status;

#[cfg(test)]
mod proptests;

pub use hooks::{BackupRestore, CacheFlusher, SqlFileRestore};
pub use lock::{with_schema_lock, LockState, SchemaVersionLock};
pub use registry::{Migration, MigrationBody, MigrationHandle, MigrationRegistry, Requirement};
pub use runner::{
    connect_with_retry, run_batch, BatchReport, MigrationRunner, Outcome, DEFAULT_MAX_WAIT,
    DEFAULT_RETRY_INTERVAL,
};
pub use status::{list_migrations, MigrationState, MigrationStatus};
