#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # stepwise
//!
//! A library for running ordered, ledger-tracked database migrations.
//!
//! Migrations are plain functions registered under a unique name, optionally
//! requiring earlier migrations. Each one runs at most once successfully:
//! outcomes are recorded in a feature ledger table, and a schema-version
//! lock file keeps a completed batch from running again.
//!
//! ## Core Types
//!
//! - [`MigrationRegistry`]: ordered registration with dependency ranks
//! - [`MigrationRunner`]: applies pending migrations and records outcomes
//! - [`SchemaVersionLock`]: one completed batch per schema version
//! - [`ViewScope`]: drops and recreates views around schema changes
//! - [`Settings`] and [`ConfigBuilder`]: layered configuration
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```no_run
//! use stepwise::{run_batch, MigrationRegistry, Settings};
//!
//! let mut registry = MigrationRegistry::new();
//! let users = registry
//!     .register("create_users", |db| {
//!         db.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!         Ok(true)
//!     })
//!     .unwrap();
//! registry
//!     .register_with_requires("seed_admin", [&users], |db| {
//!         db.execute("INSERT INTO users (name) VALUES (?1)", ["admin"])?;
//!         Ok(true)
//!     })
//!     .unwrap();
//!
//! let settings = Settings::new("sqlite://app.db")
//!     .with_schema_version("1")
//!     .with_flag_location("/tmp/flags", true);
//! assert!(run_batch(&settings, &registry).unwrap());
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod migration;
pub mod views;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigBuilder, Settings};
pub use database::{mark_migration, Database, DatabaseConfig};
pub use error::{Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use migration::{
    list_migrations, run_batch, with_schema_lock, BatchReport, MigrationHandle,
    MigrationRegistry, MigrationRunner, Outcome, Requirement, SchemaVersionLock,
};
pub use views::{ViewKind, ViewMigration, ViewScope};
