//! Configuration system for stepwise.
//!
//! This module provides layered configuration with support for:
//! - A YAML configuration file (`stepwise.yaml`, discovered upward from the
//!   working directory or passed explicitly)
//! - Environment variable overrides (`MIGRATE_URI`, `SCHEMA_VERSION`, ...)
//! - Programmatic configuration via the builder
//!
//! # Configuration Precedence
//!
//! Highest to lowest:
//!
//! 1. Programmatic overrides (via `ConfigBuilder::with_config`)
//! 2. Environment variables
//! 3. `stepwise.yaml`
//! 4. Built-in defaults
//!
//! # Examples
//!
//! ```no_run
//! use stepwise::config::ConfigBuilder;
//!
//! let settings = ConfigBuilder::new().build().unwrap();
//! println!("ledger table: {}", settings.migrate_table);
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use builder::ConfigBuilder;
pub use environment::EnvironmentConfig;
pub use loader::{ConfigLoader, ConfigSource, CONFIG_FILE_NAME};
pub use merger::ConfigMerger;
pub use schema::{Config, Settings, DEFAULT_FLAG_LOCATION, DEFAULT_MIGRATE_TABLE};
pub use validator::ConfigValidator;
