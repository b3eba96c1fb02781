//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including configuration loading, ledger access and output formatting.

use crate::error::CliError;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::time::Duration;
use stepwise::{ConfigBuilder, Database, DatabaseConfig, Settings};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Explicit configuration file.
    pub config: Option<PathBuf>,

    /// Override the connection retry window (in seconds).
    pub max_wait: Option<u64>,
}

impl GlobalOptions {
    /// The connection retry window, if one was given.
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait.map(Duration::from_secs)
    }
}

/// Load layered configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Environment variables (highest priority)
/// 2. The `--config` file, or the nearest `stepwise.yaml`
/// 3. Built-in defaults (lowest priority)
pub fn load_settings(global: &GlobalOptions) -> Result<Settings, CliError> {
    let mut builder = ConfigBuilder::new();
    if let Some(ref path) = global.config {
        builder = builder.with_config_file(path);
    }

    let settings = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    log::debug!(
        "using {} with ledger table {}",
        settings.migrate_uri,
        settings.migrate_table
    );
    Ok(settings)
}

/// Open an autocommit handle on the ledger, creating the table if needed.
pub fn open_ledger(settings: &Settings) -> Result<Database, CliError> {
    let config = DatabaseConfig::from_settings(settings)?.create_ledger();
    Database::open(config).map_err(CliError::from)
}

/// Format a ledger timestamp for display.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
