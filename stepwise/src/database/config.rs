//! Database configuration and connection parameters.
//!
//! This module provides configuration types for database handles,
//! including URI parsing and per-migration handle options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::validator::expand_home;
use crate::config::{Settings, DEFAULT_MIGRATE_TABLE};
use crate::error::{Error, Result};

/// Configuration for database handles.
///
/// # Examples
///
/// ```
/// use stepwise::database::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("/tmp/app.db")
///     .with_busy_timeout(Duration::from_millis(10000))
///     .for_migration("create_users");
/// assert!(config.transactional);
/// assert_eq!(config.current_migration.as_deref(), Some("create_users"));
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// Busy timeout for database lock contention.
    pub busy_timeout: Duration,
    /// Whether to create the database file if it doesn't exist.
    pub auto_create: bool,
    /// Whether to open the database in read-only mode.
    pub read_only: bool,
    /// Name of the feature ledger table.
    pub ledger_table: String,
    /// Create the ledger table instead of failing when it is missing.
    pub create_ledger: bool,
    /// Keep the handle inside a transaction at all times.
    pub transactional: bool,
    /// The migration this handle was opened for, if any.
    pub current_migration: Option<String>,
}

impl DatabaseConfig {
    /// Creates a new database configuration with default settings.
    ///
    /// Default settings:
    /// - `busy_timeout`: 5000ms
    /// - `auto_create`: true
    /// - `read_only`: false
    /// - `ledger_table`: `ewh_implemented_features`
    /// - autocommit handle, no current migration, ledger must exist
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_millis(5000),
            auto_create: true,
            read_only: false,
            ledger_table: DEFAULT_MIGRATE_TABLE.to_string(),
            create_ledger: false,
            transactional: false,
            current_migration: None,
        }
    }

    /// Builds a configuration from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedUri`] if the URI is not a `sqlite://` URI.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let path = parse_sqlite_uri(&settings.migrate_uri)?;
        Ok(Self::new(path).with_ledger_table(&settings.migrate_table))
    }

    /// Sets the busy timeout duration.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets the ledger table name.
    #[must_use]
    pub fn with_ledger_table(mut self, table: &str) -> Self {
        self.ledger_table = table.to_string();
        self
    }

    /// Configures a dedicated, transactional handle for one migration.
    #[must_use]
    pub fn for_migration(mut self, name: &str) -> Self {
        self.current_migration = Some(name.to_string());
        self.transactional = true;
        self
    }

    /// Creates the ledger table on open when it is missing.
    #[must_use]
    pub fn create_ledger(mut self) -> Self {
        self.create_ledger = true;
        self
    }

    /// Configures the database to be opened in read-only mode.
    ///
    /// When read-only is enabled, `auto_create` and `create_ledger` are
    /// disabled.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self.auto_create = false;
        self.create_ledger = false;
        self
    }
}

/// Extracts the database file path from a `sqlite://` URI.
///
/// `sqlite:///abs/path.db` is absolute, `sqlite://relative.db` is relative to
/// the working directory.
///
/// # Errors
///
/// Returns [`Error::UnsupportedUri`] for any other scheme or an empty path.
///
/// # Examples
///
/// ```
/// use stepwise::database::parse_sqlite_uri;
/// use std::path::PathBuf;
///
/// assert_eq!(parse_sqlite_uri("sqlite:///tmp/a.db").unwrap(), PathBuf::from("/tmp/a.db"));
/// assert_eq!(parse_sqlite_uri("sqlite://a.db").unwrap(), PathBuf::from("a.db"));
/// assert!(parse_sqlite_uri("postgres://user@host/db").is_err());
/// ```
pub fn parse_sqlite_uri(uri: &str) -> Result<PathBuf> {
    let unsupported = || Error::UnsupportedUri {
        uri: uri.to_string(),
    };

    let rest = uri.trim().strip_prefix("sqlite://").ok_or_else(unsupported)?;
    if rest.is_empty() || rest == "/" {
        return Err(unsupported());
    }

    Ok(expand_home(Path::new(rest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = DatabaseConfig::new("/tmp/test.db");
        assert_eq!(config.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
        assert!(config.auto_create);
        assert!(!config.read_only);
        assert!(!config.transactional);
        assert!(!config.create_ledger);
        assert_eq!(config.ledger_table, DEFAULT_MIGRATE_TABLE);
    }

    #[test]
    fn test_config_read_only() {
        let config = DatabaseConfig::new("/tmp/test.db").create_ledger().read_only();
        assert!(config.read_only);
        assert!(!config.auto_create);
        assert!(!config.create_ledger);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings::new("sqlite:///tmp/x.db").with_migrate_table("features");
        let config = DatabaseConfig::from_settings(&settings).unwrap();
        assert_eq!(config.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.ledger_table, "features");
    }

    #[test]
    fn test_parse_sqlite_uri_rejects_other_schemes() {
        assert!(matches!(
            parse_sqlite_uri("postgres://localhost/db"),
            Err(Error::UnsupportedUri { .. })
        ));
        assert!(parse_sqlite_uri("sqlite://").is_err());
        assert!(parse_sqlite_uri("app.db").is_err());
    }

    #[test]
    fn test_parse_sqlite_uri_nested_relative() {
        assert_eq!(
            parse_sqlite_uri("sqlite://data/app.sqlite").unwrap(),
            PathBuf::from("data/app.sqlite")
        );
    }
}
