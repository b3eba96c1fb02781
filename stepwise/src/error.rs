//! Error types for the stepwise library.
//!
//! This module provides the error hierarchy for registration, execution,
//! locking, view management and configuration, using `thiserror` for
//! ergonomic error handling.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a stepwise error.
///
/// # Examples
///
/// ```
/// use stepwise::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the stepwise library.
#[derive(Debug, Error)]
pub enum Error {
    /// A migration with this name is already registered.
    #[error("duplicate migration name {name}")]
    DuplicateName {
        /// The name that was registered twice.
        name: String,
    },

    /// A migration requires another migration that is not registered (yet).
    #[error("{name} depends on {dependency} which is unknown")]
    UnknownDependency {
        /// The migration being registered.
        name: String,
        /// The dependency that could not be found.
        dependency: String,
    },

    /// A migration's requirements are not installed at execution time.
    #[error("requirements not met for {migration} (missing: {})", missing.join(", "))]
    RequirementsNotMet {
        /// The migration that could not run.
        migration: String,
        /// Required migrations that are absent or not installed.
        missing: Vec<String>,
    },

    /// The feature ledger table does not exist in the database.
    #[error("{table} is missing")]
    LedgerUninitialized {
        /// The configured ledger table name.
        table: String,
    },

    /// The lock file for the configured schema version already exists.
    #[error("migration lock already exists: {}", path.display())]
    LockExists {
        /// Path of the existing lock file.
        path: PathBuf,
    },

    /// The flag directory does not exist and may not be created.
    #[error(
        "flag directory {} does not exist, create it or set `create_flag_location`",
        path.display()
    )]
    MissingDirectory {
        /// The missing directory.
        path: PathBuf,
    },

    /// The migration batch finished, but not every migration succeeded.
    #[error("not every migration succeeded")]
    MigrationFailed,

    /// A view node depends on itself, directly or transitively.
    #[error("view {view} depends on itself")]
    ViewCycle {
        /// The view type where the cycle was detected.
        view: String,
    },

    /// No backup file is available to restore the database from.
    #[error("no backup found at {}", path.display())]
    BackupNotFound {
        /// The location that was searched.
        path: PathBuf,
    },

    /// The database could not be reached within the allowed time.
    #[error("could not connect to the database within {seconds}s")]
    ConnectTimeout {
        /// The number of seconds spent retrying.
        seconds: u64,
    },

    /// The database URI uses a scheme this library cannot open.
    #[error("unsupported database uri {uri}")]
    UnsupportedUri {
        /// The offending URI.
        uri: String,
    },

    /// Flushing the configured cache failed.
    #[error("cache flush failed for {endpoint}: {message}")]
    CacheFlush {
        /// The cache endpoint.
        endpoint: String,
        /// A description of the failure.
        message: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if the error means the batch already ran for this schema version.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepwise::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::LockExists { path: PathBuf::from("/flags/migrate-2.complete") };
    /// assert!(err.is_already_complete());
    /// ```
    #[must_use]
    pub fn is_already_complete(&self) -> bool {
        matches!(self, Self::LockExists { .. })
    }

    /// Check if the error is a registration mistake in the calling code.
    #[must_use]
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName { .. } | Self::UnknownDependency { .. }
        )
    }
}
