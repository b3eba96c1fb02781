//! Schema-version lock file.
//!
//! A completed batch leaves `<flag_location>/migrate-<schema_version>.complete`
//! behind so later starts with the same schema version skip migrating.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{Error, Result};

/// Lifecycle of a [`SchemaVersionLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No lock is held, either because no schema version is configured or
    /// because a failed batch released it.
    Unlocked,
    /// The batch is running.
    Locked,
    /// The batch succeeded and the lock file exists.
    Complete,
}

/// The lock guarding one migration batch per schema version.
#[derive(Debug)]
pub struct SchemaVersionLock {
    path: Option<PathBuf>,
    state: LockState,
}

impl SchemaVersionLock {
    /// Takes the lock for the configured schema version.
    ///
    /// Without a schema version the lock is bypassed and
    /// [`lock_file`](Self::lock_file) returns `None`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingDirectory`] if the flag directory does not exist and
    ///   `create_flag_location` is not set
    /// - [`Error::LockExists`] if the batch already completed for this version
    /// - An I/O error if the flag directory cannot be created
    pub fn acquire(settings: &Settings) -> Result<Self> {
        let dir = &settings.flag_location;
        if !dir.exists() {
            if !settings.create_flag_location {
                return Err(Error::MissingDirectory { path: dir.clone() });
            }
            fs::create_dir_all(dir)?;
        }

        let Some(path) = settings.lock_file_path() else {
            log::info!("no schema version found, ignoring any lock files");
            return Ok(Self {
                path: None,
                state: LockState::Unlocked,
            });
        };

        log::debug!("using lock file {}", path.display());
        if path.exists() {
            log::info!("lock file already exists, migration should be completed");
            return Err(Error::LockExists { path });
        }

        Ok(Self {
            path: Some(path),
            state: LockState::Locked,
        })
    }

    /// The lock file path, unless the lock is bypassed.
    #[must_use]
    pub fn lock_file(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LockState {
        self.state
    }

    /// Marks the batch as complete by creating the lock file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn complete(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            fs::File::create(path)?;
            self.state = LockState::Complete;
        }
        Ok(())
    }

    /// Releases the lock after a failed batch so a later start retries.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a stale lock file cannot be removed.
    pub fn release_failed(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        self.state = LockState::Unlocked;
        Ok(())
    }
}

/// Runs `f` while holding the schema-version lock.
///
/// `f` receives the lock file path (or `None` when bypassed) and reports
/// whether the batch succeeded. Success completes the lock. Failure, either
/// `Ok(false)` or [`Error::MigrationFailed`], releases it and returns
/// `Ok(false)`. Any other error releases it and is returned unchanged.
///
/// # Errors
///
/// Returns the errors of [`SchemaVersionLock::acquire`], and any error from
/// `f` other than [`Error::MigrationFailed`].
///
/// # Examples
///
/// ```no_run
/// use stepwise::config::Settings;
/// use stepwise::migration::with_schema_lock;
///
/// let settings = Settings::new("sqlite://app.db")
///     .with_schema_version("3")
///     .with_flag_location("/tmp/flags", true);
/// let done = with_schema_lock(&settings, |_lock| Ok(true)).unwrap();
/// assert!(done);
/// ```
pub fn with_schema_lock<F>(settings: &Settings, f: F) -> Result<bool>
where
    F: FnOnce(Option<&Path>) -> Result<bool>,
{
    let mut lock = SchemaVersionLock::acquire(settings)?;

    match f(lock.lock_file()) {
        Ok(true) => {
            lock.complete()?;
            Ok(true)
        }
        Ok(false) | Err(Error::MigrationFailed) => {
            log::error!(
                "migration failed, removing the lock file. Check the {} table for details",
                settings.migrate_table
            );
            lock.release_failed()?;
            Ok(false)
        }
        Err(e) => {
            if let Err(cleanup) = lock.release_failed() {
                log::warn!("could not remove lock file: {cleanup}");
            }
            Err(e)
        }
    }
}
