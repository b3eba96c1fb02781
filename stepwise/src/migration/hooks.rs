//! Collaborators the runner calls around a batch.
//!
//! Cache flushing and backup restoration depend on infrastructure this
//! crate does not ship a client for, so they are traits the application
//! implements. [`SqlFileRestore`] covers the plain `.sql` dump case.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::database::parse_sqlite_uri;
use crate::error::{Error, Result};

/// Flushes an external cache after a batch.
#[cfg_attr(test, mockall::automock)]
pub trait CacheFlusher {
    /// Removes every key at `endpoint`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheFlush`] if the cache cannot be reached.
    fn flush_all(&self, endpoint: &str) -> Result<usize>;
}

/// Restores a database whose ledger table is missing.
#[cfg_attr(test, mockall::automock)]
pub trait BackupRestore {
    /// Loads a backup into the database named by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackupNotFound`] when there is nothing to restore,
    /// in which case the runner starts from an empty ledger.
    fn restore(&self, settings: &Settings) -> Result<()>;
}

/// Restores from a SQL dump file executed as one batch.
///
/// # Examples
///
/// ```no_run
/// use stepwise::config::Settings;
/// use stepwise::migration::{BackupRestore, SqlFileRestore};
///
/// let restore = SqlFileRestore::new("/data/database_to_restore.sql");
/// restore.restore(&Settings::new("sqlite:///data/app.db")).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SqlFileRestore {
    path: PathBuf,
}

impl SqlFileRestore {
    /// Creates a restorer reading `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The dump file this restorer reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackupRestore for SqlFileRestore {
    fn restore(&self, settings: &Settings) -> Result<()> {
        if !self.path.is_file() {
            return Err(Error::BackupNotFound {
                path: self.path.clone(),
            });
        }

        log::info!("restoring database from {}", self.path.display());
        let sql = std::fs::read_to_string(&self.path)?;

        // the ledger is missing at this point, so the dump goes through a
        // bare connection instead of a ledger-checked handle
        let conn = rusqlite::Connection::open(parse_sqlite_uri(&settings.migrate_uri)?)?;
        conn.execute_batch(&sql)?;
        conn.close().map_err(|(_, e)| Error::Database(e))
    }
}
