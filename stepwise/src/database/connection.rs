//! Database connection management.
//!
//! This module provides the database handle handed to migration bodies,
//! with PRAGMA setup, ledger verification and explicit transaction control.

use rusqlite::{Connection, OpenFlags, Params};

use crate::error::{Error, Result};

use super::config::DatabaseConfig;
use super::schema::{self, Column};

/// A database handle wrapping one `SQLite` connection.
///
/// A handle opened with [`DatabaseConfig::for_migration`] is transactional:
/// it starts inside a transaction, and [`commit`](Self::commit) and
/// [`rollback`](Self::rollback) immediately open the next one. Other
/// handles run in autocommit mode.
///
/// # Examples
///
/// ```no_run
/// use stepwise::database::{Database, DatabaseConfig};
///
/// let config = DatabaseConfig::new("/tmp/app.db").create_ledger();
/// let db = Database::open(config).unwrap();
/// db.execute_batch("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY)").unwrap();
/// ```
#[derive(Debug)]
pub struct Database {
    pub(super) conn: Connection,
    config: DatabaseConfig,
}

impl Database {
    /// Opens a database handle with the given configuration.
    ///
    /// This function will:
    /// - Create the parent directory if `auto_create` is enabled
    /// - Open the database with appropriate flags
    /// - Set WAL mode and the busy timeout
    /// - Verify the ledger table, creating it if `create_ledger` is set
    /// - Begin a transaction on transactional handles
    ///
    /// # Errors
    ///
    /// Returns [`Error::LedgerUninitialized`] if the ledger table is missing
    /// and may not be created, or a database error if the file cannot be
    /// opened or configured.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        if config.auto_create && !config.path.exists() {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let flags = if config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else if config.auto_create {
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };

        let conn = Connection::open_with_flags(&config.path, flags)?;

        // journal_mode returns a row, so it cannot go through execute_batch
        if !config.read_only {
            let _: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        }
        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {}",
            config.busy_timeout.as_millis()
        ))?;

        schema::validate_identifier("migrate_table", &config.ledger_table)?;
        let db = Self { conn, config };

        if !db.ledger_exists()? {
            if !db.config.create_ledger {
                return Err(Error::LedgerUninitialized {
                    table: db.config.ledger_table.clone(),
                });
            }
            db.create_ledger()?;
            log::debug!("created ledger table {}", db.config.ledger_table);
        }

        if db.config.transactional {
            db.conn.execute_batch("BEGIN")?;
        }

        Ok(db)
    }

    /// Returns a reference to the underlying `SQLite` connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The configuration this handle was opened with.
    #[must_use]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Name of the feature ledger table.
    #[must_use]
    pub fn ledger_table(&self) -> &str {
        &self.config.ledger_table
    }

    /// The migration this handle was opened for.
    ///
    /// View relevance treats this migration as already reached.
    #[must_use]
    pub fn current_migration(&self) -> Option<&str> {
        self.config.current_migration.as_deref()
    }

    /// Whether a transaction is currently open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Executes one statement and returns the number of changed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Executes a batch of statements separated by semicolons.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        Ok(self.conn.execute_batch(sql)?)
    }

    /// Runs a query whose first column is an integer, typically a `COUNT`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or returns no rows.
    pub fn query_count<P: Params>(&self, sql: &str, params: P) -> Result<i64> {
        Ok(self.conn.query_row(sql, params, |row| row.get(0))?)
    }

    /// Whether a table with this name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `sqlite_master` cannot be queried.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.query_count(schema::SELECT_TABLE_EXISTS, [table])? > 0)
    }

    /// Creates a table with an `id` primary key plus `columns`, if missing.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid table name, or a database
    /// error if the statement fails.
    pub fn define_table(&self, table: &str, columns: &[Column]) -> Result<()> {
        schema::validate_identifier("table", table)?;
        self.execute_batch(&schema::create_table_sql(table, columns))
    }

    /// Commits the open transaction.
    ///
    /// On a transactional handle a new transaction begins right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub fn commit(&self) -> Result<()> {
        if self.in_transaction() {
            self.conn.execute_batch("COMMIT")?;
        }
        if self.config.transactional {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    /// Rolls back the open transaction.
    ///
    /// On a transactional handle a new transaction begins right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub fn rollback(&self) -> Result<()> {
        if self.in_transaction() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        if self.config.transactional {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    /// Closes the handle, discarding any uncommitted work.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback or the close fails.
    pub fn close(self) -> Result<()> {
        if self.in_transaction() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }
}
