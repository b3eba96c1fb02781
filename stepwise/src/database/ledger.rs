//! Feature ledger operations.
//!
//! The ledger records, per migration name, whether the migration is
//! installed and when the record last changed.

use chrono::{Local, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use crate::error::Result;

use super::connection::Database;
use super::schema;

/// One row of the feature ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    /// Migration name.
    pub name: String,
    /// Whether the migration completed successfully.
    pub installed: bool,
    /// When the record was last written.
    pub updated_at: Option<NaiveDateTime>,
}

// Ledgers written by other tools store booleans as 'T'/'F' text.
fn decode_installed(value: Value) -> bool {
    match value {
        Value::Integer(i) => i != 0,
        Value::Real(f) => f != 0.0,
        Value::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "t" | "true" | "1" | "yes"
        ),
        Value::Null | Value::Blob(_) => false,
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeatureRecord> {
    Ok(FeatureRecord {
        name: row.get(0)?,
        installed: decode_installed(row.get(1)?),
        updated_at: row.get(2).ok().flatten(),
    })
}

impl Database {
    /// Whether the ledger table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be queried.
    pub fn ledger_exists(&self) -> Result<bool> {
        self.table_exists(self.ledger_table())
    }

    /// Creates the ledger table if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be created.
    pub fn create_ledger(&self) -> Result<()> {
        self.define_table(self.ledger_table(), &schema::ledger_columns())
    }

    /// Fetches the ledger record for one migration.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn feature_record(&self, name: &str) -> Result<Option<FeatureRecord>> {
        let mut stmt = self
            .conn
            .prepare(&schema::select_feature_sql(self.ledger_table()))?;
        let mut rows = stmt.query_map([name], row_to_record)?;
        Ok(rows.next().transpose()?)
    }

    /// All ledger records in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn feature_records(&self) -> Result<Vec<FeatureRecord>> {
        let mut stmt = self
            .conn
            .prepare(&schema::select_all_features_sql(self.ledger_table()))?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Whether a migration is recorded as installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.feature_record(name)?.is_some_and(|r| r.installed))
    }

    /// A migration should run unless it is recorded as installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn should_run(&self, name: &str) -> Result<bool> {
        Ok(!self.is_installed(name)?)
    }

    /// The subset of `names` recorded as installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn installed_among(&self, names: &[String]) -> Result<Vec<String>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let sql = schema::select_features_in_sql(self.ledger_table(), names.len());
        let mut stmt = self.conn.prepare(&sql)?;
        let installed = stmt
            .query_map(params_from_iter(names.iter()), row_to_record)?
            .filter_map(|row| match row {
                Ok(record) if record.installed => Some(Ok(record.name)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(installed)
    }

    /// Inserts or updates the ledger record for `name`, stamped with now.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn mark_feature(&self, name: &str, installed: bool) -> Result<()> {
        let now = Local::now().naive_local();
        self.conn.execute(
            &schema::upsert_feature_sql(self.ledger_table()),
            params![name, installed, now],
        )?;
        Ok(())
    }
}

/// Sets the ledger state of a migration by hand.
///
/// # Errors
///
/// Returns an error if the write fails.
///
/// # Examples
///
/// ```no_run
/// use stepwise::database::{mark_migration, Database, DatabaseConfig};
///
/// let db = Database::open(DatabaseConfig::new("/tmp/app.db")).unwrap();
/// mark_migration(&db, "create_users", true).unwrap();
/// ```
pub fn mark_migration(db: &Database, name: &str, installed: bool) -> Result<()> {
    db.mark_feature(name, installed)?;
    if db.in_transaction() {
        db.commit()?;
    }
    Ok(())
}
