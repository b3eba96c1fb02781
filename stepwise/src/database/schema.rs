//! Table definitions and SQL for the feature ledger.
//!
//! The ledger table name is configurable, so statements are rendered per
//! table after the name has passed [`validate_identifier`].

use crate::error::{Error, Result};

/// A column in a table created through [`Database::define_table`].
///
/// [`Database::define_table`]: crate::database::Database::define_table
///
/// # Examples
///
/// ```
/// use stepwise::database::Column;
///
/// let column = Column::new("name", "TEXT").not_null().unique();
/// assert_eq!(column.to_sql(), "name TEXT NOT NULL UNIQUE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    sql_type: String,
    constraints: Vec<String>,
}

impl Column {
    /// Creates a column with the given SQL type.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            constraints: Vec::new(),
        }
    }

    /// Adds `NOT NULL`.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.constraints.push("NOT NULL".into());
        self
    }

    /// Adds `UNIQUE`.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.constraints.push("UNIQUE".into());
        self
    }

    /// Adds a `DEFAULT` clause with a literal SQL expression.
    #[must_use]
    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.constraints.push(format!("DEFAULT {}", expr.into()));
        self
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the column definition.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint);
        }
        sql
    }
}

/// Checks that `name` can be interpolated into SQL as an identifier.
///
/// # Errors
///
/// Returns a validation error naming `field` otherwise.
pub fn validate_identifier(field: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::Validation {
            field: field.into(),
            message: format!(
                "'{name}' must start with a letter or underscore and contain only letters, digits and underscores"
            ),
        });
    }

    if name.len() > 63 {
        return Err(Error::Validation {
            field: field.into(),
            message: "Cannot exceed 63 characters".into(),
        });
    }

    Ok(())
}

/// Renders `CREATE TABLE IF NOT EXISTS` with an implicit integer `id` key.
#[must_use]
pub fn create_table_sql(table: &str, columns: &[Column]) -> String {
    let mut definitions = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    definitions.extend(columns.iter().map(Column::to_sql));
    format!(
        "CREATE TABLE IF NOT EXISTS {table} ({})",
        definitions.join(", ")
    )
}

/// Column layout of the feature ledger.
#[must_use]
pub fn ledger_columns() -> Vec<Column> {
    vec![
        Column::new("name", "TEXT").not_null().unique(),
        Column::new("installed", "BOOLEAN").not_null().default_value("0"),
        Column::new("last_update_dttm", "TIMESTAMP"),
    ]
}

/// SQL checking whether a table exists.
pub const SELECT_TABLE_EXISTS: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1";

/// Fetch one ledger record by name.
#[must_use]
pub fn select_feature_sql(table: &str) -> String {
    format!("SELECT name, installed, last_update_dttm FROM {table} WHERE name = ?1")
}

/// Fetch all ledger records.
#[must_use]
pub fn select_all_features_sql(table: &str) -> String {
    format!("SELECT name, installed, last_update_dttm FROM {table} ORDER BY id")
}

/// Fetch ledger records whose name is in a list of `count` placeholders.
#[must_use]
pub fn select_features_in_sql(table: &str, count: usize) -> String {
    let placeholders = (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT name, installed, last_update_dttm FROM {table} WHERE name IN ({placeholders})"
    )
}

/// Insert or update a ledger record.
#[must_use]
pub fn upsert_feature_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (name, installed, last_update_dttm) VALUES (?1, ?2, ?3) \
         ON CONFLICT(name) DO UPDATE SET installed = excluded.installed, \
         last_update_dttm = excluded.last_update_dttm"
    )
}
