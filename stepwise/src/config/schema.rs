//! Configuration schema definitions.
//!
//! [`Config`] is the raw, partially-filled shape read from files and the
//! environment. [`Settings`] is the resolved form the rest of the library
//! works with, with every default applied.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Ledger table name used when none is configured.
pub const DEFAULT_MIGRATE_TABLE: &str = "ewh_implemented_features";

/// Directory holding schema-version lock files when none is configured.
pub const DEFAULT_FLAG_LOCATION: &str = "/flags";

/// Raw configuration as read from a single source.
///
/// Every field is optional so sources can be layered; see
/// [`ConfigMerger`](crate::config::ConfigMerger).
///
/// # Examples
///
/// ```
/// use stepwise::config::Config;
///
/// let config: Config = serde_yaml::from_str("migrate_uri: sqlite://app.db\nschema_version: 3\n").unwrap();
/// assert_eq!(config.migrate_uri.as_deref(), Some("sqlite://app.db"));
/// assert_eq!(config.schema_version.as_deref(), Some("3"));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection URI.
    #[serde(alias = "db_uri")]
    pub migrate_uri: Option<String>,

    /// Schema version keying the lock file.
    #[serde(default, deserialize_with = "string_or_number")]
    pub schema_version: Option<String>,

    /// Cache endpoint to flush after a batch.
    pub redis_host: Option<String>,

    /// Name of the feature ledger table.
    pub migrate_table: Option<String>,

    /// Directory holding lock files.
    pub flag_location: Option<PathBuf>,

    /// Create `flag_location` when it is missing.
    pub create_flag_location: Option<bool>,

    /// SQL dump to load when the ledger table is missing.
    pub database_to_restore: Option<PathBuf>,
}

/// Accepts `schema_version: 2` as well as `schema_version: "2"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Integer(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    }))
}

/// Fully resolved settings.
///
/// # Examples
///
/// ```
/// use stepwise::Settings;
///
/// let settings = Settings::new("sqlite://app.db").with_schema_version("7");
/// assert_eq!(settings.migrate_table, "ewh_implemented_features");
/// assert!(settings.lock_file_path().unwrap().ends_with("migrate-7.complete"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Database connection URI.
    pub migrate_uri: String,
    /// Schema version keying the lock file; `None` disables locking.
    pub schema_version: Option<String>,
    /// Cache endpoint to flush after a batch.
    pub redis_host: Option<String>,
    /// Name of the feature ledger table.
    pub migrate_table: String,
    /// Directory holding lock files.
    pub flag_location: PathBuf,
    /// Create `flag_location` when it is missing.
    pub create_flag_location: bool,
    /// SQL dump to load when the ledger table is missing.
    pub database_to_restore: Option<PathBuf>,
}

impl Settings {
    /// Creates settings for the given URI with every other value defaulted.
    #[must_use]
    pub fn new(migrate_uri: impl Into<String>) -> Self {
        Self {
            migrate_uri: migrate_uri.into(),
            schema_version: None,
            redis_host: None,
            migrate_table: DEFAULT_MIGRATE_TABLE.to_string(),
            flag_location: PathBuf::from(DEFAULT_FLAG_LOCATION),
            create_flag_location: false,
            database_to_restore: None,
        }
    }

    /// Sets the schema version.
    #[must_use]
    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = Some(version.into());
        self
    }

    /// Sets the flag directory and whether it may be created.
    #[must_use]
    pub fn with_flag_location(mut self, path: impl AsRef<Path>, create: bool) -> Self {
        self.flag_location = path.as_ref().to_path_buf();
        self.create_flag_location = create;
        self
    }

    /// Sets the ledger table name.
    #[must_use]
    pub fn with_migrate_table(mut self, table: impl Into<String>) -> Self {
        self.migrate_table = table.into();
        self
    }

    /// Sets the cache endpoint.
    #[must_use]
    pub fn with_redis_host(mut self, host: impl Into<String>) -> Self {
        self.redis_host = Some(host.into());
        self
    }

    /// Sets the SQL dump to restore from.
    #[must_use]
    pub fn with_database_to_restore(mut self, path: impl AsRef<Path>) -> Self {
        self.database_to_restore = Some(path.as_ref().to_path_buf());
        self
    }

    /// Path of the lock file for the configured schema version.
    #[must_use]
    pub fn lock_file_path(&self) -> Option<PathBuf> {
        self.schema_version
            .as_ref()
            .map(|version| self.flag_location.join(format!("migrate-{version}.complete")))
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Settings uri={} table={} schema_version={} flags={}>",
            self.migrate_uri,
            self.migrate_table,
            self.schema_version.as_deref().unwrap_or("-"),
            self.flag_location.display()
        )
    }
}
