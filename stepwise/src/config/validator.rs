//! Configuration validation.
//!
//! Checks a merged [`Config`] and resolves it into [`Settings`].

use crate::config::schema::{Config, Settings, DEFAULT_FLAG_LOCATION, DEFAULT_MIGRATE_TABLE};
use crate::database::schema::validate_identifier;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Validates configuration values.
///
/// # Examples
///
/// ```
/// use stepwise::config::{Config, ConfigValidator};
///
/// let config = Config { migrate_uri: Some("sqlite://app.db".into()), ..Default::default() };
/// let settings = ConfigValidator::resolve(config).unwrap();
/// assert_eq!(settings.migrate_uri, "sqlite://app.db");
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a merged configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `migrate_uri` is missing, or when a
    /// present value is malformed.
    pub fn validate(config: &Config) -> Result<()> {
        match config.migrate_uri.as_deref() {
            None => {
                return Err(Error::Validation {
                    field: "migrate_uri".into(),
                    message: "$MIGRATE_URI not found in environment or configuration".into(),
                })
            }
            Some(uri) if uri.trim().is_empty() => {
                return Err(Error::Validation {
                    field: "migrate_uri".into(),
                    message: "Cannot be empty or only whitespace".into(),
                })
            }
            Some(_) => {}
        }

        if let Some(ref table) = config.migrate_table {
            Self::validate_table_name(table)?;
        }

        if let Some(ref version) = config.schema_version {
            Self::validate_schema_version(version)?;
        }

        Ok(())
    }

    /// Validate and apply defaults.
    ///
    /// # Errors
    ///
    /// See [`ConfigValidator::validate`].
    pub fn resolve(config: Config) -> Result<Settings> {
        Self::validate(&config)?;

        Ok(Settings {
            migrate_uri: config.migrate_uri.unwrap_or_default(),
            schema_version: config.schema_version,
            redis_host: config.redis_host,
            migrate_table: config
                .migrate_table
                .unwrap_or_else(|| DEFAULT_MIGRATE_TABLE.to_string()),
            flag_location: config
                .flag_location
                .map_or_else(|| PathBuf::from(DEFAULT_FLAG_LOCATION), |p| expand_home(&p)),
            create_flag_location: config.create_flag_location.unwrap_or(false),
            database_to_restore: config.database_to_restore.map(|p| expand_home(&p)),
        })
    }

    /// The ledger table name is interpolated into SQL, so it must be a
    /// plain identifier.
    pub(crate) fn validate_table_name(table: &str) -> Result<()> {
        validate_identifier("migrate_table", table)
    }

    /// The schema version becomes part of a file name.
    fn validate_schema_version(version: &str) -> Result<()> {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation {
                field: "schema_version".into(),
                message: "Cannot be empty or only whitespace".into(),
            });
        }

        if trimmed.contains(['/', '\\', '\0']) {
            return Err(Error::Validation {
                field: "schema_version".into(),
                message: "Cannot contain path separators or null bytes".into(),
            });
        }

        Ok(())
    }
}

/// Expands a leading `~/` to the user's home directory.
pub(crate) fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}
