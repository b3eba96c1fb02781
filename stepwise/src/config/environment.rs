//! Environment variable handling for configuration overrides.
//!
//! Recognized variables: `MIGRATE_URI` (or `DB_URI`), `SCHEMA_VERSION`,
//! `REDIS_HOST`, `MIGRATE_TABLE`, `FLAG_LOCATION`, `CREATE_FLAG_LOCATION`
//! and `DATABASE_TO_RESTORE`.

use crate::config::schema::Config;
use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use stepwise::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean variable holds an unrecognized value.
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Some(uri) = Self::non_empty("MIGRATE_URI").or_else(|| Self::non_empty("DB_URI")) {
            config.migrate_uri = Some(uri);
        }

        if let Some(version) = Self::non_empty("SCHEMA_VERSION") {
            config.schema_version = Some(version);
        }

        if let Some(host) = Self::non_empty("REDIS_HOST") {
            config.redis_host = Some(host);
        }

        if let Some(table) = Self::non_empty("MIGRATE_TABLE") {
            config.migrate_table = Some(table);
        }

        if let Some(location) = Self::non_empty("FLAG_LOCATION") {
            config.flag_location = Some(PathBuf::from(location));
        }

        if let Some(val) = Self::non_empty("CREATE_FLAG_LOCATION") {
            config.create_flag_location = Some(Self::parse_bool("CREATE_FLAG_LOCATION", &val)?);
        }

        if let Some(dump) = Self::non_empty("DATABASE_TO_RESTORE") {
            config.database_to_restore = Some(PathBuf::from(dump));
        }

        Ok(())
    }

    fn non_empty(name: &str) -> Option<String> {
        env::var(name).ok().filter(|value| !value.trim().is_empty())
    }

    /// Parse a boolean value from an environment variable.
    fn parse_bool(field: &str, s: &str) -> Result<bool> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::Validation {
                field: field.into(),
                message: format!(
                    "Invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 8] = [
        "MIGRATE_URI",
        "DB_URI",
        "SCHEMA_VERSION",
        "REDIS_HOST",
        "MIGRATE_TABLE",
        "FLAG_LOCATION",
        "CREATE_FLAG_LOCATION",
        "DATABASE_TO_RESTORE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_bool_variants() {
        assert!(EnvironmentConfig::parse_bool("test", "TRUE").unwrap());
        assert!(EnvironmentConfig::parse_bool("test", "on").unwrap());
        assert!(!EnvironmentConfig::parse_bool("test", "0").unwrap());
        assert!(!EnvironmentConfig::parse_bool("test", "No").unwrap());
        assert!(EnvironmentConfig::parse_bool("test", "maybe").is_err());
    }

    #[test]
    #[serial]
    fn test_overrides_applied() {
        clear_env();
        env::set_var("MIGRATE_URI", "sqlite://env.db");
        env::set_var("SCHEMA_VERSION", "2");
        env::set_var("CREATE_FLAG_LOCATION", "yes");
        env::set_var("DATABASE_TO_RESTORE", "/backups/dump.sql");

        let mut config = Config {
            migrate_uri: Some("sqlite://file.db".into()),
            ..Default::default()
        };
        EnvironmentConfig::apply_overrides(&mut config).unwrap();

        assert_eq!(config.migrate_uri.as_deref(), Some("sqlite://env.db"));
        assert_eq!(config.schema_version.as_deref(), Some("2"));
        assert_eq!(config.create_flag_location, Some(true));
        assert_eq!(
            config.database_to_restore,
            Some(PathBuf::from("/backups/dump.sql"))
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_db_uri_fallback() {
        clear_env();
        env::set_var("DB_URI", "sqlite://storage.sqlite");

        let mut config = Config::default();
        EnvironmentConfig::apply_overrides(&mut config).unwrap();
        assert_eq!(config.migrate_uri.as_deref(), Some("sqlite://storage.sqlite"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_empty_values_ignored() {
        clear_env();
        env::set_var("REDIS_HOST", "  ");

        let mut config = Config::default();
        EnvironmentConfig::apply_overrides(&mut config).unwrap();
        assert!(config.redis_host.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_bool_is_error() {
        clear_env();
        env::set_var("CREATE_FLAG_LOCATION", "sometimes");

        let mut config = Config::default();
        assert!(EnvironmentConfig::apply_overrides(&mut config).is_err());
        clear_env();
    }
}
