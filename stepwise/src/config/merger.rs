//! Configuration merging and precedence handling.

use crate::config::schema::Config;

/// Merges configuration layers according to precedence rules.
///
/// # Examples
///
/// ```
/// use stepwise::config::{Config, ConfigMerger};
///
/// let low = Config { migrate_table: Some("low".to_string()), ..Default::default() };
/// let high = Config { migrate_table: Some("high".to_string()), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.migrate_table, Some("high".to_string()));
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge layers ordered from lowest to highest precedence.
    #[must_use]
    pub fn merge(layers: Vec<Config>) -> Config {
        let mut result = Config::default();
        for layer in &layers {
            Self::merge_into(&mut result, layer);
        }
        result
    }

    /// Merge source config into target; every `Some` in source wins.
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.migrate_uri.is_some() {
            target.migrate_uri.clone_from(&source.migrate_uri);
        }

        if source.schema_version.is_some() {
            target.schema_version.clone_from(&source.schema_version);
        }

        if source.redis_host.is_some() {
            target.redis_host.clone_from(&source.redis_host);
        }

        if source.migrate_table.is_some() {
            target.migrate_table.clone_from(&source.migrate_table);
        }

        if source.flag_location.is_some() {
            target.flag_location.clone_from(&source.flag_location);
        }

        if source.create_flag_location.is_some() {
            target.create_flag_location = source.create_flag_location;
        }

        if source.database_to_restore.is_some() {
            target
                .database_to_restore
                .clone_from(&source.database_to_restore);
        }
    }
}
