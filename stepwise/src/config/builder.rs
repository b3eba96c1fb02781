//! Layered configuration builder.

use std::path::{Path, PathBuf};

use crate::config::environment::EnvironmentConfig;
use crate::config::loader::ConfigLoader;
use crate::config::merger::ConfigMerger;
use crate::config::schema::{Config, Settings};
use crate::config::validator::ConfigValidator;
use crate::error::Result;

/// Builds [`Settings`] from files, the environment and code.
///
/// # Examples
///
/// ```
/// use stepwise::config::{Config, ConfigBuilder};
///
/// let settings = ConfigBuilder::new()
///     .skip_files()
///     .skip_env()
///     .with_config(Config {
///         migrate_uri: Some("sqlite://app.db".into()),
///         ..Default::default()
///     })
///     .build()
///     .unwrap();
/// assert_eq!(settings.migrate_uri, "sqlite://app.db");
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    working_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
    overrides: Option<Config>,
    skip_files: bool,
    skip_env: bool,
}

impl ConfigBuilder {
    /// Creates a builder that reads files from the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover `stepwise.yaml` from this directory instead of the cwd.
    #[must_use]
    pub fn with_working_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// Read this file instead of discovering one.
    #[must_use]
    pub fn with_config_file(mut self, path: &Path) -> Self {
        self.config_file = Some(path.to_path_buf());
        self
    }

    /// Values that take precedence over every other source.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.overrides = Some(config);
        self
    }

    /// Do not read configuration files.
    #[must_use]
    pub fn skip_files(mut self) -> Self {
        self.skip_files = true;
        self
    }

    /// Do not read environment variables.
    #[must_use]
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Merge all sources and resolve them into settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed, an environment value is
    /// invalid, or the merged configuration fails validation.
    pub fn build(self) -> Result<Settings> {
        let mut layers = Vec::new();

        if !self.skip_files {
            let working_dir = match self.working_dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            if let Some(source) = ConfigLoader::load(&working_dir, self.config_file.as_deref())? {
                log::debug!("loaded configuration from {}", source.path.display());
                layers.push(source.config);
            }
        }

        if !self.skip_env {
            let mut env_layer = Config::default();
            EnvironmentConfig::apply_overrides(&mut env_layer)?;
            layers.push(env_layer);
        }

        if let Some(overrides) = self.overrides {
            layers.push(overrides);
        }

        ConfigValidator::resolve(ConfigMerger::merge(layers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_requires_uri() {
        let result = ConfigBuilder::new().skip_files().skip_env().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_file_layer() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("stepwise.yaml"),
            "migrate_uri: sqlite://file.db\nschema_version: 4\n",
        )
        .unwrap();

        let settings = ConfigBuilder::new()
            .with_working_dir(dir.path())
            .skip_env()
            .build()
            .unwrap();
        assert_eq!(settings.migrate_uri, "sqlite://file.db");
        assert_eq!(settings.schema_version.as_deref(), Some("4"));
    }

    #[test]
    fn test_overrides_beat_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("custom.yaml");
        fs::write(&file, "migrate_uri: sqlite://file.db\n").unwrap();

        let settings = ConfigBuilder::new()
            .with_config_file(&file)
            .skip_env()
            .with_config(Config {
                migrate_uri: Some("sqlite://code.db".into()),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(settings.migrate_uri, "sqlite://code.db");
    }

    #[test]
    #[serial]
    fn test_env_beats_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("stepwise.yaml"),
            "migrate_uri: sqlite://file.db\nmigrate_table: from_file\n",
        )
        .unwrap();
        std::env::set_var("MIGRATE_TABLE", "from_env");

        let settings = ConfigBuilder::new()
            .with_working_dir(dir.path())
            .build();
        std::env::remove_var("MIGRATE_TABLE");

        assert_eq!(settings.unwrap().migrate_table, "from_env");
    }
}
