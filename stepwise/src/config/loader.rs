//! Configuration file discovery and loading.
//!
//! This module finds the `stepwise.yaml` file that applies to a working
//! directory and parses it.

use crate::config::schema::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when discovering configuration.
pub const CONFIG_FILE_NAME: &str = "stepwise.yaml";

/// A configuration file with its parsed contents.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the configuration file.
    pub path: PathBuf,
    /// Parsed configuration.
    pub config: Config,
}

/// Loads configuration from files.
///
/// # Examples
///
/// ```no_run
/// use stepwise::config::ConfigLoader;
/// use std::path::Path;
///
/// if let Some(source) = ConfigLoader::discover(Path::new(".")).unwrap() {
///     println!("using {}", source.path.display());
/// }
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Find the nearest `stepwise.yaml`, walking up from `start_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a discovered file cannot be read or parsed.
    pub fn discover(start_dir: &Path) -> Result<Option<ConfigSource>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                let config = Self::load_file(&candidate)?;
                return Ok(Some(ConfigSource {
                    path: candidate,
                    config,
                }));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Load an explicitly named file, or discover one from `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing, or if any file
    /// cannot be read or parsed.
    pub fn load(working_dir: &Path, explicit: Option<&Path>) -> Result<Option<ConfigSource>> {
        match explicit {
            Some(path) => Ok(Some(ConfigSource {
                path: path.to_path_buf(),
                config: Self::load_file(path)?,
            })),
            None => Self::discover(working_dir),
        }
    }

    /// Load and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the YAML is invalid.
    pub fn load_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path).map_err(|e| Error::Validation {
            field: format!("{}", path.display()),
            message: format!("Failed to read configuration file: {e}"),
        })?;

        serde_yaml::from_str(&contents).map_err(|e| Error::Validation {
            field: format!("{}", path.display()),
            message: format!("Invalid YAML: {e}"),
        })
    }
}
