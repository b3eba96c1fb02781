//! CLI-specific error types with exit codes.
//!
//! This module defines error types specific to the CLI layer,
//! wrapping library errors and providing appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use stepwise::Error as LibError;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// Timed out waiting for the database.
    Timeout(u64),

    /// Flag directory missing and not allowed to create it.
    NoFlagDirectory(PathBuf),

    /// Configuration error.
    Config(String),

    /// Semantic failure (e.g., a migration reported failure) - exit code 1.
    SemanticFailure(String),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Semantic failure (batch failed, requirements not met)
    /// - 2: Timeout waiting for the database
    /// - 3: Flag directory not found
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Other library error
    /// - 7: Configuration error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SemanticFailure(_) => 1,
            CliError::Library(lib_err) => match lib_err {
                LibError::RequirementsNotMet { .. } | LibError::MigrationFailed => 1,
                _ => 6,
            },
            CliError::Timeout(_) => 2,
            CliError::NoFlagDirectory(_) => 3,
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Config(_) => 7,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Timeout(seconds) => {
                write!(f, "Timed out after {seconds} seconds waiting for the database")
            }
            CliError::NoFlagDirectory(path) => write!(
                f,
                "Flag directory {} not found (create it or set CREATE_FLAG_LOCATION)",
                path.display()
            ),
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CliError::SemanticFailure(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        match e {
            LibError::ConnectTimeout { seconds } => CliError::Timeout(seconds),
            LibError::MissingDirectory { path } => CliError::NoFlagDirectory(path),
            LibError::Validation { .. } | LibError::Configuration(_) => {
                CliError::Config(e.to_string())
            }
            LibError::Io(e) => CliError::Io(e),
            e => CliError::Library(e),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::SemanticFailure("x".into()).exit_code(), 1);
        assert_eq!(CliError::from(LibError::MigrationFailed).exit_code(), 1);
        assert_eq!(
            CliError::from(LibError::ConnectTimeout { seconds: 3 }).exit_code(),
            2
        );
        assert_eq!(
            CliError::from(LibError::MissingDirectory {
                path: PathBuf::from("/flags")
            })
            .exit_code(),
            3
        );
        assert_eq!(
            CliError::from(LibError::Validation {
                field: "migrate_uri".into(),
                message: "missing".into()
            })
            .exit_code(),
            7
        );
        assert_eq!(
            CliError::from(LibError::DuplicateName { name: "a".into() }).exit_code(),
            6
        );
    }
}
