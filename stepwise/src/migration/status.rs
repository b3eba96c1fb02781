//! Ledger status of registered migrations.

use std::fmt;

use chrono::NaiveDateTime;

use crate::config::Settings;
use crate::database::{Database, DatabaseConfig};
use crate::error::{Error, Result};

use super::registry::MigrationRegistry;

/// Ledger state of one registered migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Recorded as installed.
    Succeeded,
    /// Recorded, but not installed.
    Failed,
    /// No ledger record.
    Missing,
}

impl MigrationState {
    /// Lowercase label used in listings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered migration joined with its ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migration name.
    pub name: String,
    /// Ledger state.
    pub state: MigrationState,
    /// When the ledger record last changed.
    pub last_update: Option<NaiveDateTime>,
}

/// Lists every registered migration, in run order, with its ledger state.
///
/// The database is opened read-only. A database file or ledger table that
/// does not exist yet reports every migration as missing.
///
/// # Errors
///
/// Returns an error if the URI is unsupported or the ledger cannot be read.
///
/// # Examples
///
/// ```no_run
/// use stepwise::config::Settings;
/// use stepwise::migration::{list_migrations, MigrationRegistry};
///
/// let registry = MigrationRegistry::new();
/// for status in list_migrations(&Settings::new("sqlite://app.db"), &registry).unwrap() {
///     println!("{} {}", status.name, status.state);
/// }
/// ```
pub fn list_migrations(
    settings: &Settings,
    registry: &MigrationRegistry,
) -> Result<Vec<MigrationStatus>> {
    let config = DatabaseConfig::from_settings(settings)?.read_only();

    let db = if config.path.exists() {
        match Database::open(config) {
            Ok(db) => Some(db),
            Err(Error::LedgerUninitialized { .. }) => None,
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    registry
        .iter()
        .map(|(name, _)| {
            let record = match &db {
                Some(db) => db.feature_record(name)?,
                None => None,
            };
            let (state, last_update) = match record {
                Some(r) if r.installed => (MigrationState::Succeeded, r.updated_at),
                Some(r) => (MigrationState::Failed, r.updated_at),
                None => (MigrationState::Missing, None),
            };
            Ok(MigrationStatus {
                name: name.to_string(),
                state,
                last_update,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mark_migration;
    use tempfile::TempDir;

    fn registry() -> MigrationRegistry {
        let mut registry = MigrationRegistry::new();
        for name in ["one", "two", "three"] {
            registry.register(name, |_| Ok(true)).unwrap();
        }
        registry
    }

    #[test]
    fn test_missing_database_lists_everything_missing() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::new(format!("sqlite://{}", dir.path().join("none.db").display()));

        let statuses = list_migrations(&settings, &registry()).unwrap();
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|s| s.state == MigrationState::Missing));
        assert!(!dir.path().join("none.db").exists());
    }

    #[test]
    fn test_states_follow_ledger() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::new(format!("sqlite://{}", dir.path().join("app.db").display()));
        let db = Database::open(
            DatabaseConfig::from_settings(&settings)
                .unwrap()
                .create_ledger(),
        )
        .unwrap();
        mark_migration(&db, "one", true).unwrap();
        mark_migration(&db, "two", false).unwrap();
        mark_migration(&db, "unregistered", true).unwrap();
        db.close().unwrap();

        let statuses = list_migrations(&settings, &registry()).unwrap();
        let states: Vec<_> = statuses.iter().map(|s| (s.name.as_str(), s.state)).collect();
        assert_eq!(
            states,
            vec![
                ("one", MigrationState::Succeeded),
                ("two", MigrationState::Failed),
                ("three", MigrationState::Missing),
            ]
        );
        assert!(statuses[0].last_update.is_some());
        assert!(statuses[2].last_update.is_none());
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(MigrationState::Succeeded.to_string(), "succeeded");
        assert_eq!(MigrationState::Missing.as_str(), "missing");
    }
}
