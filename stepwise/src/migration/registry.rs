//! Ordered registry of migrations.
//!
//! Registration order is the run order, except that a migration with
//! requirements is pulled forward to sit directly after its latest
//! requirement.

use std::collections::HashSet;
use std::fmt;
use std::panic::Location;

use crate::database::Database;
use crate::error::{Error, Result};

/// The function a migration runs.
///
/// Returning `Ok(true)` commits the migration's work, `Ok(false)` rolls it
/// back and records the migration as failed. An `Err` aborts the batch.
pub type MigrationBody = Box<dyn Fn(&Database) -> anyhow::Result<bool>>;

/// A reference to a registered migration, returned by registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationHandle {
    name: String,
}

impl MigrationHandle {
    /// The registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MigrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A dependency of a migration, by name or by handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A migration referred to by name.
    Name(String),
    /// A migration referred to by the handle its registration returned.
    Handle(MigrationHandle),
}

impl Requirement {
    /// The name this requirement refers to.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Handle(handle) => handle.name(),
        }
    }
}

impl From<&str> for Requirement {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Requirement {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<MigrationHandle> for Requirement {
    fn from(handle: MigrationHandle) -> Self {
        Self::Handle(handle)
    }
}

impl From<&MigrationHandle> for Requirement {
    fn from(handle: &MigrationHandle) -> Self {
        Self::Handle(handle.clone())
    }
}

/// A registered migration.
pub struct Migration {
    name: String,
    requires: Vec<String>,
    body: MigrationBody,
    location: &'static Location<'static>,
}

impl Migration {
    /// The migration's unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the migrations that must be installed before this one runs.
    #[must_use]
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// Where the migration was registered.
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Checks that every requirement is recorded as installed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequirementsNotMet`] listing the requirements that
    /// are absent or failed, or a database error if the ledger cannot be
    /// read.
    pub fn check_requires(&self, db: &Database) -> Result<()> {
        let installed = db.installed_among(&self.requires)?;
        if installed.len() < self.requires.len() {
            let missing = self
                .requires
                .iter()
                .filter(|name| !installed.contains(name))
                .cloned()
                .collect();
            return Err(Error::RequirementsNotMet {
                migration: self.name.clone(),
                missing,
            });
        }
        Ok(())
    }

    /// Runs the body against `db`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the body returns.
    pub fn call(&self, db: &Database) -> anyhow::Result<bool> {
        (self.body)(db)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("location", &format_args!("{}", self.location))
            .finish_non_exhaustive()
    }
}

/// Migrations in run order.
///
/// # Examples
///
/// ```
/// use stepwise::migration::MigrationRegistry;
///
/// let mut registry = MigrationRegistry::new();
/// let users = registry
///     .register("create_users", |db| {
///         db.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY)")?;
///         Ok(true)
///     })
///     .unwrap();
/// registry
///     .register_with_requires("seed_users", [&users], |_db| Ok(true))
///     .unwrap();
///
/// assert_eq!(registry.names(), vec!["create_users", "seed_users"]);
/// ```
#[derive(Default)]
pub struct MigrationRegistry {
    order: Vec<Migration>,
    names: HashSet<String>,
}

impl MigrationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a migration without requirements at the end of the order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if the name is taken.
    #[track_caller]
    pub fn register<F>(&mut self, name: impl Into<String>, body: F) -> Result<MigrationHandle>
    where
        F: Fn(&Database) -> anyhow::Result<bool> + 'static,
    {
        self.insert(
            name.into(),
            Vec::<Requirement>::new(),
            Box::new(body),
            Location::caller(),
        )
    }

    /// Registers a migration that runs after all of `requires`.
    ///
    /// The migration is placed directly after the requirement that is
    /// currently last in the order. An empty `requires` appends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if the name is taken, or
    /// [`Error::UnknownDependency`] if a requirement is not registered. The
    /// registry is unchanged on error.
    #[track_caller]
    pub fn register_with_requires<F, R>(
        &mut self,
        name: impl Into<String>,
        requires: R,
        body: F,
    ) -> Result<MigrationHandle>
    where
        F: Fn(&Database) -> anyhow::Result<bool> + 'static,
        R: IntoIterator,
        R::Item: Into<Requirement>,
    {
        self.insert(
            name.into(),
            requires.into_iter().map(Into::into).collect(),
            Box::new(body),
            Location::caller(),
        )
    }

    fn insert(
        &mut self,
        name: String,
        requires: Vec<Requirement>,
        body: MigrationBody,
        location: &'static Location<'static>,
    ) -> Result<MigrationHandle> {
        if self.names.contains(&name) {
            return Err(Error::DuplicateName { name });
        }

        let mut rank = if requires.is_empty() {
            self.order.len()
        } else {
            0
        };
        let mut names = Vec::with_capacity(requires.len());
        for requirement in &requires {
            let dependency = requirement.name();
            let position = self
                .position(dependency)
                .ok_or_else(|| Error::UnknownDependency {
                    name: name.clone(),
                    dependency: dependency.to_string(),
                })?;
            rank = rank.max(position + 1);
            if !names.iter().any(|n| n == dependency) {
                names.push(dependency.to_string());
            }
        }

        log::debug!("registered {name} at rank {rank}");
        self.names.insert(name.clone());
        self.order.insert(
            rank,
            Migration {
                name: name.clone(),
                requires: names,
                body,
                location,
            },
        );

        Ok(MigrationHandle { name })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|m| m.name == name)
    }

    /// Migrations in run order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Migration)> {
        self.order.iter().map(|m| (m.name(), m))
    }

    /// Looks up a migration by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Migration> {
        self.order.iter().find(|m| m.name == name)
    }

    /// Whether a migration with this name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of registered migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names in run order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(Migration::name).collect()
    }

    /// Removes every migration.
    pub fn reset(&mut self) {
        self.order.clear();
        self.names.clear();
    }
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Registers a function under its own name.
///
/// # Examples
///
/// ```
/// use stepwise::database::Database;
/// use stepwise::migration::MigrationRegistry;
/// use stepwise::register_migration;
///
/// fn create_users(db: &Database) -> anyhow::Result<bool> {
///     db.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY)")?;
///     Ok(true)
/// }
///
/// fn seed_users(_db: &Database) -> anyhow::Result<bool> {
///     Ok(true)
/// }
///
/// let mut registry = MigrationRegistry::new();
/// register_migration!(registry, create_users).unwrap();
/// register_migration!(registry, seed_users, requires = ["create_users"]).unwrap();
/// assert!(registry.has("seed_users"));
/// ```
#[macro_export]
macro_rules! register_migration {
    ($registry:expr, $func:ident) => {
        $registry.register(stringify!($func), $func)
    };
    ($registry:expr, $func:ident, requires = [$($req:expr),* $(,)?]) => {
        $registry.register_with_requires(
            stringify!($func),
            [$($crate::migration::Requirement::from($req)),*],
            $func,
        )
    };
}
