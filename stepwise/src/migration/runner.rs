//! Migration batch execution.
//!
//! The runner walks the registry in order, skipping installed migrations and
//! running the rest on their own transactional handle. Outcomes are written
//! to the ledger through a separate autocommit handle.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::database::{Database, DatabaseConfig};
use crate::error::{Error, Result};

use super::hooks::{BackupRestore, CacheFlusher};
use super::lock::with_schema_lock;
use super::registry::{Migration, MigrationRegistry};

/// Default time spent retrying the initial connection.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Default pause between connection attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// What happened to one migration in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The ledger already recorded the migration as installed.
    AlreadyInstalled,
    /// The body returned `true` and its work was committed.
    Succeeded,
    /// The body returned `false` and its work was rolled back.
    Failed,
    /// The body returned an error or panicked; the batch stopped here.
    Aborted {
        /// The error or panic message.
        error: String,
        /// Where the migration was registered, as `file:line`.
        location: String,
    },
}

impl Outcome {
    /// Whether the outcome counts towards a successful batch.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::AlreadyInstalled | Self::Succeeded)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInstalled => f.write_str("already installed"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
            Self::Aborted { error, location } => write!(f, "aborted in {location}: {error}"),
        }
    }
}

/// The outcome of every migration a batch reached, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// `(name, outcome)` pairs.
    pub outcomes: Vec<(String, Outcome)>,
}

impl BatchReport {
    /// True if nothing aborted and every migration that ran returned true.
    ///
    /// An empty batch succeeds.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }

    /// Whether the batch stopped on an aborted migration.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, outcome)| matches!(outcome, Outcome::Aborted { .. }))
    }

    /// The outcome recorded for `name`, if the batch reached it.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Number of migrations that actually ran in this batch.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, Outcome::AlreadyInstalled))
            .count()
    }
}

/// Runs the migrations of a registry against the configured database.
///
/// # Examples
///
/// ```no_run
/// use stepwise::config::Settings;
/// use stepwise::migration::{MigrationRegistry, MigrationRunner};
/// use std::time::Duration;
///
/// let mut registry = MigrationRegistry::new();
/// registry
///     .register("create_users", |db| {
///         db.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY)")?;
///         Ok(true)
///     })
///     .unwrap();
///
/// let settings = Settings::new("sqlite://app.db");
/// let report = MigrationRunner::new(&registry, &settings)
///     .with_max_wait(Duration::from_secs(30))
///     .activate()
///     .unwrap();
/// assert!(report.succeeded());
/// ```
pub struct MigrationRunner<'a> {
    registry: &'a MigrationRegistry,
    settings: &'a Settings,
    max_wait: Duration,
    retry_interval: Duration,
    cache_flusher: Option<&'a dyn CacheFlusher>,
    backup_restore: Option<&'a dyn BackupRestore>,
}

impl<'a> MigrationRunner<'a> {
    /// Creates a runner with default timing and no collaborators.
    #[must_use]
    pub const fn new(registry: &'a MigrationRegistry, settings: &'a Settings) -> Self {
        Self {
            registry,
            settings,
            max_wait: DEFAULT_MAX_WAIT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            cache_flusher: None,
            backup_restore: None,
        }
    }

    /// Sets how long to keep retrying the initial connection.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Sets the pause between connection attempts.
    #[must_use]
    pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Flushes this cache after the batch when `redis_host` is configured.
    #[must_use]
    pub fn with_cache_flusher(mut self, flusher: &'a dyn CacheFlusher) -> Self {
        self.cache_flusher = Some(flusher);
        self
    }

    /// Restores from this backup when the ledger table is missing.
    #[must_use]
    pub fn with_backup_restore(mut self, restore: &'a dyn BackupRestore) -> Self {
        self.backup_restore = Some(restore);
        self
    }

    /// Runs every pending migration once.
    ///
    /// # Errors
    ///
    /// - [`Error::RequirementsNotMet`] if a pending migration's requirements
    ///   are not installed; nothing is written for it
    /// - [`Error::ConnectTimeout`] if the database cannot be reached in time
    /// - Database, I/O or [`Error::CacheFlush`] errors
    ///
    /// A migration returning `false`, an error, or panicking is not an
    /// error here; it shows up in the returned report.
    pub fn activate(&self) -> Result<BatchReport> {
        let ledger = connect_with_retry(
            self.settings,
            self.max_wait,
            self.retry_interval,
            self.backup_restore,
        )?;
        let mut report = BatchReport::default();

        for (name, migration) in self.registry.iter() {
            log::debug!("test: {name}");

            if !ledger.should_run(name)? {
                log::info!("{name}: already installed.");
                report
                    .outcomes
                    .push((name.to_string(), Outcome::AlreadyInstalled));
                continue;
            }

            let outcome = self.run_one(migration)?;
            match outcome {
                Outcome::Succeeded => ledger.mark_feature(name, true)?,
                Outcome::Failed => ledger.mark_feature(name, false)?,
                Outcome::AlreadyInstalled | Outcome::Aborted { .. } => {}
            }

            let aborted = matches!(outcome, Outcome::Aborted { .. });
            report.outcomes.push((name.to_string(), outcome));
            if aborted {
                break;
            }
        }

        ledger.close()?;
        self.flush_cache()?;

        Ok(report)
    }

    /// Runs the batch under the schema-version lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockExists`] if this schema version already
    /// completed, plus everything [`activate`](Self::activate) returns.
    pub fn run(&self) -> Result<bool> {
        with_schema_lock(self.settings, |_| {
            log::info!("{} migrations discovered", self.registry.len());
            let report = self.activate()?;
            if !report.succeeded() {
                return Err(Error::MigrationFailed);
            }
            log::info!("migration completed successfully, marking success.");
            Ok(true)
        })
    }

    fn run_one(&self, migration: &Migration) -> Result<Outcome> {
        let name = migration.name();
        let config = DatabaseConfig::from_settings(self.settings)?.for_migration(name);
        let db = Database::open(config)?;

        if let Err(e) = migration.check_requires(&db) {
            log::error!("{name}: {e}");
            if let Err(close) = db.close() {
                log::warn!("could not close handle for {name}: {close}");
            }
            return Err(e);
        }

        log::info!("run: {name}");
        let result = panic::catch_unwind(AssertUnwindSafe(|| migration.call(&db)));

        let outcome = match result {
            Ok(Ok(true)) => {
                db.commit()?;
                log::info!("ran: {name} successfully.");
                Outcome::Succeeded
            }
            Ok(Ok(false)) => {
                db.rollback()?;
                log::warn!("ran: {name} and failed.");
                Outcome::Failed
            }
            Ok(Err(e)) => Self::abort(name, migration, format!("{e:#}")),
            Err(payload) => Self::abort(name, migration, panic_message(payload.as_ref())),
        };

        db.close()?;
        Ok(outcome)
    }

    fn abort(name: &str, migration: &Migration, error: String) -> Outcome {
        let location = migration.location().to_string();
        log::error!("failed: {name} in {location}");
        log::error!("{error}");
        Outcome::Aborted { error, location }
    }

    fn flush_cache(&self) -> Result<()> {
        let Some(endpoint) = self.settings.redis_host.as_deref() else {
            return Ok(());
        };

        match self.cache_flusher {
            Some(flusher) => {
                let removed = flusher.flush_all(endpoint)?;
                log::info!("removed {removed} keys from {endpoint}");
            }
            None => log::warn!("no cache flusher configured, {endpoint} was not flushed"),
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "migration panicked".to_string()
    }
}

/// Opens the ledger handle, waiting for the database to become reachable.
///
/// A missing ledger table is not retried: `restore` gets one chance to
/// load a backup, and without one the ledger starts empty.
///
/// # Errors
///
/// - [`Error::ConnectTimeout`] once `max_wait` has passed
/// - [`Error::UnsupportedUri`] or [`Error::Validation`] immediately
/// - Errors from `restore` other than [`Error::BackupNotFound`]
pub fn connect_with_retry(
    settings: &Settings,
    max_wait: Duration,
    retry_interval: Duration,
    restore: Option<&dyn BackupRestore>,
) -> Result<Database> {
    let config = DatabaseConfig::from_settings(settings)?;
    let started = Instant::now();

    loop {
        match Database::open(config.clone()) {
            Ok(db) => {
                log::debug!(
                    "connected after {:.1} seconds",
                    started.elapsed().as_secs_f64()
                );
                return Ok(db);
            }
            Err(Error::LedgerUninitialized { table }) => {
                log::warn!("{table} not found, starting database restore");
                return recover(settings, &config, restore);
            }
            Err(e @ (Error::UnsupportedUri { .. } | Error::Validation { .. })) => return Err(e),
            Err(e) => {
                let elapsed = started.elapsed();
                if elapsed >= max_wait {
                    return Err(Error::ConnectTimeout {
                        seconds: max_wait.as_secs(),
                    });
                }
                let pause = retry_interval.min(max_wait - elapsed);
                log::warn!(
                    "database not available ({e}), retrying in {:.1}s",
                    pause.as_secs_f64()
                );
                thread::sleep(pause);
            }
        }
    }
}

fn recover(
    settings: &Settings,
    config: &DatabaseConfig,
    restore: Option<&dyn BackupRestore>,
) -> Result<Database> {
    if let Some(restore) = restore {
        log::info!("attempting recovery from a backup");
        match restore.restore(settings) {
            Ok(()) => match Database::open(config.clone()) {
                Ok(db) => return Ok(db),
                Err(Error::LedgerUninitialized { table }) => {
                    log::warn!("backup did not contain {table}, starting from scratch");
                }
                Err(e) => return Err(e),
            },
            Err(Error::BackupNotFound { path }) => {
                log::info!("{} not found, starting from scratch", path.display());
            }
            Err(e) => return Err(e),
        }
    } else {
        log::info!("no backup configured, starting from scratch");
    }

    Database::open(config.clone().create_ledger())
}

/// Runs a batch under the schema-version lock with default settings.
///
/// # Errors
///
/// See [`MigrationRunner::run`].
pub fn run_batch(settings: &Settings, registry: &MigrationRegistry) -> Result<bool> {
    MigrationRunner::new(registry, settings).run()
}
