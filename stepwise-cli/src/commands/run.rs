//! Run command implementation.
//!
//! This module implements the `run` command, which applies every pending
//! migration under the schema-version lock.

use crate::error::CliError;
use crate::utils::{load_settings, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use stepwise::migration::SqlFileRestore;
use stepwise::{MigrationRegistry, MigrationRunner};

/// Run every pending migration.
#[derive(Args)]
pub struct RunCommand {
    /// SQL dump to restore when the ledger table is missing
    /// (overrides `database_to_restore`)
    #[arg(long, value_name = "PATH", env = "STEPWISE_RESTORE_FROM")]
    pub restore_from: Option<PathBuf>,
}

impl RunCommand {
    /// Execute the run command.
    pub fn execute(
        self,
        global: &GlobalOptions,
        registry: &MigrationRegistry,
    ) -> Result<(), CliError> {
        let settings = load_settings(global)?;

        if registry.is_empty() {
            return Err(CliError::SemanticFailure(
                "no migrations registered".to_string(),
            ));
        }

        let restore = self
            .restore_from
            .or_else(|| settings.database_to_restore.clone())
            .map(SqlFileRestore::new);

        let mut runner = MigrationRunner::new(registry, &settings);
        if let Some(max_wait) = global.max_wait() {
            runner = runner.with_max_wait(max_wait);
        }
        if let Some(ref restore) = restore {
            runner = runner.with_backup_restore(restore);
        }

        match runner.run() {
            Ok(true) => {
                if !global.quiet {
                    eprintln!("Migration batch completed");
                }
                Ok(())
            }
            Ok(false) => Err(CliError::SemanticFailure(format!(
                "migration failed, check the {} table for details",
                settings.migrate_table
            ))),
            Err(e) if e.is_already_complete() => {
                if !global.quiet {
                    eprintln!("Nothing to do: {e}");
                }
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
