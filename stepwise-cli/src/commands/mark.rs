//! Mark command implementation.
//!
//! This module implements the `mark` command, which sets a migration's
//! ledger record without running it.

use crate::error::CliError;
use crate::utils::{load_settings, open_ledger, GlobalOptions};
use clap::Args;
use stepwise::{mark_migration, MigrationRegistry};

/// Set a migration's ledger record by hand.
#[derive(Args)]
pub struct MarkCommand {
    /// Name of a registered migration
    pub name: String,

    /// Record the migration as failed instead of installed
    #[arg(long)]
    pub failed: bool,
}

impl MarkCommand {
    /// Execute the mark command.
    pub fn execute(
        self,
        global: &GlobalOptions,
        registry: &MigrationRegistry,
    ) -> Result<(), CliError> {
        if !registry.has(&self.name) {
            return Err(CliError::InvalidArguments(format!(
                "no migration named '{}' is registered",
                self.name
            )));
        }

        let settings = load_settings(global)?;
        let db = open_ledger(&settings)?;
        mark_migration(&db, &self.name, !self.failed)?;
        db.close()?;

        if !global.quiet {
            let state = if self.failed { "failed" } else { "installed" };
            eprintln!("Marked {} as {state}", self.name);
        }

        Ok(())
    }
}
