//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{CompletionsCommand, ListCommand, MarkCommand, RunCommand};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for running ordered database migrations.
#[derive(Parser)]
#[command(name = "stepwise")]
#[command(version, about = "Run ordered, ledger-tracked database migrations", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Read configuration from this file instead of discovering stepwise.yaml
    #[arg(long, value_name = "PATH", global = true, env = "STEPWISE_CONFIG")]
    pub config: Option<PathBuf>,

    /// How long to keep retrying the database connection (in seconds)
    #[arg(long, value_name = "SECONDS", global = true, env = "STEPWISE_MAX_WAIT")]
    pub max_wait: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Run every pending migration under the schema-version lock
    Run(RunCommand),

    /// Show the status of each registered migration
    List(ListCommand),

    /// Set a migration's ledger record by hand
    Mark(MarkCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
