//! Command-line front-end for stepwise.
//!
//! Applications register their migrations and hand the registry to
//! [`main_with`], which parses the command line, runs the chosen command and
//! returns the process exit code.
//!
//! ```no_run
//! use stepwise::MigrationRegistry;
//!
//! let mut registry = MigrationRegistry::new();
//! registry.register("create_users", |db| {
//!     db.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY)")?;
//!     Ok(true)
//! }).unwrap();
//!
//! std::process::exit(stepwise_cli::main_with(&registry));
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
pub use error::CliError;

use clap::Parser;
use stepwise::MigrationRegistry;
use utils::GlobalOptions;

/// Run a parsed command line against `registry`.
pub fn run(cli: Cli, registry: &MigrationRegistry) -> Result<(), CliError> {
    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        max_wait: cli.max_wait,
    };

    match cli.command {
        cli::Command::Run(cmd) => cmd.execute(&global, registry),
        cli::Command::List(cmd) => cmd.execute(&global, registry),
        cli::Command::Mark(cmd) => cmd.execute(&global, registry),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    }
}

/// Parse the process arguments, run the command and return an exit code.
pub fn main_with(registry: &MigrationRegistry) -> i32 {
    let cli = Cli::parse();

    let _level = stepwise::init_logger(cli.verbose, cli.quiet);

    match run(cli, registry) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}
