//! Main entry point for the stepwise CLI.
//!
//! This binary registers a small set of demonstration migrations and serves
//! the standard commands:
//! - `run`: Apply pending migrations
//! - `list`: Show migration status
//! - `mark`: Set a ledger record by hand
//! - `completions`: Generate shell completion scripts

mod demo;

use stepwise::MigrationRegistry;

fn main() {
    let mut registry = MigrationRegistry::new();
    if let Err(e) = demo::register(&mut registry) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    std::process::exit(stepwise_cli::main_with(&registry));
}
