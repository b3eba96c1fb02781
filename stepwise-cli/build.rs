//! Build script for stepwise-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
fn build_cli() -> Command {
    Command::new("stepwise")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run ordered, ledger-tracked database migrations")
        .long_about(
            "Apply registered database migrations in dependency order, recording each outcome in a feature ledger table",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Read configuration from this file instead of discovering stepwise.yaml")
                .value_name("PATH")
                .global(true)
                .env("STEPWISE_CONFIG"),
        )
        .arg(
            Arg::new("max-wait")
                .long("max-wait")
                .help("How long to keep retrying the database connection (in seconds)")
                .value_name("SECONDS")
                .global(true)
                .env("STEPWISE_MAX_WAIT"),
        )
        .subcommands(vec![
            Command::new("run")
                .about("Run every pending migration under the schema-version lock")
                .long_about(
                    "Apply pending migrations in rank order; a completed schema version is skipped",
                ),
            Command::new("list")
                .about("Show the status of each registered migration")
                .long_about("Display each registered migration with its ledger state"),
            Command::new("mark")
                .about("Set a migration's ledger record by hand")
                .long_about("Record a migration as installed, or as failed with --failed"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("stepwise.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
