//! List command implementation.
//!
//! This module implements the `list` command, which displays the ledger
//! status of every registered migration in various formats (table, JSON,
//! CSV).

use crate::error::CliError;
use crate::utils::{format_timestamp, load_settings, GlobalOptions};
use clap::{Args, ValueEnum};
use std::io::Write;
use stepwise::migration::MigrationStatus;
use stepwise::{list_migrations, MigrationRegistry};

/// Column headers for CSV output.
const COLUMN_HEADERS: [&str; 3] = ["name", "status", "last_update"];

/// Show migration status.
#[derive(Args)]
pub struct ListCommand {
    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "table",
        env = "STEPWISE_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,
}

/// Output format for list command.
#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated table format (human-readable)
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(
        self,
        global: &GlobalOptions,
        registry: &MigrationRegistry,
    ) -> Result<(), CliError> {
        let settings = load_settings(global)?;
        let statuses = list_migrations(&settings, registry)?;

        match self.format {
            OutputFormat::Table => format_as_table(&statuses)?,
            OutputFormat::Json => format_as_json(&statuses)?,
            OutputFormat::Csv => format_as_csv(&statuses)?,
        }

        Ok(())
    }
}

/// Format statuses as a human-readable table.
fn format_as_table(statuses: &[MigrationStatus]) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let width = statuses
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0)
        .max(COLUMN_HEADERS[0].len());

    writeln!(handle, "{:<width$}\tSTATUS\tLAST UPDATE", "NAME")?;
    for status in statuses {
        writeln!(
            handle,
            "{:<width$}\t{}\t{}",
            status.name,
            status.state,
            status
                .last_update
                .map_or_else(|| "-".to_string(), format_timestamp),
        )?;
    }

    Ok(())
}

/// Format statuses as JSON.
fn format_as_json(statuses: &[MigrationStatus]) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let json_data: Vec<serde_json::Value> = statuses
        .iter()
        .map(|s| {
            serde_json::json!({
                "name": s.name,
                "status": s.state.as_str(),
                "last_update": s.last_update.map(format_timestamp),
            })
        })
        .collect();

    serde_json::to_writer_pretty(&mut handle, &json_data)
        .map_err(|e| CliError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    writeln!(handle)?;

    Ok(())
}

/// Convert `csv::Error` to `CliError`.
fn csv_error(e: csv::Error) -> CliError {
    CliError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Format statuses as CSV.
fn format_as_csv(statuses: &[MigrationStatus]) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let handle = stdout.lock();
    let mut writer = csv::Writer::from_writer(handle);

    writer.write_record(COLUMN_HEADERS).map_err(csv_error)?;
    for status in statuses {
        writer
            .write_record([
                status.name.as_str(),
                status.state.as_str(),
                status
                    .last_update
                    .map(format_timestamp)
                    .unwrap_or_default()
                    .as_str(),
            ])
            .map_err(csv_error)?;
    }

    writer.flush()?;

    Ok(())
}
