//! Demonstration migrations served by the `stepwise` binary.

use stepwise::{register_migration, Database, MigrationRegistry};

fn create_users_table(db: &Database) -> anyhow::Result<bool> {
    db.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            login TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )?;
    Ok(true)
}

fn add_password_column(db: &Database) -> anyhow::Result<bool> {
    db.execute_batch("ALTER TABLE users ADD COLUMN password_hash TEXT")?;
    Ok(true)
}

/// Registers the demonstration migrations.
pub fn register(registry: &mut MigrationRegistry) -> stepwise::Result<()> {
    let users = register_migration!(registry, create_users_table)?;
    register_migration!(registry, add_password_column, requires = [&users])?;
    Ok(())
}
