//! Database layer: `SQLite` handles and the feature ledger.
//!
//! Every migration body receives its own [`Database`] handle. The ledger
//! records which migrations are installed.
//!
//! # Examples
//!
//! ```no_run
//! use stepwise::database::{Database, DatabaseConfig};
//!
//! let db = Database::open(DatabaseConfig::new("/tmp/app.db").create_ledger()).unwrap();
//! if db.should_run("create_users").unwrap() {
//!     println!("create_users is pending");
//! }
//! ```

mod config;
mod connection;
mod ledger;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{parse_sqlite_uri, DatabaseConfig};
pub use connection::Database;
pub use ledger::{mark_migration, FeatureRecord};
pub use schema::Column;
