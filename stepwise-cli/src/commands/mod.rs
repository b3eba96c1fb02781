//! CLI command implementations.
//!
//! - `run`: Apply pending migrations under the schema-version lock
//! - `list`: Show ledger status of registered migrations
//! - `mark`: Set a ledger record by hand
//! - `completions`: Generate shell completion scripts

pub mod completions;
pub mod list;
pub mod mark;
pub mod run;

pub use completions::CompletionsCommand;
pub use list::ListCommand;
pub use mark::MarkCommand;
pub use run::RunCommand;
