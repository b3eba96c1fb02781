//! View lifecycle management.
//!
//! Schema changes often cannot be made while views still read from the
//! objects being changed. View nodes describe how to drop and recreate such
//! views, the graph of views they build on, and the window of migration
//! history in which they exist. A [`ViewScope`] drops the relevant views
//! before a block and recreates them after it.
//!
//! Views are only recreated when the block succeeds. After a failure they
//! stay down.

mod catalog;
mod node;
mod scope;

pub use catalog::{check_acyclic, ViewCatalog};
pub use node::{ViewKind, ViewMigration};
pub use scope::ViewScope;
