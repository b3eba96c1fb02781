//! View node declarations.
//!
//! A view node is a type describing a reversible schema object: `down`
//! removes it so a migration can change what it reads from, `up` puts it
//! back afterwards.

use std::any::{type_name, TypeId};
use std::fmt;

use crate::database::Database;
use crate::error::Result;

/// A reversible view, dropped before and recreated after a protected block.
///
/// # Examples
///
/// ```
/// use stepwise::database::Database;
/// use stepwise::views::{ViewKind, ViewMigration};
///
/// #[derive(Default)]
/// struct UserNames;
///
/// impl ViewMigration for UserNames {
///     fn up(&mut self, db: &Database) -> stepwise::Result<()> {
///         db.execute_batch("CREATE VIEW user_names AS SELECT name FROM users")
///     }
///
///     fn down(&mut self, db: &Database) -> stepwise::Result<()> {
///         db.execute_batch("DROP VIEW user_names")
///     }
/// }
///
/// #[derive(Default)]
/// struct ShortUserNames;
///
/// impl ViewMigration for ShortUserNames {
///     fn uses() -> Vec<ViewKind> {
///         vec![ViewKind::of::<UserNames>()]
///     }
///
///     fn since() -> Option<&'static str> {
///         Some("create_users")
///     }
///
///     fn up(&mut self, db: &Database) -> stepwise::Result<()> {
///         db.execute_batch(
///             "CREATE VIEW short_user_names AS SELECT name FROM user_names WHERE length(name) < 5",
///         )
///     }
///
///     fn down(&mut self, db: &Database) -> stepwise::Result<()> {
///         db.execute_batch("DROP VIEW short_user_names")
///     }
/// }
/// ```
pub trait ViewMigration: Default + 'static {
    /// View types this one depends on, in build-up order.
    fn uses() -> Vec<ViewKind> {
        Vec::new()
    }

    /// Migration that must have run (or be running) for this view to exist.
    fn since() -> Option<&'static str> {
        None
    }

    /// Migration after which this view no longer exists.
    fn until() -> Option<&'static str> {
        None
    }

    /// Creates the view.
    ///
    /// # Errors
    ///
    /// Returns an error if the statements fail.
    fn up(&mut self, db: &Database) -> Result<()>;

    /// Drops the view.
    ///
    /// # Errors
    ///
    /// Returns an error if the statements fail.
    fn down(&mut self, db: &Database) -> Result<()>;
}

pub(crate) trait ErasedView {
    fn up(&mut self, db: &Database) -> Result<()>;
    fn down(&mut self, db: &Database) -> Result<()>;
}

impl<V: ViewMigration> ErasedView for V {
    fn up(&mut self, db: &Database) -> Result<()> {
        ViewMigration::up(self, db)
    }

    fn down(&mut self, db: &Database) -> Result<()> {
        ViewMigration::down(self, db)
    }
}

fn create<V: ViewMigration>() -> Box<dyn ErasedView> {
    Box::new(V::default())
}

/// A view node type, usable as a value.
#[derive(Clone, Copy)]
pub struct ViewKind {
    type_id: TypeId,
    name: &'static str,
    uses: fn() -> Vec<ViewKind>,
    since: fn() -> Option<&'static str>,
    until: fn() -> Option<&'static str>,
    pub(crate) create: fn() -> Box<dyn ErasedView>,
}

impl ViewKind {
    /// The kind describing `V`.
    #[must_use]
    pub fn of<V: ViewMigration>() -> Self {
        Self {
            type_id: TypeId::of::<V>(),
            name: short_name(type_name::<V>()),
            uses: V::uses,
            since: V::since,
            until: V::until,
            create: create::<V>,
        }
    }

    /// Identity of the node type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name without its module path.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Dependencies in declaration order.
    #[must_use]
    pub fn uses(&self) -> Vec<ViewKind> {
        (self.uses)()
    }

    /// See [`ViewMigration::since`].
    #[must_use]
    pub fn since(&self) -> Option<&'static str> {
        (self.since)()
    }

    /// See [`ViewMigration::until`].
    #[must_use]
    pub fn until(&self) -> Option<&'static str> {
        (self.until)()
    }

    /// Whether the view exists at this point of the migration history.
    ///
    /// `since` must be the migration `db` was opened for or already
    /// installed, and `until` must not be installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub fn is_relevant(&self, db: &Database) -> Result<bool> {
        if let Some(since) = self.since() {
            if db.current_migration() != Some(since) && !db.is_installed(since)? {
                return Ok(false);
            }
        }

        if let Some(until) = self.until() {
            if db.is_installed(until)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl PartialEq for ViewKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ViewKind {}

impl fmt::Debug for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ViewKind").field(&self.name).finish()
    }
}

fn short_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}
