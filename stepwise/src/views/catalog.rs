//! Registry of declared view types and their inverse edges.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

use super::node::{ViewKind, ViewMigration};

/// Checks that `kind` does not depend on itself, directly or transitively.
///
/// # Errors
///
/// Returns [`Error::ViewCycle`] naming the first node found on a cycle.
pub fn check_acyclic(kind: ViewKind) -> Result<()> {
    fn visit(
        kind: ViewKind,
        stack: &mut Vec<TypeId>,
        done: &mut HashSet<TypeId>,
    ) -> Result<()> {
        if stack.contains(&kind.type_id()) {
            return Err(Error::ViewCycle {
                view: kind.name().to_string(),
            });
        }
        if done.contains(&kind.type_id()) {
            return Ok(());
        }

        stack.push(kind.type_id());
        for dependency in kind.uses() {
            visit(dependency, stack, done)?;
        }
        stack.pop();
        done.insert(kind.type_id());
        Ok(())
    }

    visit(kind, &mut Vec::new(), &mut HashSet::new())
}

#[derive(Debug)]
struct Entry {
    kind: ViewKind,
    used_by: Vec<ViewKind>,
}

/// Declared view types with their `used_by` edges.
///
/// Declaring a type also declares everything it uses.
///
/// # Examples
///
/// ```
/// use stepwise::database::Database;
/// use stepwise::views::{ViewCatalog, ViewKind, ViewMigration};
///
/// #[derive(Default)]
/// struct Base;
/// impl ViewMigration for Base {
///     fn up(&mut self, _db: &Database) -> stepwise::Result<()> { Ok(()) }
///     fn down(&mut self, _db: &Database) -> stepwise::Result<()> { Ok(()) }
/// }
///
/// #[derive(Default)]
/// struct Child;
/// impl ViewMigration for Child {
///     fn uses() -> Vec<ViewKind> { vec![ViewKind::of::<Base>()] }
///     fn up(&mut self, _db: &Database) -> stepwise::Result<()> { Ok(()) }
///     fn down(&mut self, _db: &Database) -> stepwise::Result<()> { Ok(()) }
/// }
///
/// let mut catalog = ViewCatalog::new();
/// catalog.declare::<Child>().unwrap();
/// assert_eq!(catalog.used_by::<Base>(), vec![ViewKind::of::<Child>()]);
/// ```
#[derive(Debug, Default)]
pub struct ViewCatalog {
    entries: HashMap<TypeId, Entry>,
    order: Vec<TypeId>,
}

impl ViewCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `V` and its dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ViewCycle`] if `V` depends on itself; the catalog
    /// is unchanged in that case.
    pub fn declare<V: ViewMigration>(&mut self) -> Result<()> {
        self.declare_kind(ViewKind::of::<V>())
    }

    /// Declares a node type given as a value.
    ///
    /// # Errors
    ///
    /// See [`declare`](Self::declare).
    pub fn declare_kind(&mut self, kind: ViewKind) -> Result<()> {
        check_acyclic(kind)?;
        self.insert(kind);
        Ok(())
    }

    fn insert(&mut self, kind: ViewKind) {
        if self.entries.contains_key(&kind.type_id()) {
            return;
        }

        self.entries.insert(
            kind.type_id(),
            Entry {
                kind,
                used_by: Vec::new(),
            },
        );
        self.order.push(kind.type_id());

        for dependency in kind.uses() {
            self.insert(dependency);
            if let Some(entry) = self.entries.get_mut(&dependency.type_id()) {
                if !entry.used_by.contains(&kind) {
                    entry.used_by.push(kind);
                }
            }
        }
    }

    /// Types that declared `V` in their `uses`, in declaration order.
    #[must_use]
    pub fn used_by<V: ViewMigration>(&self) -> Vec<ViewKind> {
        self.dependents(ViewKind::of::<V>())
    }

    /// Types that declared `kind` in their `uses`.
    #[must_use]
    pub fn dependents(&self, kind: ViewKind) -> Vec<ViewKind> {
        self.entries
            .get(&kind.type_id())
            .map(|entry| entry.used_by.clone())
            .unwrap_or_default()
    }

    /// Whether `V` has been declared.
    #[must_use]
    pub fn contains<V: ViewMigration>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<V>())
    }

    /// Declared kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = ViewKind> + '_ {
        self.order.iter().filter_map(|id| self.entries.get(id).map(|e| e.kind))
    }

    /// Number of declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
