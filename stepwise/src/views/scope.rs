//! Composite view scopes.
//!
//! A [`ViewScope`] takes views down before a block of migration code and
//! brings them back up afterwards. Every node type reached from the scope's
//! roots gets exactly one instance, so a view shared by several roots goes
//! down and up once.

use std::any::TypeId;
use std::collections::HashMap;

use crate::database::Database;
use crate::error::Result;

use super::catalog::check_acyclic;
use super::node::{ErasedView, ViewKind, ViewMigration};

struct Slot {
    kind: ViewKind,
    instance: Box<dyn ErasedView>,
    relevant: bool,
    entered: bool,
    may_go_up: bool,
}

/// Views held down for the duration of a block.
///
/// # Examples
///
/// ```no_run
/// use stepwise::database::Database;
/// use stepwise::views::{ViewMigration, ViewScope};
///
/// #[derive(Default)]
/// struct UserNames;
///
/// impl ViewMigration for UserNames {
///     fn up(&mut self, db: &Database) -> stepwise::Result<()> {
///         db.execute_batch("CREATE VIEW user_names AS SELECT name FROM users")
///     }
///     fn down(&mut self, db: &Database) -> stepwise::Result<()> {
///         db.execute_batch("DROP VIEW user_names")
///     }
/// }
///
/// fn widen_names(db: &Database) -> anyhow::Result<bool> {
///     ViewScope::new(db).with::<UserNames>().run(|db| {
///         db.execute_batch("ALTER TABLE users RENAME COLUMN name TO full_name")?;
///         db.execute_batch("ALTER TABLE users ADD COLUMN name TEXT")?;
///         Ok(())
///     })?;
///     Ok(true)
/// }
/// ```
pub struct ViewScope<'db> {
    db: &'db Database,
    roots: Vec<ViewKind>,
    slots: Vec<Slot>,
    index: HashMap<TypeId, usize>,
}

impl<'db> ViewScope<'db> {
    /// Creates an empty scope on `db`.
    #[must_use]
    pub fn new(db: &'db Database) -> Self {
        Self {
            db,
            roots: Vec::new(),
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds `V` as a root of the scope.
    #[must_use]
    pub fn with<V: ViewMigration>(self) -> Self {
        self.with_kind(ViewKind::of::<V>())
    }

    /// Adds a root given as a value.
    #[must_use]
    pub fn with_kind(mut self, kind: ViewKind) -> Self {
        self.roots.push(kind);
        self
    }

    /// Takes every relevant view down.
    ///
    /// Roots are entered in the order they were added. Entering a node
    /// enters its `uses` in reverse declaration order, then calls its
    /// `down`. A node type is entered at most once per scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ViewCycle`](crate::Error::ViewCycle) before any view
    /// goes down if a root depends on itself, or the first error from the
    /// ledger or a `down` call.
    pub fn enter(&mut self) -> Result<()> {
        for root in &self.roots {
            check_acyclic(*root)?;
        }

        for root in self.roots.clone() {
            self.enter_kind(root)?;
        }
        Ok(())
    }

    /// Brings every view taken down by [`enter`](Self::enter) back up.
    ///
    /// Roots are exited in reverse order. Exiting a node calls its `up`,
    /// then exits its `uses` in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the first error from an `up` call.
    pub fn exit(&mut self) -> Result<()> {
        for root in self.roots.clone().into_iter().rev() {
            self.exit_kind(root)?;
        }
        Ok(())
    }

    /// Runs `block` with the views down, bringing them back up if it
    /// succeeds.
    ///
    /// If `block` fails, the views stay down and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns errors from [`enter`](Self::enter), `block`, or
    /// [`exit`](Self::exit).
    pub fn run<T, F>(mut self, block: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T>,
    {
        self.enter()?;

        match block(self.db) {
            Ok(value) => {
                self.exit()?;
                Ok(value)
            }
            Err(e) => {
                log::warn!(
                    "leaving {} view(s) down after a failed block",
                    self.pending()
                );
                Err(e)
            }
        }
    }

    /// Number of views currently down and waiting to go back up.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.may_go_up).count()
    }

    fn slot(&mut self, kind: ViewKind) -> Result<usize> {
        if let Some(&idx) = self.index.get(&kind.type_id()) {
            return Ok(idx);
        }

        let relevant = kind.is_relevant(self.db)?;
        let idx = self.slots.len();
        self.slots.push(Slot {
            kind,
            instance: (kind.create)(),
            relevant,
            entered: false,
            may_go_up: false,
        });
        self.index.insert(kind.type_id(), idx);
        Ok(idx)
    }

    fn enter_kind(&mut self, kind: ViewKind) -> Result<()> {
        let idx = self.slot(kind)?;
        if self.slots[idx].entered {
            return Ok(());
        }
        self.slots[idx].entered = true;

        if !self.slots[idx].relevant {
            log::debug!("{}: not relevant, skipping", kind.name());
            return Ok(());
        }

        for dependency in kind.uses().into_iter().rev() {
            self.enter_kind(dependency)?;
        }

        log::debug!("{}: down", kind.name());
        let slot = &mut self.slots[idx];
        slot.instance.down(self.db)?;
        slot.may_go_up = true;
        Ok(())
    }

    fn exit_kind(&mut self, kind: ViewKind) -> Result<()> {
        let Some(&idx) = self.index.get(&kind.type_id()) else {
            return Ok(());
        };

        let slot = &mut self.slots[idx];
        if !slot.relevant || !slot.may_go_up {
            return Ok(());
        }

        log::debug!("{}: up", slot.kind.name());
        slot.instance.up(self.db)?;
        slot.may_go_up = false;

        for dependency in kind.uses() {
            self.exit_kind(dependency)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::create_test_database;
    use crate::database::mark_migration;
    use crate::error::Error;
    use std::cell::RefCell;

    thread_local! {
        static CALLS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn record(call: String) {
        CALLS.with(|calls| calls.borrow_mut().push(call));
    }

    fn take_calls() -> Vec<String> {
        CALLS.with(|calls| calls.borrow_mut().drain(..).collect())
    }

    macro_rules! view {
        ($name:ident $(, uses = [$($dep:ident),*])? $(, since = $since:literal)?) => {
            #[derive(Default)]
            struct $name;

            impl ViewMigration for $name {
                $(fn uses() -> Vec<ViewKind> {
                    vec![$(ViewKind::of::<$dep>()),*]
                })?
                $(fn since() -> Option<&'static str> {
                    Some($since)
                })?
                fn up(&mut self, _db: &Database) -> Result<()> {
                    record(format!("{}.up", stringify!($name)));
                    Ok(())
                }
                fn down(&mut self, _db: &Database) -> Result<()> {
                    record(format!("{}.down", stringify!($name)));
                    Ok(())
                }
            }
        };
    }

    view!(Base);
    view!(Child, uses = [Base]);
    view!(NodeA);
    view!(NodeB);
    view!(NodeC, uses = [NodeA, NodeB]);
    view!(Late, since = "introduce_late");
    view!(UsesLate, uses = [Late]);
    view!(Looped, uses = [Looped]);

    #[test]
    fn test_child_takes_base_down_first() {
        let db = create_test_database();
        take_calls();

        let mut scope = ViewScope::new(&db).with::<Child>();
        scope.enter().unwrap();
        assert_eq!(take_calls(), vec!["Base.down", "Child.down"]);
        assert_eq!(scope.pending(), 2);

        scope.exit().unwrap();
        assert_eq!(take_calls(), vec!["Child.up", "Base.up"]);
        assert_eq!(scope.pending(), 0);
    }

    #[test]
    fn test_uses_entered_in_reverse_order() {
        let db = create_test_database();
        take_calls();

        ViewScope::new(&db)
            .with::<NodeC>()
            .run(|_| Ok(()))
            .unwrap();
        assert_eq!(
            take_calls(),
            vec!["NodeB.down", "NodeA.down", "NodeC.down", "NodeC.up", "NodeA.up", "NodeB.up"]
        );
    }

    #[test]
    fn test_composite_scope_shares_instances() {
        let db = create_test_database();
        take_calls();

        let mut scope = ViewScope::new(&db)
            .with::<NodeA>()
            .with::<NodeB>()
            .with::<NodeC>();
        scope.enter().unwrap();
        assert_eq!(take_calls(), vec!["NodeA.down", "NodeB.down", "NodeC.down"]);

        scope.exit().unwrap();
        assert_eq!(take_calls(), vec!["NodeC.up", "NodeA.up", "NodeB.up"]);
    }

    #[test]
    fn test_failed_block_leaves_views_down() {
        let db = create_test_database();
        take_calls();

        let result: anyhow::Result<()> = ViewScope::new(&db)
            .with::<Child>()
            .run(|_| anyhow::bail!("data is inconsistent"));
        assert!(result.is_err());
        assert_eq!(take_calls(), vec!["Base.down", "Child.down"]);
    }

    #[test]
    fn test_irrelevant_view_is_noop() {
        let db = create_test_database();
        take_calls();

        ViewScope::new(&db).with::<Late>().run(|_| Ok(())).unwrap();
        assert!(take_calls().is_empty());

        mark_migration(&db, "introduce_late", true).unwrap();
        ViewScope::new(&db).with::<Late>().run(|_| Ok(())).unwrap();
        assert_eq!(take_calls(), vec!["Late.down", "Late.up"]);
    }

    #[test]
    fn test_irrelevant_dependency_is_skipped() {
        let db = create_test_database();
        take_calls();

        ViewScope::new(&db).with::<UsesLate>().run(|_| Ok(())).unwrap();
        assert_eq!(take_calls(), vec!["UsesLate.down", "UsesLate.up"]);
    }

    #[test]
    fn test_cycle_detected_before_any_down() {
        let db = create_test_database();
        take_calls();

        let err = ViewScope::new(&db)
            .with::<Base>()
            .with::<Looped>()
            .enter()
            .unwrap_err();
        assert!(matches!(err, Error::ViewCycle { .. }));
        assert!(take_calls().is_empty());
    }

    #[test]
    fn test_exit_without_enter_is_noop() {
        let db = create_test_database();
        take_calls();

        ViewScope::new(&db).with::<Child>().exit().unwrap();
        assert!(take_calls().is_empty());
    }

    #[test]
    fn test_run_returns_block_value() {
        let db = create_test_database();
        let value = ViewScope::new(&db).with::<Base>().run(|_| Ok(42)).unwrap();
        assert_eq!(value, 42);
    }
}
