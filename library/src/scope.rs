//! Scoped in-place mutation of segment trees.
//!
//! [`enter_scope`] hands its body a [`Scope`] branded with a fresh lifetime.
//! Every [`MutableRef`] created through that scope carries the same brand, so it
//! can neither leave the body nor be handed to the operations of another scope.
//! Both mistakes are rejected by the compiler:
//!
//! ```compile_fail
//! use scoped_segtree::{enter_scope, monoid::Additive, SegTree};
//!
//! let tree = SegTree::with_items(Additive::<i64>::new(), [1, 2, 3]);
//! let leaked = enter_scope(|scope| scope.create_ref(tree));
//! ```
//!
//! ```compile_fail
//! use scoped_segtree::{enter_scope, monoid::Additive, SegTree};
//!
//! let tree = SegTree::with_items(Additive::<i64>::new(), [1, 2, 3]);
//! enter_scope(|outer| {
//!     let mut r = outer.create_ref(tree);
//!     enter_scope(|inner| inner.insert(&mut r, 0, 5).is_ok())
//! });
//! ```
//!
//! The only way out is a plain [`SegTree`] snapshot:
//!
//! ```
//! use scoped_segtree::{enter_scope, monoid::Additive, SegTree};
//!
//! let tree = SegTree::with_items(Additive::<i64>::new(), [1, 4, 2, 3, 5, 2, 3]);
//! let updated = enter_scope(|scope| {
//!     let mut r = scope.create_ref(tree.clone());
//!     scope.insert(&mut r, 1, 7)?;
//!     Ok::<_, scoped_segtree::Error>(scope.freeze(r))
//! })
//! .unwrap();
//! assert_eq!(tree.query(0, 7), 20);
//! assert_eq!(updated.query(0, 7), 23);
//! ```

use std::{
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use tracing::{debug, debug_span};

use crate::{error::Result, monoid::Monoid, tree::segtree::SegTree};

// Invariant in 'brand, so two scopes never unify.
type Brand<'brand> = PhantomData<fn(&'brand ()) -> &'brand ()>;

/// Identity of one [`enter_scope`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region(u64);

impl Region {
    fn mint() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

#[derive(Debug)]
pub struct Scope<'brand> {
    region: Region,
    _brand: Brand<'brand>,
}

pub fn enter_scope<R>(body: impl for<'brand> FnOnce(Scope<'brand>) -> R) -> R {
    let scope = Scope {
        region: Region::mint(),
        _brand: PhantomData,
    };
    let _span = debug_span!("scope", region = scope.region.0).entered();
    debug!("entered scope");
    let result = body(scope);
    debug!("left scope");
    result
}

pub struct MutableRef<'brand, M: Monoid> {
    tree: SegTree<M>,
    region: Region,
    _brand: Brand<'brand>,
}

impl<'brand> Scope<'brand> {
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn create_ref<M: Monoid>(&self, tree: SegTree<M>) -> MutableRef<'brand, M> {
        MutableRef {
            tree,
            region: self.region,
            _brand: PhantomData,
        }
    }

    /// Copies out the current state. The copy owes nothing to the scope.
    pub fn read_ref<M>(&self, r: &MutableRef<'brand, M>) -> SegTree<M>
    where
        M: Monoid + Clone,
        M::X: Clone,
    {
        r.tree.clone()
    }

    /// Reads and ends the reference in one step, without copying.
    pub fn freeze<M: Monoid>(&self, r: MutableRef<'brand, M>) -> SegTree<M> {
        r.tree
    }

    pub fn write_ref<M: Monoid>(&self, r: &mut MutableRef<'brand, M>, tree: SegTree<M>) {
        r.tree = tree;
    }

    /// Replaces leaf `idx`. Fails without touching the tree if `idx` is out of range.
    pub fn insert<M: Monoid>(
        &self,
        r: &mut MutableRef<'brand, M>,
        idx: usize,
        value: M::X,
    ) -> Result<()> {
        r.tree.set(idx, value)
    }

    pub fn modify<M: Monoid>(
        &self,
        r: &mut MutableRef<'brand, M>,
        idx: usize,
        f: impl FnOnce(&M::X) -> M::X,
    ) -> Result<()> {
        r.tree.modify(idx, f)
    }

    pub fn clear<M: Monoid>(&self, r: &mut MutableRef<'brand, M>) {
        r.tree.clear();
    }
}

impl<'brand, M: Monoid> MutableRef<'brand, M> {
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn get(&self, idx: usize) -> Result<&M::X> {
        self.tree.get(idx)
    }

    pub fn query(&self, from: isize, to: isize) -> M::X {
        self.tree.query(from, to)
    }

    pub(crate) fn tree(&self) -> &SegTree<M> {
        &self.tree
    }
}

impl<'brand, M> fmt::Debug for MutableRef<'brand, M>
where
    M: Monoid,
    M::X: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableRef")
            .field("region", &self.region)
            .field("tree", &self.tree)
            .finish()
    }
}
