// Multiset of keys in 0..universe, stored as per-key counts in a segment tree
// over the counting monoid.

use crate::{
    error::{Error, Result},
    monoid::Counting,
    scope::{MutableRef, Scope},
    tree::segtree::SegTree,
};

#[derive(Clone, Debug)]
pub struct CountingMultiset {
    counts: SegTree<Counting>,
}

impl CountingMultiset {
    pub fn with_universe(universe: usize) -> Self {
        Self {
            counts: SegTree::with_size(Counting::new(), universe),
        }
    }

    pub fn from_keys(universe: usize, keys: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut counts = vec![0; universe];
        for key in keys {
            *counts.get_mut(key).ok_or(Error::IndexOutOfRange {
                index: key,
                len: universe,
            })? += 1;
        }
        Ok(Self {
            counts: SegTree::with_items(Counting::new(), counts),
        })
    }

    pub fn universe(&self) -> usize {
        self.counts.len()
    }

    // Keys outside the universe are never present.
    pub fn count(&self, key: usize) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> u64 {
        *self.counts.all()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored keys in `[from, to)`, clamped to the universe.
    pub fn count_range(&self, from: isize, to: isize) -> u64 {
        self.counts.query(from, to)
    }

    /// The `k`-th smallest key (0-based), counting multiplicities.
    pub fn nth(&self, k: u64) -> Option<usize> {
        let key = self.counts.max_right(0, |&prefix| prefix <= k);
        (key < self.universe()).then_some(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.counts
            .iter()
            .enumerate()
            .flat_map(|(key, &count)| std::iter::repeat(key).take(count as usize))
    }

    pub fn thaw<'brand>(self, scope: &Scope<'brand>) -> MultisetRef<'brand> {
        MultisetRef {
            counts: scope.create_ref(self.counts),
        }
    }
}

#[derive(Debug)]
pub struct MultisetRef<'brand> {
    counts: MutableRef<'brand, Counting>,
}

impl<'brand> MultisetRef<'brand> {
    pub fn insert(&mut self, scope: &Scope<'brand>, key: usize) -> Result<()> {
        scope.modify(&mut self.counts, key, |&c| c + 1)
    }

    // Decrement with floor at zero. Returns whether an occurrence was removed.
    pub fn remove(&mut self, scope: &Scope<'brand>, key: usize) -> bool {
        if self.count(key) == 0 {
            return false;
        }
        scope.modify(&mut self.counts, key, |&c| c - 1).is_ok()
    }

    pub fn count(&self, key: usize) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> u64 {
        *self.counts.tree().all()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn freeze(self, scope: &Scope<'brand>) -> CountingMultiset {
        CountingMultiset {
            counts: scope.freeze(self.counts),
        }
    }
}
