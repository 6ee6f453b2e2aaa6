// Bottom-up segment tree over a power-of-two leaf layout.
// Node i has children 2i and 2i+1; leaf j lives at size + j, slot 0 is unused.
// Leaves in n..size hold the identity, so every node is the fold of its range.

use std::{fmt, ops::Range, slice};

use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    monoid::Monoid,
};

pub struct SegTree<M: Monoid> {
    n: usize,
    size: usize,
    sum: Vec<M::X>,
    monoid: M,
}

impl<M: Monoid> SegTree<M> {
    pub fn with_size(monoid: M, n: usize) -> Self {
        let size = n.next_power_of_two();
        let sum = (0..2 * size).map(|_| monoid.id()).collect();
        debug!(n, size, "allocated segment tree");
        Self {
            n,
            size,
            sum,
            monoid,
        }
    }

    pub fn with_items<I>(monoid: M, items: I) -> Self
    where
        I: IntoIterator<Item = M::X>,
    {
        let leaves: Vec<M::X> = items.into_iter().collect();
        let n = leaves.len();
        let size = n.next_power_of_two();

        let mut sum: Vec<_> = (0..size).map(|_| monoid.id()).chain(leaves).collect();
        sum.resize_with(2 * size, || monoid.id());
        for i in (1..size).rev() {
            sum[i] = monoid.combine(&sum[i << 1], &sum[i << 1 | 1]);
        }

        debug!(n, size, "built segment tree");
        Self {
            n,
            size,
            sum,
            monoid,
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn monoid(&self) -> &M {
        &self.monoid
    }

    fn check_index(&self, idx: usize) -> Result<()> {
        if idx < self.n {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index: idx,
                len: self.n,
            })
        }
    }

    /// Leaf at `idx`. Unlike [`SegTree::query`], out-of-range indices are an error.
    pub fn get(&self, idx: usize) -> Result<&M::X> {
        self.check_index(idx)?;
        Ok(&self.sum[idx + self.size])
    }

    /// Aggregate of the whole sequence in O(1).
    pub fn all(&self) -> &M::X {
        &self.sum[1]
    }

    /// Left-to-right fold over `[from, to)`, after clamping both ends into `[0, n]`.
    /// An empty range yields the identity.
    pub fn query(&self, from: isize, to: isize) -> M::X {
        let n = self.n as isize;
        let start = from.clamp(0, n) as usize;
        let end = to.clamp(0, n) as usize;
        self.fold(start..end)
    }

    fn fold(&self, range: Range<usize>) -> M::X {
        let Range { mut start, mut end } = range;
        if start >= end {
            return self.monoid.id();
        }
        debug_assert!(end <= self.n);
        start += self.size;
        end += self.size;

        // Separate accumulators keep non-commutative monoids in index order.
        let (mut result_left, mut result_right) = (self.monoid.id(), self.monoid.id());
        while start < end {
            if start & 1 != 0 {
                result_left = self.monoid.combine(&result_left, &self.sum[start]);
            }
            if end & 1 != 0 {
                result_right = self.monoid.combine(&self.sum[end - 1], &result_right);
            }
            start = (start + 1) >> 1;
            end >>= 1;
        }
        self.monoid.combine(&result_left, &result_right)
    }

    // Largest r in [start, n] with pred(fold(start..r)).
    // pred must hold for the identity and be monotone along the prefix.
    pub fn max_right(&self, start: usize, mut pred: impl FnMut(&M::X) -> bool) -> usize {
        debug_assert!(pred(&self.monoid.id()));
        if start >= self.n {
            return self.n;
        }

        let mut l = start + self.size;
        let mut acc = self.monoid.id();
        loop {
            while l & 1 == 0 {
                l >>= 1;
            }
            let next = self.monoid.combine(&acc, &self.sum[l]);
            if !pred(&next) {
                while l < self.size {
                    l <<= 1;
                    let next = self.monoid.combine(&acc, &self.sum[l]);
                    if pred(&next) {
                        acc = next;
                        l += 1;
                    }
                }
                return (l - self.size).min(self.n);
            }
            acc = next;
            l += 1;
            if l.is_power_of_two() {
                break;
            }
        }
        self.n
    }

    // Smallest l in [0, end] with pred(fold(l..end)).
    pub fn min_left(&self, end: usize, mut pred: impl FnMut(&M::X) -> bool) -> usize {
        debug_assert!(pred(&self.monoid.id()));
        let end = end.min(self.n);
        if end == 0 {
            return 0;
        }

        let mut r = end + self.size;
        let mut acc = self.monoid.id();
        loop {
            r -= 1;
            while r > 1 && r & 1 == 1 {
                r >>= 1;
            }
            let next = self.monoid.combine(&self.sum[r], &acc);
            if !pred(&next) {
                while r < self.size {
                    r = r << 1 | 1;
                    let next = self.monoid.combine(&self.sum[r], &acc);
                    if pred(&next) {
                        acc = next;
                        r -= 1;
                    }
                }
                return r + 1 - self.size;
            }
            acc = next;
            if r.is_power_of_two() {
                break;
            }
        }
        0
    }

    pub fn iter(&self) -> slice::Iter<'_, M::X> {
        self.sum[self.size..self.size + self.n].iter()
    }

    pub fn into_items(self) -> Vec<M::X> {
        let Self { n, size, mut sum, .. } = self;
        let mut leaves = sum.split_off(size);
        leaves.truncate(n);
        leaves
    }

    // In-place mutation is only reachable through a scope's MutableRef.

    pub(crate) fn set(&mut self, idx: usize, value: M::X) -> Result<()> {
        self.check_index(idx)?;
        trace!(idx, "replacing leaf");
        let mut node = idx + self.size;
        self.sum[node] = value;
        while node > 1 {
            node >>= 1;
            self.sum[node] = self.monoid.combine(&self.sum[node << 1], &self.sum[node << 1 | 1]);
        }
        Ok(())
    }

    pub(crate) fn modify(&mut self, idx: usize, f: impl FnOnce(&M::X) -> M::X) -> Result<()> {
        let value = f(self.get(idx)?);
        self.set(idx, value)
    }

    pub(crate) fn clear(&mut self) {
        for x in self.sum.iter_mut() {
            *x = self.monoid.id();
        }
        trace!(n = self.n, "cleared segment tree");
    }
}

impl<M> Clone for SegTree<M>
where
    M: Monoid + Clone,
    M::X: Clone,
{
    fn clone(&self) -> Self {
        Self {
            n: self.n,
            size: self.size,
            sum: self.sum.clone(),
            monoid: self.monoid.clone(),
        }
    }
}

impl<M> fmt::Debug for SegTree<M>
where
    M: Monoid,
    M::X: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegTree")
            .field("n", &self.n)
            .field("items", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a, M: Monoid> IntoIterator for &'a SegTree<M> {
    type Item = &'a M::X;
    type IntoIter = slice::Iter<'a, M::X>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monoid::{from_fn, Additive};
    use proptest::prelude::*;

    const ITEMS: [i64; 7] = [1, 4, 2, 3, 5, 2, 3];

    fn additive(items: &[i64]) -> SegTree<Additive<i64>> {
        SegTree::with_items(Additive::new(), items.iter().copied())
    }

    fn concat() -> impl Monoid<X = String> + Clone {
        from_fn(String::new(), |a: &String, b: &String| format!("{a}{b}"))
    }

    #[test]
    fn scenario_sums() {
        let tree = additive(&ITEMS);
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.query(1, 3), 6);
        assert_eq!(tree.query(0, 7), 20);
        assert_eq!(*tree.all(), 20);
    }

    #[test]
    fn query_clamps() {
        let tree = additive(&ITEMS);
        assert_eq!(tree.query(-1, 8), 20);
        assert_eq!(tree.query(-1, 0), 0);
        assert_eq!(tree.query(7, 12), 0);
        assert_eq!(tree.query(-5, 12), tree.query(0, 7));
        assert_eq!(tree.query(5, 2), 0);
        assert_eq!(tree.query(isize::MIN, isize::MAX), 20);
    }

    #[test]
    fn get_in_and_out_of_range() {
        let tree = additive(&ITEMS);
        assert_eq!(tree.get(4), Ok(&5));
        assert_eq!(tree.get(7), Err(Error::IndexOutOfRange { index: 7, len: 7 }));
    }

    #[test]
    fn empty_tree() {
        let tree = additive(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.query(-3, 3), 0);
        assert_eq!(*tree.all(), 0);
        assert!(tree.get(0).is_err());
        assert_eq!(tree.max_right(0, |_| true), 0);
        assert_eq!(tree.min_left(0, |_| true), 0);
        assert!(tree.into_items().is_empty());
    }

    #[test]
    fn with_size_is_all_identity() {
        let tree = SegTree::with_size(Additive::<i64>::new(), 5);
        assert_eq!(tree.into_items(), vec![0; 5]);
    }

    #[test]
    fn non_commutative_order() {
        let words = ["a", "b", "c", "d", "e"].map(String::from);
        let tree = SegTree::with_items(concat(), words);
        assert_eq!(tree.query(0, 5), "abcde");
        assert_eq!(tree.query(1, 4), "bcd");
        assert_eq!(tree.all(), "abcde");
    }

    #[test]
    fn set_and_clear() {
        let mut tree = additive(&ITEMS);
        tree.set(1, 7).unwrap();
        assert_eq!(tree.query(1, 3), 9);
        assert_eq!(tree.query(0, 7), 23);

        assert!(tree.set(9, 1).is_err());
        assert_eq!(tree.query(0, 7), 23);

        tree.modify(0, |x| x * 10).unwrap();
        assert_eq!(tree.get(0), Ok(&10));

        tree.clear();
        assert_eq!(tree.query(0, 7), 0);
        assert_eq!(tree.into_items(), vec![0; 7]);
    }

    #[test]
    fn binary_searches() {
        let tree = additive(&ITEMS);
        // prefix sums: 1 5 7 10 15 17 20
        assert_eq!(tree.max_right(0, |&s| s <= 7), 3);
        assert_eq!(tree.max_right(0, |&s| s <= 100), 7);
        assert_eq!(tree.max_right(2, |&s| s < 2), 2);
        assert_eq!(tree.max_right(7, |&s| s < 1), 7);
        // suffix sums ending at 7: 3 5 10 13 15 19 20
        assert_eq!(tree.min_left(7, |&s| s <= 5), 5);
        assert_eq!(tree.min_left(7, |&s| s <= 100), 0);
        assert_eq!(tree.min_left(3, |&s| s <= 6), 1);
    }

    #[test]
    fn debug_lists_items() {
        let tree = additive(&[1, 2]);
        assert_eq!(format!("{tree:?}"), "SegTree { n: 2, items: [1, 2] }");
    }

    fn naive_fold<M: Monoid>(monoid: &M, items: &[M::X]) -> M::X {
        items
            .iter()
            .fold(monoid.id(), |acc, x| monoid.combine(&acc, x))
    }

    proptest! {
        #[test]
        fn query_matches_fold(items in prop::collection::vec(-100i64..100, 0..40)) {
            let tree = additive(&items);
            let m = Additive::<i64>::new();
            for from in 0..=items.len() {
                for to in from..=items.len() {
                    prop_assert_eq!(
                        tree.query(from as isize, to as isize),
                        naive_fold(&m, &items[from..to])
                    );
                }
            }
        }

        #[test]
        fn concat_query_matches_fold(items in prop::collection::vec("[a-z]{0,2}", 0..20)) {
            let m = concat();
            let tree = SegTree::with_items(m.clone(), items.clone());
            for from in 0..=items.len() {
                for to in from..=items.len() {
                    prop_assert_eq!(
                        tree.query(from as isize, to as isize),
                        naive_fold(&m, &items[from..to])
                    );
                }
            }
        }

        #[test]
        fn set_touches_only_covering_ranges(
            items in prop::collection::vec(-100i64..100, 1..30),
            idx in any::<prop::sample::Index>(),
            value in -100i64..100,
        ) {
            let before = additive(&items);
            let mut after = before.clone();
            let idx = idx.index(items.len());
            after.set(idx, value).unwrap();
            prop_assert_eq!(after.get(idx), Ok(&value));

            let mut expected = items.clone();
            expected[idx] = value;
            for from in 0..=items.len() {
                for to in from..=items.len() {
                    let q = after.query(from as isize, to as isize);
                    prop_assert_eq!(q, expected[from..to].iter().sum::<i64>());
                    if !(from..to).contains(&idx) {
                        prop_assert_eq!(q, before.query(from as isize, to as isize));
                    }
                }
            }
        }

        #[test]
        fn searches_match_linear_scan(
            items in prop::collection::vec(0i64..10, 0..30),
            bound in 0i64..100,
        ) {
            let tree = additive(&items);
            let n = items.len();
            for start in 0..=n {
                let mut r = start;
                let mut acc = 0;
                while r < n && acc + items[r] <= bound {
                    acc += items[r];
                    r += 1;
                }
                prop_assert_eq!(tree.max_right(start, |&s| s <= bound), r);
            }
            for end in 0..=n {
                let mut l = end;
                let mut acc = 0;
                while l > 0 && acc + items[l - 1] <= bound {
                    acc += items[l - 1];
                    l -= 1;
                }
                prop_assert_eq!(tree.min_left(end, |&s| s <= bound), l);
            }
        }
    }
}
