//! Ordered navigation: in-order neighbours, bounded range scans and full
//! iteration. Nothing here mutates the tree.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use crate::node::{NodeId, Side};
use crate::tree::RbTree;

impl<K, V> RbTree<K, V> {
    #[inline]
    fn entry(&self, id: NodeId) -> (&K, &V) {
        let node = &self.nodes[id];
        (&node.key, &node.value)
    }

    /// Walks from `id` as far as possible towards `side`.
    pub(crate) fn extreme(&self, mut id: NodeId, side: Side) -> NodeId {
        while let Some(c) = self.nodes[id].child(side) {
            id = c;
        }
        id
    }

    /// Structural in-order neighbour of `id`: the successor for `Right`, the
    /// predecessor for `Left`.
    fn neighbor(&self, id: NodeId, side: Side) -> Option<NodeId> {
        if let Some(c) = self.nodes[id].child(side) {
            return Some(self.extreme(c, side.opposite()));
        }
        let mut cur = id;
        let mut up = self.nodes[id].parent;
        while let Some(p) = up {
            if self.nodes[p].child(side) != Some(cur) {
                break;
            }
            cur = p;
            up = self.nodes[p].parent;
        }
        up
    }

    #[inline]
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        self.neighbor(id, Side::Right)
    }

    #[inline]
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.neighbor(id, Side::Left)
    }

    /// Entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.root.map(|r| self.entry(self.extreme(r, Side::Left)))
    }

    /// Entry with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.root.map(|r| self.entry(self.extreme(r, Side::Right)))
    }

    /// Iterates over all entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
            remaining: self.len(),
        };
        iter.push_left(self.root);
        iter
    }
}

impl<K: Ord, V> RbTree<K, V> {
    /// Smallest entry whose key is strictly greater than `key`. `key` itself
    /// need not be stored.
    pub fn next<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.neighbor_of_key(key, Side::Right).map(|id| self.entry(id))
    }

    /// Greatest entry whose key is strictly smaller than `key`.
    pub fn previous<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.neighbor_of_key(key, Side::Left).map(|id| self.entry(id))
    }

    /// Descends towards `key`, remembering the last node left behind on the
    /// `side` of the search path. An exact hit defers to the structural
    /// neighbour instead.
    fn neighbor_of_key<Q>(&self, key: &Q, side: Side) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut candidate = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            let toward = match key.cmp(self.nodes[id].key.borrow()) {
                Ordering::Equal => return self.neighbor(id, side),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            if toward != side {
                candidate = Some(id);
            }
            cur = self.nodes[id].child(toward);
        }
        candidate
    }

    /// Iterates over the entries with keys in `[lower, upper]`, ascending.
    ///
    /// The scan starts at the topmost node inside the bounds and only enters
    /// subtrees that can still hold keys in range. An inverted range is empty.
    pub fn range<'q, Q>(&self, lower: &'q Q, upper: &'q Q) -> Range<'_, 'q, K, V, Q>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut range = Range {
            tree: self,
            stack: Vec::new(),
            lower,
            upper,
        };
        if lower > upper {
            return range;
        }

        let mut cur = self.root;
        while let Some(id) = cur {
            let key = self.nodes[id].key.borrow();
            if key > upper {
                cur = self.nodes[id].left();
            } else if key < lower {
                cur = self.nodes[id].right();
            } else {
                break;
            }
        }
        range.push_left(cur);
        range
    }

    /// Values stored under keys in `[lower, upper]`, in key order. Aggregating
    /// them is up to the caller.
    pub fn range_values<Q>(&self, lower: &Q, upper: &Q) -> Vec<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.range(lower, upper).map(|(_, v)| v).collect()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RbTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a RbTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// In-order iterator over all entries. Created by [`RbTree::iter`].
pub struct Iter<'a, K, V> {
    tree: &'a RbTree<K, V>,
    stack: Vec<NodeId>,
    remaining: usize,
}

impl<K, V> Iter<'_, K, V> {
    fn push_left(&mut self, mut cur: Option<NodeId>) {
        while let Some(id) = cur {
            self.stack.push(id);
            cur = self.tree.nodes[id].left();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let tree = self.tree;
        self.push_left(tree.nodes[id].right());
        self.remaining -= 1;
        Some(tree.entry(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Bounded in-order iterator. Created by [`RbTree::range`].
pub struct Range<'a, 'q, K, V, Q: ?Sized> {
    tree: &'a RbTree<K, V>,
    stack: Vec<NodeId>,
    lower: &'q Q,
    upper: &'q Q,
}

impl<K, V, Q> Range<'_, '_, K, V, Q>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    /// Stacks the left spine of `cur`, skipping nodes (and their left
    /// subtrees) that fall below the lower bound.
    fn push_left(&mut self, mut cur: Option<NodeId>) {
        while let Some(id) = cur {
            let node = &self.tree.nodes[id];
            if node.key.borrow() >= self.lower {
                self.stack.push(id);
                cur = node.left();
            } else {
                cur = node.right();
            }
        }
    }
}

impl<'a, K, V, Q> Iterator for Range<'a, '_, K, V, Q>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let tree = self.tree;
        if tree.nodes[id].key.borrow() > self.upper {
            // Everything still stacked is larger.
            self.stack.clear();
            return None;
        }
        self.push_left(tree.nodes[id].right());
        Some(tree.entry(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(keys: &[i64]) -> RbTree<i64, i64> {
        let mut t = RbTree::new();
        for &k in keys {
            t.insert(k, k * 10);
        }
        t
    }

    #[test]
    fn test_iter_sorted() {
        let t = tree_of(&[5, 1, 9, 3, 7]);
        let got: Vec<_> = t.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, vec![(1, 10), (3, 30), (5, 50), (7, 70), (9, 90)]);
        assert_eq!(t.iter().len(), 5);
        assert_eq!((&t).into_iter().count(), 5);
        assert_eq!(format!("{t:?}"), "{1: 10, 3: 30, 5: 50, 7: 70, 9: 90}");
    }

    #[test]
    fn test_first_last() {
        let t = tree_of(&[4, 2, 8, 6]);
        assert_eq!(t.first(), Some((&2, &20)));
        assert_eq!(t.last(), Some((&8, &80)));
        let empty: RbTree<i64, i64> = RbTree::new();
        assert_eq!(empty.first(), None);
        assert_eq!(empty.last(), None);
    }

    #[test]
    fn test_next_previous_present_and_absent() {
        let t = tree_of(&[10, 20, 30, 40, 50]);
        assert_eq!(t.next(&20), Some((&30, &300)));
        assert_eq!(t.next(&25), Some((&30, &300)));
        assert_eq!(t.next(&0), Some((&10, &100)));
        assert_eq!(t.previous(&40), Some((&30, &300)));
        assert_eq!(t.previous(&35), Some((&30, &300)));
        assert_eq!(t.previous(&99), Some((&50, &500)));
    }

    #[test]
    fn test_next_previous_at_extremes() {
        let t = tree_of(&[10, 20, 30]);
        assert_eq!(t.next(&30), None);
        assert_eq!(t.next(&31), None);
        assert_eq!(t.previous(&10), None);
        assert_eq!(t.previous(&9), None);

        let empty: RbTree<i64, i64> = RbTree::new();
        assert_eq!(empty.next(&1), None);
        assert_eq!(empty.previous(&1), None);
    }

    #[test]
    fn test_structural_neighbors_walk_whole_tree() {
        let t = tree_of(&(1..=100).collect::<Vec<_>>());
        let mut id = t.extreme(t.root.unwrap(), Side::Left);
        let mut seen = vec![t.nodes[id].key];
        while let Some(next) = t.successor(id) {
            assert_eq!(t.predecessor(next), Some(id));
            id = next;
            seen.push(t.nodes[id].key);
        }
        assert_eq!(seen, (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn test_range() {
        let t = tree_of(&[1, 3, 5, 7, 9, 11]);
        let keys = |lo: i64, hi: i64| t.range(&lo, &hi).map(|(k, _)| *k).collect::<Vec<_>>();
        assert_eq!(keys(3, 9), vec![3, 5, 7, 9]);
        assert_eq!(keys(2, 8), vec![3, 5, 7]);
        assert_eq!(keys(0, 100), vec![1, 3, 5, 7, 9, 11]);
        assert_eq!(keys(4, 4), Vec::<i64>::new());
        assert_eq!(keys(5, 5), vec![5]);
        assert_eq!(keys(12, 20), Vec::<i64>::new());
        assert_eq!(keys(-5, 0), Vec::<i64>::new());
        assert_eq!(keys(9, 3), Vec::<i64>::new());
        assert_eq!(t.range_values(&3, &7), vec![&30, &50, &70]);
    }

    #[test]
    fn test_range_sum_matches_brute_force() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use std::collections::BTreeMap;

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut t: RbTree<i64, i64> = RbTree::new();
            let mut m: BTreeMap<i64, i64> = BTreeMap::new();
            for _ in 0..rng.gen_range(0..300) {
                let k = rng.gen_range(-500..500);
                let v = rng.gen_range(1..1000);
                t.insert(k, v);
                m.insert(k, v);
            }
            for _ in 0..50 {
                let a = rng.gen_range(-600..600);
                let b = rng.gen_range(-600..600);
                let got: i64 = t.range(&a, &b).map(|(_, v)| *v).sum();
                let expected: i64 = if a <= b { m.range(a..=b).map(|(_, v)| *v).sum() } else { 0 };
                assert_eq!(got, expected, "range [{a}, {b}]");
            }
            let full: i64 = t.range(&i64::MIN, &i64::MAX).map(|(_, v)| *v).sum();
            assert_eq!(full, m.values().sum::<i64>());
        }
    }
}
