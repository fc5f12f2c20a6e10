//! Bulk construction from pre-sorted input.
//!
//! Builds a minimum-height tree in one pass, no rotations or fixups. The
//! midpoint split keeps every absent-child slot on the two deepest levels, so
//! painting exactly the deepest level red gives all root-to-leaf paths the same
//! number of black nodes.

use log::debug;

use crate::error::{Error, Result};
use crate::node::{Color, Node, NodeId, Side};
use crate::tree::RbTree;

impl<K, V> RbTree<K, V> {
    /// Builds a tree from two parallel arrays sorted ascending by key.
    ///
    /// The keys must be strictly ascending. This is not checked: unsorted or
    /// duplicate keys produce a tree whose lookups silently miss entries.
    pub fn from_sorted(keys: Vec<K>, values: Vec<V>) -> Result<Self> {
        if keys.len() != values.len() {
            return Err(Error::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        Ok(Self::from_sorted_pairs(keys.into_iter().zip(values)))
    }

    /// Same as [`RbTree::from_sorted`] for a sequence of `(key, value)` pairs.
    ///
    /// The pairs are gathered first, so any iterator works regardless of what
    /// its size hint claims.
    pub fn from_sorted_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();
        let n = pairs.len();
        let mut items = pairs.into_iter();
        let mut tree = Self::with_capacity(n);
        if n == 0 {
            return tree;
        }

        // Deepest level reached by the midpoint split, root at depth 0.
        let red_depth = n.ilog2() as usize;
        tree.root = tree.build(&mut items, 0, n, 0, red_depth);
        if let Some(root) = tree.root {
            // A single node would otherwise sit on the red level.
            tree.nodes[root].color = Color::Black;
        }
        debug!("bulk-loaded {n} entries, red level at depth {red_depth}");
        tree
    }

    /// Builds the subtree for `[lo, hi)`. Nodes are allocated in key order, so
    /// `items` is consumed front to back.
    fn build<I>(&mut self, items: &mut I, lo: usize, hi: usize, depth: usize, red_depth: usize) -> Option<NodeId>
    where
        I: Iterator<Item = (K, V)>,
    {
        if lo >= hi {
            return None;
        }
        let mid = lo + (hi - lo - 1) / 2;

        let left = self.build(items, lo, mid, depth + 1, red_depth);

        let (key, value) = items
            .next()
            .expect("one pair per index in the build range");
        let color = if depth == red_depth {
            Color::Red
        } else {
            Color::Black
        };
        let mut node = Node::new(key, value, color);
        node.set_child(Side::Left, left);
        let id = self.nodes.alloc(node);
        if let Some(left) = left {
            self.nodes[left].parent = Some(id);
        }

        let right = self.build(items, mid + 1, hi, depth + 1, red_depth);
        self.nodes[id].set_child(Side::Right, right);
        if let Some(right) = right {
            self.nodes[right].parent = Some(id);
        }
        Some(id)
    }
}
