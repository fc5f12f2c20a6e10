//! Red-black tree engine: lookup, insertion, deletion and the two fixup passes.
//!
//! The algorithms are the textbook ones. Left/right mirror cases are folded
//! into one code path parameterised by [`Side`].

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

use log::trace;

use crate::node::{Color, Node, NodeArena, NodeId, NodeRef, Side};

const SIBLING: &str = "a black-deficient node always has a sibling";

/// An ordered map backed by an arena-allocated red-black tree.
///
/// All point operations, [`next`](RbTree::next), [`previous`](RbTree::previous)
/// and the start of a [`range`](RbTree::range) scan run in `O(log n)`.
#[derive(Clone)]
pub struct RbTree<K, V> {
    pub(crate) nodes: NodeArena<K, V>,
    pub(crate) root: Option<NodeId>,
}

impl<K, V> RbTree<K, V> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::new(),
            root: None,
        }
    }

    /// Creates an empty tree with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            root: None,
        }
    }

    /// Number of distinct keys stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes the arena can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    // =========================================================================
    // Link helpers
    // =========================================================================

    /// Absent children count as black.
    #[inline]
    pub(crate) fn is_red(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|id| self.nodes[id].is_red())
    }

    /// Which slot of `parent` holds `child`. `child` may be `None` as long as
    /// the other slot is occupied.
    #[inline]
    fn side_of(&self, parent: NodeId, child: Option<NodeId>) -> Side {
        if self.nodes[parent].left() == child {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Points whatever referenced `old` from above (a parent slot or the root)
    /// at `new`.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let side = self.side_of(p, Some(old));
                self.nodes[p].set_child(side, new);
            }
        }
    }

    /// Rotates `x` down into its `dir` slot; the child on the opposite side
    /// takes its place.
    fn rotate(&mut self, x: NodeId, dir: Side) {
        let rising = dir.opposite();
        let y = self.nodes[x]
            .child(rising)
            .expect("rotation needs a child on the rising side");

        let inner = self.nodes[y].child(dir);
        self.nodes[x].set_child(rising, inner);
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }

        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));

        self.nodes[y].set_child(dir, Some(x));
        self.nodes[x].parent = Some(y);
    }

    /// Replaces the subtree rooted at `u` with the one rooted at `v` in `u`'s
    /// parent. `u`'s own links are left as they were.
    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let parent = self.nodes[u].parent;
        self.replace_child(parent, u, v);
        if let Some(v) = v {
            self.nodes[v].parent = parent;
        }
    }

    // =========================================================================
    // Insertion fixup
    // =========================================================================

    fn insert_fixup(&mut self, mut z: NodeId) {
        while let Some(p) = self.nodes[z].parent.filter(|&p| self.nodes[p].is_red()) {
            let g = self.nodes[p].parent.expect("a red node is never the root");
            let side = self.side_of(g, Some(p));
            let uncle = self.nodes[g].child(side.opposite());

            if let Some(u) = uncle.filter(|&u| self.nodes[u].is_red()) {
                // Push the violation up two levels.
                self.nodes[p].color = Color::Black;
                self.nodes[u].color = Color::Black;
                self.nodes[g].color = Color::Red;
                z = g;
                continue;
            }

            if self.nodes[p].child(side.opposite()) == Some(z) {
                // Triangle: straighten it so `z` and its parent lean the same way.
                z = p;
                self.rotate(z, side);
            }

            let p = self.nodes[z].parent.expect("straightened node keeps a parent");
            self.nodes[p].color = Color::Black;
            self.nodes[g].color = Color::Red;
            self.rotate(g, side.opposite());
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Detaches `z` from the tree structure and rebalances. `z` stays in the
    /// arena until [`RbTree::release`].
    fn unlink(&mut self, z: NodeId) {
        let left = self.nodes[z].left();
        let right = self.nodes[z].right();
        let mut removed_color = self.nodes[z].color;

        // `x` takes the place of the node that physically left its slot;
        // `x_parent` is tracked separately because `x` may be absent.
        let (x, x_parent) = match (left, right) {
            (None, _) => {
                let parent = self.nodes[z].parent;
                self.transplant(z, right);
                (right, parent)
            }
            (_, None) => {
                let parent = self.nodes[z].parent;
                self.transplant(z, left);
                (left, parent)
            }
            (Some(l), Some(r)) => {
                let y = self.extreme(r, Side::Left);
                removed_color = self.nodes[y].color;
                let x = self.nodes[y].right();

                let x_parent = if self.nodes[y].parent == Some(z) {
                    Some(y)
                } else {
                    let parent = self.nodes[y].parent;
                    self.transplant(y, x);
                    self.nodes[y].set_child(Side::Right, Some(r));
                    self.nodes[r].parent = Some(y);
                    parent
                };

                self.transplant(z, Some(y));
                self.nodes[y].set_child(Side::Left, Some(l));
                self.nodes[l].parent = Some(y);
                self.nodes[y].color = self.nodes[z].color;
                (x, x_parent)
            }
        };

        if removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }
    }

    fn delete_fixup(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else { break };
            let side = self.side_of(p, x);
            let far = side.opposite();
            let mut w = self.nodes[p].child(far).expect(SIBLING);

            if self.nodes[w].is_red() {
                self.nodes[w].color = Color::Black;
                self.nodes[p].color = Color::Red;
                self.rotate(p, side);
                w = self.nodes[p].child(far).expect(SIBLING);
            }

            let near_red = self.is_red(self.nodes[w].child(side));
            let far_red = self.is_red(self.nodes[w].child(far));

            if !near_red && !far_red {
                self.nodes[w].color = Color::Red;
                x = Some(p);
                parent = self.nodes[p].parent;
                continue;
            }

            if !far_red {
                let near = self.nodes[w].child(side).expect("near child is red");
                self.nodes[near].color = Color::Black;
                self.nodes[w].color = Color::Red;
                self.rotate(w, far);
                w = self.nodes[p].child(far).expect(SIBLING);
            }

            self.nodes[w].color = self.nodes[p].color;
            self.nodes[p].color = Color::Black;
            if let Some(f) = self.nodes[w].child(far) {
                self.nodes[f].color = Color::Black;
            }
            self.rotate(p, side);
            x = self.root;
            parent = None;
        }

        if let Some(x) = x {
            self.nodes[x].color = Color::Black;
        }
    }

    /// Frees the arena slot of an already unlinked node. The node that gets
    /// moved into the slot has its neighbours retargeted.
    fn release(&mut self, z: NodeId) -> Node<K, V> {
        let (node, moved) = self.nodes.swap_remove(z);
        if let Some(old) = moved {
            let parent = self.nodes[z].parent;
            self.replace_child(parent, old, Some(z));
            for side in [Side::Left, Side::Right] {
                if let Some(c) = self.nodes[z].child(side) {
                    self.nodes[c].parent = Some(z);
                }
            }
        }
        node
    }
}

impl<K: Ord, V> RbTree<K, V> {
    pub(crate) fn find_id<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        while let Some(id) = cur {
            cur = match key.cmp(self.nodes[id].key.borrow()) {
                Ordering::Less => self.nodes[id].left(),
                Ordering::Greater => self.nodes[id].right(),
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Looks up the entry stored under `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<NodeRef<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_id(key).map(|id| NodeRef {
            node: &self.nodes[id],
        })
    }

    /// Mutable handle to the entry stored under `key`.
    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<NodeMut<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find_id(key)?;
        Some(NodeMut { tree: self, id })
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_id(key).map(|id| &self.nodes[id].value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find_id(key)?;
        Some(&mut self.nodes[id].value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_id(key).is_some()
    }

    /// Inserts `key` with `value`.
    ///
    /// If the key is already present its value is overwritten in place and the
    /// previous value is returned; the tree shape does not change.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut parent = None;
        let mut side = Side::Left;
        let mut cur = self.root;
        while let Some(id) = cur {
            side = match key.cmp(&self.nodes[id].key) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Some(mem::replace(&mut self.nodes[id].value, value)),
            };
            parent = Some(id);
            cur = self.nodes[id].child(side);
        }

        let Some(p) = parent else {
            let id = self.nodes.alloc(Node::new(key, value, Color::Black));
            self.root = Some(id);
            return None;
        };

        let mut node = Node::new(key, value, Color::Red);
        node.parent = Some(p);
        let id = self.nodes.alloc(node);
        self.nodes[p].set_child(side, Some(id));
        self.insert_fixup(id);
        None
    }

    /// Removes `key` and returns its value, or `None` if it was not present
    /// (in which case nothing changes).
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let z = self.find_id(key)?;
        self.unlink(z);
        let node = self.release(z);
        trace!("removed node, {} remaining", self.len());
        Some((node.key, node.value))
    }

    /// Removes `key`, reporting whether it was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove(key).is_some()
    }
}

impl<K, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Mutable node handle
// =============================================================================

/// Mutable view of a stored entry, returned by [`RbTree::find_mut`].
pub struct NodeMut<'a, K, V> {
    tree: &'a mut RbTree<K, V>,
    id: NodeId,
}

impl<'a, K: Ord, V> NodeMut<'a, K, V> {
    pub fn key(&self) -> &K {
        &self.tree.nodes[self.id].key
    }

    pub fn value(&self) -> &V {
        &self.tree.nodes[self.id].value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.tree.nodes[self.id].value
    }

    /// Converts the handle into a reference that lives as long as the borrow
    /// of the tree.
    pub fn into_value_mut(self) -> &'a mut V {
        &mut self.tree.nodes[self.id].value
    }

    /// Overwrites the value, returning the old one.
    pub fn set_value(&mut self, value: V) -> V {
        mem::replace(&mut self.tree.nodes[self.id].value, value)
    }

    /// Rekeys the entry without moving it.
    ///
    /// Only succeeds when `key` still sorts strictly between the entry's
    /// in-order neighbours; otherwise the tree is left untouched and the key
    /// is handed back in `Err`. On success the old key is returned.
    pub fn set_key(&mut self, key: K) -> Result<K, K> {
        let nodes = &self.tree.nodes;
        let above_lower = self
            .tree
            .predecessor(self.id)
            .map_or(true, |p| nodes[p].key < key);
        let below_upper = self
            .tree
            .successor(self.id)
            .map_or(true, |s| key < nodes[s].key);
        if !(above_lower && below_upper) {
            return Err(key);
        }
        Ok(mem::replace(&mut self.tree.nodes[self.id].key, key))
    }
}

// =============================================================================
// Invariant checking (tests only)
// =============================================================================

#[cfg(test)]
impl<K: Ord + std::fmt::Debug, V> RbTree<K, V> {
    /// Asserts ordering, colouring, black height and parent links. Returns the
    /// black height of the root.
    pub(crate) fn validate(&self) -> usize {
        assert!(!self.is_red(self.root), "root must be black");
        if let Some(root) = self.root {
            assert_eq!(self.nodes[root].parent, None, "root must not have a parent");
        }
        let (black_height, count) = self.validate_subtree(self.root, None, None);
        assert_eq!(count, self.len(), "reachable nodes must match arena length");
        black_height
    }

    fn validate_subtree(&self, id: Option<NodeId>, lo: Option<&K>, hi: Option<&K>) -> (usize, usize) {
        let Some(id) = id else {
            return (0, 0);
        };
        let node = &self.nodes[id];
        if let Some(lo) = lo {
            assert!(*lo < node.key, "{:?} sits right of {:?} but is not greater", node.key, lo);
        }
        if let Some(hi) = hi {
            assert!(node.key < *hi, "{:?} sits left of {:?} but is not smaller", node.key, hi);
        }
        for side in [Side::Left, Side::Right] {
            if let Some(c) = node.child(side) {
                assert_eq!(self.nodes[c].parent, Some(id), "broken parent link under {:?}", node.key);
            }
        }
        if node.is_red() {
            assert!(
                !self.is_red(node.left()) && !self.is_red(node.right()),
                "red-red edge at {:?}",
                node.key
            );
        }

        let (lh, lc) = self.validate_subtree(node.left(), lo, Some(&node.key));
        let (rh, rc) = self.validate_subtree(node.right(), Some(&node.key), hi);
        assert_eq!(lh, rh, "black height mismatch under {:?}", node.key);
        (lh + usize::from(!node.is_red()), lc + rc + 1)
    }
}
