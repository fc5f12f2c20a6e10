//! Node storage for the red-black tree.
//!
//! Nodes live in a dense arena and refer to each other by [`NodeId`]. A missing
//! child, and the parent of the root, are plain `None`: there is no shared
//! sentinel node that could pick up stray writes.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Index of a node inside a tree's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    fn new(idx: usize) -> Self {
        debug_assert!(idx <= u32::MAX as usize, "arena index overflow");
        Self(idx as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Child slot of a parent. Also used as a rotation direction: rotating a node
/// towards `Left` moves it down into the left slot of its former right child.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) color: Color,
    pub(crate) parent: Option<NodeId>,
    /// Indexed by [`Side`].
    pub(crate) child: [Option<NodeId>; 2],
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn new(key: K, value: V, color: Color) -> Self {
        Self {
            key,
            value,
            color,
            parent: None,
            child: [None, None],
        }
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<NodeId> {
        self.child[side as usize]
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, id: Option<NodeId>) {
        self.child[side as usize] = id;
    }

    #[inline]
    pub(crate) fn left(&self) -> Option<NodeId> {
        self.child(Side::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Option<NodeId> {
        self.child(Side::Right)
    }

    #[inline]
    pub(crate) fn is_red(&self) -> bool {
        self.color == Color::Red
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Dense node arena.
///
/// Freed slots are never left as holes: [`NodeArena::swap_remove`] moves the
/// last node into the vacated slot and reports where it came from, so the
/// owner can retarget the links that pointed at the old index.
#[derive(Clone)]
pub(crate) struct NodeArena<K, V> {
    nodes: Vec<Node<K, V>>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    #[inline]
    pub(crate) fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Takes `id` out of the arena. If another node had to be moved into the
    /// freed slot, returns the id it previously had.
    pub(crate) fn swap_remove(&mut self, id: NodeId) -> (Node<K, V>, Option<NodeId>) {
        let last = NodeId::new(self.nodes.len() - 1);
        let node = self.nodes.swap_remove(id.index());
        let moved = (last != id).then_some(last);
        (node, moved)
    }
}

impl<K, V> Index<NodeId> for NodeArena<K, V> {
    type Output = Node<K, V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id.index()]
    }
}

impl<K, V> IndexMut<NodeId> for NodeArena<K, V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id.index()]
    }
}

// =============================================================================
// Public handles
// =============================================================================

/// Read-only view of a stored entry, returned by [`RbTree::find`].
///
/// [`RbTree::find`]: crate::RbTree::find
pub struct NodeRef<'a, K, V> {
    pub(crate) node: &'a Node<K, V>,
}

impl<'a, K, V> NodeRef<'a, K, V> {
    /// The entry's key.
    #[inline]
    pub fn key(&self) -> &'a K {
        &self.node.key
    }

    /// The entry's value.
    #[inline]
    pub fn value(&self) -> &'a V {
        &self.node.value
    }
}

impl<K, V> Clone for NodeRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", &self.node.key)
            .field("value", &self.node.value)
            .finish()
    }
}
