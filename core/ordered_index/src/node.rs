//! Ordered Index - Node and node storage for a Red-Black Tree
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use core::ops::{Index, IndexMut};

use slab::Slab;

use crate::{Error, Result};

/// A handle to a node stored in a tree.
///
/// Handles are plain indices into the tree's node storage. A handle stays valid until the node it refers to
/// is deleted, after which the slot may be reused by a later insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw storage index of the node.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The color of a node in a red-black tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// A red node.
    Red,
    /// A black node. Absent children are always considered black.
    Black,
}

/// Which child of its parent a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

pub(crate) struct Node<K, V> {
    pub key: K,
    pub value: V,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Node { key, value, color: Color::Red, parent: None, left: None, right: None }
    }

    /// Indicates the node is not linked to any other node.
    pub fn is_detached(&self) -> bool {
        self.parent.is_none() && self.left.is_none() && self.right.is_none()
    }

    pub fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }
}

/// The storage container for the nodes of a red-black tree.
///
/// Every node reachable from a tree lives here and is owned by the storage. The link fields only ever hold
/// [NodeId]s, which are copied freely and never own anything.
///
/// All of the link accessors take an `Option<NodeId>` and treat `None` as an absent (black) leaf, so the
/// fixup logic can ask about an uncle or nephew without first checking that it exists.
pub(crate) struct Storage<K, V> {
    nodes: Slab<Node<K, V>>,
}

impl<K, V> Storage<K, V> {
    /// Create an empty storage container.
    pub const fn new() -> Self {
        Storage { nodes: Slab::new() }
    }

    /// Create a storage container that can hold `capacity` nodes before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Storage { nodes: Slab::with_capacity(capacity) }
    }

    /// Get the number of nodes in the storage container.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Get the capacity of the storage container.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Add a new, detached, red node to the storage container.
    ///
    /// # Time Complexity
    ///
    /// O(1) amortized.
    ///
    pub fn add(&mut self, key: K, value: V) -> NodeId {
        NodeId(self.nodes.insert(Node::new(key, value)))
    }

    /// Remove a node from the storage container, returning it.
    ///
    /// The caller is responsible for having unlinked the node from the tree first.
    ///
    /// # Time Complexity
    ///
    /// O(1)
    ///
    pub fn delete(&mut self, id: NodeId) -> Result<Node<K, V>> {
        self.nodes.try_remove(id.0).ok_or(Error::NotFound)
    }

    /// Gets a reference to a node in the storage container using a handle.
    pub fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.nodes.get(id.0)
    }

    /// Gets a mutable reference to a node in the storage container using a handle.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(id.0)
    }

    pub fn color(&self, node: Option<NodeId>) -> Color {
        match node {
            Some(id) => self[id].color,
            None => Color::Black,
        }
    }

    pub fn set_color(&mut self, node: Option<NodeId>, color: Color) {
        if let Some(id) = node {
            self[id].color = color;
        }
    }

    pub fn set_red(&mut self, node: Option<NodeId>) {
        self.set_color(node, Color::Red);
    }

    pub fn set_black(&mut self, node: Option<NodeId>) {
        self.set_color(node, Color::Black);
    }

    pub fn is_red(&self, node: Option<NodeId>) -> bool {
        self.color(node) == Color::Red
    }

    pub fn is_black(&self, node: Option<NodeId>) -> bool {
        self.color(node) == Color::Black
    }

    pub fn parent(&self, node: Option<NodeId>) -> Option<NodeId> {
        node.and_then(|id| self[id].parent)
    }

    pub fn set_parent(&mut self, node: Option<NodeId>, parent: Option<NodeId>) {
        if let Some(id) = node {
            self[id].parent = parent;
        }
    }

    pub fn left(&self, node: Option<NodeId>) -> Option<NodeId> {
        node.and_then(|id| self[id].left)
    }

    pub fn set_left(&mut self, node: Option<NodeId>, left: Option<NodeId>) {
        if let Some(id) = node {
            self[id].left = left;
        }
    }

    pub fn right(&self, node: Option<NodeId>) -> Option<NodeId> {
        node.and_then(|id| self[id].right)
    }

    pub fn set_right(&mut self, node: Option<NodeId>, right: Option<NodeId>) {
        if let Some(id) = node {
            self[id].right = right;
        }
    }

    pub fn child(&self, node: Option<NodeId>, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left(node),
            Side::Right => self.right(node),
        }
    }

    pub fn set_child(&mut self, node: Option<NodeId>, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.set_left(node, child),
            Side::Right => self.set_right(node, child),
        }
    }

    /// Returns which child of its parent the node is.
    ///
    /// # Errors
    ///
    /// Returns [InvalidOperation](Error::InvalidOperation) if the node has no parent.
    ///
    pub fn side(&self, node: NodeId) -> Result<Side> {
        let parent = self[node].parent.ok_or(Error::InvalidOperation)?;
        match Some(node) {
            n if n == self[parent].left => Ok(Side::Left),
            n if n == self[parent].right => Ok(Side::Right),
            _ => panic!("Node is not a child of its parent."),
        }
    }

    pub fn sibling(&self, node: NodeId) -> Option<NodeId> {
        let side = self.side(node).ok()?;
        self.child(self[node].parent, side.opposite())
    }

    pub fn grandparent(&self, node: NodeId) -> Option<NodeId> {
        self.parent(self.parent(Some(node)))
    }

    pub fn uncle(&self, node: NodeId) -> Option<NodeId> {
        self.sibling(self[node].parent?)
    }
}

impl<K, V> Index<NodeId> for Storage<K, V> {
    type Output = Node<K, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl<K, V> IndexMut<NodeId> for Storage<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.0]
    }
}
