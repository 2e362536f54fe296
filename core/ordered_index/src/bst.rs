//! Ordered Index - Binary search tree primitives
//!
//! The structural operations shared by any binary-search-ordered tree. [OrderedTree] knows nothing about
//! colors beyond carrying them along with the nodes; the red-black balancing is layered on top of it by
//! [Rbt](crate::Rbt).
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use core::{borrow::Borrow, cmp::Ordering};

use crate::{
    node::{NodeId, Side, Storage},
    Error, Result,
};

/// Where a key lives in the tree, or where it would be linked if it were added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// The key is held by this node.
    Occupied(NodeId),
    /// The key is absent. It belongs on `side` of `parent`, or at the root if `parent` is `None`.
    Vacant { parent: Option<NodeId>, side: Side },
}

pub(crate) struct OrderedTree<K, V> {
    storage: Storage<K, V>,
    root: Option<NodeId>,
}

impl<K, V> OrderedTree<K, V> {
    pub const fn new() -> Self {
        OrderedTree { storage: Storage::new(), root: None }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        OrderedTree { storage: Storage::with_capacity(capacity), root: None }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn storage(&self) -> &Storage<K, V> {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage<K, V> {
        &mut self.storage
    }

    pub fn clear(&mut self) {
        self.storage.clear();
        self.root = None;
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// # Time Complexity
    ///
    /// O(n)
    ///
    pub fn height(&self) -> usize {
        self.subtree_height(self.root)
    }

    fn subtree_height(&self, node: Option<NodeId>) -> usize {
        match node {
            None => 0,
            Some(id) => {
                let left = self.subtree_height(self.storage.left(Some(id)));
                let right = self.subtree_height(self.storage.right(Some(id)));
                core::cmp::max(left, right) + 1
            }
        }
    }

    /// Returns the left-most node of the subtree rooted at `node`.
    pub fn minimum(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(left) = self.storage.left(Some(current)) {
            current = left;
        }
        current
    }

    /// Returns the right-most node of the subtree rooted at `node`.
    pub fn maximum(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(right) = self.storage.right(Some(current)) {
            current = right;
        }
        current
    }

    /// Returns the node holding the next key in order.
    ///
    /// # Time Complexity
    ///
    /// O(1) ~ O(log n) for a balanced tree.
    ///
    pub fn successor(&self, node: NodeId) -> Option<NodeId> {
        if let Some(right) = self.storage.right(Some(node)) {
            return Some(self.minimum(right));
        }

        let mut current = node;
        while let Some(parent) = self.storage.parent(Some(current)) {
            if self.storage.left(Some(parent)) == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Returns the node holding the previous key in order.
    ///
    /// # Time Complexity
    ///
    /// O(1) ~ O(log n) for a balanced tree.
    ///
    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        if let Some(left) = self.storage.left(Some(node)) {
            return Some(self.maximum(left));
        }

        let mut current = node;
        while let Some(parent) = self.storage.parent(Some(current)) {
            if self.storage.right(Some(parent)) == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Replaces `old` with `new` in the child slot of `parent`, or at the root if `parent` is `None`.
    ///
    /// Only the downward link is rewritten. The caller updates `new`'s parent.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                if self.storage.left(Some(parent)) == Some(old) {
                    self.storage.set_left(Some(parent), new);
                } else {
                    self.storage.set_right(Some(parent), new);
                }
            }
        }
    }

    fn set_slot(&mut self, parent: Option<NodeId>, side: Option<Side>, node: NodeId) {
        match (parent, side) {
            (Some(parent), Some(side)) => self.storage.set_child(Some(parent), side, Some(node)),
            _ => self.root = Some(node),
        }
    }

    /// Rotate the subtree rooted at `node` to the left and return the new subtree root.
    ///
    /// ```text
    ///     [x]                [y]
    ///    /   \              /   \
    ///  [a]   [y]    ->    [x]   [c]
    ///       /   \        /   \
    ///     [b]   [c]    [a]   [b]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [InvalidOperation](Error::InvalidOperation) if `node` has no right child.
    ///
    pub fn rotate_left(&mut self, node: NodeId) -> Result<NodeId> {
        self.rotate_towards(node, Side::Left)
    }

    /// Rotate the subtree rooted at `node` to the right and return the new subtree root.
    ///
    /// # Errors
    ///
    /// Returns [InvalidOperation](Error::InvalidOperation) if `node` has no left child.
    ///
    pub fn rotate_right(&mut self, node: NodeId) -> Result<NodeId> {
        self.rotate_towards(node, Side::Right)
    }

    /// Rotates `node` down towards `direction`, lifting its child from the opposite side.
    pub fn rotate(&mut self, node: NodeId, direction: Side) -> Result<NodeId> {
        match direction {
            Side::Left => self.rotate_left(node),
            Side::Right => self.rotate_right(node),
        }
    }

    fn rotate_towards(&mut self, node: NodeId, direction: Side) -> Result<NodeId> {
        let storage = &mut self.storage;
        let pivot = storage.child(Some(node), direction.opposite()).ok_or(Error::InvalidOperation)?;
        let parent = storage.parent(Some(node));
        let middle = storage.child(Some(pivot), direction);

        storage.set_child(Some(node), direction.opposite(), middle);
        storage.set_parent(middle, Some(node));

        storage.set_child(Some(pivot), direction, Some(node));
        storage.set_parent(Some(node), Some(pivot));

        storage.set_parent(Some(pivot), parent);
        self.replace_child(parent, node, Some(pivot));

        log::trace!("rotated {:?} {:?}, new subtree root {:?}", node, direction, pivot);
        Ok(pivot)
    }
}

impl<K: Ord, V> OrderedTree<K, V> {
    /// Descends from the root comparing `key` against each node on the way.
    ///
    /// # Time Complexity
    ///
    /// O(log n) for a balanced tree.
    ///
    pub fn find<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(id) = current {
            match key.cmp(self.storage[id].key.borrow()) {
                Ordering::Equal => return Position::Occupied(id),
                Ordering::Less => side = Side::Left,
                Ordering::Greater => side = Side::Right,
            }
            parent = Some(id);
            current = self.storage.child(Some(id), side);
        }
        Position::Vacant { parent, side }
    }

    /// Gets the node holding `key`.
    pub fn search<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find(key) {
            Position::Occupied(id) => Some(id),
            Position::Vacant { .. } => None,
        }
    }

    /// Gets the node holding the greatest key that is less than or equal to `key`.
    pub fn closest<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        let mut closest = None;
        while let Some(id) = current {
            match key.cmp(self.storage[id].key.borrow()) {
                Ordering::Equal => return Some(id),
                Ordering::Less => current = self.storage.left(Some(id)),
                Ordering::Greater => {
                    closest = Some(id);
                    current = self.storage.right(Some(id));
                }
            }
        }
        closest
    }

    /// Links a freshly stored node into the vacant `position`.
    ///
    /// # Errors
    ///
    /// Returns [InvalidArgument](Error::InvalidArgument) if the node is already linked to other nodes or if
    /// `position` is occupied.
    ///
    pub fn link(&mut self, node: NodeId, position: Position) -> Result<()> {
        let Position::Vacant { parent, side } = position else {
            return Err(Error::InvalidArgument);
        };
        if !self.storage.get(node).ok_or(Error::NotFound)?.is_detached() || self.root == Some(node) {
            return Err(Error::InvalidArgument);
        }

        match parent {
            None if self.root.is_some() => return Err(Error::InvalidArgument),
            None => self.root = Some(node),
            Some(parent) => {
                if self.storage.child(Some(parent), side).is_some() {
                    return Err(Error::InvalidArgument);
                }
                self.storage.set_child(Some(parent), side, Some(node));
                self.storage.set_parent(Some(node), Some(parent));
            }
        }
        Ok(())
    }
}

impl<K, V> OrderedTree<K, V> {
    /// Replaces a node that has at most one child with that child, returning the child.
    ///
    /// The node stays in storage, detached from the tree.
    pub fn splice(&mut self, node: NodeId) -> Option<NodeId> {
        let storage = &mut self.storage;
        debug_assert!(storage.left(Some(node)).is_none() || storage.right(Some(node)).is_none());

        let child = storage.left(Some(node)).or(storage.right(Some(node)));
        let parent = storage.parent(Some(node));

        storage.set_parent(child, parent);
        self.replace_child(parent, node, child);

        let storage = &mut self.storage;
        storage.set_parent(Some(node), None);
        storage.set_left(Some(node), None);
        storage.set_right(Some(node), None);
        child
    }

    /// Exchanges the structural positions of two nodes, including their colors.
    ///
    /// The keys and values stay with their nodes, so outstanding handles keep pointing at the same entry.
    pub fn swap(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        // Normalize so that if the nodes are adjacent, `a` is the parent.
        let (a, b) = if self.storage.parent(Some(a)) == Some(b) { (b, a) } else { (a, b) };

        let storage = &self.storage;
        let (a_parent, a_left, a_right, a_color) =
            (storage.parent(Some(a)), storage.left(Some(a)), storage.right(Some(a)), storage.color(Some(a)));
        let (b_parent, b_left, b_right, b_color) =
            (storage.parent(Some(b)), storage.left(Some(b)), storage.right(Some(b)), storage.color(Some(b)));

        if b_parent == Some(a) {
            // `b` moves up into `a`'s slot and `a` becomes `b`'s child on the side `b` used to be on.
            self.replace_child(a_parent, a, Some(b));
            let storage = &mut self.storage;
            storage.set_parent(Some(b), a_parent);
            if a_left == Some(b) {
                storage.set_left(Some(b), Some(a));
                storage.set_right(Some(b), a_right);
                storage.set_parent(a_right, Some(b));
            } else {
                storage.set_right(Some(b), Some(a));
                storage.set_left(Some(b), a_left);
                storage.set_parent(a_left, Some(b));
            }
            storage.set_parent(Some(a), Some(b));
        } else {
            // Sides are read up front, the two nodes may be siblings.
            let a_side = self.storage.side(a).ok();
            let b_side = self.storage.side(b).ok();
            self.set_slot(a_parent, a_side, b);
            self.set_slot(b_parent, b_side, a);
            let storage = &mut self.storage;
            storage.set_parent(Some(b), a_parent);
            storage.set_parent(Some(a), b_parent);
            storage.set_left(Some(b), a_left);
            storage.set_right(Some(b), a_right);
            storage.set_parent(a_left, Some(b));
            storage.set_parent(a_right, Some(b));
        }

        let storage = &mut self.storage;
        storage.set_left(Some(a), b_left);
        storage.set_right(Some(a), b_right);
        storage.set_parent(b_left, Some(a));
        storage.set_parent(b_right, Some(a));

        storage.set_color(Some(a), b_color);
        storage.set_color(Some(b), a_color);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn tree_of(keys: &[i32]) -> OrderedTree<i32, ()> {
        let mut tree = OrderedTree::new();
        for key in keys {
            let position = tree.find(key);
            let id = tree.storage_mut().add(*key, ());
            tree.link(id, position).unwrap();
        }
        tree
    }

    fn in_order(tree: &OrderedTree<i32, ()>) -> Vec<i32> {
        let mut keys = Vec::new();
        let mut current = tree.root().map(|root| tree.minimum(root));
        while let Some(id) = current {
            keys.push(tree.storage()[id].key);
            current = tree.successor(id);
        }
        keys
    }

    fn key(tree: &OrderedTree<i32, ()>, node: Option<NodeId>) -> Option<i32> {
        node.map(|id| tree.storage()[id].key)
    }

    #[test]
    fn test_search_and_extremes() {
        let tree = tree_of(&[17, 9, 19, 3, 12, 18, 75]);
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.height(), 3);
        assert_eq!(key(&tree, tree.search(&12)), Some(12));
        assert!(tree.search(&13).is_none());
        let root = tree.root().unwrap();
        assert_eq!(key(&tree, Some(tree.minimum(root))), Some(3));
        assert_eq!(key(&tree, Some(tree.maximum(root))), Some(75));
        assert_eq!(key(&tree, tree.closest(&13)), Some(12));
        assert_eq!(key(&tree, tree.closest(&19)), Some(19));
        assert!(tree.closest(&2).is_none());
        assert_eq!(in_order(&tree), [3, 9, 12, 17, 18, 19, 75]);
    }

    #[test]
    fn test_successor_and_predecessor() {
        let tree = tree_of(&[17, 9, 19, 3, 12, 18, 75]);
        let twelve = tree.search(&12).unwrap();
        assert_eq!(key(&tree, tree.successor(twelve)), Some(17));
        assert_eq!(key(&tree, tree.predecessor(twelve)), Some(9));

        let seventeen = tree.search(&17).unwrap();
        assert_eq!(key(&tree, tree.successor(seventeen)), Some(18));
        assert_eq!(key(&tree, tree.predecessor(seventeen)), Some(12));

        assert!(tree.successor(tree.search(&75).unwrap()).is_none());
        assert!(tree.predecessor(tree.search(&3).unwrap()).is_none());
    }

    #[test]
    fn test_link_requires_a_fresh_node() {
        let mut tree = tree_of(&[5, 3]);

        // Already linked.
        let three = tree.search(&3).unwrap();
        assert_eq!(tree.link(three, tree.find(&4)), Err(Error::InvalidArgument));

        // Occupied position.
        let id = tree.storage_mut().add(5, ());
        assert_eq!(tree.link(id, tree.find(&5)), Err(Error::InvalidArgument));

        // Stale position.
        let position = tree.find(&4);
        let four = tree.storage_mut().add(4, ());
        tree.link(four, position).unwrap();
        let other = tree.storage_mut().add(4, ());
        assert_eq!(tree.link(other, position), Err(Error::InvalidArgument));

        assert_eq!(in_order(&tree), [3, 4, 5]);
    }

    #[test]
    fn test_rotate() {
        /*
              [10]                [20]
             /    \              /    \
           [05]   [20]   ->   [10]    [30]
                 /    \       /   \
               [15]   [30]  [05]  [15]
        */
        let mut tree = tree_of(&[10, 5, 20, 15, 30]);
        let ten = tree.search(&10).unwrap();
        let twenty = tree.search(&20).unwrap();
        let fifteen = tree.search(&15).unwrap();

        assert_eq!(tree.rotate_left(ten), Ok(twenty));
        assert_eq!(tree.root(), Some(twenty));
        assert!(tree.storage().parent(Some(twenty)).is_none());
        assert_eq!(tree.storage().left(Some(twenty)), Some(ten));
        assert_eq!(tree.storage().parent(Some(ten)), Some(twenty));
        assert_eq!(tree.storage().right(Some(ten)), Some(fifteen));
        assert_eq!(tree.storage().parent(Some(fifteen)), Some(ten));
        assert_eq!(in_order(&tree), [5, 10, 15, 20, 30]);

        assert_eq!(tree.rotate_right(twenty), Ok(ten));
        assert_eq!(tree.root(), Some(ten));
        assert_eq!(tree.storage().right(Some(ten)), Some(twenty));
        assert_eq!(tree.storage().left(Some(twenty)), Some(fifteen));
        assert_eq!(in_order(&tree), [5, 10, 15, 20, 30]);

        // A leaf cannot be rotated in either direction.
        assert_eq!(tree.rotate_left(fifteen), Err(Error::InvalidOperation));
        assert_eq!(tree.rotate_right(fifteen), Err(Error::InvalidOperation));
    }

    #[test]
    fn test_splice() {
        let mut tree = tree_of(&[10, 5, 20, 30]);
        let twenty = tree.search(&20).unwrap();
        let thirty = tree.search(&30).unwrap();

        assert_eq!(tree.splice(twenty), Some(thirty));
        assert!(tree.storage()[twenty].is_detached());
        assert_eq!(tree.storage().parent(Some(thirty)), tree.root());
        assert_eq!(in_order(&tree), [5, 10, 30]);

        let root = tree.root().unwrap();
        let five = tree.search(&5).unwrap();
        assert!(tree.splice(five).is_none());
        assert_eq!(tree.splice(root), Some(thirty));
        assert_eq!(tree.root(), Some(thirty));
        assert!(tree.storage().parent(Some(thirty)).is_none());
    }

    #[test]
    fn test_swap_adjacent() {
        /*
              [10]              [20]
             /    \            /    \
           [05]   [20]  ->  [05]    [10]
                     \                 \
                     [30]              [30]
        */
        let mut tree = tree_of(&[10, 5, 20, 30]);
        let ten = tree.search(&10).unwrap();
        let five = tree.search(&5).unwrap();
        let twenty = tree.search(&20).unwrap();
        let thirty = tree.search(&30).unwrap();
        tree.storage_mut().set_black(Some(ten));

        tree.swap(ten, twenty);

        let storage = tree.storage();
        assert_eq!(tree.root(), Some(twenty));
        assert!(storage.is_black(Some(twenty)));
        assert!(storage.is_red(Some(ten)));
        assert!(storage.parent(Some(twenty)).is_none());
        assert_eq!(storage.left(Some(twenty)), Some(five));
        assert_eq!(storage.parent(Some(five)), Some(twenty));
        assert_eq!(storage.right(Some(twenty)), Some(ten));
        assert_eq!(storage.parent(Some(ten)), Some(twenty));
        assert!(storage.left(Some(ten)).is_none());
        assert_eq!(storage.right(Some(ten)), Some(thirty));
        assert_eq!(storage.parent(Some(thirty)), Some(ten));
    }

    #[test]
    fn test_swap_distant() {
        /*
                  [20]                  [25]
                 /    \                /    \
              [10]    [30]    ->    [10]    [30]
                      /                     /
                   [25]                  [20]
        */
        let mut tree = tree_of(&[20, 10, 30, 25]);
        let ten = tree.search(&10).unwrap();
        let twenty = tree.search(&20).unwrap();
        let twenty_five = tree.search(&25).unwrap();
        let thirty = tree.search(&30).unwrap();

        // Argument order does not matter.
        tree.swap(twenty_five, twenty);

        let storage = tree.storage();
        assert_eq!(tree.root(), Some(twenty_five));
        assert!(storage.parent(Some(twenty_five)).is_none());
        assert_eq!(storage.left(Some(twenty_five)), Some(ten));
        assert_eq!(storage.right(Some(twenty_five)), Some(thirty));
        assert_eq!(storage.parent(Some(ten)), Some(twenty_five));
        assert_eq!(storage.parent(Some(thirty)), Some(twenty_five));
        assert_eq!(storage.left(Some(thirty)), Some(twenty));
        assert_eq!(storage.parent(Some(twenty)), Some(thirty));
        assert!(storage.left(Some(twenty)).is_none());
        assert!(storage.right(Some(twenty)).is_none());
    }
}
