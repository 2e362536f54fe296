//! Ordered Index - Red-Black Tree
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use core::borrow::Borrow;

use crate::{
    bst::{OrderedTree, Position},
    iter::{Iter, Keys, Values},
    node::{Color, NodeId, Side},
    Error, Result,
};

/// The repair step to apply after linking a new red node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertCase {
    /// The node is the root. Paint it black.
    Root,
    /// The parent is black, nothing is violated.
    BlackParent,
    /// Parent and uncle are red. Push the grandparent's black down and continue from the grandparent.
    RedUncle { parent: NodeId, uncle: NodeId, grandparent: NodeId },
    /// The uncle is black and the node is on the opposite side of its parent than the parent is of the
    /// grandparent. Rotate it into the outer position.
    InnerGrandchild { parent: NodeId, side: Side },
    /// The uncle is black and the node is on the same side as its parent. Rotate the grandparent away.
    OuterGrandchild { parent: NodeId, grandparent: NodeId, side: Side },
}

/// The repair step to apply while a black leaf is about to be removed.
///
/// The node being repaired is "doubly black": the paths through it are one black node short once the leaf
/// is gone. `side` is always the side of that node under `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteCase {
    /// The shortage reached the root, every path lost one black node equally.
    Root,
    /// The sibling is red. Rotate it above the parent so the node gets a black sibling.
    RedSibling { parent: NodeId, sibling: NodeId, side: Side },
    /// Parent, sibling and both nephews are black. Paint the sibling red and move the shortage up.
    BlackFamily { parent: NodeId, sibling: NodeId },
    /// Red parent, black sibling and nephews. Swapping parent and sibling colors settles it.
    RedParent { parent: NodeId, sibling: NodeId },
    /// Black sibling with a red near nephew and black far nephew. Rotate the near nephew outwards.
    NearNephewRed { sibling: NodeId, near: NodeId, side: Side },
    /// Black sibling with a red far nephew. Rotate the sibling above the parent.
    FarNephewRed { parent: NodeId, sibling: NodeId, far: NodeId, side: Side },
}

/// A red-black tree mapping ordered keys to values.
///
/// Nodes are stored in an arena owned by the tree and linked to each other with [NodeId] handles. Inserting
/// a key that is already present replaces its value.
pub struct Rbt<K, V> {
    tree: OrderedTree<K, V>,
}

impl<K, V> Rbt<K, V> {
    /// Creates an empty red-black tree.
    ///
    /// No memory is allocated until the first insertion.
    pub const fn new() -> Self {
        Rbt { tree: OrderedTree::new() }
    }

    /// Creates an empty red-black tree that can hold `capacity` entries without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Rbt { tree: OrderedTree::with_capacity(capacity) }
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the number of elements in the tree.
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Indicates whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of entries the tree can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.tree.storage().capacity()
    }

    /// Reserves space for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.tree.storage_mut().reserve(additional);
    }

    /// Returns the height of the tree, counting nodes on the longest root to leaf path.
    ///
    /// # Time Complexity
    ///
    /// O(n)
    ///
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Removes every entry from the tree.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    #[cfg(any(test, debug_assertions, feature = "validate"))]
    pub(crate) fn tree(&self) -> &OrderedTree<K, V> {
        &self.tree
    }

    #[cfg(test)]
    pub(crate) fn tree_mut(&mut self) -> &mut OrderedTree<K, V> {
        &mut self.tree
    }

    fn entry(&self, id: NodeId) -> (&K, &V) {
        let node = &self.tree.storage()[id];
        (&node.key, &node.value)
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn minimum(&self) -> Option<(&K, &V)> {
        let root = self.tree.root()?;
        Some(self.entry(self.tree.minimum(root)))
    }

    /// Returns the entry with the largest key.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn maximum(&self) -> Option<(&K, &V)> {
        let root = self.tree.root()?;
        Some(self.entry(self.tree.maximum(root)))
    }

    /// Directly accesses an entry through a handle returned by [get_handle](Self::get_handle).
    ///
    /// The handle is only guaranteed to refer to the same entry until the next deletion, as deleted slots
    /// are reused by later insertions.
    ///
    /// # Time Complexity
    ///
    /// O(1)
    ///
    pub fn get_with_handle(&self, id: NodeId) -> Option<(&K, &V)> {
        self.tree.storage().get(id).map(|node| (&node.key, &node.value))
    }

    /// Deletes the entry referred to by `id`, returning it.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    /// # Errors
    ///
    /// Returns [NotFound](Error::NotFound) if the handle does not refer to an entry.
    ///
    pub fn delete_with_handle(&mut self, id: NodeId) -> Result<(K, V)> {
        if self.tree.storage().get(id).is_none() {
            log::debug!("delete through stale handle {:?}", id);
            return Err(Error::NotFound);
        }
        self.remove_node(id)
    }

    /// Returns an in-order iterator over the entries of the tree.
    ///
    /// The iterator borrows the tree, so the tree cannot change while it is alive. Calling this again starts
    /// a fresh traversal from the smallest key.
    pub fn in_order(&self) -> Iter<'_, K, V> {
        Iter::new(&self.tree)
    }

    /// Returns an in-order iterator over the entries of the tree.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.in_order()
    }

    /// Returns an in-order iterator over the keys of the tree.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.in_order())
    }

    /// Returns an in-order iterator over the values of the tree.
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.in_order())
    }

    /// Unlinks the node from the tree, rebalances, and releases its storage.
    fn remove_node(&mut self, id: NodeId) -> Result<(K, V)> {
        let storage = self.tree.storage();
        if let (Some(_), Some(right)) = (storage.left(Some(id)), storage.right(Some(id))) {
            // Trade places with the successor, which has no left child. Colors trade with the positions.
            let successor = self.tree.minimum(right);
            self.tree.swap(id, successor);
        }

        let storage = self.tree.storage();
        let child = storage.left(Some(id)).or(storage.right(Some(id)));
        match (storage.color(Some(id)), child) {
            // A red node with at most one child is a leaf, no black-height changes.
            (Color::Red, _) => {
                self.tree.splice(id);
            }
            // The lone child of a black node is red, it takes over the black.
            (Color::Black, Some(child)) => {
                self.tree.splice(id);
                self.tree.storage_mut().set_black(Some(child));
            }
            // Fix the tree up first while the leaf still anchors its position, then remove it.
            (Color::Black, None) => {
                self.fixup_delete(id)?;
                self.tree.splice(id);
            }
        }

        log::debug!("removed {:?}, {} nodes remain", id, self.len() - 1);
        self.tree.storage_mut().delete(id).map(|node| node.into_entry())
    }

    fn insert_case(&self, node: NodeId) -> Result<InsertCase> {
        let storage = self.tree.storage();
        let Some(parent) = storage.parent(Some(node)) else {
            return Ok(InsertCase::Root);
        };
        if storage.is_black(Some(parent)) {
            return Ok(InsertCase::BlackParent);
        }

        // The root is black, so a red parent always has a parent of its own.
        let grandparent = storage.grandparent(node).expect("Parent is red, grandparent should exist");
        if let Some(uncle) = storage.uncle(node).filter(|&u| storage.is_red(Some(u))) {
            return Ok(InsertCase::RedUncle { parent, uncle, grandparent });
        }

        let side = storage.side(parent)?;
        if storage.side(node)? == side {
            Ok(InsertCase::OuterGrandchild { parent, grandparent, side })
        } else {
            Ok(InsertCase::InnerGrandchild { parent, side: side.opposite() })
        }
    }

    /// Updates the tree after a node has been added, to meet the red-black tree properties.
    fn fixup_add(&mut self, node: NodeId) -> Result<()> {
        let mut node = node;
        loop {
            let case = self.insert_case(node)?;
            log::trace!("insert fixup at {:?}: {:?}", node, case);
            let storage = self.tree.storage_mut();
            match case {
                InsertCase::Root => {
                    storage.set_black(Some(node));
                    return Ok(());
                }
                InsertCase::BlackParent => return Ok(()),
                InsertCase::RedUncle { parent, uncle, grandparent } => {
                    storage.set_black(Some(parent));
                    storage.set_black(Some(uncle));
                    storage.set_red(Some(grandparent));
                    node = grandparent;
                }
                InsertCase::InnerGrandchild { parent, side } => {
                    // The parent drops below the node, and is now the outer grandchild.
                    self.tree.rotate(parent, side.opposite())?;
                    node = parent;
                }
                InsertCase::OuterGrandchild { parent, grandparent, side } => {
                    self.tree.rotate(grandparent, side.opposite())?;
                    let storage = self.tree.storage_mut();
                    storage.set_black(Some(parent));
                    storage.set_red(Some(grandparent));
                    return Ok(());
                }
            }
        }
    }

    fn delete_case(&self, node: NodeId) -> Result<DeleteCase> {
        let storage = self.tree.storage();
        let Some(parent) = storage.parent(Some(node)) else {
            return Ok(DeleteCase::Root);
        };
        let side = storage.side(node)?;

        // The node is black, so the other side of the parent has at least one black node as well.
        let sibling = storage.sibling(node).expect("Doubly black node should have a sibling");
        if storage.is_red(Some(sibling)) {
            return Ok(DeleteCase::RedSibling { parent, sibling, side });
        }

        let near = storage.child(Some(sibling), side);
        let far = storage.child(Some(sibling), side.opposite());
        Ok(match (far, near) {
            (Some(far), _) if storage.is_red(Some(far)) => DeleteCase::FarNephewRed { parent, sibling, far, side },
            (_, Some(near)) if storage.is_red(Some(near)) => DeleteCase::NearNephewRed { sibling, near, side },
            _ if storage.is_red(Some(parent)) => DeleteCase::RedParent { parent, sibling },
            _ => DeleteCase::BlackFamily { parent, sibling },
        })
    }

    /// Updates the tree before a black leaf is removed, to meet the red-black tree properties.
    fn fixup_delete(&mut self, node: NodeId) -> Result<()> {
        let mut node = node;
        loop {
            let case = self.delete_case(node)?;
            log::trace!("delete fixup at {:?}: {:?}", node, case);
            let storage = self.tree.storage_mut();
            match case {
                DeleteCase::Root => return Ok(()),
                DeleteCase::RedSibling { parent, sibling, side } => {
                    storage.set_black(Some(sibling));
                    storage.set_red(Some(parent));
                    self.tree.rotate(parent, side)?;
                }
                DeleteCase::BlackFamily { parent, sibling } => {
                    storage.set_red(Some(sibling));
                    node = parent;
                }
                DeleteCase::RedParent { parent, sibling } => {
                    storage.set_red(Some(sibling));
                    storage.set_black(Some(parent));
                    return Ok(());
                }
                DeleteCase::NearNephewRed { sibling, near, side } => {
                    storage.set_black(Some(near));
                    storage.set_red(Some(sibling));
                    self.tree.rotate(sibling, side.opposite())?;
                }
                DeleteCase::FarNephewRed { parent, sibling, far, side } => {
                    let color = storage.color(Some(parent));
                    storage.set_color(Some(sibling), color);
                    storage.set_black(Some(parent));
                    storage.set_black(Some(far));
                    self.tree.rotate(parent, side)?;
                    return Ok(());
                }
            }
        }
    }
}

impl<K: Ord, V> Rbt<K, V> {
    /// Adds a key and value into the tree.
    ///
    /// If the key is already present its value is replaced and the previous value is returned. The key
    /// stored in the tree is left untouched.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let position = match self.tree.find(&key) {
            Position::Occupied(id) => {
                let node = &mut self.tree.storage_mut()[id];
                return Ok(Some(core::mem::replace(&mut node.value, value)));
            }
            position => position,
        };

        let id = self.tree.storage_mut().add(key, value);
        if let Err(err) = self.tree.link(id, position) {
            self.tree.storage_mut().delete(id)?;
            return Err(err);
        }
        self.fixup_add(id)?;
        Ok(None)
    }

    /// Searches for a key in the tree, returning its value if it exists.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Searches for a key in the tree, returning its value if it exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key)
    }

    /// Searches for a key in the tree, returning the stored key and its value if it exists.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.search(key).map(|id| self.entry(id))
    }

    /// Searches for a key in the tree, returning a mutable reference to its value if it exists.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.search(key)?;
        Some(&mut self.tree.storage_mut()[id].value)
    }

    /// Indicates whether the key is in the tree.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.search(key).is_some()
    }

    /// Searches the tree for a key, returning a handle to its entry.
    ///
    /// The handle should only be used for immediate direct access through
    /// [get_with_handle](Self::get_with_handle) or [delete_with_handle](Self::delete_with_handle) and should
    /// not be stored, as a deletion may hand its slot to a different entry.
    pub fn get_handle<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.search(key)
    }

    /// Searches the tree, returning the entry with the closest key to the given key, rounded down.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn closest<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.closest(key).map(|id| self.entry(id))
    }

    /// Returns the entry that follows `key` in order, or `None` if `key` is the largest key.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    /// # Errors
    ///
    /// Returns [NotFound](Error::NotFound) if `key` is not in the tree.
    ///
    pub fn successor<Q>(&self, key: &Q) -> Result<Option<(&K, &V)>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.search(key).ok_or(Error::NotFound)?;
        Ok(self.tree.successor(id).map(|next| self.entry(next)))
    }

    /// Returns the entry that precedes `key` in order, or `None` if `key` is the smallest key.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    /// # Errors
    ///
    /// Returns [NotFound](Error::NotFound) if `key` is not in the tree.
    ///
    pub fn predecessor<Q>(&self, key: &Q) -> Result<Option<(&K, &V)>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.search(key).ok_or(Error::NotFound)?;
        Ok(self.tree.predecessor(id).map(|prev| self.entry(prev)))
    }

    /// Deletes a key from the tree, returning its value.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    /// # Errors
    ///
    /// Returns [NotFound](Error::NotFound) if the key is not in the tree. The tree is left unchanged.
    ///
    pub fn delete<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Deletes a key from the tree, returning the stored key and its value.
    ///
    /// # Errors
    ///
    /// Returns [NotFound](Error::NotFound) if the key is not in the tree. The tree is left unchanged.
    ///
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.search(key).ok_or(Error::NotFound)?;
        self.remove_node(id)
    }
}

impl<K, V> Default for Rbt<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> core::fmt::Debug for Rbt<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rbt")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("height", &self.height())
            .finish()
    }
}

impl<'a, K, V> IntoIterator for &'a Rbt<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.in_order()
    }
}

impl<K: Ord, V> Extend<(K, V)> for Rbt<K, V> {
    /// Inserts every pair in order. Later pairs overwrite the values of earlier pairs with the same key.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value).expect("Linking a fresh node into a vacant position should not fail");
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Rbt<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut rbt = Rbt::with_capacity(iter.size_hint().0);
        rbt.extend(iter);
        rbt
    }
}
