//! Ordered Index - Red-Black Tree invariant checker
//!
//! Only compiled for tests, debug builds, or with the `validate` feature. Nothing on the insert or delete
//! path calls into this module.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::vec::Vec;

use crate::{bst::OrderedTree, node::NodeId, Error, Rbt, Result, Violation};

/// A subtree still to be checked, along with the exclusive key bounds its ancestors impose on it.
struct Frame<'a, K> {
    node: NodeId,
    lower: Option<&'a K>,
    upper: Option<&'a K>,
}

impl<K: Ord, V> Rbt<K, V> {
    /// Walks the whole tree checking every red-black and ordering property.
    ///
    /// On success returns the black-height of the tree: the number of black nodes on every path from the
    /// root down to an absent leaf. An empty tree has a black-height of 0.
    ///
    /// # Time Complexity
    ///
    /// O(n)
    ///
    /// # Errors
    ///
    /// Returns [InvariantViolation](Error::InvariantViolation) describing the first broken property found.
    ///
    pub fn validate(&self) -> Result<usize> {
        check(self.tree(), self.len()).map_err(Error::InvariantViolation)
    }
}

fn check<K: Ord, V>(tree: &OrderedTree<K, V>, expected: usize) -> core::result::Result<usize, Violation> {
    let storage = tree.storage();
    let Some(root) = tree.root() else {
        return match expected {
            0 => Ok(0),
            _ => Err(Violation::Length { expected, found: 0 }),
        };
    };

    if storage.parent(Some(root)).is_some() {
        return Err(Violation::Links(root));
    }
    if storage.is_red(Some(root)) {
        return Err(Violation::RedRoot(root));
    }

    // Pre-order pass for ordering, links and coloring. An explicit stack keeps degenerate trees from
    // overflowing the call stack.
    let mut found = 0;
    let mut stack = Vec::from([Frame { node: root, lower: None, upper: None }]);
    while let Some(Frame { node, lower, upper }) = stack.pop() {
        found += 1;
        if found > expected {
            return Err(Violation::Length { expected, found });
        }

        let key = &storage[node].key;
        if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
            return Err(Violation::Order(node));
        }

        for (child, lower, upper) in
            [(storage.left(Some(node)), lower, Some(key)), (storage.right(Some(node)), Some(key), upper)]
        {
            let Some(child) = child else {
                continue;
            };
            if storage.parent(Some(child)) != Some(node) {
                return Err(Violation::Links(child));
            }
            if storage.is_red(Some(node)) && storage.is_red(Some(child)) {
                return Err(Violation::RedRed { parent: node, child });
            }
            stack.push(Frame { node: child, lower, upper });
        }
    }
    if found != expected {
        return Err(Violation::Length { expected, found });
    }

    black_height(tree, Some(root))
}

/// Returns the number of black nodes on every path from `node` to an absent leaf, including `node`.
///
/// The depth of the recursion is bounded by the height, which the ordering pass has already proven finite.
fn black_height<K, V>(tree: &OrderedTree<K, V>, node: Option<NodeId>) -> core::result::Result<usize, Violation> {
    let Some(id) = node else {
        return Ok(0);
    };
    let storage = tree.storage();
    let left = black_height(tree, storage.left(node))?;
    let right = black_height(tree, storage.right(node))?;
    if left != right {
        return Err(Violation::BlackHeight(id));
    }
    Ok(left + usize::from(storage.is_black(node)))
}
