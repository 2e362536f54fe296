//! A library containing an ordered key/value index backed by a [Red-Black Tree](Rbt).
//!
//! The tree keeps its nodes in an arena owned by the tree itself. Nodes refer to each other through
//! [NodeId] handles rather than pointers, so the parent back-references never form ownership cycles and
//! no `unsafe` code is needed to walk the tree in either direction. Every operation that touches a single
//! key is O(log n) in the worst case.
//!
//! The crate is `no_std`, but does require an allocator for the node arena.
//!
//! Inserting a key that already exists replaces the value in place (an upsert), so the tree never holds
//! two equal keys.
//!
//! ## Features
//!
//! - `validate`: Exposes [Rbt::validate] in release builds. The checker is always available in test and
//!   debug builds.
//!
//! ## Benchmarks
//!
//! There are currently some benchmarks available in the `benches` directory. These benchmarks test the
//! performance of the tree with 4096 entries of 32bit, 128bit, and 384bit key sizes respectively. The tests
//! are as follows:
//!
//! - Insertion: Time to completely fill the tree with random numbers.
//! - Search: Time it takes to search for every element in the tree once.
//! - Delete: Time it takes to delete every element in the tree.
//!
//! ## Examples
//!
//! ```rust
//! use ordered_index::Rbt;
//!
//! let mut rbt: Rbt<u32, &str> = Rbt::new();
//!
//! rbt.insert(12, "twelve").unwrap();
//! rbt.insert(7, "seven").unwrap();
//! rbt.insert(14, "fourteen").unwrap();
//!
//! assert_eq!(rbt.search(&7), Some(&"seven"));
//! assert_eq!(rbt.minimum(), Some((&7, &"seven")));
//! assert_eq!(rbt.successor(&12).unwrap(), Some((&14, &"fourteen")));
//! assert_eq!(rbt.keys().copied().collect::<Vec<_>>(), [7, 12, 14]);
//!
//! assert_eq!(rbt.delete(&12), Ok("twelve"));
//! assert!(!rbt.contains(&12));
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#![no_std]
extern crate alloc;

mod bst;
mod iter;
mod node;
mod rbt;
#[cfg(any(test, debug_assertions, feature = "validate"))]
mod validate;

pub use iter::{Iter, Keys, Values};
pub use node::{Color, NodeId};
pub use rbt::Rbt;

/// Public result type for the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Public error types for the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A node that is already linked into a tree was given where a fresh node is required.
    InvalidArgument,
    /// The key or node handle was not found in the tree.
    NotFound,
    /// The operation is not defined for the node's current position in the tree.
    InvalidOperation,
    /// The tree failed a structural check. Only produced by [Rbt::validate].
    InvariantViolation(Violation),
}

/// The red-black or ordering property found broken by [Rbt::validate].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// The root of the tree is red.
    RedRoot(NodeId),
    /// A red node has a red child.
    RedRed {
        /// The red parent.
        parent: NodeId,
        /// The red child.
        child: NodeId,
    },
    /// The two subtrees of the node have different black-heights.
    BlackHeight(NodeId),
    /// The node's key is out of order with respect to one of its ancestors.
    Order(NodeId),
    /// The node does not point back to the node that links to it, or the root has a parent.
    Links(NodeId),
    /// The number of reachable nodes does not match the recorded length.
    Length {
        /// The length recorded by the tree.
        expected: usize,
        /// The number of nodes reachable from the root.
        found: usize,
    },
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidArgument => write!(f, "node is already linked into a tree"),
            Error::NotFound => write!(f, "key not found"),
            Error::InvalidOperation => write!(f, "operation not valid at this node"),
            Error::InvariantViolation(violation) => write!(f, "red-black invariant violated: {:?}", violation),
        }
    }
}

impl core::error::Error for Error {}
