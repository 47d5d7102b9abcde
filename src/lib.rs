//! Arena-backed binary trees, quadtrees and octrees for adaptive mesh refinement.
//!
//! A [`Tree<N>`](crate::Tree) stores only the graph of an `N`-dimensional hierarchical grid ([`BinaryTree`],
//! [`QuadTree`] or [`OctTree`]). Nodes are addressed by [`NodeIdx`] and per-node data lives in the caller's own arrays.
//! Children of one node are stored together in a sibling group, so a branch costs one parent pointer per group and one
//! child pointer per node.
//!
//! A [`LocationCode`](crate::LocationCode) identifies a node by its path from the root, packed as a Morton code. It is
//! independent of the tree's storage, which makes it the natural key for spatial queries:
//!
//! - [`Tree::location`] and [`Tree::node_at`] convert between the two.
//! - [`Tree::neighbor`] finds the same-level node across a face, edge or corner ([`Manifold`]).
//! - [`Tree::neighbors`] and [`Tree::all_neighbors`] find every leaf touching a node, at any level.
//!
//! # Performance
//!
//! - refine, coarsen, parent, children: O(1) (refine scans for the next free group after the one it takes)
//! - location, node at location, neighbor: O(depth)
//! - sort: O(nodes)
//! - memory per node: 4 bytes, plus 4 bytes per sibling group
//!
//! Storage is allocated once by [`Tree::new`] and never grows.

mod arena;
mod balance;
mod error;
mod location;
mod navigation;
mod neighbor;
mod shape;
mod snapshot;
mod sort;
mod tracing_helpers;
mod tree;

pub use error::*;
pub use location::*;
pub use navigation::*;
pub use neighbor::*;
pub use shape::*;
pub use snapshot::*;
pub use tree::*;

#[cfg(feature = "glam")]
mod impl_glam;

#[cfg(feature = "glam")]
pub use glam;

/// Depth of a node; the root is at level 0.
pub type Level = u8;

/// A linear index of a node relative to its parent.
pub type ChildIndex = u8;

/// A linear index of a neighbor relative to a node, within one [`Manifold`].
pub type NeighborIndex = u8;

/// A one-dimensional [`Tree`].
pub type BinaryTree = Tree<1>;
/// A two-dimensional [`Tree`].
pub type QuadTree = Tree<2>;
/// A three-dimensional [`Tree`].
pub type OctTree = Tree<3>;
