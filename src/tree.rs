use crate::arena::{ArenaPtr, LinkArena};
use crate::shape::{assert_dimension, children_count};
use crate::tracing_helpers::{debug_log, trace_log};
use crate::{ChildIndex, Level};

use smallvec::SmallVec;
use std::iter::FusedIterator;

/// Uniquely identifies a node slot in a [`Tree`].
///
/// Indices are stable until the node's sibling group is relocated by [`Tree::swap`] or [`Tree::sort`], or freed by
/// [`Tree::coarsen`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    pub const ROOT: Self = Self(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a block of `2^N` sibling nodes (or the root alone, for group 0).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SiblingGroupIdx(pub u32);

impl SiblingGroupIdx {
    pub const ROOT: Self = Self(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Number of sibling groups needed to store `node_count` nodes of an `nd`-dimensional tree.
#[inline]
pub const fn sibling_groups_for(nd: usize, node_count: usize) -> usize {
    match node_count {
        0 => 0,
        1 => 1,
        n => (n - 2) / children_count(nd) + 2,
    }
}

/// Number of nodes stored in `group_count` sibling groups of an `nd`-dimensional tree.
#[inline]
pub const fn nodes_for(nd: usize, group_count: usize) -> usize {
    match group_count {
        0 => 0,
        g => (g - 1) * children_count(nd) + 1,
    }
}

/// Number of nodes at `level` of a uniformly refined `nd`-dimensional tree.
#[inline]
pub const fn nodes_at_uniform_level(nd: usize, level: Level) -> usize {
    1 << (nd * level as usize)
}

/// Number of nodes in a uniformly refined `nd`-dimensional tree whose leaves are all at `level`.
pub const fn nodes_until_uniform_level(nd: usize, level: Level) -> usize {
    let mut total = 0;
    let mut l = 0;
    while l <= level {
        total += nodes_at_uniform_level(nd, l);
        l += 1;
    }
    total
}

/// The children of one node (or the members of one sibling group), in child position order.
///
/// Empty for leaves.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Children {
    next: u32,
    end: u32,
}

impl Children {
    #[inline]
    fn new(first: ArenaPtr, count: u32) -> Self {
        Self {
            next: first,
            end: first + count,
        }
    }
}

impl Iterator for Children {
    type Item = NodeIdx;

    #[inline]
    fn next(&mut self) -> Option<NodeIdx> {
        if self.next >= self.end {
            return None;
        }
        let node = NodeIdx(self.next);
        self.next += 1;
        Some(node)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.end - self.next) as usize;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Children {
    #[inline]
    fn next_back(&mut self) -> Option<NodeIdx> {
        if self.next >= self.end {
            return None;
        }
        self.end -= 1;
        Some(NodeIdx(self.end))
    }
}

impl ExactSizeIterator for Children {}

impl FusedIterator for Children {}

/// An `N`-dimensional spatial tree with `2^N` children per branch: a binary tree for `N = 1`, a quadtree for `N = 2` and
/// an octree for `N = 3`.
///
/// The tree only stores the graph. Per-node data lives outside, indexed by [`NodeIdx`], and can be kept in step with
/// compaction via [`Tree::sort_with`].
///
/// Storage is allocated once. Refinement takes the lowest free sibling group, so after coarsening the tree may have
/// holes; [`Tree::sort`] closes them and orders groups depth-first.
#[derive(Clone, Debug)]
pub struct Tree<const N: usize> {
    pub(crate) links: LinkArena,
    /// Number of nodes in use, including the root.
    pub(crate) size: usize,
    /// Lowest free sibling group, or the group capacity when there is none.
    pub(crate) first_free: ArenaPtr,
    /// One past the last sibling group in use.
    pub(crate) group_end: ArenaPtr,
}

impl<const N: usize> Tree<N> {
    const CHILDREN: u32 = 1 << N;

    /// A tree holding only the root, with room for at least `node_capacity` nodes.
    ///
    /// The capacity is rounded up to whole sibling groups.
    pub fn new(node_capacity: usize) -> Self {
        assert_dimension::<N>();
        assert!(node_capacity > 0, "a tree needs room for at least the root");
        let groups = sibling_groups_for(N, node_capacity);
        Self {
            links: LinkArena::new(nodes_for(N, groups), groups),
            size: 1,
            first_free: 1,
            group_end: 1,
        }
    }

    /// A tree whose leaves are all at `level`, with exactly the capacity it needs.
    pub fn uniform(level: Level) -> Self {
        Self::uniform_with_capacity(level, level)
    }

    /// A tree whose leaves are all at `level`, with room to refine uniformly down to `capacity_level`.
    pub fn uniform_with_capacity(level: Level, capacity_level: Level) -> Self {
        assert!(
            level <= capacity_level,
            "level {} exceeds capacity level {}",
            level,
            capacity_level
        );
        let mut tree = Self::new(nodes_until_uniform_level(N, capacity_level));
        let mut frontier = vec![NodeIdx::ROOT];
        for _ in 0..level {
            let mut next = Vec::with_capacity(frontier.len() << N);
            for node in frontier {
                tree.refine(node).unwrap_or_else(|| {
                    panic!("uniform tree ran out of capacity refining {:?}", node)
                });
                next.extend(tree.children(node));
            }
            frontier = next;
        }
        tree
    }

    /// Number of nodes in use, including the root.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Maximum number of nodes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.links.node_capacity()
    }

    #[inline]
    pub fn sibling_group_capacity(&self) -> usize {
        self.links.group_capacity()
    }

    /// The sibling group that stores `node`.
    #[inline]
    pub fn sibling_group(node: NodeIdx) -> SiblingGroupIdx {
        match node.0 {
            0 => SiblingGroupIdx::ROOT,
            n => SiblingGroupIdx((n - 1) / Self::CHILDREN + 1),
        }
    }

    /// The first node stored in `group`.
    #[inline]
    pub fn first_node(group: SiblingGroupIdx) -> NodeIdx {
        match group.0 {
            0 => NodeIdx::ROOT,
            g => NodeIdx(1 + Self::CHILDREN * (g - 1)),
        }
    }

    /// Every node slot of `group`, whether or not the group is in use.
    #[inline]
    pub fn group_nodes(group: SiblingGroupIdx) -> Children {
        let count = if group == SiblingGroupIdx::ROOT {
            1
        } else {
            Self::CHILDREN
        };
        Children::new(Self::first_node(group).0, count)
    }

    /// Returns true iff `group` holds live nodes.
    #[inline]
    pub fn is_in_use(&self, group: SiblingGroupIdx) -> bool {
        self.assert_group(group);
        group == SiblingGroupIdx::ROOT || self.links.parent(group.0).is_some()
    }

    /// Returns true iff `node` is a live node of this tree.
    #[inline]
    pub fn contains_node(&self, node: NodeIdx) -> bool {
        node.index() < self.capacity() && self.is_in_use(Self::sibling_group(node))
    }

    /// Returns true iff the nodes in use occupy exactly the lowest sibling groups.
    #[inline]
    pub fn is_compact(&self) -> bool {
        self.first_free as usize == sibling_groups_for(N, self.size)
    }

    #[inline]
    pub fn is_root(&self, node: NodeIdx) -> bool {
        node == NodeIdx::ROOT
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeIdx) -> bool {
        self.assert_node(node);
        self.links.first_child(node.0).is_none()
    }

    #[inline]
    pub fn parent(&self, node: NodeIdx) -> Option<NodeIdx> {
        self.assert_node(node);
        if self.is_root(node) {
            return None;
        }
        self.links.parent(Self::sibling_group(node).0).map(NodeIdx)
    }

    #[inline]
    pub fn children(&self, node: NodeIdx) -> Children {
        self.assert_node(node);
        self.links
            .first_child(node.0)
            .map(|first| Children::new(first, Self::CHILDREN))
            .unwrap_or_default()
    }

    /// The child at `position`, or `None` if `node` is a leaf.
    #[inline]
    pub fn child(&self, node: NodeIdx, position: ChildIndex) -> Option<NodeIdx> {
        assert!(
            u32::from(position) < Self::CHILDREN,
            "position in parent {} out of bounds [0, {})",
            position,
            Self::CHILDREN
        );
        self.assert_node(node);
        self.links
            .first_child(node.0)
            .map(|first| NodeIdx(first + u32::from(position)))
    }

    /// The sibling group holding the children of `node`, or `None` if it is a leaf.
    #[inline]
    pub fn children_group(&self, node: NodeIdx) -> Option<SiblingGroupIdx> {
        self.assert_node(node);
        self.links
            .first_child(node.0)
            .map(|first| Self::sibling_group(NodeIdx(first)))
    }

    #[inline]
    pub fn child_count(&self, node: NodeIdx) -> usize {
        if self.is_leaf(node) {
            0
        } else {
            children_count(N)
        }
    }

    /// Position of `node` among its siblings, or `None` for the root.
    #[inline]
    pub fn position_in_parent(&self, node: NodeIdx) -> Option<ChildIndex> {
        self.assert_node(node);
        (!self.is_root(node)).then(|| ((node.0 - 1) % Self::CHILDREN) as ChildIndex)
    }

    /// `node` and its siblings, in child position order.
    #[inline]
    pub fn siblings(&self, node: NodeIdx) -> Children {
        self.assert_node(node);
        Self::group_nodes(Self::sibling_group(node))
    }

    /// Sibling groups in use, in storage order.
    pub fn sibling_groups(&self) -> impl Iterator<Item = SiblingGroupIdx> + '_ {
        (0..self.group_end)
            .map(SiblingGroupIdx)
            .filter(move |&group| self.is_in_use(group))
    }

    /// Nodes in use, in storage order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.sibling_groups().flat_map(Self::group_nodes)
    }

    /// Leaves, in storage order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.nodes().filter(move |&node| self.is_leaf(node))
    }

    /// All nodes in pre-order, children in child position order.
    pub fn depth_first(&self) -> DepthFirst<'_, N> {
        let mut stack = SmallVec::new();
        stack.push(NodeIdx::ROOT);
        DepthFirst { tree: self, stack }
    }

    /// Visit `ancestor` and all descendants in pre-order.
    ///
    /// If `visitor` returns [`VisitCommand::SkipDescendants`], descendants of that node will not be visited.
    pub fn visit_depth_first(
        &self,
        ancestor: NodeIdx,
        mut visitor: impl FnMut(NodeIdx) -> VisitCommand,
    ) {
        let mut stack = SmallVec::<[NodeIdx; 32]>::new();
        stack.push(ancestor);
        while let Some(node) = stack.pop() {
            if let VisitCommand::Continue = visitor(node) {
                stack.extend(self.children(node).rev());
            }
        }
    }

    /// Gives the leaf `node` `2^N` leaf children, stored in the lowest free sibling group.
    ///
    /// Returns the new group, or `None` (leaving the tree untouched) if the tree is full.
    pub fn refine(&mut self, node: NodeIdx) -> Option<SiblingGroupIdx> {
        assert!(self.contains_node(node), "cannot refine free node {:?}", node);
        assert!(
            self.is_leaf(node),
            "cannot refine node {:?}: it already has children",
            node
        );
        if self.size == self.capacity() {
            debug_log!(
                node = node.0,
                capacity = self.capacity(),
                "tree is full, refinement refused"
            );
            return None;
        }

        let group = SiblingGroupIdx(self.first_free);
        self.size += children_count(N);
        self.links.set_parent(group.0, Some(node.0));
        self.links
            .set_first_child(node.0, Some(Self::first_node(group).0));
        self.first_free = self.scan_free_group(group.0 + 1);
        self.group_end = self.group_end.max(group.0 + 1);

        trace_log!(node = node.0, group = group.0, size = self.size, "refined");
        Some(group)
    }

    /// Removes the children of `node`, which must all be leaves.
    pub fn coarsen(&mut self, node: NodeIdx) {
        assert!(
            self.contains_node(node),
            "cannot coarsen free node {:?}",
            node
        );
        let group = self
            .children_group(node)
            .unwrap_or_else(|| panic!("cannot coarsen leaf {:?}", node));
        assert!(
            self.children(node).all(|child| self.is_leaf(child)),
            "cannot coarsen node {:?}: its children have children",
            node
        );

        self.size -= children_count(N);
        self.first_free = self.first_free.min(group.0);
        self.links.set_parent(group.0, None);
        self.links.set_first_child(node.0, None);
        if group.0 + 1 == self.group_end {
            self.shrink_group_end();
        }

        trace_log!(node = node.0, group = group.0, size = self.size, "coarsened");
    }

    /// Exchanges the storage of sibling groups `a` and `b`, preserving the tree's graph.
    ///
    /// Every node of `a` moves to the same position in `b` and vice versa, together with its children and parent links.
    /// Either group may be free. Node indices into the two groups are invalidated.
    pub fn swap(&mut self, a: SiblingGroupIdx, b: SiblingGroupIdx) {
        assert!(
            a != SiblingGroupIdx::ROOT && b != SiblingGroupIdx::ROOT,
            "the root group cannot be swapped"
        );
        assert_ne!(a, b, "cannot swap group {:?} with itself", a);
        let a_in_use = self.is_in_use(a);
        let b_in_use = self.is_in_use(b);
        if !a_in_use && !b_in_use {
            return;
        }

        // Children of the exchanged nodes.
        for (x, y) in Self::group_nodes(a).zip(Self::group_nodes(b)) {
            self.links.swap_first_children(x.0, y.0);
            self.relink_children(x);
            self.relink_children(y);
        }

        // Parents of the exchanged groups. Read after relinking, since one group may be the other's parent.
        let a_parent = self.links.parent(a.0);
        let b_parent = self.links.parent(b.0);
        if let Some(parent) = a_parent {
            self.links
                .set_first_child(parent, Some(Self::first_node(b).0));
        }
        self.links.set_parent(b.0, a_parent);
        if let Some(parent) = b_parent {
            self.links
                .set_first_child(parent, Some(Self::first_node(a).0));
        }
        self.links.set_parent(a.0, b_parent);

        if a_in_use != b_in_use {
            let (freed, taken) = if a_in_use { (a.0, b.0) } else { (b.0, a.0) };
            self.first_free = self.first_free.min(freed);
            if self.first_free == taken {
                self.first_free = self.scan_free_group(taken + 1);
            }
            self.group_end = self.group_end.max(taken + 1);
            self.shrink_group_end();
        }

        trace_log!(a = a.0, b = b.0, "swapped sibling groups");
    }

    fn relink_children(&mut self, node: NodeIdx) {
        if let Some(first) = self.links.first_child(node.0) {
            let group = Self::sibling_group(NodeIdx(first));
            self.links.set_parent(group.0, Some(node.0));
        }
    }

    fn scan_free_group(&self, start: ArenaPtr) -> ArenaPtr {
        let capacity = self.sibling_group_capacity() as ArenaPtr;
        (start..capacity)
            .find(|&group| self.links.parent(group).is_none())
            .unwrap_or(capacity)
    }

    fn shrink_group_end(&mut self) {
        while self.group_end > 1 && self.links.parent(self.group_end - 1).is_none() {
            self.group_end -= 1;
        }
    }

    #[inline]
    fn assert_node(&self, node: NodeIdx) {
        assert!(
            node.index() < self.capacity(),
            "node {:?} out of bounds [0, {})",
            node,
            self.capacity()
        );
    }

    #[inline]
    fn assert_group(&self, group: SiblingGroupIdx) {
        assert!(
            group.index() < self.sibling_group_capacity(),
            "sibling group {:?} out of bounds [0, {})",
            group,
            self.sibling_group_capacity()
        );
    }
}

/// Two trees are equal when they hold the same number of nodes and, pairing nodes by depth-first position, every pair
/// has the same parent and the same children.
impl<const N: usize> PartialEq for Tree<N> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
            && self
                .depth_first()
                .zip(other.depth_first())
                .all(|(a, b)| self.parent(a) == other.parent(b) && self.children(a) == other.children(b))
    }
}

impl<const N: usize> Eq for Tree<N> {}

/// Pre-order iterator returned by [`Tree::depth_first`].
#[derive(Clone, Debug)]
pub struct DepthFirst<'a, const N: usize> {
    tree: &'a Tree<N>,
    stack: SmallVec<[NodeIdx; 32]>,
}

impl<'a, const N: usize> Iterator for DepthFirst<'a, N> {
    type Item = NodeIdx;

    #[inline]
    fn next(&mut self) -> Option<NodeIdx> {
        let node = self.stack.pop()?;
        self.stack.extend(self.tree.children(node).rev());
        Some(node)
    }
}

impl<'a, const N: usize> FusedIterator for DepthFirst<'a, N> {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VisitCommand {
    Continue,
    SkipDescendants,
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
