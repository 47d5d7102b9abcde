use crate::arena::EMPTY_ARENA_PTR;
use crate::error::{Result, TreeError};
use crate::tracing_helpers::{debug_log, warn_log};
use crate::tree::{nodes_for, sibling_groups_for};
use crate::{NodeIdx, SiblingGroupIdx, Tree};

/// The links of a compact [`Tree`], detached from its capacity.
///
/// `parents[g]` is the parent of sibling group `g` (always `None` for the root group) and `first_children[n]` is the first
/// child of node `n` (`None` for leaves).
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeSnapshot {
    pub dimension: u8,
    pub size: usize,
    pub parents: Vec<Option<NodeIdx>>,
    pub first_children: Vec<Option<NodeIdx>>,
}

fn corrupt(reason: String) -> TreeError {
    warn_log!(reason = %reason, "rejected tree snapshot");
    TreeError::CorruptSnapshot(reason)
}

impl<const N: usize> Tree<N> {
    /// Records the links of this tree. Fails with [`TreeError::NotCompact`] unless the tree [`is_compact`](Self::is_compact).
    pub fn snapshot(&self) -> Result<TreeSnapshot> {
        if !self.is_compact() {
            return Err(TreeError::NotCompact);
        }
        let groups = sibling_groups_for(N, self.size) as u32;
        Ok(TreeSnapshot {
            dimension: N as u8,
            size: self.size,
            parents: (0..groups)
                .map(|group| self.links.parent(group).map(NodeIdx))
                .collect(),
            first_children: (0..self.size as u32)
                .map(|node| self.links.first_child(node).map(NodeIdx))
                .collect(),
        })
    }

    /// Rebuilds a tree from `snapshot` with room for `node_capacity` nodes (exactly the snapshot's size if `None`).
    ///
    /// The snapshot is validated: every group must hang off a node whose first child points back at it, and every node
    /// must be reachable from the root. The result is compact.
    pub fn from_snapshot(snapshot: &TreeSnapshot, node_capacity: Option<usize>) -> Result<Self> {
        if snapshot.dimension as usize != N {
            warn_log!(expected = N, found = snapshot.dimension, "rejected tree snapshot");
            return Err(TreeError::DimensionMismatch {
                expected: N,
                found: snapshot.dimension as usize,
            });
        }
        // The recorded links bound the size before any group arithmetic.
        let size = snapshot.size;
        if snapshot.first_children.len() != size {
            return Err(corrupt(format!(
                "size {} disagrees with {} first children",
                size,
                snapshot.first_children.len()
            )));
        }
        if size >= EMPTY_ARENA_PTR as usize {
            return Err(corrupt(format!("{} nodes exceed the arena's index range", size)));
        }
        let groups = sibling_groups_for(N, size);
        if size == 0 || nodes_for(N, groups) != size {
            return Err(corrupt(format!("{} is not a whole number of sibling groups", size)));
        }
        if snapshot.parents.len() != groups {
            return Err(corrupt(format!(
                "expected {} group parents, found {}",
                groups,
                snapshot.parents.len()
            )));
        }
        let capacity = node_capacity.unwrap_or(size);
        if capacity < size {
            warn_log!(nodes = size, capacity, "rejected tree snapshot");
            return Err(TreeError::InsufficientCapacity {
                nodes: size,
                capacity,
            });
        }
        if let Some(parent) = snapshot.parents[0] {
            return Err(corrupt(format!("root group has parent {:?}", parent)));
        }

        for (group, parent) in snapshot.parents.iter().enumerate().skip(1) {
            let group = SiblingGroupIdx(group as u32);
            let parent = parent.ok_or_else(|| corrupt(format!("group {:?} has no parent", group)))?;
            let first = Self::first_node(group);
            if snapshot.first_children.get(parent.index()) != Some(&Some(first)) {
                return Err(corrupt(format!(
                    "parent {:?} of group {:?} does not point back at {:?}",
                    parent, group, first
                )));
            }
        }
        for (node, first_child) in snapshot.first_children.iter().enumerate() {
            let Some(first) = *first_child else {
                continue;
            };
            let group = Self::sibling_group(first);
            let links_back = group != SiblingGroupIdx::ROOT
                && Self::first_node(group) == first
                && snapshot.parents.get(group.index()) == Some(&Some(NodeIdx(node as u32)));
            if !links_back {
                return Err(corrupt(format!(
                    "first child {:?} of node {} is not the first node of a group owned by it",
                    first, node
                )));
            }
        }

        let mut tree = Self::new(capacity);
        for (group, parent) in snapshot.parents.iter().enumerate() {
            tree.links.set_parent(group as u32, parent.map(|p| p.0));
        }
        for (node, first_child) in snapshot.first_children.iter().enumerate() {
            tree.links.set_first_child(node as u32, first_child.map(|c| c.0));
        }
        tree.size = size;
        tree.first_free = groups as u32;
        tree.group_end = groups as u32;

        // Consistent links can still form cycles detached from the root.
        let reachable = tree.depth_first().count();
        if reachable != size {
            return Err(corrupt(format!(
                "only {} of {} nodes are reachable from the root",
                reachable, size
            )));
        }

        debug_log!(size, capacity = tree.capacity(), "restored tree from snapshot");
        Ok(tree)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
