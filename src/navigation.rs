//! Spatial queries that combine a [`Tree`] with [`LocationCode`]s and the neighbor stencils.

use crate::neighbor::Manifold;
use crate::{ChildIndex, Level, LocationCode, NeighborIndex, NodeIdx, Tree};

use smallvec::SmallVec;

/// The deepest existing node on the path to some location, as found by [`Tree::node_or_parent_at`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NodeAt {
    pub node: NodeIdx,
    pub level: Level,
}

/// Neighbor sets are small: at most [`max_neighbor_count`](crate::max_neighbor_count) for a 2:1 balanced tree.
pub type Neighbors = SmallVec<[NodeIdx; 32]>;

impl<const N: usize> Tree<N> {
    /// Depth of `node`; the root is at level 0.
    pub fn level(&self, node: NodeIdx) -> Level {
        assert!(self.contains_node(node), "free node {:?} has no level", node);
        let mut level = 0;
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            level += 1;
            current = parent;
        }
        level
    }

    /// The location code of `node`, built by walking up to the root.
    pub fn location(&self, node: NodeIdx) -> LocationCode<N> {
        assert!(self.contains_node(node), "free node {:?} has no location", node);
        let mut positions = SmallVec::<[ChildIndex; 32]>::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            // Non-root nodes always have a position.
            positions.extend(self.position_in_parent(current));
            current = parent;
        }
        LocationCode::from_path(positions.into_iter().rev())
    }

    /// The node at `location`, if the tree is refined that deep.
    pub fn node_at(&self, location: LocationCode<N>) -> Option<NodeIdx> {
        let found = self.node_or_parent_at(location);
        (found.level == location.level()).then_some(found.node)
    }

    /// The node at `location` or, if the tree is not refined that deep, the leaf that contains it.
    pub fn node_or_parent_at(&self, location: LocationCode<N>) -> NodeAt {
        let mut found = NodeAt {
            node: NodeIdx::ROOT,
            level: 0,
        };
        for position in location.path() {
            match self.child(found.node, position) {
                Some(child) => {
                    found.node = child;
                    found.level += 1;
                }
                None => break,
            }
        }
        found
    }

    /// The code of the same-level node at `position` across `manifold`, or `None` outside the root's domain.
    #[inline]
    pub fn neighbor_location(
        &self,
        location: LocationCode<N>,
        manifold: Manifold,
        position: NeighborIndex,
    ) -> Option<LocationCode<N>> {
        location.shift(manifold.offset_vector::<N>(position))
    }

    /// The same-level neighbor of `location` at `position` across `manifold`.
    ///
    /// Returns `None` when the neighbor lies outside the domain or the tree is not refined that deep there.
    pub fn neighbor(
        &self,
        location: LocationCode<N>,
        manifold: Manifold,
        position: NeighborIndex,
    ) -> Option<NodeIdx> {
        self.neighbor_location(location, manifold, position)
            .and_then(|neighbor| self.node_at(neighbor))
    }

    /// Same as [`neighbor`](Self::neighbor), starting from a node.
    pub fn neighbor_of(
        &self,
        node: NodeIdx,
        manifold: Manifold,
        position: NeighborIndex,
    ) -> Option<NodeIdx> {
        self.neighbor(self.location(node), manifold, position)
    }

    /// Every node touching `location` across `manifold`.
    ///
    /// For each position this is the same-level neighbor if it is a leaf, the coarser leaf containing it if the tree is
    /// not refined that deep, or the neighbor's children that touch `location` if it is refined. Each node is reported
    /// once, in position order, even where several positions fall inside one coarse leaf of an unbalanced tree.
    pub fn neighbors(&self, location: LocationCode<N>, manifold: Manifold) -> Neighbors {
        let mut neighbors = Neighbors::new();
        for position in manifold.positions() {
            let Some(neighbor) = self.neighbor_location(location, manifold, position) else {
                continue;
            };
            let found = self.node_or_parent_at(neighbor);
            if found.level < neighbor.level() || self.is_leaf(found.node) {
                if !neighbors.contains(&found.node) {
                    neighbors.push(found.node);
                }
                continue;
            }
            for &child in manifold.children_sharing_face(position) {
                neighbors.extend(self.child(found.node, child));
            }
        }
        neighbors
    }

    /// Every node touching `location` across any manifold, sorted and without duplicates.
    pub fn all_neighbors(&self, location: LocationCode<N>) -> Neighbors {
        let mut neighbors = Neighbors::new();
        for manifold in Manifold::all(N) {
            neighbors.extend(self.neighbors(location, manifold));
        }
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// The leaf containing `point`, given in the root's `[0, 1]^N` frame.
    pub fn leaf_at(&self, point: [f64; N]) -> Option<NodeIdx> {
        let location = LocationCode::from_normalized(point, LocationCode::<N>::max_level())?;
        Some(self.node_or_parent_at(location).node)
    }

    /// Center of `node` in the root's `[0, 1]^N` frame.
    pub fn normalized_coordinates(&self, node: NodeIdx) -> [f64; N] {
        self.location(node).normalized_center()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
