//! Static stencils relating a node to the nodes around it.
//!
//! A neighbor of an `nd`-dimensional node shares an `(nd - rank)`-dimensional element with it: rank 1 neighbors share a
//! face, rank 2 an edge (a corner point in 2D) and rank 3 a corner point. For each `(nd, rank)` pair the neighbors are
//! enumerated by a [`NeighborIndex`] ("position"), and each position maps to a per-axis offset of `-1`, `0` or `+1`
//! node lengths.
//!
//! Rows are stored as `[i8; 3]` regardless of `nd`; axes past `nd` are zero.

use crate::shape::children_count;
use crate::{ChildIndex, NeighborIndex};

use std::array;

type Offset = [i8; 3];

static FACES_1D: [Offset; 2] = [[-1, 0, 0], [1, 0, 0]];

static FACES_2D: [Offset; 4] = [[-1, 0, 0], [1, 0, 0], [0, -1, 0], [0, 1, 0]];
static CORNERS_2D: [Offset; 4] = [[-1, -1, 0], [1, -1, 0], [-1, 1, 0], [1, 1, 0]];

static FACES_3D: [Offset; 6] = [
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
];
static EDGES_3D: [Offset; 12] = [
    [-1, -1, 0],
    [1, -1, 0],
    [-1, 1, 0],
    [1, 1, 0],
    [-1, 0, -1],
    [1, 0, -1],
    [0, -1, -1],
    [0, 1, -1],
    [-1, 0, 1],
    [1, 0, 1],
    [0, -1, 1],
    [0, 1, 1],
];
static CORNERS_3D: [Offset; 8] = [
    [-1, -1, -1],
    [1, -1, -1],
    [-1, 1, -1],
    [1, 1, -1],
    [-1, -1, 1],
    [1, -1, 1],
    [-1, 1, 1],
    [1, 1, 1],
];

// Children of the neighbor at each position that touch the node.
static SHARED_FACES_1D: [&[ChildIndex]; 2] = [&[1], &[0]];

static SHARED_FACES_2D: [&[ChildIndex]; 4] = [&[1, 3], &[0, 2], &[2, 3], &[0, 1]];
static SHARED_CORNERS_2D: [&[ChildIndex]; 4] = [&[3], &[2], &[1], &[0]];

static SHARED_FACES_3D: [&[ChildIndex]; 6] = [
    &[1, 3, 5, 7],
    &[0, 2, 4, 6],
    &[2, 3, 6, 7],
    &[0, 1, 4, 5],
    &[4, 5, 6, 7],
    &[0, 1, 2, 3],
];
static SHARED_EDGES_3D: [&[ChildIndex]; 12] = [
    &[3, 7],
    &[2, 6],
    &[1, 5],
    &[0, 4],
    &[5, 7],
    &[4, 6],
    &[6, 7],
    &[4, 5],
    &[1, 3],
    &[0, 2],
    &[2, 3],
    &[0, 1],
];
static SHARED_CORNERS_3D: [&[ChildIndex]; 8] = [&[7], &[6], &[5], &[4], &[3], &[2], &[1], &[0]];

static OPPOSITE_EDGES: [NeighborIndex; 12] = [3, 2, 1, 0, 9, 8, 11, 10, 5, 4, 7, 6];

#[inline]
fn assert_manifold(nd: usize, rank: usize) {
    assert!((1..=3).contains(&nd), "dimension {} out of bounds [1, 3]", nd);
    assert!(rank > 0, "manifold rank must be at least 1");
}

const fn binomial(n: usize, k: usize) -> usize {
    let mut result = 1;
    let mut i = 0;
    while i < k {
        result = result * (n - i) / (i + 1);
        i += 1;
    }
    result
}

/// Number of same-level neighbors across rank-`rank` manifolds: 2<sup>rank</sup> · C(nd, rank).
///
/// Zero when `rank > nd`.
#[inline]
pub const fn same_level_count(nd: usize, rank: usize) -> usize {
    if rank > nd {
        return 0;
    }
    (1 << rank) * binomial(nd, rank)
}

/// Number of neighbors one level finer across rank-`rank` manifolds.
///
/// Each same-level neighbor contributes the 2<sup>nd - rank</sup> of its children lying on the shared element.
#[inline]
pub const fn child_level_count(nd: usize, rank: usize) -> usize {
    if rank > nd {
        return 0;
    }
    same_level_count(nd, rank) << (nd - rank)
}

/// Upper bound on the neighbors of a node in a 2:1 balanced tree, summed over all manifolds.
pub const fn max_neighbor_count(nd: usize) -> usize {
    let mut total = 0;
    let mut rank = 1;
    while rank <= nd {
        total += child_level_count(nd, rank);
        rank += 1;
    }
    total
}

/// Per-axis offsets of the same-level neighbors across rank-`rank` manifolds. Empty when `rank > nd`.
pub fn offset_table(nd: usize, rank: usize) -> &'static [[i8; 3]] {
    assert_manifold(nd, rank);
    match (nd, rank) {
        (1, 1) => &FACES_1D,
        (2, 1) => &FACES_2D,
        (2, 2) => &CORNERS_2D,
        (3, 1) => &FACES_3D,
        (3, 2) => &EDGES_3D,
        (3, 3) => &CORNERS_3D,
        _ => &[],
    }
}

/// The position on the other side of the node: the neighbor at `opposite(p)` has the negated offset of `p`.
pub fn opposite(position: NeighborIndex, nd: usize, rank: usize) -> NeighborIndex {
    assert_manifold(nd, rank);
    assert!(
        (position as usize) < same_level_count(nd, rank),
        "neighbor position {} out of bounds [0, {}) for manifold ({}, {})",
        position,
        same_level_count(nd, rank),
        nd,
        rank
    );
    match rank {
        1 => position ^ 1,
        2 => OPPOSITE_EDGES[position as usize],
        _ => (children_count(nd) - 1) as NeighborIndex - position,
    }
}

/// Child positions, within the neighbor at `position`, of the children that touch the node.
///
/// These are also the node's own children on the `opposite(position)` side.
pub fn children_sharing_face(nd: usize, rank: usize, position: NeighborIndex) -> &'static [ChildIndex] {
    assert_manifold(nd, rank);
    let table: &[&[ChildIndex]] = match (nd, rank) {
        (1, 1) => &SHARED_FACES_1D,
        (2, 1) => &SHARED_FACES_2D,
        (2, 2) => &SHARED_CORNERS_2D,
        (3, 1) => &SHARED_FACES_3D,
        (3, 2) => &SHARED_EDGES_3D,
        (3, 3) => &SHARED_CORNERS_3D,
        _ => panic!("manifold rank {} exceeds dimension {}", rank, nd),
    };
    table[position as usize]
}

/// Calls `f` with every manifold of an `nd`-dimensional node, faces first.
pub fn for_each_manifold(nd: usize, mut f: impl FnMut(Manifold)) {
    for manifold in Manifold::all(nd) {
        f(manifold);
    }
}

/// A kind of shared element between an `nd`-dimensional node and its neighbors.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Manifold {
    dimension: u8,
    rank: u8,
}

impl Manifold {
    pub fn new(dimension: usize, rank: usize) -> Self {
        assert_manifold(dimension, rank);
        assert!(
            rank <= dimension,
            "manifold rank {} exceeds dimension {}",
            rank,
            dimension
        );
        Self {
            dimension: dimension as u8,
            rank: rank as u8,
        }
    }

    #[inline]
    pub fn face(dimension: usize) -> Self {
        Self::new(dimension, 1)
    }

    /// Rank 2. In 2D this is the corner manifold.
    #[inline]
    pub fn edge(dimension: usize) -> Self {
        Self::new(dimension, 2)
    }

    #[inline]
    pub fn corner(dimension: usize) -> Self {
        Self::new(dimension, dimension)
    }

    /// Every manifold of an `nd`-dimensional node, in increasing rank.
    pub fn all(dimension: usize) -> impl Iterator<Item = Self> {
        (1..=dimension).map(move |rank| Self::new(dimension, rank))
    }

    #[inline]
    pub fn dimension(self) -> usize {
        self.dimension as usize
    }

    #[inline]
    pub fn rank(self) -> usize {
        self.rank as usize
    }

    #[inline]
    pub fn same_level_count(self) -> usize {
        same_level_count(self.dimension(), self.rank())
    }

    #[inline]
    pub fn child_level_count(self) -> usize {
        child_level_count(self.dimension(), self.rank())
    }

    #[inline]
    pub fn positions(self) -> impl Iterator<Item = NeighborIndex> {
        0..self.same_level_count() as NeighborIndex
    }

    #[inline]
    pub fn offset(self, position: NeighborIndex) -> [i8; 3] {
        offset_table(self.dimension(), self.rank())[position as usize]
    }

    /// The offset of `position` truncated to `N` axes, ready for [`LocationCode::shift`](crate::LocationCode::shift).
    pub fn offset_vector<const N: usize>(self, position: NeighborIndex) -> [i32; N] {
        assert_eq!(
            N,
            self.dimension(),
            "offset requested in {} dimensions for a {}-dimensional manifold",
            N,
            self.dimension()
        );
        let offset = self.offset(position);
        array::from_fn(|d| i32::from(offset[d]))
    }

    #[inline]
    pub fn opposite(self, position: NeighborIndex) -> NeighborIndex {
        opposite(position, self.dimension(), self.rank())
    }

    #[inline]
    pub fn children_sharing_face(self, position: NeighborIndex) -> &'static [ChildIndex] {
        children_sharing_face(self.dimension(), self.rank(), position)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use crate::shape::delinearize_child;

    fn child_offset(nd: usize, child: ChildIndex) -> [u32; 3] {
        match nd {
            1 => {
                let [x] = delinearize_child::<1>(child);
                [x, 0, 0]
            }
            2 => {
                let [x, y] = delinearize_child::<2>(child);
                [x, y, 0]
            }
            _ => delinearize_child::<3>(child),
        }
    }

    #[test]
    fn counts() {
        let same: Vec<_> = [(1, 1), (2, 1), (2, 2), (3, 1), (3, 2), (3, 3)]
            .iter()
            .map(|&(nd, rank)| same_level_count(nd, rank))
            .collect();
        assert_eq!(same, vec![2, 4, 4, 6, 12, 8]);

        assert_eq!(child_level_count(1, 1), 2);
        assert_eq!(child_level_count(2, 1), 8);
        assert_eq!(child_level_count(2, 2), 4);
        assert_eq!(child_level_count(3, 1), 24);
        assert_eq!(child_level_count(3, 2), 24);
        assert_eq!(child_level_count(3, 3), 8);

        assert_eq!(max_neighbor_count(1), 2);
        assert_eq!(max_neighbor_count(2), 12);
        assert_eq!(max_neighbor_count(3), 56);
    }

    #[test]
    fn tables_match_counts() {
        for nd in 1..=3 {
            for manifold in Manifold::all(nd) {
                let table = offset_table(nd, manifold.rank());
                assert_eq!(table.len(), manifold.same_level_count());

                let mut shared_total = 0;
                for p in manifold.positions() {
                    let offset = table[p as usize];
                    let nonzero = offset.iter().filter(|&&x| x != 0).count();
                    assert_eq!(nonzero, manifold.rank(), "{:?} position {}", manifold, p);
                    assert!(offset[nd..].iter().all(|&x| x == 0));
                    shared_total += manifold.children_sharing_face(p).len();
                }
                assert_eq!(shared_total, manifold.child_level_count());
            }
        }
    }

    #[test]
    fn offsets_are_unique() {
        for nd in 1..=3 {
            for manifold in Manifold::all(nd) {
                let mut rows = offset_table(nd, manifold.rank()).to_vec();
                rows.sort_unstable();
                rows.dedup();
                assert_eq!(rows.len(), manifold.same_level_count());
            }
        }
    }

    #[test]
    fn opposite_is_an_involution_that_negates_offsets() {
        for nd in 1..=3 {
            for manifold in Manifold::all(nd) {
                for p in manifold.positions() {
                    let q = manifold.opposite(p);
                    assert_eq!(manifold.opposite(q), p);
                    let negated = manifold.offset(p).map(|x| -x);
                    assert_eq!(manifold.offset(q), negated);
                }
            }
        }
    }

    #[test]
    fn shared_children_touch_the_node() {
        for nd in 1..=3 {
            for manifold in Manifold::all(nd) {
                for p in manifold.positions() {
                    let offset = manifold.offset(p);
                    let expected: Vec<ChildIndex> = (0..children_count(nd) as ChildIndex)
                        .filter(|&c| {
                            let bits = child_offset(nd, c);
                            (0..nd).all(|d| match offset[d] {
                                -1 => bits[d] == 1,
                                1 => bits[d] == 0,
                                _ => true,
                            })
                        })
                        .collect();
                    assert_eq!(manifold.children_sharing_face(p), expected.as_slice());
                }
            }
        }
    }

    #[test]
    fn rank_beyond_dimension_is_empty() {
        assert!(offset_table(1, 2).is_empty());
        assert!(offset_table(2, 3).is_empty());
        assert_eq!(same_level_count(2, 3), 0);
        assert_eq!(child_level_count(1, 3), 0);
    }

    #[test]
    #[should_panic]
    fn rank_zero_panics() {
        offset_table(2, 0);
    }

    #[test]
    #[should_panic]
    fn manifold_rank_beyond_dimension_panics() {
        Manifold::new(2, 3);
    }

    #[test]
    fn manifolds_in_rank_order() {
        let mut visited = Vec::new();
        for_each_manifold(3, |m| visited.push(m.rank()));
        assert_eq!(visited, vec![1, 2, 3]);
        assert_eq!(Manifold::corner(2), Manifold::edge(2));
        assert_eq!(Manifold::face(2).offset_vector::<2>(1), [1, 0]);
        assert_eq!(Manifold::corner(3).offset_vector::<3>(6), [-1, 1, 1]);
    }
}
