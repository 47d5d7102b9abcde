use crate::tracing_helpers::debug_log;
use crate::{NodeIdx, SiblingGroupIdx, Tree};

impl<const N: usize> Tree<N> {
    /// Compacts the tree and orders its sibling groups depth-first.
    ///
    /// Afterwards [`is_compact`](Self::is_compact) and [`is_sorted`](Self::is_sorted) hold. Node indices change; use
    /// [`sort_with`](Self::sort_with) to keep per-node data in step.
    pub fn sort(&mut self) {
        self.sort_with(|_, _| {});
    }

    /// Same as [`sort`](Self::sort), calling `swap_data(a, b)` for every pair of nodes whose storage is exchanged.
    ///
    /// Replaying the calls as swaps on an array indexed by [`NodeIdx`] keeps that array aligned with the tree.
    pub fn sort_with(&mut self, mut swap_data: impl FnMut(NodeIdx, NodeIdx)) {
        debug_log!(size = self.size, compact = self.is_compact(), "sorting tree");
        self.sort_group(SiblingGroupIdx::ROOT, 0, &mut swap_data);
        debug_assert!(self.is_compact());
        debug_assert!(self.is_sorted());
        debug_log!(size = self.size, "sorted tree");
    }

    /// Returns true iff every branch's children sit in the sibling group that a pre-order walk would assign next.
    pub fn is_sorted(&self) -> bool {
        let mut expected = 0;
        self.depth_first()
            .filter_map(|node| self.children_group(node))
            .all(|group| {
                expected += 1;
                group.0 == expected
            })
    }

    /// Moves the children of every branch in `group` into consecutive groups after `last`, recursing depth-first.
    /// Returns the last group assigned.
    fn sort_group(
        &mut self,
        group: SiblingGroupIdx,
        mut last: u32,
        swap_data: &mut impl FnMut(NodeIdx, NodeIdx),
    ) -> u32 {
        for node in Self::group_nodes(group) {
            let Some(children) = self.children_group(node) else {
                continue;
            };
            last += 1;
            let target = SiblingGroupIdx(last);
            if children != target {
                self.swap(children, target);
                for (a, b) in Self::group_nodes(children).zip(Self::group_nodes(target)) {
                    swap_data(a, b);
                }
            }
            last = self.sort_group(target, last, swap_data);
        }
        last
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

    use crate::{LocationCode, QuadTree};

    fn coarsened_quadtree() -> QuadTree {
        let mut tree = QuadTree::uniform_with_capacity(2, 3);
        tree.refine(NodeIdx(8));
        tree.refine(NodeIdx(17));
        tree.coarsen(NodeIdx(2));
        tree.coarsen(NodeIdx(3));
        tree
    }

    #[test]
    fn breadth_first_refinement_is_not_sorted() {
        assert!(QuadTree::uniform(2).is_sorted());

        // Level 2 groups were allocated level by level, not depth-first.
        let mut tree = QuadTree::uniform(3);
        assert!(tree.is_compact());
        assert!(!tree.is_sorted());

        let before = tree.clone();
        tree.sort();
        assert!(tree.is_sorted());
        assert_eq!(tree.leaves().count(), 64);
        assert_eq!(tree.children_group(NodeIdx(5)), Some(SiblingGroupIdx(3)));
        assert_eq!(tree.location(NodeIdx(9)), before.location(NodeIdx(21)));
    }

    #[test]
    fn sort_relocates_nodes_depth_first() {
        let mut tree = coarsened_quadtree();
        assert!(!tree.is_sorted());
        let before = tree.clone();

        // Track where every original node ends up.
        let mut data: Vec<u32> = (0..tree.capacity() as u32).collect();
        tree.sort_with(|a, b| data.swap(a.index(), b.index()));

        assert!(tree.is_compact());
        assert!(tree.is_sorted());
        assert_eq!(tree.first_free, 6);
        assert_eq!(tree.size(), before.size());
        assert_ne!(tree, before);

        let relocated = |original: u32| -> u32 {
            data.iter().position(|&d| d == original).unwrap() as u32
        };
        for n in 0..9 {
            assert_eq!(relocated(n), n);
        }
        for n in 0..4 {
            assert_eq!(relocated(17 + n), 13 + n);
            assert_eq!(relocated(21 + n), 9 + n);
            assert_eq!(relocated(25 + n), 17 + n);
        }

        // Relocation keeps every node's place in space.
        for original in before.nodes() {
            let moved = NodeIdx(relocated(original.0));
            assert_eq!(tree.location(moved), before.location(original));
        }
    }

    #[test]
    fn sort_is_idempotent() {
        let mut tree = coarsened_quadtree();
        tree.sort();
        let sorted = tree.clone();
        let mut calls = 0;
        tree.sort_with(|_, _| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(tree, sorted);
        assert_eq!(tree.node_at(LocationCode::from_path([0, 3, 0])), Some(NodeIdx(9)));
    }
}
