use crate::tracing_helpers::trace_log;
use crate::{Children, NodeIdx, Tree};

impl<const N: usize> Tree<N> {
    /// Returns true iff no node touches a node more than one level coarser or finer (2:1 balance).
    pub fn is_balanced(&self) -> bool {
        self.nodes().all(|node| {
            let level = self.level(node);
            self.all_neighbors(self.location(node))
                .iter()
                .all(|&neighbor| self.level(neighbor).abs_diff(level) <= 1)
        })
    }

    /// Coarsens `node` unless that would break 2:1 balance. Returns whether it coarsened.
    ///
    /// `node` is left alone if it is a leaf, if any of its children has children, or if any child touches a node finer
    /// than itself.
    pub fn balanced_coarsen(&mut self, node: NodeIdx) -> bool {
        self.balanced_coarsen_with(node, |_, _| {})
    }

    /// Same as [`balanced_coarsen`](Self::balanced_coarsen), calling `restrict(node, children)` right before the children
    /// are removed so their data can be folded into `node`.
    pub fn balanced_coarsen_with(
        &mut self,
        node: NodeIdx,
        restrict: impl FnOnce(NodeIdx, Children),
    ) -> bool {
        if self.is_leaf(node) || self.children(node).any(|child| !self.is_leaf(child)) {
            return false;
        }
        let child_level = self.level(node) + 1;
        for child in self.children(node) {
            let finer_neighbor = self
                .all_neighbors(self.location(child))
                .iter()
                .any(|&neighbor| self.level(neighbor) > child_level);
            if finer_neighbor {
                trace_log!(node = node.0, child = child.0, "coarsening would unbalance the tree");
                return false;
            }
        }
        restrict(node, self.children(node));
        self.coarsen(node);
        true
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
