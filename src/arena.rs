/// Fixed-capacity storage for the edges of a [`Tree`](crate::Tree).
///
/// Nodes live in sibling groups: group 0 holds only the root and every other group holds the `2^N` children of one
/// node. Each group stores the [`ArenaPtr`] of its parent node and each node stores the [`ArenaPtr`] of its first child.
/// A group is free iff its parent pointer is [`EMPTY_ARENA_PTR`] (the root group excepted), and a node is a leaf iff its
/// first child pointer is [`EMPTY_ARENA_PTR`].
#[derive(Clone, Debug)]
pub(crate) struct LinkArena {
    /// Parent node of each sibling group.
    parents: Box<[ArenaPtr]>,
    /// First child of each node.
    first_children: Box<[ArenaPtr]>,
}

/// Index of a node or sibling group owned by a [`LinkArena`].
pub(crate) type ArenaPtr = u32;

/// An [`ArenaPtr`] that doesn't point to anything.
pub(crate) const EMPTY_ARENA_PTR: ArenaPtr = ArenaPtr::MAX;

#[inline]
fn decode(ptr: ArenaPtr) -> Option<ArenaPtr> {
    (ptr != EMPTY_ARENA_PTR).then_some(ptr)
}

#[inline]
fn encode(ptr: Option<ArenaPtr>) -> ArenaPtr {
    ptr.unwrap_or(EMPTY_ARENA_PTR)
}

impl LinkArena {
    pub fn new(node_capacity: usize, group_capacity: usize) -> Self {
        assert!(
            node_capacity < EMPTY_ARENA_PTR as usize,
            "node capacity {} exceeds the arena limit {}",
            node_capacity,
            EMPTY_ARENA_PTR
        );
        assert!(group_capacity <= node_capacity);
        Self {
            parents: vec![EMPTY_ARENA_PTR; group_capacity].into_boxed_slice(),
            first_children: vec![EMPTY_ARENA_PTR; node_capacity].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn node_capacity(&self) -> usize {
        self.first_children.len()
    }

    #[inline]
    pub fn group_capacity(&self) -> usize {
        self.parents.len()
    }

    #[inline]
    pub fn parent(&self, group: ArenaPtr) -> Option<ArenaPtr> {
        decode(self.parents[group as usize])
    }

    #[inline]
    pub fn set_parent(&mut self, group: ArenaPtr, parent: Option<ArenaPtr>) {
        self.parents[group as usize] = encode(parent);
    }

    #[inline]
    pub fn first_child(&self, node: ArenaPtr) -> Option<ArenaPtr> {
        decode(self.first_children[node as usize])
    }

    #[inline]
    pub fn set_first_child(&mut self, node: ArenaPtr, first_child: Option<ArenaPtr>) {
        self.first_children[node as usize] = encode(first_child);
    }

    #[inline]
    pub fn swap_first_children(&mut self, a: ArenaPtr, b: ArenaPtr) {
        self.first_children.swap(a as usize, b as usize);
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
