/// Failures when moving a [`Tree`](crate::Tree) in or out of a [`TreeSnapshot`](crate::TreeSnapshot).
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("cannot restore a {found}-dimensional snapshot into a {expected}-dimensional tree")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{nodes} nodes do not fit in a tree with capacity {capacity}")]
    InsufficientCapacity { nodes: usize, capacity: usize },

    #[error("tree has free sibling groups below its last used group; sort it first")]
    NotCompact,

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
