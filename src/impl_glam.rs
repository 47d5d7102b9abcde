use crate::shape::{delinearize_child, linearize_child};
use crate::{ChildIndex, Level, LocationCode, NodeIdx, OctTree, QuadTree};

use glam::{DVec2, DVec3, IVec2, IVec3, UVec2, UVec3};

macro_rules! impl_glam_location {
    ($dim:literal, $tree:ty, $uvec:ty, $ivec:ty, $dvec:ty) => {
        impl LocationCode<$dim> {
            /// The code at `level` of the node with integer coordinates `coordinates` on that level's grid.
            #[inline]
            pub fn from_uvec(coordinates: $uvec, level: Level) -> Self {
                Self::from_coordinates(coordinates.to_array().map(u64::from), level)
            }

            /// Integer coordinates on the grid of this code's level.
            #[inline]
            pub fn to_uvec(self) -> $uvec {
                // Levels are capped low enough for every axis to fit in `u32`.
                <$uvec>::from(self.to_coordinates().map(|x| x as u32))
            }

            #[inline]
            pub fn shift_by(self, offset: $ivec) -> Option<Self> {
                self.shift(offset.to_array())
            }

            #[inline]
            pub fn center(self) -> $dvec {
                <$dvec>::from(self.normalized_center())
            }

            /// Per-axis offset (0 or 1) of child `position` within its parent.
            #[inline]
            pub fn child_offset(position: ChildIndex) -> $uvec {
                <$uvec>::from(delinearize_child::<$dim>(position))
            }

            /// Inverse of [`child_offset`](Self::child_offset).
            #[inline]
            pub fn child_at_offset(offset: $uvec) -> ChildIndex {
                linearize_child::<$dim>(offset.to_array())
            }
        }

        impl $tree {
            /// The leaf containing `point`, given in the root's unit frame.
            #[inline]
            pub fn leaf_containing(&self, point: $dvec) -> Option<NodeIdx> {
                self.leaf_at(point.to_array())
            }

            /// Center of `node` in the root's unit frame.
            #[inline]
            pub fn node_center(&self, node: NodeIdx) -> $dvec {
                <$dvec>::from(self.normalized_coordinates(node))
            }
        }
    };
}

impl_glam_location!(2, QuadTree, UVec2, IVec2, DVec2);
impl_glam_location!(3, OctTree, UVec3, IVec3, DVec3);

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
