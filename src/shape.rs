use crate::ChildIndex;

use ndshape::{ConstPow2Shape2u32, ConstPow2Shape3u32, ConstShape};
use std::array;

/// The 2x2 block of children of a quadtree node.
pub type QuadtreeShape = ConstPow2Shape2u32<1, 1>;
/// The 2x2x2 block of children of an octree node.
pub type OctreeShape = ConstPow2Shape3u32<1, 1, 1>;

/// Number of children of a node in an `nd`-dimensional tree: 2<sup>nd</sup>.
#[inline]
pub const fn children_count(nd: usize) -> usize {
    1 << nd
}

/// Panics unless `N` is a supported ambient dimension.
#[inline]
pub(crate) fn assert_dimension<const N: usize>() {
    assert!(
        (1..=3).contains(&N),
        "ambient dimension {} is not supported (expected 1, 2 or 3)",
        N
    );
}

/// Splits the child position `child` into one bit per axis.
///
/// Axis `d` of the result is bit `d` of `child`, so child 0 sits at the lower corner of its parent and child `2^N - 1`
/// at the upper corner:
///
/// ```text
///   d1 ^
///      |  2 | 3
///      | ---+---
///      |  0 | 1
///      +---------> d0
/// ```
#[inline]
pub fn delinearize_child<const N: usize>(child: ChildIndex) -> [u32; N] {
    debug_assert!((child as usize) < children_count(N));
    let i = u32::from(child);
    let xyz: [u32; 3] = match N {
        1 => [i, 0, 0],
        2 => {
            let [x, y] = QuadtreeShape::delinearize(i);
            [x, y, 0]
        }
        3 => OctreeShape::delinearize(i),
        _ => panic!("ambient dimension {} is not supported", N),
    };
    array::from_fn(|d| xyz[d])
}

/// Inverse of [`delinearize_child`]. Every component of `offset` must be 0 or 1.
#[inline]
pub fn linearize_child<const N: usize>(offset: [u32; N]) -> ChildIndex {
    debug_assert!(offset.iter().all(|&x| x <= 1), "child offset {:?} is not a corner", offset);
    let axis = |d: usize| offset.get(d).copied().unwrap_or(0);
    let i = match N {
        1 => axis(0),
        2 => QuadtreeShape::linearize([axis(0), axis(1)]),
        3 => OctreeShape::linearize([axis(0), axis(1), axis(2)]),
        _ => panic!("ambient dimension {} is not supported", N),
    };
    i as ChildIndex
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

    #[test]
    fn quadtree_children_are_in_z_order() {
        assert_eq!(delinearize_child::<2>(0), [0, 0]);
        assert_eq!(delinearize_child::<2>(1), [1, 0]);
        assert_eq!(delinearize_child::<2>(2), [0, 1]);
        assert_eq!(delinearize_child::<2>(3), [1, 1]);
    }

    #[test]
    fn octree_children_are_in_z_order() {
        assert_eq!(delinearize_child::<3>(5), [1, 0, 1]);
        assert_eq!(delinearize_child::<3>(6), [0, 1, 1]);
        for child in 0..8 {
            assert_eq!(linearize_child(delinearize_child::<3>(child)), child);
        }
    }

    #[test]
    fn binary_children() {
        assert_eq!(delinearize_child::<1>(1), [1]);
        assert_eq!(linearize_child([0u32]), 0);
        assert_eq!(children_count(1), 2);
        assert_eq!(children_count(3), 8);
    }
}
