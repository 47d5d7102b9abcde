//! Property-based tests for `LocationCode` and the neighbor stencils.

use hyperoctree::{ChildIndex, Level, LocationCode, Manifold};
use proptest::prelude::*;

// ============================================================================
//  Strategies
// ============================================================================

/// A root-to-node path of a 3D code, short of the maximum level so one more push is always valid.
fn octree_path() -> impl Strategy<Value = Vec<ChildIndex>> {
    prop::collection::vec(0..8u8, 0..LocationCode::<3>::max_level() as usize)
}

fn quadtree_path() -> impl Strategy<Value = Vec<ChildIndex>> {
    prop::collection::vec(0..4u8, 0..LocationCode::<2>::max_level() as usize)
}

/// A level and in-bounds 2D coordinates on that level's grid.
fn quadtree_coordinates() -> impl Strategy<Value = ([u64; 2], Level)> {
    (0..=LocationCode::<2>::max_level()).prop_flat_map(|level| {
        let extent = 1u64 << level;
        ([0..extent, 0..extent], Just(level))
    })
}

fn offset_3d() -> impl Strategy<Value = [i32; 3]> {
    [-3..=3i32, -3..=3i32, -3..=3i32]
}

// ============================================================================
//  Path Properties
// ============================================================================

proptest! {
    /// Walking the path of a code built from positions yields the same positions.
    #[test]
    fn path_round_trip(path in octree_path()) {
        let code = LocationCode::<3>::from_path(path.iter().copied());
        prop_assert_eq!(code.level() as usize, path.len());
        prop_assert_eq!(code.path().collect::<Vec<_>>(), path);
    }

    /// pop undoes push.
    #[test]
    fn pop_undoes_push(path in octree_path(), position in 0..8u8) {
        let code = LocationCode::<3>::from_path(path);
        let (parent, popped) = code.push(position).pop();
        prop_assert_eq!(parent, code);
        prop_assert_eq!(popped, position);
    }

    /// Raw values survive a round trip.
    #[test]
    fn raw_round_trip(path in quadtree_path()) {
        let code = LocationCode::<2>::from_path(path);
        prop_assert_eq!(LocationCode::<2>::from_raw(code.raw()), Some(code));
    }
}

// ============================================================================
//  Coordinate Properties
// ============================================================================

proptest! {
    /// Coordinates survive a round trip through a code.
    #[test]
    fn coordinates_round_trip((coordinates, level) in quadtree_coordinates()) {
        let code = LocationCode::<2>::from_coordinates(coordinates, level);
        prop_assert_eq!(code.level(), level);
        prop_assert_eq!(code.to_coordinates(), coordinates);
    }

    /// A shift moves the coordinates by exactly the offset, or fails when they would leave the domain.
    #[test]
    fn shift_moves_coordinates(path in octree_path(), offset in offset_3d()) {
        let code = LocationCode::<3>::from_path(path);
        let extent = 1i64 << code.level();
        let before = code.to_coordinates();
        let expected: Vec<i64> = (0..3).map(|d| before[d] as i64 + offset[d] as i64).collect();
        let in_bounds = expected.iter().all(|&x| (0..extent).contains(&x));

        match code.shift(offset) {
            Some(moved) => {
                prop_assert!(in_bounds);
                prop_assert_eq!(moved.level(), code.level());
                let after: Vec<i64> = moved.to_coordinates().iter().map(|&x| x as i64).collect();
                prop_assert_eq!(after, expected);
            }
            None => prop_assert!(!in_bounds),
        }
    }

    /// Shifting back undoes a successful shift.
    #[test]
    fn shift_is_reversible(path in octree_path(), offset in offset_3d()) {
        let code = LocationCode::<3>::from_path(path);
        if let Some(moved) = code.shift(offset) {
            prop_assert_eq!(moved.shift(offset.map(|x| -x)), Some(code));
        }
    }

    /// The center of a node lies inside it.
    #[test]
    fn center_maps_back_to_node(path in quadtree_path()) {
        let code = LocationCode::<2>::from_path(path);
        let found = LocationCode::<2>::from_normalized(code.normalized_center(), code.level());
        prop_assert_eq!(found, Some(code));
    }
}

// ============================================================================
//  Neighbor Properties
// ============================================================================

proptest! {
    /// Stepping to a neighbor and back across the opposite position returns to the start.
    #[test]
    fn opposite_steps_back(path in octree_path(), rank in 1..=3usize, position in 0..12u8) {
        let manifold = Manifold::new(3, rank);
        prop_assume!((position as usize) < manifold.same_level_count());
        let code = LocationCode::<3>::from_path(path);
        if let Some(neighbor) = code.shift(manifold.offset_vector::<3>(position)) {
            let back = neighbor.shift(manifold.offset_vector::<3>(manifold.opposite(position)));
            prop_assert_eq!(back, Some(code));
        }
    }
}
