use crate::shape::{assert_dimension, children_count, delinearize_child, linearize_child};
use crate::{ChildIndex, Level};

use std::array;
use std::fmt;
use std::iter::FusedIterator;

/// Length of a node at `level` relative to a root of length 1.
#[inline]
pub fn node_length_at_level(level: Level) -> f64 {
    1.0 / (1u64 << level) as f64
}

/// The path from the root to a node, packed into a single integer.
///
/// The root is `1`. Descending into child `p` appends the `N` bits of `p`, so the highest set bit is a level marker and
/// [`level`](Self::level) is recovered from the bit length alone. Because a child position holds one bit per axis, the
/// code is also the interleaved (Morton) encoding of the node's integer coordinates at its level, which is what makes
/// [`shift`](Self::shift) cheap.
///
/// Codes never touch a [`Tree`](crate::Tree). Compare two codes to order nodes along the Z-curve of their common level.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationCode<const N: usize> {
    value: u64,
}

impl<const N: usize> Default for LocationCode<N> {
    #[inline]
    fn default() -> Self {
        Self::root()
    }
}

impl<const N: usize> LocationCode<N> {
    const CHILD_MASK: u64 = (1 << N) - 1;

    /// Number of levels (including the root level) that fit in the code.
    pub const MAX_LEVELS: Level = ((u64::BITS as usize - N) / N) as Level;

    /// The level-0 code.
    #[inline]
    pub const fn root() -> Self {
        Self { value: 1 }
    }

    /// The deepest level a code can describe.
    #[inline]
    pub const fn max_level() -> Level {
        Self::MAX_LEVELS - 1
    }

    /// Reinterprets a value previously returned by [`raw`](Self::raw).
    ///
    /// Returns `None` for `0` and for values whose level marker does not sit on a level boundary.
    pub fn from_raw(value: u64) -> Option<Self> {
        assert_dimension::<N>();
        if value == 0 {
            return None;
        }
        let marker = (u64::BITS - 1 - value.leading_zeros()) as usize;
        (marker % N == 0 && marker / N <= Self::max_level() as usize).then_some(Self { value })
    }

    /// Builds the code reached by descending through `positions` from the root.
    pub fn from_path(positions: impl IntoIterator<Item = ChildIndex>) -> Self {
        positions.into_iter().fold(Self::root(), Self::push)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.value
    }

    #[inline]
    pub fn level(self) -> Level {
        ((u64::BITS - 1 - self.value.leading_zeros()) as usize / N) as Level
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self.value == 1
    }

    /// The code of child `position` of this node.
    ///
    /// # Panics
    ///
    /// If `position` is not a valid child position or this code is already at [`max_level`](Self::max_level).
    #[inline]
    #[must_use]
    pub fn push(self, position: ChildIndex) -> Self {
        assert!(
            (position as usize) < children_count(N),
            "position in parent {} out of bounds [0, {}) (N = {})",
            position,
            children_count(N),
            N
        );
        assert!(
            self.level() < Self::max_level(),
            "location {} is full: level equals max level {}",
            self,
            Self::max_level()
        );
        Self {
            value: (self.value << N) | u64::from(position),
        }
    }

    /// The parent code and the position that was just left.
    ///
    /// # Panics
    ///
    /// If this is the root.
    #[inline]
    #[must_use]
    pub fn pop(self) -> (Self, ChildIndex) {
        assert!(!self.is_root(), "cannot pop the root from a location code");
        let position = (self.value & Self::CHILD_MASK) as ChildIndex;
        (
            Self {
                value: self.value >> N,
            },
            position,
        )
    }

    #[inline]
    pub fn parent(self) -> Option<Self> {
        (!self.is_root()).then(|| self.pop().0)
    }

    /// Position in its parent of the ancestor at `level` (this node itself when `level == self.level()`).
    #[inline]
    pub fn position_at(self, level: Level) -> ChildIndex {
        let own_level = self.level();
        assert!(
            level > 0 && level <= own_level,
            "level {} out of bounds [1, {}]",
            level,
            own_level
        );
        let shift = (own_level - level) as usize * N;
        ((self.value >> shift) & Self::CHILD_MASK) as ChildIndex
    }

    /// Child positions from level 1 down to this node's level.
    #[inline]
    pub fn path(self) -> Path<N> {
        Path {
            code: self,
            next: 1,
            end: self.level() + 1,
        }
    }

    /// Integer coordinates of the node on the `2^level` grid of its level.
    pub fn to_coordinates(self) -> [u64; N] {
        let mut coordinates = [0; N];
        for position in self.path() {
            let offset = delinearize_child::<N>(position);
            for (x, bit) in coordinates.iter_mut().zip(offset) {
                *x = (*x << 1) | u64::from(bit);
            }
        }
        coordinates
    }

    /// Inverse of [`to_coordinates`](Self::to_coordinates).
    ///
    /// # Panics
    ///
    /// If `level` exceeds [`max_level`](Self::max_level) or any coordinate is outside `[0, 2^level)`.
    pub fn from_coordinates(coordinates: [u64; N], level: Level) -> Self {
        assert!(
            level <= Self::max_level(),
            "level {} exceeds max level {}",
            level,
            Self::max_level()
        );
        let extent = 1u64 << level;
        assert!(
            coordinates.iter().all(|&x| x < extent),
            "coordinates {:?} out of bounds [0, {}) at level {}",
            coordinates,
            extent,
            level
        );
        (0..level).rev().fold(Self::root(), |code, bit| {
            let offset = array::from_fn(|d| ((coordinates[d] >> bit) & 1) as u32);
            code.push(linearize_child::<N>(offset))
        })
    }

    /// The code of the same-level node displaced by `offset` node lengths.
    ///
    /// Returns `None` when the displaced node would lie outside the root's domain.
    pub fn shift(self, offset: [i32; N]) -> Option<Self> {
        let level = self.level();
        let extent = 1u64 << level;
        let mut coordinates = self.to_coordinates();
        for (x, &dx) in coordinates.iter_mut().zip(offset.iter()) {
            let moved = if dx >= 0 {
                x.checked_add(dx as u64)
            } else {
                x.checked_sub(u64::from(dx.unsigned_abs()))
            }?;
            if moved >= extent {
                return None;
            }
            *x = moved;
        }
        Some(Self::from_coordinates(coordinates, level))
    }

    /// Length of the node relative to a root of length 1.
    #[inline]
    pub fn length(self) -> f64 {
        node_length_at_level(self.level())
    }

    /// Center of the node in the root's `[0, 1]^N` frame.
    pub fn normalized_center(self) -> [f64; N] {
        let length = self.length();
        self.to_coordinates().map(|x| (x as f64 + 0.5) * length)
    }

    /// The code at `level` of the node containing `point`, given in the root's `[0, 1]^N` frame.
    ///
    /// Points on the upper boundary belong to the last node along that axis. Returns `None` for points outside the frame.
    pub fn from_normalized(point: [f64; N], level: Level) -> Option<Self> {
        assert!(
            level <= Self::max_level(),
            "level {} exceeds max level {}",
            level,
            Self::max_level()
        );
        let extent = 1u64 << level;
        let mut coordinates = [0; N];
        for (x, &p) in coordinates.iter_mut().zip(point.iter()) {
            if !(0.0..=1.0).contains(&p) {
                return None;
            }
            *x = ((p * extent as f64) as u64).min(extent - 1);
        }
        Some(Self::from_coordinates(coordinates, level))
    }
}

impl<const N: usize> fmt::Display for LocationCode<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[id: {}, lvl: {}, xs: {{", self.value, self.level())?;
        for (d, x) in self.to_coordinates().iter().enumerate() {
            if d > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, "}}, pip: {{")?;
        for (i, position) in self.path().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", position)?;
        }
        write!(f, "}}]")
    }
}

/// Iterator over the child positions of a [`LocationCode`], root first. Clone it to walk the path again.
#[derive(Clone, Debug)]
pub struct Path<const N: usize> {
    code: LocationCode<N>,
    next: Level,
    end: Level,
}

impl<const N: usize> Iterator for Path<N> {
    type Item = ChildIndex;

    #[inline]
    fn next(&mut self) -> Option<ChildIndex> {
        if self.next >= self.end {
            return None;
        }
        let position = self.code.position_at(self.next);
        self.next += 1;
        Some(position)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end.saturating_sub(self.next) as usize;
        (len, Some(len))
    }
}

impl<const N: usize> DoubleEndedIterator for Path<N> {
    #[inline]
    fn next_back(&mut self) -> Option<ChildIndex> {
        if self.next >= self.end {
            return None;
        }
        self.end -= 1;
        Some(self.code.position_at(self.end))
    }
}

impl<const N: usize> ExactSizeIterator for Path<N> {}

impl<const N: usize> FusedIterator for Path<N> {}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    fn push_every_child<const N: usize>() {
        let mut code = LocationCode::<N>::root();
        let children = children_count(N) as ChildIndex;
        for c in 0..children {
            code = code.push(c);
            assert_eq!(code.level(), c + 1);
            assert_eq!(code.position_at(c + 1), c);
        }
        assert!(code.path().eq(0..children));

        for c in (0..children).rev() {
            let (parent, position) = code.pop();
            assert_eq!(position, c);
            assert_eq!(parent.level(), c);
            code = parent;
        }
        assert!(code.is_root());
    }

    #[test]
    fn push_and_pop_every_child() {
        push_every_child::<1>();
        push_every_child::<2>();
        push_every_child::<3>();
    }

    #[test]
    fn max_levels_depend_on_dimension() {
        assert_eq!(LocationCode::<1>::MAX_LEVELS, 63);
        assert_eq!(LocationCode::<2>::MAX_LEVELS, 31);
        assert_eq!(LocationCode::<3>::MAX_LEVELS, 20);
        assert_eq!(LocationCode::<3>::max_level(), 19);
    }

    #[test]
    fn deepest_lower_corner_code() {
        let mut code = LocationCode::<3>::root();
        while code.level() != LocationCode::<3>::max_level() {
            code = code.push(0);
        }
        assert_eq!(code.raw(), 1u64 << (3 * LocationCode::<3>::max_level() as u32));
        assert_eq!(code.to_coordinates(), [0, 0, 0]);

        assert!(code.shift([0, 0, 0]).is_some());
        for d in 0..3 {
            let mut offset = [0; 3];
            offset[d] = -1;
            assert_eq!(code.shift(offset), None);
        }
    }

    #[test]
    fn deepest_upper_corner_code() {
        let mut code = LocationCode::<2>::root();
        while code.level() != LocationCode::<2>::max_level() {
            code = code.push(3);
        }
        let extent = 1u64 << LocationCode::<2>::max_level();
        assert_eq!(code.to_coordinates(), [extent - 1, extent - 1]);
        assert_eq!(code.shift([1, 0]), None);
        assert_eq!(code.shift([0, 1]), None);
        let moved = code.shift([-1, -1]).unwrap();
        assert_eq!(moved.to_coordinates(), [extent - 2, extent - 2]);
    }

    #[test]
    #[should_panic]
    fn push_past_max_level_panics() {
        let mut code = LocationCode::<3>::root();
        for _ in 0..=LocationCode::<3>::max_level() {
            code = code.push(7);
        }
    }

    #[test]
    #[should_panic]
    fn pop_root_panics() {
        let _ = LocationCode::<2>::root().pop();
    }

    #[test]
    #[should_panic]
    fn push_invalid_position_panics() {
        let _ = LocationCode::<1>::root().push(2);
    }

    #[test]
    fn binary_shift_leaves_domain() {
        let code = LocationCode::<1>::root().push(1);
        assert_eq!(code.level(), 1);
        assert_eq!(code.shift([1]), None);
        assert_eq!(code.shift([-1]), Some(LocationCode::root().push(0)));
    }

    #[test]
    fn root_has_no_neighbors() {
        let root = LocationCode::<2>::root();
        assert_eq!(root.shift([1, 0]), None);
        assert_eq!(root.shift([0, 0]), Some(root));
        assert_eq!(root.to_coordinates(), [0, 0]);
        assert_eq!(root.path().len(), 0);
    }

    #[test]
    fn coordinates_interleave_axes() {
        // Level 2, x = 2 (0b10), y = 1 (0b01) -> positions (x1 y0) = 1, then (x0 y1) = 2.
        let code = LocationCode::<2>::from_coordinates([2, 1], 2);
        assert!(code.path().eq([1, 2]));
        assert_eq!(code.raw(), 0b1_01_10);
        assert_eq!(code.to_coordinates(), [2, 1]);
        assert_eq!(code.shift([-1, 1]).unwrap().to_coordinates(), [1, 2]);
    }

    #[test]
    fn path_walks_both_ways() {
        let code = LocationCode::<3>::from_path([4, 0, 7, 2]);
        assert_eq!(code.path().collect::<Vec<_>>(), vec![4, 0, 7, 2]);
        assert_eq!(code.path().rev().collect::<Vec<_>>(), vec![2, 7, 0, 4]);
        let path = code.path();
        assert_eq!(path.clone().count(), path.count());
    }

    #[test]
    fn raw_round_trip_rejects_bad_markers() {
        let code = LocationCode::<3>::from_path([1, 2, 3]);
        assert_eq!(LocationCode::<3>::from_raw(code.raw()), Some(code));
        assert_eq!(LocationCode::<3>::from_raw(0), None);
        // Marker at bit 2 is not on a 3-bit level boundary.
        assert_eq!(LocationCode::<3>::from_raw(0b100), None);
        assert_eq!(LocationCode::<2>::from_raw(0b100), Some(LocationCode::<2>::from_path([0])));
    }

    #[test]
    fn parent_of_child_is_self() {
        let code = LocationCode::<2>::from_path([3, 1]);
        assert_eq!(code.push(2).parent(), Some(code));
        assert_eq!(LocationCode::<2>::root().parent(), None);
    }

    #[test]
    fn normalized_frame() {
        let code = LocationCode::<2>::from_path([3]);
        assert_eq!(code.length(), 0.5);
        assert_eq!(code.normalized_center(), [0.75, 0.75]);

        let found = LocationCode::<2>::from_normalized([0.8, 0.1], 2).unwrap();
        assert_eq!(found.to_coordinates(), [3, 0]);
        let corner = LocationCode::<2>::from_normalized([1.0, 1.0], 1).unwrap();
        assert_eq!(corner, code);
        assert_eq!(LocationCode::<2>::from_normalized([1.5, 0.0], 1), None);
        assert_eq!(LocationCode::<2>::from_normalized([f64::NAN, 0.0], 1), None);
    }

    #[test]
    fn display() {
        let code = LocationCode::<2>::from_path([1, 2]);
        assert_eq!(code.to_string(), "[id: 22, lvl: 2, xs: {2, 1}, pip: {1,2}]");
    }
}
