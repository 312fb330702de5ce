// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid cell coordinates and the cell span covered by a box.

use crate::types::{Aabb2D, Scalar};

/// Scalar types that can be bucketed into grid cells.
///
/// Kept separate from [`Scalar`] so that each type can pick the right
/// flooring strategy (truncate-and-adjust for floats, Euclidean division for
/// integers).
pub trait GridScalar: Scalar {
    /// Map a coordinate to its cell along one axis: `floor(value / cell_size)`.
    ///
    /// Results outside the `i32` range are saturated. Implementations must be
    /// monotonic in `value` for a fixed `cell_size`.
    fn cell_coord(value: Self, cell_size: Self) -> i32;
}

macro_rules! float_grid_scalar {
    ($t:ty) => {
        impl GridScalar for $t {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Cell coordinates are i32; out-of-range values saturate."
            )]
            #[inline]
            fn cell_coord(value: Self, cell_size: Self) -> i32 {
                debug_assert!(cell_size > 0.0, "cell_size must be strictly positive");
                let t = value / cell_size;
                let coord = t as i32;
                // `as` truncates towards zero; step down for negative fractions.
                if t < 0.0 && (coord as Self) > t {
                    coord.saturating_sub(1)
                } else {
                    coord
                }
            }
        }
    };
}

float_grid_scalar!(f32);
float_grid_scalar!(f64);

impl GridScalar for i64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Clamped into i32 range before the cast."
    )]
    #[inline]
    fn cell_coord(value: Self, cell_size: Self) -> i32 {
        debug_assert!(cell_size > 0, "cell_size must be strictly positive");
        value
            .div_euclid(cell_size)
            .clamp(Self::from(i32::MIN), Self::from(i32::MAX)) as i32
    }
}

/// Inclusive range of grid cells covered by a box.
///
/// `x1..=x2` by `y1..=y2`, computed by flooring the box's corners. Two spans
/// compare equal exactly when an entry would occupy the same buckets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellSpan {
    /// First column.
    pub x1: i32,
    /// First row.
    pub y1: i32,
    /// Last column (inclusive).
    pub x2: i32,
    /// Last row (inclusive).
    pub y2: i32,
}

impl CellSpan {
    /// Compute the span covered by `aabb` on a grid of `cell_size`.
    pub fn of<T: GridScalar>(aabb: &Aabb2D<T>, cell_size: T) -> Self {
        let x1 = T::cell_coord(aabb.min_x, cell_size);
        let x2 = T::cell_coord(aabb.max_x, cell_size);
        let y1 = T::cell_coord(aabb.min_y, cell_size);
        let y2 = T::cell_coord(aabb.max_y, cell_size);
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Iterate every `(column, row)` key in the span, column-major.
    pub fn cells(self) -> impl Iterator<Item = (i32, i32)> {
        (self.x1..=self.x2).flat_map(move |ix| (self.y1..=self.y2).map(move |iy| (ix, iy)))
    }

    /// Number of cells in the span.
    pub fn cell_count(&self) -> usize {
        let w = i64::from(self.x2) - i64::from(self.x1) + 1;
        let h = i64::from(self.y2) - i64::from(self.y1) + 1;
        usize::try_from(w * h).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn floors_negative_coordinates() {
        assert_eq!(GridScalar::cell_coord(-0.5_f64, 64.0), -1);
        assert_eq!(GridScalar::cell_coord(-64.0_f64, 64.0), -1);
        assert_eq!(GridScalar::cell_coord(-64.5_f32, 64.0), -2);
        assert_eq!(GridScalar::cell_coord(-1_i64, 10), -1);
        assert_eq!(GridScalar::cell_coord(63.9_f64, 64.0), 0);
        assert_eq!(GridScalar::cell_coord(64.0_f64, 64.0), 1);
    }

    #[test]
    fn cell_coord_saturates() {
        assert_eq!(GridScalar::cell_coord(1e20_f32, 1.0), i32::MAX);
        assert_eq!(GridScalar::cell_coord(-1e20_f32, 1.0), i32::MIN);
        assert_eq!(GridScalar::cell_coord(1e20_f64, 1.0), i32::MAX);
        assert_eq!(GridScalar::cell_coord(i64::MIN, 1), i32::MIN);
    }

    #[test]
    fn cell_coord_is_monotonic_f64() {
        for value in [i32::MIN as f64, -1., 0., 1., i32::MAX as f64] {
            assert!(
                GridScalar::cell_coord(value.next_down(), 1.0) <= GridScalar::cell_coord(value, 1.0)
            );
            assert!(
                GridScalar::cell_coord(value, 1.0) <= GridScalar::cell_coord(value.next_up(), 1.0)
            );
        }
    }

    #[test]
    fn span_covers_both_corners() {
        // The far edge of a 10x10 box at the origin lands in the next cell.
        let span = CellSpan::of(&Aabb2D::from_xywh(0.0, 0.0, 10.0, 10.0), 10.0);
        assert_eq!(span, CellSpan { x1: 0, y1: 0, x2: 1, y2: 1 });
        assert_eq!(span.cell_count(), 4);
        let cells: Vec<_> = span.cells().collect();
        assert_eq!(cells, [(0, 0), (0, 1), (1, 0), (1, 1)]);
    }
}
