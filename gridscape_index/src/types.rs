// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::Debug;

/// Axis-aligned bounding box in 2D.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb2D<T> {
    /// Minimum x (left)
    pub min_x: T,
    /// Minimum y (top)
    pub min_y: T,
    /// Maximum x (right)
    pub max_x: T,
    /// Maximum y (bottom)
    pub max_y: T,
}

impl<T> Aabb2D<T> {
    /// Create a new AABB from min/max corners.
    #[inline(always)]
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Copy + PartialOrd> Aabb2D<T> {
    /// Whether this AABB contains the point. Edges are inclusive.
    #[inline]
    pub fn contains_point(&self, x: T, y: T) -> bool {
        self.min_x <= x && self.min_y <= y && x <= self.max_x && y <= self.max_y
    }

    /// The intersection of two AABBs.
    ///
    /// The result may be empty (see [`is_empty`][Self::is_empty]) when the
    /// boxes do not overlap.
    #[inline]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min_x: max_t(self.min_x, other.min_x),
            min_y: max_t(self.min_y, other.min_y),
            max_x: min_t(self.max_x, other.max_x),
            max_y: min_t(self.max_y, other.max_y),
        }
    }

    /// Whether the interiors of the two AABBs overlap.
    ///
    /// Boxes that merely share an edge do **not** overlap; this is the test
    /// used to filter grid candidates during an exact search.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridscape_index::Aabb2D;
    ///
    /// let a = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// assert!(a.overlaps(&Aabb2D::new(5.0, 5.0, 15.0, 15.0)));
    ///
    /// // Touching edges are not an overlap.
    /// assert!(!a.overlaps(&Aabb2D::new(10.0, 0.0, 20.0, 10.0)));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// The smallest AABB enclosing both AABBs.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: min_t(self.min_x, other.min_x),
            min_y: min_t(self.min_y, other.min_y),
            max_x: max_t(self.max_x, other.max_x),
            max_y: max_t(self.max_y, other.max_y),
        }
    }

    /// Return true if the AABB is empty or inverted (no area). Assumes no NaN.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }
}

impl<T: Scalar> Aabb2D<T> {
    /// Create an AABB from an origin and a size.
    #[inline]
    pub fn from_xywh(x: T, y: T, w: T, h: T) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: T::add(x, w),
            max_y: T::add(y, h),
        }
    }

    /// Width of the box, clamped at zero.
    #[inline]
    pub fn width(&self) -> T {
        T::max(T::sub(self.max_x, self.min_x), T::zero())
    }

    /// Height of the box, clamped at zero.
    #[inline]
    pub fn height(&self) -> T {
        T::max(T::sub(self.max_y, self.min_y), T::zero())
    }
}

/// Numeric scalar abstraction for 2D AABBs.
///
/// Only the handful of operations the grid needs are required, so the index
/// can work over floats and integers alike.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Max of the two scalar values.
    fn max(a: Self, b: Self) -> Self;

    /// Min of the two scalar values.
    fn min(a: Self, b: Self) -> Self;
}

macro_rules! float_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            #[inline]
            fn add(a: Self, b: Self) -> Self {
                a + b
            }

            #[inline]
            fn sub(a: Self, b: Self) -> Self {
                a - b
            }

            #[inline(always)]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn max(a: Self, b: Self) -> Self {
                Self::max(a, b)
            }

            #[inline]
            fn min(a: Self, b: Self) -> Self {
                Self::min(a, b)
            }
        }
    };
}

float_scalar!(f32);
float_scalar!(f64);

impl Scalar for i64 {
    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a.saturating_add(b)
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a.saturating_sub(b)
    }

    #[inline(always)]
    fn zero() -> Self {
        0
    }

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        core::cmp::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        core::cmp::min(a, b)
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2D;

    #[test]
    fn overlap_is_strict() {
        let a = Aabb2D::new(0_i64, 0, 10, 10);
        assert!(a.overlaps(&Aabb2D::new(9, 9, 20, 20)));
        assert!(!a.overlaps(&Aabb2D::new(10, 10, 20, 20)));
        assert!(!a.overlaps(&Aabb2D::new(0, 10, 10, 20)));
    }

    #[test]
    fn union_and_intersect() {
        let a = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb2D::new(5.0, -5.0, 20.0, 5.0);
        assert_eq!(a.union(&b), Aabb2D::new(0.0, -5.0, 20.0, 10.0));
        assert_eq!(a.intersect(&b), Aabb2D::new(5.0, 0.0, 10.0, 5.0));

        let far = Aabb2D::new(30.0, 30.0, 40.0, 40.0);
        assert!(a.intersect(&far).is_empty());
    }

    #[test]
    fn size_clamps_inverted_boxes() {
        let mut aabb = Aabb2D::<f64>::from_xywh(5., 7., 5., 2.);
        assert_eq!(aabb.width(), 5.0);
        assert_eq!(aabb.height(), 2.0);
        assert!(!aabb.is_empty());

        aabb.max_x = -aabb.max_x;
        assert_eq!(aabb.width(), 0.0);
        assert!(aabb.is_empty());
    }
}
