// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rotation math: normalized angles, the rotated minimum bounding rectangle,
//! rotation origins, and the per-change rotation event.
//!
//! Rotations are clockwise in degrees with y pointing down, matching
//! [`Affine::rotate`].

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Rect, Size, Vec2};

use crate::rect::expand_to_pixels;

/// Reduce an angle in degrees into the open interval `(-360, 360)`.
///
/// The sign is kept, so `-90` stays `-90` and `450` becomes `90`.
#[inline]
pub fn normalize_degrees(deg: f64) -> f64 {
    deg % 360.0
}

/// Compute the minimum bounding rectangle of `rect` rotated by `rotation`
/// degrees about `rect.origin() + origin`.
///
/// Returns `None` when the normalized rotation is zero: the plain rectangle
/// is then authoritative. Otherwise the four corners are rotated and the
/// result is the axis-aligned box around them with its minimum floored and
/// its maximum ceiled.
///
/// ```
/// use gridscape_geometry::recompute_mbr;
/// use kurbo::{Rect, Vec2};
///
/// let rect = Rect::new(0.0, 0.0, 10.0, 20.0);
/// assert_eq!(recompute_mbr(rect, 360.0, Vec2::ZERO), None);
/// assert_eq!(
///     recompute_mbr(rect, 90.0, Vec2::ZERO),
///     Some(Rect::new(-20.0, 0.0, 0.0, 10.0)),
/// );
/// ```
pub fn recompute_mbr(rect: Rect, rotation: f64, origin: Vec2) -> Option<Rect> {
    let theta = normalize_degrees(rotation);
    if theta == 0.0 {
        return None;
    }
    let pivot = rect.origin() + origin;
    let rotate = Affine::rotate_about(theta.to_radians(), pivot);
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
    .map(|p| rotate * p);

    let mut bbox = Rect::from_points(corners[0], corners[0]);
    for p in &corners[1..] {
        bbox = bbox.union_pt(*p);
    }
    Some(expand_to_pixels(bbox))
}

/// Where an entity rotates around, relative to its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Origin {
    /// An explicit offset from the top-left corner.
    Offset(Vec2),
    /// The top-left corner itself.
    #[default]
    TopLeft,
    /// Middle of the top edge.
    TopCenter,
    /// Top-right corner.
    TopRight,
    /// Middle of the left edge.
    MiddleLeft,
    /// Center of the rectangle.
    Center,
    /// Middle of the right edge.
    MiddleRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Middle of the bottom edge.
    BottomCenter,
    /// Bottom-right corner.
    BottomRight,
}

impl Origin {
    /// Resolve to an offset for a rectangle of the given size.
    pub fn resolve(self, size: Size) -> Vec2 {
        let (w, h) = (size.width, size.height);
        match self {
            Self::Offset(v) => v,
            Self::TopLeft => Vec2::ZERO,
            Self::TopCenter => Vec2::new(w / 2.0, 0.0),
            Self::TopRight => Vec2::new(w, 0.0),
            Self::MiddleLeft => Vec2::new(0.0, h / 2.0),
            Self::Center => Vec2::new(w / 2.0, h / 2.0),
            Self::MiddleRight => Vec2::new(w, h / 2.0),
            Self::BottomLeft => Vec2::new(0.0, h),
            Self::BottomCenter => Vec2::new(w / 2.0, h),
            Self::BottomRight => Vec2::new(w, h),
        }
    }
}

impl From<Vec2> for Origin {
    fn from(v: Vec2) -> Self {
        Self::Offset(v)
    }
}

/// Describes one rotation change: the *delta* from the previous angle to the
/// new one, applied about a pivot.
///
/// Attached children and hit shapes consume this to follow their parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationEvent {
    /// Cosine of the delta.
    pub cos: f64,
    /// Sine of the delta.
    pub sin: f64,
    /// Delta in degrees (clockwise positive).
    pub delta_deg: f64,
    /// Delta in radians.
    pub delta_rad: f64,
    /// World-space point the rotation is applied about.
    pub pivot: Point,
}

impl RotationEvent {
    /// Build the event for a change from `previous` to `next` degrees.
    pub fn new(previous: f64, next: f64, pivot: Point) -> Self {
        let delta_deg = next - previous;
        let delta_rad = delta_deg.to_radians();
        let (sin, cos) = delta_rad.sin_cos();
        Self {
            cos,
            sin,
            delta_deg,
            delta_rad,
            pivot,
        }
    }

    /// The 2x2 rotation matrix `[m11, m12, m21, m22]` in kurbo's column order.
    pub fn matrix(&self) -> [f64; 4] {
        [self.cos, self.sin, -self.sin, self.cos]
    }

    /// The full transform: rotate by the delta about the pivot.
    pub fn affine(&self) -> Affine {
        let [a, b, c, d] = self.matrix();
        let p = self.pivot.to_vec2();
        Affine::translate(p) * Affine::new([a, b, c, d, 0.0, 0.0]) * Affine::translate(-p)
    }

    /// Rotate a single point.
    pub fn apply(&self, pt: Point) -> Point {
        let d = pt - self.pivot;
        Point::new(
            self.pivot.x + d.x * self.cos - d.y * self.sin,
            self.pivot.y + d.x * self.sin + d.y * self.cos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_keeps_sign() {
        assert_eq!(normalize_degrees(450.0), 90.0);
        assert_eq!(normalize_degrees(-90.0), -90.0);
        assert_eq!(normalize_degrees(-720.0), 0.0);
        assert!(normalize_degrees(359.5) < 360.0);
    }

    #[test]
    fn zero_rotation_has_no_mbr() {
        let rect = Rect::new(3.0, 4.0, 13.0, 24.0);
        assert_eq!(recompute_mbr(rect, 0.0, Vec2::ZERO), None);
        assert_eq!(recompute_mbr(rect, -360.0, Vec2::new(5.0, 5.0)), None);
        assert_eq!(recompute_mbr(rect, 720.0, Vec2::ZERO), None);
    }

    #[test]
    fn mbr_is_idempotent() {
        let rect = Rect::new(10.0, 20.0, 42.0, 36.0);
        let origin = Origin::Center.resolve(rect.size());
        let a = recompute_mbr(rect, 33.0, origin);
        let b = recompute_mbr(rect, 33.0, origin);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn mbr_encloses_rotated_corners() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let mbr = recompute_mbr(rect, 45.0, Vec2::new(5.0, 5.0)).unwrap();
        // Half-diagonal of a 10x10 square is ~7.07; rounded outward.
        assert_eq!(mbr, Rect::new(-3.0, -3.0, 13.0, 13.0));
    }

    #[test]
    fn clockwise_quarter_turn_about_center() {
        let rect = Rect::new(0.0, 0.0, 20.0, 10.0);
        let mbr = recompute_mbr(rect, 90.0, Origin::Center.resolve(rect.size())).unwrap();
        assert_eq!(mbr, Rect::new(5.0, -5.0, 15.0, 15.0));
    }

    #[test]
    fn rotation_event_apply_matches_affine() {
        let ev = RotationEvent::new(10.0, 100.0, Point::new(5.0, 5.0));
        assert_eq!(ev.delta_deg, 90.0);
        let p = Point::new(15.0, 5.0);
        let a = ev.apply(p);
        let b = ev.affine() * p;
        assert!((a - b).hypot() < 1e-9);
        // Clockwise with y down: +x maps to +y.
        assert!((a - Point::new(5.0, 15.0)).hypot() < 1e-9);
    }

    #[test]
    fn origin_presets() {
        let size = Size::new(40.0, 20.0);
        assert_eq!(Origin::Center.resolve(size), Vec2::new(20.0, 10.0));
        assert_eq!(Origin::BottomRight.resolve(size), Vec2::new(40.0, 20.0));
        assert_eq!(Origin::MiddleLeft.resolve(size), Vec2::new(0.0, 10.0));
        assert_eq!(Origin::from(Vec2::new(1.0, 2.0)).resolve(size), Vec2::new(1.0, 2.0));
    }
}
