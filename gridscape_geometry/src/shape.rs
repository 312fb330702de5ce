// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The optional hit shape an entity can carry.

use core::f64::consts::FRAC_PI_4;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Circle, Point, Rect, Vec2};

use crate::bounds::RotationEvent;
use crate::polygon::Polygon;

/// Number of vertices used when a circle takes part in SAT.
const CIRCLE_SEGMENTS: usize = 8;

/// Precise collision and picking geometry.
///
/// Entities without a hit shape fall back to their bounding rectangle.
#[derive(Clone, Debug, PartialEq)]
pub enum HitShape {
    /// A convex polygon.
    Polygon(Polygon),
    /// A circle; exact for point tests, an octagon for SAT.
    Circle(Circle),
}

impl HitShape {
    /// Whether `pt` is inside the shape.
    pub fn contains_point(&self, pt: Point) -> bool {
        match self {
            Self::Polygon(p) => p.contains_point(pt),
            Self::Circle(c) => (pt - c.center).hypot2() < c.radius * c.radius,
        }
    }

    /// Move the shape by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Self::Polygon(p) => p.translate(delta),
            Self::Circle(c) => c.center += delta,
        }
    }

    /// Rotate the shape by the event's delta about its pivot.
    ///
    /// A circle only moves its center; its outline is unchanged by rotation.
    pub fn rotate(&mut self, event: &RotationEvent) {
        match self {
            Self::Polygon(p) => p.rotate(event),
            Self::Circle(c) => c.center = event.apply(c.center),
        }
    }

    /// Axis-aligned bounds of the shape.
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Self::Polygon(p) => p.bounding_box(),
            Self::Circle(c) => Some(Rect::from_center_size(
                c.center,
                (c.radius * 2.0, c.radius * 2.0),
            )),
        }
    }

    /// The convex ring used by the SAT narrow phase.
    pub fn to_polygon(&self) -> Polygon {
        match self {
            Self::Polygon(p) => p.clone(),
            Self::Circle(c) => circle_polygon(*c),
        }
    }
}

impl From<Polygon> for HitShape {
    fn from(p: Polygon) -> Self {
        Self::Polygon(p)
    }
}

impl From<Circle> for HitShape {
    fn from(c: Circle) -> Self {
        Self::Circle(c)
    }
}

/// Octagon inscribed in `circle`.
fn circle_polygon(circle: Circle) -> Polygon {
    Polygon::new((0..CIRCLE_SEGMENTS).map(|i| {
        #[allow(clippy::cast_precision_loss, reason = "Small loop counter.")]
        let (sin, cos) = (i as f64 * FRAC_PI_4).sin_cos();
        circle.center + Vec2::new(sin * circle.radius, cos * circle.radius)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_point_test_is_exact() {
        let shape = HitShape::from(Circle::new((0.0, 0.0), 10.0));
        assert!(shape.contains_point(Point::new(7.0, 7.0)));
        assert!(!shape.contains_point(Point::new(7.5, 7.5)));
    }

    #[test]
    fn circle_octagon_is_inscribed() {
        let c = Circle::new((5.0, 5.0), 2.0);
        let poly = HitShape::Circle(c).to_polygon();
        assert_eq!(poly.len(), CIRCLE_SEGMENTS);
        for p in poly.points() {
            assert!(((*p - c.center).hypot() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn circle_moves_with_rotation_pivot() {
        let mut shape = HitShape::from(Circle::new((10.0, 0.0), 1.0));
        shape.rotate(&RotationEvent::new(0.0, 90.0, Point::ORIGIN));
        let HitShape::Circle(c) = shape else {
            unreachable!("still a circle");
        };
        assert!((c.center - Point::new(0.0, 10.0)).hypot() < 1e-9);
    }

    #[test]
    fn translate_polygon_shape() {
        let mut shape = HitShape::from(Polygon::from_rect(Rect::new(0.0, 0.0, 2.0, 2.0)));
        shape.translate(Vec2::new(3.0, 4.0));
        assert_eq!(shape.bounding_box(), Some(Rect::new(3.0, 4.0, 5.0, 6.0)));
    }
}
