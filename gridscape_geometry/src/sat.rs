// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Separating Axis Theorem narrow phase for convex polygons.

use kurbo::Vec2;

use crate::polygon::Polygon;
use crate::shape::HitShape;

/// Result of a SAT test that found an overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SatHit {
    /// Penetration depth along [`normal`](Self::normal); zero when the shapes
    /// only touch.
    pub overlap: f64,
    /// Unit axis of least penetration, pointing from the first shape towards
    /// the second.
    pub normal: Vec2,
}

impl SatHit {
    /// Translation that moves the first shape out of the second.
    pub fn resolution(&self) -> Vec2 {
        -self.normal * self.overlap
    }
}

/// Test two convex polygons for overlap.
///
/// Every edge normal of `a`, then of `b`, is a candidate axis. A strictly
/// positive gap on any axis proves separation and returns `None`. Edges of
/// zero length are skipped. Touching shapes are reported with an overlap of
/// zero.
///
/// ```
/// use gridscape_geometry::{Polygon, sat};
/// use kurbo::Rect;
///
/// let a = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
/// let b = Polygon::from_rect(Rect::new(8.0, 0.0, 18.0, 10.0));
/// let hit = sat(&a, &b).unwrap();
/// assert_eq!(hit.overlap, 2.0);
/// assert_eq!(hit.normal.x, 1.0);
/// assert!(sat(&a, &Polygon::from_rect(Rect::new(20.0, 0.0, 30.0, 10.0))).is_none());
/// ```
pub fn sat(a: &Polygon, b: &Polygon) -> Option<SatHit> {
    let mut best: Option<SatHit> = None;
    for (p, q) in a.edges().chain(b.edges()) {
        let edge = q - p;
        let len = edge.hypot();
        if len <= f64::EPSILON {
            continue;
        }
        let axis = Vec2::new(-edge.y, edge.x) / len;
        let (min_a, max_a) = project(a, axis);
        let (min_b, max_b) = project(b, axis);
        let penetration = (max_a - min_b).min(max_b - min_a);
        // The interval is the negated penetration; positive means a gap.
        if penetration < 0.0 {
            return None;
        }
        if best.is_none_or(|hit| penetration < hit.overlap) {
            best = Some(SatHit {
                overlap: penetration,
                normal: axis,
            });
        }
    }
    let mut hit = best?;
    if let (Some(ca), Some(cb)) = (a.centroid(), b.centroid())
        && hit.normal.dot(cb - ca) < 0.0
    {
        hit.normal = -hit.normal;
    }
    Some(hit)
}

/// [`sat`] over hit shapes; circles are approximated by octagons.
pub fn sat_shapes(a: &HitShape, b: &HitShape) -> Option<SatHit> {
    match (a, b) {
        (HitShape::Polygon(pa), HitShape::Polygon(pb)) => sat(pa, pb),
        _ => sat(&a.to_polygon(), &b.to_polygon()),
    }
}

fn project(poly: &Polygon, axis: Vec2) -> (f64, f64) {
    poly.points()
        .iter()
        .map(|p| p.to_vec2().dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}
