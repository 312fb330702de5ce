// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Convex polygon hit shapes.

use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::bounds::RotationEvent;

/// A closed convex ring of points.
///
/// Points are stored in whatever space the owner chooses; the scene keeps
/// them in world space and moves them in place with [`translate`] and
/// [`rotate`], rebuilding the ring only when the pivot moves.
///
/// Only convex rings give correct SAT results; the type does not check.
///
/// [`translate`]: Self::translate
/// [`rotate`]: Self::rotate
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    points: SmallVec<[Point; 8]>,
}

impl Polygon {
    /// Build a polygon from its vertices in ring order.
    pub fn new<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        Self {
            points: points.into_iter().map(Into::into).collect(),
        }
    }

    /// The four corners of `rect`, clockwise from the top-left (y down).
    pub fn from_rect(rect: Rect) -> Self {
        Self::new([
            (rect.x0, rect.y0),
            (rect.x1, rect.y0),
            (rect.x1, rect.y1),
            (rect.x0, rect.y1),
        ])
    }

    /// The vertices in ring order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate the edges `(current, next)`, wrapping from the last vertex to
    /// the first.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Even-odd point containment.
    ///
    /// ```
    /// use gridscape_geometry::Polygon;
    /// use kurbo::Point;
    ///
    /// let tri = Polygon::new([(50.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
    /// assert!(tri.contains_point(Point::new(50.0, 50.0)));
    /// assert!(!tri.contains_point(Point::new(0.0, 0.0)));
    /// ```
    pub fn contains_point(&self, pt: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            // Only edges that straddle the horizontal line through `pt` count;
            // that also rules out the horizontal ones, so the division is safe.
            if (a.y > pt.y) != (b.y > pt.y) {
                let cross_x = (b.x - a.x) * (pt.y - a.y) / (b.y - a.y) + a.x;
                if pt.x < cross_x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Move every vertex by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    /// Rotate every vertex by the event's delta about its pivot.
    pub fn rotate(&mut self, event: &RotationEvent) {
        for p in &mut self.points {
            *p = event.apply(*p);
        }
    }

    /// Axis-aligned bounding box of the vertices, or `None` when empty.
    pub fn bounding_box(&self) -> Option<Rect> {
        let (first, rest) = self.points.split_first()?;
        Some(
            rest.iter()
                .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p)),
        )
    }

    /// Average of the vertices, or `None` when empty.
    pub fn centroid(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
        #[allow(
            clippy::cast_precision_loss,
            reason = "Vertex counts are tiny."
        )]
        let n = self.points.len() as f64;
        Some((sum / n).to_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_containment() {
        let sq = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(sq.len(), 4);
        assert!(sq.contains_point(Point::new(5.0, 5.0)));
        assert!(!sq.contains_point(Point::new(10.5, 5.0)));
        assert!(!sq.contains_point(Point::new(-0.5, 5.0)));
    }

    #[test]
    fn translate_in_place() {
        let mut tri = Polygon::new([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        tri.translate(Vec2::new(5.0, -5.0));
        assert_eq!(
            tri.points(),
            &[
                Point::new(5.0, -5.0),
                Point::new(15.0, -5.0),
                Point::new(5.0, 5.0)
            ]
        );
        assert_eq!(tri.bounding_box(), Some(Rect::new(5.0, -5.0, 15.0, 5.0)));
    }

    #[test]
    fn rotate_about_pivot() {
        let mut sq = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let ev = RotationEvent::new(0.0, 180.0, Point::new(5.0, 5.0));
        sq.rotate(&ev);
        let bbox = sq.bounding_box().unwrap();
        assert!((bbox.x0 - 0.0).abs() < 1e-9 && (bbox.x1 - 10.0).abs() < 1e-9);
        // The first vertex went to the opposite corner.
        assert!((sq.points()[0] - Point::new(10.0, 10.0)).hypot() < 1e-9);
    }

    #[test]
    fn edges_wrap_around() {
        let tri = Polygon::new([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let edges: alloc::vec::Vec<_> = tri.edges().collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2], (Point::new(0.0, 1.0), Point::new(0.0, 0.0)));
        assert_eq!(tri.centroid(), Some(Point::new(1.0 / 3.0, 1.0 / 3.0)));
    }
}
