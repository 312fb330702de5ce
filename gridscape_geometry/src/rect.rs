// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle predicates with the engine's edge conventions.
//!
//! [`kurbo::Rect`] treats shared edges as overlapping; the engine does not.
//! Two rectangles only overlap when their interiors do, which keeps touching
//! tiles from colliding and keeps adjacent dirty regions from merging.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};

/// Whether the interiors of `a` and `b` overlap.
#[inline]
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// Whether `inner` lies entirely within `outer` (edges may touch).
#[inline]
pub fn within(inner: Rect, outer: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.x1 >= inner.x1 && outer.y0 <= inner.y0 && outer.y1 >= inner.y1
}

/// Whether `pt` lies inside `rect`, edges included.
#[inline]
pub fn contains_point(rect: Rect, pt: Point) -> bool {
    rect.x0 <= pt.x && pt.x <= rect.x1 && rect.y0 <= pt.y && pt.y <= rect.y1
}

/// Whether the rectangle has no area (or is inverted).
#[inline]
pub fn is_degenerate(rect: Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

/// The smallest rectangle enclosing every rectangle in `rects`.
pub fn bounding_rect(rects: &[Rect]) -> Option<Rect> {
    let (first, rest) = rects.split_first()?;
    Some(rest.iter().fold(*first, |acc, r| acc.union(*r)))
}

/// Grow `rect` outward to whole units: floor the minimum, ceil the maximum.
///
/// Values within a rounding error of an integer are snapped first so that
/// trigonometric noise (`cos(90°) ≈ 6e-17`) does not grow a box by a unit.
pub fn expand_to_pixels(rect: Rect) -> Rect {
    Rect::new(
        snap(rect.x0).floor(),
        snap(rect.y0).floor(),
        snap(rect.x1).ceil(),
        snap(rect.y1).ceil(),
    )
}

fn snap(v: f64) -> f64 {
    const SNAP: f64 = 1e-9;
    let r = v.round();
    if (v - r).abs() < SNAP { r } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(overlaps(a, Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!overlaps(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!overlaps(a, Rect::new(0.0, 10.0, 10.0, 20.0)));
    }

    #[test]
    fn containment() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(within(Rect::new(0.0, 0.0, 100.0, 50.0), outer));
        assert!(!within(Rect::new(-1.0, 0.0, 10.0, 10.0), outer));
        assert!(contains_point(outer, Point::new(100.0, 100.0)));
        assert!(!contains_point(outer, Point::new(100.5, 0.0)));
    }

    #[test]
    fn pixel_expansion() {
        let r = expand_to_pixels(Rect::new(0.5, -0.5, 9.2, 10.0));
        assert_eq!(r, Rect::new(0.0, -1.0, 10.0, 10.0));
        let noisy = expand_to_pixels(Rect::new(-10.0, 6.0e-16, 6.0e-16, 10.0));
        assert_eq!(noisy, Rect::new(-10.0, 0.0, 0.0, 10.0));
    }

    #[test]
    fn bounding_rect_of_set() {
        assert_eq!(bounding_rect(&[]), None);
        let r = bounding_rect(&[
            Rect::new(0.0, 0.0, 1.0, 1.0),
            Rect::new(5.0, -2.0, 6.0, 0.0),
        ]);
        assert_eq!(r, Some(Rect::new(0.0, -2.0, 6.0, 1.0)));
        assert!(is_degenerate(Rect::new(3.0, 3.0, 3.0, 8.0)));
    }
}
