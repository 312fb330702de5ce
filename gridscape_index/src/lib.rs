// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gridscape Index: a uniform-grid spatial hash for 2D AABBs.
//!
//! This is the broad-phase building block of Gridscape. Boxes are bucketed
//! into square cells of one fixed size; each entry is listed in every cell its
//! box touches.
//!
//! - Insert a box with a payload and get a stable [`EntryKey`] back.
//! - [`SpatialHash::update`] re-buckets an entry only when its covered
//!   [`CellSpan`] changes, so small moves inside a cell are cheap.
//! - [`SpatialHash::search`] answers range queries either exactly
//!   (deduplicated, overlap-filtered) or conservatively (raw bucket contents).
//!
//! It is generic over the scalar type `T` and does not depend on any geometry
//! crate. Higher layers convert their own rectangles into [`Aabb2D`].
//!
//! # Example
//!
//! ```rust
//! use gridscape_index::{Aabb2D, SpatialHash};
//!
//! let mut grid: SpatialHash<f64, u32> = SpatialHash::new(64.0);
//! let k1 = grid.insert(Aabb2D::from_xywh(0.0, 0.0, 10.0, 10.0), 1);
//! let _k2 = grid.insert(Aabb2D::from_xywh(5.0, 5.0, 10.0, 10.0), 2);
//!
//! let mut hits = grid.search(Aabb2D::from_xywh(6.0, 6.0, 1.0, 1.0), true);
//! hits.sort();
//! assert_eq!(hits, [1, 2]);
//!
//! // Moving within the same cells does not touch the buckets.
//! assert!(!grid.update(k1, Aabb2D::from_xywh(1.0, 1.0, 10.0, 10.0)));
//! ```
//!
//! ## Float semantics
//!
//! Coordinates are assumed to be finite. Cell coordinates are `i32`; values
//! outside that range saturate into the outermost cells.

#![no_std]

extern crate alloc;

mod hash;
mod span;
mod types;

pub use hash::{DEFAULT_CELL_SIZE, EntryKey, SpatialHash};
pub use span::{CellSpan, GridScalar};
pub use types::{Aabb2D, Scalar};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn insert_move_remove_scenario() {
        let mut grid: SpatialHash<f64, u32> = SpatialHash::new(10.0);
        let a = grid.insert(Aabb2D::from_xywh(0.0, 0.0, 10.0, 10.0), 1);
        let probe = Aabb2D::from_xywh(0.0, 0.0, 1.0, 1.0);
        assert_eq!(grid.search(probe, true), [1]);

        grid.update(a, Aabb2D::from_xywh(100.0, 100.0, 10.0, 10.0));
        assert!(grid.search(probe, true).is_empty());

        grid.remove(a);
        let everywhere = Aabb2D::from_xywh(-1000.0, -1000.0, 2000.0, 2000.0);
        assert!(grid.search(everywhere, false).is_empty());
    }

    #[test]
    fn integer_grid() {
        let mut grid: SpatialHash<i64, char> = SpatialHash::new(8);
        grid.insert(Aabb2D::from_xywh(0, 0, 4, 4), 'a');
        grid.insert(Aabb2D::from_xywh(-20, -20, 4, 4), 'b');
        let hits: Vec<_> = grid.search(Aabb2D::new(-100, -100, 2, 2), true);
        assert_eq!(hits.len(), 2);
    }
}
