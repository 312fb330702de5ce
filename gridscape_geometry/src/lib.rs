// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gridscape Geometry: hit shapes, rotated bounds, and SAT collision.
//!
//! Everything here is plain [`kurbo`] geometry with no knowledge of entities
//! or indices. The scene crate composes these pieces.
//!
//! - [`recompute_mbr`] turns a rectangle plus rotation and [`Origin`] into the
//!   minimum bounding rectangle used for indexing and collision.
//! - [`RotationEvent`] describes one rotation delta about a pivot; attached
//!   children and [`HitShape`]s replay it.
//! - [`Polygon`] and [`HitShape`] are the precise picking and collision
//!   shapes; [`sat`] is the narrow phase between two convex rings.
//! - [`rect`] holds the strict overlap and pixel-snapping helpers shared by
//!   the broad phase and the draw manager.
//!
//! # Example
//!
//! ```rust
//! use gridscape_geometry::{Origin, Polygon, RotationEvent, recompute_mbr, sat};
//! use kurbo::{Point, Rect};
//!
//! let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
//! let mbr = recompute_mbr(rect, 90.0, Origin::Center.resolve(rect.size()));
//! assert_eq!(mbr, Some(rect));
//!
//! let mut a = Polygon::from_rect(rect);
//! a.rotate(&RotationEvent::new(0.0, 45.0, Point::new(5.0, 5.0)));
//! let b = Polygon::from_rect(Rect::new(12.0, 0.0, 22.0, 10.0));
//! // The rotated square's corner reaches x ~= 12.07.
//! assert!(sat(&a, &b).is_some());
//! ```

#![no_std]

extern crate alloc;

mod bounds;
mod polygon;
pub mod rect;
mod sat;
mod shape;

pub use bounds::{Origin, RotationEvent, normalize_degrees, recompute_mbr};
pub use polygon::Polygon;
pub use sat::{SatHit, sat, sat_shapes};
pub use shape::HitShape;
