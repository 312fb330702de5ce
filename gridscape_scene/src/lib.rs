// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gridscape Scene: the spatial and incremental-rendering core of a 2D scene.
//!
//! A [`World`] owns every entity, the [`SpatialHash`] they are indexed in, and
//! a [`DrawManager`] collecting the screen damage their changes cause. The
//! per-tick flow is:
//!
//! - Game logic mutates entities through [`World`] methods. Each call
//!   recomputes the entity's rotated bounds, moves its index entry, drags
//!   attached children along, and records damage.
//! - Collision queries ([`World::hit`], [`World::search`], [`World::is_at`])
//!   read the same index and always see the latest state.
//! - Once per frame [`World::flush`] hands a [`RenderBackend`] retained-node
//!   updates plus clear and clipped-redraw commands for the raster surface,
//!   ordered by [`GlobalZ`].
//!
//! Geometry lives in [`gridscape_geometry`]; the index in [`gridscape_index`].
//!
//! # Example
//!
//! ```rust
//! use gridscape_scene::{
//!     EntityDesc, FlushMode, RasterDraw, RenderBackend, RetainedUpdate, World,
//! };
//! use kurbo::Rect;
//!
//! #[derive(Default)]
//! struct Log(Vec<String>);
//!
//! impl RenderBackend for Log {
//!     fn clear_rect(&mut self, rect: Rect) {
//!         self.0.push(format!("clear {rect:?}"));
//!     }
//!     fn draw_raster(&mut self, draw: &RasterDraw) {
//!         self.0.push(format!("draw {:?}", draw.entity));
//!     }
//!     fn update_retained(&mut self, update: &RetainedUpdate) {
//!         self.0.push(format!("update {:?}", update.entity));
//!     }
//! }
//!
//! let mut world = World::default();
//! let ship = world.spawn(EntityDesc::new(Rect::new(0.0, 0.0, 16.0, 16.0)).with_tag("ship"));
//! let rock = world.spawn(EntityDesc::new(Rect::new(10.0, 10.0, 26.0, 26.0)).with_tag("rock"));
//!
//! let mut log = Log::default();
//! world.flush(&mut log);
//!
//! world.set_rotation(ship, 45.0);
//! assert_eq!(world.hit(ship, "rock")[0].other, rock);
//!
//! let report = world.flush(&mut log);
//! assert!(matches!(report.mode, FlushMode::Partial { regions: 1 }));
//! ```

#![no_std]

extern crate alloc;

mod collision;
mod config;
mod draw;
mod entity;
mod error;
mod util;
mod world;

pub use collision::{Contact, ContactKind, HitEvent, HitMonitor};
pub use config::{DEFAULT_FULL_REDRAW_RATIO, SceneConfig, Viewport};
pub use draw::{
    DrawInfo, DrawManager, DrawSource, FlushMode, FlushReport, RasterDraw, RenderBackend,
    RetainedUpdate,
};
pub use entity::{
    Direction, EntityDesc, EntityFlags, EntityId, FlipAxis, GlobalZ, RenderTarget,
};
pub use error::{SceneError, SceneResult};
pub use world::World;

pub use gridscape_geometry::{HitShape, Origin, Polygon, SatHit};
pub use gridscape_index::SpatialHash;
