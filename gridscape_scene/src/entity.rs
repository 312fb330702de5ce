// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entity handles and spawn descriptions.

use alloc::string::String;
use core::cmp::Ordering;

use gridscape_geometry::{HitShape, Origin};
use kurbo::{Rect, Vec2};
use smallvec::SmallVec;

/// Identifier for an entity in a [`World`](crate::World) (generational).
///
/// Slots are reused after [`World::despawn`](crate::World::despawn); the
/// generation makes old handles stale instead of aliasing the new entity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u32, pub(crate) u32);

impl EntityId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index, stable for the lifetime of the entity.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Generation of the slot when this handle was issued.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Per-entity drawing flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u8 {
        /// Entity is drawn.
        const VISIBLE = 0b0000_0001;
        /// Mirror horizontally when drawing.
        const FLIP_X  = 0b0000_0010;
        /// Mirror vertically when drawing.
        const FLIP_Y  = 0b0000_0100;
    }
}

impl Default for EntityFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Mirror axis for [`World::flip`](crate::World::flip).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    /// Mirror left to right.
    X,
    /// Mirror top to bottom.
    Y,
}

impl FlipAxis {
    pub(crate) fn flag(self) -> EntityFlags {
        match self {
            Self::X => EntityFlags::FLIP_X,
            Self::Y => EntityFlags::FLIP_Y,
        }
    }
}

/// Which back-end draws the entity.
///
/// The two back-ends are exclusive; an entity is redrawn by exactly one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderTarget {
    /// Immediate-mode surface, repainted through clipped dirty regions.
    #[default]
    Raster,
    /// Persistent node updated in place.
    Retained,
    /// Not drawn; still indexed and collidable.
    None,
}

/// Paint order key: depth first, then insertion order.
///
/// Entities with equal `z` paint in the order they were spawned.
#[derive(Clone, Copy, Debug)]
pub struct GlobalZ {
    /// Depth; higher paints later.
    pub z: f64,
    /// Spawn sequence number.
    pub seq: u64,
}

impl GlobalZ {
    /// Single-number rendering of the key, `z * 100000 + seq`.
    ///
    /// Only meaningful while `seq` stays below `100000`; ordering uses the
    /// struct fields directly.
    #[allow(clippy::cast_precision_loss, reason = "Display-only value.")]
    pub fn value(&self) -> f64 {
        self.z * 100_000.0 + self.seq as f64
    }
}

impl PartialEq for GlobalZ {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GlobalZ {}

impl PartialOrd for GlobalZ {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GlobalZ {
    fn cmp(&self, other: &Self) -> Ordering {
        self.z
            .total_cmp(&other.z)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Eight-way step used by [`World::move_dir`](crate::World::move_dir).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Up (negative y).
    North,
    /// Up and right.
    NorthEast,
    /// Right.
    East,
    /// Down and right.
    SouthEast,
    /// Down.
    South,
    /// Down and left.
    SouthWest,
    /// Left.
    West,
    /// Up and left.
    NorthWest,
}

impl Direction {
    /// Offset for a step of `by` units; diagonals move `by` on both axes.
    pub fn offset(self, by: f64) -> Vec2 {
        let (x, y) = match self {
            Self::North => (0.0, -1.0),
            Self::NorthEast => (1.0, -1.0),
            Self::East => (1.0, 0.0),
            Self::SouthEast => (1.0, 1.0),
            Self::South => (0.0, 1.0),
            Self::SouthWest => (-1.0, 1.0),
            Self::West => (-1.0, 0.0),
            Self::NorthWest => (-1.0, -1.0),
        };
        Vec2::new(x * by, y * by)
    }
}

/// Everything needed to spawn an entity.
///
/// ```
/// use gridscape_scene::{EntityDesc, RenderTarget};
/// use kurbo::Rect;
///
/// let desc = EntityDesc::new(Rect::new(0.0, 0.0, 16.0, 16.0))
///     .with_z(2.0)
///     .with_tag("player")
///     .with_target(RenderTarget::Retained);
/// assert_eq!(desc.tags.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct EntityDesc {
    /// Position and size.
    pub rect: Rect,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
    /// Rotation pivot relative to the top-left corner.
    pub origin: Origin,
    /// Depth.
    pub z: f64,
    /// Opacity in `0..=1`.
    pub alpha: f64,
    /// Drawing flags.
    pub flags: EntityFlags,
    /// Drawing back-end.
    pub target: RenderTarget,
    /// Precise shape, with coordinates relative to the rect's top-left.
    pub hit_shape: Option<HitShape>,
    /// Tags used by collision filters.
    pub tags: SmallVec<[String; 4]>,
}

impl EntityDesc {
    /// Describe an entity covering `rect` with default attributes.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            rotation: 0.0,
            origin: Origin::TopLeft,
            z: 0.0,
            alpha: 1.0,
            flags: EntityFlags::default(),
            target: RenderTarget::default(),
            hit_shape: None,
            tags: SmallVec::new(),
        }
    }

    /// Set the rotation in degrees.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Set the rotation pivot.
    pub fn with_origin(mut self, origin: impl Into<Origin>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the depth.
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }

    /// Set the opacity.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.flags.set(EntityFlags::VISIBLE, visible);
        self
    }

    /// Set the drawing back-end.
    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.target = target;
        self
    }

    /// Attach a precise hit shape, relative to the rect's top-left.
    pub fn with_hit_shape(mut self, shape: impl Into<HitShape>) -> Self {
        self.hit_shape = Some(shape.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_z_orders_by_depth_then_sequence() {
        let a = GlobalZ { z: 1.0, seq: 9 };
        let b = GlobalZ { z: 2.0, seq: 0 };
        let c = GlobalZ { z: 2.0, seq: 1 };
        assert!(a < b && b < c);
        assert_eq!(c.value(), 200_001.0);
    }

    #[test]
    fn direction_offsets() {
        assert_eq!(Direction::North.offset(3.0), Vec2::new(0.0, -3.0));
        assert_eq!(Direction::SouthWest.offset(2.0), Vec2::new(-2.0, 2.0));
    }

    #[test]
    fn desc_builder() {
        let d = EntityDesc::new(Rect::new(0.0, 0.0, 1.0, 1.0))
            .with_visible(false)
            .with_alpha(0.5)
            .with_tag("a")
            .with_tag("b");
        assert!(!d.flags.contains(EntityFlags::VISIBLE));
        assert_eq!(d.alpha, 0.5);
        assert_eq!(d.tags.as_slice(), ["a", "b"]);
    }
}
