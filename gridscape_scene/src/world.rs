// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene context: entity table, spatial index, and draw manager.

use alloc::string::String;
use alloc::vec::Vec;

use gridscape_geometry::{
    HitShape, Origin, Polygon, RotationEvent, normalize_degrees, recompute_mbr,
};
use gridscape_geometry::rect;
use gridscape_index::{EntryKey, SpatialHash};
use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;

use crate::config::{SceneConfig, Viewport, validate_viewport};
use crate::draw::{DrawInfo, DrawManager, DrawSource, FlushReport, RenderBackend};
use crate::entity::{
    Direction, EntityDesc, EntityFlags, EntityId, FlipAxis, GlobalZ, RenderTarget,
};
use crate::error::{SceneError, SceneResult};
use crate::util::rect_to_aabb;

/// Per-entity record.
#[derive(Clone, Debug)]
pub(crate) struct EntityData {
    generation: u32,
    seq: u64,
    pub(crate) rect: Rect,
    pub(crate) rotation: f64,
    pub(crate) origin: Origin,
    pub(crate) mbr: Option<Rect>,
    pub(crate) z: f64,
    pub(crate) alpha: f64,
    pub(crate) flags: EntityFlags,
    pub(crate) target: RenderTarget,
    pub(crate) hit_shape: Option<HitShape>,
    /// The hit shape relative to the rect's top-left, unrotated.
    local_shape: Option<HitShape>,
    pub(crate) tags: SmallVec<[String; 4]>,
    children: SmallVec<[EntityId; 4]>,
    parent: Option<EntityId>,
    entry: EntryKey,
}

impl EntityData {
    /// MBR when rotated, otherwise the rect.
    pub(crate) fn area(&self) -> Rect {
        self.mbr.unwrap_or(self.rect)
    }

    fn origin_offset(&self) -> Vec2 {
        self.origin.resolve(self.rect.size())
    }

    fn pivot(&self) -> Point {
        self.rect.origin() + self.origin_offset()
    }

    fn global_z(&self) -> GlobalZ {
        GlobalZ {
            z: self.z,
            seq: self.seq,
        }
    }

    /// Point test against the hit shape, otherwise against the rect as
    /// drawn (turned about the pivot when rotated). Never reaches outside
    /// [`area`](Self::area).
    pub(crate) fn covers(&self, pt: Point) -> bool {
        match &self.hit_shape {
            Some(shape) => shape.contains_point(pt),
            None if self.mbr.is_some() => {
                let mut turned = Polygon::from_rect(self.rect);
                turned.rotate(&RotationEvent::new(0.0, self.rotation, self.pivot()));
                turned.contains_point(pt)
            }
            None => rect::contains_point(self.rect, pt),
        }
    }

    pub(crate) fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Slot storage with generational handles.
#[derive(Clone, Debug, Default)]
pub(crate) struct EntityTable {
    slots: Vec<Option<EntityData>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    next_seq: u64,
}

impl EntityTable {
    pub(crate) fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.slots
            .get(id.idx())
            .and_then(Option::as_ref)
            .filter(|e| e.generation == id.1)
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityData> {
        self.slots
            .get_mut(id.idx())
            .and_then(Option::as_mut)
            .filter(|e| e.generation == id.1)
    }

    fn reserve(&mut self) -> (EntityId, u64) {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].wrapping_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.slots.push(None);
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "EntityId stores 32-bit slot indices."
        )]
        (EntityId::new(idx as u32, generation), seq)
    }

    fn release(&mut self, id: EntityId) -> Option<EntityData> {
        self.get(id)?;
        let data = self.slots[id.idx()].take()?;
        self.free_list.push(id.idx());
        Some(data)
    }

    fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "EntityId stores 32-bit slot indices."
            )]
            slot.as_ref().map(|e| EntityId::new(i as u32, e.generation))
        })
    }

    fn clear(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(idx);
            }
        }
    }
}

impl DrawSource for EntityTable {
    fn draw_info(&self, id: EntityId) -> Option<DrawInfo> {
        self.get(id).map(|e| DrawInfo {
            rect: e.rect,
            mbr: e.mbr,
            rotation: e.rotation,
            origin: e.origin_offset(),
            global_z: e.global_z(),
            alpha: e.alpha,
            flags: e.flags,
            target: e.target,
        })
    }
}

/// Explicit scene context.
///
/// Owns every entity, the spatial hash they are indexed in, and the draw
/// manager that collects their damage. Each mutator applies its change
/// completely before returning: bounds and MBR are recomputed, the index
/// entry is moved, attached children follow, and damage is recorded.
///
/// Mutators and accessors ignore stale ids.
///
/// ## Example
///
/// ```rust
/// use gridscape_scene::{EntityDesc, World};
/// use kurbo::Rect;
///
/// let mut world = World::default();
/// let a = world.spawn(EntityDesc::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
/// world.set_position(a, (100.0, 100.0));
///
/// assert!(world.search(Rect::new(0.0, 0.0, 1.0, 1.0), true).is_empty());
/// assert_eq!(world.search(Rect::new(100.0, 100.0, 101.0, 101.0), true), [a]);
/// ```
pub struct World {
    pub(crate) config: SceneConfig,
    pub(crate) table: EntityTable,
    pub(crate) index: SpatialHash<f64, EntityId>,
    pub(crate) draw: DrawManager,
}

impl core::fmt::Debug for World {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("entities", &self.table.len())
            .field("index", &self.index)
            .field("draw", &self.draw)
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::from_valid(SceneConfig::default())
    }
}

impl World {
    /// Create an empty world after validating `config`.
    pub fn new(config: SceneConfig) -> SceneResult<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: SceneConfig) -> Self {
        Self {
            config,
            table: EntityTable::default(),
            index: SpatialHash::new(config.cell_size),
            draw: DrawManager::new(&config),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Scroll or resize the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) -> SceneResult<()> {
        validate_viewport(&viewport)?;
        self.config.viewport = viewport;
        self.draw.set_viewport(viewport);
        Ok(())
    }

    /// The spatial index, for read-only queries.
    pub fn index(&self) -> &SpatialHash<f64, EntityId> {
        &self.index
    }

    /// The draw manager, for inspecting pending damage.
    pub fn draw_manager(&self) -> &DrawManager {
        &self.draw
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the world has no entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` refers to a live entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.table.get(id).is_some()
    }

    /// Iterate live entity ids in slot order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.table.ids()
    }

    /// Create an entity, index it, and record its first damage.
    ///
    /// The description's hit shape is relative to the rect's top-left and is
    /// moved into world space here.
    pub fn spawn(&mut self, desc: EntityDesc) -> EntityId {
        let (id, seq) = self.table.reserve();
        let origin_offset = desc.origin.resolve(desc.rect.size());
        let mbr = recompute_mbr(desc.rect, desc.rotation, origin_offset);
        let entry = self.index.insert(rect_to_aabb(mbr.unwrap_or(desc.rect)), id);
        let mut data = EntityData {
            generation: id.1,
            seq,
            rect: desc.rect,
            rotation: desc.rotation,
            origin: desc.origin,
            mbr,
            z: desc.z,
            alpha: desc.alpha,
            flags: desc.flags,
            target: desc.target,
            hit_shape: None,
            local_shape: desc.hit_shape,
            tags: desc.tags,
            children: SmallVec::new(),
            parent: None,
            entry,
        };
        let placed = data.local_shape.clone().map(|shape| place_shape(&data, shape));
        data.hit_shape = placed;
        let area = data.area();
        let target = data.target;
        self.table.slots[id.idx()] = Some(data);

        if target == RenderTarget::Raster {
            self.draw.raster_added();
        }
        self.record_damage(id, target, area, area);
        log::trace!("spawned {id:?} at {area:?}");
        id
    }

    /// Remove an entity.
    ///
    /// It is unlinked from its parent, its children are released, its index
    /// entry is dropped, and its last area is marked dirty (or its retained
    /// node is scheduled for removal). Returns `false` for stale ids.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(data) = self.table.release(id) else {
            return false;
        };
        if let Some(parent) = data.parent
            && let Some(p) = self.table.get_mut(parent)
        {
            p.children.retain(|c| *c != id);
        }
        for child in &data.children {
            if let Some(c) = self.table.get_mut(*child) {
                c.parent = None;
            }
        }
        self.index.remove(data.entry);
        match data.target {
            RenderTarget::Raster => {
                self.draw.raster_removed();
                self.draw.mark_area(data.area());
            }
            RenderTarget::Retained => self.draw.queue_retained_removal(id),
            RenderTarget::None => {}
        }
        log::trace!("despawned {id:?}");
        true
    }

    /// Scene teardown: drop every entity, index entry, and pending draw.
    ///
    /// All outstanding ids become stale.
    pub fn clear(&mut self) {
        log::debug!("clearing world with {} entities", self.table.len());
        self.table.clear();
        self.index.clear();
        self.draw.clear();
    }

    /// Push pending damage and retained updates to `backend`.
    pub fn flush<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> FlushReport {
        self.draw.flush(&self.index, &self.table, backend)
    }

    /// Clear and redraw a region immediately, outside the dirty-rect cycle.
    pub fn redraw_region<B: RenderBackend + ?Sized>(&self, rect: Rect, backend: &mut B) -> usize {
        self.draw.redraw_region(rect, &self.index, &self.table, backend)
    }

    // --- Geometry mutators ---

    /// Move the top-left corner to `pos`.
    pub fn set_position(&mut self, id: EntityId, pos: impl Into<Point>) {
        if let Some(e) = self.table.get(id) {
            let rect = Rect::from_origin_size(pos.into(), e.rect.size());
            self.set_rect(id, rect);
        }
    }

    /// Resize, keeping the top-left corner.
    pub fn set_size(&mut self, id: EntityId, size: impl Into<Size>) {
        if let Some(e) = self.table.get(id) {
            let rect = Rect::from_origin_size(e.rect.origin(), size.into());
            self.set_rect(id, rect);
        }
    }

    /// Replace position and size.
    pub fn set_rect(&mut self, id: EntityId, rect: Rect) {
        if let Some(e) = self.table.get(id) {
            let (rotation, origin) = (e.rotation, e.origin);
            self.update_geometry(id, rect, rotation, origin);
        }
    }

    /// Add to position and size.
    pub fn shift(&mut self, id: EntityId, dx: f64, dy: f64, dw: f64, dh: f64) {
        if let Some(e) = self.table.get(id) {
            let r = e.rect;
            let rect = Rect::new(r.x0 + dx, r.y0 + dy, r.x1 + dx + dw, r.y1 + dy + dh);
            self.set_rect(id, rect);
        }
    }

    /// Step `by` units in a compass direction.
    pub fn move_dir(&mut self, id: EntityId, dir: Direction, by: f64) {
        let d = dir.offset(by);
        self.shift(id, d.x, d.y, 0.0, 0.0);
    }

    /// Set the rotation in degrees, clockwise, about the entity's origin.
    ///
    /// Attached children and the hit shape turn by the same delta about the
    /// same pivot.
    pub fn set_rotation(&mut self, id: EntityId, degrees: f64) {
        if let Some(e) = self.table.get(id) {
            let (rect, origin) = (e.rect, e.origin);
            self.update_geometry(id, rect, degrees, origin);
        }
    }

    /// Set the rotation pivot.
    pub fn set_origin(&mut self, id: EntityId, origin: impl Into<Origin>) {
        if let Some(e) = self.table.get(id) {
            let (rect, rotation) = (e.rect, e.rotation);
            self.update_geometry(id, rect, rotation, origin.into());
        }
    }

    // --- Appearance mutators ---

    /// Set the depth. Equal depths keep spawn order.
    pub fn set_z(&mut self, id: EntityId, z: f64) {
        self.update_appearance(id, |e| e.z = z);
    }

    /// Set the opacity.
    pub fn set_alpha(&mut self, id: EntityId, alpha: f64) {
        self.update_appearance(id, |e| e.alpha = alpha);
    }

    /// Show or hide the entity.
    pub fn set_visible(&mut self, id: EntityId, visible: bool) {
        self.update_appearance(id, |e| e.flags.set(EntityFlags::VISIBLE, visible));
    }

    /// Mirror the entity along `axis`.
    pub fn flip(&mut self, id: EntityId, axis: FlipAxis) {
        self.update_appearance(id, |e| e.flags.insert(axis.flag()));
    }

    /// Undo [`flip`](Self::flip) along `axis`.
    pub fn unflip(&mut self, id: EntityId, axis: FlipAxis) {
        self.update_appearance(id, |e| e.flags.remove(axis.flag()));
    }

    // --- Collision attributes ---

    /// Replace the hit shape. Coordinates are relative to the rect's top-left
    /// and the current rotation is applied.
    pub fn set_hit_shape(&mut self, id: EntityId, shape: Option<HitShape>) {
        if let Some(e) = self.table.get_mut(id) {
            let placed = shape.clone().map(|s| place_shape(e, s));
            e.hit_shape = placed;
            e.local_shape = shape;
        }
    }

    /// Add a tag. Returns `false` if it was already present or `id` is stale.
    pub fn add_tag(&mut self, id: EntityId, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        match self.table.get_mut(id) {
            Some(e) if !e.has_tag(&tag) => {
                e.tags.push(tag);
                true
            }
            _ => false,
        }
    }

    /// Remove a tag. Returns whether it was present.
    pub fn remove_tag(&mut self, id: EntityId, tag: &str) -> bool {
        let Some(e) = self.table.get_mut(id) else {
            return false;
        };
        let before = e.tags.len();
        e.tags.retain(|t| t != tag);
        e.tags.len() != before
    }

    // --- Attachment ---

    /// Make `child` follow `parent`'s moves, resizes, and rotations.
    ///
    /// A child has at most one parent; attaching it elsewhere moves it.
    pub fn attach(&mut self, parent: EntityId, child: EntityId) -> SceneResult<()> {
        for id in [parent, child] {
            if !self.is_alive(id) {
                log::warn!("attach with stale entity {id:?}");
                return Err(SceneError::StaleEntity(id));
            }
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                log::warn!("refusing to attach {child:?} under its descendant {parent:?}");
                return Err(SceneError::AttachCycle { parent, child });
            }
            cursor = self.table.get(current).and_then(|e| e.parent);
        }
        if let Some(old) = self.table.get(child).and_then(|e| e.parent) {
            self.detach(old, child);
        }
        if let Some(p) = self.table.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.table.get_mut(child) {
            c.parent = Some(parent);
        }
        Ok(())
    }

    /// Stop `child` from following `parent`. Returns whether it was attached.
    pub fn detach(&mut self, parent: EntityId, child: EntityId) -> bool {
        let Some(p) = self.table.get_mut(parent) else {
            return false;
        };
        let before = p.children.len();
        p.children.retain(|c| *c != child);
        if p.children.len() == before {
            return false;
        }
        if let Some(c) = self.table.get_mut(child) {
            c.parent = None;
        }
        true
    }

    /// Detach every child of `parent`.
    pub fn detach_all(&mut self, parent: EntityId) {
        let Some(p) = self.table.get_mut(parent) else {
            return;
        };
        for child in core::mem::take(&mut p.children) {
            if let Some(c) = self.table.get_mut(child) {
                c.parent = None;
            }
        }
    }

    // --- Accessors ---

    /// Unrotated position and size.
    pub fn rect(&self, id: EntityId) -> Option<Rect> {
        self.table.get(id).map(|e| e.rect)
    }

    /// The indexed area: MBR when rotated, otherwise the rect.
    pub fn area(&self, id: EntityId) -> Option<Rect> {
        self.table.get(id).map(EntityData::area)
    }

    /// Minimum bounding rectangle, present only while rotated.
    pub fn mbr(&self, id: EntityId) -> Option<Rect> {
        self.table.get(id).and_then(|e| e.mbr)
    }

    /// Rotation in degrees as last set (not normalized).
    pub fn rotation(&self, id: EntityId) -> Option<f64> {
        self.table.get(id).map(|e| e.rotation)
    }

    /// Rotation pivot.
    pub fn origin(&self, id: EntityId) -> Option<Origin> {
        self.table.get(id).map(|e| e.origin)
    }

    /// Depth.
    pub fn z(&self, id: EntityId) -> Option<f64> {
        self.table.get(id).map(|e| e.z)
    }

    /// Paint-order key.
    pub fn global_z(&self, id: EntityId) -> Option<GlobalZ> {
        self.table.get(id).map(EntityData::global_z)
    }

    /// Opacity.
    pub fn alpha(&self, id: EntityId) -> Option<f64> {
        self.table.get(id).map(|e| e.alpha)
    }

    /// Whether the entity is drawn. `false` for stale ids.
    pub fn is_visible(&self, id: EntityId) -> bool {
        self.table
            .get(id)
            .is_some_and(|e| e.flags.contains(EntityFlags::VISIBLE))
    }

    /// Drawing flags.
    pub fn flags(&self, id: EntityId) -> Option<EntityFlags> {
        self.table.get(id).map(|e| e.flags)
    }

    /// Drawing back-end.
    pub fn target(&self, id: EntityId) -> Option<RenderTarget> {
        self.table.get(id).map(|e| e.target)
    }

    /// World-space hit shape.
    pub fn hit_shape(&self, id: EntityId) -> Option<&HitShape> {
        self.table.get(id).and_then(|e| e.hit_shape.as_ref())
    }

    /// Entities attached to `id`.
    pub fn children_of(&self, id: EntityId) -> &[EntityId] {
        self.table
            .get(id)
            .map(|e| e.children.as_slice())
            .unwrap_or_default()
    }

    /// The entity `id` is attached to.
    pub fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        self.table.get(id).and_then(|e| e.parent)
    }

    /// Tags of `id`.
    pub fn tags(&self, id: EntityId) -> &[String] {
        self.table
            .get(id)
            .map(|e| e.tags.as_slice())
            .unwrap_or_default()
    }

    /// Whether `id` carries `tag`.
    pub fn has_tag(&self, id: EntityId, tag: &str) -> bool {
        self.table.get(id).is_some_and(|e| e.has_tag(tag))
    }

    /// Whether the entity's area overlaps `rect` (shared edges excluded).
    pub fn intersects(&self, id: EntityId, rect: Rect) -> bool {
        self.area(id).is_some_and(|a| rect::overlaps(a, rect))
    }

    /// Whether the entity's area lies within `rect`.
    pub fn within(&self, id: EntityId, rect: Rect) -> bool {
        self.area(id).is_some_and(|a| rect::within(a, rect))
    }

    /// Whether `rect` lies within the entity's area.
    pub fn contains_rect(&self, id: EntityId, rect: Rect) -> bool {
        self.area(id).is_some_and(|a| rect::within(rect, a))
    }

    // --- Internals ---

    /// Apply new geometry to one entity and cascade to its children.
    fn update_geometry(&mut self, id: EntityId, rect: Rect, rotation: f64, origin: Origin) {
        let Some(e) = self.table.get_mut(id) else {
            return;
        };
        let old_rect = e.rect;
        let old_area = e.area();
        let old_rotation = e.rotation;
        let old_offset = e.origin_offset();

        e.rect = rect;
        e.rotation = rotation;
        e.origin = origin;
        e.mbr = recompute_mbr(rect, rotation, e.origin_offset());

        let moved = rect.origin() - old_rect.origin();
        let rotated = (rotation != old_rotation)
            .then(|| RotationEvent::new(old_rotation, rotation, e.pivot()));
        if e.origin_offset() != old_offset {
            // The pivot moved relative to the rect, so the old placement
            // cannot be carried over.
            let placed = e.local_shape.clone().map(|shape| place_shape(e, shape));
            e.hit_shape = placed;
        } else if let Some(shape) = &mut e.hit_shape {
            shape.translate(moved);
            if let Some(event) = &rotated {
                shape.rotate(event);
            }
        }

        let new_area = e.area();
        let (entry, target) = (e.entry, e.target);
        let children = e.children.clone();
        self.index.update(entry, rect_to_aabb(new_area));
        self.record_damage(id, target, old_area, new_area);

        if children.is_empty() {
            return;
        }
        let grow = Vec2::new(
            rect.width() - old_rect.width(),
            rect.height() - old_rect.height(),
        );
        for child in children {
            let Some(c) = self.table.get(child) else {
                continue;
            };
            let (c_rect, c_rotation, c_origin) = (c.rect, c.rotation, c.origin);
            if moved != Vec2::ZERO || grow != Vec2::ZERO {
                let r = Rect::new(
                    c_rect.x0 + moved.x,
                    c_rect.y0 + moved.y,
                    c_rect.x1 + moved.x + grow.x,
                    c_rect.y1 + moved.y + grow.y,
                );
                self.update_geometry(child, r, c_rotation, c_origin);
            }
            if let Some(event) = &rotated
                && let Some(c) = self.table.get(child)
            {
                let pivot_offset = event.pivot - c.rect.origin();
                let turned = c.rotation + event.delta_deg;
                self.update_geometry(child, c.rect, turned, Origin::Offset(pivot_offset));
            }
        }
    }

    /// Apply a non-geometric change and record it as damage over the
    /// current area.
    fn update_appearance(&mut self, id: EntityId, f: impl FnOnce(&mut EntityData)) {
        let Some(e) = self.table.get_mut(id) else {
            return;
        };
        f(e);
        let (area, target) = (e.area(), e.target);
        self.record_damage(id, target, area, area);
    }

    fn record_damage(&mut self, id: EntityId, target: RenderTarget, before: Rect, after: Rect) {
        match target {
            RenderTarget::Raster => {
                self.draw.mark_changed(before, after);
            }
            RenderTarget::Retained => self.draw.queue_retained(id),
            RenderTarget::None => {}
        }
    }
}

/// Move an entity-relative shape into world space, applying the current
/// rotation.
fn place_shape(e: &EntityData, mut shape: HitShape) -> HitShape {
    shape.translate(e.rect.origin().to_vec2());
    if normalize_degrees(e.rotation) != 0.0 {
        shape.rotate(&RotationEvent::new(0.0, e.rotation, e.pivot()));
    }
    shape
}
