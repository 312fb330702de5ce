// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-region draw scheduling.
//!
//! Mutations record the screen area they touched. Once per frame
//! [`DrawManager::flush`] turns those areas into the smallest set of clear and
//! clipped-redraw commands for the raster back-end, and pushes in-place
//! updates to retained nodes.
//!
//! All rectangles handed to a [`RenderBackend`] are in world space; the
//! back-end applies the viewport scroll.

use alloc::vec::Vec;

use gridscape_geometry::rect::{expand_to_pixels, is_degenerate, overlaps};
use gridscape_index::SpatialHash;
use hashbrown::HashSet;
use kurbo::{Affine, Rect, Vec2};

use crate::config::{SceneConfig, Viewport};
use crate::entity::{EntityFlags, EntityId, GlobalZ, RenderTarget};
use crate::util::rect_to_aabb;

/// Snapshot of what the draw manager needs to know about one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawInfo {
    /// Unrotated position and size.
    pub rect: Rect,
    /// Rotated bounds, present when rotation is non-zero.
    pub mbr: Option<Rect>,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Rotation pivot relative to `rect`'s top-left.
    pub origin: Vec2,
    /// Paint order.
    pub global_z: GlobalZ,
    /// Opacity.
    pub alpha: f64,
    /// Visibility and mirroring.
    pub flags: EntityFlags,
    /// Drawing back-end.
    pub target: RenderTarget,
}

impl DrawInfo {
    /// The area the entity covers on screen: its MBR, or its rect.
    pub fn area(&self) -> Rect {
        self.mbr.unwrap_or(self.rect)
    }

    /// Whether the entity should be drawn at all.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(EntityFlags::VISIBLE)
    }

    /// Map from entity-local space (top-left at the origin, unrotated) to
    /// world space, including mirroring and rotation about the pivot.
    pub fn transform(&self) -> Affine {
        let size = self.rect.size();
        let sx = if self.flags.contains(EntityFlags::FLIP_X) {
            -1.0
        } else {
            1.0
        };
        let sy = if self.flags.contains(EntityFlags::FLIP_Y) {
            -1.0
        } else {
            1.0
        };
        let half = Vec2::new(size.width / 2.0, size.height / 2.0);
        let flip = Affine::translate(half)
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate(-half);
        let place = Affine::translate(self.rect.origin().to_vec2()) * flip;
        if self.mbr.is_some() {
            let pivot = self.rect.origin() + self.origin;
            Affine::rotate_about(self.rotation.to_radians(), pivot) * place
        } else {
            place
        }
    }
}

/// Resolves entity ids to their current draw state.
pub trait DrawSource {
    /// Draw state for `id`, or `None` when the id is stale.
    fn draw_info(&self, id: EntityId) -> Option<DrawInfo>;
}

/// One clipped raster redraw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterDraw {
    /// Entity to draw.
    pub entity: EntityId,
    /// Unrotated world-space destination.
    pub dest: Rect,
    /// Part of the entity's area to repaint, relative to the area's top-left.
    pub source: Rect,
    /// World-space clip, or `None` to draw unclipped.
    pub clip: Option<Rect>,
    /// Entity-local to world transform.
    pub transform: Affine,
    /// Opacity.
    pub alpha: f64,
}

/// Style-like update for one retained node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetainedUpdate {
    /// Entity the node belongs to.
    pub entity: EntityId,
    /// Unrotated position and size.
    pub rect: Rect,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Rotation pivot relative to the top-left.
    pub origin: Vec2,
    /// Opacity.
    pub alpha: f64,
    /// Whether the node is shown.
    pub visible: bool,
    /// Mirroring flags.
    pub flags: EntityFlags,
}

/// Receiver of draw commands.
///
/// Implementations own the actual surfaces. Calls arrive in paint order.
pub trait RenderBackend {
    /// Clear a world-space rectangle of the raster surface.
    fn clear_rect(&mut self, rect: Rect);

    /// Redraw (part of) a raster entity.
    fn draw_raster(&mut self, draw: &RasterDraw);

    /// Bring a retained node up to date.
    fn update_retained(&mut self, update: &RetainedUpdate);

    /// Drop the retained node of a despawned entity.
    fn remove_retained(&mut self, entity: EntityId) {
        let _ = entity;
    }
}

/// How a flush repainted the raster surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushMode {
    /// Nothing was dirty.
    Idle,
    /// Too many dirty rectangles; the viewport was redrawn in one pass.
    Full {
        /// Dirty rectangles dropped without merging.
        discarded: usize,
    },
    /// Dirty rectangles were merged and repainted one by one.
    Partial {
        /// Regions left after merging.
        regions: usize,
    },
}

/// Summary of one [`DrawManager::flush`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushReport {
    /// Retained nodes updated or removed.
    pub retained: usize,
    /// Raster redraw commands issued.
    pub draws: usize,
    /// Raster strategy taken.
    pub mode: FlushMode,
}

/// Per-frame dirty-rectangle register and retained update queue.
#[derive(Clone, Debug)]
pub struct DrawManager {
    viewport: Viewport,
    full_redraw_ratio: f64,
    dirty: Vec<Rect>,
    retained: Vec<EntityId>,
    queued: HashSet<EntityId>,
    removed: Vec<EntityId>,
    raster_total: usize,
}

impl DrawManager {
    /// Create an empty manager.
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            viewport: config.viewport,
            full_redraw_ratio: config.full_redraw_ratio,
            dirty: Vec::new(),
            retained: Vec::new(),
            queued: HashSet::new(),
            removed: Vec::new(),
            raster_total: 0,
        }
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport used for off-screen discards and full redraws.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Dirty rectangles recorded since the last flush.
    pub fn dirty_rects(&self) -> &[Rect] {
        &self.dirty
    }

    /// Retained entities waiting for the next flush.
    pub fn pending_retained(&self) -> usize {
        self.retained.len() + self.removed.len()
    }

    /// Number of live raster entities.
    pub fn raster_total(&self) -> usize {
        self.raster_total
    }

    pub(crate) fn raster_added(&mut self) {
        self.raster_total += 1;
    }

    pub(crate) fn raster_removed(&mut self) {
        self.raster_total = self.raster_total.saturating_sub(1);
    }

    /// Record the area an entity covered before and after a change.
    ///
    /// Pass the same rectangle twice to mark just the current area. Returns
    /// whether anything was recorded.
    pub fn mark_changed(&mut self, before: Rect, after: Rect) -> bool {
        if before == after {
            self.mark_area(after)
        } else {
            self.mark_area(before.union(after))
        }
    }

    /// Record a dirty world-space rectangle.
    ///
    /// Empty and fully off-screen rectangles are dropped; the rest are grown
    /// to whole pixels. Returns whether the rectangle was recorded.
    pub fn mark_area(&mut self, rect: Rect) -> bool {
        if is_degenerate(rect) || !overlaps(rect, self.viewport.world_rect()) {
            return false;
        }
        self.dirty.push(expand_to_pixels(rect));
        true
    }

    /// Queue a retained entity for an update on the next flush.
    ///
    /// Queuing the same entity twice in a frame updates it once.
    pub fn queue_retained(&mut self, id: EntityId) {
        if self.queued.insert(id) {
            self.retained.push(id);
        }
    }

    pub(crate) fn queue_retained_removal(&mut self, id: EntityId) {
        if self.queued.remove(&id) {
            self.retained.retain(|&q| q != id);
        }
        self.removed.push(id);
    }

    /// Forget all pending work and the raster count.
    pub fn clear(&mut self) {
        self.dirty.clear();
        self.retained.clear();
        self.queued.clear();
        self.removed.clear();
        self.raster_total = 0;
    }

    /// Merge overlapping rectangles until no two overlap.
    ///
    /// Each merge replaces a pair with its pixel-aligned union, so the result
    /// covers every input pixel. Rectangles that only share an edge stay
    /// separate.
    ///
    /// ```
    /// use gridscape_scene::DrawManager;
    /// use kurbo::Rect;
    ///
    /// let merged = DrawManager::coalesce(vec![
    ///     Rect::new(0.0, 0.0, 10.0, 10.0),
    ///     Rect::new(50.0, 50.0, 60.0, 60.0),
    ///     Rect::new(5.0, 5.0, 55.0, 55.0),
    /// ]);
    /// assert_eq!(merged, [Rect::new(0.0, 0.0, 60.0, 60.0)]);
    /// ```
    pub fn coalesce(mut rects: Vec<Rect>) -> Vec<Rect> {
        let mut merged = true;
        while merged {
            merged = false;
            let mut i = 0;
            while i < rects.len() {
                let mut j = i + 1;
                while j < rects.len() {
                    if overlaps(rects[i], rects[j]) {
                        let other = rects.swap_remove(j);
                        rects[i] = expand_to_pixels(rects[i].union(other));
                        merged = true;
                    } else {
                        j += 1;
                    }
                }
                i += 1;
            }
        }
        rects
    }

    /// Push all pending work to `backend`.
    ///
    /// Retained updates go first. Then, unless nothing is dirty, the raster
    /// surface is repainted either in one full pass (when the dirty count
    /// exceeds the configured share of raster entities) or region by region
    /// after merging. Raster redraws are issued in global-Z order.
    pub fn flush<S, B>(
        &mut self,
        index: &SpatialHash<f64, EntityId>,
        source: &S,
        backend: &mut B,
    ) -> FlushReport
    where
        S: DrawSource + ?Sized,
        B: RenderBackend + ?Sized,
    {
        let retained = self.flush_retained(source, backend);

        if self.dirty.is_empty() {
            return FlushReport {
                retained,
                draws: 0,
                mode: FlushMode::Idle,
            };
        }

        let dirty = core::mem::take(&mut self.dirty);
        #[allow(clippy::cast_precision_loss, reason = "Entity counts fit in f64.")]
        let bail = dirty.len() as f64 > self.full_redraw_ratio * self.raster_total as f64;
        if bail {
            log::debug!(
                "full redraw: {} dirty rects for {} raster entities",
                dirty.len(),
                self.raster_total
            );
            let draws = self.redraw_all(self.viewport.world_rect(), None, index, source, backend);
            return FlushReport {
                retained,
                draws,
                mode: FlushMode::Full {
                    discarded: dirty.len(),
                },
            };
        }

        let regions = Self::coalesce(dirty);
        log::debug!("partial redraw: {} regions", regions.len());

        let mut jobs: Vec<(EntityId, DrawInfo, Rect)> = Vec::new();
        let mut seen: HashSet<EntityId> = HashSet::new();
        for &region in &regions {
            seen.clear();
            for id in index.search(rect_to_aabb(region), false) {
                if !seen.insert(id) {
                    continue;
                }
                let Some(info) = source.draw_info(id) else {
                    continue;
                };
                if info.is_visible() && info.target == RenderTarget::Raster {
                    jobs.push((id, info, region));
                }
            }
            backend.clear_rect(region);
        }

        jobs.sort_by_key(|(_, info, _)| info.global_z);
        let mut draws = 0;
        for (id, info, region) in jobs {
            let area = info.area();
            let clip = area.intersect(region);
            if is_degenerate(clip) {
                continue;
            }
            backend.draw_raster(&RasterDraw {
                entity: id,
                dest: info.rect,
                source: clip - area.origin().to_vec2(),
                clip: Some(clip),
                transform: info.transform(),
                alpha: info.alpha,
            });
            draws += 1;
        }

        FlushReport {
            retained,
            draws,
            mode: FlushMode::Partial {
                regions: regions.len(),
            },
        }
    }

    /// Clear `rect` and redraw every visible raster entity overlapping it,
    /// clipped to `rect`, in global-Z order. Returns the number of draws.
    ///
    /// Pending dirty rectangles are left alone.
    pub fn redraw_region<S, B>(
        &self,
        rect: Rect,
        index: &SpatialHash<f64, EntityId>,
        source: &S,
        backend: &mut B,
    ) -> usize
    where
        S: DrawSource + ?Sized,
        B: RenderBackend + ?Sized,
    {
        self.redraw_all(rect, Some(rect), index, source, backend)
    }

    fn redraw_all<S, B>(
        &self,
        rect: Rect,
        clip: Option<Rect>,
        index: &SpatialHash<f64, EntityId>,
        source: &S,
        backend: &mut B,
    ) -> usize
    where
        S: DrawSource + ?Sized,
        B: RenderBackend + ?Sized,
    {
        let mut found: Vec<(EntityId, DrawInfo)> = index
            .search(rect_to_aabb(rect), true)
            .into_iter()
            .filter_map(|id| Some((id, source.draw_info(id)?)))
            .filter(|(_, info)| info.is_visible() && info.target == RenderTarget::Raster)
            .collect();
        found.sort_by_key(|(_, info)| info.global_z);

        backend.clear_rect(rect);
        for (id, info) in &found {
            let area = info.area();
            backend.draw_raster(&RasterDraw {
                entity: *id,
                dest: info.rect,
                source: Rect::from_origin_size((0.0, 0.0), area.size()),
                clip,
                transform: info.transform(),
                alpha: info.alpha,
            });
        }
        found.len()
    }

    fn flush_retained<S, B>(&mut self, source: &S, backend: &mut B) -> usize
    where
        S: DrawSource + ?Sized,
        B: RenderBackend + ?Sized,
    {
        let mut count = 0;
        for id in self.removed.drain(..) {
            backend.remove_retained(id);
            count += 1;
        }
        self.queued.clear();
        for id in self.retained.drain(..) {
            let Some(info) = source.draw_info(id) else {
                continue;
            };
            if info.target != RenderTarget::Retained {
                continue;
            }
            backend.update_retained(&RetainedUpdate {
                entity: id,
                rect: info.rect,
                rotation: info.rotation,
                origin: info.origin,
                alpha: info.alpha,
                visible: info.is_visible(),
                flags: info.flags,
            });
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use gridscape_geometry::rect::within;
    use hashbrown::HashMap;

    use super::*;

    #[derive(Default)]
    struct Table {
        infos: HashMap<EntityId, DrawInfo>,
        index: SpatialHash<f64, EntityId>,
        seq: u64,
    }

    impl Table {
        fn add(&mut self, rect: Rect, z: f64, target: RenderTarget) -> EntityId {
            #[allow(clippy::cast_possible_truncation, reason = "Tiny test tables.")]
            let id = EntityId::new(self.seq as u32, 1);
            self.infos.insert(
                id,
                DrawInfo {
                    rect,
                    mbr: None,
                    rotation: 0.0,
                    origin: Vec2::ZERO,
                    global_z: GlobalZ { z, seq: self.seq },
                    alpha: 1.0,
                    flags: EntityFlags::VISIBLE,
                    target,
                },
            );
            self.index.insert(rect_to_aabb(rect), id);
            self.seq += 1;
            id
        }
    }

    impl DrawSource for Table {
        fn draw_info(&self, id: EntityId) -> Option<DrawInfo> {
            self.infos.get(&id).copied()
        }
    }

    #[derive(Debug, Default)]
    struct Recorder {
        cleared: Vec<Rect>,
        draws: Vec<RasterDraw>,
        retained: Vec<RetainedUpdate>,
        removed: Vec<EntityId>,
    }

    impl RenderBackend for Recorder {
        fn clear_rect(&mut self, rect: Rect) {
            self.cleared.push(rect);
        }
        fn draw_raster(&mut self, draw: &RasterDraw) {
            self.draws.push(*draw);
        }
        fn update_retained(&mut self, update: &RetainedUpdate) {
            self.retained.push(*update);
        }
        fn remove_retained(&mut self, entity: EntityId) {
            self.removed.push(entity);
        }
    }

    fn manager() -> DrawManager {
        DrawManager::new(&SceneConfig::default())
    }

    #[test]
    fn discards_offscreen_and_empty() {
        let mut dm = manager();
        assert!(!dm.mark_area(Rect::new(900.0, 0.0, 950.0, 10.0)));
        assert!(!dm.mark_area(Rect::new(-10.0, 0.0, 0.0, 10.0)));
        assert!(!dm.mark_area(Rect::new(10.0, 10.0, 10.0, 20.0)));
        assert!(dm.mark_area(Rect::new(0.5, 0.5, 10.2, 10.0)));
        assert_eq!(dm.dirty_rects(), [Rect::new(0.0, 0.0, 11.0, 10.0)]);
    }

    #[test]
    fn scrolled_viewport_discards_by_world_position() {
        let mut dm = manager();
        dm.set_viewport(Viewport::new(100.0, 100.0).with_offset(-500.0, 0.0));
        assert!(!dm.mark_area(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(dm.mark_area(Rect::new(550.0, 0.0, 560.0, 10.0)));
    }

    #[test]
    fn mark_changed_unions_before_and_after() {
        let mut dm = manager();
        dm.mark_changed(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(20.0, 5.0, 30.0, 15.0));
        assert_eq!(dm.dirty_rects(), [Rect::new(0.0, 0.0, 30.0, 15.0)]);
    }

    #[test]
    fn coalesce_reaches_fixed_point() {
        let input = vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(10.0, 0.0, 20.0, 10.0),
            Rect::new(30.0, 30.0, 40.0, 40.0),
            Rect::new(15.0, 5.0, 35.0, 35.0),
            Rect::new(100.0, 100.0, 110.0, 110.0),
        ];
        let once = DrawManager::coalesce(input.clone());
        let twice = DrawManager::coalesce(once.clone());
        assert_eq!(once, twice);
        for (i, a) in once.iter().enumerate() {
            for b in &once[i + 1..] {
                assert!(!overlaps(*a, *b), "{a:?} overlaps {b:?}");
            }
        }
        for r in &input {
            assert!(
                once.iter().any(|m| within(*r, *m)),
                "{r:?} lost after merging"
            );
        }
        // The touching pair stays apart from each other but one of them
        // joins the diagonal chain.
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn bails_out_above_ratio_without_merging() {
        let mut table = Table::default();
        for i in 0..90 {
            let x = f64::from(i % 10) * 20.0;
            let y = f64::from(i / 10) * 20.0;
            table.add(Rect::new(x, y, x + 10.0, y + 10.0), 0.0, RenderTarget::Raster);
        }
        let mut dm = manager();
        for _ in 0..90 {
            dm.raster_added();
        }
        for i in 0..60 {
            let x = f64::from(i % 10) * 20.0;
            let y = f64::from(i / 10) * 20.0;
            dm.mark_area(Rect::new(x, y, x + 10.0, y + 10.0));
        }
        let mut rec = Recorder::default();
        let report = dm.flush(&table.index, &table, &mut rec);
        assert_eq!(report.mode, FlushMode::Full { discarded: 60 });
        assert_eq!(report.draws, 90);
        assert_eq!(rec.cleared, [Viewport::default().world_rect()]);
        assert!(rec.draws.iter().all(|d| d.clip.is_none()));
        assert!(dm.dirty_rects().is_empty());
    }

    #[test]
    fn partial_redraw_clips_and_orders_by_global_z() {
        let mut table = Table::default();
        let top = table.add(Rect::new(0.0, 0.0, 20.0, 20.0), 5.0, RenderTarget::Raster);
        let bottom = table.add(Rect::new(10.0, 10.0, 30.0, 30.0), 1.0, RenderTarget::Raster);
        let _far = table.add(Rect::new(300.0, 300.0, 310.0, 310.0), 0.0, RenderTarget::Raster);
        let _dom = table.add(Rect::new(0.0, 0.0, 5.0, 5.0), 9.0, RenderTarget::Retained);

        let mut dm = manager();
        for _ in 0..3 {
            dm.raster_added();
        }
        dm.mark_area(Rect::new(12.0, 12.0, 18.0, 18.0));

        let mut rec = Recorder::default();
        let report = dm.flush(&table.index, &table, &mut rec);
        assert_eq!(report.mode, FlushMode::Partial { regions: 1 });
        assert_eq!(rec.cleared, [Rect::new(12.0, 12.0, 18.0, 18.0)]);
        let order: Vec<_> = rec.draws.iter().map(|d| d.entity).collect();
        assert_eq!(order, [bottom, top]);
        let first = &rec.draws[0];
        assert_eq!(first.clip, Some(Rect::new(12.0, 12.0, 18.0, 18.0)));
        assert_eq!(first.source, Rect::new(2.0, 2.0, 8.0, 8.0));
        assert_eq!(first.transform, Affine::translate((10.0, 10.0)));

        let again = dm.flush(&table.index, &table, &mut rec);
        assert_eq!(again.mode, FlushMode::Idle);
    }

    #[test]
    fn retained_updates_are_deduplicated() {
        let mut table = Table::default();
        let node = table.add(Rect::new(0.0, 0.0, 5.0, 5.0), 0.0, RenderTarget::Retained);
        let gone = EntityId::new(77, 1);
        let mut dm = manager();
        dm.queue_retained(node);
        dm.queue_retained(node);
        dm.queue_retained(gone);
        dm.queue_retained_removal(gone);

        let mut rec = Recorder::default();
        let report = dm.flush(&table.index, &table, &mut rec);
        assert_eq!(report.retained, 2);
        assert_eq!(rec.retained.len(), 1);
        assert_eq!(rec.retained[0].entity, node);
        assert_eq!(rec.removed, [gone]);
        assert_eq!(report.mode, FlushMode::Idle);
        assert_eq!(dm.pending_retained(), 0);
    }

    #[test]
    fn rotated_transform_turns_about_pivot() {
        let info = DrawInfo {
            rect: Rect::new(10.0, 10.0, 30.0, 20.0),
            mbr: Some(Rect::new(15.0, 5.0, 25.0, 25.0)),
            rotation: 90.0,
            origin: Vec2::new(10.0, 5.0),
            global_z: GlobalZ { z: 0.0, seq: 0 },
            alpha: 1.0,
            flags: EntityFlags::VISIBLE,
            target: RenderTarget::Raster,
        };
        // Local top-left lands where the rotated corner is.
        let p = info.transform() * kurbo::Point::ZERO;
        assert!((p - kurbo::Point::new(25.0, 5.0)).hypot() < 1e-9);
        assert_eq!(info.area(), Rect::new(15.0, 5.0, 25.0, 25.0));
    }
}
