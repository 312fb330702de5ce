// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The spatial hash itself: bucket storage, entry bookkeeping, and search.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::span::{CellSpan, GridScalar};
use crate::types::Aabb2D;

/// Default cell size, in world units.
pub const DEFAULT_CELL_SIZE: f64 = 64.0;

/// Generational handle for an entry in a [`SpatialHash`].
///
/// Keys stay valid until the entry is removed. A removed slot may be reused
/// by a later insert, but its generation is bumped so old keys go stale
/// instead of aliasing the new entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryKey(u32, u32);

impl EntryKey {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Entry keys are 32-bit; more than u32::MAX live entries is unsupported."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<T, P> {
    generation: u32,
    aabb: Aabb2D<T>,
    // Cells this entry is currently listed in.
    span: CellSpan,
    payload: P,
}

#[derive(Default)]
struct Bucket {
    slots: SmallVec<[usize; 8]>,
}

/// Uniform grid mapping cell coordinates to the entries overlapping them.
///
/// Every entry is listed in each cell its box touches, so grid membership is
/// conservative: a candidate from a cell may not actually overlap the query.
/// [`search`][Self::search] with `exact = true` deduplicates and filters those
/// out; `exact = false` hands back the raw bucket contents for callers that
/// re-validate overlap themselves.
///
/// ```
/// use gridscape_index::{Aabb2D, SpatialHash};
///
/// let mut grid = SpatialHash::new(10.0);
/// let a = grid.insert(Aabb2D::from_xywh(0.0, 0.0, 10.0, 10.0), 'a');
/// assert_eq!(grid.search(Aabb2D::from_xywh(0.0, 0.0, 1.0, 1.0), true), ['a']);
///
/// grid.update(a, Aabb2D::from_xywh(100.0, 100.0, 10.0, 10.0));
/// assert!(grid.search(Aabb2D::from_xywh(0.0, 0.0, 1.0, 1.0), true).is_empty());
/// assert_eq!(grid.search(Aabb2D::from_xywh(100.0, 100.0, 1.0, 1.0), true), ['a']);
/// ```
pub struct SpatialHash<T: GridScalar, P> {
    cell_size: T,
    cells: HashMap<(i32, i32), Bucket>,
    entries: Vec<Option<Entry<T, P>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<T: GridScalar, P> Debug for SpatialHash<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialHash")
            .field("cell_size", &self.cell_size)
            .field("total_slots", &self.entries.len())
            .field("live_entries", &self.len())
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}

impl<T: GridScalar, P> SpatialHash<T, P> {
    /// Create an empty grid with the given cell size.
    pub fn new(cell_size: T) -> Self {
        debug_assert!(cell_size > T::zero(), "cell_size must be strictly positive");
        Self {
            cell_size,
            cells: HashMap::new(),
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// The fixed cell size of this grid.
    pub fn cell_size(&self) -> T {
        self.cell_size
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free_list.len()
    }

    /// Whether the grid has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}

impl<P> Default for SpatialHash<f64, P> {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl<T: GridScalar, P: Copy> SpatialHash<T, P> {
    /// Compute the cells `aabb` would occupy on this grid.
    pub fn span_of(&self, aabb: &Aabb2D<T>) -> CellSpan {
        CellSpan::of(aabb, self.cell_size)
    }

    /// Insert a box with a payload and list it in every covered cell.
    pub fn insert(&mut self, aabb: Aabb2D<T>, payload: P) -> EntryKey {
        let span = self.span_of(&aabb);
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].wrapping_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.entries.push(None);
            self.generations.push(1);
            (self.entries.len() - 1, 1)
        };
        self.entries[idx] = Some(Entry {
            generation,
            aabb,
            span,
            payload,
        });
        self.link(idx, span);
        EntryKey::new(idx, generation)
    }

    /// Move an entry to a new box.
    ///
    /// The stored box is always replaced. Buckets are only touched when the
    /// covered cell span changes; returns `true` in that case. Stale keys are
    /// ignored and return `false`.
    pub fn update(&mut self, key: EntryKey, aabb: Aabb2D<T>) -> bool {
        let cell_size = self.cell_size;
        let Some(entry) = self.entry_mut(key) else {
            return false;
        };
        entry.aabb = aabb;
        let span = CellSpan::of(&aabb, cell_size);
        if span == entry.span {
            return false;
        }
        let old = core::mem::replace(&mut entry.span, span);
        self.unlink(key.idx(), old);
        self.link(key.idx(), span);
        log::trace!("re-bucketed entry {key:?}: {old:?} -> {span:?}");
        true
    }

    /// Remove an entry from every bucket of its last known span.
    ///
    /// Returns the payload, or `None` for a stale key.
    pub fn remove(&mut self, key: EntryKey) -> Option<P> {
        self.entry_mut(key)?;
        let entry = self.entries[key.idx()].take()?;
        self.unlink(key.idx(), entry.span);
        self.free_list.push(key.idx());
        Some(entry.payload)
    }

    /// Drop every entry and bucket. Outstanding keys become stale.
    pub fn clear(&mut self) {
        self.cells.clear();
        for (idx, slot) in self.entries.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(idx);
            }
        }
    }

    /// Whether `key` refers to a live entry.
    pub fn contains(&self, key: EntryKey) -> bool {
        self.entry(key).is_some()
    }

    /// The box last stored for `key`.
    pub fn aabb(&self, key: EntryKey) -> Option<Aabb2D<T>> {
        self.entry(key).map(|e| e.aabb)
    }

    /// The cells `key` is currently listed in.
    pub fn span(&self, key: EntryKey) -> Option<CellSpan> {
        self.entry(key).map(|e| e.span)
    }

    /// The payload stored for `key`.
    pub fn payload(&self, key: EntryKey) -> Option<P> {
        self.entry(key).map(|e| e.payload)
    }

    /// Collect the payloads found under `rect`.
    ///
    /// With `exact`, each entry is reported once and only if its box overlaps
    /// `rect` (see [`Aabb2D::overlaps`]). Without it, every bucket listing in
    /// the query's cell span is reported, duplicates and near misses included.
    pub fn search(&self, rect: Aabb2D<T>, exact: bool) -> Vec<P> {
        let mut out = Vec::new();
        self.visit(rect, exact, |p| out.push(p));
        out
    }

    /// Visit the payloads found under `rect` without allocating a result.
    ///
    /// Same semantics as [`search`][Self::search]. Visit order follows the
    /// cell walk and is otherwise unspecified.
    pub fn visit<F: FnMut(P)>(&self, rect: Aabb2D<T>, exact: bool, mut f: F) {
        let span = self.span_of(&rect);
        let mut seen: HashSet<usize> = HashSet::new();
        for cell in span.cells() {
            let Some(bucket) = self.cells.get(&cell) else {
                continue;
            };
            for &slot in &bucket.slots {
                // A vacant slot here would be a bookkeeping bug; skip rather than panic.
                let Some(entry) = self.entries.get(slot).and_then(Option::as_ref) else {
                    continue;
                };
                if exact && (!seen.insert(slot) || !entry.aabb.overlaps(&rect)) {
                    continue;
                }
                f(entry.payload);
            }
        }
    }

    /// Collect the payloads whose box contains the point (edges inclusive).
    pub fn query_point(&self, x: T, y: T) -> Vec<P> {
        let cell = (
            T::cell_coord(x, self.cell_size),
            T::cell_coord(y, self.cell_size),
        );
        let Some(bucket) = self.cells.get(&cell) else {
            return Vec::new();
        };
        bucket
            .slots
            .iter()
            .filter_map(|&slot| self.entries.get(slot).and_then(Option::as_ref))
            .filter(|e| e.aabb.contains_point(x, y))
            .map(|e| e.payload)
            .collect()
    }

    fn entry(&self, key: EntryKey) -> Option<&Entry<T, P>> {
        let e = self.entries.get(key.idx())?.as_ref()?;
        (e.generation == key.1).then_some(e)
    }

    fn entry_mut(&mut self, key: EntryKey) -> Option<&mut Entry<T, P>> {
        let e = self.entries.get_mut(key.idx())?.as_mut()?;
        if e.generation != key.1 {
            return None;
        }
        Some(e)
    }

    fn link(&mut self, slot: usize, span: CellSpan) {
        for cell in span.cells() {
            self.cells.entry(cell).or_default().slots.push(slot);
        }
    }

    fn unlink(&mut self, slot: usize, span: CellSpan) {
        for cell in span.cells() {
            let Some(bucket) = self.cells.get_mut(&cell) else {
                continue;
            };
            if let Some(pos) = bucket.slots.iter().position(|&s| s == slot) {
                bucket.slots.swap_remove(pos);
            }
            if bucket.slots.is_empty() {
                // Dropping empty cells keeps the map compact for sparse grids.
                self.cells.remove(&cell);
            }
        }
    }
}
