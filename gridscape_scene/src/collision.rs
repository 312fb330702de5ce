// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision and picking queries over a [`World`].

use alloc::string::String;
use alloc::vec::Vec;

use gridscape_geometry::rect::overlaps;
use gridscape_geometry::{SatHit, sat_shapes};
use hashbrown::HashSet;
use kurbo::{Point, Rect, Vec2};

use crate::entity::EntityId;
use crate::util::rect_to_aabb;
use crate::world::World;

/// How a contact was confirmed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContactKind {
    /// Bounding rectangles overlap; at least one side has no hit shape.
    Rect,
    /// Both hit shapes overlap according to SAT.
    Sat(SatHit),
}

/// One entity touching the queried entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// The other entity.
    pub other: EntityId,
    /// How the contact was confirmed.
    pub kind: ContactKind,
}

impl Contact {
    /// Penetration depth, for SAT contacts.
    pub fn overlap(&self) -> Option<f64> {
        match self.kind {
            ContactKind::Sat(hit) => Some(hit.overlap),
            ContactKind::Rect => None,
        }
    }

    /// Separation axis pointing from the queried entity to the other one, for
    /// SAT contacts.
    pub fn normal(&self) -> Option<Vec2> {
        match self.kind {
            ContactKind::Sat(hit) => Some(hit.normal),
            ContactKind::Rect => None,
        }
    }
}

impl World {
    /// Entities whose indexed area lies under `rect`.
    ///
    /// With `exact`, each entity appears once and only if its area overlaps
    /// `rect`. Without it, the raw cell contents are returned, which may
    /// repeat entities and include near misses.
    pub fn search(&self, rect: Rect, exact: bool) -> Vec<EntityId> {
        self.index.search(rect_to_aabb(rect), exact)
    }

    /// Entities tagged `tag` that collide with `id`.
    ///
    /// Candidates come from the spatial hash and must overlap `id`'s area.
    /// When both sides carry a hit shape the pair is confirmed by SAT and
    /// dropped if SAT finds a separating axis; otherwise the rectangle overlap
    /// stands. Order is unspecified. Stale ids yield no contacts.
    pub fn hit(&self, id: EntityId, tag: &str) -> Vec<Contact> {
        let Some(me) = self.table.get(id) else {
            return Vec::new();
        };
        let area = me.area();
        let mut seen: HashSet<EntityId> = HashSet::new();
        let mut contacts = Vec::new();
        for other in self.index.search(rect_to_aabb(area), false) {
            if other == id || !seen.insert(other) {
                continue;
            }
            let Some(them) = self.table.get(other) else {
                continue;
            };
            if !them.has_tag(tag) || !overlaps(them.area(), area) {
                continue;
            }
            let kind = match (&me.hit_shape, &them.hit_shape) {
                (Some(a), Some(b)) => match sat_shapes(a, b) {
                    Some(hit) => ContactKind::Sat(hit),
                    None => continue,
                },
                _ => ContactKind::Rect,
            };
            contacts.push(Contact { other, kind });
        }
        contacts
    }

    /// Whether `point` is on the entity: inside its hit shape if it has one,
    /// otherwise inside its rect (edges included) turned by its rotation.
    pub fn is_at(&self, id: EntityId, point: Point) -> bool {
        self.table.get(id).is_some_and(|e| e.covers(point))
    }

    /// Every entity [`is_at`](Self::is_at) `point`, topmost first.
    pub fn entities_at(&self, point: Point) -> Vec<EntityId> {
        let mut found: Vec<EntityId> = self
            .index
            .query_point(point.x, point.y)
            .into_iter()
            .filter(|&id| self.is_at(id, point))
            .collect();
        found.sort_by_key(|&id| core::cmp::Reverse(self.global_z(id)));
        found
    }
}

/// Edge-triggered wrapper around [`World::hit`], polled once per tick.
#[derive(Clone, Debug)]
pub struct HitMonitor {
    tag: String,
    hitting: bool,
}

/// What a [`HitMonitor`] saw this tick.
#[derive(Clone, Debug, PartialEq)]
pub enum HitEvent {
    /// Colliding this tick.
    Hit {
        /// Current contacts.
        contacts: Vec<Contact>,
        /// Whether the previous poll found nothing.
        entered: bool,
    },
    /// The first tick without contacts after colliding.
    Exit,
}

impl HitMonitor {
    /// Watch for collisions with entities tagged `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            hitting: false,
        }
    }

    /// Whether the last poll found contacts.
    pub fn is_hitting(&self) -> bool {
        self.hitting
    }

    /// Run [`World::hit`] for `id` and report the transition, if any.
    pub fn poll(&mut self, world: &World, id: EntityId) -> Option<HitEvent> {
        let contacts = world.hit(id, &self.tag);
        if contacts.is_empty() {
            if core::mem::replace(&mut self.hitting, false) {
                return Some(HitEvent::Exit);
            }
            return None;
        }
        let entered = !core::mem::replace(&mut self.hitting, true);
        Some(HitEvent::Hit { contacts, entered })
    }
}

#[cfg(test)]
mod tests {
    use gridscape_geometry::{HitShape, Polygon};
    use kurbo::Circle;

    use super::*;
    use crate::entity::EntityDesc;

    fn boxed(x: f64, y: f64, w: f64, h: f64) -> EntityDesc {
        EntityDesc::new(Rect::new(x, y, x + w, y + h))
    }

    #[test]
    fn rect_only_pair_reports_rect_contact() {
        let mut world = World::default();
        let a = world.spawn(boxed(0.0, 0.0, 10.0, 10.0));
        let b = world.spawn(boxed(5.0, 5.0, 10.0, 10.0).with_tag("solid"));
        let contacts = world.hit(a, "solid");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].other, b);
        assert_eq!(contacts[0].kind, ContactKind::Rect);
        assert_eq!(contacts[0].normal(), None);
        assert_eq!(contacts[0].overlap(), None);
    }

    #[test]
    fn filters_self_tag_and_touching() {
        let mut world = World::default();
        let a = world.spawn(boxed(0.0, 0.0, 10.0, 10.0).with_tag("solid"));
        let _untagged = world.spawn(boxed(2.0, 2.0, 4.0, 4.0));
        let _touching = world.spawn(boxed(10.0, 0.0, 10.0, 10.0).with_tag("solid"));
        assert!(world.hit(a, "solid").is_empty());
    }

    #[test]
    fn sat_rejects_rect_overlap_between_shapes() {
        let mut world = World::default();
        let tri = Polygon::new([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let a = world.spawn(boxed(0.0, 0.0, 10.0, 10.0).with_hit_shape(tri));
        // Only the far corner of its box overlaps the triangle's box.
        let b = world.spawn(
            boxed(8.0, 8.0, 10.0, 10.0)
                .with_tag("solid")
                .with_hit_shape(Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0))),
        );
        assert!(world.hit(a, "solid").is_empty());

        world.set_position(b, (4.0, 4.0));
        let contacts = world.hit(a, "solid");
        assert_eq!(contacts.len(), 1);
        let overlap = contacts[0].overlap().unwrap();
        assert!(overlap > 0.0);
        let normal = contacts[0].normal().unwrap();
        assert!(normal.dot(Vec2::new(1.0, 1.0)) > 0.0);
    }

    #[test]
    fn rotated_entities_collide_on_mbr() {
        let mut world = World::default();
        let a = world.spawn(
            boxed(0.0, 0.0, 20.0, 4.0)
                .with_origin(gridscape_geometry::Origin::Center)
                .with_rotation(90.0),
        );
        let b = world.spawn(boxed(8.0, 10.0, 4.0, 4.0).with_tag("x"));
        // Unrotated the boxes are apart; turned upright `a` reaches y = 12.
        assert_eq!(world.hit(a, "x").len(), 1);
        assert_eq!(world.hit(a, "x")[0].other, b);
    }

    #[test]
    fn is_at_prefers_hit_shape() {
        let mut world = World::default();
        let plain = world.spawn(boxed(0.0, 0.0, 10.0, 10.0));
        let round = world.spawn(
            boxed(20.0, 0.0, 10.0, 10.0).with_hit_shape(HitShape::Circle(Circle::new(
                (5.0, 5.0),
                5.0,
            ))),
        );
        assert!(world.is_at(plain, Point::new(10.0, 10.0)));
        assert!(!world.is_at(plain, Point::new(10.5, 10.0)));
        assert!(world.is_at(round, Point::new(25.0, 5.0)));
        assert!(!world.is_at(round, Point::new(20.5, 0.5)));
    }

    #[test]
    fn rotated_point_queries_agree() {
        let mut world = World::default();
        let bar = world.spawn(
            boxed(0.0, 0.0, 20.0, 4.0)
                .with_origin(gridscape_geometry::Origin::Center)
                .with_rotation(90.0),
        );
        // Upright the bar spans x 8..12 and y -8..12; its old footprint is gone.
        assert!(!world.is_at(bar, Point::new(1.0, 1.0)));
        assert!(world.entities_at(Point::new(1.0, 1.0)).is_empty());
        assert!(world.is_at(bar, Point::new(10.0, 10.0)));
        assert_eq!(world.entities_at(Point::new(10.0, 10.0)), [bar]);

        for i in 0..20 {
            for j in 0..20 {
                let pt = Point::new(-5.25 + 1.5 * f64::from(i), -10.25 + 1.5 * f64::from(j));
                assert_eq!(
                    world.is_at(bar, pt),
                    world.entities_at(pt).contains(&bar),
                    "disagree at {pt:?}"
                );
            }
        }
    }

    #[test]
    fn entities_at_is_topmost_first() {
        let mut world = World::default();
        let low = world.spawn(boxed(0.0, 0.0, 10.0, 10.0).with_z(1.0));
        let high = world.spawn(boxed(0.0, 0.0, 10.0, 10.0).with_z(3.0));
        let _away = world.spawn(boxed(50.0, 50.0, 10.0, 10.0));
        assert_eq!(world.entities_at(Point::new(5.0, 5.0)), [high, low]);
    }

    #[test]
    fn monitor_reports_enter_stay_exit() {
        let mut world = World::default();
        let a = world.spawn(boxed(0.0, 0.0, 10.0, 10.0));
        let _wall = world.spawn(boxed(5.0, 0.0, 10.0, 10.0).with_tag("wall"));
        let mut monitor = HitMonitor::new("wall");

        let Some(HitEvent::Hit { entered, contacts }) = monitor.poll(&world, a) else {
            panic!("expected a hit");
        };
        assert!(entered);
        assert_eq!(contacts.len(), 1);
        assert!(matches!(
            monitor.poll(&world, a),
            Some(HitEvent::Hit { entered: false, .. })
        ));

        world.set_position(a, (100.0, 100.0));
        assert_eq!(monitor.poll(&world, a), Some(HitEvent::Exit));
        assert_eq!(monitor.poll(&world, a), None);
        assert!(!monitor.is_hitting());
    }
}
