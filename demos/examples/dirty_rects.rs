// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A few ticks of a small scene: movement, rotation with an attached child,
//! collision monitoring, and the draw commands each flush produces.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p gridscape_demos --example dirty_rects`

use gridscape_geometry::{Origin, Polygon};
use gridscape_scene::{
    Direction, EntityDesc, HitEvent, HitMonitor, RasterDraw, RenderBackend, RenderTarget,
    RetainedUpdate, SceneConfig, Viewport, World,
};
use kurbo::Rect;

/// Prints every command instead of painting.
#[derive(Default)]
struct PrintBackend {
    clears: usize,
    draws: usize,
}

impl RenderBackend for PrintBackend {
    fn clear_rect(&mut self, rect: Rect) {
        self.clears += 1;
        println!("  clear  {rect:?}");
    }

    fn draw_raster(&mut self, draw: &RasterDraw) {
        self.draws += 1;
        println!(
            "  draw   {:?} src={:?} clip={:?} alpha={}",
            draw.entity, draw.source, draw.clip, draw.alpha
        );
    }

    fn update_retained(&mut self, update: &RetainedUpdate) {
        println!(
            "  style  {:?} rect={:?} rotation={} visible={}",
            update.entity, update.rect, update.rotation, update.visible
        );
    }
}

fn main() {
    env_logger::init();

    let config = SceneConfig::default().with_viewport(Viewport::new(320.0, 240.0));
    let mut world = World::new(config).expect("valid config");

    // Background tiles so partial redraws have something to repaint.
    for i in 0..8 {
        let x = f64::from(i) * 40.0;
        world.spawn(EntityDesc::new(Rect::new(x, 200.0, x + 40.0, 240.0)).with_tag("ground"));
    }

    let ship = world.spawn(
        EntityDesc::new(Rect::new(20.0, 20.0, 52.0, 36.0))
            .with_z(10.0)
            .with_origin(Origin::Center)
            .with_hit_shape(Polygon::new([(0.0, 8.0), (32.0, 0.0), (32.0, 16.0)])),
    );
    let flame = world.spawn(EntityDesc::new(Rect::new(12.0, 24.0, 20.0, 32.0)).with_z(9.0));
    world.attach(ship, flame).expect("both alive");

    let hud = world.spawn(
        EntityDesc::new(Rect::new(4.0, 4.0, 84.0, 14.0)).with_target(RenderTarget::Retained),
    );

    let mut backend = PrintBackend::default();
    let mut landing = HitMonitor::new("ground");

    for tick in 0..8 {
        println!("tick {tick}");
        world.move_dir(ship, Direction::SouthEast, 22.0);
        world.set_rotation(ship, f64::from(tick) * 15.0);
        if tick % 3 == 0 {
            world.set_alpha(hud, 1.0 - f64::from(tick) * 0.1);
        }

        match landing.poll(&world, ship) {
            Some(HitEvent::Hit { contacts, entered }) => {
                println!("  ship touching {} ground tiles (new: {entered})", contacts.len());
            }
            Some(HitEvent::Exit) => println!("  ship left the ground"),
            None => {}
        }

        let report = world.flush(&mut backend);
        println!("  => {report:?}");
    }

    println!(
        "{} clears and {} draws over {} entities",
        backend.clears,
        backend.draws,
        world.len()
    );
}
