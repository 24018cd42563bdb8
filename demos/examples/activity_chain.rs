// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chained and looping activities driven by a manual clock.
//!
//! A card zooms out, back in, and settles, each move starting exactly when the
//! previous one ends. A second card flashes twice a second once the first move
//! is done. Every frame repaints only the damaged part of the camera.
//!
//! Run:
//! - `RUST_LOG=info,montage_scene=debug cargo run -p montage_demos --example activity_chain`

use kurbo::{Affine, Rect};
use montage_activity::{Clock, ManualClock};
use montage_scene::transform::position_scale_rotation;
use montage_scene::{
    Activity, ActivityEvent, Animation, CameraData, Color, Damage, LocalNode, NodeKind, Outcome,
    RecordingSurface, Root,
};
use tracing_subscriber::EnvFilter;

const FRAME: i64 = 100;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut root = Root::new();
    let scene = root.scene_mut();
    let top = scene.root();
    let layer = scene
        .insert_with_kind(Some(top), LocalNode::default(), NodeKind::Layer)
        .expect("root is live");
    let camera = scene
        .insert_with_kind(
            Some(top),
            LocalNode {
                bounds: Rect::new(0.0, 0.0, 640.0, 480.0),
                ..LocalNode::default()
            },
            NodeKind::Camera(CameraData {
                view_transform: Affine::IDENTITY,
                layers: vec![layer],
            }),
        )
        .expect("root is live");

    let card = |fill| LocalNode {
        bounds: Rect::new(0.0, 0.0, 100.0, 80.0),
        fill: Some(fill),
        ..LocalNode::default()
    };
    let mover = scene.insert(Some(layer), card(Color::BLUE)).expect("layer is live");
    scene.set_offset(mover, 200.0, 200.0);
    let flasher = scene.insert(Some(layer), card(Color::GREEN)).expect("layer is live");
    scene.set_offset(flasher, 400.0, 40.0);

    let clock = ManualClock::new(0);
    let moves = [
        position_scale_rotation(0.0, 0.0, 0.5, 0.0),
        position_scale_rotation(100.0, 0.0, 1.5, 0.0),
        position_scale_rotation(20.0, 200.0, 1.0, 0.0),
    ];
    let mut previous = None;
    for destination in moves {
        let mut activity = Activity::new(5_000, Animation::transform(mover, destination));
        if let Some(prev) = previous {
            activity = activity.start_after(prev);
        }
        previous = Some(root.add_activity(activity));
    }

    let flash = Animation::custom(move |scene, event| {
        if let ActivityEvent::Stepped(_) = event {
            let next = match scene.fill(flasher) {
                Some(Color::RED) => Color::GREEN,
                _ => Color::RED,
            };
            scene.set_fill(flasher, Some(next));
        }
        Outcome::Continue
    });
    let flashing = root.add_activity(Activity::indefinite(500, flash).starting_at(5_000));

    let mut damage = Damage::default();
    let mut surface = RecordingSurface::new();
    while clock.now_millis() <= 15_000 {
        let now = clock.now_millis();
        let summary = root.tick(now, &mut damage, &mut surface);
        if !summary.started.is_empty() || !summary.finished.is_empty() {
            tracing::info!(
                now,
                started = ?summary.started,
                finished = ?summary.finished,
                "lifecycle"
            );
        }
        clock.advance(FRAME);
    }
    root.scheduler_mut().terminate(flashing);
    root.tick(clock.now_millis(), &mut damage, &mut surface);

    let repainted = damage
        .dirty_rects
        .iter()
        .filter(|d| d.camera == camera)
        .count();
    println!(
        "{repainted} repaints, {} draw calls, final transform {:?}",
        surface.draw_count(),
        root.scene().transform(mover)
    );
}
