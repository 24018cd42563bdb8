// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picking and painting through a zoomed camera.
//!
//! Two cameras view the same layer, one at 1:1 and one zoomed in on a corner.
//! The same screen point picks different nodes depending on the camera.
//!
//! Run:
//! - `cargo run -p montage_demos --example camera_pick`

use kurbo::{Affine, BezPath, Point, Rect};
use montage_scene::{
    CameraData, Color, LocalNode, NodeKind, PaintCommand, PathData, RecordingSurface, Root,
    TextData,
};

fn main() {
    let mut root = Root::new();
    let scene = root.scene_mut();
    let top = scene.root();
    let layer = scene
        .insert_with_kind(Some(top), LocalNode::default(), NodeKind::Layer)
        .expect("root is live");

    let screen = LocalNode {
        bounds: Rect::new(0.0, 0.0, 300.0, 200.0),
        ..LocalNode::default()
    };
    let overview = scene
        .insert_with_kind(
            Some(top),
            screen.clone(),
            NodeKind::Camera(CameraData {
                view_transform: Affine::IDENTITY,
                layers: vec![layer],
            }),
        )
        .expect("root is live");
    let zoomed = scene
        .insert_with_kind(
            Some(top),
            screen,
            NodeKind::Camera(CameraData {
                view_transform: Affine::scale(4.0),
                layers: vec![layer],
            }),
        )
        .expect("root is live");
    scene.set_offset(zoomed, 320.0, 0.0);

    let mut triangle = BezPath::new();
    triangle.move_to((10.0, 10.0));
    triangle.line_to((60.0, 10.0));
    triangle.line_to((10.0, 40.0));
    triangle.close_path();
    let shape = scene
        .insert_with_kind(
            Some(layer),
            LocalNode {
                fill: Some(Color::BLUE),
                ..LocalNode::default()
            },
            NodeKind::Path(PathData::new(triangle).with_stroke(Color::BLACK, 2.0)),
        )
        .expect("layer is live");
    let label = scene
        .insert_text(
            Some(layer),
            LocalNode::default(),
            TextData::new("Hello, Montage", 12.0),
        )
        .expect("layer is live");
    scene.set_offset(label, 100.0, 120.0);

    for (name, camera, point) in [
        ("overview", overview, Point::new(20.0, 20.0)),
        ("zoomed", zoomed, Point::new(320.0 + 80.0, 80.0)),
        ("zoomed", zoomed, Point::new(320.0 + 230.0, 30.0)),
        ("overview", overview, Point::new(110.0, 125.0)),
    ] {
        match root.pick(camera, point) {
            Some(hit) => {
                let what = if hit.node == shape {
                    "triangle"
                } else if hit.node == label {
                    "label"
                } else {
                    "camera"
                };
                println!("{name} at {point:?}: {what} (local {:?})", hit.local_point);
            }
            None => println!("{name} at {point:?}: nothing"),
        }
    }

    for (name, camera) in [("overview", overview), ("zoomed", zoomed)] {
        let mut surface = RecordingSurface::new();
        root.paint_camera(camera, &mut surface, None);
        println!("{name} paints {} primitives:", surface.draw_count());
        for command in &surface.commands {
            match command {
                PaintCommand::Text { text, .. } => println!("  text {text:?}"),
                PaintCommand::FillRect { rect, .. } => println!("  fill_rect {rect:?}"),
                other => println!("  {other:?}"),
            }
        }
    }
}
