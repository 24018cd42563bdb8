// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Montage Scene: a retained-mode 2D scene graph with cameras, layers, and
//! scheduled property animation.
//!
//! A [`Scene`] is an arena of nodes addressed by generational [`NodeId`]s. Each node
//! carries local bounds, a transform to its parent, visibility and picking flags, an
//! optional fill, and a subtree opacity. What a node *is* (plain box, path, text,
//! layer, camera, or a custom behavior) lives in its [`NodeKind`].
//!
//! - [`Scene`]: structure edits, property setters, coordinate conversion, and queries.
//! - [`Scene::full_bounds`]: the cached union of a node's bounds and its
//!   descendants' bounds, in the node's local space.
//! - [`Scene::full_paint`]: paint a subtree onto a [`PaintSurface`].
//! - [`Scene::pick`]: frontmost node under a point, with the path to it.
//! - [`Root`]: a scene plus a [`Scheduler`](montage_activity::Scheduler) of
//!   [`Animation`]s, driven once per frame by the host.
//!
//! ## Cameras and layers
//!
//! A camera node views any number of layer nodes through its view transform. Layers
//! are ordinary subtrees; a layer that is not viewed by any camera is never painted
//! except as part of its own parent. Damage inside a layer is mapped through every
//! camera that views it and clipped to that camera's bounds, so the host repaints
//! only what is actually on screen.
//!
//! ## Damage
//!
//! Property setters record damage in the node's old and new extent. Damage is
//! reported per camera in scene coordinates and coalesced to one rectangle per
//! camera by [`Root::process_inputs`]. Nodes that are invisible, or that are not
//! under any camera, produce no damage.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Affine, Point, Rect};
//! use montage_scene::{CameraData, Color, LocalNode, NodeKind, RecordingSurface, Root};
//!
//! let mut root = Root::new();
//! let scene = root.scene_mut();
//! let top = scene.root();
//!
//! let layer = scene.insert_with_kind(Some(top), LocalNode::default(), NodeKind::Layer).unwrap();
//! let camera = scene
//!     .insert_with_kind(
//!         Some(top),
//!         LocalNode { bounds: Rect::new(0.0, 0.0, 400.0, 300.0), ..LocalNode::default() },
//!         NodeKind::Camera(CameraData { view_transform: Affine::IDENTITY, layers: vec![layer] }),
//!     )
//!     .unwrap();
//! let card = scene
//!     .insert(
//!         Some(layer),
//!         LocalNode {
//!             bounds: Rect::new(0.0, 0.0, 100.0, 80.0),
//!             fill: Some(Color::BLUE),
//!             ..LocalNode::default()
//!         },
//!     )
//!     .unwrap();
//!
//! root.animate_to_position_scale(card, 200.0, 100.0, 1.0, 500);
//!
//! let mut damage = montage_scene::Damage::default();
//! let mut surface = RecordingSurface::new();
//! root.tick(0, &mut damage, &mut surface);
//! root.tick(500, &mut damage, &mut surface);
//!
//! assert_eq!(root.scene().offset(card).map(|v| v.x), Some(200.0));
//! assert_eq!(root.pick(camera, Point::new(250.0, 150.0)).map(|h| h.node), Some(card));
//! ```
//!
//! This crate is `no_std` and uses `alloc`. Enable the `libm` feature when
//! building without `std`.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod animation;
mod damage;
mod error;
mod kind;
mod paint;
mod pick;
mod root;
mod scene;
mod text;
pub mod transform;
mod types;

pub use animation::{Animation, CustomAnimation, Tween};
pub use damage::{Damage, DirtyRect, RepaintSink};
pub use error::{SceneError, SurfaceError};
pub use kind::{CameraData, NodeBehavior, NodeKind, PathData, Stroke, fill_bounds};
pub use paint::{
    DEFAULT_GREEK_THRESHOLD, DEFAULT_MAX_FONT_SIZE, PaintCommand, PaintConfig, PaintContext,
    PaintSurface, RecordingSurface,
};
pub use pick::Hit;
pub use root::{Root, RootConfig};
pub use scene::Scene;
pub use text::{MonospaceMeasure, TextData, TextMeasure};
pub use types::{Color, LocalNode, NodeFlags, NodeId};

pub use montage_activity::{
    Activity, ActivityEvent, ActivityId, Interpolation, InterpolationMode, Outcome,
};
