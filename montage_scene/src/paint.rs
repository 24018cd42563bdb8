// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint traversal state and the drawing-surface abstraction.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use kurbo::{Affine, BezPath, Rect};
use smallvec::{SmallVec, smallvec};

use crate::error::SurfaceError;
use crate::kind::NodeKind;
use crate::scene::Scene;
use crate::transform::{self, transform_rect_bbox};
use crate::types::{Color, NodeId};

/// Font size (in device units) below which text is drawn as a filled box.
pub const DEFAULT_GREEK_THRESHOLD: f64 = 5.5;

/// Font size (in device units) above which text is not drawn at all.
pub const DEFAULT_MAX_FONT_SIZE: f64 = 300.0;

/// A drawing backend.
///
/// The scene never touches pixels. During a paint traversal it sets the current
/// transform and issues primitives in that transform's local coordinates. A
/// primitive may fail; the traversal absorbs the failure for that node.
pub trait PaintSurface {
    /// Replace the current local-to-device transform.
    fn set_transform(&mut self, transform: Affine);

    /// Intersect the clip with `rect`, given in the current local coordinates.
    fn push_clip(&mut self, rect: Rect);

    /// Undo the matching [`PaintSurface::push_clip`].
    fn pop_clip(&mut self);

    /// Fill a rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), SurfaceError>;

    /// Fill a path using the nonzero rule.
    fn fill_path(&mut self, path: &BezPath, color: Color) -> Result<(), SurfaceError>;

    /// Stroke a path.
    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64)
    -> Result<(), SurfaceError>;

    /// Draw `text` laid out inside `bounds` at `font_size` (local units).
    fn draw_text(
        &mut self,
        text: &str,
        font_size: f64,
        bounds: Rect,
        color: Color,
    ) -> Result<(), SurfaceError>;
}

/// Thresholds used when painting text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintConfig {
    /// Rendered font sizes below this are drawn as filled rectangles.
    pub greek_threshold: f64,
    /// Rendered font sizes at or above this are skipped.
    pub max_font_size: f64,
}

impl Default for PaintConfig {
    fn default() -> Self {
        Self {
            greek_threshold: DEFAULT_GREEK_THRESHOLD,
            max_font_size: DEFAULT_MAX_FONT_SIZE,
        }
    }
}

/// Accumulated state passed down a paint traversal.
///
/// Keeps three stacks: the local-to-device transform, the clip expressed in the
/// current local coordinates (`None` is unbounded), and the accumulated
/// opacity. Pushing a transform maps the current clip into the child space, so
/// culling is always a comparison in local coordinates.
#[derive(Clone, Debug)]
pub struct PaintContext {
    transforms: SmallVec<[Affine; 8]>,
    clips: SmallVec<[Option<Rect>; 8]>,
    opacities: SmallVec<[f32; 8]>,
    config: PaintConfig,
}

impl PaintContext {
    /// Start a traversal in device space, clipped to `clip` (`None` for no clip).
    pub fn new(clip: Option<Rect>) -> Self {
        Self::with_transform(Affine::IDENTITY, clip)
    }

    /// Start a traversal whose local space maps to device space through `base`.
    ///
    /// `clip` is given in device space.
    pub fn with_transform(base: Affine, clip: Option<Rect>) -> Self {
        let local_clip = match (clip, transform::try_inverse(base)) {
            (Some(c), Some(inv)) => Some(transform_rect_bbox(inv, c)),
            (Some(_), None) => Some(Rect::ZERO),
            (None, _) => None,
        };
        Self {
            transforms: smallvec![base],
            clips: smallvec![local_clip],
            opacities: smallvec![1.0],
            config: PaintConfig::default(),
        }
    }

    /// Replace the text thresholds.
    pub fn with_config(mut self, config: PaintConfig) -> Self {
        self.config = config;
        self
    }

    /// Text thresholds.
    pub fn config(&self) -> &PaintConfig {
        &self.config
    }

    /// Current local-to-device transform.
    pub fn transform(&self) -> Affine {
        self.transforms.last().copied().unwrap_or(Affine::IDENTITY)
    }

    /// Current clip in local coordinates, or `None` if unbounded.
    pub fn local_clip(&self) -> Option<Rect> {
        self.clips.last().copied().flatten()
    }

    /// Current accumulated opacity.
    pub fn opacity(&self) -> f32 {
        self.opacities.last().copied().unwrap_or(1.0)
    }

    /// Uniform scale from local units to device units.
    pub fn scale(&self) -> f64 {
        transform::scale(self.transform())
    }

    /// Returns true if `rect` (local coordinates) may be visible.
    pub fn intersects(&self, rect: Rect) -> bool {
        match self.local_clip() {
            Some(clip) => !transform::is_empty(clip) && transform::overlaps(clip, rect),
            None => true,
        }
    }

    /// Enter a child space mapped into the current one by `tf`.
    pub fn push_transform(&mut self, tf: Affine) {
        let clip = match (self.local_clip(), transform::try_inverse(tf)) {
            (Some(c), Some(inv)) => Some(transform_rect_bbox(inv, c)),
            (Some(_), None) => Some(Rect::ZERO),
            (None, _) => None,
        };
        self.transforms.push(self.transform() * tf);
        self.clips.push(clip);
    }

    /// Leave the space entered by the matching [`PaintContext::push_transform`].
    pub fn pop_transform(&mut self) {
        if self.transforms.len() > 1 {
            self.transforms.pop();
            self.clips.pop();
        }
    }

    /// Intersect the clip with `rect` (local coordinates).
    pub fn push_clip(&mut self, rect: Rect) {
        let clip = match self.local_clip() {
            Some(c) => c.intersect(rect),
            None => rect,
        };
        self.clips.push(Some(clip));
    }

    /// Undo the matching [`PaintContext::push_clip`].
    pub fn pop_clip(&mut self) {
        if self.clips.len() > self.transforms.len() {
            self.clips.pop();
        }
    }

    /// Multiply `opacity` into the subtree.
    pub fn push_opacity(&mut self, opacity: f32) {
        self.opacities.push(self.opacity() * opacity.clamp(0.0, 1.0));
    }

    /// Undo the matching [`PaintContext::push_opacity`].
    pub fn pop_opacity(&mut self) {
        if self.opacities.len() > 1 {
            self.opacities.pop();
        }
    }
}

/// A primitive recorded by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum PaintCommand {
    /// `fill_rect`, with the transform in effect.
    FillRect {
        /// Local rectangle.
        rect: Rect,
        /// Fill color (opacity already applied).
        color: Color,
        /// Local-to-device transform.
        transform: Affine,
    },
    /// `fill_path`.
    FillPath {
        /// Path bounding box.
        bounds: Rect,
        /// Fill color.
        color: Color,
        /// Local-to-device transform.
        transform: Affine,
    },
    /// `stroke_path`.
    StrokePath {
        /// Path bounding box.
        bounds: Rect,
        /// Stroke color.
        color: Color,
        /// Stroke width in local units.
        width: f64,
        /// Local-to-device transform.
        transform: Affine,
    },
    /// `draw_text`.
    Text {
        /// The string drawn.
        text: String,
        /// Font size in local units.
        font_size: f64,
        /// Layout box.
        bounds: Rect,
        /// Local-to-device transform.
        transform: Affine,
    },
    /// `push_clip`.
    PushClip(Rect),
    /// `pop_clip`.
    PopClip,
}

/// A surface that records primitives instead of drawing them.
///
/// Useful for tests, for debugging paint order, and as a display list for
/// backends that replay commands later.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub(crate) transform: Affine,
    /// Commands in issue order.
    pub commands: Vec<PaintCommand>,
    /// When set, `draw_text` fails with this error.
    pub text_error: Option<SurfaceError>,
}

impl RecordingSurface {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of fill, stroke, and text commands.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| !matches!(c, PaintCommand::PushClip(_) | PaintCommand::PopClip))
            .count()
    }
}

impl PaintSurface for RecordingSurface {
    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn push_clip(&mut self, rect: Rect) {
        self.commands.push(PaintCommand::PushClip(rect));
    }

    fn pop_clip(&mut self) {
        self.commands.push(PaintCommand::PopClip);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), SurfaceError> {
        self.commands.push(PaintCommand::FillRect {
            rect,
            color,
            transform: self.transform,
        });
        Ok(())
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) -> Result<(), SurfaceError> {
        use kurbo::Shape as _;
        self.commands.push(PaintCommand::FillPath {
            bounds: path.bounding_box(),
            color,
            transform: self.transform,
        });
        Ok(())
    }

    fn stroke_path(
        &mut self,
        path: &BezPath,
        color: Color,
        width: f64,
    ) -> Result<(), SurfaceError> {
        use kurbo::Shape as _;
        self.commands.push(PaintCommand::StrokePath {
            bounds: path.bounding_box(),
            color,
            width,
            transform: self.transform,
        });
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        font_size: f64,
        bounds: Rect,
        _color: Color,
    ) -> Result<(), SurfaceError> {
        if let Some(err) = self.text_error {
            return Err(err);
        }
        self.commands.push(PaintCommand::Text {
            text: text.to_string(),
            font_size,
            bounds,
            transform: self.transform,
        });
        Ok(())
    }
}

impl Scene {
    /// Paint `id` and its subtree.
    ///
    /// `ctx` is positioned in the parent space of `id`. Invisible subtrees and
    /// subtrees whose full bounds miss the current clip are skipped. A camera
    /// paints its own content, then its layers through its view transform
    /// clipped to its bounds, then its children. A camera reached again
    /// through one of its own layers paints without its layers.
    pub fn full_paint(&self, id: NodeId, ctx: &mut PaintContext, surface: &mut dyn PaintSurface) {
        let mut cameras = SmallVec::new();
        self.paint_node(id, ctx, surface, &mut cameras);
    }

    fn paint_node(
        &self,
        id: NodeId,
        ctx: &mut PaintContext,
        surface: &mut dyn PaintSurface,
        cameras: &mut SmallVec<[NodeId; 4]>,
    ) {
        let Some(node) = self.node_opt(id) else {
            return;
        };
        if !node.is_visible() {
            return;
        }
        let Some(full) = self.full_bounds_in_parent(id) else {
            return;
        };
        if transform::is_empty(full) || !ctx.intersects(full) {
            return;
        }

        ctx.push_transform(node.local.transform);
        ctx.push_opacity(node.local.opacity);
        surface.set_transform(ctx.transform());
        node.kind.paint(&node.local, ctx, surface);

        if let NodeKind::Camera(camera) = &node.kind
            && !camera.layers.is_empty()
            && !cameras.contains(&id)
        {
            cameras.push(id);
            let bounds = node.local.bounds;
            surface.push_clip(bounds);
            ctx.push_clip(bounds);
            ctx.push_transform(camera.view_transform);
            for &layer in &camera.layers {
                self.paint_node(layer, ctx, surface, cameras);
            }
            ctx.pop_transform();
            ctx.pop_clip();
            surface.set_transform(ctx.transform());
            surface.pop_clip();
            cameras.pop();
        }

        for &child in &node.children {
            self.paint_node(child, ctx, surface, cameras);
        }
        ctx.pop_opacity();
        ctx.pop_transform();
    }
}
