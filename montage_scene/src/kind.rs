// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node kinds and the per-kind paint and containment dispatch.

use alloc::boxed::Box;
use alloc::vec::Vec;
use kurbo::{Affine, BezPath, ParamCurveNearest, Point, Rect, Shape};

use crate::paint::{PaintContext, PaintSurface};
use crate::text::TextData;
use crate::types::{Color, LocalNode, NodeId};

/// Accuracy passed to kurbo when measuring stroke distance.
const NEAREST_ACCURACY: f64 = 1e-3;

/// Behavior for application-defined node kinds.
///
/// Every method has a default, so an implementation only overrides what it needs.
pub trait NodeBehavior {
    /// Paint the node content. The surface transform is already set to the
    /// node's local space.
    fn paint(&self, local: &LocalNode, ctx: &PaintContext, surface: &mut dyn PaintSurface) {
        fill_bounds(local, ctx, surface);
    }

    /// Exact containment test for picking, in local coordinates.
    fn contains(&self, local: &LocalNode, point: Point) -> bool {
        local.bounds.contains(point)
    }
}

/// Stroke parameters for path nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in local units.
    pub width: f64,
}

/// Content of a path node. The fill comes from [`LocalNode::fill`].
#[derive(Clone, Debug, Default)]
pub struct PathData {
    /// Geometry in local coordinates.
    pub path: BezPath,
    /// Optional outline.
    pub stroke: Option<Stroke>,
}

impl PathData {
    /// A path without stroke.
    pub fn new(path: BezPath) -> Self {
        Self { path, stroke: None }
    }

    /// Add an outline.
    pub fn with_stroke(mut self, color: Color, width: f64) -> Self {
        self.stroke = Some(Stroke { color, width });
        self
    }

    /// Bounds that cover the geometry and half the stroke on each side.
    pub fn bounds(&self) -> Rect {
        if self.path.elements().is_empty() {
            return Rect::ZERO;
        }
        let half = self.stroke.map_or(0.0, |s| s.width * 0.5);
        self.path.bounding_box().inflate(half, half)
    }

    fn stroke_contains(&self, point: Point) -> bool {
        let Some(stroke) = self.stroke else {
            return false;
        };
        let half = stroke.width * 0.5;
        let limit = half * half;
        self.path
            .segments()
            .any(|seg| seg.nearest(point, NEAREST_ACCURACY).distance_sq <= limit)
    }
}

/// Camera state: what it looks at and through which transform.
#[derive(Clone, Debug, Default)]
pub struct CameraData {
    /// Maps layer space into the camera's local space.
    pub view_transform: Affine,
    /// Viewed layers, back to front. Not owned.
    pub layers: Vec<NodeId>,
}

/// What a node is, beyond its common [`LocalNode`] data.
#[derive(Default)]
pub enum NodeKind {
    /// Fills its bounds with the node fill, if any.
    #[default]
    Plain,
    /// Vector geometry.
    Path(PathData),
    /// A text run sized by a [`TextMeasure`](crate::TextMeasure).
    Text(TextData),
    /// Content that cameras look at.
    Layer,
    /// A viewport onto a list of layers.
    Camera(CameraData),
    /// The scene root created by [`Scene::new`](crate::Scene::new).
    Root,
    /// Application-defined content.
    Custom(Box<dyn NodeBehavior>),
}

impl core::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Plain => f.write_str("Plain"),
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Self::Layer => f.write_str("Layer"),
            Self::Camera(c) => f.debug_tuple("Camera").field(c).finish(),
            Self::Root => f.write_str("Root"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl NodeKind {
    /// Paint the node's own content (not its children or layers).
    pub(crate) fn paint(
        &self,
        local: &LocalNode,
        ctx: &PaintContext,
        surface: &mut dyn PaintSurface,
    ) {
        match self {
            Self::Plain | Self::Layer | Self::Root | Self::Camera(_) => {
                fill_bounds(local, ctx, surface);
            }
            Self::Path(data) => paint_path(data, local, ctx, surface),
            Self::Text(data) => {
                fill_bounds(local, ctx, surface);
                paint_text(data, local, ctx, surface);
            }
            Self::Custom(behavior) => behavior.paint(local, ctx, surface),
        }
    }

    /// Exact containment in local coordinates.
    pub(crate) fn contains(&self, local: &LocalNode, point: Point) -> bool {
        match self {
            Self::Path(data) => {
                (local.fill.is_some() && data.path.contains(point)) || data.stroke_contains(point)
            }
            Self::Custom(behavior) => behavior.contains(local, point),
            _ => local.bounds.contains(point),
        }
    }

    /// Camera data, if this is a camera.
    pub fn as_camera(&self) -> Option<&CameraData> {
        match self {
            Self::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn as_camera_mut(&mut self) -> Option<&mut CameraData> {
        match self {
            Self::Camera(c) => Some(c),
            _ => None,
        }
    }

    /// Text data, if this is a text node.
    pub fn as_text(&self) -> Option<&TextData> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Path data, if this is a path node.
    pub fn as_path(&self) -> Option<&PathData> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Returns true for layers.
    pub fn is_layer(&self) -> bool {
        matches!(self, Self::Layer)
    }
}

/// Fill the node bounds with its fill color, if it has one.
pub fn fill_bounds(local: &LocalNode, ctx: &PaintContext, surface: &mut dyn PaintSurface) {
    let Some(fill) = local.fill else {
        return;
    };
    if local.bounds.is_zero_area() {
        return;
    }
    if let Err(err) = surface.fill_rect(local.bounds, fill.multiply_alpha(ctx.opacity())) {
        tracing::warn!(%err, "fill_rect failed; node skipped");
    }
}

fn paint_path(
    data: &PathData,
    local: &LocalNode,
    ctx: &PaintContext,
    surface: &mut dyn PaintSurface,
) {
    let opacity = ctx.opacity();
    if let Some(fill) = local.fill
        && let Err(err) = surface.fill_path(&data.path, fill.multiply_alpha(opacity))
    {
        tracing::warn!(%err, "fill_path failed; fill skipped");
    }
    if let Some(stroke) = data.stroke
        && let Err(err) =
            surface.stroke_path(&data.path, stroke.color.multiply_alpha(opacity), stroke.width)
    {
        tracing::warn!(%err, "stroke_path failed; outline skipped");
    }
}

fn paint_text(
    data: &TextData,
    local: &LocalNode,
    ctx: &PaintContext,
    surface: &mut dyn PaintSurface,
) {
    if data.text.is_empty() {
        return;
    }
    let config = ctx.config();
    let rendered = data.font_size * ctx.scale();
    let color = data.color.multiply_alpha(ctx.opacity());
    if rendered < config.greek_threshold {
        if let Err(err) = surface.fill_rect(local.bounds, color) {
            tracing::warn!(%err, "greeked text fill failed");
        }
    } else if rendered < config.max_font_size {
        if let Err(err) = surface.draw_text(&data.text, data.font_size, local.bounds, color) {
            tracing::warn!(%err, rendered, "draw_text failed; drawing a placeholder box");
            if let Err(err) = surface.fill_rect(local.bounds, color) {
                tracing::warn!(%err, "placeholder fill failed");
            }
        }
    } else {
        tracing::trace!(rendered, "text too large to draw; skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurfaceError;
    use crate::paint::{PaintCommand, RecordingSurface};

    fn text_node(font_size: f64) -> (NodeKind, LocalNode) {
        let kind = NodeKind::Text(TextData::new("hi", font_size));
        let local = LocalNode {
            bounds: Rect::new(0.0, 0.0, 20.0, 10.0),
            ..LocalNode::default()
        };
        (kind, local)
    }

    #[test]
    fn small_text_is_greeked() {
        let (kind, local) = text_node(4.0);
        let ctx = PaintContext::new(None);
        let mut surface = RecordingSurface::new();
        kind.paint(&local, &ctx, &mut surface);
        assert!(
            matches!(surface.commands.as_slice(), [PaintCommand::FillRect { .. }]),
            "text below the greek threshold becomes a box: {:?}",
            surface.commands
        );
    }

    #[test]
    fn zoomed_text_is_drawn_and_huge_text_skipped() {
        let (kind, local) = text_node(4.0);
        let mut ctx = PaintContext::new(None);
        ctx.push_transform(Affine::scale(2.0));
        let mut surface = RecordingSurface::new();
        kind.paint(&local, &ctx, &mut surface);
        assert!(matches!(
            surface.commands.as_slice(),
            [PaintCommand::Text { font_size, .. }] if *font_size == 4.0
        ));

        ctx.push_transform(Affine::scale(100.0));
        surface.clear();
        kind.paint(&local, &ctx, &mut surface);
        assert!(surface.commands.is_empty(), "800 device units is above the max font size");
    }

    #[test]
    fn draw_text_failure_falls_back_to_box() {
        let (kind, local) = text_node(12.0);
        let ctx = PaintContext::new(None);
        let mut surface = RecordingSurface {
            text_error: Some(SurfaceError::Unsupported),
            ..RecordingSurface::default()
        };
        kind.paint(&local, &ctx, &mut surface);
        assert!(matches!(
            surface.commands.as_slice(),
            [PaintCommand::FillRect { rect, .. }] if *rect == local.bounds
        ));
    }

    #[test]
    fn path_pick_uses_fill_and_stroke() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((100.0, 0.0));
        path.line_to((0.0, 100.0));
        path.close_path();
        let kind = NodeKind::Path(PathData::new(path.clone()));
        let filled = LocalNode {
            fill: Some(Color::RED),
            ..LocalNode::default()
        };
        assert!(kind.contains(&filled, Point::new(10.0, 10.0)));
        assert!(!kind.contains(&filled, Point::new(90.0, 90.0)), "outside the triangle");
        assert!(
            !kind.contains(&LocalNode::default(), Point::new(10.0, 10.0)),
            "no fill, no stroke"
        );

        let stroked = NodeKind::Path(PathData::new(path).with_stroke(Color::BLACK, 4.0));
        assert!(stroked.contains(&LocalNode::default(), Point::new(50.0, 1.5)));
        assert!(!stroked.contains(&LocalNode::default(), Point::new(50.0, 10.0)));
    }

    #[test]
    fn path_bounds_include_half_stroke() {
        let mut path = BezPath::new();
        path.move_to((10.0, 10.0));
        path.line_to((20.0, 30.0));
        let data = PathData::new(path).with_stroke(Color::BLACK, 2.0);
        assert_eq!(data.bounds(), Rect::new(9.0, 9.0, 21.0, 31.0));
        assert_eq!(PathData::default().bounds(), Rect::ZERO);
    }

    #[derive(Debug)]
    struct Disc;

    impl NodeBehavior for Disc {
        fn contains(&self, local: &LocalNode, point: Point) -> bool {
            let c = local.bounds.center();
            let r = local.bounds.width() * 0.5;
            (point - c).hypot2() <= r * r
        }
    }

    #[test]
    fn custom_behavior_dispatch() {
        let kind = NodeKind::Custom(Box::new(Disc));
        let local = LocalNode {
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            fill: Some(Color::BLUE),
            ..LocalNode::default()
        };
        assert!(kind.contains(&local, Point::new(5.0, 5.0)));
        assert!(!kind.contains(&local, Point::new(0.5, 0.5)), "corner is outside the disc");

        let mut surface = RecordingSurface::new();
        kind.paint(&local, &PaintContext::new(None), &mut surface);
        assert_eq!(surface.draw_count(), 1, "default paint fills the bounds");
    }
}
