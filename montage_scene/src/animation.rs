// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Activity payloads that animate node properties.

use alloc::boxed::Box;
use kurbo::{Affine, Rect};
use montage_activity::{ActivityEvent, Interpolation, Outcome, lerp};

use crate::scene::Scene;
use crate::transform;
use crate::types::{Color, NodeId};

/// Interpolation of one property of one node from a source to a destination.
///
/// The source is captured from the node when the first iteration starts,
/// unless it was given up front. Later iterations reuse it.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween<T> {
    /// Animated node.
    pub target: NodeId,
    /// Value at fraction `0`; `None` until captured.
    pub source: Option<T>,
    /// Value at fraction `1`.
    pub destination: T,
    /// Fraction shaping.
    pub interpolation: Interpolation,
}

impl<T: Copy> Tween<T> {
    /// A tween from the value the node has when the animation starts.
    pub fn new(target: NodeId, destination: T) -> Self {
        Self {
            target,
            source: None,
            destination,
            interpolation: Interpolation::default(),
        }
    }

    fn drive(
        &mut self,
        scene: &mut Scene,
        event: ActivityEvent,
        get: impl Fn(&Scene, NodeId) -> Option<T>,
        set: impl Fn(&mut Scene, NodeId, T),
        mix: impl Fn(T, T, f64) -> T,
    ) -> Outcome {
        let Some(current) = get(&*scene, self.target) else {
            tracing::debug!(node = ?self.target, "animated node is gone; cancelling");
            return Outcome::Cancel;
        };
        match event {
            ActivityEvent::Started { iteration: 0, .. } => {
                self.source.get_or_insert(current);
            }
            ActivityEvent::Stepped(step) => {
                let source = *self.source.get_or_insert(current);
                let t = self.interpolation.adjust(step.fraction);
                set(scene, self.target, mix(source, self.destination, t));
            }
            ActivityEvent::Started { .. } | ActivityEvent::Finished => {}
        }
        Outcome::Continue
    }
}

/// Callback payload for animations that are not a plain property tween.
pub type CustomAnimation = Box<dyn FnMut(&mut Scene, ActivityEvent) -> Outcome>;

/// What an activity scheduled on a [`Root`](crate::Root) does when stepped.
pub enum Animation {
    /// Node transform, interpolated coefficient-wise.
    Transform(Tween<Affine>),
    /// Camera view transform.
    ViewTransform(Tween<Affine>),
    /// Node bounds.
    Bounds(Tween<Rect>),
    /// Node fill color. A node without fill starts from transparent black.
    Fill(Tween<Color>),
    /// Subtree opacity.
    Opacity(Tween<f32>),
    /// Arbitrary callback with full access to the scene.
    Custom(CustomAnimation),
}

impl core::fmt::Debug for Animation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transform(t) => f.debug_tuple("Transform").field(t).finish(),
            Self::ViewTransform(t) => f.debug_tuple("ViewTransform").field(t).finish(),
            Self::Bounds(t) => f.debug_tuple("Bounds").field(t).finish(),
            Self::Fill(t) => f.debug_tuple("Fill").field(t).finish(),
            Self::Opacity(t) => f.debug_tuple("Opacity").field(t).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Animation {
    /// Animate the transform of `target` to `destination`.
    pub fn transform(target: NodeId, destination: Affine) -> Self {
        Self::Transform(Tween::new(target, destination))
    }

    /// Animate the view transform of camera `target` to `destination`.
    pub fn view_transform(target: NodeId, destination: Affine) -> Self {
        Self::ViewTransform(Tween::new(target, destination))
    }

    /// Animate the bounds of `target` to `destination`.
    pub fn bounds(target: NodeId, destination: Rect) -> Self {
        Self::Bounds(Tween::new(target, destination))
    }

    /// Animate the fill of `target` to `destination`.
    pub fn fill(target: NodeId, destination: Color) -> Self {
        Self::Fill(Tween::new(target, destination))
    }

    /// Animate the opacity of `target` to `destination`.
    pub fn opacity(target: NodeId, destination: f32) -> Self {
        Self::Opacity(Tween::new(target, destination))
    }

    /// Run `f` on every lifecycle event.
    pub fn custom(f: impl FnMut(&mut Scene, ActivityEvent) -> Outcome + 'static) -> Self {
        Self::Custom(Box::new(f))
    }

    /// Replace the fraction shaping. No effect on custom animations.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        match &mut self {
            Self::Transform(t) | Self::ViewTransform(t) => t.interpolation = interpolation,
            Self::Bounds(t) => t.interpolation = interpolation,
            Self::Fill(t) => t.interpolation = interpolation,
            Self::Opacity(t) => t.interpolation = interpolation,
            Self::Custom(_) => {}
        }
        self
    }

    /// The node this animation writes to, if it is a tween.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Self::Transform(t) | Self::ViewTransform(t) => Some(t.target),
            Self::Bounds(t) => Some(t.target),
            Self::Fill(t) => Some(t.target),
            Self::Opacity(t) => Some(t.target),
            Self::Custom(_) => None,
        }
    }

    /// Handle one lifecycle event. Tweens cancel themselves once their
    /// target node is gone.
    pub fn apply(&mut self, scene: &mut Scene, event: ActivityEvent) -> Outcome {
        match self {
            Self::Transform(t) => t.drive(
                scene,
                event,
                Scene::transform,
                Scene::set_transform,
                transform::lerp,
            ),
            Self::ViewTransform(t) => t.drive(
                scene,
                event,
                Scene::view_transform,
                Scene::set_view_transform,
                transform::lerp,
            ),
            Self::Bounds(t) => t.drive(
                scene,
                event,
                Scene::bounds,
                Scene::set_bounds,
                transform::lerp_rect,
            ),
            Self::Fill(t) => t.drive(
                scene,
                event,
                |s, id| s.local(id).map(|l| l.fill.unwrap_or(Color::TRANSPARENT)),
                |s, id, c| s.set_fill(id, Some(c)),
                Color::lerp,
            ),
            Self::Opacity(t) => t.drive(
                scene,
                event,
                Scene::opacity,
                Scene::set_opacity,
                lerp_opacity,
            ),
            Self::Custom(f) => f(scene, event),
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Opacity is in [0, 1], well within f32 precision needs."
)]
fn lerp_opacity(a: f32, b: f32, t: f64) -> f32 {
    lerp(f64::from(a), f64::from(b), t) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LocalNode;
    use montage_activity::ActivityStep;

    fn step(fraction: f64) -> ActivityEvent {
        ActivityEvent::Stepped(ActivityStep {
            elapsed: 0,
            fraction,
            iteration: 0,
        })
    }

    const START: ActivityEvent = ActivityEvent::Started {
        iteration: 0,
        start_time: 0,
    };

    #[test]
    fn transform_tween_captures_source_at_start() {
        let mut scene = Scene::new();
        let n = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();
        scene.set_offset(n, 100.0, 0.0);

        let mut anim = Animation::transform(n, Affine::translate((200.0, 100.0)))
            .with_interpolation(Interpolation::LINEAR);
        assert_eq!(anim.apply(&mut scene, START), Outcome::Continue);

        // Moving the node after the start does not move the source.
        scene.set_offset(n, 0.0, 0.0);
        anim.apply(&mut scene, step(0.5));
        assert_eq!(scene.transform(n), Some(Affine::translate((150.0, 50.0))));
        anim.apply(&mut scene, step(1.0));
        assert_eq!(scene.transform(n), Some(Affine::translate((200.0, 100.0))));
    }

    #[test]
    fn fill_and_opacity_tweens() {
        let mut scene = Scene::new();
        let n = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();

        let mut fill = Animation::fill(n, Color::RED).with_interpolation(Interpolation::LINEAR);
        fill.apply(&mut scene, START);
        fill.apply(&mut scene, step(1.0));
        assert_eq!(scene.fill(n), Some(Color::RED));

        let mut fade = Animation::opacity(n, 0.0).with_interpolation(Interpolation::LINEAR);
        fade.apply(&mut scene, START);
        fade.apply(&mut scene, step(0.5));
        assert_eq!(scene.opacity(n), Some(0.5));
    }

    #[test]
    fn dead_target_cancels() {
        let mut scene = Scene::new();
        let n = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();
        let mut anim = Animation::bounds(n, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(anim.target(), Some(n));
        scene.remove(n).unwrap();
        assert_eq!(anim.apply(&mut scene, START), Outcome::Cancel);
    }

    #[test]
    fn custom_animation_sees_events() {
        let mut scene = Scene::new();
        let n = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();
        let mut anim = Animation::custom(move |scene, event| {
            if let ActivityEvent::Stepped(_) = event {
                scene.offset_by(n, 1.0, 0.0);
            }
            Outcome::Continue
        });
        assert_eq!(anim.target(), None);
        anim.apply(&mut scene, step(0.0));
        anim.apply(&mut scene, step(0.0));
        assert_eq!(scene.offset(n).map(|v| v.x), Some(2.0));
    }
}
