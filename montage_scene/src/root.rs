// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host-facing entry point: a scene plus the activities that animate it.

use kurbo::{Affine, Point, Rect};
use montage_activity::{Activity, ActivityId, DEFAULT_STEP_RATE, Scheduler, TickSummary};

use crate::animation::Animation;
use crate::damage::{Damage, RepaintSink};
use crate::error::SceneError;
use crate::paint::{
    DEFAULT_GREEK_THRESHOLD, DEFAULT_MAX_FONT_SIZE, PaintConfig, PaintContext, PaintSurface,
};
use crate::pick::Hit;
use crate::scene::Scene;
use crate::transform;
use crate::types::{Color, NodeId};

/// Settings for a [`Root`].
///
/// Build with chained setters starting from [`RootConfig::new`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootConfig {
    /// Rendered font size below which text is drawn as a filled box.
    pub greek_threshold: f64,
    /// Rendered font size at or above which text is skipped.
    pub max_font_size: f64,
    /// Step rate (ms) of activities created by the `animate_*` helpers.
    pub default_step_rate: i64,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            greek_threshold: DEFAULT_GREEK_THRESHOLD,
            max_font_size: DEFAULT_MAX_FONT_SIZE,
            default_step_rate: DEFAULT_STEP_RATE,
        }
    }
}

impl RootConfig {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the greeking threshold.
    pub fn greek_threshold(mut self, size: f64) -> Self {
        self.greek_threshold = size;
        self
    }

    /// Set the largest font size that is still drawn.
    pub fn max_font_size(mut self, size: f64) -> Self {
        self.max_font_size = size;
        self
    }

    /// Set the step rate used by the `animate_*` helpers. Negative values become `0`.
    pub fn default_step_rate(mut self, step_rate: i64) -> Self {
        self.default_step_rate = step_rate.max(0);
        self
    }

    fn paint_config(&self) -> PaintConfig {
        PaintConfig {
            greek_threshold: self.greek_threshold,
            max_font_size: self.max_font_size,
        }
    }
}

/// A scene together with the scheduler that animates it.
///
/// The host owns the root and drives it once per frame:
/// 1. [`Root::process_inputs`] steps due activities, which mutate the scene,
///    then reports the accumulated damage, one rectangle per camera;
/// 2. the host repaints those regions with [`Root::paint_camera`].
///
/// [`Root::tick`] does both. Time is whatever the host passes in; nothing
/// here reads a clock.
///
/// ```rust
/// use kurbo::Rect;
/// use montage_scene::{Damage, LocalNode, Root};
///
/// let mut root = Root::new();
/// let top = root.scene().root();
/// let node = root.scene_mut().insert(Some(top), LocalNode::default()).unwrap();
///
/// let anim = root.animate_to_bounds(node, Rect::new(0.0, 0.0, 100.0, 50.0), 1_000);
/// assert!(anim.is_some());
///
/// let mut damage = Damage::default();
/// root.process_inputs(0, &mut damage);
/// root.process_inputs(1_000, &mut damage);
/// assert_eq!(root.scene().bounds(node), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
/// assert!(root.scheduler().is_empty());
/// ```
#[derive(Debug)]
pub struct Root {
    scene: Scene,
    scheduler: Scheduler<Animation>,
    config: RootConfig,
}

impl Default for Root {
    fn default() -> Self {
        Self::new()
    }
}

impl Root {
    /// An empty scene with default settings.
    pub fn new() -> Self {
        Self::with_config(RootConfig::default())
    }

    /// An empty scene with the given settings.
    pub fn with_config(config: RootConfig) -> Self {
        Self {
            scene: Scene::new(),
            scheduler: Scheduler::new(),
            config,
        }
    }

    /// Settings.
    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene, for mutation outside activities.
    ///
    /// Prefer [`Root::remove_node`] to [`Scene::remove`] so activities
    /// targeting removed nodes are cancelled right away.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &Scheduler<Animation> {
        &self.scheduler
    }

    /// The scheduler, for terminating or rescheduling activities.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<Animation> {
        &mut self.scheduler
    }

    /// Time of the last processed tick.
    pub fn current_time(&self) -> i64 {
        self.scheduler.current_time()
    }

    /// Schedule an activity.
    pub fn add_activity(&mut self, activity: Activity<Animation>) -> ActivityId {
        self.scheduler.add(activity)
    }

    /// Remove a node and its subtree, and cancel every activity animating
    /// any of the removed nodes.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.scene.remove(id)?;
        let scene = &self.scene;
        self.scheduler
            .retain(|_, anim| anim.target().is_none_or(|t| scene.is_alive(t)));
        Ok(())
    }

    /// Animate the node transform to `destination` over `duration` ms,
    /// starting now.
    ///
    /// Returns `None` without scheduling anything when `duration <= 0` (the
    /// value is applied immediately) or when `node` is stale.
    pub fn animate_to_transform(
        &mut self,
        node: NodeId,
        destination: Affine,
        duration: i64,
    ) -> Option<ActivityId> {
        self.animate(Animation::transform(node, destination), duration, |s| {
            s.set_transform(node, destination);
        })
    }

    /// Animate the offset and uniform scale, keeping the current rotation.
    pub fn animate_to_position_scale(
        &mut self,
        node: NodeId,
        x: f64,
        y: f64,
        scale: f64,
        duration: i64,
    ) -> Option<ActivityId> {
        let theta = transform::rotation(self.scene.transform(node)?);
        self.animate_to_position_scale_rotation(node, x, y, scale, theta, duration)
    }

    /// Animate the offset, uniform scale, and rotation (radians).
    pub fn animate_to_position_scale_rotation(
        &mut self,
        node: NodeId,
        x: f64,
        y: f64,
        scale: f64,
        theta: f64,
        duration: i64,
    ) -> Option<ActivityId> {
        let destination = transform::position_scale_rotation(x, y, scale, theta);
        self.animate_to_transform(node, destination, duration)
    }

    /// Animate the local bounds.
    pub fn animate_to_bounds(
        &mut self,
        node: NodeId,
        destination: Rect,
        duration: i64,
    ) -> Option<ActivityId> {
        self.animate(Animation::bounds(node, destination), duration, |s| {
            s.set_bounds(node, destination);
        })
    }

    /// Animate the fill color.
    pub fn animate_to_color(
        &mut self,
        node: NodeId,
        destination: Color,
        duration: i64,
    ) -> Option<ActivityId> {
        self.animate(Animation::fill(node, destination), duration, |s| {
            s.set_fill(node, Some(destination));
        })
    }

    /// Animate the subtree opacity.
    pub fn animate_to_opacity(
        &mut self,
        node: NodeId,
        destination: f32,
        duration: i64,
    ) -> Option<ActivityId> {
        self.animate(Animation::opacity(node, destination), duration, |s| {
            s.set_opacity(node, destination);
        })
    }

    /// Animate a camera's view transform.
    pub fn animate_view_to_transform(
        &mut self,
        camera: NodeId,
        destination: Affine,
        duration: i64,
    ) -> Option<ActivityId> {
        self.scene.view_transform(camera)?;
        self.animate(Animation::view_transform(camera, destination), duration, |s| {
            s.set_view_transform(camera, destination);
        })
    }

    fn animate(
        &mut self,
        animation: Animation,
        duration: i64,
        apply_now: impl FnOnce(&mut Scene),
    ) -> Option<ActivityId> {
        let target = animation.target()?;
        if !self.scene.is_alive(target) {
            return None;
        }
        if duration <= 0 {
            apply_now(&mut self.scene);
            return None;
        }
        let activity =
            Activity::new(duration, animation).with_step_rate(self.config.default_step_rate);
        Some(self.scheduler.add(activity))
    }

    /// Step every due activity at time `now`, then report the damage they
    /// (and any earlier scene edits) caused: one rectangle per camera, in
    /// scene coordinates.
    pub fn process_inputs(&mut self, now: i64, sink: &mut impl RepaintSink) -> TickSummary {
        let Self {
            scene, scheduler, ..
        } = self;
        let summary = scheduler.process(now, |_, anim, event| anim.apply(scene, event));
        self.flush_damage(sink);
        summary
    }

    /// Report accumulated damage without stepping activities. Returns the
    /// number of rectangles reported.
    pub fn flush_damage(&mut self, sink: &mut impl RepaintSink) -> usize {
        let damage = self.scene.take_damage();
        if damage.is_empty() {
            return 0;
        }
        let merged = damage.coalesce();
        for d in &merged {
            sink.repaint(d.camera, d.rect);
        }
        tracing::debug!(rects = merged.len(), raw = damage.dirty_rects.len(), "damage flushed");
        merged.len()
    }

    /// Paint what `camera` shows, limited to `clip` (scene coordinates) when given.
    pub fn paint_camera(&self, camera: NodeId, surface: &mut dyn PaintSurface, clip: Option<Rect>) {
        let base = self
            .scene
            .parent_of(camera)
            .and_then(|p| self.scene.global_transform(p))
            .unwrap_or(Affine::IDENTITY);
        let mut ctx =
            PaintContext::with_transform(base, clip).with_config(self.config.paint_config());
        if let Some(clip) = clip {
            surface.set_transform(Affine::IDENTITY);
            surface.push_clip(clip);
        }
        self.scene.full_paint(camera, &mut ctx, surface);
        if clip.is_some() {
            surface.pop_clip();
        }
    }

    /// Process activities at `now`, then repaint every damaged camera region.
    ///
    /// Each repainted region is also reported to `sink`.
    pub fn tick(
        &mut self,
        now: i64,
        sink: &mut impl RepaintSink,
        surface: &mut dyn PaintSurface,
    ) -> TickSummary {
        let mut damage = Damage::default();
        let summary = self.process_inputs(now, &mut damage);
        for d in &damage.dirty_rects {
            sink.repaint(d.camera, d.rect);
            self.paint_camera(d.camera, surface, Some(d.rect));
        }
        summary
    }

    /// Frontmost node under `point` (scene coordinates) as seen through `camera`.
    pub fn pick(&self, camera: NodeId, point: Point) -> Option<Hit> {
        let local = match self.scene.parent_of(camera) {
            Some(p) => self.scene.global_to_local(p, point)?,
            None => point,
        };
        self.scene.pick(camera, local)
    }

    /// Milliseconds until an activity needs a tick, or `None` when idle.
    pub fn time_until_next_step(&self, now: i64) -> Option<i64> {
        self.scheduler.time_until_next_step(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{CameraData, NodeKind};
    use crate::paint::{PaintCommand, RecordingSurface};
    use crate::types::LocalNode;
    use montage_activity::{ActivityState, Interpolation};

    /// Root -> [layer, camera (0,0,400,300) viewing layer].
    fn with_camera() -> (Root, NodeId, NodeId) {
        let mut root = Root::new();
        let top = root.scene().root();
        let scene = root.scene_mut();
        let layer = scene
            .insert_with_kind(Some(top), LocalNode::default(), NodeKind::Layer)
            .unwrap();
        let camera = scene
            .insert_with_kind(
                Some(top),
                LocalNode {
                    bounds: Rect::new(0.0, 0.0, 400.0, 300.0),
                    ..LocalNode::default()
                },
                NodeKind::Camera(CameraData {
                    view_transform: Affine::IDENTITY,
                    layers: alloc::vec![layer],
                }),
            )
            .unwrap();
        let _ = scene.take_damage();
        (root, camera, layer)
    }

    fn square(root: &mut Root, parent: NodeId) -> NodeId {
        root.scene_mut()
            .insert(
                Some(parent),
                LocalNode {
                    bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
                    fill: Some(Color::BLUE),
                    ..LocalNode::default()
                },
            )
            .unwrap()
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let (mut root, _camera, layer) = with_camera();
        let n = square(&mut root, layer);
        assert_eq!(root.animate_to_opacity(n, 0.25, 0), None);
        assert_eq!(root.scene().opacity(n), Some(0.25));
        assert!(root.scheduler().is_empty());
    }

    #[test]
    fn position_scale_animation_reaches_destination() {
        let (mut root, _camera, layer) = with_camera();
        let n = square(&mut root, layer);
        let id = root.animate_to_position_scale(n, 100.0, 50.0, 2.0, 1_000).unwrap();

        let mut damage = Damage::default();
        root.process_inputs(0, &mut damage);
        assert_eq!(root.scheduler().state(id), ActivityState::Active);
        root.process_inputs(500, &mut damage);
        let mid = root.scene().offset(n).unwrap();
        assert!(mid.x > 0.0 && mid.x < 100.0, "halfway: {mid:?}");

        root.process_inputs(1_000, &mut damage);
        assert_eq!(
            root.scene().transform(n),
            Some(Affine::translate((100.0, 50.0)) * Affine::scale(2.0))
        );
        assert_eq!(root.scheduler().state(id), ActivityState::Finished);
        assert!(!damage.is_empty(), "moving a visible node reports damage");
    }

    #[test]
    fn animation_added_before_the_first_tick_starts_at_that_tick() {
        let (mut root, _camera, layer) = with_camera();
        let n = square(&mut root, layer);
        let id = root.animate_to_position_scale(n, 100.0, 0.0, 1.0, 1_000).unwrap();

        let mut damage = Damage::default();
        root.process_inputs(10_000, &mut damage);
        assert!(root.scheduler().is_alive(id));
        assert_eq!(root.scheduler().start_time(id), Some(10_000));
        assert_eq!(root.scene().transform(n), Some(Affine::IDENTITY));

        root.process_inputs(10_500, &mut damage);
        let mid = root.scene().offset(n).unwrap();
        assert!(mid.x > 0.0 && mid.x < 100.0, "halfway: {mid:?}");

        root.process_inputs(11_000, &mut damage);
        assert_eq!(root.scene().transform(n), Some(Affine::translate((100.0, 0.0))));
        assert!(!root.scheduler().is_alive(id));
    }

    #[test]
    fn removing_a_node_cancels_its_activities() {
        let (mut root, _camera, layer) = with_camera();
        let n = square(&mut root, layer);
        let other = square(&mut root, layer);
        let a = root.animate_to_color(n, Color::RED, 1_000).unwrap();
        let b = root.animate_to_color(other, Color::RED, 1_000).unwrap();

        root.remove_node(n).unwrap();
        assert!(!root.scheduler().is_alive(a));
        assert!(root.scheduler().is_alive(b));
        assert_eq!(root.animate_to_color(n, Color::RED, 1_000), None, "stale node");
    }

    #[test]
    fn damage_is_coalesced_per_camera() {
        let (mut root, camera, layer) = with_camera();
        let a = square(&mut root, layer);
        let b = square(&mut root, layer);
        root.scene_mut().set_offset(a, 100.0, 100.0);
        root.scene_mut().set_offset(b, 200.0, 0.0);

        let mut damage = Damage::default();
        root.process_inputs(0, &mut damage);
        assert_eq!(damage.dirty_rects.len(), 1);
        assert_eq!(damage.dirty_rects[0].camera, camera);
        assert_eq!(damage.dirty_rects[0].rect, Rect::new(0.0, 0.0, 210.0, 110.0));

        let mut again = Damage::default();
        assert_eq!(root.flush_damage(&mut again), 0, "damage is drained once reported");
    }

    #[test]
    fn tick_repaints_damaged_region_only() {
        let (mut root, camera, layer) = with_camera();
        let near = square(&mut root, layer);
        let far = square(&mut root, layer);
        root.scene_mut().set_offset(far, 300.0, 200.0);
        let mut surface = RecordingSurface::new();
        let mut damage = Damage::default();
        root.tick(0, &mut damage, &mut surface);
        surface.clear();

        assert!(root.animate_to_color(near, Color::RED, 100).is_some());
        root.tick(100, &mut Damage::default(), &mut surface);
        surface.clear();
        let mut damage = Damage::default();
        root.tick(200, &mut damage, &mut surface);

        assert_eq!(damage.union_for(camera), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let fills: alloc::vec::Vec<_> = surface
            .commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::FillRect { color, transform, .. } => Some((*color, *transform)),
                _ => None,
            })
            .collect();
        assert_eq!(fills, [(Color::RED, Affine::IDENTITY)], "far square is culled");
        assert!(root.scene().is_alive(far));
    }

    #[test]
    fn pick_through_camera_in_scene_coordinates() {
        let (mut root, camera, layer) = with_camera();
        let n = square(&mut root, layer);
        root.scene_mut().set_offset(camera, 50.0, 50.0);
        root.scene_mut().set_view_transform(camera, Affine::scale(2.0));

        let hit = root.pick(camera, Point::new(60.0, 60.0)).unwrap();
        assert_eq!(hit.node, n);
        assert_eq!(hit.local_point, Point::new(5.0, 5.0));
        assert_eq!(root.pick(camera, Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn view_animation_and_interpolation() {
        let (mut root, camera, layer) = with_camera();
        let anim = Animation::view_transform(camera, Affine::translate((-100.0, 0.0)))
            .with_interpolation(Interpolation::LINEAR);
        root.add_activity(Activity::new(1_000, anim).starting_at(0).with_step_rate(0));

        let mut damage = Damage::default();
        root.process_inputs(0, &mut damage);
        root.process_inputs(250, &mut damage);
        assert_eq!(root.scene().view_transform(camera), Some(Affine::translate((-25.0, 0.0))));
        assert_eq!(root.time_until_next_step(250), Some(0));
        root.process_inputs(1_000, &mut damage);
        assert_eq!(root.time_until_next_step(1_000), None);
        assert!(root.animate_view_to_transform(layer, Affine::IDENTITY, 100).is_none());
    }
}
