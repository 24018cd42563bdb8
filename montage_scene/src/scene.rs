// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: node arena, structure edits, cached full bounds,
//! and damage propagation.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::Cell;
use hashbrown::HashMap;
use kurbo::{Affine, Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::damage::{Damage, DirtyRect};
use crate::error::SceneError;
use crate::kind::{NodeKind, PathData};
use crate::text::{MonospaceMeasure, TextData, TextMeasure};
use crate::transform::{self, transform_rect_bbox};
use crate::types::{Color, LocalNode, NodeFlags, NodeId};

/// The retained node tree.
///
/// Nodes live in a generational arena and are addressed by [`NodeId`]. A root
/// node is created with the scene and can never be removed. Every mutation
/// records damage in the coordinates of the cameras that can see it; drain it
/// with [`Scene::take_damage`].
///
/// Each node caches its full bounds: its own bounds joined with the
/// transformed full bounds of all its children, in its local coordinates. The
/// cache is rebuilt lazily on query.
///
/// Text nodes are sized by the scene's [`TextMeasure`], a
/// [`MonospaceMeasure`] until [`Scene::set_text_measure`] installs the host's.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Affine, Rect};
/// use montage_scene::{LocalNode, Scene};
///
/// let mut scene = Scene::new();
/// let parent = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();
/// let child = scene
///     .insert(
///         Some(parent),
///         LocalNode {
///             bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
///             transform: Affine::translate((50.0, 0.0)),
///             ..LocalNode::default()
///         },
///     )
///     .unwrap();
///
/// assert_eq!(scene.full_bounds(parent), Some(Rect::new(50.0, 0.0, 60.0, 10.0)));
/// scene.set_offset(child, 0.0, 0.0);
/// assert_eq!(scene.full_bounds(parent), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
/// ```
pub struct Scene {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
    /// layer -> cameras viewing it
    viewers: HashMap<NodeId, SmallVec<[NodeId; 2]>>,
    damage: Damage,
    text_measure: Box<dyn TextMeasure>,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("root", &self.root)
            .field("pending_damage", &self.damage.dirty_rects.len())
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct Node {
    generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) local: LocalNode,
    pub(crate) kind: NodeKind,
    full_bounds: Cell<Option<Rect>>,
    user_data: Option<Box<dyn Any>>,
}

impl Node {
    fn new(generation: u32, local: LocalNode, kind: NodeKind) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            kind,
            full_bounds: Cell::new(None),
            user_data: None,
        }
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.local.flags.contains(NodeFlags::VISIBLE)
    }
}

impl Scene {
    /// Create a scene containing only its root node.
    pub fn new() -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 0),
            viewers: HashMap::new(),
            damage: Damage::default(),
            text_measure: Box::new(MonospaceMeasure::default()),
        };
        scene.root = scene.alloc(LocalNode::default(), NodeKind::Root);
        scene
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, local: LocalNode, kind: NodeKind) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local, kind));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new(idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local, kind)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new((self.nodes.len() - 1) as u32, generation)
        }
    }

    // --- structure ---

    /// Insert a plain node under `parent` (or detached if `None`).
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        local: LocalNode,
    ) -> Result<NodeId, SceneError> {
        self.insert_with_kind(parent, local, NodeKind::Plain)
    }

    /// Insert a node of any kind under `parent` (or detached if `None`).
    ///
    /// Path nodes take their bounds from the path and text nodes from their
    /// measured text. Camera data may list layers; they are linked as if
    /// added with [`Scene::add_layer`].
    pub fn insert_with_kind(
        &mut self,
        parent: Option<NodeId>,
        mut local: LocalNode,
        kind: NodeKind,
    ) -> Result<NodeId, SceneError> {
        if let Some(p) = parent
            && !self.is_alive(p)
        {
            return Err(SceneError::StaleNode(p));
        }
        if let NodeKind::Text(text) = &kind {
            local.bounds = layout_text(local.bounds, text, self.text_measure.as_ref());
        }
        if let NodeKind::Path(data) = &kind {
            local.bounds = data.bounds();
        }
        let id = self.alloc(local, kind);
        self.link_view_edges(id);
        if let Some(p) = parent {
            self.attach(p, usize::MAX, id);
        }
        Ok(id)
    }

    /// Insert a text node.
    ///
    /// The bounds origin comes from `local`; the size comes from the
    /// measurement except along fixed axes.
    pub fn insert_text(
        &mut self,
        parent: Option<NodeId>,
        local: LocalNode,
        text: TextData,
    ) -> Result<NodeId, SceneError> {
        self.insert_with_kind(parent, local, NodeKind::Text(text))
    }

    /// Append `child` to the children of `parent`, detaching it from its
    /// current parent first. The local transform is kept.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.insert_child(parent, usize::MAX, child)
    }

    /// Insert `child` at `index` among the children of `parent` (clamped to
    /// the end), detaching it from its current parent first.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), SceneError> {
        self.check_attach(parent, child)?;
        self.detach(child);
        self.attach(parent, index, child);
        Ok(())
    }

    /// Detach `child` from `parent`. The child stays alive as a detached node.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        for id in [parent, child] {
            if !self.is_alive(id) {
                return Err(SceneError::StaleNode(id));
            }
        }
        if self.parent_of(child) != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    /// Move `id` under `new_parent`, or detach it if `None`.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), SceneError> {
        match new_parent {
            Some(p) => self.add_child(p, id),
            None => {
                if id == self.root {
                    return Err(SceneError::RootRemoval);
                }
                if !self.is_alive(id) {
                    return Err(SceneError::StaleNode(id));
                }
                self.detach(id);
                Ok(())
            }
        }
    }

    /// Remove a node and its whole subtree. All their ids become stale.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootRemoval);
        }
        if !self.is_alive(id) {
            return Err(SceneError::StaleNode(id));
        }
        self.detach(id);
        let mut removed = 0_usize;
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            self.unlink_view_edges(n);
            if let Some(node) = self.nodes[n.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(n.idx());
                removed += 1;
            }
        }
        tracing::debug!(?id, removed, "subtree removed");
        Ok(())
    }

    /// Remove every child of `id` (and their subtrees).
    pub fn remove_all_children(&mut self, id: NodeId) -> Result<(), SceneError> {
        if !self.is_alive(id) {
            return Err(SceneError::StaleNode(id));
        }
        for child in self.node(id).children.clone() {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Paint `id` after its siblings.
    pub fn move_to_front(&mut self, id: NodeId) {
        self.restack(id, true);
    }

    /// Paint `id` before its siblings.
    pub fn move_to_back(&mut self, id: NodeId) {
        self.restack(id, false);
    }

    fn restack(&mut self, id: NodeId, front: bool) {
        let Some(parent) = self.parent_of(id) else {
            return;
        };
        let siblings = &mut self.node_mut(parent).children;
        let Some(pos) = siblings.iter().position(|c| *c == id) else {
            return;
        };
        let target = if front { siblings.len() - 1 } else { 0 };
        if pos == target {
            return;
        }
        siblings.remove(pos);
        if front {
            siblings.push(id);
        } else {
            siblings.insert(0, id);
        }
        self.damage_full(id);
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        for id in [parent, child] {
            if !self.is_alive(id) {
                return Err(SceneError::StaleNode(id));
            }
        }
        if child == self.root {
            return Err(SceneError::RootRemoval);
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let siblings = &mut self.node_mut(parent).children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        self.invalidate_full_bounds(parent);
        self.damage_full(child);
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent_of(child) else {
            return;
        };
        self.damage_full(child);
        self.node_mut(parent).children.retain(|c| *c != child);
        self.node_mut(child).parent = None;
        self.invalidate_full_bounds(parent);
    }

    // --- geometry setters ---

    /// Update local bounds.
    ///
    /// Text nodes keep `bounds` only along fixed axes and re-measure the rest.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        let bounds = match &n.kind {
            NodeKind::Text(text) => layout_text(bounds, text, self.text_measure.as_ref()),
            _ => bounds,
        };
        let old = n.local.bounds;
        if old == bounds {
            return;
        }
        self.damage_rect(id, old);
        self.node_mut(id).local.bounds = bounds;
        self.invalidate_full_bounds(id);
        self.damage_rect(id, bounds);
    }

    /// Update local bounds from origin and size.
    pub fn set_bounds_xywh(&mut self, id: NodeId, x: f64, y: f64, w: f64, h: f64) {
        self.set_bounds(id, Rect::new(x, y, x + w, y + h));
    }

    /// Update the local transform.
    pub fn set_transform(&mut self, id: NodeId, tf: Affine) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        if n.local.transform == tf {
            return;
        }
        self.damage_full(id);
        self.node_mut(id).local.transform = tf;
        if let Some(parent) = self.parent_of(id) {
            self.invalidate_full_bounds(parent);
        }
        self.damage_full(id);
    }

    /// Replace the translation of the local transform.
    pub fn set_offset(&mut self, id: NodeId, x: f64, y: f64) {
        if let Some(tf) = self.transform(id) {
            self.set_transform(id, transform::with_offset(tf, x, y));
        }
    }

    /// Translate by `(dx, dy)` in parent coordinates.
    pub fn offset_by(&mut self, id: NodeId, dx: f64, dy: f64) {
        if let Some(tf) = self.transform(id) {
            self.set_transform(id, Affine::translate((dx, dy)) * tf);
        }
    }

    /// Scale about the local origin.
    pub fn scale_by(&mut self, id: NodeId, s: f64) {
        if let Some(tf) = self.transform(id) {
            self.set_transform(id, tf * Affine::scale(s));
        }
    }

    /// Scale about `point`, given in local coordinates.
    pub fn scale_about_point(&mut self, id: NodeId, s: f64, point: Point) {
        if let Some(tf) = self.transform(id) {
            let v = point.to_vec2();
            let about = Affine::translate(v) * Affine::scale(s) * Affine::translate(-v);
            self.set_transform(id, tf * about);
        }
    }

    /// Rotate about the local origin by `theta` radians.
    pub fn rotate_by(&mut self, id: NodeId, theta: f64) {
        if let Some(tf) = self.transform(id) {
            self.set_transform(id, tf * Affine::rotate(theta));
        }
    }

    /// Replace the uniform scale, keeping offset and rotation.
    pub fn set_scale(&mut self, id: NodeId, s: f64) {
        if let Some(tf) = self.transform(id) {
            self.set_transform(id, transform::with_scale(tf, s));
        }
    }

    /// Replace the rotation, keeping offset and scale.
    pub fn set_rotation(&mut self, id: NodeId, theta: f64) {
        if let Some(tf) = self.transform(id) {
            self.set_transform(id, transform::with_rotation(tf, theta));
        }
    }

    // --- appearance ---

    /// Update node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        if n.local.flags == flags {
            return;
        }
        // One of these is dropped: invisible nodes report no damage.
        self.damage_full(id);
        self.node_mut(id).local.flags = flags;
        self.damage_full(id);
    }

    /// Show or hide a node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.update_flag(id, NodeFlags::VISIBLE, visible);
    }

    /// Allow or prevent picking the node itself.
    pub fn set_pickable(&mut self, id: NodeId, pickable: bool) {
        self.update_flag(id, NodeFlags::PICKABLE, pickable);
    }

    /// Allow or prevent picking the node's children.
    pub fn set_children_pickable(&mut self, id: NodeId, pickable: bool) {
        self.update_flag(id, NodeFlags::CHILDREN_PICKABLE, pickable);
    }

    fn update_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool) {
        if let Some(mut flags) = self.flags(id) {
            flags.set(flag, on);
            self.set_flags(id, flags);
        }
    }

    /// Update the fill color.
    pub fn set_fill(&mut self, id: NodeId, fill: Option<Color>) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        if n.local.fill == fill {
            return;
        }
        let bounds = n.local.bounds;
        self.node_mut(id).local.fill = fill;
        self.damage_rect(id, bounds);
    }

    /// Update the subtree opacity (clamped to `[0, 1]`).
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        let Some(n) = self.node_opt(id) else {
            return;
        };
        if n.local.opacity == opacity {
            return;
        }
        self.node_mut(id).local.opacity = opacity;
        self.damage_full(id);
    }

    /// Replace the node kind. Path nodes take their bounds from the path.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        if !self.is_alive(id) {
            return;
        }
        let new_bounds = match &kind {
            NodeKind::Path(data) => Some(data.bounds()),
            NodeKind::Text(_) => Some(self.node(id).local.bounds),
            _ => None,
        };
        let old_bounds = self.node(id).local.bounds;
        self.damage_rect(id, old_bounds);
        self.unlink_view_edges(id);
        self.node_mut(id).kind = kind;
        self.link_view_edges(id);
        if let Some(bounds) = new_bounds {
            self.set_bounds(id, bounds);
        }
        let bounds = self.node(id).local.bounds;
        self.damage_rect(id, bounds);
    }

    /// Replace the geometry of a node with a path.
    pub fn set_path(&mut self, id: NodeId, path: PathData) {
        self.set_kind(id, NodeKind::Path(path));
    }

    /// Replace the text of a node and re-measure it.
    pub fn set_text(&mut self, id: NodeId, text: TextData) {
        self.set_kind(id, NodeKind::Text(text));
    }

    /// Re-measure a text node.
    pub fn relayout_text(&mut self, id: NodeId) {
        if let Some(n) = self.node_opt(id)
            && matches!(n.kind, NodeKind::Text(_))
        {
            let bounds = n.local.bounds;
            self.set_bounds(id, bounds);
        }
    }

    /// Install the measurement used to size text nodes and re-measure every
    /// live text node with it.
    pub fn set_text_measure(&mut self, measure: impl TextMeasure + 'static) {
        self.text_measure = Box::new(measure);
        let text_nodes: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let n = slot.as_ref()?;
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "NodeId uses 32-bit indices by design."
                )]
                let id = NodeId::new(idx as u32, n.generation);
                matches!(n.kind, NodeKind::Text(_)).then_some(id)
            })
            .collect();
        for id in text_nodes {
            self.relayout_text(id);
        }
    }

    /// Attach arbitrary data to a node, replacing any previous value.
    pub fn set_user_data(&mut self, id: NodeId, data: Box<dyn Any>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.user_data = Some(data);
        }
    }

    /// Data attached with [`Scene::set_user_data`].
    pub fn user_data(&self, id: NodeId) -> Option<&dyn Any> {
        self.node_opt(id)?.user_data.as_deref()
    }

    /// Detach and return the node's user data.
    pub fn take_user_data(&mut self, id: NodeId) -> Option<Box<dyn Any>> {
        self.node_opt_mut(id)?.user_data.take()
    }

    // --- cameras and layers ---

    /// Make `camera` look at `layer`, in front of the layers it already shows.
    pub fn add_layer(&mut self, camera: NodeId, layer: NodeId) -> Result<(), SceneError> {
        self.check_camera_layer(camera, layer)?;
        let Some(data) = self.node_mut(camera).kind.as_camera_mut() else {
            return Err(SceneError::NotACamera(camera));
        };
        if data.layers.contains(&layer) {
            return Ok(());
        }
        data.layers.push(layer);
        self.viewers.entry(layer).or_default().push(camera);
        self.damage_camera_view(camera);
        Ok(())
    }

    /// Stop `camera` from looking at `layer`.
    pub fn remove_layer(&mut self, camera: NodeId, layer: NodeId) -> Result<(), SceneError> {
        self.check_camera_layer(camera, layer)?;
        let Some(data) = self.node_mut(camera).kind.as_camera_mut() else {
            return Err(SceneError::NotACamera(camera));
        };
        let before = data.layers.len();
        data.layers.retain(|l| *l != layer);
        if data.layers.len() == before {
            return Ok(());
        }
        self.drop_viewer(layer, camera);
        self.damage_camera_view(camera);
        Ok(())
    }

    fn check_camera_layer(&self, camera: NodeId, layer: NodeId) -> Result<(), SceneError> {
        for id in [camera, layer] {
            if !self.is_alive(id) {
                return Err(SceneError::StaleNode(id));
            }
        }
        if self.node(camera).kind.as_camera().is_none() {
            return Err(SceneError::NotACamera(camera));
        }
        if !self.node(layer).kind.is_layer() {
            return Err(SceneError::NotALayer(layer));
        }
        Ok(())
    }

    /// Layers viewed by `camera`, back to front; empty for non-cameras.
    pub fn layers_of(&self, camera: NodeId) -> &[NodeId] {
        self.node_opt(camera)
            .and_then(|n| n.kind.as_camera())
            .map_or(&[], |c| c.layers.as_slice())
    }

    /// Cameras viewing `layer`.
    pub fn cameras_of(&self, layer: NodeId) -> &[NodeId] {
        if !self.is_alive(layer) {
            return &[];
        }
        self.viewers.get(&layer).map_or(&[], |v| v.as_slice())
    }

    /// Update the transform from layer space into the camera's local space.
    pub fn set_view_transform(&mut self, camera: NodeId, view: Affine) {
        let Some(data) = self.node_opt_mut(camera).and_then(|n| n.kind.as_camera_mut()) else {
            return;
        };
        if data.view_transform == view {
            return;
        }
        data.view_transform = view;
        self.damage_camera_view(camera);
    }

    /// The camera's view transform, or `None` for non-cameras.
    pub fn view_transform(&self, camera: NodeId) -> Option<Affine> {
        Some(self.node_opt(camera)?.kind.as_camera()?.view_transform)
    }

    /// The region of layer space the camera shows: its bounds mapped through
    /// the inverse view transform.
    pub fn view_bounds(&self, camera: NodeId) -> Option<Rect> {
        let node = self.node_opt(camera)?;
        let inv = transform::try_inverse(node.kind.as_camera()?.view_transform)?;
        Some(transform_rect_bbox(inv, node.local.bounds))
    }

    fn damage_camera_view(&mut self, camera: NodeId) {
        let bounds = self.node(camera).local.bounds;
        self.damage_rect(camera, bounds);
    }

    fn drop_viewer(&mut self, layer: NodeId, camera: NodeId) {
        if let Some(cams) = self.viewers.get_mut(&layer) {
            cams.retain(|c| *c != camera);
            if cams.is_empty() {
                self.viewers.remove(&layer);
            }
        }
    }

    /// Register `id` with the layers it views, if it is a camera.
    fn link_view_edges(&mut self, id: NodeId) {
        let Some(data) = self.node_opt_mut(id).and_then(|n| n.kind.as_camera_mut()) else {
            return;
        };
        let layers = core::mem::take(&mut data.layers);
        let mut kept = Vec::with_capacity(layers.len());
        for layer in layers {
            let ok = layer != id
                && !kept.contains(&layer)
                && self.node_opt(layer).is_some_and(|n| n.kind.is_layer());
            if ok {
                kept.push(layer);
                self.viewers.entry(layer).or_default().push(id);
            } else {
                tracing::warn!(camera = ?id, ?layer, "skipping non-layer camera entry");
            }
        }
        if let Some(data) = self.node_mut(id).kind.as_camera_mut() {
            data.layers = kept;
        }
    }

    /// Forget every camera/layer edge that involves `id`.
    fn unlink_view_edges(&mut self, id: NodeId) {
        let layers = match self.node_opt(id).map(|n| &n.kind) {
            Some(NodeKind::Camera(data)) => data.layers.clone(),
            Some(NodeKind::Layer) => {
                for camera in self.viewers.remove(&id).unwrap_or_default() {
                    if let Some(data) =
                        self.node_opt_mut(camera).and_then(|n| n.kind.as_camera_mut())
                    {
                        data.layers.retain(|l| *l != id);
                    }
                    if self.is_alive(camera) {
                        self.damage_camera_view(camera);
                    }
                }
                return;
            }
            _ => return,
        };
        for layer in layers {
            self.drop_viewer(layer, id);
        }
    }

    // --- queries ---

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is live if its slot exists and its generation matches the
    /// generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Local bounds.
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.local.bounds)
    }

    /// Local transform.
    pub fn transform(&self, id: NodeId) -> Option<Affine> {
        self.node_opt(id).map(|n| n.local.transform)
    }

    /// Translation of the local transform.
    pub fn offset(&self, id: NodeId) -> Option<Vec2> {
        self.transform(id).map(transform::offset)
    }

    /// Flags.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.local.flags)
    }

    /// Fill color.
    pub fn fill(&self, id: NodeId) -> Option<Color> {
        self.node_opt(id)?.local.fill
    }

    /// Opacity.
    pub fn opacity(&self, id: NodeId) -> Option<f32> {
        self.node_opt(id).map(|n| n.local.opacity)
    }

    /// All local data.
    pub fn local(&self, id: NodeId) -> Option<&LocalNode> {
        self.node_opt(id).map(|n| &n.local)
    }

    /// Node kind.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node_opt(id).map(|n| &n.kind)
    }

    /// Bounds of the node and its whole subtree, in local coordinates.
    pub fn full_bounds(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| self.compute_full_bounds(n))
    }

    /// Full bounds mapped into the parent's coordinates.
    pub fn full_bounds_in_parent(&self, id: NodeId) -> Option<Rect> {
        let n = self.node_opt(id)?;
        Some(transform_rect_bbox(n.local.transform, self.compute_full_bounds(n)))
    }

    /// Transform from local coordinates to scene coordinates (the root's
    /// parent space).
    pub fn global_transform(&self, id: NodeId) -> Option<Affine> {
        let mut n = self.node_opt(id)?;
        let mut tf = n.local.transform;
        while let Some(parent) = n.parent.and_then(|p| self.node_opt(p)) {
            tf = parent.local.transform * tf;
            n = parent;
        }
        Some(tf)
    }

    /// Full bounds in scene coordinates.
    pub fn global_full_bounds(&self, id: NodeId) -> Option<Rect> {
        let tf = self.global_transform(id)?;
        Some(transform_rect_bbox(tf, self.full_bounds(id)?))
    }

    /// Map a local point into scene coordinates.
    pub fn local_to_global(&self, id: NodeId, point: Point) -> Option<Point> {
        Some(self.global_transform(id)? * point)
    }

    /// Map a scene point into local coordinates. `None` when a transform on
    /// the path is singular.
    pub fn global_to_local(&self, id: NodeId, point: Point) -> Option<Point> {
        Some(transform::try_inverse(self.global_transform(id)?)? * point)
    }

    /// Returns the parent of a node if live, or `None` for detached nodes,
    /// the root, or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id)?.parent
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Returns true if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent_of(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent_of(p);
        }
        false
    }

    /// Get the next node in depth-first (paint) order.
    ///
    /// Returns `None` at the end of the tree or if the current node is stale.
    pub fn next_depth_first(&self, current: NodeId) -> Option<NodeId> {
        let node = self.node_opt(current)?;
        if let Some(&first) = node.children.first() {
            return Some(first);
        }
        let mut id = current;
        while let Some(parent) = self.parent_of(id) {
            if let Some(next) = self.sibling(id, 1) {
                return Some(next);
            }
            id = parent;
        }
        None
    }

    /// Get the previous node in depth-first order.
    ///
    /// Returns `None` at the start of the tree or if the current node is stale.
    pub fn prev_depth_first(&self, current: NodeId) -> Option<NodeId> {
        self.node_opt(current)?;
        let Some(mut id) = self.sibling(current, -1) else {
            return self.parent_of(current);
        };
        while let Some(&last) = self.children_of(id).last() {
            id = last;
        }
        Some(id)
    }

    fn sibling(&self, id: NodeId, step: isize) -> Option<NodeId> {
        let siblings = self.children_of(self.parent_of(id)?);
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings.get(pos.checked_add_signed(step)?).copied()
    }

    // --- damage ---

    /// Report that `rect` (local coordinates of `id`) must be repainted.
    ///
    /// The rectangle is mapped up the tree and through every camera that
    /// shows it. Damage from invisible subtrees and from nodes no camera can
    /// see is dropped.
    pub fn damage_rect(&mut self, id: NodeId, rect: Rect) {
        let mut out = core::mem::take(&mut self.damage.dirty_rects);
        let mut path = SmallVec::<[NodeId; 4]>::new();
        self.collect_damage(id, rect, &mut path, &mut out);
        self.damage.dirty_rects = out;
    }

    /// Report that everything `id` and its subtree paint must be repainted.
    pub fn invalidate_paint(&mut self, id: NodeId) {
        self.damage_full(id);
    }

    fn damage_full(&mut self, id: NodeId) {
        if let Some(bounds) = self.full_bounds(id) {
            self.damage_rect(id, bounds);
        }
    }

    /// Damage accumulated since the last [`Scene::take_damage`].
    pub fn damage(&self) -> &Damage {
        &self.damage
    }

    /// Drain the accumulated damage.
    pub fn take_damage(&mut self) -> Damage {
        core::mem::take(&mut self.damage)
    }

    /// Walk from `id` to the root, recording a dirty rect at each camera and
    /// forwarding through each layer to the cameras viewing it.
    ///
    /// `cameras` holds the cameras on the current forwarding path so a camera
    /// placed inside a layer it views cannot loop forever.
    fn collect_damage(
        &self,
        id: NodeId,
        rect: Rect,
        cameras: &mut SmallVec<[NodeId; 4]>,
        out: &mut Vec<DirtyRect>,
    ) {
        let mark = cameras.len();
        let mut current = id;
        let mut rect = rect;
        while !transform::is_empty(rect) {
            let Some(node) = self.node_opt(current) else {
                break;
            };
            if !node.is_visible() {
                break;
            }
            if node.kind.as_camera().is_some() {
                if cameras.contains(&current) {
                    break;
                }
                cameras.push(current);
                if let Some(global) = self.global_transform(current) {
                    out.push(DirtyRect {
                        camera: current,
                        rect: transform_rect_bbox(global, rect),
                    });
                }
            }
            let in_parent = transform_rect_bbox(node.local.transform, rect);
            if node.kind.is_layer()
                && let Some(viewers) = self.viewers.get(&current)
            {
                for &camera in viewers {
                    let Some(cam) = self.node_opt(camera) else {
                        continue;
                    };
                    let Some(data) = cam.kind.as_camera() else {
                        continue;
                    };
                    let seen = transform_rect_bbox(data.view_transform, in_parent)
                        .intersect(cam.local.bounds);
                    self.collect_damage(camera, seen, cameras, out);
                }
            }
            let Some(parent) = node.parent else {
                break;
            };
            current = parent;
            rect = in_parent;
        }
        cameras.truncate(mark);
    }

    // --- full bounds cache ---

    fn compute_full_bounds(&self, node: &Node) -> Rect {
        if let Some(r) = node.full_bounds.get() {
            return r;
        }
        let mut full = node.local.bounds;
        for child in node.children.iter().filter_map(|c| self.node_opt(*c)) {
            let child_full = self.compute_full_bounds(child);
            if !transform::is_empty(child_full) {
                full = transform::union_nonempty(
                    full,
                    transform_rect_bbox(child.local.transform, child_full),
                );
            }
        }
        node.full_bounds.set(Some(full));
        full
    }

    /// Drop the cached full bounds of `id` and of its ancestors.
    ///
    /// A valid cache implies valid caches below it, so the walk stops at the
    /// first ancestor that is already invalid.
    fn invalidate_full_bounds(&self, id: NodeId) {
        let Some(node) = self.node_opt(id) else {
            return;
        };
        node.full_bounds.set(None);
        let mut current = node.parent;
        while let Some(n) = current.and_then(|p| self.node_opt(p)) {
            if n.full_bounds.take().is_none() {
                break;
            }
            current = n.parent;
        }
    }

    // --- internals ---

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())?
            .as_ref()
            .filter(|n| n.generation == id.1)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())?
            .as_mut()
            .filter(|n| n.generation == id.1)
    }

    /// Access a live node; panics if `id` is stale. Only called after a liveness check.
    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }
}

/// New bounds for a text node: origin from `bounds`, size measured except
/// along fixed axes.
fn layout_text(bounds: Rect, text: &TextData, measure: &dyn TextMeasure) -> Rect {
    let max_width = text.fixed_width.then_some(bounds.width());
    let size = measure.measure(&text.text, text.font_size, max_width);
    let w = if text.fixed_width { bounds.width() } else { size.width };
    let h = if text.fixed_height { bounds.height() } else { size.height };
    Rect::from_origin_size(bounds.origin(), (w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::CameraData;

    fn boxed(x: f64, y: f64, w: f64, h: f64) -> LocalNode {
        LocalNode {
            bounds: Rect::new(x, y, x + w, y + h),
            ..LocalNode::default()
        }
    }

    /// Root -> camera (0,0,200,200) viewing a layer under root.
    fn viewed_scene() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let root = scene.root();
        let layer = scene
            .insert_with_kind(Some(root), LocalNode::default(), NodeKind::Layer)
            .unwrap();
        let camera = scene
            .insert_with_kind(
                Some(root),
                boxed(0.0, 0.0, 200.0, 200.0),
                NodeKind::Camera(CameraData::default()),
            )
            .unwrap();
        scene.add_layer(camera, layer).unwrap();
        let _ = scene.take_damage();
        (scene, camera, layer)
    }

    #[test]
    fn full_bounds_union_law() {
        let mut scene = Scene::new();
        let a = scene.insert(Some(scene.root()), boxed(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = scene.insert(Some(a), boxed(0.0, 0.0, 5.0, 5.0)).unwrap();
        let c = scene.insert(Some(b), boxed(0.0, 0.0, 5.0, 5.0)).unwrap();
        scene.set_transform(b, Affine::translate((20.0, 0.0)));
        scene.set_transform(c, Affine::translate((0.0, 30.0)) * Affine::scale(2.0));

        assert_eq!(scene.full_bounds(c), Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
        assert_eq!(scene.full_bounds(b), Some(Rect::new(0.0, 0.0, 10.0, 40.0)));
        assert_eq!(scene.full_bounds(a), Some(Rect::new(0.0, 0.0, 30.0, 40.0)));

        // Changing a leaf invalidates every ancestor.
        scene.set_bounds(c, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(scene.full_bounds(b), Some(Rect::new(0.0, 0.0, 5.0, 32.0)));
        assert_eq!(scene.full_bounds(a), Some(Rect::new(0.0, 0.0, 25.0, 32.0)));

        scene.remove(c).unwrap();
        assert_eq!(scene.full_bounds(a), Some(Rect::new(0.0, 0.0, 25.0, 10.0)));
    }

    #[test]
    fn empty_bounds_do_not_stretch_full_bounds() {
        let mut scene = Scene::new();
        let group = scene.insert(None, LocalNode::default()).unwrap();
        let leaf = scene.insert(Some(group), boxed(50.0, 50.0, 10.0, 10.0)).unwrap();
        assert_eq!(scene.full_bounds(group), Some(Rect::new(50.0, 50.0, 60.0, 60.0)));
        scene.set_bounds(leaf, Rect::ZERO);
        assert!(scene.full_bounds(group).unwrap().is_zero_area());
    }

    #[test]
    fn structural_errors() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.insert(Some(root), LocalNode::default()).unwrap();
        let b = scene.insert(Some(a), LocalNode::default()).unwrap();

        assert_eq!(scene.add_child(b, a), Err(SceneError::Cycle { parent: b, child: a }));
        assert_eq!(scene.add_child(a, a), Err(SceneError::Cycle { parent: a, child: a }));
        assert_eq!(scene.add_child(a, root), Err(SceneError::RootRemoval));
        assert_eq!(scene.remove(root), Err(SceneError::RootRemoval));
        assert_eq!(
            scene.remove_child(root, b),
            Err(SceneError::NotAChild { parent: root, child: b })
        );

        scene.remove(a).unwrap();
        assert!(!scene.is_alive(b), "subtree removed with its parent");
        assert_eq!(scene.remove(a), Err(SceneError::StaleNode(a)));
        assert_eq!(
            scene.insert(Some(a), LocalNode::default()),
            Err(SceneError::StaleNode(a))
        );
    }

    #[test]
    fn reparent_keeps_local_transform() {
        let mut scene = Scene::new();
        let root = scene.root();
        let p1 = scene.insert(Some(root), LocalNode::default()).unwrap();
        let p2 = scene.insert(Some(root), LocalNode::default()).unwrap();
        let child = scene.insert(Some(p1), boxed(0.0, 0.0, 4.0, 4.0)).unwrap();
        scene.set_offset(child, 7.0, 3.0);

        scene.add_child(p2, child).unwrap();
        assert_eq!(scene.parent_of(child), Some(p2));
        assert!(scene.children_of(p1).is_empty());
        assert_eq!(scene.offset(child), Some(Vec2::new(7.0, 3.0)));
        assert_eq!(scene.full_bounds(p1), Some(Rect::ZERO));
        assert_eq!(scene.full_bounds(p2), Some(Rect::new(7.0, 3.0, 11.0, 7.0)));

        scene.reparent(child, None).unwrap();
        assert_eq!(scene.parent_of(child), None);
        assert!(scene.is_alive(child), "detached nodes stay alive");
    }

    #[test]
    fn child_order_and_restacking() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.insert(Some(root), LocalNode::default()).unwrap();
        let b = scene.insert(Some(root), LocalNode::default()).unwrap();
        let c = scene.insert(None, LocalNode::default()).unwrap();
        scene.insert_child(root, 1, c).unwrap();
        assert_eq!(scene.children_of(root), &[a, c, b]);

        scene.move_to_front(a);
        assert_eq!(scene.children_of(root), &[c, b, a]);
        scene.move_to_back(b);
        assert_eq!(scene.children_of(root), &[b, c, a]);

        scene.remove_all_children(root).unwrap();
        assert!(scene.children_of(root).is_empty());
        assert!(!scene.is_alive(a) && !scene.is_alive(b) && !scene.is_alive(c));
    }

    #[test]
    fn liveness_insert_remove_reuse() {
        let mut scene = Scene::new();
        let a = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();
        scene.remove(a).unwrap();
        let b = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();
        assert_eq!(a.0, b.0, "slot is reused");
        assert!(b.1 > a.1, "generation increases");
        assert!(!scene.is_alive(a));
        assert!(scene.is_alive(b));
        // Setters on stale ids are no-ops.
        scene.set_bounds(a, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(scene.bounds(b), Some(Rect::ZERO));
    }

    #[test]
    fn transform_setters() {
        let mut scene = Scene::new();
        let n = scene.insert(Some(scene.root()), boxed(0.0, 0.0, 10.0, 10.0)).unwrap();
        scene.set_offset(n, 10.0, 20.0);
        scene.scale_by(n, 2.0);
        assert_eq!(
            scene.transform(n),
            Some(Affine::translate((10.0, 20.0)) * Affine::scale(2.0))
        );
        scene.offset_by(n, 5.0, 0.0);
        assert_eq!(scene.offset(n), Some(Vec2::new(15.0, 20.0)));

        scene.set_transform(n, Affine::IDENTITY);
        scene.scale_about_point(n, 2.0, Point::new(5.0, 5.0));
        assert_eq!(scene.local_to_global(n, Point::new(5.0, 5.0)), Some(Point::new(5.0, 5.0)));
        assert_eq!(scene.full_bounds_in_parent(n), Some(Rect::new(-5.0, -5.0, 15.0, 15.0)));

        scene.set_scale(n, 0.0);
        assert_eq!(scene.global_to_local(n, Point::new(1.0, 1.0)), None, "singular");
    }

    #[test]
    fn global_coordinates_compose_ancestors() {
        let mut scene = Scene::new();
        let a = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();
        let b = scene.insert(Some(a), boxed(0.0, 0.0, 10.0, 10.0)).unwrap();
        scene.set_transform(a, Affine::translate((100.0, 0.0)));
        scene.set_transform(b, Affine::scale(2.0));
        assert_eq!(scene.local_to_global(b, Point::new(1.0, 1.0)), Some(Point::new(102.0, 2.0)));
        assert_eq!(scene.global_to_local(b, Point::new(102.0, 2.0)), Some(Point::new(1.0, 1.0)));
        assert_eq!(scene.global_full_bounds(b), Some(Rect::new(100.0, 0.0, 120.0, 20.0)));
        assert!(scene.is_ancestor_of(scene.root(), b));
        assert!(!scene.is_ancestor_of(b, a));
    }

    #[test]
    fn damage_flows_through_layer_and_camera() {
        let (mut scene, camera, layer) = viewed_scene();
        scene.set_view_transform(camera, Affine::translate((10.0, 10.0)));
        let _ = scene.take_damage();

        let n = scene.insert(Some(layer), boxed(0.0, 0.0, 20.0, 20.0)).unwrap();
        let damage = scene.take_damage();
        assert_eq!(
            damage.dirty_rects,
            alloc::vec![DirtyRect {
                camera,
                rect: Rect::new(10.0, 10.0, 30.0, 30.0)
            }]
        );

        // Offset: old and new positions are both damaged.
        scene.set_offset(n, 100.0, 0.0);
        let damage = scene.take_damage();
        assert_eq!(damage.union_for(camera), Some(Rect::new(10.0, 10.0, 130.0, 30.0)));

        // Outside the camera bounds nothing is reported.
        scene.set_offset(n, 1_000.0, 0.0);
        let damage = scene.take_damage();
        assert_eq!(damage.union_for(camera), Some(Rect::new(110.0, 10.0, 130.0, 30.0)));
    }

    #[test]
    fn invisible_and_unviewed_nodes_report_no_damage() {
        let (mut scene, _camera, layer) = viewed_scene();
        let n = scene.insert(Some(layer), boxed(0.0, 0.0, 20.0, 20.0)).unwrap();
        scene.set_visible(n, false);
        let _ = scene.take_damage();
        scene.set_bounds(n, Rect::new(0.0, 0.0, 50.0, 50.0));
        assert!(scene.take_damage().is_empty(), "hidden node");

        let detached = scene.insert(None, boxed(0.0, 0.0, 5.0, 5.0)).unwrap();
        scene.set_fill(detached, Some(Color::RED));
        assert!(scene.take_damage().is_empty(), "no camera sees it");
    }

    #[test]
    fn camera_inside_its_own_layer_terminates() {
        let (mut scene, camera, layer) = viewed_scene();
        scene.add_child(layer, camera).unwrap();
        let _ = scene.take_damage();
        let n = scene.insert(Some(layer), boxed(0.0, 0.0, 20.0, 20.0)).unwrap();
        let damage = scene.take_damage();
        assert_eq!(damage.coalesce().len(), 1);
        assert_eq!(damage.union_for(camera), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
        assert!(scene.is_alive(n));
    }

    #[test]
    fn camera_layer_bookkeeping() {
        let (mut scene, camera, layer) = viewed_scene();
        let plain = scene.insert(Some(scene.root()), LocalNode::default()).unwrap();
        assert_eq!(scene.add_layer(camera, plain), Err(SceneError::NotALayer(plain)));
        assert_eq!(scene.add_layer(plain, layer), Err(SceneError::NotACamera(plain)));
        assert_eq!(scene.layers_of(camera), &[layer]);
        assert_eq!(scene.cameras_of(layer), &[camera]);

        scene.add_layer(camera, layer).unwrap();
        assert_eq!(scene.layers_of(camera).len(), 1, "adding twice is a no-op");

        scene.remove(layer).unwrap();
        assert!(scene.layers_of(camera).is_empty(), "removed layers leave their cameras");

        let layer2 = scene
            .insert_with_kind(Some(scene.root()), LocalNode::default(), NodeKind::Layer)
            .unwrap();
        scene.add_layer(camera, layer2).unwrap();
        scene.remove(camera).unwrap();
        assert!(scene.cameras_of(layer2).is_empty());
    }

    #[test]
    fn view_bounds_inverts_view_transform() {
        let (mut scene, camera, _layer) = viewed_scene();
        scene.set_view_transform(camera, Affine::scale(2.0));
        assert_eq!(scene.view_bounds(camera), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(scene.view_transform(camera), Some(Affine::scale(2.0)));
        assert_eq!(scene.view_transform(scene.root()), None);
    }

    #[test]
    fn text_nodes_follow_measurement() {
        let mut scene = Scene::new();
        let t = scene
            .insert_text(
                Some(scene.root()),
                boxed(5.0, 5.0, 0.0, 0.0),
                TextData::new("abcd", 10.0),
            )
            .unwrap();
        assert_eq!(scene.bounds(t), Some(Rect::new(5.0, 5.0, 29.0, 17.0)));

        scene.set_text(t, TextData::new("ab", 10.0));
        assert_eq!(scene.bounds(t), Some(Rect::new(5.0, 5.0, 17.0, 17.0)));
        assert_eq!(scene.kind(t).and_then(NodeKind::as_text).map(|d| d.text.as_str()), Some("ab"));

        scene.set_text_measure(MonospaceMeasure {
            advance: 1.0,
            line_height: 2.0,
        });
        assert_eq!(scene.bounds(t), Some(Rect::new(5.0, 5.0, 25.0, 25.0)));
    }

    #[test]
    fn set_bounds_re_measures_text() {
        let mut scene = Scene::new();
        let top = scene.root();
        let free = scene
            .insert_text(Some(top), LocalNode::default(), TextData::new("abcd", 10.0))
            .unwrap();
        scene.set_bounds(free, Rect::new(10.0, 10.0, 500.0, 500.0));
        assert_eq!(scene.bounds(free), Some(Rect::new(10.0, 10.0, 34.0, 22.0)));

        // Fixed width wraps "abcd" into two lines of two columns.
        let wrapped = scene
            .insert_text(
                Some(top),
                LocalNode::default(),
                TextData::new("abcd", 10.0).with_fixed_width(),
            )
            .unwrap();
        scene.set_bounds(wrapped, Rect::new(0.0, 0.0, 12.0, 1.0));
        assert_eq!(scene.bounds(wrapped), Some(Rect::new(0.0, 0.0, 12.0, 24.0)));

        let boxed_in = scene
            .insert_text(
                Some(top),
                LocalNode::default(),
                TextData::new("abcd", 10.0).with_fixed_width().with_fixed_height(),
            )
            .unwrap();
        scene.set_bounds(boxed_in, Rect::new(0.0, 0.0, 12.0, 1.0));
        assert_eq!(scene.bounds(boxed_in), Some(Rect::new(0.0, 0.0, 12.0, 1.0)));
    }

    #[test]
    fn user_data_round_trip() {
        let mut scene = Scene::new();
        let n = scene.insert(None, LocalNode::default()).unwrap();
        scene.set_user_data(n, Box::new(42_u32));
        assert_eq!(scene.user_data(n).and_then(|d| d.downcast_ref::<u32>()), Some(&42));
        assert!(scene.take_user_data(n).is_some());
        assert!(scene.user_data(n).is_none());
    }

    #[test]
    fn depth_first_traversal() {
        let mut scene = Scene::new();
        let root = scene.root();
        // root -> [a -> [c, d], b]
        let a = scene.insert(Some(root), LocalNode::default()).unwrap();
        let b = scene.insert(Some(root), LocalNode::default()).unwrap();
        let c = scene.insert(Some(a), LocalNode::default()).unwrap();
        let d = scene.insert(Some(a), LocalNode::default()).unwrap();

        let mut forward = alloc::vec![root];
        while let Some(next) = scene.next_depth_first(*forward.last().unwrap()) {
            forward.push(next);
        }
        assert_eq!(forward, [root, a, c, d, b]);

        let mut backward = alloc::vec![b];
        while let Some(prev) = scene.prev_depth_first(*backward.last().unwrap()) {
            backward.push(prev);
        }
        assert_eq!(backward, [b, d, c, a, root]);

        scene.remove(d).unwrap();
        assert!(scene.next_depth_first(d).is_none(), "stale ids have no successor");
    }
}
