// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picking: finding the frontmost node under a point.

use alloc::vec::Vec;
use kurbo::Point;
use smallvec::SmallVec;

use crate::kind::NodeKind;
use crate::scene::Scene;
use crate::transform;
use crate::types::{NodeFlags, NodeId};

/// Results of a pick.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    /// The matched node.
    pub node: NodeId,
    /// Path from the node the pick started at down to the matched node
    /// (inclusive). Layers entered through a camera appear after the camera.
    pub path: Vec<NodeId>,
    /// The query point in the matched node's local coordinates.
    pub local_point: Point,
}

impl Scene {
    /// Find the frontmost node under `point`, starting at `id`.
    ///
    /// `point` is in the parent space of `id`. Within a node, children are
    /// tested front to back first, then (for cameras, when the point is inside
    /// the camera bounds) the viewed layers front to back through the inverse
    /// view transform, then the node itself. The first hit wins.
    ///
    /// - Invisible nodes and their subtrees never match.
    /// - `PICKABLE` controls whether the node itself can match.
    /// - `CHILDREN_PICKABLE` controls whether its children and layers are tested.
    /// - Nodes with a singular transform are skipped.
    /// - A camera reached again through one of its own layers does not look
    ///   into its layers a second time.
    pub fn pick(&self, id: NodeId, point: Point) -> Option<Hit> {
        let mut path = Vec::new();
        let mut cameras = SmallVec::new();
        let (node, local_point) = self.pick_node(id, point, &mut path, &mut cameras)?;
        Some(Hit {
            node,
            path,
            local_point,
        })
    }

    fn pick_node(
        &self,
        id: NodeId,
        point: Point,
        path: &mut Vec<NodeId>,
        cameras: &mut SmallVec<[NodeId; 4]>,
    ) -> Option<(NodeId, Point)> {
        let node = self.node_opt(id)?;
        if !node.is_visible() {
            return None;
        }
        let local = transform::try_inverse(node.local.transform)? * point;
        let full = self.full_bounds(id)?;
        if !full.contains(local) {
            return None;
        }

        path.push(id);
        let flags = node.local.flags;
        if flags.contains(NodeFlags::CHILDREN_PICKABLE) {
            for &child in node.children.iter().rev() {
                if let Some(hit) = self.pick_node(child, local, path, cameras) {
                    return Some(hit);
                }
            }
            if let NodeKind::Camera(camera) = &node.kind
                && node.local.bounds.contains(local)
                && !cameras.contains(&id)
                && let Some(inv) = transform::try_inverse(camera.view_transform)
            {
                let view_point = inv * local;
                cameras.push(id);
                for &layer in camera.layers.iter().rev() {
                    if let Some(hit) = self.pick_node(layer, view_point, path, cameras) {
                        return Some(hit);
                    }
                }
                cameras.pop();
            }
        }
        if flags.contains(NodeFlags::PICKABLE) && node.kind.contains(&node.local, local) {
            return Some((id, local));
        }
        path.pop();
        None
    }
}
