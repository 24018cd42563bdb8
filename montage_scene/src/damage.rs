// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage: regions that need repainting, keyed by the camera that shows them.

use alloc::vec::Vec;
use kurbo::Rect;
use smallvec::SmallVec;

use crate::transform::union_nonempty;
use crate::types::NodeId;

/// A region of one camera that must be repainted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirtyRect {
    /// The camera whose view changed.
    pub camera: NodeId,
    /// Region in scene (root) coordinates.
    pub rect: Rect,
}

/// Receives repaint requests when damage is flushed.
pub trait RepaintSink {
    /// `rect` (scene coordinates) of `camera` must be repainted.
    fn repaint(&mut self, camera: NodeId, rect: Rect);
}

/// Accumulated damage since the last flush.
#[derive(Clone, Debug, Default)]
pub struct Damage {
    /// Dirty regions in the order they were reported.
    pub dirty_rects: Vec<DirtyRect>,
}

impl Damage {
    /// Returns true if nothing needs repainting.
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty()
    }

    /// Returns the union of all damage rects.
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.dirty_rects.iter().map(|d| d.rect);
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Returns the union of the damage reported for `camera`.
    pub fn union_for(&self, camera: NodeId) -> Option<Rect> {
        self.dirty_rects
            .iter()
            .filter(|d| d.camera == camera)
            .map(|d| d.rect)
            .reduce(union_nonempty)
    }

    /// One rectangle per camera, in the order cameras were first damaged.
    pub fn coalesce(&self) -> SmallVec<[DirtyRect; 4]> {
        let mut out: SmallVec<[DirtyRect; 4]> = SmallVec::new();
        for d in &self.dirty_rects {
            match out.iter_mut().find(|o| o.camera == d.camera) {
                Some(o) => o.rect = union_nonempty(o.rect, d.rect),
                None => out.push(*d),
            }
        }
        out
    }
}

impl RepaintSink for Damage {
    fn repaint(&mut self, camera: NodeId, rect: Rect) {
        self.dirty_rects.push(DirtyRect { camera, rect });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_unions_per_camera() {
        let a = NodeId::new(1, 1);
        let b = NodeId::new(2, 1);
        let mut damage = Damage::default();
        damage.repaint(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        damage.repaint(b, Rect::new(5.0, 5.0, 6.0, 6.0));
        damage.repaint(a, Rect::new(20.0, 0.0, 30.0, 10.0));

        let merged = damage.coalesce();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].camera, a, "first damaged camera first");
        assert_eq!(merged[0].rect, Rect::new(0.0, 0.0, 30.0, 10.0));
        assert_eq!(merged[1].rect, Rect::new(5.0, 5.0, 6.0, 6.0));

        assert_eq!(damage.union_for(b), Some(Rect::new(5.0, 5.0, 6.0, 6.0)));
        assert_eq!(damage.union_rect(), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
    }

    #[test]
    fn empty_damage() {
        let damage = Damage::default();
        assert!(damage.is_empty());
        assert_eq!(damage.union_rect(), None);
        assert!(damage.coalesce().is_empty());
    }
}
