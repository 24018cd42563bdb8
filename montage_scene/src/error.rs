// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for structural scene operations and drawing backends.

use crate::types::NodeId;

/// Precondition violations reported by structural scene operations.
///
/// These never leave the scene half-modified: the check runs before any
/// mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The id does not refer to a live node.
    #[error("node {0:?} is not alive")]
    StaleNode(NodeId),
    /// The operation would make a node its own ancestor.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Prospective parent.
        parent: NodeId,
        /// Node being attached.
        child: NodeId,
    },
    /// The node is not a camera.
    #[error("node {0:?} is not a camera")]
    NotACamera(NodeId),
    /// The node is not a layer.
    #[error("node {0:?} is not a layer")]
    NotALayer(NodeId),
    /// The scene root cannot be removed or reparented.
    #[error("the scene root cannot be removed or reparented")]
    RootRemoval,
    /// The child is not attached to the given parent.
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Node that was not found among its children.
        child: NodeId,
    },
}

/// Failure of a drawing primitive.
///
/// The paint traversal absorbs these per node, substituting a cheaper
/// rendering where one exists, so a single failure never aborts a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The primitive cannot be rendered at the requested size.
    #[error("primitive is too small or degenerate to render")]
    Degenerate,
    /// The backend does not support this primitive.
    #[error("primitive is not supported by this surface")]
    Unsupported,
    /// The backend failed for another reason.
    #[error("drawing backend failure")]
    Backend,
}
