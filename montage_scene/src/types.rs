// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, flags, colors, and local node data.

use kurbo::{Affine, Rect};

/// Identifier for a node in the scene (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling painting and picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node and its subtree are painted and can be picked.
        const VISIBLE           = 0b0000_0001;
        /// Node itself can be returned by a pick.
        const PICKABLE          = 0b0000_0010;
        /// Children of the node take part in picking.
        const CHILDREN_PICKABLE = 0b0000_0100;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE | Self::CHILDREN_PICKABLE
    }
}

/// An 8-bit RGBA color (straight alpha).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; `255` is opaque.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0, 128, 0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// A color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Interpolate each channel; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| to_channel(f64::from(a) + (f64::from(b) - f64::from(a)) * t);
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Scale alpha by `opacity` in `[0, 1]`.
    pub fn multiply_alpha(self, opacity: f32) -> Self {
        let a = to_channel(f64::from(self.a) * f64::from(opacity.clamp(0.0, 1.0)));
        Self { a, ..self }
    }
}

// `f64::round` needs `std` or `libm`; channel values are non-negative so
// adding one half and truncating rounds correctly.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Value is clamped to the u8 range before the cast."
)]
fn to_channel(v: f64) -> u8 {
    (v.clamp(0.0, 255.0) + 0.5) as u8
}

/// Local data for a node.
#[derive(Clone, Debug)]
pub struct LocalNode {
    /// Local (untransformed) bounds.
    pub bounds: Rect,
    /// Transform from this node's space into its parent's space.
    pub transform: Affine,
    /// Visibility and picking flags.
    pub flags: NodeFlags,
    /// Fill painted over the bounds (or the shape, for paths).
    pub fill: Option<Color>,
    /// Opacity multiplied into this subtree, in `[0, 1]`.
    pub opacity: f32,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            transform: Affine::IDENTITY,
            flags: NodeFlags::default(),
            fill: None,
            opacity: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_lerp_endpoints_and_midpoint() {
        assert_eq!(Color::RED.lerp(Color::BLUE, 0.0), Color::RED);
        assert_eq!(Color::RED.lerp(Color::BLUE, 1.0), Color::BLUE);
        assert_eq!(
            Color::BLACK.lerp(Color::WHITE, 0.5),
            Color::rgb(128, 128, 128)
        );
    }

    #[test]
    fn multiply_alpha() {
        assert_eq!(Color::RED.multiply_alpha(0.0).a, 0);
        assert_eq!(Color::RED.multiply_alpha(1.0).a, 255);
        assert_eq!(Color::RED.multiply_alpha(0.5).a, 128);
    }
}
