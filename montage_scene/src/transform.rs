// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Affine transform helpers on top of [`kurbo::Affine`].
//!
//! `Affine` already composes (`a * b`), inverts, and maps points. These helpers
//! add conservative rectangle mapping, offset/scale/rotation accessors for
//! transforms of the form `translate * rotate * uniform scale`, and coefficient
//! interpolation for transform animation.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Rect, Vec2};
use montage_activity::lerp as lerp_f64;

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box in the target space.
pub fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let min_x = (a * rect.x0).min(a * rect.x1) + (c * rect.y0).min(c * rect.y1);
    let max_x = (a * rect.x0).max(a * rect.x1) + (c * rect.y0).max(c * rect.y1);
    let min_y = (b * rect.x0).min(b * rect.x1) + (d * rect.y0).min(d * rect.y1);
    let max_y = (b * rect.x0).max(b * rect.x1) + (d * rect.y0).max(d * rect.y1);
    Rect::new(min_x + e, min_y + f, max_x + e, max_y + f)
}

/// Inverse of `affine`, or `None` if it is singular (for example a zero scale).
pub fn try_inverse(affine: Affine) -> Option<Affine> {
    let det = affine.determinant();
    (det != 0.0 && det.is_finite()).then(|| affine.inverse())
}

/// Translation component.
pub fn offset(affine: Affine) -> Vec2 {
    affine.translation()
}

/// Replace the translation component, keeping scale and rotation.
pub fn with_offset(affine: Affine, x: f64, y: f64) -> Affine {
    affine.with_translation(Vec2::new(x, y))
}

/// Uniform scale factor: the square root of the absolute determinant.
pub fn scale(affine: Affine) -> f64 {
    affine.determinant().abs().sqrt()
}

/// Rotation angle in radians.
pub fn rotation(affine: Affine) -> f64 {
    let [a, b, ..] = affine.as_coeffs();
    b.atan2(a)
}

/// Build `translate(x, y) * rotate(theta) * scale(s)`.
pub fn position_scale_rotation(x: f64, y: f64, s: f64, theta: f64) -> Affine {
    Affine::translate((x, y)) * Affine::rotate(theta) * Affine::scale(s)
}

/// Replace the scale of `affine` with `s`, keeping its offset and rotation.
pub fn with_scale(affine: Affine, s: f64) -> Affine {
    let t = offset(affine);
    position_scale_rotation(t.x, t.y, s, rotation(affine))
}

/// Replace the rotation of `affine` with `theta`, keeping its offset and scale.
pub fn with_rotation(affine: Affine, theta: f64) -> Affine {
    let t = offset(affine);
    position_scale_rotation(t.x, t.y, scale(affine), theta)
}

/// Interpolate the six coefficients linearly. Exact at `t = 0` and `t = 1`.
///
/// This is what transform animations use; intermediate matrices can shear
/// slightly when source and destination rotations differ.
pub fn lerp(from: Affine, to: Affine, t: f64) -> Affine {
    let a = from.as_coeffs();
    let b = to.as_coeffs();
    Affine::new(core::array::from_fn(|i| lerp_f64(a[i], b[i], t)))
}

/// Interpolate the edges of two rectangles.
pub fn lerp_rect(from: Rect, to: Rect, t: f64) -> Rect {
    Rect::new(
        lerp_f64(from.x0, to.x0, t),
        lerp_f64(from.y0, to.y0, t),
        lerp_f64(from.x1, to.x1, t),
        lerp_f64(from.y1, to.y1, t),
    )
}

/// Returns true if `rect` covers no area.
pub(crate) fn is_empty(rect: Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

/// Union that treats empty rectangles as the identity element.
pub(crate) fn union_nonempty(a: Rect, b: Rect) -> Rect {
    match (is_empty(a), is_empty(b)) {
        (true, _) => b,
        (_, true) => a,
        _ => a.union(b),
    }
}

/// Intersection test where touching edges count as overlapping.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
