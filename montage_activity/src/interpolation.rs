// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shaping of the raw fraction-complete before it is applied to a property.

/// Direction in which an interpolating activity sweeps its range.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum InterpolationMode {
    /// `0 → 1`: from the source value to the destination value.
    #[default]
    SourceToDestination,
    /// `1 → 0`: from the destination value back to the source value.
    DestinationToSource,
    /// `0 → 1 → 0`: out to the destination over the first half, back over the second.
    SourceToDestinationToSource,
}

/// How a step fraction maps onto an interpolation parameter.
///
/// The default sweeps source to destination with slow-in/slow-out easing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Interpolation {
    /// Sweep direction.
    pub mode: InterpolationMode,
    /// Ease in and out with a piecewise quadratic.
    pub slow_in_slow_out: bool,
}

impl Default for Interpolation {
    fn default() -> Self {
        Self {
            mode: InterpolationMode::SourceToDestination,
            slow_in_slow_out: true,
        }
    }
}

impl Interpolation {
    /// Linear source-to-destination interpolation.
    pub const LINEAR: Self = Self {
        mode: InterpolationMode::SourceToDestination,
        slow_in_slow_out: false,
    };

    /// Set the sweep direction.
    pub fn with_mode(mut self, mode: InterpolationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable slow-in/slow-out easing.
    pub fn with_slow_in_slow_out(mut self, enabled: bool) -> Self {
        self.slow_in_slow_out = enabled;
        self
    }

    /// Map a fraction in `[0, 1]` to the interpolation parameter.
    ///
    /// Easing is applied first, then the sweep direction.
    pub fn adjust(&self, fraction: f64) -> f64 {
        let mut t = fraction.clamp(0.0, 1.0);
        if self.slow_in_slow_out {
            t = slow_in_slow_out(t);
        }
        match self.mode {
            InterpolationMode::SourceToDestination => t,
            InterpolationMode::DestinationToSource => 1.0 - t,
            InterpolationMode::SourceToDestinationToSource => {
                if t <= 0.5 {
                    t * 2.0
                } else {
                    1.0 - (t - 0.5) * 2.0
                }
            }
        }
    }
}

fn slow_in_slow_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        let complement = 1.0 - t;
        1.0 - 2.0 * complement * complement
    }
}

/// Linear interpolation between `a` and `b`. Exact at `t = 0` and `t = 1`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}
