// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text node data and the measurement interface used to size text nodes.

use alloc::string::String;
use kurbo::Size;

use crate::types::Color;

/// Measures laid-out text. Implemented by whatever font stack the host uses.
pub trait TextMeasure {
    /// Size of `text` at `font_size`, wrapped to `max_width` when given.
    fn measure(&self, text: &str, font_size: f64, max_width: Option<f64>) -> Size;
}

/// Content of a text node.
#[derive(Clone, Debug, PartialEq)]
pub struct TextData {
    /// The string to draw. `\n` starts a new line.
    pub text: String,
    /// Font size in local units.
    pub font_size: f64,
    /// Glyph color.
    pub color: Color,
    /// Keep the node's width and wrap the text to it. When false, the width
    /// follows the measured text.
    pub fixed_width: bool,
    /// Keep the node's height. When false, the height follows the measured text.
    pub fixed_height: bool,
}

impl TextData {
    /// Black text sized to its content.
    pub fn new(text: impl Into<String>, font_size: f64) -> Self {
        Self {
            text: text.into(),
            font_size,
            color: Color::BLACK,
            fixed_width: false,
            fixed_height: false,
        }
    }

    /// Set the glyph color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Keep the node width fixed and wrap to it.
    pub fn with_fixed_width(mut self) -> Self {
        self.fixed_width = true;
        self
    }

    /// Keep the node height fixed.
    pub fn with_fixed_height(mut self) -> Self {
        self.fixed_height = true;
        self
    }
}

/// Fixed-advance measurement: every character is `advance * font_size` wide and
/// every line is `line_height * font_size` tall.
///
/// Good enough for tests and for hosts without a font stack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    /// Character advance as a multiple of the font size.
    pub advance: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.2,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Character counts are small; columns are floored and clamped to at least one."
    )]
    fn measure(&self, text: &str, font_size: f64, max_width: Option<f64>) -> Size {
        let char_width = self.advance * font_size;
        let columns = match max_width {
            Some(w) if char_width > 0.0 => Some(((w / char_width) as usize).max(1)),
            _ => None,
        };
        let mut widest = 0_usize;
        let mut lines = 0_usize;
        for line in text.split('\n') {
            let len = line.chars().count();
            match columns {
                Some(cols) if len > cols => {
                    widest = widest.max(cols);
                    lines += len.div_ceil(cols);
                }
                _ => {
                    widest = widest.max(len);
                    lines += 1;
                }
            }
        }
        Size::new(
            widest as f64 * char_width,
            lines as f64 * (self.line_height * font_size),
        )
    }
}
