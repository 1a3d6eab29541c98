//! Text measurement.
//!
//! Measurement is a character-count approximation: an average glyph is
//! half an em wide and a line is 1.2 em tall. It is deliberately font
//! agnostic so that the same input always measures the same way.

use serde::{Deserialize, Serialize};

use crate::model::{Frame, Insets, EMU_PER_POINT};

/// Average glyph advance, in em.
pub const GLYPH_WIDTH_EM: f32 = 0.5;

/// Line height, in em.
pub const LINE_HEIGHT_EM: f32 = 1.2;

/// Font size assumed when a placeholder declares none, in points.
pub const DEFAULT_FONT_SIZE: f32 = 18.0;

/// Stand-in for a dimension nothing constrains.
pub const UNBOUNDED: u32 = u32::MAX / 2;

/// How much text a placeholder holds at its default font size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    /// Lines at the default size
    pub lines: u32,

    /// Characters per line at the default size
    pub chars: u32,

    /// Default font size, in points
    pub font_size: f32,
}

impl Capacity {
    /// Capacity declared by `lines=` / `chars=` directives.
    pub fn new(lines: u32, chars: u32, font_size: f32) -> Self {
        Self {
            lines: lines.max(1),
            chars: chars.max(1),
            font_size,
        }
    }

    /// Capacity derived from a frame minus its insets. Declared values, when
    /// present, override the derived ones.
    pub fn derive(
        frame: &Frame,
        insets: &Insets,
        font_size: f32,
        lines: Option<u32>,
        chars: Option<u32>,
    ) -> Option<Self> {
        if let (Some(lines), Some(chars)) = (lines, chars) {
            return Some(Self::new(lines, chars, font_size));
        }
        if !frame.has_area() {
            if lines.is_none() && chars.is_none() {
                return None;
            }
            return Some(Self::new(
                lines.unwrap_or(UNBOUNDED),
                chars.unwrap_or(UNBOUNDED),
                font_size,
            ));
        }

        let width = (frame.cx - insets.left - insets.right).max(0) as f32 / EMU_PER_POINT;
        let height = (frame.cy - insets.top - insets.bottom).max(0) as f32 / EMU_PER_POINT;
        let derived_chars = (width / (GLYPH_WIDTH_EM * font_size) + 1e-3).floor() as u32;
        let derived_lines = (height / (LINE_HEIGHT_EM * font_size) + 1e-3).floor() as u32;

        Some(Self::new(
            lines.unwrap_or(derived_lines),
            chars.unwrap_or(derived_chars),
            font_size,
        ))
    }

    /// Lines and characters per line at font size `size`.
    pub fn at(&self, size: f32) -> (u32, u32) {
        if size <= 0.0 {
            return (self.lines, self.chars);
        }
        let scale = self.font_size / size;
        let lines = (self.lines as f32 * scale + 1e-3).floor() as u32;
        let chars = (self.chars as f32 * scale + 1e-3).floor() as u32;
        (lines.max(1), chars.max(1))
    }

    /// Lines `paragraphs` need at font size `size`.
    pub fn required_lines(&self, paragraphs: &[String], size: f32) -> u32 {
        let (_, chars) = self.at(size);
        paragraphs.iter().map(|p| wrapped_line_count(p, chars)).sum()
    }

    /// Whether `paragraphs` fit at font size `size`.
    pub fn fits(&self, paragraphs: &[String], size: f32) -> bool {
        let (lines, _) = self.at(size);
        self.required_lines(paragraphs, size) <= lines
    }

    /// Longest prefix of `paragraphs` that fits at `size`.
    pub fn fitting_prefix(&self, paragraphs: &[String], size: f32) -> usize {
        let (lines, chars) = self.at(size);
        let mut used = 0;
        for (i, p) in paragraphs.iter().enumerate() {
            used += wrapped_line_count(p, chars);
            if used > lines {
                return i;
            }
        }
        paragraphs.len()
    }
}

/// Greedy word wrap: number of lines `text` occupies at `width` characters.
///
/// An empty paragraph still takes one line. Words longer than a line are
/// broken across as many lines as they need.
pub fn wrapped_line_count(text: &str, width: u32) -> u32 {
    let width = width.max(1) as usize;
    let mut lines = 1u32;
    let mut current = 0usize;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if len > width {
            if current > 0 {
                lines += 1;
            }
            let pieces = len.div_ceil(width);
            lines += pieces as u32 - 1;
            current = len - (pieces - 1) * width;
            continue;
        }

        let needed = if current == 0 { len } else { current + 1 + len };
        if needed <= width {
            current = needed;
        } else {
            lines += 1;
            current = len;
        }
    }

    lines
}
