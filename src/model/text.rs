//! Text body, paragraph and run types.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The text body of a shape (`p:txBody`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBody {
    /// Byte range of the whole `p:txBody` element inside the slide part
    pub span: Range<usize>,

    /// Raw `a:bodyPr` element
    pub body_props_xml: String,

    /// Raw `a:lstStyle` element, if present
    pub list_style_xml: Option<String>,

    /// Left/right/top/bottom insets in EMU
    pub insets: Insets,

    /// Paragraphs in order
    pub paragraphs: Vec<Paragraph>,
}

impl TextBody {
    /// Get plain text, one line per paragraph.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First explicit font size found in the body (runs, then end-of-paragraph marks).
    pub fn declared_font_size(&self) -> Option<f32> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.runs.iter())
            .find_map(|r| r.style.size)
            .or_else(|| self.paragraphs.iter().find_map(|p| p.end_size))
    }
}

/// Text insets of a body, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insets {
    pub left: i64,
    pub right: i64,
    pub top: i64,
    pub bottom: i64,
}

impl Default for Insets {
    fn default() -> Self {
        // DrawingML defaults: 0.1" left/right, 0.05" top/bottom
        Self {
            left: 91_440,
            right: 91_440,
            top: 45_720,
            bottom: 45_720,
        }
    }
}

/// A paragraph of text content (`a:p`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Text runs in the paragraph
    pub runs: Vec<Run>,

    /// Outline level (0 = top)
    pub level: u8,

    /// Whether the paragraph carries an explicit bullet
    pub bullet: bool,

    /// Font size of the end-of-paragraph mark, in points
    pub end_size: Option<f32>,

    /// Raw `a:pPr` element
    pub props_xml: Option<String>,

    /// Raw `a:endParaRPr` element
    pub end_props_xml: Option<String>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_run(Run::new(text));
        p
    }

    /// Add a styled text run.
    pub fn add_run(&mut self, run: Run) {
        self.runs.push(run);
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// Largest font size among the runs.
    pub fn max_font_size(&self) -> Option<f32> {
        self.runs
            .iter()
            .filter(|r| !r.text.trim().is_empty())
            .filter_map(|r| r.style.size)
            .fold(None, |acc, s| Some(acc.map_or(s, |a: f32| a.max(s))))
            .or(self.end_size)
    }

    /// Check if the paragraph is predominantly bold.
    pub fn is_bold(&self) -> bool {
        let bold_chars: usize = self
            .runs
            .iter()
            .filter(|r| r.style.bold)
            .map(|r| r.text.trim().len())
            .sum();
        let total_chars: usize = self.runs.iter().map(|r| r.text.trim().len()).sum();
        total_chars > 0 && bold_chars as f32 / total_chars as f32 > 0.5
    }
}

/// A run of text with consistent styling (`a:r`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: RunStyle,

    /// Raw `a:rPr` element
    pub props_xml: Option<String>,
}

impl Run {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle {
                bold: true,
                ..Default::default()
            },
            props_xml: None,
        }
    }
}

/// Run styling properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    /// Latin typeface
    pub font_family: Option<String>,

    /// Font size in points
    pub size: Option<f32>,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Text color (hex, e.g. "1F3864")
    pub color: Option<String>,

    /// Character spacing in hundredths of a point
    pub spacing: Option<i32>,
}
