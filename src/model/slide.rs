//! Slide and shape types.

use super::TextBody;
use serde::{Deserialize, Serialize};

/// EMU per typographic point.
pub const EMU_PER_POINT: f32 = 12_700.0;

/// A slide in presentation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// Zero-based position in the presentation
    pub index: usize,

    /// Slide part name (e.g. `ppt/slides/slide1.xml`)
    pub part_name: String,

    /// Whether the slide is hidden (`show="0"`)
    pub hidden: bool,

    /// Shapes in document order
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create a new empty slide.
    pub fn new(index: usize, part_name: impl Into<String>) -> Self {
        Self {
            index,
            part_name: part_name.into(),
            hidden: false,
            shapes: Vec::new(),
        }
    }

    /// Get a shape by its `cNvPr` id.
    pub fn shape(&self, id: u32) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Iterate placeholder shapes.
    pub fn placeholders(&self) -> impl Iterator<Item = (&Shape, &PlaceholderSpec)> {
        self.shapes.iter().filter_map(|s| match &s.kind {
            ShapeKind::Placeholder(spec) => Some((s, spec)),
            ShapeKind::Static => None,
        })
    }

    /// Get plain text of all shapes.
    pub fn plain_text(&self) -> String {
        self.shapes
            .iter()
            .filter_map(|s| s.text.as_ref())
            .map(|t| t.plain_text())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    /// Width in points.
    pub fn width_pt(&self) -> f32 {
        self.cx as f32 / EMU_PER_POINT
    }

    /// Height in points.
    pub fn height_pt(&self) -> f32 {
        self.cy as f32 / EMU_PER_POINT
    }

    /// Whether the frame has a usable area.
    pub fn has_area(&self) -> bool {
        self.cx > 0 && self.cy > 0
    }
}

/// A shape on a slide (`p:sp`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// `cNvPr` id, unique within the slide
    pub id: u32,

    /// `cNvPr` name
    pub name: String,

    /// Frame from `a:xfrm`
    pub frame: Frame,

    /// OOXML placeholder type (`p:ph/@type`), e.g. `title` or `body`
    pub ph_type: Option<String>,

    /// Text body, if the shape has one
    pub text: Option<TextBody>,

    /// Placeholder or static shape
    pub kind: ShapeKind,
}

impl Shape {
    /// Whether this is a role-carrying placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, ShapeKind::Placeholder(_))
    }

    /// Placeholder spec, if any.
    pub fn placeholder(&self) -> Option<&PlaceholderSpec> {
        match &self.kind {
            ShapeKind::Placeholder(spec) => Some(spec),
            ShapeKind::Static => None,
        }
    }

    /// Get plain text of the shape.
    pub fn plain_text(&self) -> String {
        self.text.as_ref().map(|t| t.plain_text()).unwrap_or_default()
    }
}

/// Whether a shape takes content or is decorative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    /// A content slot with a declared role
    Placeholder(PlaceholderSpec),
    /// A decorative shape, never mutated
    Static,
}

/// Directives declared on a placeholder shape.
///
/// Directives are written into the shape's alternative text (`cNvPr/@descr`)
/// as `key=value` pairs separated by `;`:
///
/// ```text
/// role=experience[].bullets; group=1; lines=6; chars=48; max-entries=4; min-size=9
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderSpec {
    /// Declared role name, not yet validated against the schema
    pub role: String,

    /// Explicit repeated-entry group
    pub group: Option<u32>,

    /// Declared line capacity at the default font size
    pub lines: Option<u32>,

    /// Declared characters per line at the default font size
    pub chars: Option<u32>,

    /// Smallest font size the layout engine may use, in points
    pub min_font_size: Option<f32>,

    /// Maximum number of list entries
    pub max_entries: Option<u32>,

    /// Whether this slot only receives overflow from pagination
    pub continuation: bool,
}

impl PlaceholderSpec {
    /// Parse directives from a shape description.
    ///
    /// Returns `None` when no `role` directive is present. Unknown keys and
    /// unparsable numbers are ignored with a warning.
    pub fn parse(descr: &str) -> Option<Self> {
        let mut spec = PlaceholderSpec::default();
        let mut has_role = false;

        for directive in descr.split([';', '\n']) {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }
            let (key, value) = match directive.split_once('=') {
                Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim()),
                None => (directive.to_ascii_lowercase(), ""),
            };

            match key.as_str() {
                "role" if !value.is_empty() => {
                    spec.role = value.to_string();
                    has_role = true;
                }
                "group" => spec.group = parse_number(&key, value),
                "lines" => spec.lines = parse_number(&key, value),
                "chars" => spec.chars = parse_number(&key, value),
                "max-entries" => spec.max_entries = parse_number(&key, value),
                "min-size" => spec.min_font_size = parse_number(&key, value),
                "continuation" => spec.continuation = value.is_empty() || value == "true",
                _ => log::warn!("Ignoring unknown placeholder directive '{}'", directive),
            }
        }

        has_role.then_some(spec)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring placeholder directive {}={}", key, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        let spec = PlaceholderSpec::parse(
            "role=experience[].bullets; group=1; lines=6; chars=48; max-entries=4; min-size=9.5",
        )
        .unwrap();
        assert_eq!(spec.role, "experience[].bullets");
        assert_eq!(spec.group, Some(1));
        assert_eq!(spec.lines, Some(6));
        assert_eq!(spec.chars, Some(48));
        assert_eq!(spec.max_entries, Some(4));
        assert_eq!(spec.min_font_size, Some(9.5));
        assert!(!spec.continuation);
    }

    #[test]
    fn test_parse_continuation_flag() {
        let spec = PlaceholderSpec::parse("role=skills;continuation").unwrap();
        assert!(spec.continuation);
    }

    #[test]
    fn test_parse_without_role() {
        assert!(PlaceholderSpec::parse("Company logo").is_none());
        assert!(PlaceholderSpec::parse("lines=3").is_none());
        assert!(PlaceholderSpec::parse("").is_none());
    }

    #[test]
    fn test_frame_points() {
        let frame = Frame {
            x: 0,
            y: 0,
            cx: 127_000,
            cy: 254_000,
        };
        assert_eq!(frame.width_pt(), 10.0);
        assert_eq!(frame.height_pt(), 20.0);
        assert!(frame.has_area());
    }
}
