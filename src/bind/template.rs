//! Template loading.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::metrics::{Capacity, DEFAULT_FONT_SIZE, UNBOUNDED};
use crate::model::{Document, Role, Section, Shape};
use crate::parser::{PackageParser, ParseOptions};

/// Address of a placeholder: slide index and shape id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceholderRef {
    /// Zero-based slide index
    pub slide: usize,

    /// `p:cNvPr/@id` of the shape
    pub shape_id: u32,
}

impl fmt::Display for PlaceholderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slide {} shape {}", self.slide + 1, self.shape_id)
    }
}

/// A placeholder of the template with its resolved role and capacity.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatePlaceholder {
    pub slot: PlaceholderRef,

    /// Shape name, for diagnostics
    pub name: String,

    pub role: Role,

    /// Entry index for repeated roles, 0 otherwise
    pub group: usize,

    /// Whether the placeholder only receives paginated overflow
    pub continuation: bool,

    pub capacity: Capacity,

    pub max_entries: Option<usize>,

    /// Declared font floor, in points
    pub min_font_size: Option<f32>,
}

/// A parsed template: the blueprint document plus its placeholders.
///
/// The document is shared behind an `Arc` and never mutated; cloning a
/// `TemplateSpec` is cheap.
#[derive(Debug, Clone)]
pub struct TemplateSpec {
    document: Arc<Document>,
    placeholders: Vec<TemplatePlaceholder>,
}

impl TemplateSpec {
    /// Build a template from a parsed document.
    ///
    /// Fails with `Error::UnknownRole` when any shape declares a role outside
    /// the schema.
    pub fn from_document(document: Document) -> Result<Self> {
        let mut placeholders = Vec::new();
        let mut occurrences: HashMap<(Role, bool), usize> = HashMap::new();

        for slide in &document.slides {
            for (shape, spec) in slide.placeholders() {
                let role: Role = spec.role.parse()?;

                let seen = occurrences.entry((role, spec.continuation)).or_insert(0);
                let group = match (role.section(), spec.group) {
                    (Some(_), Some(group)) => group as usize,
                    (Some(_), None) => *seen,
                    (None, _) => 0,
                };
                *seen += 1;

                let font_size = declared_font_size(shape);
                let capacity = shape
                    .text
                    .as_ref()
                    .and_then(|body| {
                        Capacity::derive(&shape.frame, &body.insets, font_size, spec.lines, spec.chars)
                    })
                    .unwrap_or_else(|| {
                        log::warn!(
                            "placeholder '{}' on slide {} has no geometry and no declared capacity",
                            shape.name,
                            slide.index + 1
                        );
                        Capacity::new(UNBOUNDED, UNBOUNDED, font_size)
                    });

                placeholders.push(TemplatePlaceholder {
                    slot: PlaceholderRef {
                        slide: slide.index,
                        shape_id: shape.id,
                    },
                    name: shape.name.clone(),
                    role,
                    group,
                    continuation: spec.continuation,
                    capacity,
                    max_entries: spec.max_entries.map(|n| n as usize),
                    min_font_size: spec.min_font_size,
                });
            }
        }

        log::debug!("template has {} placeholders", placeholders.len());

        Ok(Self {
            document: Arc::new(document),
            placeholders,
        })
    }

    /// Parse a template from package bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = PackageParser::from_bytes(data)?.parse()?;
        Self::from_document(doc)
    }

    /// Parse a template file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = PackageParser::open_with_options(path, ParseOptions::default())?.parse()?;
        Self::from_document(doc)
    }

    /// The blueprint document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// All placeholders in slide and shape order.
    pub fn placeholders(&self) -> &[TemplatePlaceholder] {
        &self.placeholders
    }

    /// Look up a placeholder by slot.
    pub fn placeholder(&self, slot: PlaceholderRef) -> Option<&TemplatePlaceholder> {
        self.placeholders.iter().find(|p| p.slot == slot)
    }

    /// The shape behind a slot.
    pub fn shape(&self, slot: PlaceholderRef) -> Option<&Shape> {
        self.document.slides.get(slot.slide)?.shape(slot.shape_id)
    }

    /// Number of entry groups the template offers for a section, not
    /// counting continuation placeholders.
    pub fn group_count(&self, section: Section) -> usize {
        self.placeholders
            .iter()
            .filter(|p| !p.continuation && p.role.section() == Some(section))
            .map(|p| p.group + 1)
            .max()
            .unwrap_or(0)
    }

    /// Continuation placeholders for a role, in document order.
    pub fn continuations(&self, role: Role) -> impl Iterator<Item = &TemplatePlaceholder> {
        self.placeholders
            .iter()
            .filter(move |p| p.continuation && p.role == role)
    }

    /// Whether any non-continuation placeholder carries `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.placeholders
            .iter()
            .any(|p| !p.continuation && p.role == role)
    }
}

fn declared_font_size(shape: &Shape) -> f32 {
    shape
        .text
        .as_ref()
        .and_then(|body| body.declared_font_size())
        .unwrap_or(DEFAULT_FONT_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PackageKind;
    use crate::error::Error;
    use crate::model::{Frame, Insets, Paragraph, PlaceholderSpec, ShapeKind, Slide, TextBody};

    fn placeholder_shape(id: u32, descr: &str) -> Shape {
        Shape {
            id,
            name: format!("Placeholder {}", id),
            frame: Frame {
                x: 0,
                y: 0,
                cx: 3_657_600,
                cy: 914_400,
            },
            ph_type: Some("body".into()),
            text: Some(TextBody {
                span: 0..0,
                body_props_xml: "<a:bodyPr/>".into(),
                list_style_xml: None,
                insets: Insets::default(),
                paragraphs: vec![Paragraph::with_text("Placeholder")],
            }),
            kind: ShapeKind::Placeholder(PlaceholderSpec::parse(descr).unwrap()),
        }
    }

    fn document(shapes: Vec<Shape>) -> Document {
        let mut doc = Document::new(PackageKind::Presentation, "ppt/presentation.xml");
        let mut slide = Slide::new(0, "ppt/slides/slide1.xml");
        slide.shapes = shapes;
        doc.slides.push(slide);
        doc
    }

    #[test]
    fn test_groups_follow_occurrence_order() {
        let spec = TemplateSpec::from_document(document(vec![
            placeholder_shape(2, "role=experience[].role"),
            placeholder_shape(3, "role=experience[].role"),
            placeholder_shape(4, "role=experience[].bullets; group=1"),
            placeholder_shape(5, "role=experience[].bullets; continuation"),
            placeholder_shape(6, "role=contact.name; lines=1; chars=30"),
        ]))
        .unwrap();

        let groups: Vec<usize> = spec.placeholders().iter().map(|p| p.group).collect();
        assert_eq!(groups, vec![0, 1, 1, 0, 0]);
        assert_eq!(spec.group_count(Section::Experience), 2);
        assert_eq!(spec.group_count(Section::Education), 0);
        assert_eq!(spec.continuations(Role::ExperienceBullets).count(), 1);

        let name = &spec.placeholders()[4];
        assert_eq!(name.capacity.lines, 1);
        assert_eq!(name.capacity.chars, 30);
        assert_eq!(name.capacity.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_unknown_role_fails() {
        let err = TemplateSpec::from_document(document(vec![placeholder_shape(
            2,
            "role=contact.fax",
        )]))
        .unwrap_err();
        assert!(matches!(err, Error::UnknownRole(ref r) if r == "contact.fax"));
    }

    #[test]
    fn test_clone_shares_document() {
        let spec =
            TemplateSpec::from_document(document(vec![placeholder_shape(2, "role=summary")]))
                .unwrap();
        let copy = spec.clone();
        assert!(std::ptr::eq(spec.document(), copy.document()));
        assert!(copy.shape(PlaceholderRef { slide: 0, shape_id: 2 }).is_some());
    }
}
