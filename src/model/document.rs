//! Document-level types: the part arena and relationship graph.

use super::Slide;
use crate::detect::PackageKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Stable identifier of a part inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub usize);

/// How a part was stored in the zip container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Stored without compression.
    Stored,
    /// Deflate compressed.
    #[default]
    Deflated,
}

/// One addressable unit of content inside the container.
///
/// The payload sits behind an `Arc`, so cloning a document shares every
/// payload; [`Part::set_data`] swaps in a new buffer without touching the
/// shared one.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part name without a leading slash (e.g. `ppt/slides/slide1.xml`)
    pub name: String,

    /// Media type from `[Content_Types].xml`
    pub content_type: String,

    /// Compression used in the source archive
    pub compression: Compression,

    data: Arc<[u8]>,
}

impl Part {
    /// Create a new part.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        compression: Compression,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            compression,
            data: Arc::from(data),
        }
    }

    /// Raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload as UTF-8 text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Replace the payload.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = Arc::from(data);
    }

    /// Whether two parts share the same payload buffer.
    pub fn shares_data_with(&self, other: &Part) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Whether the part holds XML.
    pub fn is_xml(&self) -> bool {
        self.name.ends_with(".xml")
            || self.name.ends_with(".rels")
            || self.content_type.ends_with("+xml")
            || self.content_type.ends_with("/xml")
    }

    /// Whether the part is a relationships part.
    pub fn is_relationships(&self) -> bool {
        self.name.ends_with(".rels")
    }
}

/// A reference from one part (or the package root) to another part or URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Source part name, `None` for package-level relationships
    pub source: Option<String>,

    /// Relationship id (e.g. `rId2`), unique per source
    pub id: String,

    /// Relationship type URI
    pub rel_type: String,

    /// Resolved target part name, or the raw URI for external targets
    pub target: String,

    /// Whether the target lives outside the package
    pub external: bool,
}

/// A parsed presentation package.
///
/// Parts live in an ordered arena; the order is the zip entry order and is
/// reproduced when the document is written back.
#[derive(Debug, Clone)]
pub struct Document {
    /// Presentation kind declared by the main part
    pub kind: PackageKind,

    /// Name of the main part (usually `ppt/presentation.xml`)
    pub main_part: String,

    /// Document metadata from `docProps/core.xml`
    pub metadata: Metadata,

    /// Slides in presentation order
    pub slides: Vec<Slide>,

    /// All relationships in the package
    pub relationships: Vec<Relationship>,

    parts: Vec<Part>,
    index: HashMap<String, PartId>,
}

impl Document {
    /// Create an empty document of the given kind.
    pub fn new(kind: PackageKind, main_part: impl Into<String>) -> Self {
        Self {
            kind,
            main_part: main_part.into(),
            metadata: Metadata::default(),
            slides: Vec::new(),
            relationships: Vec::new(),
            parts: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a part, returning its id. A part with the same name is replaced in place.
    pub fn add_part(&mut self, part: Part) -> PartId {
        if let Some(&id) = self.index.get(&part.name) {
            self.parts[id.0] = part;
            return id;
        }
        let id = PartId(self.parts.len());
        self.index.insert(part.name.clone(), id);
        self.parts.push(part);
        id
    }

    /// Look up a part id by name.
    pub fn part_id(&self, name: &str) -> Option<PartId> {
        self.index.get(name.trim_start_matches('/')).copied()
    }

    /// Get a part by id.
    pub fn part(&self, id: PartId) -> &Part {
        &self.parts[id.0]
    }

    /// Get a part by name.
    pub fn get_part(&self, name: &str) -> Option<&Part> {
        self.part_id(name).map(|id| &self.parts[id.0])
    }

    /// Get a mutable part by name.
    pub fn get_part_mut(&mut self, name: &str) -> Option<&mut Part> {
        let id = self.part_id(name)?;
        Some(&mut self.parts[id.0])
    }

    /// Check whether a part exists.
    pub fn contains_part(&self, name: &str) -> bool {
        self.part_id(name).is_some()
    }

    /// Iterate parts in container order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// Number of parts.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Relationships whose source is the given part (`None` = package root).
    pub fn relationships_from<'a>(
        &'a self,
        source: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships
            .iter()
            .filter(move |rel| rel.source.as_deref() == source)
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Check if the document has any slides.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.slides
            .iter()
            .map(|slide| slide.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub creator: Option<String>,

    /// Last author
    pub last_modified_by: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// Total number of slides
    pub slide_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new(PackageKind::Presentation, "ppt/presentation.xml");
        doc.add_part(Part::new(
            "ppt/presentation.xml",
            "application/xml",
            Compression::Deflated,
            b"<p:presentation/>".to_vec(),
        ));
        doc.add_part(Part::new(
            "ppt/media/image1.png",
            "image/png",
            Compression::Stored,
            vec![0x89, 0x50, 0x4e, 0x47],
        ));
        doc
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new(PackageKind::Presentation, "ppt/presentation.xml");
        assert!(doc.is_empty());
        assert_eq!(doc.part_count(), 0);
    }

    #[test]
    fn test_part_lookup() {
        let doc = sample();
        assert!(doc.contains_part("ppt/presentation.xml"));
        assert!(doc.contains_part("/ppt/presentation.xml"));
        assert!(doc.get_part("ppt/media/image1.png").is_some());
        assert!(!doc.get_part("ppt/media/image1.png").unwrap().is_xml());
    }

    #[test]
    fn test_clone_shares_payloads_until_written() {
        let blueprint = sample();
        let mut copy = blueprint.clone();

        let original = blueprint.get_part("ppt/presentation.xml").unwrap();
        assert!(copy
            .get_part("ppt/presentation.xml")
            .unwrap()
            .shares_data_with(original));

        copy.get_part_mut("ppt/presentation.xml")
            .unwrap()
            .set_data(b"<p:presentation changed=\"1\"/>".to_vec());

        let changed = copy.get_part("ppt/presentation.xml").unwrap();
        assert!(!changed.shares_data_with(original));
        assert_eq!(original.data(), b"<p:presentation/>");
        assert!(copy
            .get_part("ppt/media/image1.png")
            .unwrap()
            .shares_data_with(blueprint.get_part("ppt/media/image1.png").unwrap()));
    }

    #[test]
    fn test_add_part_replaces_same_name() {
        let mut doc = sample();
        let id = doc.add_part(Part::new(
            "ppt/presentation.xml",
            "application/xml",
            Compression::Deflated,
            b"<x/>".to_vec(),
        ));
        assert_eq!(id, PartId(0));
        assert_eq!(doc.part_count(), 2);
    }
}
