//! Rendering module: writes a resolved layout back into a package.
//!
//! The output starts as a clone of the template document, sharing every
//! part payload. Only slide parts with bound placeholders are rewritten, and
//! continuation pages are appended as new parts, so all other parts leave
//! with the template's bytes.

mod json;
mod options;
mod slides;
mod splice;
mod writer;

pub use json::{to_json, JsonFormat};
pub use options::RenderOptions;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::layout::{ResolvedLayout, ResolvedPlaceholder};
use crate::model::Document;
use crate::parser::{parse_slide, CORE_PROPERTIES_REL};

/// Render a resolved layout to package bytes.
pub fn render(layout: &ResolvedLayout) -> Result<Vec<u8>> {
    render_with_options(layout, &RenderOptions::default())
}

/// Render a resolved layout to package bytes with options.
pub fn render_with_options(layout: &ResolvedLayout, options: &RenderOptions) -> Result<Vec<u8>> {
    let doc = apply_layout(layout, options)?;
    writer::write_package(&doc)
}

/// Serialize a document as it is.
pub fn write_document(doc: &Document) -> Result<Vec<u8>> {
    writer::write_package(doc)
}

/// Produce the output document for a layout without serializing it.
pub fn apply_layout(layout: &ResolvedLayout, options: &RenderOptions) -> Result<Document> {
    let template = layout.template().document();
    let mut doc = template.clone();

    let mut by_slide: BTreeMap<usize, Vec<&ResolvedPlaceholder>> = BTreeMap::new();
    for placeholder in &layout.placeholders {
        by_slide
            .entry(placeholder.slot.slide)
            .or_default()
            .push(placeholder);
    }

    for (&index, resolved) in &by_slide {
        let slide = template
            .slides
            .get(index)
            .ok_or_else(|| Error::Render(format!("slide {} does not exist", index + 1)))?;
        let source = template
            .get_part(&slide.part_name)
            .and_then(|p| p.text())
            .ok_or_else(|| Error::Render(format!("missing slide part '{}'", slide.part_name)))?;

        let Some(xml) = slides::render_slide(slide, source, resolved, &HashMap::new(), false)?
        else {
            continue;
        };
        doc.slides[index] = reparse(index, &slide.part_name, &xml)?;
        if let Some(part) = doc.get_part_mut(&slide.part_name) {
            part.set_data(xml.into_bytes());
        }
    }

    for page in &layout.pages {
        let resolved = by_slide
            .get(&page.template_slide)
            .map(|v| v.as_slice())
            .unwrap_or_default();
        let name = slides::append_page(&mut doc, template, page, resolved)?;
        let slide = {
            let xml = doc
                .get_part(&name)
                .and_then(|p| p.text())
                .ok_or_else(|| Error::Render(format!("{} was not written", name)))?;
            reparse(doc.slides.len(), &name, xml)?
        };
        doc.slides.push(slide);
    }
    doc.metadata.slide_count = doc.slides.len() as u32;

    if let Some(timestamp) = options.timestamp {
        stamp_modified(&mut doc, timestamp)?;
    }

    Ok(doc)
}

fn reparse(index: usize, part_name: &str, xml: &str) -> Result<crate::model::Slide> {
    parse_slide(index, part_name, xml)
        .map_err(|e| Error::Render(format!("rendered {} is invalid: {}", part_name, e)))
}

/// Write `timestamp` into `dcterms:modified` of the core properties.
fn stamp_modified(doc: &mut Document, timestamp: DateTime<Utc>) -> Result<()> {
    let Some(core) = doc
        .relationships_from(None)
        .find(|r| r.rel_type == CORE_PROPERTIES_REL)
        .map(|r| r.target.clone())
    else {
        log::debug!("package has no core properties, timestamp not written");
        return Ok(());
    };
    let Some(xml) = doc.get_part(&core).and_then(|p| p.text()) else {
        return Ok(());
    };

    let Some(span) = modified_span(xml)? else {
        log::debug!("{} has no dcterms:modified element", core);
        return Ok(());
    };

    let value = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut out = String::with_capacity(xml.len());
    out.push_str(&xml[..span.start]);
    out.push_str(&value);
    out.push_str(&xml[span.end..]);

    if let Some(part) = doc.get_part_mut(&core) {
        part.set_data(out.into_bytes());
    }
    doc.metadata.modified = Some(timestamp);
    Ok(())
}

/// Byte range of the text inside the `modified` element.
fn modified_span(xml: &str) -> Result<Option<std::ops::Range<usize>>> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| Error::Render(format!("core properties: {}", e)))?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) if e.local_name().as_ref() == b"modified" => inside = true,
            Event::Text(_) if inside => return Ok(Some(start..end)),
            Event::End(_) if inside => return Ok(Some(start..start)),
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PackageKind;
    use crate::model::{Compression, Part, Relationship};
    use chrono::TimeZone;

    const CORE: &str = r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dcterms:created xsi:type="dcterms:W3CDTF">2020-01-01T00:00:00Z</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">2021-02-03T04:05:06Z</dcterms:modified></cp:coreProperties>"#;

    fn document() -> Document {
        let mut doc = Document::new(PackageKind::Presentation, "ppt/presentation.xml");
        doc.add_part(Part::new(
            "docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
            Compression::Deflated,
            CORE.as_bytes().to_vec(),
        ));
        doc.relationships.push(Relationship {
            source: None,
            id: "rId2".into(),
            rel_type: CORE_PROPERTIES_REL.into(),
            target: "docProps/core.xml".into(),
            external: false,
        });
        doc
    }

    #[test]
    fn test_stamp_modified() {
        let mut doc = document();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        stamp_modified(&mut doc, ts).unwrap();

        let xml = doc.get_part("docProps/core.xml").unwrap().text().unwrap();
        assert!(xml.contains(">2024-05-01T12:30:00Z</dcterms:modified>"));
        assert!(xml.contains(">2020-01-01T00:00:00Z</dcterms:created>"));
        assert_eq!(doc.metadata.modified, Some(ts));
    }

    #[test]
    fn test_stamp_without_core_is_noop() {
        let mut doc = Document::new(PackageKind::Presentation, "ppt/presentation.xml");
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert!(stamp_modified(&mut doc, ts).is_ok());
        assert!(doc.metadata.modified.is_none());
    }

    #[test]
    fn test_modified_span() {
        let span = modified_span(CORE).unwrap().unwrap();
        assert_eq!(&CORE[span], "2021-02-03T04:05:06Z");
        assert!(modified_span("<cp:coreProperties/>").unwrap().is_none());
    }
}
