//! Continuation slides.
//!
//! A continuation page is a copy of a template slide appended to the end of
//! the presentation. Adding one touches four places: the new slide part, its
//! relationships part, `p:sldIdLst` in the main part with a matching
//! relationship, and a content-type override.

use std::collections::HashMap;

use quick_xml::escape::escape;

use super::splice::{
    closing_tag, insert_before_close, set_attribute, splice, text_body_xml, BodyContent, Edit,
};
use crate::error::{Error, Result};
use crate::layout::{ContinuationPage, ResolvedPlaceholder};
use crate::model::{Document, Part, Relationship, Slide};
use crate::parser::xml::{
    parse_relationships, parse_slide_list, rels_part_for, relative_target, ContentTypes,
};
use crate::parser::{CONTENT_TYPES_PART, SLIDE_REL};

const NOTES_SLIDE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const OFFICE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Rewrite the bound text bodies of one slide.
///
/// `fills` holds content for continuation placeholders; continuation
/// placeholders without a fill are emptied when `clear_continuations` is set.
pub(crate) fn render_slide(
    slide: &Slide,
    source: &str,
    resolved: &[&ResolvedPlaceholder],
    fills: &HashMap<u32, BodyContent<'_>>,
    clear_continuations: bool,
) -> Result<Option<String>> {
    let mut edits = Vec::new();

    for shape in &slide.shapes {
        let Some(body) = &shape.text else { continue };

        let content = if let Some(p) = resolved.iter().find(|p| p.slot.shape_id == shape.id) {
            BodyContent {
                paragraphs: &p.paragraphs,
                font_size: p.font_changed().then_some(p.font_size),
            }
        } else if let Some(fill) = fills.get(&shape.id) {
            fill.clone()
        } else if clear_continuations && shape.placeholder().is_some_and(|s| s.continuation) {
            BodyContent::empty()
        } else {
            continue;
        };

        edits.push(Edit {
            span: body.span.clone(),
            xml: text_body_xml(body, source, &content)?,
        });
    }

    if edits.is_empty() {
        return Ok(None);
    }
    splice(&slide.part_name, source, edits).map(Some)
}

/// Append one continuation page to `doc`, returning the new slide part name.
///
/// `template` is the blueprint document; `resolved` are the placeholders
/// resolved on the cloned slide.
pub(crate) fn append_page(
    doc: &mut Document,
    template: &Document,
    page: &ContinuationPage,
    resolved: &[&ResolvedPlaceholder],
) -> Result<String> {
    let slide = template.slides.get(page.template_slide).ok_or_else(|| {
        Error::Render(format!("continuation slide {} does not exist", page.template_slide))
    })?;
    let source_part = template
        .get_part(&slide.part_name)
        .ok_or_else(|| Error::Render(format!("missing slide part '{}'", slide.part_name)))?;
    let source = source_part
        .text()
        .ok_or_else(|| Error::Render(format!("{} is not UTF-8", slide.part_name)))?;

    let fills: HashMap<u32, BodyContent<'_>> = page
        .fills
        .iter()
        .map(|fill| {
            (
                fill.shape_id,
                BodyContent {
                    paragraphs: &fill.paragraphs,
                    font_size: None,
                },
            )
        })
        .collect();

    let xml = render_slide(slide, source, resolved, &fills, true)?
        .unwrap_or_else(|| source.to_string());
    let xml = if slide.hidden {
        set_attribute(&xml, "show", None)?
    } else {
        xml
    };

    let name = next_slide_name(doc, &slide.part_name);
    doc.add_part(Part::new(
        name.clone(),
        source_part.content_type.clone(),
        source_part.compression,
        xml.into_bytes(),
    ));

    copy_relationships(doc, template, &slide.part_name, &name)?;
    register_slide(doc, &name, &source_part.content_type)?;

    log::debug!(
        "appended continuation page {} as {} (from slide {})",
        page.page + 1,
        name,
        page.template_slide + 1
    );
    Ok(name)
}

/// First free `slideN.xml` name next to `source`.
fn next_slide_name(doc: &Document, source: &str) -> String {
    let dir = source.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let mut n = doc.slides.len() + 1;
    loop {
        let name = if dir.is_empty() {
            format!("slide{}.xml", n)
        } else {
            format!("{}/slide{}.xml", dir, n)
        };
        if !doc.contains_part(&name) {
            return name;
        }
        n += 1;
    }
}

/// Copy the source slide's relationships to the clone, minus notes.
fn copy_relationships(
    doc: &mut Document,
    template: &Document,
    source: &str,
    target: &str,
) -> Result<()> {
    let rels_name = rels_part_for(source);
    let Some(rels_part) = template.get_part(&rels_name) else {
        return Ok(());
    };
    let xml = rels_part
        .text()
        .ok_or_else(|| Error::Render(format!("{} is not UTF-8", rels_name)))?;

    let mut out =
        String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n");
    out.push_str(&format!("<Relationships xmlns=\"{}\">", RELATIONSHIPS_NS));
    for rel in parse_relationships(xml)? {
        if rel.rel_type == NOTES_SLIDE_REL {
            continue;
        }
        out.push_str(&relationship_xml(&rel.id, &rel.rel_type, &rel.target, rel.external));
    }
    out.push_str("</Relationships>");

    let copied: Vec<Relationship> = template
        .relationships_from(Some(source))
        .filter(|r| r.rel_type != NOTES_SLIDE_REL)
        .map(|r| Relationship {
            source: Some(target.to_string()),
            ..r.clone()
        })
        .collect();
    doc.relationships.extend(copied);

    doc.add_part(Part::new(
        rels_part_for(target),
        rels_part.content_type.clone(),
        rels_part.compression,
        out.into_bytes(),
    ));
    Ok(())
}

/// Add the slide to `p:sldIdLst`, the main part's relationships and the
/// content types.
fn register_slide(doc: &mut Document, name: &str, content_type: &str) -> Result<()> {
    let main_part = doc.main_part.clone();
    let main_rels = rels_part_for(&main_part);

    let rel_id = next_relationship_id(doc, &main_part);
    let rels_xml = part_text(doc, &main_rels)?;
    let rels_xml = insert_before_close(
        &main_rels,
        &rels_xml,
        "Relationships",
        &relationship_xml(&rel_id, SLIDE_REL, &relative_target(&main_part, name), false),
    )?;
    set_part_text(doc, &main_rels, rels_xml)?;
    doc.relationships.push(Relationship {
        source: Some(main_part.clone()),
        id: rel_id.clone(),
        rel_type: SLIDE_REL.to_string(),
        target: name.to_string(),
        external: false,
    });

    let main_xml = part_text(doc, &main_part)?;
    let slide_id = parse_slide_list(&main_xml)?
        .iter()
        .map(|(id, _)| *id)
        .max()
        .unwrap_or(255)
        .max(255)
        + 1;
    let (_, list_tag) = closing_tag(&main_xml, b"sldIdLst")?
        .ok_or_else(|| Error::Render(format!("{}: no slide list", main_part)))?;
    let prefix = list_tag
        .split_once(':')
        .map(|(p, _)| format!("{}:", p))
        .unwrap_or_default();
    let entry = format!(
        "<{}sldId id=\"{}\" {}=\"{}\"/>",
        prefix,
        slide_id,
        relationship_attribute(&main_xml),
        rel_id
    );
    let main_xml = insert_before_close(&main_part, &main_xml, "sldIdLst", &entry)?;
    set_part_text(doc, &main_part, main_xml)?;

    let types_xml = part_text(doc, CONTENT_TYPES_PART)?;
    let types = ContentTypes::parse(&types_xml)?;
    let mut overrides = String::new();
    if types.content_type_for(name) != Some(content_type) {
        overrides.push_str(&override_xml(name, content_type));
    }
    let rels_name = rels_part_for(name);
    if let Some(rels) = doc.get_part(&rels_name) {
        if types.content_type_for(&rels_name).is_none() {
            overrides.push_str(&override_xml(&rels_name, &rels.content_type));
        }
    }
    if !overrides.is_empty() {
        let types_xml = insert_before_close(CONTENT_TYPES_PART, &types_xml, "Types", &overrides)?;
        set_part_text(doc, CONTENT_TYPES_PART, types_xml)?;
    }

    Ok(())
}

/// Qualified name of the relationship-id attribute used on `p:sldId`.
fn relationship_attribute(main_xml: &str) -> String {
    for decl in main_xml.split("xmlns:").skip(1) {
        let Some((prefix, value)) = decl.split_once('=') else {
            continue;
        };
        let value = value.trim_start();
        let Some(quote) = value.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let declared = value[1..]
            .strip_prefix(OFFICE_RELATIONSHIPS_NS)
            .is_some_and(|rest| rest.starts_with(quote));
        if declared {
            return format!("{}:id", prefix.trim());
        }
    }
    "r:id".to_string()
}

fn next_relationship_id(doc: &Document, source: &str) -> String {
    let taken: Vec<&str> = doc
        .relationships_from(Some(source))
        .map(|r| r.id.as_str())
        .collect();
    let mut n = taken
        .iter()
        .filter_map(|id| id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0)
        + 1;
    loop {
        let id = format!("rId{}", n);
        if !taken.contains(&id.as_str()) {
            return id;
        }
        n += 1;
    }
}

fn relationship_xml(id: &str, rel_type: &str, target: &str, external: bool) -> String {
    format!(
        "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{}/>",
        escape(id),
        escape(rel_type),
        escape(target),
        if external { " TargetMode=\"External\"" } else { "" }
    )
}

fn override_xml(name: &str, content_type: &str) -> String {
    format!(
        "<Override PartName=\"/{}\" ContentType=\"{}\"/>",
        escape(name),
        escape(content_type)
    )
}

fn part_text(doc: &Document, name: &str) -> Result<String> {
    doc.get_part(name)
        .and_then(|p| p.text())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Render(format!("part '{}' is missing or not UTF-8", name)))
}

fn set_part_text(doc: &mut Document, name: &str, xml: String) -> Result<()> {
    let part = doc
        .get_part_mut(name)
        .ok_or_else(|| Error::Render(format!("part '{}' is missing", name)))?;
    part.set_data(xml.into_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_attribute() {
        let xml = r#"<p:presentation xmlns:a="x" xmlns:rel="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/>"#;
        assert_eq!(relationship_attribute(xml), "rel:id");
        assert_eq!(relationship_attribute("<p:presentation/>"), "r:id");
    }

    #[test]
    fn test_relationship_xml() {
        assert_eq!(
            relationship_xml("rId3", SLIDE_REL, "slides/slide3.xml", false),
            format!(
                "<Relationship Id=\"rId3\" Type=\"{}\" Target=\"slides/slide3.xml\"/>",
                SLIDE_REL
            )
        );
        assert!(relationship_xml("rId9", "t", "http://x?a=1&b=2", true)
            .ends_with("Target=\"http://x?a=1&amp;b=2\" TargetMode=\"External\"/>"));
    }
}
