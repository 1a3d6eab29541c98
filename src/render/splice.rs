//! Text body rewriting.
//!
//! A bound text body is rebuilt from the template's own pieces: the
//! original `p:txBody` tag, `a:bodyPr` and `a:lstStyle`, and for every new
//! paragraph the `a:pPr`, `a:rPr` and `a:endParaRPr` of a template paragraph.
//! The result replaces the body's byte span; the rest of the part is copied.

use std::ops::Range;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::model::{Paragraph, TextBody};

/// New content for one text body.
#[derive(Debug, Clone)]
pub(crate) struct BodyContent<'a> {
    pub paragraphs: &'a [String],

    /// Font size to write, when it differs from the template's
    pub font_size: Option<f32>,
}

impl<'a> BodyContent<'a> {
    pub(crate) fn empty() -> Self {
        Self {
            paragraphs: &[],
            font_size: None,
        }
    }
}

/// Replacement of one byte range.
#[derive(Debug, Clone)]
pub(crate) struct Edit {
    pub span: Range<usize>,
    pub xml: String,
}

/// Rebuild `body` (whose bytes are `source[body.span]`) around new content.
pub(crate) fn text_body_xml(
    body: &TextBody,
    source: &str,
    content: &BodyContent<'_>,
) -> Result<String> {
    let original = source
        .get(body.span.clone())
        .ok_or_else(|| Error::Render("text body span outside its part".into()))?;
    let open_end = original
        .find('>')
        .ok_or_else(|| Error::Render("text body without a start tag".into()))?;
    let open_tag = &original[..=open_end];
    let tag_name = element_name(open_tag);

    let prefix = drawing_prefix(&body.body_props_xml);

    let mut xml = String::with_capacity(original.len());
    match open_tag.strip_suffix("/>") {
        Some(head) => {
            xml.push_str(head.trim_end());
            xml.push('>');
        }
        None => xml.push_str(open_tag),
    }

    if body.body_props_xml.is_empty() {
        xml.push_str(&format!("<{}bodyPr/>", prefix));
    } else {
        xml.push_str(&body.body_props_xml);
    }
    if let Some(list_style) = &body.list_style_xml {
        xml.push_str(list_style);
    }

    if content.paragraphs.is_empty() {
        let proto = body.paragraphs.first();
        write_paragraph(&mut xml, &prefix, proto, None, content.font_size)?;
    }
    for (i, text) in content.paragraphs.iter().enumerate() {
        let proto = body
            .paragraphs
            .get(i.min(body.paragraphs.len().saturating_sub(1)));
        write_paragraph(&mut xml, &prefix, proto, Some(text), content.font_size)?;
    }

    xml.push_str(&format!("</{}>", tag_name));
    Ok(xml)
}

fn write_paragraph(
    xml: &mut String,
    prefix: &str,
    proto: Option<&Paragraph>,
    text: Option<&str>,
    font_size: Option<f32>,
) -> Result<()> {
    xml.push_str(&format!("<{}p>", prefix));

    if let Some(props) = proto.and_then(|p| p.props_xml.as_deref()) {
        xml.push_str(props);
    }

    if let Some(text) = text {
        let run_props = proto.and_then(|p| {
            p.runs
                .iter()
                .filter(|r| r.text != "\n")
                .find_map(|r| r.props_xml.as_deref())
        });
        xml.push_str(&format!("<{}r>", prefix));
        match (run_props, font_size) {
            (Some(props), Some(size)) => {
                xml.push_str(&set_attribute(props, "sz", Some(&sz(size)))?)
            }
            (Some(props), None) => xml.push_str(props),
            (None, Some(size)) => xml.push_str(&format!("<{}rPr sz=\"{}\"/>", prefix, sz(size))),
            (None, None) => {}
        }
        xml.push_str(&format!("<{}t>{}</{}t>", prefix, escape(text), prefix));
        xml.push_str(&format!("</{}r>", prefix));
    }

    match (proto.and_then(|p| p.end_props_xml.as_deref()), font_size) {
        (Some(props), Some(size)) => {
            xml.push_str(&set_attribute(props, "sz", Some(&sz(size)))?)
        }
        (Some(props), None) => xml.push_str(props),
        (None, _) => {}
    }

    xml.push_str(&format!("</{}p>", prefix));
    Ok(())
}

/// DrawingML size attribute value: hundredths of a point.
fn sz(size: f32) -> String {
    ((size * 100.0).round() as u32).to_string()
}

/// Namespace prefix of the DrawingML elements, taken from `a:bodyPr`.
fn drawing_prefix(body_props: &str) -> String {
    let name = element_name(body_props);
    match name.split_once(':') {
        Some((prefix, _)) => format!("{}:", prefix),
        None if body_props.is_empty() => "a:".to_string(),
        None => String::new(),
    }
}

/// Qualified name of the first tag in `tag`.
fn element_name(tag: &str) -> &str {
    let rest = tag.trim_start().trim_start_matches('<');
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Rewrite one attribute on the first element of `xml`, leaving the rest
/// of the text untouched. `None` removes the attribute.
pub(crate) fn set_attribute(xml: &str, key: &str, value: Option<&str>) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| Error::Render(format!("cannot rewrite element: {}", e)))?;
        let end = reader.buffer_position() as usize;

        let (tag, empty) = match event {
            Event::Start(tag) => (tag, false),
            Event::Empty(tag) => (tag, true),
            Event::Eof => return Err(Error::Render("no element to rewrite".into())),
            _ => continue,
        };

        let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
        let mut rewritten = BytesStart::new(name);
        let mut found = false;
        for attribute in tag.attributes().with_checks(false).flatten() {
            if attribute.key.as_ref() == key.as_bytes() {
                found = true;
                if let Some(value) = value {
                    rewritten.push_attribute((key, value));
                }
            } else {
                rewritten.push_attribute(attribute);
            }
        }
        if !found {
            if let Some(value) = value {
                rewritten.push_attribute((key, value));
            }
        }

        let mut writer = Writer::new(Vec::new());
        let event = if empty {
            Event::Empty(rewritten)
        } else {
            Event::Start(rewritten)
        };
        writer
            .write_event(event)
            .map_err(|e| Error::Render(format!("cannot write element: {}", e)))?;
        let tag_xml = String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Render(format!("element is not UTF-8: {}", e)))?;

        let mut out = String::with_capacity(xml.len() + 16);
        out.push_str(&xml[..start]);
        out.push_str(&tag_xml);
        out.push_str(&xml[end..]);
        return Ok(out);
    }
}

/// Byte offset and qualified name of the last closing tag with local name
/// `local`.
pub(crate) fn closing_tag(xml: &str, local: &[u8]) -> Result<Option<(usize, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut found = None;

    loop {
        let start = reader.buffer_position() as usize;
        match reader
            .read_event()
            .map_err(|e| Error::Render(format!("cannot scan part: {}", e)))?
        {
            Event::End(ref e) if e.local_name().as_ref() == local => {
                found = Some((start, String::from_utf8_lossy(e.name().as_ref()).into_owned()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(found)
}

/// Insert `fragment` right before the last closing tag named `local`.
pub(crate) fn insert_before_close(
    part_name: &str,
    xml: &str,
    local: &str,
    fragment: &str,
) -> Result<String> {
    let (offset, _) = closing_tag(xml, local.as_bytes())?
        .ok_or_else(|| Error::Render(format!("{}: no {} element", part_name, local)))?;
    let mut out = String::with_capacity(xml.len() + fragment.len());
    out.push_str(&xml[..offset]);
    out.push_str(fragment);
    out.push_str(&xml[offset..]);
    Ok(out)
}

/// Apply byte-range replacements to a part.
pub(crate) fn splice(part_name: &str, xml: &str, mut edits: Vec<Edit>) -> Result<String> {
    edits.sort_by_key(|e| e.span.start);
    for pair in edits.windows(2) {
        if pair[0].span.end > pair[1].span.start {
            return Err(Error::Render(format!(
                "{}: overlapping text bodies at byte {}",
                part_name, pair[1].span.start
            )));
        }
    }

    let mut out = xml.to_string();
    for edit in edits.iter().rev() {
        if edit.span.end > out.len() || !out.is_char_boundary(edit.span.start) {
            return Err(Error::Render(format!(
                "{}: text body span {:?} is out of range",
                part_name, edit.span
            )));
        }
        out.replace_range(edit.span.clone(), &edit.xml);
    }
    Ok(out)
}
