//! XML helpers shared by the package and slide parsers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::model::Metadata;

/// Read an attribute by local name, unescaped.
pub(crate) fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Read an attribute by its full qualified name (e.g. `r:id`).
pub(crate) fn qualified_attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Attributes must be quoted, unique and use known entities.
fn check_attributes(e: &BytesStart<'_>) -> std::result::Result<(), String> {
    for attribute in e.attributes().with_checks(true) {
        let attribute = attribute.map_err(|err| {
            format!(
                "bad attribute on <{}>: {}",
                String::from_utf8_lossy(e.name().as_ref()),
                err
            )
        })?;
        attribute.unescape_value().map_err(|err| {
            format!(
                "bad value for attribute '{}': {}",
                String::from_utf8_lossy(attribute.key.as_ref()),
                err
            )
        })?;
    }
    Ok(())
}

/// Verify that `xml` is a single well-formed element tree.
pub(crate) fn check_well_formed(part_name: &str, xml: &str) -> Result<()> {
    let corrupt = |msg: String| Error::CorruptDocument(format!("{}: {}", part_name, msg));

    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                check_attributes(&e).map_err(corrupt)?;
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                check_attributes(&e).map_err(corrupt)?;
                if depth == 0 {
                    roots += 1;
                }
            }
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| corrupt("unexpected closing tag".into()))?;
            }
            Ok(Event::Text(t)) => {
                if depth == 0 && !t.iter().all(|b| b.is_ascii_whitespace()) {
                    return Err(corrupt("text outside the root element".into()));
                }
                t.unescape().map_err(|e| corrupt(format!("bad text content: {}", e)))?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(corrupt(format!(
                    "malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(corrupt("unclosed element at end of part".into()));
    }
    if roots != 1 {
        return Err(corrupt(format!("expected one root element, found {}", roots)));
    }
    Ok(())
}

/// Parsed `[Content_Types].xml`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse the content-types part.
    pub(crate) fn parse(xml: &str) -> Result<Self> {
        let mut types = ContentTypes::default();
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event()? {
                Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) = (attr(e, b"Extension"), attr(e, b"ContentType"))
                        {
                            types.defaults.insert(ext.to_ascii_lowercase(), ct);
                        }
                    }
                    b"Override" => {
                        if let (Some(name), Some(ct)) = (attr(e, b"PartName"), attr(e, b"ContentType"))
                        {
                            types
                                .overrides
                                .insert(name.trim_start_matches('/').to_string(), ct);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(types)
    }

    /// Media type of a part: override first, then extension default.
    pub(crate) fn content_type_for(&self, part_name: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(part_name) {
            return Some(ct);
        }
        let ext = part_name.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults.get(&ext).map(|s| s.as_str())
    }
}

/// A `Relationship` element before target resolution.
#[derive(Debug, Clone)]
pub(crate) struct RawRelationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// Parse a `.rels` part.
pub(crate) fn parse_relationships(xml: &str) -> Result<Vec<RawRelationship>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let id = attr(e, b"Id").unwrap_or_default();
                    let target = attr(e, b"Target").unwrap_or_default();
                    if id.is_empty() || target.is_empty() {
                        return Err(Error::CorruptDocument(
                            "relationship without Id or Target".into(),
                        ));
                    }
                    rels.push(RawRelationship {
                        id,
                        rel_type: attr(e, b"Type").unwrap_or_default(),
                        target,
                        external: attr(e, b"TargetMode").as_deref() == Some("External"),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Source part of a relationships part.
///
/// `_rels/.rels` belongs to the package (`Some(None)`);
/// `ppt/slides/_rels/slide1.xml.rels` belongs to `ppt/slides/slide1.xml`.
pub(crate) fn rels_source(rels_name: &str) -> Option<Option<String>> {
    let file = rels_name.strip_suffix(".rels")?;
    let (dir, file) = match file.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => return None,
    };
    let owner_dir = dir.strip_suffix("_rels")?.trim_end_matches('/');

    if file.is_empty() && owner_dir.is_empty() {
        return Some(None);
    }
    if owner_dir.is_empty() {
        Some(Some(file.to_string()))
    } else {
        Some(Some(format!("{}/{}", owner_dir, file)))
    }
}

/// Relationships part name for a source part.
pub(crate) fn rels_part_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}

/// Resolve a relationship target against its source part.
pub(crate) fn resolve_target(source: Option<&str>, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_path(absolute);
    }
    let base = source
        .and_then(|s| s.rsplit_once('/').map(|(dir, _)| dir))
        .unwrap_or("");
    if base.is_empty() {
        normalize_path(target)
    } else {
        normalize_path(&format!("{}/{}", base, target))
    }
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Relationship path of `target` as seen from `source` (inverse of [`resolve_target`]).
pub(crate) fn relative_target(source: &str, target: &str) -> String {
    let source_dir: Vec<&str> = source
        .rsplit_once('/')
        .map(|(dir, _)| dir.split('/').collect())
        .unwrap_or_default();
    let target_parts: Vec<&str> = target.split('/').collect();

    let common = source_dir
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<&str> = vec![".."; source_dir.len() - common];
    out.extend_from_slice(&target_parts[common..]);
    out.join("/")
}

/// Slide ids and relationship ids in `p:sldIdLst` order.
pub(crate) fn parse_slide_list(xml: &str) -> Result<Vec<(u32, String)>> {
    let mut slides = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.local_name().as_ref() == b"sldId" {
                    let id = attr(e, b"id").and_then(|v| v.parse().ok()).unwrap_or(0);
                    // r:id is the only namespaced attribute named "id"
                    let rel_id = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.local_name().as_ref() == b"id" && a.key.prefix().is_some())
                        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                    match rel_id {
                        Some(rel_id) => slides.push((id, rel_id)),
                        None => {
                            return Err(Error::CorruptDocument(
                                "slide id without relationship".into(),
                            ))
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(slides)
}

/// Parse `docProps/core.xml`.
pub(crate) fn parse_core_metadata(xml: &str) -> Result<Metadata> {
    let mut metadata = Metadata::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => current = Some(e.local_name().as_ref().to_vec()),
            Event::Text(ref t) => {
                let value = t.unescape()?.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match current.as_deref() {
                    Some(b"title") => metadata.title = Some(value),
                    Some(b"creator") => metadata.creator = Some(value),
                    Some(b"lastModifiedBy") => metadata.last_modified_by = Some(value),
                    Some(b"created") => metadata.created = parse_w3c_date(&value),
                    Some(b"modified") => metadata.modified = parse_w3c_date(&value),
                    _ => {}
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(metadata)
}

fn parse_w3c_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
