//! Presentation package parser using zip and quick-xml.

use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::Path;

use zip::{CompressionMethod, ZipArchive};

use crate::detect::{check_office_document_rel, detect_format_from_bytes, PackageKind};
use crate::error::{Error, Result};
use crate::model::{Compression, Document, Metadata, Part, Relationship, Slide};

use super::options::ParseOptions;
use super::slide::parse_slide;
use super::xml::{
    check_well_formed, parse_core_metadata, parse_relationships, parse_slide_list, rels_source,
    resolve_target, ContentTypes,
};

/// Name of the content-types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

pub(crate) const CORE_PROPERTIES_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

pub(crate) const SLIDE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

/// Presentation package parser.
pub struct PackageParser {
    data: Vec<u8>,
    options: ParseOptions,
}

impl PackageParser {
    /// Open a package file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a package file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::read(path, e))?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Parse a package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a package from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        detect_format_from_bytes(data)?;
        Ok(Self {
            data: data.to_vec(),
            options,
        })
    }

    /// Parse a package from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse a package from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Parse the package into a document.
    pub fn parse(&self) -> Result<Document> {
        let entries = self.read_entries()?;

        let content_types = entries
            .iter()
            .find(|(name, _, _)| name == CONTENT_TYPES_PART)
            .ok_or_else(|| Error::CorruptDocument("missing [Content_Types].xml".into()))
            .and_then(|(_, _, data)| {
                let xml = utf8(CONTENT_TYPES_PART, data)?;
                check_well_formed(CONTENT_TYPES_PART, xml)?;
                ContentTypes::parse(xml)
            })?;

        let mut parts = Vec::with_capacity(entries.len());
        for (name, compression, data) in entries {
            let content_type = if name == CONTENT_TYPES_PART {
                String::new()
            } else {
                content_types
                    .content_type_for(&name)
                    .unwrap_or("application/octet-stream")
                    .to_string()
            };
            let part = Part::new(name, content_type, compression, data);
            if part.is_xml() && part.name != CONTENT_TYPES_PART {
                let xml = utf8(&part.name, part.data())?;
                check_well_formed(&part.name, xml)?;
            }
            parts.push(part);
        }

        let relationships = collect_relationships(&parts)?;

        let main_part = find_main_part(&relationships)?;
        let main_type = parts
            .iter()
            .find(|p| p.name == main_part)
            .map(|p| p.content_type.clone())
            .ok_or_else(|| {
                Error::CorruptDocument(format!("main part '{}' is missing", main_part))
            })?;
        let kind = PackageKind::from_content_type(&main_type)?;

        let mut doc = Document::new(kind, main_part);
        for part in parts {
            doc.add_part(part);
        }
        doc.relationships = relationships;

        for rel in doc.relationships.iter().filter(|r| !r.external) {
            if !doc.contains_part(&rel.target) {
                return Err(Error::CorruptDocument(format!(
                    "relationship {} from '{}' points at missing part '{}'",
                    rel.id,
                    rel.source.as_deref().unwrap_or("/"),
                    rel.target
                )));
            }
        }

        doc.slides = self.parse_slides(&doc)?;
        doc.metadata = extract_metadata(&doc)?;
        doc.metadata.slide_count = doc.slides.len() as u32;

        log::debug!(
            "parsed {} with {} parts and {} slides",
            doc.kind,
            doc.part_count(),
            doc.slide_count()
        );

        Ok(doc)
    }

    /// Read every zip entry, enforcing the size limits.
    fn read_entries(&self) -> Result<Vec<(String, Compression, Vec<u8>)>> {
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))?;
        let mut entries = Vec::with_capacity(archive.len());
        let mut seen = HashSet::new();
        let mut total: u64 = 0;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            if !seen.insert(name.clone()) {
                return Err(Error::CorruptDocument(format!(
                    "duplicate part name '{}'",
                    name
                )));
            }

            let declared = file.size();
            self.check_part_size(&name, declared)?;
            total = total.saturating_add(declared);
            if self.options.max_package_bytes > 0 && total > self.options.max_package_bytes {
                return Err(Error::CorruptDocument(format!(
                    "package exceeds {} bytes uncompressed",
                    self.options.max_package_bytes
                )));
            }

            let compression = match file.compression() {
                CompressionMethod::Stored => Compression::Stored,
                _ => Compression::Deflated,
            };

            let mut data = Vec::with_capacity(declared.min(1 << 20) as usize);
            let limit = match self.options.max_part_bytes {
                0 => u64::MAX,
                n => n + 1,
            };
            (&mut file)
                .take(limit)
                .read_to_end(&mut data)
                .map_err(|e| Error::CorruptDocument(format!("{}: {}", name, e)))?;
            self.check_part_size(&name, data.len() as u64)?;

            entries.push((name, compression, data));
        }

        Ok(entries)
    }

    fn check_part_size(&self, name: &str, size: u64) -> Result<()> {
        if self.options.max_part_bytes > 0 && size > self.options.max_part_bytes {
            return Err(Error::CorruptDocument(format!(
                "part '{}' exceeds {} bytes",
                name, self.options.max_part_bytes
            )));
        }
        Ok(())
    }

    /// Decode slides in presentation order.
    fn parse_slides(&self, doc: &Document) -> Result<Vec<Slide>> {
        let main = doc
            .get_part(&doc.main_part)
            .and_then(|p| p.text())
            .ok_or_else(|| Error::CorruptDocument("main part is not readable".into()))?;

        let mut slides = Vec::new();
        for (index, (_, rel_id)) in parse_slide_list(main)?.into_iter().enumerate() {
            let rel = doc
                .relationships_from(Some(doc.main_part.as_str()))
                .find(|r| r.id == rel_id)
                .ok_or_else(|| {
                    Error::CorruptDocument(format!("slide relationship {} not found", rel_id))
                })?;
            if rel.rel_type != SLIDE_REL {
                log::warn!("slide list entry {} has relationship type {}", rel_id, rel.rel_type);
            }

            if !self.options.parse_slides {
                slides.push(Slide::new(index, rel.target.clone()));
                continue;
            }

            let xml = doc
                .get_part(&rel.target)
                .and_then(|p| p.text())
                .ok_or_else(|| {
                    Error::CorruptDocument(format!("slide part '{}' is not readable", rel.target))
                })?;
            slides.push(parse_slide(index, &rel.target, xml)?);
        }

        Ok(slides)
    }
}

fn utf8<'a>(name: &str, data: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(data)
        .map_err(|_| Error::CorruptDocument(format!("{}: XML part is not valid UTF-8", name)))
}

fn collect_relationships(parts: &[Part]) -> Result<Vec<Relationship>> {
    let mut relationships = Vec::new();
    for part in parts.iter().filter(|p| p.is_relationships()) {
        let Some(source) = rels_source(&part.name) else {
            log::warn!("ignoring relationships part with unexpected name '{}'", part.name);
            continue;
        };
        let xml = utf8(&part.name, part.data())?;
        for raw in parse_relationships(xml)? {
            let target = if raw.external {
                raw.target
            } else {
                resolve_target(source.as_deref(), &raw.target)
            };
            relationships.push(Relationship {
                source: source.clone(),
                id: raw.id,
                rel_type: raw.rel_type,
                target,
                external: raw.external,
            });
        }
    }
    Ok(relationships)
}

fn find_main_part(relationships: &[Relationship]) -> Result<String> {
    for rel in relationships.iter().filter(|r| r.source.is_none()) {
        if check_office_document_rel(&rel.rel_type)? {
            return Ok(rel.target.clone());
        }
    }
    Err(Error::CorruptDocument(
        "package has no officeDocument relationship".into(),
    ))
}

fn extract_metadata(doc: &Document) -> Result<Metadata> {
    let core = doc
        .relationships_from(None)
        .find(|r| r.rel_type == CORE_PROPERTIES_REL)
        .and_then(|r| doc.get_part(&r.target))
        .and_then(|p| p.text());

    match core {
        Some(xml) => parse_core_metadata(xml),
        None => Ok(Metadata::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            for (name, body) in entries {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    const TYPES: &str = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/></Types>"#;
    const ROOT_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#;
    const PRES: &str = r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
    const PRES_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/></Relationships>"#;
    const SLIDE: &str = r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree/></p:cSld></p:sld>"#;

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("[Content_Types].xml", TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("ppt/presentation.xml", PRES),
            ("ppt/_rels/presentation.xml.rels", PRES_RELS),
            ("ppt/slides/slide1.xml", SLIDE),
        ]
    }

    #[test]
    fn test_parse_minimal_package() {
        let data = build(&minimal());
        let doc = PackageParser::from_bytes(&data).unwrap().parse().unwrap();

        assert_eq!(doc.kind, PackageKind::Presentation);
        assert_eq!(doc.main_part, "ppt/presentation.xml");
        assert_eq!(doc.slide_count(), 1);
        assert_eq!(doc.slides[0].part_name, "ppt/slides/slide1.xml");
        assert_eq!(doc.part_count(), 5);
        assert_eq!(doc.metadata.slide_count, 1);
    }

    #[test]
    fn test_dangling_relationship_is_corrupt() {
        let mut entries = minimal();
        entries.pop();
        let data = build(&entries);
        let err = PackageParser::from_bytes(&data).unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::CorruptDocument(_)));
    }

    #[test]
    fn test_malformed_part_is_corrupt() {
        let mut entries = minimal();
        entries[4] = ("ppt/slides/slide1.xml", "<p:sld><p:cSld></p:sld>");
        let data = build(&entries);
        let err = PackageParser::from_bytes(&data).unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::CorruptDocument(_)));
    }

    #[test]
    fn test_word_package_is_unsupported() {
        let types = TYPES.replace(
            "presentationml.presentation.main+xml",
            "wordprocessingml.document.main+xml",
        );
        let mut entries: Vec<(&str, &str)> = minimal();
        entries[0] = ("[Content_Types].xml", types.as_str());
        let data = build(&entries);
        let err = PackageParser::from_bytes(&data).unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_part_size_limit() {
        let data = build(&minimal());
        let options = ParseOptions {
            max_part_bytes: 64,
            ..Default::default()
        };
        let err = PackageParser::from_bytes_with_options(&data, options)
            .unwrap()
            .parse()
            .unwrap_err();
        assert!(matches!(err, Error::CorruptDocument(_)));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            PackageParser::from_bytes(b"%PDF-1.7 not a deck"),
            Err(Error::CorruptDocument(_))
        ));
    }
}
