//! Synthetic presentation packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

/// One paragraph of a shape.
#[derive(Clone)]
pub struct Line {
    text: String,
    size: Option<f32>,
    bold: bool,
    bullet: bool,
}

pub fn line(text: &str) -> Line {
    Line {
        text: text.to_string(),
        size: None,
        bold: false,
        bullet: false,
    }
}

impl Line {
    pub fn size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn bullet(mut self) -> Self {
        self.bullet = true;
        self
    }

    fn xml(&self) -> String {
        let ppr = if self.bullet {
            "<a:pPr marL=\"228600\" indent=\"-228600\"><a:buChar char=\"&#8226;\"/></a:pPr>"
        } else {
            ""
        };
        let mut rpr = String::from("<a:rPr lang=\"en-US\"");
        if let Some(size) = self.size {
            rpr.push_str(&format!(" sz=\"{}\"", (size * 100.0).round() as i64));
        }
        if self.bold {
            rpr.push_str(" b=\"1\"");
        }
        rpr.push_str(" dirty=\"0\"/>");
        format!(
            "<a:p>{}<a:r>{}<a:t>{}</a:t></a:r></a:p>",
            ppr,
            rpr,
            escape(self.text.as_str())
        )
    }
}

/// A text shape, optionally carrying placeholder directives in its
/// description.
#[derive(Clone)]
pub struct ShapeSpec {
    pub id: u32,
    pub name: String,
    pub descr: Option<String>,
    pub frame: (i64, i64, i64, i64),
    pub lines: Vec<Line>,
}

pub fn text_shape(id: u32, lines: Vec<Line>) -> ShapeSpec {
    ShapeSpec {
        id,
        name: format!("TextBox {}", id),
        descr: None,
        frame: (457_200, 457_200 + id as i64 * 600_000, 8_229_600, 500_000),
        lines,
    }
}

/// A template placeholder with a one-paragraph prototype.
pub fn placeholder(id: u32, descr: &str) -> ShapeSpec {
    ShapeSpec {
        id,
        name: format!("Placeholder {}", id),
        descr: Some(descr.to_string()),
        frame: (457_200, 457_200 + id as i64 * 600_000, 8_229_600, 500_000),
        lines: vec![line("Click to add text")],
    }
}

impl ShapeSpec {
    pub fn with_descr(mut self, descr: &str) -> Self {
        self.descr = Some(descr.to_string());
        self
    }

    fn xml(&self) -> String {
        let descr = self
            .descr
            .as_deref()
            .map(|d| format!(" descr=\"{}\"", escape(d)))
            .unwrap_or_default();
        let (x, y, cx, cy) = self.frame;
        let paragraphs: String = if self.lines.is_empty() {
            "<a:p><a:endParaRPr lang=\"en-US\"/></a:p>".to_string()
        } else {
            self.lines.iter().map(Line::xml).collect()
        };
        format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"{}\" name=\"{}\"{}/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
             <p:spPr><a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr>\
             <p:txBody><a:bodyPr wrap=\"square\" rtlCol=\"0\"><a:normAutofit/></a:bodyPr><a:lstStyle/>{}</p:txBody></p:sp>",
            self.id,
            escape(self.name.as_str()),
            descr,
            x,
            y,
            cx,
            cy,
            paragraphs
        )
    }
}

#[derive(Clone, Default)]
pub struct SlideSpec {
    pub shapes: Vec<ShapeSpec>,
    pub hidden: bool,
}

pub fn slide(shapes: Vec<ShapeSpec>) -> SlideSpec {
    SlideSpec {
        shapes,
        hidden: false,
    }
}

pub fn hidden_slide(shapes: Vec<ShapeSpec>) -> SlideSpec {
    SlideSpec {
        shapes,
        hidden: true,
    }
}

impl SlideSpec {
    fn xml(&self) -> String {
        let show = if self.hidden { " show=\"0\"" } else { "" };
        let shapes: String = self.shapes.iter().map(ShapeSpec::xml).collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
             xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\"{}>\
             <p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
             <p:grpSpPr/>{}\
             <p:pic><p:nvPicPr><p:cNvPr id=\"99\" name=\"Logo\"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>\
             <p:blipFill><a:blip r:embed=\"rId2\"/></p:blipFill><p:spPr/></p:pic>\
             </p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
            show, shapes
        )
    }
}

/// Builds `.pptx` bytes.
#[derive(Clone, Default)]
pub struct DeckBuilder {
    slides: Vec<SlideSpec>,
    strict: bool,
}

const SLIDE_CT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, slide: SlideSpec) -> Self {
        self.slides.push(slide);
        self
    }

    /// Use the Strict conformance relationship namespace.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn parts(&self) -> Vec<(String, Vec<u8>)> {
        let mut types = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Default Extension=\"png\" ContentType=\"image/png\"/>\
             <Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
             <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>",
        );
        for i in 1..=self.slides.len() {
            types.push_str(&format!(
                "<Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"{}\"/>",
                i, SLIDE_CT
            ));
        }
        types.push_str("</Types>");

        let office_rel = if self.strict {
            "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument".to_string()
        } else {
            format!("{}/officeDocument", OFFICE_REL)
        };
        let root_rels = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <Relationships xmlns=\"{ns}\">\
             <Relationship Id=\"rId1\" Type=\"{office}\" Target=\"ppt/presentation.xml\"/>\
             <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
             </Relationships>",
            ns = REL_NS,
            office = office_rel
        );

        let mut slide_ids = String::new();
        let mut pres_rels = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n<Relationships xmlns=\"{}\">",
            REL_NS
        );
        for i in 1..=self.slides.len() {
            slide_ids.push_str(&format!(
                "<p:sldId id=\"{}\" r:id=\"rId{}\"/>",
                255 + i,
                i + 1
            ));
            pres_rels.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"{}/slide\" Target=\"slides/slide{}.xml\"/>",
                i + 1,
                OFFICE_REL,
                i
            ));
        }
        pres_rels.push_str("</Relationships>");

        let presentation = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <p:presentation xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
             xmlns:r=\"{}\" \
             xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" saveSubsetFonts=\"1\">\
             <p:sldIdLst>{}</p:sldIdLst>\
             <p:sldSz cx=\"9144000\" cy=\"6858000\" type=\"screen4x3\"/><p:notesSz cx=\"6858000\" cy=\"9144000\"/>\
             </p:presentation>",
            OFFICE_REL, slide_ids
        );

        let core = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
             xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
             xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
             <dc:title>Résumé</dc:title><dc:creator>Test</dc:creator>\
             <dcterms:created xsi:type=\"dcterms:W3CDTF\">2023-01-02T03:04:05Z</dcterms:created>\
             <dcterms:modified xsi:type=\"dcterms:W3CDTF\">2023-01-02T03:04:05Z</dcterms:modified>\
             </cp:coreProperties>";

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), types.into_bytes()),
            ("_rels/.rels".to_string(), root_rels.into_bytes()),
            ("docProps/core.xml".to_string(), core.as_bytes().to_vec()),
            ("ppt/presentation.xml".to_string(), presentation.into_bytes()),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                pres_rels.into_bytes(),
            ),
        ];
        for (i, slide) in self.slides.iter().enumerate() {
            parts.push((
                format!("ppt/slides/slide{}.xml", i + 1),
                slide.xml().into_bytes(),
            ));
            let rels = format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
                 <Relationships xmlns=\"{}\">\
                 <Relationship Id=\"rId2\" Type=\"{}/image\" Target=\"../media/image1.png\"/>\
                 </Relationships>",
                REL_NS, OFFICE_REL
            );
            parts.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                rels.into_bytes(),
            ));
        }
        parts.push(("ppt/media/image1.png".to_string(), PNG.to_vec()));
        parts
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in self.parts() {
            let method = if name.ends_with(".png") {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            let options = SimpleFileOptions::default().compression_method(method);
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(&data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

/// Every entry of a zip archive, in archive order.
pub fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

/// One entry of a zip archive.
pub fn read_entry(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    read_entries(bytes)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, data)| data)
}
