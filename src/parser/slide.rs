//! Slide part decoding.
//!
//! The scanner walks a slide part once and records, next to the decoded
//! shapes and runs, the byte span of every text body and the raw XML of the
//! property elements. The renderer splices on those spans, so everything
//! outside a replaced text body keeps its original bytes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::model::{
    Frame, Insets, Paragraph, PlaceholderSpec, Run, RunStyle, Shape, ShapeKind, Slide, TextBody,
};

use super::xml::attr;

/// Decode one slide part.
pub(crate) fn parse_slide(index: usize, part_name: &str, xml: &str) -> Result<Slide> {
    let mut slide = Slide::new(index, part_name);
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape: Option<ShapeBuilder> = None;
    let mut capture: Option<Capture> = None;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            Error::CorruptDocument(format!("{}: malformed XML: {}", part_name, e))
        })?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) => {
                let local = e.local_name().as_ref().to_vec();
                if stack.is_empty() && local == b"sld" {
                    slide.hidden = attr(e, b"show").as_deref() == Some("0");
                }
                if local == b"sp" {
                    shape = Some(ShapeBuilder::default());
                }
                if let Some(builder) = shape.as_mut() {
                    builder.open(&local, e, &stack, start, &mut capture, stack.len());
                }
                stack.push(local);
            }
            Event::Empty(ref e) => {
                let local = e.local_name().as_ref().to_vec();
                if let Some(builder) = shape.as_mut() {
                    builder.open(&local, e, &stack, start, &mut capture, stack.len());
                    builder.close(&local, &xml[start..end], end, &mut capture, stack.len());
                }
            }
            Event::End(ref e) => {
                stack.pop();
                let local = e.local_name().as_ref().to_vec();
                if let Some(builder) = shape.as_mut() {
                    let raw_start = capture.as_ref().map(|c| c.start).unwrap_or(start);
                    builder.close(&local, &xml[raw_start..end], end, &mut capture, stack.len());
                }
                if local == b"sp" {
                    if let Some(builder) = shape.take() {
                        slide.shapes.push(builder.finish(part_name));
                    }
                }
            }
            Event::Text(ref t) => {
                if let Some(builder) = shape.as_mut() {
                    if builder.in_text {
                        let text = t.unescape().map_err(|e| {
                            Error::CorruptDocument(format!("{}: bad text: {}", part_name, e))
                        })?;
                        builder.push_text(&text);
                    }
                }
            }
            Event::CData(ref t) => {
                if let Some(builder) = shape.as_mut() {
                    if builder.in_text {
                        builder.push_text(&String::from_utf8_lossy(t));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(slide)
}

/// An element whose raw XML is being captured.
struct Capture {
    start: usize,
    depth: usize,
}

#[derive(Default)]
struct ShapeBuilder {
    id: u32,
    name: String,
    descr: String,
    ph_type: Option<String>,
    frame: Frame,
    in_sp_pr: bool,

    body_start: Option<usize>,
    body: Option<TextBody>,
    body_props_xml: String,
    list_style_xml: Option<String>,
    insets: Insets,

    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_run_props: bool,
    in_text: bool,
}

impl ShapeBuilder {
    fn open(
        &mut self,
        local: &[u8],
        e: &BytesStart<'_>,
        stack: &[Vec<u8>],
        start: usize,
        capture: &mut Option<Capture>,
        depth: usize,
    ) {
        let parent = stack.last().map(|p| p.as_slice());
        match local {
            b"cNvPr" if parent == Some(b"nvSpPr") => {
                self.id = attr(e, b"id").and_then(|v| v.parse().ok()).unwrap_or(0);
                self.name = attr(e, b"name").unwrap_or_default();
                self.descr = attr(e, b"descr").unwrap_or_default();
            }
            b"ph" => {
                self.ph_type = Some(attr(e, b"type").unwrap_or_else(|| "body".to_string()));
            }
            b"spPr" if parent == Some(b"sp") => self.in_sp_pr = true,
            b"off" if self.in_sp_pr && parent == Some(b"xfrm") => {
                self.frame.x = attr_i64(e, b"x");
                self.frame.y = attr_i64(e, b"y");
            }
            b"ext" if self.in_sp_pr && parent == Some(b"xfrm") => {
                self.frame.cx = attr_i64(e, b"cx");
                self.frame.cy = attr_i64(e, b"cy");
            }
            b"txBody" if parent == Some(b"sp") => {
                self.body_start = Some(start);
            }
            b"bodyPr" if self.body_start.is_some() => {
                let defaults = Insets::default();
                self.insets = Insets {
                    left: attr(e, b"lIns").and_then(|v| v.parse().ok()).unwrap_or(defaults.left),
                    right: attr(e, b"rIns").and_then(|v| v.parse().ok()).unwrap_or(defaults.right),
                    top: attr(e, b"tIns").and_then(|v| v.parse().ok()).unwrap_or(defaults.top),
                    bottom: attr(e, b"bIns")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(defaults.bottom),
                };
                *capture = Some(Capture { start, depth });
            }
            b"lstStyle" if self.body_start.is_some() && self.paragraph.is_none() => {
                *capture = Some(Capture { start, depth });
            }
            b"p" if self.body_start.is_some() => {
                self.paragraph = Some(Paragraph::new());
            }
            b"pPr" if self.paragraph.is_some() && self.run.is_none() => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.level = attr(e, b"lvl").and_then(|v| v.parse().ok()).unwrap_or(0);
                }
                *capture = Some(Capture { start, depth });
            }
            b"buChar" | b"buAutoNum" | b"buBlip" if self.paragraph.is_some() => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.bullet = true;
                }
            }
            b"buNone" if self.paragraph.is_some() => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.bullet = false;
                }
            }
            b"r" | b"fld" if self.paragraph.is_some() => {
                self.run = Some(Run::default());
            }
            b"rPr" if self.run.is_some() => {
                if let Some(run) = self.run.as_mut() {
                    read_run_style(e, &mut run.style);
                }
                self.in_run_props = true;
                *capture = Some(Capture { start, depth });
            }
            b"latin" if self.in_run_props => {
                if let Some(run) = self.run.as_mut() {
                    run.style.font_family = attr(e, b"typeface");
                }
            }
            b"srgbClr" if self.in_run_props => {
                if let Some(run) = self.run.as_mut() {
                    run.style.color = attr(e, b"val");
                }
            }
            b"t" if self.run.is_some() => self.in_text = true,
            b"br" if self.paragraph.is_some() => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.add_run(Run::new("\n"));
                }
            }
            b"endParaRPr" if self.paragraph.is_some() => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.end_size = attr(e, b"sz").and_then(|v| parse_size(&v));
                }
                *capture = Some(Capture { start, depth });
            }
            _ => {}
        }
    }

    /// Handle the end of an element. `raw` holds the element's XML when a
    /// capture for it is open.
    fn close(
        &mut self,
        local: &[u8],
        raw: &str,
        end: usize,
        capture: &mut Option<Capture>,
        depth: usize,
    ) {
        let captured = match capture {
            Some(c) if c.depth == depth => {
                *capture = None;
                Some(raw.to_string())
            }
            _ => None,
        };

        match local {
            b"spPr" => self.in_sp_pr = false,
            b"bodyPr" if self.body_start.is_some() => {
                if let Some(raw) = captured {
                    self.body_props_xml = raw;
                }
            }
            b"lstStyle" if self.body_start.is_some() => {
                if captured.is_some() {
                    self.list_style_xml = captured;
                }
            }
            b"pPr" => {
                if let (Some(p), Some(raw)) = (self.paragraph.as_mut(), captured) {
                    p.props_xml = Some(raw);
                }
            }
            b"rPr" => {
                self.in_run_props = false;
                if let (Some(run), Some(raw)) = (self.run.as_mut(), captured) {
                    run.props_xml = Some(raw);
                }
            }
            b"endParaRPr" => {
                if let (Some(p), Some(raw)) = (self.paragraph.as_mut(), captured) {
                    p.end_props_xml = Some(raw);
                }
            }
            b"t" => self.in_text = false,
            b"r" | b"fld" => {
                if let (Some(p), Some(run)) = (self.paragraph.as_mut(), self.run.take()) {
                    p.add_run(run);
                }
            }
            b"p" => {
                if let Some(p) = self.paragraph.take() {
                    self.body
                        .get_or_insert_with(|| TextBody {
                            span: 0..0,
                            body_props_xml: String::new(),
                            list_style_xml: None,
                            insets: Insets::default(),
                            paragraphs: Vec::new(),
                        })
                        .paragraphs
                        .push(p);
                }
            }
            b"txBody" => {
                if let Some(start) = self.body_start.take() {
                    let mut body = self.body.take().unwrap_or_else(|| TextBody {
                        span: 0..0,
                        body_props_xml: String::new(),
                        list_style_xml: None,
                        insets: Insets::default(),
                        paragraphs: Vec::new(),
                    });
                    body.span = start..end;
                    body.body_props_xml = std::mem::take(&mut self.body_props_xml);
                    body.list_style_xml = self.list_style_xml.take();
                    body.insets = self.insets;
                    self.body = Some(body);
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn finish(self, part_name: &str) -> Shape {
        let kind = match PlaceholderSpec::parse(&self.descr) {
            Some(spec) if self.body.is_some() => ShapeKind::Placeholder(spec),
            Some(spec) => {
                log::warn!(
                    "{}: shape {} declares role '{}' but has no text body",
                    part_name,
                    self.id,
                    spec.role
                );
                ShapeKind::Static
            }
            None => ShapeKind::Static,
        };

        Shape {
            id: self.id,
            name: self.name,
            frame: self.frame,
            ph_type: self.ph_type,
            text: self.body,
            kind,
        }
    }
}

fn read_run_style(e: &BytesStart<'_>, style: &mut RunStyle) {
    style.size = attr(e, b"sz").and_then(|v| parse_size(&v));
    style.bold = matches!(attr(e, b"b").as_deref(), Some("1") | Some("true"));
    style.italic = matches!(attr(e, b"i").as_deref(), Some("1") | Some("true"));
    style.spacing = attr(e, b"spc").and_then(|v| v.parse().ok());
}

/// DrawingML sizes are hundredths of a point.
fn parse_size(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().map(|v| v / 100.0)
}

fn attr_i64(e: &BytesStart<'_>, name: &[u8]) -> i64 {
    attr(e, name).and_then(|v| v.parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Name" descr="role=contact.name; lines=1; chars=30"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm></p:spPr>
<p:txBody><a:bodyPr lIns="0"/><a:lstStyle/><a:p><a:pPr lvl="1"><a:buChar char="&#8226;"/></a:pPr><a:r><a:rPr lang="en-US" sz="2800" b="1"><a:solidFill><a:srgbClr val="1F3864"/></a:solidFill><a:latin typeface="Georgia"/></a:rPr><a:t>Jane &amp; Doe</a:t></a:r><a:endParaRPr sz="2800"/></a:p></p:txBody></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="3" name="Logo"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp>
</p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_parse_shapes() {
        let slide = parse_slide(0, "ppt/slides/slide1.xml", SLIDE).unwrap();
        assert_eq!(slide.shapes.len(), 2);
        assert!(!slide.hidden);

        let name = &slide.shapes[0];
        assert_eq!(name.id, 2);
        assert_eq!(name.ph_type.as_deref(), Some("title"));
        assert_eq!(name.frame.x, 457200);
        assert_eq!(name.frame.cy, 1143000);
        assert_eq!(name.placeholder().unwrap().role, "contact.name");

        let logo = &slide.shapes[1];
        assert!(!logo.is_placeholder());
        assert!(logo.text.is_none());
    }

    #[test]
    fn test_parse_runs_and_spans() {
        let slide = parse_slide(0, "ppt/slides/slide1.xml", SLIDE).unwrap();
        let body = slide.shapes[0].text.as_ref().unwrap();

        assert!(SLIDE[body.span.clone()].starts_with("<p:txBody>"));
        assert!(SLIDE[body.span.clone()].ends_with("</p:txBody>"));
        assert_eq!(body.body_props_xml, r#"<a:bodyPr lIns="0"/>"#);
        assert_eq!(body.list_style_xml.as_deref(), Some("<a:lstStyle/>"));
        assert_eq!(body.insets.left, 0);
        assert_eq!(body.insets.right, 91_440);

        let para = &body.paragraphs[0];
        assert_eq!(para.level, 1);
        assert!(para.bullet);
        assert!(para.props_xml.as_deref().unwrap().starts_with("<a:pPr lvl=\"1\">"));
        assert_eq!(para.end_size, Some(28.0));

        let run = &para.runs[0];
        assert_eq!(run.text, "Jane & Doe");
        assert_eq!(run.style.size, Some(28.0));
        assert!(run.style.bold);
        assert_eq!(run.style.color.as_deref(), Some("1F3864"));
        assert_eq!(run.style.font_family.as_deref(), Some("Georgia"));
        assert!(run.props_xml.as_deref().unwrap().ends_with("</a:rPr>"));
        assert_eq!(body.declared_font_size(), Some(28.0));
    }

    #[test]
    fn test_hidden_slide() {
        let xml = r#"<p:sld xmlns:p="p" show="0"><p:cSld><p:spTree/></p:cSld></p:sld>"#;
        let slide = parse_slide(3, "ppt/slides/slide4.xml", xml).unwrap();
        assert!(slide.hidden);
        assert!(slide.shapes.is_empty());
    }

    #[test]
    fn test_role_without_body_is_static() {
        let xml = r#"<p:sld xmlns:p="p"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="4" name="x" descr="role=summary"/></p:nvSpPr><p:spPr/></p:sp></p:spTree></p:cSld></p:sld>"#;
        let slide = parse_slide(0, "s.xml", xml).unwrap();
        assert!(!slide.shapes[0].is_placeholder());
    }
}
