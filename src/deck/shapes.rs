//! Slide shapes and their DrawingML serialisation.
//!
//! A slide is a flat list of [`Shape`]s with absolute positions. Only the
//! shape kinds the deck uses exist here: text boxes (optionally filled, which
//! covers the KPI sidebar), pictures, and tables.

use quick_xml::escape::escape;
use std::fmt::Write as _;

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Convert inches to EMU.
pub fn inches(v: f64) -> i64 {
    (v * EMU_PER_INCH as f64).round() as i64
}

pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const TABLE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
/// "Medium Style 2 - Accent 1", the default table style of a new deck.
pub(crate) const DEFAULT_TABLE_STYLE: &str = "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}";

/// Characters allowed by XML 1.0.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// Escape `s` for use as XML character data or attribute value, dropping
/// characters XML cannot represent.
pub fn xml_text(s: &str) -> String {
    let clean: String = s.chars().filter(|&c| is_xml_char(c)).collect();
    escape(clean.as_str()).into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn inches(x: f64, y: f64, w: f64, h: f64) -> Self {
        Frame {
            x: inches(x),
            y: inches(y),
            cx: inches(w),
            cy: inches(h),
        }
    }

    fn write_xfrm(&self, out: &mut String, prefix: &str) {
        let _ = write!(
            out,
            r#"<{p}:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{p}:xfrm>"#,
            self.x,
            self.y,
            self.cx,
            self.cy,
            p = prefix
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// One paragraph with a single character style.
///
/// A `'\n'` inside `text` becomes a line break within the paragraph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub text: String,
    pub size_pt: Option<u32>,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Color>,
    pub align: Align,
    pub space_after_pt: Option<u32>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Paragraph {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn size(mut self, pt: u32) -> Self {
        self.size_pt = Some(pt);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn space_after(mut self, pt: u32) -> Self {
        self.space_after_pt = Some(pt);
        self
    }

    fn run_props(&self, tag: &str) -> String {
        let mut out = format!(r#"<a:{} lang="en-US""#, tag);
        if let Some(pt) = self.size_pt {
            let _ = write!(out, r#" sz="{}""#, pt * 100);
        }
        if self.bold {
            out.push_str(r#" b="1""#);
        }
        if self.italic {
            out.push_str(r#" i="1""#);
        }
        out.push_str(r#" dirty="0""#);
        match self.color {
            Some(c) => {
                let _ = write!(
                    out,
                    r#"><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:{}>"#,
                    c.hex(),
                    tag
                );
            }
            None => out.push_str("/>"),
        }
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<a:p>");

        let algn = match self.align {
            Align::Left => None,
            Align::Center => Some("ctr"),
        };
        if algn.is_some() || self.space_after_pt.is_some() {
            out.push_str("<a:pPr");
            if let Some(a) = algn {
                let _ = write!(out, r#" algn="{}""#, a);
            }
            match self.space_after_pt {
                Some(pt) => {
                    let _ = write!(
                        out,
                        r#"><a:spcAft><a:spcPts val="{}"/></a:spcAft></a:pPr>"#,
                        pt * 100
                    );
                }
                None => out.push_str("/>"),
            }
        }

        let rpr = self.run_props("rPr");
        for (i, line) in self.text.split('\n').enumerate() {
            if i > 0 {
                let _ = write!(out, "<a:br>{}</a:br>", rpr);
            }
            if !line.is_empty() {
                let _ = write!(out, "<a:r>{}<a:t>{}</a:t></a:r>", rpr, xml_text(line));
            }
        }

        out.push_str(&self.run_props("endParaRPr"));
        out.push_str("</a:p>");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Top,
    Middle,
}

/// A rectangle holding text, with an optional solid fill and outline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub name: String,
    pub frame: Frame,
    pub paragraphs: Vec<Paragraph>,
    pub fill: Option<Color>,
    pub anchor: Anchor,
}

impl TextBox {
    pub fn new(name: impl Into<String>, frame: Frame, paragraphs: Vec<Paragraph>) -> Self {
        TextBox {
            name: name.into(),
            frame,
            paragraphs,
            fill: None,
            anchor: Anchor::Top,
        }
    }

    pub fn filled(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    fn write_xml(&self, out: &mut String, id: usize) {
        let tx_box = if self.fill.is_some() { "" } else { r#" txBox="1""# };
        let _ = write!(
            out,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr{}/><p:nvPr/></p:nvSpPr><p:spPr>"#,
            id,
            xml_text(&self.name),
            tx_box
        );
        self.frame.write_xfrm(out, "a");
        out.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
        match self.fill {
            Some(c) => {
                let _ = write!(
                    out,
                    r#"<a:solidFill><a:srgbClr val="{hex}"/></a:solidFill><a:ln><a:solidFill><a:srgbClr val="{hex}"/></a:solidFill></a:ln>"#,
                    hex = c.hex()
                );
            }
            None => out.push_str("<a:noFill/>"),
        }
        let anchor = match self.anchor {
            Anchor::Top => "t",
            Anchor::Middle => "ctr",
        };
        let _ = write!(
            out,
            r#"</p:spPr><p:txBody><a:bodyPr wrap="square" rtlCol="0" anchor="{}"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#,
            anchor
        );
        if self.paragraphs.is_empty() {
            Paragraph::default().write_xml(out);
        }
        for p in &self.paragraphs {
            p.write_xml(out);
        }
        out.push_str("</p:txBody></p:sp>");
    }
}

/// An embedded image, referenced through the slide's relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub name: String,
    pub frame: Frame,
    pub rel_id: String,
}

impl Picture {
    fn write_xml(&self, out: &mut String, id: usize) {
        let _ = write!(
            out,
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="{}" descr=""/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>"#,
            id,
            xml_text(&self.name),
            xml_text(&self.rel_id)
        );
        self.frame.write_xfrm(out, "a");
        out.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
    }
}

/// One table row; `fill` paints every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<Paragraph>,
    pub fill: Option<Color>,
}

/// A grid of single-paragraph cells. Columns share the width equally and
/// rows share the height equally.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub frame: Frame,
    pub columns: usize,
    pub rows: Vec<TableRow>,
}

impl Table {
    fn write_xml(&self, out: &mut String, id: usize) {
        let _ = write!(
            out,
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{}" name="{}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr>"#,
            id,
            xml_text(&self.name)
        );
        self.frame.write_xfrm(out, "p");
        let _ = write!(
            out,
            r#"<a:graphic><a:graphicData uri="{}"><a:tbl><a:tblPr firstRow="1" bandRow="1"><a:tableStyleId>{}</a:tableStyleId></a:tblPr><a:tblGrid>"#,
            TABLE_URI, DEFAULT_TABLE_STYLE
        );

        let cols = self.columns.max(1);
        let col_w = self.frame.cx / cols as i64;
        for _ in 0..cols {
            let _ = write!(out, r#"<a:gridCol w="{}"/>"#, col_w);
        }
        out.push_str("</a:tblGrid>");

        let row_h = self.frame.cy / self.rows.len().max(1) as i64;
        for row in &self.rows {
            let _ = write!(out, r#"<a:tr h="{}">"#, row_h);
            for c in 0..cols {
                out.push_str("<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>");
                match row.cells.get(c) {
                    Some(p) => p.write_xml(out),
                    None => Paragraph::default().write_xml(out),
                }
                out.push_str("</a:txBody>");
                match row.fill {
                    Some(color) => {
                        let _ = write!(
                            out,
                            r#"<a:tcPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:tcPr>"#,
                            color.hex()
                        );
                    }
                    None => out.push_str("<a:tcPr/>"),
                }
                out.push_str("</a:tc>");
            }
            out.push_str("</a:tr>");
        }
        out.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text(TextBox),
    Picture(Picture),
    Table(Table),
}

/// One slide: shapes in z-order, back to front.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slide {
    pub shapes: Vec<Shape>,
}

impl Slide {
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Every paragraph's text, in document order (text boxes then table
    /// cells, as they appear in the shape list).
    pub fn paragraph_texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for shape in &self.shapes {
            match shape {
                Shape::Text(tb) => out.extend(tb.paragraphs.iter().map(|p| p.text.as_str())),
                Shape::Table(t) => {
                    for row in &t.rows {
                        out.extend(row.cells.iter().map(|p| p.text.as_str()));
                    }
                }
                Shape::Picture(_) => {}
            }
        }
        out
    }

    /// Relationship ids of embedded pictures.
    pub fn picture_rel_ids(&self) -> Vec<&str> {
        self.shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Picture(p) => Some(p.rel_id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Serialise as a `ppt/slides/slideN.xml` part.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        let _ = write!(
            out,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree>"#,
            NS_A, NS_R, NS_P
        );
        out.push_str(GROUP_SHAPE_PROPS);

        // id 1 is the group shape itself
        for (i, shape) in self.shapes.iter().enumerate() {
            let id = i + 2;
            match shape {
                Shape::Text(tb) => tb.write_xml(&mut out, id),
                Shape::Picture(p) => p.write_xml(&mut out, id),
                Shape::Table(t) => t.write_xml(&mut out, id),
            }
        }

        out.push_str(
            "</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
        );
        out
    }
}

/// Root group of every shape tree.
pub(crate) const GROUP_SHAPE_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;
