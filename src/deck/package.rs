//! OOXML packaging: wrap rendered slides into a `.pptx` zip archive.
//!
//! The package holds the minimum a presentation reader needs: content
//! types, package and part relationships, one slide master with one blank
//! layout, a theme, the slides, the chart image, and document properties.
//! `[Content_Types].xml` is always the first entry.

use super::shapes::{xml_text, Slide, DEFAULT_TABLE_STYLE, GROUP_SHAPE_PROPS, NS_A, NS_P, NS_R};
use super::CHART_REL_ID;
use crate::error::DeckError;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// MIME type of a `.pptx` file.
pub const DECK_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Part name of the chart image.
pub const CHART_PART: &str = "ppt/media/image1.png";

/// Slide size: 10 × 7.5 inches (4:3).
const SLIDE_CX: i64 = 9_144_000;
const SLIDE_CY: i64 = 6_858_000;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_BASE: &str = "application/vnd.openxmlformats-officedocument";

const APPLICATION: &str = "edgequake-deckgen";

/// Which slide (1-based) embeds the chart.
const CHART_SLIDE: usize = 3;

/// Assemble the package and return the zip bytes.
pub fn write_package(slides: &[Slide], chart_png: &[u8], title: &str) -> Result<Vec<u8>, DeckError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut add = |name: &str, data: &[u8], opts: SimpleFileOptions| -> Result<(), DeckError> {
        zip.start_file(name, opts)
            .map_err(|e| DeckError::DeckWriteFailed(format!("{}: {}", name, e)))?;
        zip.write_all(data)
            .map_err(|e| DeckError::DeckWriteFailed(format!("{}: {}", name, e)))
    };

    add("[Content_Types].xml", content_types(slides.len()).as_bytes(), options)?;
    add("_rels/.rels", package_rels().as_bytes(), options)?;
    add("docProps/core.xml", core_props(title).as_bytes(), options)?;
    add("docProps/app.xml", app_props(slides.len()).as_bytes(), options)?;

    add("ppt/presentation.xml", presentation(slides.len()).as_bytes(), options)?;
    add(
        "ppt/_rels/presentation.xml.rels",
        presentation_rels(slides.len()).as_bytes(),
        options,
    )?;
    add("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER.as_bytes(), options)?;
    add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        rels(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "theme", "../theme/theme1.xml"),
        ])
        .as_bytes(),
        options,
    )?;
    add("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT.as_bytes(), options)?;
    add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]).as_bytes(),
        options,
    )?;
    add("ppt/theme/theme1.xml", THEME.as_bytes(), options)?;
    add("ppt/presProps.xml", simple_part("presentationPr").as_bytes(), options)?;
    add("ppt/viewProps.xml", simple_part("viewPr").as_bytes(), options)?;
    add("ppt/tableStyles.xml", table_styles().as_bytes(), options)?;

    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        add(&format!("ppt/slides/slide{}.xml", n), slide.to_xml().as_bytes(), options)?;

        let mut slide_rels = vec![("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")];
        if n == CHART_SLIDE {
            slide_rels.push((CHART_REL_ID, "image", "../media/image1.png"));
        }
        add(
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            rels(&slide_rels).as_bytes(),
            options,
        )?;
    }

    // PNG is already deflated
    add(CHART_PART, chart_png, stored)?;

    let cursor = zip
        .finish()
        .map_err(|e| DeckError::DeckWriteFailed(format!("finalise: {}", e)))?;
    Ok(cursor.into_inner())
}

// ── Parts ────────────────────────────────────────────────────────────────

fn content_types(slide_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECL}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/>"#
    );
    let overrides = [
        ("/ppt/presentation.xml", "presentationml.presentation.main+xml"),
        ("/ppt/slideMasters/slideMaster1.xml", "presentationml.slideMaster+xml"),
        ("/ppt/slideLayouts/slideLayout1.xml", "presentationml.slideLayout+xml"),
        ("/ppt/theme/theme1.xml", "theme+xml"),
        ("/ppt/presProps.xml", "presentationml.presProps+xml"),
        ("/ppt/viewProps.xml", "presentationml.viewProps+xml"),
        ("/ppt/tableStyles.xml", "presentationml.tableStyles+xml"),
        ("/docProps/app.xml", "extended-properties+xml"),
    ];
    for (part, ct) in overrides {
        xml.push_str(&format!(
            r#"<Override PartName="{}" ContentType="{}.{}"/>"#,
            part, CT_BASE, ct
        ));
    }
    for n in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}.presentationml.slide+xml"/>"#,
            n, CT_BASE
        ));
    }
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#);
    xml
}

/// A relationships part. `kind` is the last segment of the relationship
/// type URI.
fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(r#"{XML_DECL}
<Relationships xmlns="{REL_NS}">"#);
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_BASE, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn package_rels() -> String {
    format!(
        r#"{XML_DECL}
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{REL_BASE}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{REL_BASE}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

fn core_props(title: &str) -> String {
    format!(
        r#"{XML_DECL}
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>{APPLICATION}</dc:creator><cp:lastModifiedBy>{APPLICATION}</cp:lastModifiedBy><cp:revision>1</cp:revision></cp:coreProperties>"#,
        xml_text(title)
    )
}

fn app_props(slide_count: usize) -> String {
    format!(
        r#"{XML_DECL}
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>{APPLICATION}</Application><PresentationFormat>On-screen Show (4:3)</PresentationFormat><Slides>{slide_count}</Slides></Properties>"#
    )
}

/// Relationship ids in `presentation.xml.rels`: master is rId1, slides
/// follow, then the property parts and theme.
fn presentation(slide_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECL}
<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>"#
    );
    for i in 0..slide_count {
        xml.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2));
    }
    xml.push_str(&format!(
        r#"</p:sldIdLst><p:sldSz cx="{SLIDE_CX}" cy="{SLIDE_CY}" type="screen4x3"/><p:notesSz cx="{SLIDE_CY}" cy="{SLIDE_CX}"/></p:presentation>"#
    ));
    xml
}

fn presentation_rels(slide_count: usize) -> String {
    let slide_targets: Vec<(String, String)> = (1..=slide_count)
        .map(|n| (format!("rId{}", n + 1), format!("slides/slide{}.xml", n)))
        .collect();
    let next = slide_count + 2;
    let tail = [
        (format!("rId{}", next), "presProps", "presProps.xml"),
        (format!("rId{}", next + 1), "viewProps", "viewProps.xml"),
        (format!("rId{}", next + 2), "theme", "theme/theme1.xml"),
        (format!("rId{}", next + 3), "tableStyles", "tableStyles.xml"),
    ];

    let mut entries: Vec<(&str, &str, &str)> =
        vec![("rId1", "slideMaster", "slideMasters/slideMaster1.xml")];
    entries.extend(slide_targets.iter().map(|(id, t)| (id.as_str(), "slide", t.as_str())));
    entries.extend(tail.iter().map(|(id, kind, t)| (id.as_str(), *kind, *t)));
    rels(&entries)
}

fn simple_part(root: &str) -> String {
    format!(r#"{XML_DECL}
<p:{root} xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

fn table_styles() -> String {
    format!(r#"{XML_DECL}
<a:tblStyleLst xmlns:a="{NS_A}" def="{DEFAULT_TABLE_STYLE}"/>"#)
}

static SLIDE_MASTER: once_cell::sync::Lazy<String> = once_cell::sync::Lazy::new(|| {
    format!(
        r#"{XML_DECL}
<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{GROUP_SHAPE_PROPS}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr><a:defRPr sz="4400"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr><a:defRPr sz="2000"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#
    )
});

static SLIDE_LAYOUT: once_cell::sync::Lazy<String> = once_cell::sync::Lazy::new(|| {
    format!(
        r#"{XML_DECL}
<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{GROUP_SHAPE_PROPS}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
});

static THEME: once_cell::sync::Lazy<String> = once_cell::sync::Lazy::new(|| {
    let srgb = |name: &str, hex: &str| format!(r#"<a:{name}><a:srgbClr val="{hex}"/></a:{name}>"#);
    let colors = [
        srgb("dk1", "000000"),
        srgb("lt1", "FFFFFF"),
        srgb("dk2", "1F497D"),
        srgb("lt2", "EEECE1"),
        srgb("accent1", "4F81BD"),
        srgb("accent2", "C0504D"),
        srgb("accent3", "9BBB59"),
        srgb("accent4", "8064A2"),
        srgb("accent5", "4BACC6"),
        srgb("accent6", "F79646"),
        srgb("hlink", "0000FF"),
        srgb("folHlink", "800080"),
    ]
    .concat();
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    format!(
        r#"{XML_DECL}
<a:theme xmlns:a="{NS_A}" name="Office Theme"><a:themeElements><a:clrScheme name="Office">{colors}</a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst><a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#
    )
});
