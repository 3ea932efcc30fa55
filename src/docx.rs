//! Flow-document back-end: a minimal WordprocessingML package.
//!
//! The package is assembled in memory with fixed entry timestamps, so the
//! same document always produces the same bytes.

use std::io::{Cursor, Write};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::block::{Block, BlockKind, Document};
use crate::config::CoverConfig;
use crate::error::RenderError;

const FONT: &str = "Times New Roman";
const COVER_TITLE_COLOR: &str = "1A237E";

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Justify,
}

impl Align {
    fn as_val(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Justify => "both",
        }
    }
}

/// Paragraph style of one block kind in the flow document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowStyle {
    pub id: &'static str,
    pub name: &'static str,
    /// Font size in points.
    pub size: f32,
    pub color: &'static str,
    pub bold: bool,
    pub align: Align,
    pub before: f32,
    pub after: f32,
    pub keep_next: bool,
    pub bullet: bool,
}

pub fn flow_style(kind: BlockKind) -> FlowStyle {
    let normal = FlowStyle {
        id: "Normal",
        name: "Normal",
        size: 14.0,
        color: "000000",
        bold: false,
        align: Align::Justify,
        before: 0.0,
        after: 10.0,
        keep_next: false,
        bullet: false,
    };
    match kind {
        BlockKind::Heading1 => FlowStyle {
            id: "Heading1",
            name: "heading 1",
            size: 18.0,
            color: "283593",
            bold: true,
            align: Align::Left,
            before: 20.0,
            after: 10.0,
            keep_next: true,
            ..normal
        },
        BlockKind::Heading2 => FlowStyle {
            id: "Heading2",
            name: "heading 2",
            size: 16.0,
            bold: true,
            align: Align::Left,
            before: 10.0,
            after: 6.0,
            keep_next: true,
            ..normal
        },
        BlockKind::BlockNumberHeading => FlowStyle {
            id: "BlockNumberHeading",
            name: "Block Number Heading",
            size: 16.0,
            color: "283593",
            bold: true,
            align: Align::Left,
            before: 10.0,
            after: 6.0,
            keep_next: true,
            ..normal
        },
        BlockKind::SubHeading => FlowStyle {
            id: "SubHeading",
            name: "Sub Heading",
            size: 15.0,
            color: "1F2A44",
            bold: true,
            align: Align::Left,
            before: 6.0,
            after: 4.0,
            keep_next: true,
            ..normal
        },
        BlockKind::Paragraph => normal,
        BlockKind::ListItem => FlowStyle {
            id: "ListBullet",
            name: "List Bullet",
            after: 4.0,
            bullet: true,
            ..normal
        },
        BlockKind::Emphasis => FlowStyle {
            id: "EmphasisLine",
            name: "Emphasis Line",
            color: "37474F",
            align: Align::Left,
            before: 4.0,
            after: 4.0,
            ..normal
        },
    }
}

/// One `w:r` element.
#[derive(Debug, Clone, Default)]
struct Run<'a> {
    text: &'a str,
    bold: bool,
    italic: bool,
    size: Option<f32>,
    color: Option<&'a str>,
}

/// Build the complete `.docx` package for a document.
pub fn document_to_docx(document: &Document, cover: &CoverConfig) -> Result<Vec<u8>, RenderError> {
    let parts = [
        ("[Content_Types].xml", content_types_xml()),
        ("_rels/.rels", package_rels_xml()),
        ("word/_rels/document.xml.rels", document_rels_xml()),
        ("word/styles.xml", styles_xml()),
        ("word/numbering.xml", numbering_xml()),
        ("word/document.xml", document_xml(document, cover)),
    ];

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes()).map_err(ZipError::Io)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// The `word/document.xml` part: cover paragraphs followed by one paragraph per block.
pub fn document_xml(document: &Document, cover: &CoverConfig) -> String {
    let mut out = String::from(XML_HEADER);
    out.push_str(&format!("<w:document xmlns:w=\"{W_NS}\"><w:body>"));

    emit_cover(cover, &mut out);
    for block in document {
        emit_block(block, &mut out);
    }

    // A4 with 2cm / 3cm / 1.5cm margins
    out.push_str(
        "<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
         <w:pgMar w:top=\"1134\" w:right=\"850\" w:bottom=\"1134\" w:left=\"1701\" \
         w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/></w:sectPr>",
    );
    out.push_str("</w:body></w:document>");
    out
}

fn emit_cover(cover: &CoverConfig, out: &mut String) {
    emit_paragraph(None, None, &[], out);
    emit_paragraph(
        None,
        Some(Align::Center),
        &[Run {
            text: &cover.flow_title,
            bold: true,
            size: Some(18.0),
            color: Some(COVER_TITLE_COLOR),
            ..Run::default()
        }],
        out,
    );
    emit_paragraph(
        None,
        Some(Align::Center),
        &[Run {
            text: &cover.flow_subtitle,
            italic: true,
            size: Some(13.0),
            ..Run::default()
        }],
        out,
    );
    emit_paragraph(None, None, &[], out);
}

fn emit_block(block: &Block, out: &mut String) {
    let style = flow_style(block.kind());
    let joined;
    let runs: Vec<Run<'_>> = match block {
        // One italic run; bold only survives from the conclusion heuristic.
        Block::Emphasis(content) => {
            joined = block.text();
            vec![Run {
                text: &joined,
                bold: content.iter().any(|s| s.bold),
                italic: true,
                ..Run::default()
            }]
        }
        _ => block
            .content()
            .iter()
            .map(|span| Run {
                text: &span.text,
                bold: span.bold,
                italic: span.italic,
                ..Run::default()
            })
            .collect(),
    };
    emit_paragraph(Some(style.id), None, &runs, out);
}

fn emit_paragraph(style: Option<&str>, align: Option<Align>, runs: &[Run<'_>], out: &mut String) {
    out.push_str("<w:p>");
    if style.is_some() || align.is_some() {
        out.push_str("<w:pPr>");
        if let Some(id) = style {
            out.push_str(&format!("<w:pStyle w:val=\"{id}\"/>"));
        }
        if let Some(align) = align {
            out.push_str(&format!("<w:jc w:val=\"{}\"/>", align.as_val()));
        }
        out.push_str("</w:pPr>");
    }
    for run in runs {
        emit_run(run, out);
    }
    out.push_str("</w:p>");
}

fn emit_run(run: &Run<'_>, out: &mut String) {
    out.push_str("<w:r>");
    let mut props = String::new();
    if run.bold {
        props.push_str("<w:b/><w:bCs/>");
    }
    if run.italic {
        props.push_str("<w:i/><w:iCs/>");
    }
    if let Some(color) = run.color {
        props.push_str(&format!("<w:color w:val=\"{color}\"/>"));
    }
    if let Some(size) = run.size {
        let half_points = half_points(size);
        props.push_str(&format!(
            "<w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/>"
        ));
    }
    if !props.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&props);
        out.push_str("</w:rPr>");
    }
    out.push_str("<w:t xml:space=\"preserve\">");
    escape_xml(run.text, out);
    out.push_str("</w:t></w:r>");
}

/// The `word/styles.xml` part, one paragraph style per block kind.
fn styles_xml() -> String {
    let normal = flow_style(BlockKind::Paragraph);
    let mut out = String::from(XML_HEADER);
    out.push_str(&format!("<w:styles xmlns:w=\"{W_NS}\">"));
    out.push_str(&format!(
        "<w:docDefaults><w:rPrDefault><w:rPr>\
         <w:rFonts w:ascii=\"{FONT}\" w:hAnsi=\"{FONT}\" w:eastAsia=\"{FONT}\" w:cs=\"{FONT}\"/>\
         <w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/><w:lang w:val=\"ru-RU\"/>\
         </w:rPr></w:rPrDefault>\
         <w:pPrDefault><w:pPr><w:spacing w:after=\"0\" w:line=\"240\" w:lineRule=\"auto\"/></w:pPr></w:pPrDefault>\
         </w:docDefaults>",
        size = half_points(normal.size),
    ));

    let mut seen = Vec::new();
    for kind in BlockKind::ALL {
        let style = flow_style(kind);
        if seen.contains(&style.id) {
            continue;
        }
        seen.push(style.id);
        emit_style(&style, &mut out);
    }

    out.push_str("</w:styles>");
    out
}

fn emit_style(style: &FlowStyle, out: &mut String) {
    let is_normal = style.id == "Normal";
    out.push_str(&format!(
        "<w:style w:type=\"paragraph\"{} w:styleId=\"{}\"><w:name w:val=\"{}\"/>",
        if is_normal { " w:default=\"1\"" } else { "" },
        style.id,
        style.name
    ));
    if !is_normal {
        out.push_str("<w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/>");
    }
    out.push_str("<w:qFormat/><w:pPr>");
    if style.keep_next {
        out.push_str("<w:keepNext/>");
    }
    if style.bullet {
        out.push_str("<w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"1\"/></w:numPr>");
    }
    out.push_str(&format!(
        "<w:spacing w:before=\"{}\" w:after=\"{}\"/>",
        twips(style.before),
        twips(style.after)
    ));
    out.push_str(&format!("<w:jc w:val=\"{}\"/>", style.align.as_val()));
    out.push_str("</w:pPr><w:rPr>");
    if style.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    out.push_str(&format!(
        "<w:color w:val=\"{color}\"/><w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>",
        color = style.color,
        size = half_points(style.size),
    ));
    out.push_str("</w:rPr></w:style>");
}

fn numbering_xml() -> String {
    format!(
        "{XML_HEADER}<w:numbering xmlns:w=\"{W_NS}\">\
         <w:abstractNum w:abstractNumId=\"0\"><w:multiLevelType w:val=\"singleLevel\"/>\
         <w:lvl w:ilvl=\"0\"><w:start w:val=\"1\"/><w:numFmt w:val=\"bullet\"/>\
         <w:lvlText w:val=\"•\"/><w:lvlJc w:val=\"left\"/>\
         <w:pPr><w:ind w:left=\"720\" w:hanging=\"360\"/></w:pPr></w:lvl></w:abstractNum>\
         <w:num w:numId=\"1\"><w:abstractNumId w:val=\"0\"/></w:num></w:numbering>"
    )
}

fn content_types_xml() -> String {
    format!(
        "{XML_HEADER}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
         <Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
         <Override PartName=\"/word/numbering.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml\"/>\
         </Types>"
    )
}

fn package_rels_xml() -> String {
    format!(
        "{XML_HEADER}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
         </Relationships>"
    )
}

fn document_rels_xml() -> String {
    format!(
        "{XML_HEADER}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering\" Target=\"numbering.xml\"/>\
         </Relationships>"
    )
}

fn half_points(size: f32) -> u32 {
    (size * 2.0).round() as u32
}

fn twips(points: f32) -> u32 {
    (points * 20.0).round() as u32
}

/// Escape XML text, dropping control characters XML 1.0 cannot carry.
fn escape_xml(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typst::page_style;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    fn body_xml(markup: &str) -> String {
        let xml = document_xml(&Document::parse(markup), &CoverConfig::default());
        let start = xml.find("<w:body>").unwrap() + "<w:body>".len();
        let end = xml.find("<w:sectPr>").unwrap();
        xml[start..end].to_string()
    }

    fn without_cover(markup: &str) -> String {
        let empty = body_xml("");
        body_xml(markup)[empty.len()..].to_string()
    }

    #[test]
    fn cover_has_title_and_italic_subtitle() {
        let body = body_xml("");
        assert!(body.starts_with("<w:p></w:p><w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr>"));
        assert!(body.contains("<w:b/><w:bCs/><w:color w:val=\"1A237E\"/><w:sz w:val=\"36\"/>"));
        assert!(body.contains("АСТРОЛОГИЧЕСКИЙ РАЗБОР СОВМЕСТИМОСТИ"));
        assert!(body.contains(
            "<w:rPr><w:i/><w:iCs/><w:sz w:val=\"26\"/><w:szCs w:val=\"26\"/></w:rPr>\
             <w:t xml:space=\"preserve\">Персональные данные скрыты</w:t>"
        ));
        assert!(!body.contains("image"));
    }

    #[test]
    fn paragraph_with_bold_run() {
        assert_eq!(
            without_cover("[P][B]Солнце[/B] — Близнецы[/P]"),
            "<w:p><w:pPr><w:pStyle w:val=\"Normal\"/></w:pPr>\
             <w:r><w:rPr><w:b/><w:bCs/></w:rPr><w:t xml:space=\"preserve\">Солнце</w:t></w:r>\
             <w:r><w:t xml:space=\"preserve\"> — Близнецы</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn emphasis_is_single_italic_run() {
        assert_eq!(
            without_cover("[EM]Итог [B]важен[/B][/EM]"),
            "<w:p><w:pPr><w:pStyle w:val=\"EmphasisLine\"/></w:pPr>\
             <w:r><w:rPr><w:i/><w:iCs/></w:rPr><w:t xml:space=\"preserve\">Итог важен</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn headings_and_list_items_use_styles() {
        let body = without_cover("[H1]A[/H1]\n[H2]B[/H2]\nБЛОК 2. Эмоции\nОБЩЕЕ\n[L]пункт[/L]");
        for id in ["Heading1", "Heading2", "BlockNumberHeading", "SubHeading", "ListBullet"] {
            assert!(body.contains(&format!("<w:pStyle w:val=\"{id}\"/>")), "{id}");
        }
        assert!(body.contains(">2. Эмоции<"));
    }

    #[test]
    fn escapes_xml_text() {
        assert_eq!(
            without_cover("[P]a < b & \"c\"[/P]"),
            "<w:p><w:pPr><w:pStyle w:val=\"Normal\"/></w:pPr>\
             <w:r><w:t xml:space=\"preserve\">a &lt; b &amp; &quot;c&quot;</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn styles_cover_every_block_kind() {
        let styles = styles_xml();
        for kind in BlockKind::ALL {
            let id = flow_style(kind).id;
            assert!(styles.contains(&format!("w:styleId=\"{id}\"")), "{id}");
        }
        assert_eq!(styles.matches("w:default=\"1\"").count(), 1);
    }

    #[test]
    fn hierarchy_matches_paginated_styles() {
        for a in BlockKind::ALL {
            for b in BlockKind::ALL {
                let page = page_style(a).size.partial_cmp(&page_style(b).size);
                let flow = flow_style(a).size.partial_cmp(&flow_style(b).size);
                assert_eq!(page, flow, "{a:?} vs {b:?}");
            }
            assert_eq!(page_style(a).bold, flow_style(a).bold, "{a:?}");
        }
    }

    #[test]
    fn package_contains_all_parts_and_is_deterministic() {
        let doc = Document::parse("[H1]Ваши планеты[/H1]\n[P]Солнце — Близнецы[/P]");
        let first = document_to_docx(&doc, &CoverConfig::default()).unwrap();
        let second = document_to_docx(&doc, &CoverConfig::default()).unwrap();
        assert_eq!(first, second);

        let mut archive = zip::ZipArchive::new(Cursor::new(first)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/numbering.xml",
            "word/document.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "{name}");
        }
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("Ваши планеты"));
    }
}
