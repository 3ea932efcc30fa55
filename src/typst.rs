use std::fs;
use std::path::Path;

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_library::foundations::Bytes;
use typst_library::layout::PagedDocument;
use typst_pdf::PdfOptions;

use crate::block::{BlockKind, Document, InlineSpan};
use crate::config::{Config, CoverConfig, PageConfig};
use crate::error::RenderError;
use crate::fonts::{self, FontSet};

const PAGE_WIDTH: f32 = 595.28;
const CM: f32 = 28.3465;
const BANNER_TOP: f32 = 1.0 * CM;
const BANNER_HEIGHT: f32 = 3.2 * CM;
const BANNER_GAP: f32 = 0.5 * CM;
const TITLE_ON_BANNER: &str = "white";
const TITLE_ON_PAGE: &str = "rgb(\"#1a237e\")";

/// Page-level style of one block kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageStyle {
    pub size: f32,
    /// Gap between lines, in points.
    pub line_gap: f32,
    pub color: &'static str,
    pub bold: bool,
    pub justify: bool,
    pub above: f32,
    pub below: f32,
    pub indent: f32,
    pub fill: Option<&'static str>,
    /// Keep the block on the same page as the next one.
    pub sticky: bool,
}

pub fn page_style(kind: BlockKind) -> PageStyle {
    let body = PageStyle {
        size: 12.0,
        line_gap: 4.0,
        color: "#000000",
        bold: false,
        justify: true,
        above: 0.0,
        below: 10.0,
        indent: 0.0,
        fill: None,
        sticky: false,
    };
    match kind {
        BlockKind::Heading1 => PageStyle {
            size: 16.0,
            line_gap: 5.0,
            color: "#283593",
            bold: true,
            justify: false,
            above: 20.0,
            below: 15.0,
            fill: Some("#e8eaf6"),
            sticky: true,
            ..body
        },
        BlockKind::Heading2 => PageStyle {
            size: 14.0,
            color: "#1f2a44",
            bold: true,
            justify: false,
            above: 10.0,
            below: 6.0,
            sticky: true,
            ..body
        },
        BlockKind::BlockNumberHeading => PageStyle {
            size: 14.0,
            color: "#283593",
            bold: true,
            justify: false,
            above: 12.0,
            below: 8.0,
            sticky: true,
            ..body
        },
        BlockKind::SubHeading => PageStyle {
            size: 13.0,
            line_gap: 3.0,
            color: "#1f2a44",
            bold: true,
            justify: false,
            above: 8.0,
            below: 6.0,
            sticky: true,
            ..body
        },
        BlockKind::Paragraph => body,
        BlockKind::ListItem => PageStyle {
            indent: 20.0,
            below: 5.0,
            ..body
        },
        BlockKind::Emphasis => PageStyle {
            color: "#37474f",
            justify: false,
            above: 6.0,
            below: 6.0,
            ..body
        },
    }
}

/// Name of the Typst function that styles a block kind.
fn style_fn(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Heading1 => "heading-one",
        BlockKind::Heading2 => "heading-two",
        BlockKind::SubHeading => "sub-heading",
        BlockKind::BlockNumberHeading => "block-number",
        BlockKind::Paragraph => "body-text",
        BlockKind::Emphasis => "emphasis-line",
        BlockKind::ListItem => "list-item",
    }
}

/// Fixed cover drawn at the top of the first page.
#[derive(Debug, Clone, PartialEq)]
pub struct Cover {
    pub title: String,
    pub title_size: u32,
    /// Virtual path of the banner image, when one was loaded.
    pub banner: Option<&'static str>,
}

impl Cover {
    /// Fit the configured title to the page width.
    pub fn new(config: &CoverConfig, fonts: &FontSet, banner: Option<&'static str>) -> Self {
        let max_width = PAGE_WIDTH - 2.0 * CM;
        let title_size = fonts::fit_font_size(
            &config.title,
            config.title_max_size,
            config.title_min_size,
            max_width,
            |text, size| fonts.measure(text, size, true),
        );
        Self {
            title: config.title.clone(),
            title_size,
            banner,
        }
    }
}

/// Convert a document to Typst markup
pub fn document_to_typst(
    document: &Document,
    cover: &Cover,
    fonts: &FontSet,
    page: &PageConfig,
) -> String {
    let degraded = fonts.is_degraded();
    let mut out = String::new();

    emit_prelude(fonts, page, &mut out);
    emit_cover(cover, degraded, page, &mut out);

    for block in document {
        out.push('#');
        out.push_str(style_fn(block.kind()));
        out.push('[');
        spans_to_typst(block.content(), degraded, &mut out);
        out.push_str("]\n\n");
    }

    out
}

fn emit_prelude(fonts: &FontSet, page: &PageConfig, out: &mut String) {
    out.push_str(&format!(
        "#set page(paper: \"a4\", margin: {}pt)\n",
        page.margin
    ));
    out.push_str(&format!(
        "#set text(font: \"{}\", lang: \"ru\", size: 12pt)\n",
        escape_string(fonts.family_name())
    ));
    out.push_str("#set par(linebreaks: \"optimized\")\n\n");

    for kind in BlockKind::ALL {
        emit_style_fn(kind, fonts.is_degraded(), out);
    }
    out.push('\n');
}

fn emit_style_fn(kind: BlockKind, degraded: bool, out: &mut String) {
    let style = page_style(kind);
    let weight = if style.bold && !degraded { "bold" } else { "regular" };

    let mut block_args = format!(
        "above: {}pt, below: {}pt, width: 100%, sticky: {}",
        style.above, style.below, style.sticky
    );
    if let Some(fill) = style.fill {
        block_args.push_str(&format!(", fill: rgb(\"{fill}\"), inset: 5pt"));
    } else if style.indent > 0.0 {
        block_args.push_str(&format!(", inset: (left: {}pt)", style.indent));
    }

    let body = if kind == BlockKind::ListItem {
        "[• #body]"
    } else {
        "body"
    };

    out.push_str(&format!(
        "#let {name}(body) = block({block_args}, par(justify: {justify}, leading: {gap}pt, \
         text(size: {size}pt, weight: \"{weight}\", fill: rgb(\"{color}\"), {body})))\n",
        name = style_fn(kind),
        justify = style.justify,
        gap = style.line_gap,
        size = style.size,
        color = style.color,
    ));
}

fn emit_cover(cover: &Cover, degraded: bool, page: &PageConfig, out: &mut String) {
    let weight = if degraded { "regular" } else { "bold" };
    let fill = if cover.banner.is_some() {
        TITLE_ON_BANNER
    } else {
        TITLE_ON_PAGE
    };

    out.push_str(&format!(
        "#place(top + left, dx: -{margin}pt, dy: {dy:.2}pt)[#box(width: {PAGE_WIDTH}pt, height: {BANNER_HEIGHT:.2}pt)[\n",
        margin = page.margin,
        dy = BANNER_TOP - page.margin,
    ));
    if let Some(path) = cover.banner {
        out.push_str(&format!(
            "#place(image(\"{}\", width: 100%, height: 100%, fit: \"stretch\"))\n",
            escape_string(path)
        ));
    }
    out.push_str(&format!(
        "#align(center + horizon)[#text(size: {}pt, weight: \"{weight}\", fill: {fill})[",
        cover.title_size
    ));
    escape_text(&cover.title, out);
    out.push_str("]]\n]]\n");

    let content_top = BANNER_TOP + BANNER_HEIGHT + BANNER_GAP - page.margin;
    out.push_str(&format!("#v({:.2}pt)\n\n", content_top.max(0.0)));
}

fn spans_to_typst(spans: &[InlineSpan], degraded: bool, out: &mut String) {
    for span in spans {
        let bold = span.bold && !degraded;
        let italic = (span.italic || span.is_label) && !degraded;
        if bold {
            out.push_str("#strong[");
        }
        if italic {
            out.push_str("#emph[");
        }
        escape_text(&span.text, out);
        if italic {
            out.push(']');
        }
        if bold {
            out.push(']');
        }
    }
}

/// Escape special Typst markup characters.
fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '{' | '}' | '/'
            | '~' | '-' | '+' | '=' | '.' | '(' | ')' | ';' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(ch),
        }
    }
}

/// Escape a value placed inside a Typst string literal.
fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A cover image read from disk, with the virtual path Typst sees it under.
struct Banner {
    path: &'static str,
    data: Vec<u8>,
}

/// Read the banner if configured; any failure just drops the image.
fn load_banner(path: Option<&Path>) -> Option<Banner> {
    let path = path?;
    if !path.is_file() {
        return None;
    }
    let virtual_path = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "cover-banner.jpg",
        Some("gif") => "cover-banner.gif",
        Some("svg") => "cover-banner.svg",
        _ => "cover-banner.png",
    };
    match fs::read(path) {
        Ok(data) => Some(Banner {
            path: virtual_path,
            data,
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read cover image");
            None
        }
    }
}

/// Render a document to PDF bytes.
pub fn document_to_pdf(document: &Document, config: &Config) -> Result<Vec<u8>, RenderError> {
    let fonts = fonts::shared();
    let banner = load_banner(config.cover.banner.as_deref());
    let cover = Cover::new(&config.cover, fonts, banner.as_ref().map(|b| b.path));
    let source = document_to_typst(document, &cover, fonts, &config.page);

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);
    let faces: Vec<&'static [u8]> = fonts.faces().iter().map(|f| f.data.as_slice()).collect();

    let builder = TypstEngine::builder()
        .main_file(source)
        .fonts(faces)
        .search_fonts_with(font_options);
    let engine = match banner {
        Some(banner) => builder
            .with_static_file_resolver([(banner.path, Bytes::new(banner.data))])
            .build(),
        None => builder.build(),
    };

    let compiled = engine.compile();
    for warning in &compiled.warnings {
        tracing::debug!(message = %warning.message, "typst warning");
    }
    let doc: PagedDocument = compiled
        .output
        .map_err(|e| RenderError::Compile(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default())
        .map_err(|e| RenderError::Export(format!("{:?}", e)))
}
