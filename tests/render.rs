use std::fs;

use astroreport::{Block, BlockKind, InlineSpan, RenderError, ReportMetadata};
use pretty_assertions::assert_eq;

const REPORT: &str = "[TITLE]Анализ совместимости[/TITLE]
[SUBTITLE]Иван и Мария[/SUBTITLE]
[H1]Ваши планеты[/H1]
[P]23 Мая 1984 года, Москва[/P]
[P][B]Солнце[/B] — Близнецы[/P]
Луна — Рыбы

[H1]Общая картина связи[/H1]
[P]
Здесь начинается основной текст
после планет партнёра.
[/P][P]Второй абзац.[/P]
БЛОК 2. ЭМОЦИИ И ЛУНА
[L]Первый пункт[/L]
[EM]Итог: [B]гармония[/B][/EM]
";

fn metadata(dir: &tempfile::TempDir, file: &str) -> ReportMetadata {
    ReportMetadata::new(vec!["Иван".into(), "Мария".into()], dir.path().join(file))
}

#[test]
fn parse_yields_blocks_in_source_order() {
    let doc = astroreport::parse(REPORT);
    let kinds: Vec<BlockKind> = doc.iter().map(Block::kind).collect();
    assert_eq!(
        kinds,
        vec![
            BlockKind::Heading1,
            BlockKind::Paragraph,
            BlockKind::Paragraph,
            BlockKind::Paragraph,
            BlockKind::Heading1,
            BlockKind::Paragraph,
            BlockKind::Paragraph,
            BlockKind::BlockNumberHeading,
            BlockKind::ListItem,
            BlockKind::Emphasis,
        ]
    );
    assert_eq!(
        doc.blocks()[3].content(),
        &[InlineSpan::label("Луна"), InlineSpan::plain(" — Рыбы")]
    );
    assert_eq!(
        doc.blocks()[5].text(),
        "Здесь начинается основной текст после планет партнёра."
    );
}

#[test]
fn flow_render_writes_docx() {
    let dir = tempfile::tempdir().unwrap();
    let meta = metadata(&dir, "report.docx");

    let path = astroreport::render_flow(REPORT, &meta).unwrap();
    assert_eq!(path, meta.output_path);
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn flow_render_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let first = astroreport::render_flow(REPORT, &metadata(&dir, "a.docx")).unwrap();
    let second = astroreport::render_flow(REPORT, &metadata(&dir, "b.docx")).unwrap();
    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn paginated_render_writes_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let meta = metadata(&dir, "report.pdf");

    let path = astroreport::render_paginated(REPORT, &meta).unwrap();
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn paginated_render_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let first = astroreport::render_paginated(REPORT, &metadata(&dir, "a.pdf")).unwrap();
    let second = astroreport::render_paginated(REPORT, &metadata(&dir, "b.pdf")).unwrap();
    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn malformed_markup_still_renders() {
    let dir = tempfile::tempdir().unwrap();
    let markup = "[P]unclosed\n[H1]x[/H2]\n[B]a [B]b[/B]\n#### \n*_$@`<>[]{}()\\";
    assert!(astroreport::render_flow(markup, &metadata(&dir, "m.docx")).is_ok());
    assert!(astroreport::render_paginated(markup, &metadata(&dir, "m.pdf")).is_ok());
}

#[test]
fn unwritable_output_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let meta = ReportMetadata::new(Vec::new(), dir.path().join("missing").join("report.docx"));

    match astroreport::render_flow(REPORT, &meta) {
        Err(RenderError::Write { path, source }) => {
            assert_eq!(path, meta.output_path);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected write error, got {other:?}"),
    }

    let meta = ReportMetadata::new(Vec::new(), dir.path().join("missing").join("report.pdf"));
    assert!(matches!(
        astroreport::render_paginated(REPORT, &meta),
        Err(RenderError::Write { .. })
    ));
}
