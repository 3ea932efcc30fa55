use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, BlockKind, InlineSpan};
use crate::inline::{extract_bold, strip_bold_markers};

static TAGGED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(TITLE|SUBTITLE|H1|H2|P|EM|L|B)\](.*)$").expect("valid regex")
});

static MARKDOWN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s*").expect("valid regex"));

static BLOCK_NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^блок\s*(\d+)\s*\.?\s*(.*)$").expect("valid regex"));

static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").expect("valid regex"));

static PLANET_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[•\-–—]\s*)?(Солнце|Луна|Меркурий|Венера|Марс|Юпитер|Сатурн|Уран|Нептун|Плутон|Лилит|Северный узел|ASC)\s*—\s*(.+?)\s*$",
    )
    .expect("valid regex")
});

/// Upper-cased prefixes of summary lines ("итог", "вывод", "заключение").
const CONCLUSION_PREFIXES: [&str; 3] = ["ИТОГ", "ВЫВОД", "ЗАКЛЮЧЕНИ"];

/// Classify one normalized line.
///
/// An explicit `[TAG]...[/TAG]` wrapper always wins; otherwise the legacy
/// rules are tried in table order and the first match decides. Returns
/// `None` for `[TITLE]`/`[SUBTITLE]` lines and for lines without visible
/// content.
pub fn classify(line: &str) -> Option<Block> {
    let line = line.trim();
    match tagged(line) {
        Some((tag, content)) => classify_tagged(tag, content),
        None => classify_legacy(line),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Title,
    Subtitle,
    H1,
    H2,
    P,
    Em,
    L,
    B,
}

impl Tag {
    fn from_name(name: &str) -> Option<Tag> {
        Some(match name {
            "TITLE" => Tag::Title,
            "SUBTITLE" => Tag::Subtitle,
            "H1" => Tag::H1,
            "H2" => Tag::H2,
            "P" => Tag::P,
            "EM" => Tag::Em,
            "L" => Tag::L,
            "B" => Tag::B,
            _ => return None,
        })
    }
}

/// Match a line wrapped whole in one tag pair, returning the inner content.
fn tagged(line: &str) -> Option<(Tag, &str)> {
    let caps = TAGGED_LINE.captures(line)?;
    let name = caps.get(1)?.as_str();
    let rest = caps.get(2)?.as_str();
    let content = rest.strip_suffix(format!("[/{name}]").as_str())?;
    Some((Tag::from_name(name)?, content))
}

fn classify_tagged(tag: Tag, content: &str) -> Option<Block> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    match tag {
        // The cover is a fixed template in both renderers.
        Tag::Title | Tag::Subtitle => None,
        Tag::H1 => BlockKind::Heading1.build(extract_bold(content)),
        Tag::H2 => BlockKind::Heading2.build(extract_bold(content)),
        Tag::P => BlockKind::Paragraph.build(extract_bold(content)),
        Tag::L => BlockKind::ListItem.build(extract_bold(content)),
        Tag::Em => BlockKind::Emphasis.build(vec![InlineSpan::italic(strip_bold_markers(content))]),
        Tag::B => BlockKind::Paragraph.build(vec![InlineSpan::bold(strip_bold_markers(content))]),
    }
}

/// An untagged line prepared for the legacy rules.
struct LegacyLine<'a> {
    /// The trimmed source line, Markdown markers included.
    raw: &'a str,
    /// The line with leading `#` markers and every `**` removed.
    text: String,
    /// `text` without `[B]`/`[/B]` markers, for rules that emit a single run.
    plain: String,
}

/// One row of the legacy rule table: when `matcher` yields spans, the line
/// becomes a block of `kind`.
struct Rule {
    name: &'static str,
    kind: BlockKind,
    matcher: fn(&LegacyLine<'_>) -> Option<Vec<InlineSpan>>,
}

const LEGACY_RULES: &[Rule] = &[
    Rule {
        name: "block-number-prefix",
        kind: BlockKind::BlockNumberHeading,
        matcher: block_number_prefix,
    },
    Rule {
        name: "numbered-heading",
        kind: BlockKind::BlockNumberHeading,
        matcher: numbered_heading,
    },
    Rule {
        name: "markdown-subheading",
        kind: BlockKind::SubHeading,
        matcher: markdown_subheading,
    },
    Rule {
        name: "conclusion",
        kind: BlockKind::Emphasis,
        matcher: conclusion,
    },
    Rule {
        name: "upper-case",
        kind: BlockKind::SubHeading,
        matcher: upper_case,
    },
    Rule {
        name: "planet-label",
        kind: BlockKind::Paragraph,
        matcher: planet_label,
    },
    Rule {
        name: "paragraph",
        kind: BlockKind::Paragraph,
        matcher: paragraph,
    },
];

fn classify_legacy(raw: &str) -> Option<Block> {
    let text = MARKDOWN_HEADER.replace(raw, "").replace("**", "");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let line = LegacyLine {
        raw,
        text: text.to_owned(),
        plain: strip_bold_markers(text).trim().to_owned(),
    };

    LEGACY_RULES.iter().find_map(|rule| {
        let spans = (rule.matcher)(&line)?;
        tracing::trace!(rule = rule.name, line = raw, "legacy rule matched");
        Some(rule.kind.build(spans))
    })?
}

fn block_number_prefix(line: &LegacyLine<'_>) -> Option<Vec<InlineSpan>> {
    let caps = BLOCK_NUMBER_PREFIX.captures(&line.plain)?;
    let number = caps.get(1)?.as_str();
    let title = caps.get(2).map_or("", |m| m.as_str().trim());
    let text = if title.is_empty() {
        format!("{number}.")
    } else {
        format!("{number}. {title}")
    };
    Some(vec![InlineSpan::plain(text)])
}

fn numbered_heading(line: &LegacyLine<'_>) -> Option<Vec<InlineSpan>> {
    (line.raw.starts_with("###") || NUMBERED.is_match(&line.plain))
        .then(|| vec![InlineSpan::plain(&line.plain)])
}

// Any `####` line also starts with `###`, so numbered-heading claims it first.
fn markdown_subheading(line: &LegacyLine<'_>) -> Option<Vec<InlineSpan>> {
    line.raw
        .starts_with("####")
        .then(|| vec![InlineSpan::plain(&line.plain)])
}

fn conclusion(line: &LegacyLine<'_>) -> Option<Vec<InlineSpan>> {
    let upper = line.plain.to_uppercase();
    CONCLUSION_PREFIXES
        .iter()
        .any(|prefix| upper.starts_with(prefix))
        .then(|| {
            vec![InlineSpan {
                text: line.plain.clone(),
                bold: true,
                italic: true,
                is_label: false,
            }]
        })
}

fn upper_case(line: &LegacyLine<'_>) -> Option<Vec<InlineSpan>> {
    is_upper_case(&line.plain).then(|| vec![InlineSpan::plain(&line.plain)])
}

fn planet_label(line: &LegacyLine<'_>) -> Option<Vec<InlineSpan>> {
    let caps = PLANET_LABEL.captures(&line.plain)?;
    let label = caps.get(1)?.as_str();
    let rest = caps.get(2)?.as_str();
    Some(vec![
        InlineSpan::label(label),
        InlineSpan::plain(format!(" — {rest}")),
    ])
}

fn paragraph(line: &LegacyLine<'_>) -> Option<Vec<InlineSpan>> {
    Some(extract_bold(&line.text))
}

/// True when the text has cased letters and none of them is lower-case.
fn is_upper_case(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        cased |= c.is_uppercase();
    }
    cased
}
