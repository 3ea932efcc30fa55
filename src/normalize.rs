use std::sync::LazyLock;

use regex::Regex;

/// Opening tags whose content may span several physical lines.
static FLATTENED_OPENING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(H1|H2|P|EM|L|B)\]").expect("valid regex"));

/// A block-closing tag glued to the next opening tag, e.g. `[/P][P]`.
static ADJACENT_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[/(TITLE|SUBTITLE|P|H1|H2|L|EM)\]\s*(\[(?:TITLE|SUBTITLE|H1|H2|P|EM|L|B)\])")
        .expect("valid regex")
});

/// Split raw report markup into trimmed, non-empty logical lines.
///
/// Tagged units spanning several lines are collapsed onto one line, and
/// tags concatenated without a line break are separated. Malformed tags
/// are passed through as literal text.
pub fn normalize(raw: &str) -> Vec<String> {
    let flattened = flatten_tagged_blocks(raw);
    let separated = ADJACENT_TAGS.replace_all(&flattened, "[/${1}]\n${2}");

    separated
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Collapse the whitespace inside every `[TAG]...[/TAG]` pair.
///
/// Pairs are matched leftmost-first, each opening tag against the nearest
/// closing tag of the same name. An opening tag without a close is kept
/// verbatim and scanning resumes right after it.
fn flatten_tagged_blocks(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(caps) = FLATTENED_OPENING.captures(rest) {
        let (Some(open), Some(tag)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let tag = tag.as_str();
        let close = format!("[/{tag}]");
        let body_start = open.end();

        match rest[body_start..].find(&close) {
            Some(body_len) => {
                let body = &rest[body_start..body_start + body_len];
                out.push_str(&rest[..open.start()]);
                out.push('[');
                out.push_str(tag);
                out.push(']');
                out.push_str(&collapse_whitespace(body));
                out.push_str(&close);
                rest = &rest[body_start + body_len + close.len()..];
            }
            None => {
                out.push_str(&rest[..body_start]);
                rest = &rest[body_start..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
