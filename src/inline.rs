use std::sync::LazyLock;

use regex::Regex;

use crate::block::InlineSpan;

/// Non-greedy, so an inner `[B]` before the first close stays literal text.
static BOLD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\[B\](.*?)\[/B\]").expect("valid regex"));

static BOLD_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[/?B\]").expect("valid regex"));

/// Split text on inline `[B]...[/B]` pairs into plain and bold spans, in order.
pub fn extract_bold(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in BOLD_RUN.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_plain(&mut spans, &text[last..whole.start()]);
        if !inner.as_str().is_empty() {
            spans.push(InlineSpan::bold(inner.as_str()));
        }
        last = whole.end();
    }
    push_plain(&mut spans, &text[last..]);

    spans
}

/// Remove every bold marker, keeping the enclosed text.
pub fn strip_bold_markers(text: &str) -> String {
    BOLD_MARKER.replace_all(text, "").into_owned()
}

fn push_plain(spans: &mut Vec<InlineSpan>, text: &str) {
    if !text.is_empty() {
        spans.push(InlineSpan::plain(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_one_span() {
        assert_eq!(extract_bold("just text"), vec![InlineSpan::plain("just text")]);
    }

    #[test]
    fn bold_label_then_rest() {
        assert_eq!(
            extract_bold("[B]Солнце[/B] — Близнецы"),
            vec![InlineSpan::bold("Солнце"), InlineSpan::plain(" — Близнецы")]
        );
    }

    #[test]
    fn interleaves_in_source_order() {
        assert_eq!(
            extract_bold("a [B]b[/B] c [b]d[/b]"),
            vec![
                InlineSpan::plain("a "),
                InlineSpan::bold("b"),
                InlineSpan::plain(" c "),
                InlineSpan::bold("d"),
            ]
        );
    }

    #[test]
    fn bold_runs_do_not_nest() {
        assert_eq!(
            extract_bold("[B]a [B]b[/B] c[/B]"),
            vec![InlineSpan::bold("a [B]b"), InlineSpan::plain(" c[/B]")]
        );
    }

    #[test]
    fn unclosed_marker_is_literal() {
        assert_eq!(
            extract_bold("x [B]never closed"),
            vec![InlineSpan::plain("x [B]never closed")]
        );
    }

    #[test]
    fn strips_markers() {
        assert_eq!(strip_bold_markers("[B]Итог[/B]: всё [b]хорошо[/b]"), "Итог: всё хорошо");
    }
}
