//! Input normalizer: cut a plausible TOON document out of raw model output.
//!
//! Models wrap their answer in prose and Markdown fences. The normalizer picks
//! a candidate region in this order:
//!
//! 1. the body of the first ```` ```toon ```` fence
//! 2. the body of the first unlabeled fence whose first line is a header
//! 3. everything from the first header line onward, stopping at a fence
//!    delimiter (a bare `key:` header only counts when an indented line
//!    follows it, so prose such as `Findings:` is passed over)
//! 4. the whole input
//!
//! Leftover fence delimiter lines are then stripped from both ends and the
//! result is trimmed. The return value is always a sub-slice of the input.

use crate::types::{classify, LineKind};

/// Reduce raw model output to a candidate TOON document.
pub fn normalize(text: &str) -> &str {
    strip_fence_lines(locate(text).unwrap_or(text))
}

/// The region found by a fence or header anchor, or `None` when `normalize`
/// would fall back to the whole input.
pub(crate) fn locate(text: &str) -> Option<&str> {
    labeled_fence(text, "toon")
        .or_else(|| unlabeled_fence_with_header(text))
        .or_else(|| header_anchored(text))
}

/// A line of `text` with its byte range. `end` includes the line terminator.
struct Span<'a> {
    start: usize,
    end: usize,
    line: &'a str,
}

fn spans(text: &str) -> impl Iterator<Item = Span<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        Span {
            start,
            end: offset,
            line: raw.trim_end_matches(['\n', '\r']),
        }
    })
}

/// If `line` is a fence delimiter, return its (possibly empty) language tag.
fn fence_tag(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("```")?;
    let tag = rest.trim_start_matches('`').trim();
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
        .then_some(tag)
}

fn is_fence(line: &str) -> bool {
    fence_tag(line).is_some()
}

/// Fenced blocks as `(tag, body)` pairs. An unclosed fence runs to the end.
fn fenced_blocks(text: &str) -> Vec<(&str, &str)> {
    let mut blocks = Vec::new();
    let mut open: Option<(&str, usize)> = None;
    for span in spans(text) {
        let Some(tag) = fence_tag(span.line) else {
            continue;
        };
        match open.take() {
            None => open = Some((tag, span.end)),
            Some((open_tag, body_start)) => blocks.push((open_tag, &text[body_start..span.start])),
        }
    }
    if let Some((tag, body_start)) = open {
        blocks.push((tag, &text[body_start..]));
    }
    blocks
}

fn labeled_fence<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    fenced_blocks(text)
        .into_iter()
        .find(|(tag, _)| tag.eq_ignore_ascii_case(label))
        .map(|(_, body)| body)
}

fn unlabeled_fence_with_header(text: &str) -> Option<&str> {
    fenced_blocks(text)
        .into_iter()
        .filter(|(tag, _)| tag.is_empty())
        .map(|(_, body)| body)
        .find(|body| {
            body.lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .is_some_and(|first| header_kind(first).is_some())
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    /// `key[count]...:` or `key{fields}:`
    Structured,
    /// `key:`
    Bare,
}

fn header_kind(content: &str) -> Option<Header> {
    match classify(content) {
        LineKind::ArrayHeader { .. } => Some(Header::Structured),
        LineKind::ObjectHeader { fields: Some(_), .. } => Some(Header::Structured),
        LineKind::ObjectHeader { fields: None, .. } => Some(Header::Bare),
        _ => None,
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Everything from the first header line up to the next fence delimiter.
///
/// A bare header whose next non-blank line is not indented deeper has no
/// block and is skipped.
fn header_anchored(text: &str) -> Option<&str> {
    let lines: Vec<Span<'_>> = spans(text).collect();
    let anchor = lines.iter().enumerate().find_map(|(i, span)| {
        match header_kind(span.line.trim())? {
            Header::Structured => Some(i),
            Header::Bare => {
                let indent = indent_of(span.line);
                lines[i + 1..]
                    .iter()
                    .find(|next| !next.line.trim().is_empty())
                    .is_some_and(|next| indent_of(next.line) > indent)
                    .then_some(i)
            }
        }
    })?;
    let end = lines[anchor + 1..]
        .iter()
        .find(|span| is_fence(span.line))
        .map_or(text.len(), |span| span.start);
    Some(&text[lines[anchor].start..end])
}

/// Drop fence delimiter lines from both ends, then trim.
fn strip_fence_lines(mut s: &str) -> &str {
    loop {
        s = s.trim();
        let (first, rest) = s.split_once('\n').unwrap_or((s, ""));
        if is_fence(first) {
            s = rest;
            continue;
        }
        let (head, last) = s.rsplit_once('\n').unwrap_or(("", s));
        if is_fence(last) {
            s = head;
            continue;
        }
        return s;
    }
}
