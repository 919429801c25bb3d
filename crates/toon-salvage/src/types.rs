//! Line model for the lenient decoder.
//!
//! Every input line is classified exactly once into a [`LineKind`]. The decoder
//! then dispatches on the variant instead of re-matching text patterns, so the
//! header, pair, and comment rules cannot overlap.

use serde_json::{Map, Value};

/// Indentation added by each nested scope. The decoder never auto-detects this.
pub const INDENT_STEP: usize = 2;

/// A parsed document: string keys mapped to JSON values, in source order.
pub type Document = Map<String, Value>;

/// One input line: its leading-whitespace width and its classified content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// Leading whitespace counted in raw characters (a tab counts as one).
    pub indent: usize,
    /// The line with surrounding whitespace removed.
    pub content: &'a str,
    pub kind: LineKind<'a>,
}

/// Structural role of a line, decided from its text alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    /// Content starts with `#`.
    Comment,
    /// `key[N]:` or `key[N]{f1,f2}:`. On a declaration line `count` is the
    /// declared length; on an indexed item line it is the item's position.
    ArrayHeader {
        key: &'a str,
        count: usize,
        fields: Option<Vec<&'a str>>,
    },
    /// `key{f1,f2}:` or a bare `key:`.
    ObjectHeader {
        key: &'a str,
        fields: Option<Vec<&'a str>>,
    },
    /// `key: value` with a non-empty value.
    ScalarPair { key: &'a str, value: &'a str },
    Unrecognized,
}

impl<'a> Line<'a> {
    pub fn new(raw: &'a str) -> Self {
        let indent = raw.chars().take_while(|c| c.is_whitespace()).count();
        let content = raw.trim();
        Self {
            indent,
            content,
            kind: classify(content),
        }
    }

    /// Blank and comment lines carry no structure and never end a scope.
    pub fn is_skippable(&self) -> bool {
        matches!(self.kind, LineKind::Blank | LineKind::Comment)
    }

    /// If this line is an indexed header `key[N]...:` for `key`, return `N`.
    pub fn item_index(&self, key: &str) -> Option<usize> {
        match &self.kind {
            LineKind::ArrayHeader { key: k, count, .. } if *k == key => Some(*count),
            _ => None,
        }
    }
}

/// Split text into classified lines.
pub fn split_lines(text: &str) -> Vec<Line<'_>> {
    text.lines().map(Line::new).collect()
}

/// Classify trimmed line content.
///
/// Header detection runs before pair detection, so `key:` with nothing after the
/// colon is always a header. A line that ends in `:` but whose head is not a
/// valid header (e.g. `url: http:`) is still tried as a pair.
pub fn classify(content: &str) -> LineKind<'_> {
    if content.is_empty() {
        return LineKind::Blank;
    }
    if content.starts_with('#') {
        return LineKind::Comment;
    }
    if let Some(head) = content.strip_suffix(':') {
        if let Some(kind) = parse_header(head) {
            return kind;
        }
    }
    if let Some((key, value)) = content.split_once(':') {
        let key = key.trim_end();
        let value = value.trim();
        if is_key(key) && !value.is_empty() {
            return LineKind::ScalarPair { key, value };
        }
    }
    LineKind::Unrecognized
}

/// Parse the part of a header line before its trailing colon.
fn parse_header(head: &str) -> Option<LineKind<'_>> {
    let head = head.trim_end();
    let key_end = head.find(['[', '{']).unwrap_or(head.len());
    let key = &head[..key_end];
    if !is_key(key) {
        return None;
    }

    let mut rest = &head[key_end..];
    let mut count = None;
    if let Some(after) = rest.strip_prefix('[') {
        let close = after.find(']')?;
        // Older TOON drafts wrote the length as `[#N]`.
        let digits = after[..close].trim().trim_start_matches('#');
        count = Some(digits.parse::<usize>().ok()?);
        rest = &after[close + 1..];
    }

    let mut fields = None;
    if let Some(after) = rest.strip_prefix('{') {
        let close = after.find('}')?;
        fields = Some(
            after[..close]
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect(),
        );
        rest = &after[close + 1..];
    }

    if !rest.trim().is_empty() {
        return None;
    }

    Some(match count {
        Some(count) => LineKind::ArrayHeader { key, count, fields },
        None => LineKind::ObjectHeader { key, fields },
    })
}

/// Keys are identifiers: `[A-Za-z_][A-Za-z0-9_.-]*`.
///
/// Quoted keys are deliberately excluded so that pretty-printed JSON lines
/// (`"file": "a.ts",`) are never mistaken for pairs.
pub fn is_key(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_array_header_with_fields() {
        assert_eq!(
            classify("issues[2]{file,line}:"),
            LineKind::ArrayHeader {
                key: "issues",
                count: 2,
                fields: Some(vec!["file", "line"]),
            }
        );
    }

    #[test]
    fn classifies_bare_and_field_object_headers() {
        assert_eq!(
            classify("summary:"),
            LineKind::ObjectHeader {
                key: "summary",
                fields: None
            }
        );
        assert_eq!(
            classify("summary{ total , }:"),
            LineKind::ObjectHeader {
                key: "summary",
                fields: Some(vec!["total"])
            }
        );
    }

    #[test]
    fn value_with_colons_is_a_pair() {
        assert_eq!(
            classify("url: http://example.com:"),
            LineKind::ScalarPair {
                key: "url",
                value: "http://example.com:"
            }
        );
    }

    #[test]
    fn prose_and_json_lines_are_unrecognized() {
        assert_eq!(classify("Here is the result:"), LineKind::Unrecognized);
        assert_eq!(classify(r#""file": "a.ts","#), LineKind::Unrecognized);
        assert_eq!(classify("issues[two]:"), LineKind::Unrecognized);
        assert_eq!(classify("- file: a"), LineKind::Unrecognized);
    }

    #[test]
    fn hash_count_marker_is_accepted() {
        assert_eq!(
            classify("tags[#3]:"),
            LineKind::ArrayHeader {
                key: "tags",
                count: 3,
                fields: None
            }
        );
    }

    #[test]
    fn indent_counts_raw_characters() {
        assert_eq!(Line::new("\t  key: v").indent, 3);
        assert_eq!(Line::new("    # note").kind, LineKind::Comment);
    }
}
