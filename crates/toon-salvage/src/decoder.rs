//! Lenient TOON decoder: classified lines → `serde_json::Value` tree.
//!
//! The grammar is inferred from model output rather than a published standard, so
//! the decoder never fails. Lines it cannot place are skipped, and arrays whose
//! indexed items are missing are padded with `{}`. Only a document with no
//! recognisable entries at all yields `None`.
//!
//! # Shapes understood
//!
//! ```text
//! verdict: approve                 scalar pair
//! summary{total_issues}:           nested object (children at indent + 2)
//!   total_issues: 3
//! issues[2]:                       array declaration
//! issues[0]{file,line}:            indexed item 0 (same indent as declaration)
//!   file: src/a.ts
//!   line: 10
//! issues[1]{file,line}:            indexed item 1
//!   file: src/b.ts
//!   line: 22
//! ```
//!
//! When an array declaration is not followed by indexed item headers, its
//! indented block is read instead: `- ` markers or a repeated field name start a
//! new item, and with declared `{fields}` comma-separated rows map positionally.
//!
//! # Key design decisions
//!
//! - **Index threading**: every scope parser returns `(value, next_line)`. The
//!   caller resumes from `next_line`, so array bodies and nested blocks are never
//!   re-read by their parent.
//! - **Scope boundaries**: a scope ends at the first significant line indented
//!   less than its minimum, or, for an array item body, at the next indexed
//!   header of the same key.
//! - **Fixed indent step**: nested objects expect children at the header's indent
//!   plus [`INDENT_STEP`]. Nothing is auto-detected.

use std::cell::Cell;

use serde_json::Value;

use crate::config::ParserConfig;
use crate::normalize::normalize;
use crate::scalar::parse_scalar;
use crate::types::{classify, split_lines, Document, Line, LineKind, INDENT_STEP};

/// Normalize raw model output and decode it with the default [`ParserConfig`].
///
/// Returns `Some(Value::Object(..))`, or `None` if no entries were found.
pub fn decode(raw: &str) -> Option<Value> {
    Decoder::default().decode(raw)
}

/// Decode already-normalized TOON text with the default [`ParserConfig`].
pub fn parse_document(text: &str) -> Option<Document> {
    Decoder::default().parse_document(text)
}

/// A reusable decoder carrying resource limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    config: ParserConfig,
}

impl Decoder {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Normalize raw model output, then decode it.
    pub fn decode(&self, raw: &str) -> Option<Value> {
        self.parse_document(normalize(raw)).map(Value::Object)
    }

    /// Decode TOON text. Top-level keys sit at indent 0.
    pub fn parse_document(&self, text: &str) -> Option<Document> {
        let lines = split_lines(text);
        let pass = Pass {
            lines: &lines,
            config: &self.config,
            item_budget: Cell::new(self.config.max_total_items),
        };
        let (doc, _) = pass.parse_object(0, Scope::top());
        (!doc.is_empty()).then_some(doc)
    }
}

/// Bounds of the object currently being parsed.
#[derive(Debug, Clone, Copy)]
struct Scope<'k> {
    /// Lines indented less than this end the scope.
    min_indent: usize,
    /// Inside an array item body: the array's key. Its next indexed header ends
    /// the item.
    boundary: Option<&'k str>,
    depth: usize,
}

impl Scope<'_> {
    fn top() -> Self {
        Scope {
            min_indent: 0,
            boundary: None,
            depth: 0,
        }
    }
}

/// One decoding pass over an immutable line list.
struct Pass<'l, 'a> {
    lines: &'l [Line<'a>],
    config: &'l ParserConfig,
    /// Array elements still allowed in this document.
    item_budget: Cell<usize>,
}

impl<'l, 'a> Pass<'l, 'a> {
    /// Parse a run of entries into a mapping.
    ///
    /// Returns the mapping and the index of the first line not consumed.
    fn parse_object(&self, start: usize, scope: Scope<'_>) -> (Document, usize) {
        let mut map = Document::new();
        let mut i = start;

        while let Some(line) = self.lines.get(i) {
            if line.is_skippable() {
                i += 1;
                continue;
            }
            if line.indent < scope.min_indent {
                break;
            }
            if scope.boundary.is_some_and(|key| line.item_index(key).is_some()) {
                break;
            }

            let (key, value, next) = match &line.kind {
                LineKind::ArrayHeader { key, count, fields } => {
                    let (value, next) = self.parse_container(i, key, scope.depth, |depth| {
                        self.parse_array(i, key, *count, fields.as_deref(), depth)
                    });
                    (*key, value, next)
                }
                LineKind::ObjectHeader { key, fields } => {
                    let (value, next) = self.parse_container(i, key, scope.depth, |depth| {
                        self.parse_nested(i, fields.is_some(), depth)
                    });
                    (*key, value, next)
                }
                LineKind::ScalarPair { key, value } => (*key, parse_scalar(value), i + 1),
                _ => {
                    i += 1;
                    continue;
                }
            };
            map.insert(key.to_string(), value);
            i = next;
        }

        (map, i)
    }

    /// Run `parse` one level deeper, unless that would exceed `max_depth`, in
    /// which case the container's whole block is consumed and `null` is stored.
    fn parse_container(
        &self,
        header: usize,
        key: &str,
        depth: usize,
        parse: impl FnOnce(usize) -> (Value, usize),
    ) -> (Value, usize) {
        if depth >= self.config.max_depth {
            tracing::warn!(
                key,
                line = header + 1,
                max_depth = self.config.max_depth,
                "nesting limit reached, dropping block"
            );
            return (Value::Null, self.skip_container(header, key));
        }
        parse(depth + 1)
    }

    /// Parse the block under an object header at `header`.
    ///
    /// A declared object (`key{fields}:`) is always an object. A bare `key:`
    /// with no recognised children is `null`.
    fn parse_nested(&self, header: usize, declared: bool, depth: usize) -> (Value, usize) {
        let scope = Scope {
            min_indent: self.lines[header].indent + INDENT_STEP,
            boundary: None,
            depth,
        };
        let (map, next) = self.parse_object(header + 1, scope);
        if map.is_empty() && !declared {
            (Value::Null, next)
        } else {
            (Value::Object(map), next)
        }
    }

    /// Parse the array declared at `header`.
    ///
    /// The result always has exactly `count` elements (after clamping to
    /// `max_array_len` and the document's remaining item budget); positions
    /// nothing was found for are `{}`.
    fn parse_array(
        &self,
        header: usize,
        key: &str,
        count: usize,
        fields: Option<&[&str]>,
        depth: usize,
    ) -> (Value, usize) {
        let count = if count > self.config.max_array_len {
            tracing::warn!(
                key,
                declared = count,
                max_array_len = self.config.max_array_len,
                "declared array length clamped"
            );
            self.config.max_array_len
        } else {
            count
        };
        let budget = self.item_budget.get();
        let count = if count > budget {
            tracing::warn!(
                key,
                declared = count,
                max_total_items = self.config.max_total_items,
                "document item budget exhausted, array length clamped"
            );
            budget
        } else {
            count
        };
        self.item_budget.set(budget - count);

        let header_indent = self.lines[header].indent;
        let first = self.skip_trivia(header + 1);
        let indexed = self
            .lines
            .get(first)
            .is_some_and(|line| line.indent >= header_indent && line.item_index(key).is_some());

        let mut slots: Vec<Option<Document>> = vec![None; count];
        let next = if indexed {
            self.parse_indexed_items(header, key, &mut slots, depth)
        } else {
            self.parse_block_items(header, fields, &mut slots, depth)
        };

        let items = slots
            .into_iter()
            .map(|slot| Value::Object(slot.unwrap_or_default()))
            .collect();
        (Value::Array(items), next)
    }

    /// Primary strategy: consecutive `key[N]...:` headers, each followed by its
    /// body. Item `N` lands in slot `N`; out-of-range and duplicate indexes are
    /// consumed and dropped.
    fn parse_indexed_items(
        &self,
        header: usize,
        key: &str,
        slots: &mut [Option<Document>],
        depth: usize,
    ) -> usize {
        let header_indent = self.lines[header].indent;
        let body_scope = Scope {
            min_indent: header_indent + 1,
            boundary: Some(key),
            depth,
        };

        let mut i = header + 1;
        loop {
            let at = self.skip_trivia(i);
            let Some(line) = self.lines.get(at) else {
                return at;
            };
            let index = match line.item_index(key) {
                Some(index) if line.indent >= header_indent => index,
                _ => return i,
            };

            let (body, next) = self.parse_object(at + 1, body_scope);
            match slots.get_mut(index) {
                Some(slot) if slot.is_none() => *slot = Some(body),
                Some(_) => tracing::debug!(key, index, "duplicate array index dropped"),
                None => tracing::debug!(
                    key,
                    index,
                    count = slots.len(),
                    "array index beyond declared count dropped"
                ),
            }
            i = next;
        }
    }

    /// Fallback strategy: read items out of the block indented under the
    /// header. A `- ` marker or a repeated field starts a new item; with declared
    /// `fields`, comma-separated rows are one item each.
    fn parse_block_items(
        &self,
        header: usize,
        fields: Option<&[&str]>,
        slots: &mut [Option<Document>],
        depth: usize,
    ) -> usize {
        let header_indent = self.lines[header].indent;
        let mut items: Vec<Document> = Vec::new();
        let mut current: Option<Document> = None;
        let mut i = header + 1;

        while let Some(line) = self.lines.get(i) {
            if line.is_skippable() {
                i += 1;
                continue;
            }
            if line.indent <= header_indent {
                break;
            }

            let marked = list_item_content(line.content);
            let stripped;
            let kind = match marked {
                Some(rest) => {
                    items.extend(current.replace(Document::new()));
                    stripped = classify(rest);
                    &stripped
                }
                None => &line.kind,
            };

            match kind {
                LineKind::ScalarPair { key, value }
                    if fields.is_none_or(|fields| fields.contains(key)) || !is_row(line.content) =>
                {
                    if current.as_ref().is_some_and(|item| item.contains_key(*key)) {
                        items.extend(current.take());
                    }
                    current
                        .get_or_insert_with(Document::new)
                        .insert(key.to_string(), parse_scalar(value));
                    i += 1;
                }
                LineKind::ObjectHeader { key, fields: own } => {
                    let (value, next) = self.parse_container(i, key, depth, |depth| {
                        self.parse_nested(i, own.is_some(), depth)
                    });
                    current
                        .get_or_insert_with(Document::new)
                        .insert(key.to_string(), value);
                    i = next;
                }
                LineKind::ArrayHeader {
                    key,
                    count,
                    fields: own,
                } => {
                    let (value, next) = self.parse_container(i, key, depth, |depth| {
                        self.parse_array(i, key, *count, own.as_deref(), depth)
                    });
                    current
                        .get_or_insert_with(Document::new)
                        .insert(key.to_string(), value);
                    i = next;
                }
                _ => {
                    let row = marked.unwrap_or(line.content);
                    if let Some(fields) = fields.filter(|_| !row.is_empty()) {
                        // A `- ` marker leaves an empty item open for the row.
                        items.extend(current.take().filter(|item| !item.is_empty()));
                        items.push(tabular_row(row, fields));
                    }
                    i += 1;
                }
            }
        }
        items.extend(current);

        if items.len() > slots.len() {
            tracing::debug!(
                found = items.len(),
                count = slots.len(),
                "array items beyond declared count dropped"
            );
        }
        for (slot, item) in slots.iter_mut().zip(items) {
            *slot = Some(item);
        }
        i
    }

    /// First index at or after `i` that is not blank or a comment.
    fn skip_trivia(&self, mut i: usize) -> usize {
        while self.lines.get(i).is_some_and(Line::is_skippable) {
            i += 1;
        }
        i
    }

    /// Consume a container's block without building it: deeper lines, trivia,
    /// and indexed item headers of `key` with their bodies.
    fn skip_container(&self, header: usize, key: &str) -> usize {
        let indent = self.lines[header].indent;
        let mut i = header + 1;
        while let Some(line) = self.lines.get(i) {
            let inside = line.is_skippable()
                || line.indent > indent
                || (line.indent == indent && line.item_index(key).is_some());
            if !inside {
                break;
            }
            i += 1;
        }
        i
    }
}

/// Content after a `- ` list marker, if present.
fn list_item_content(content: &str) -> Option<&str> {
    match content {
        "-" => Some(""),
        _ => content.strip_prefix("- ").map(str::trim),
    }
}

/// Rows are told apart from `key: value` lines by their commas.
fn is_row(content: &str) -> bool {
    content.contains(',')
}

/// Map a comma-separated row onto `fields` by position. Missing cells are null;
/// extra cells are dropped.
fn tabular_row(row: &str, fields: &[&str]) -> Document {
    let cells = split_row(row);
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let value = cells.get(i).map_or(Value::Null, |cell| parse_scalar(cell));
            (field.to_string(), value)
        })
        .collect()
}

/// Split on commas that are not inside single or double quotes.
fn split_row(row: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (pos, c) in row.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, ',') => {
                cells.push(row[start..pos].trim());
                start = pos + 1;
            }
            _ => {}
        }
    }
    cells.push(row[start..].trim());
    cells
}
