//! TOON encoder: JSON values → the header-based layout the lenient decoder reads.
//!
//! The output uses the shapes models are prompted with, so that decoding an
//! encoded document gives the same value back whenever its keys are identifiers
//! and its arrays hold objects:
//!
//! ```text
//! verdict: approve                 scalar
//! summary{total_issues}:           object, fields declared
//!   total_issues: 2
//! issues[2]{file,line}:            flat objects with the same keys, one row each
//!   src/a.ts,10
//!   src/b.ts,22
//! steps[1]:                        any other array of objects, indexed items
//! steps[0]{name,run}:
//!   name: build
//!   run{cmd}:
//!     cmd: cargo build
//! tags[2]: rust,toon               scalar array, inline
//! ```
//!
//! Scalar arrays, mixed arrays (`- item` lists), root arrays and keys that are
//! not identifiers (`"quoted key"`) are written the way standard TOON writes
//! them. The lenient decoder skips those lines. Line breaks inside strings are
//! written as a literal `\n`.

use serde_json::{Map, Number, Value};

use crate::error::Result;
use crate::scalar::parse_scalar;
use crate::types::{is_key, INDENT_STEP};

/// Encode a JSON value as TOON.
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => encode_fields(map, 0, &mut out),
        Value::Array(items) if items.iter().all(is_scalar) => {
            push_line(&mut out, 0, &format!("[{}]: {}", items.len(), inline_values(items)));
        }
        Value::Array(items) => {
            push_line(&mut out, 0, &format!("[{}]:", items.len()));
            encode_list_items(items, 1, &mut out);
        }
        scalar => out.push_str(&value_text(scalar)),
    }
    out
}

/// Parse `json` and encode it as TOON.
pub fn encode_json(json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json)?;
    Ok(encode(&value))
}

fn push_line(out: &mut String, depth: usize, text: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.extend(std::iter::repeat_n(' ', depth * INDENT_STEP));
    out.push_str(text);
}

fn encode_fields(map: &Map<String, Value>, depth: usize, out: &mut String) {
    for (key, value) in map {
        encode_field(&encode_key(key), value, depth, out);
    }
}

fn encode_field(key: &str, value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Object(map) => {
            push_line(out, depth, &format!("{key}{{{}}}:", field_list(map)));
            encode_fields(map, depth + 1, out);
        }
        Value::Array(items) => encode_array(key, items, depth, out),
        scalar => push_line(out, depth, &format!("{key}: {}", value_text(scalar))),
    }
}

/// Pick the array layout: empty, tabular, indexed items, inline scalars, or a
/// `- ` list for anything mixed.
fn encode_array(key: &str, items: &[Value], depth: usize, out: &mut String) {
    let len = items.len();

    if items.is_empty() {
        push_line(out, depth, &format!("{key}[0]:"));
        return;
    }

    if let Some(fields) = tabular_fields(items) {
        push_line(out, depth, &format!("{key}[{len}]{{{}}}:", fields.join(",")));
        for map in items.iter().filter_map(Value::as_object) {
            let row: Vec<String> = fields.iter().map(|f| cell_text(&map[*f])).collect();
            push_line(out, depth + 1, &row.join(","));
        }
        return;
    }

    if items.iter().all(Value::is_object) {
        push_line(out, depth, &format!("{key}[{len}]:"));
        for (i, map) in items.iter().filter_map(Value::as_object).enumerate() {
            push_line(out, depth, &format!("{key}[{i}]{{{}}}:", field_list(map)));
            encode_fields(map, depth + 1, out);
        }
        return;
    }

    if items.iter().all(is_scalar) {
        push_line(out, depth, &format!("{key}[{len}]: {}", inline_values(items)));
        return;
    }

    push_line(out, depth, &format!("{key}[{len}]:"));
    encode_list_items(items, depth + 1, out);
}

/// `- ` list items. An object item opens with a bare `-` and puts its fields
/// one level deeper.
fn encode_list_items(items: &[Value], depth: usize, out: &mut String) {
    for item in items {
        match item {
            Value::Object(map) => {
                push_line(out, depth, "-");
                encode_fields(map, depth + 1, out);
            }
            Value::Array(inner) if inner.iter().all(is_scalar) => {
                push_line(out, depth, &format!("- [{}]: {}", inner.len(), inline_values(inner)));
            }
            Value::Array(inner) => {
                push_line(out, depth, &format!("- [{}]:", inner.len()));
                encode_list_items(inner, depth + 1, out);
            }
            scalar => push_line(out, depth, &format!("- {}", cell_text(scalar))),
        }
    }
}

/// Field order for a tabular array: every element is an object with the same
/// identifier keys and only scalar values that fit in a row.
fn tabular_fields(items: &[Value]) -> Option<Vec<&str>> {
    let first = items.first()?.as_object()?;
    if first.is_empty() || !first.keys().all(|k| is_key(k)) {
        return None;
    }
    let fields: Vec<&str> = first.keys().map(String::as_str).collect();
    let uniform = items.iter().all(|item| {
        item.as_object().is_some_and(|map| {
            map.len() == fields.len()
                && fields
                    .iter()
                    .all(|f| map.get(*f).is_some_and(fits_in_row))
        })
    });
    uniform.then_some(fields)
}

fn fits_in_row(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.contains(['\n', '\r']) && !(s.contains('"') && s.contains('\'')),
        other => is_scalar(other),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Declared fields of an object header. Only identifier keys can be listed.
fn field_list(map: &Map<String, Value>) -> String {
    map.keys()
        .filter(|k| is_key(k))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_key(key: &str) -> String {
    if is_key(key) {
        key.to_string()
    } else {
        Value::String(key.to_string()).to_string()
    }
}

fn inline_values(items: &[Value]) -> String {
    items.iter().map(cell_text).collect::<Vec<_>>().join(",")
}

/// A scalar after `key: `. Strings are quoted when the decoder would otherwise
/// read them as something else.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let s = escape_line_breaks(s);
            if parse_scalar(&s) == Value::String(s.clone()) {
                s
            } else {
                format!("\"{s}\"")
            }
        }
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

/// A scalar inside a comma-separated row. On top of the `key: value` rules,
/// delimiters, quotes and line-start markers force quoting.
fn cell_text(value: &Value) -> String {
    let Value::String(s) = value else {
        return value_text(value);
    };
    let s = escape_line_breaks(s);
    let plain = parse_scalar(&s) == Value::String(s.clone())
        && !s.contains([',', ':', '"', '\''])
        && !s.starts_with('#')
        && s != "-"
        && !s.starts_with("- ");
    if plain {
        s
    } else if s.contains('"') {
        format!("'{s}'")
    } else {
        format!("\"{s}\"")
    }
}

fn escape_line_breaks(s: &str) -> String {
    s.replace("\r\n", "\\n").replace(['\n', '\r'], "\\n")
}

/// Numbers without exponents, so the decoder reads them back as numbers.
fn number_text(n: &Number) -> String {
    let text = n.to_string();
    if !text.contains(['e', 'E']) {
        return text;
    }
    match n.as_f64() {
        Some(f) => {
            let mut plain = format!("{f}");
            if !plain.contains('.') {
                plain.push_str(".0");
            }
            plain
        }
        None => text,
    }
}
