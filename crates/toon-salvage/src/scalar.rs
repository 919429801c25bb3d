//! Scalar token typing.

use serde_json::{Number, Value};

/// Parse a trimmed value fragment into a JSON value.
///
/// Rules are applied in this order, first match wins:
///
/// 1. `true` / `false` in any case → bool
/// 2. `null` in any case, or an empty fragment → null
/// 3. integer (no `.`, no exponent) → number (`i64`, then `u64`)
/// 4. float (contains `.`, finite) → number
/// 5. wrapped in matching `"` or `'` → the inner text, no escape processing
/// 6. anything else → the string itself
///
/// Because numeric and boolean checks see the raw token, a quoted `"42"` or
/// `"true"` stays a string.
pub fn parse_scalar(s: &str) -> Value {
    let s = s.trim();

    if s.is_empty() || s.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if !s.contains(['.', 'e', 'E']) {
        if let Ok(n) = s.parse::<i64>() {
            return Value::Number(n.into());
        }
        if let Ok(n) = s.parse::<u64>() {
            return Value::Number(n.into());
        }
    }

    if s.contains('.') {
        if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }

    Value::String(unquote(s).to_string())
}

/// Remove exactly one pair of matching surrounding quotes, if present.
fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
