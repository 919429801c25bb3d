//! Rough size and token comparison between JSON and TOON renderings.
//!
//! Token counts are estimates (about four characters per token after collapsing
//! whitespace). They are good enough to compare two formats, not to budget a
//! prompt.

use serde::Serialize;
use serde_json::Value;

use crate::encoder::encode;

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text`.
///
/// Runs of whitespace collapse to a single space before counting characters.
pub fn estimate_tokens(text: &str) -> usize {
    let words: Vec<&str> = text.split_whitespace().collect();
    let chars = words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len().saturating_sub(1);
    chars / CHARS_PER_TOKEN
}

/// Size comparison of the same data as compact JSON and as TOON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatComparison {
    /// Characters in the compact JSON rendering.
    pub json_size: usize,
    /// Characters in the TOON text.
    pub toon_size: usize,
    pub json_tokens_est: usize,
    pub toon_tokens_est: usize,
    /// Estimated tokens saved by TOON; negative if TOON is larger.
    pub tokens_saved: i64,
    /// `tokens_saved` as a percentage of the JSON estimate, two decimals.
    pub reduction_percent: f64,
}

/// Compare `value` as compact JSON against its [`encode`]d TOON form.
pub fn compare(value: &Value) -> FormatComparison {
    compare_formats(value, &encode(value))
}

/// Compare `json` (rendered compactly) against a given TOON text.
pub fn compare_formats(json: &Value, toon: &str) -> FormatComparison {
    let json_text = json.to_string();
    let json_tokens = estimate_tokens(&json_text);
    let toon_tokens = estimate_tokens(toon);
    let tokens_saved = json_tokens as i64 - toon_tokens as i64;
    let reduction_percent = if json_tokens > 0 {
        (tokens_saved as f64 / json_tokens as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };

    FormatComparison {
        json_size: json_text.chars().count(),
        toon_size: toon.chars().count(),
        json_tokens_est: json_tokens,
        toon_tokens_est: toon_tokens,
        tokens_saved,
        reduction_percent,
    }
}
