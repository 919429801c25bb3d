//! Fallback chain for recovering structured data from raw model output.
//!
//! An [`Extractor`] runs an ordered list of [`Strategy`] implementations and
//! returns the first value any of them produces. The default chain is:
//!
//! 1. [`LenientToon`]: normalize, then the lenient TOON decoder
//! 2. [`DirectJson`]: the trimmed input as a JSON document
//! 3. [`EmbeddedJson`]: the first balanced `{...}` / `[...]` span that parses
//!
//! A strict TOON implementation, when one is available, slots in ahead of these
//! with [`Extractor::prepend`].

use serde_json::Value;

use crate::config::ParserConfig;
use crate::decoder::Decoder;
use crate::error::{Result, ToonError};
use crate::normalize::locate;

/// One way of turning raw text into a JSON value.
pub trait Strategy {
    /// Short identifier used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Produce a value, or decline with [`ToonError::Rejected`] (or any other
    /// error, which is treated the same way).
    fn extract(&self, raw: &str) -> Result<Value>;
}

/// Lenient TOON decoding, see [`crate::decoder`].
///
/// When no fence or header anchors the TOON, any `Word: text` line in the prose
/// would decode as a pair. In that case the strategy declines if the input also
/// carries a JSON value, so the JSON strategies get to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientToon {
    decoder: Decoder,
}

impl LenientToon {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            decoder: Decoder::new(config),
        }
    }
}

impl Strategy for LenientToon {
    fn name(&self) -> &'static str {
        "toon"
    }

    fn extract(&self, raw: &str) -> Result<Value> {
        if locate(raw).is_none() && EmbeddedJson.extract(raw).is_ok() {
            return Err(ToonError::Rejected {
                strategy: self.name(),
                reason: "no TOON block, input holds JSON".to_string(),
            });
        }
        self.decoder.decode(raw).ok_or_else(|| ToonError::Rejected {
            strategy: self.name(),
            reason: "no TOON entries found".to_string(),
        })
    }
}

/// The whole (trimmed) input parsed as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectJson;

impl Strategy for DirectJson {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract(&self, raw: &str) -> Result<Value> {
        Ok(serde_json::from_str(raw.trim())?)
    }
}

/// JSON embedded in free text, located by bracket matching.
///
/// Every balanced `{...}` / `[...]` span is a candidate, tried in order of its
/// opening bracket. Brackets inside string literals (with `\` escapes) are
/// ignored. The first candidate that parses wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedJson;

impl Strategy for EmbeddedJson {
    fn name(&self) -> &'static str {
        "embedded-json"
    }

    fn extract(&self, raw: &str) -> Result<Value> {
        for (start, end) in balanced_spans(raw) {
            match serde_json::from_str(&raw[start..end]) {
                Ok(value) => return Ok(value),
                Err(e) => tracing::debug!(offset = start, error = %e, "JSON candidate rejected"),
            }
        }
        Err(ToonError::Rejected {
            strategy: self.name(),
            reason: "no balanced JSON object or array found".to_string(),
        })
    }
}

/// Byte ranges of every balanced bracket span, sorted by start, found in one
/// pass. Quotes only open strings inside a bracket, so prose apostrophes and
/// quotations before the JSON do not matter.
fn balanced_spans(s: &str) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (pos, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if !open.is_empty() => in_string = true,
            '{' | '[' => open.push(pos),
            '}' | ']' => {
                if let Some(start) = open.pop() {
                    spans.push((start, pos + 1));
                }
            }
            _ => {}
        }
    }
    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
}

/// The value produced by a successful extraction and the strategy that won.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: Value,
    pub strategy: &'static str,
}

/// Ordered fallback chain of strategies.
pub struct Extractor {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl Extractor {
    /// The standard chain: lenient TOON, direct JSON, embedded JSON.
    pub fn new(config: ParserConfig) -> Self {
        Self {
            strategies: vec![
                Box::new(LenientToon::new(config)),
                Box::new(DirectJson),
                Box::new(EmbeddedJson),
            ],
        }
    }

    /// A chain with no strategies; build it up with [`Extractor::push`].
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Run `strategy` before every strategy already in the chain.
    pub fn prepend(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.insert(0, Box::new(strategy));
        self
    }

    /// Run `strategy` after every strategy already in the chain.
    pub fn push(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order and return the first success.
    pub fn extract(&self, raw: &str) -> Result<Extraction> {
        if raw.trim().is_empty() {
            return Err(ToonError::EmptyInput);
        }

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.extract(raw) {
                Ok(value) => {
                    tracing::debug!(strategy = strategy.name(), "extraction succeeded");
                    return Ok(Extraction {
                        value,
                        strategy: strategy.name(),
                    });
                }
                Err(e) => {
                    tracing::debug!(strategy = strategy.name(), error = %e, "strategy declined");
                    let reason = match e {
                        ToonError::Rejected { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    attempts.push((strategy.name(), reason));
                }
            }
        }
        Err(ToonError::NoStructure { attempts })
    }
}

/// Run the default chain over `raw`.
pub fn extract(raw: &str) -> Result<Extraction> {
    Extractor::default().extract(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_texts(s: &str) -> Vec<&str> {
        balanced_spans(s).into_iter().map(|(a, b)| &s[a..b]).collect()
    }

    #[test]
    fn spans_skip_brackets_in_strings() {
        let s = r#"x {"a": "}{", "b": [1]} y"#;
        assert_eq!(span_texts(s), [r#"{"a": "}{", "b": [1]}"#, "[1]"]);
    }

    #[test]
    fn spans_handle_escaped_quotes() {
        let s = r#"{"a": "say \"}\""}"#;
        assert_eq!(balanced_spans(s), [(0, s.len())]);
    }

    #[test]
    fn prose_quotes_outside_brackets_are_ignored() {
        let s = r#"He said "look here {"a": 1}"#;
        assert_eq!(span_texts(s), [r#"{"a": 1}"#]);
    }

    #[test]
    fn unbalanced_openers_yield_no_span() {
        assert_eq!(span_texts("{\"a\": [1, 2}"), ["[1, 2}"]);
        assert!(balanced_spans("{ never closed").is_empty());
        assert!(balanced_spans(&"[".repeat(100_000)).is_empty());
    }

    #[test]
    fn truncated_outer_value_still_yields_inner_spans() {
        let s = r#"{"issues": [{"file": "a"}, {"fi"#;
        assert_eq!(span_texts(s), [r#"{"file": "a"}"#]);
    }
}
