//! Resource limits for the lenient decoder.

use serde::{Deserialize, Serialize};

/// Limits applied while decoding untrusted LLM output.
///
/// None of the limits change how well-formed documents decode. They only bound
/// the work done on pathological input such as `key[4000000000]:`, thousands of
/// nested headers, or many short array declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum number of nested object/array scopes. A header found deeper than
    /// this is not descended into; its indented block is consumed and dropped.
    pub max_depth: usize,
    /// Upper bound applied to a declared `[count]` before padding.
    pub max_array_len: usize,
    /// Upper bound on array elements across the whole document, padding
    /// included. Arrays declared after the budget runs out decode as `[]`.
    pub max_total_items: usize,
}

impl ParserConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_MAX_ARRAY_LEN: usize = 10_000;
    pub const DEFAULT_MAX_TOTAL_ITEMS: usize = 100_000;
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_array_len: Self::DEFAULT_MAX_ARRAY_LEN,
            max_total_items: Self::DEFAULT_MAX_TOTAL_ITEMS,
        }
    }
}
