//! # toon-salvage
//!
//! Lenient decoder for **TOON (Token-Oriented Object Notation)** as it appears in
//! LLM output, plus a fallback chain that recovers JSON when the model ignored
//! the requested format.
//!
//! Models asked for TOON rarely produce it cleanly: answers arrive wrapped in
//! prose and Markdown fences, array items are numbered as separate headers, and
//! entries go missing. This crate decodes what it can and degrades instead of
//! failing.
//!
//! ## Quick start
//!
//! ```rust
//! use serde_json::json;
//! use toon_salvage::{decode, encode, extract};
//!
//! let output = "Here is the review:\n\
//!               ```toon\n\
//!               summary{total_issues}:\n  total_issues: 1\n\
//!               issues[1]:\n\
//!               issues[0]{file,line}:\n  file: src/a.ts\n  line: 10\n\
//!               ```";
//!
//! let value = decode(output).unwrap();
//! assert_eq!(
//!     value,
//!     json!({
//!         "summary": {"total_issues": 1},
//!         "issues": [{"file": "src/a.ts", "line": 10}]
//!     })
//! );
//!
//! // When the model answered in JSON instead, the fallback chain still works.
//! let found = extract("The model said {\"issues\": []} instead").unwrap();
//! assert_eq!(found.strategy, "embedded-json");
//!
//! // Going the other way, encode JSON in the layout the decoder reads.
//! let toon = encode(&value);
//! assert_eq!(decode(&toon), Some(value));
//! ```
//!
//! ## Modules
//!
//! - [`normalize`]: raw model output → candidate TOON text
//! - [`decoder`]: candidate TOON text → `serde_json::Value`
//! - [`encoder`]: `serde_json::Value` → TOON text
//! - [`scalar`]: typing of individual values
//! - [`types`]: line classification
//! - [`extract`]: fallback chain (`Extractor`, `Strategy`)
//! - [`stats`]: JSON vs TOON size and token estimates
//! - [`config`]: resource limits
//! - [`error`]: error types for the fallback chain

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod scalar;
pub mod stats;
pub mod types;

pub use config::ParserConfig;
pub use decoder::{decode, parse_document, Decoder};
pub use encoder::{encode, encode_json};
pub use error::ToonError;
pub use extract::{extract, Extraction, Extractor, Strategy};
pub use normalize::normalize;
pub use scalar::parse_scalar;
pub use stats::{compare, compare_formats, estimate_tokens, FormatComparison};
pub use types::{Document, INDENT_STEP};
