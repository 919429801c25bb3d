//! Error types for the extraction fallback chain.
//!
//! The lenient parser itself never fails: "nothing found" is `None`. Errors only
//! surface from [`crate::extract`], where each strategy may decline its input.

use thiserror::Error;

/// Errors that can occur while extracting structured data from raw text.
#[derive(Error, Debug)]
pub enum ToonError {
    /// The raw text was empty or contained only whitespace.
    #[error("input is empty")]
    EmptyInput,

    /// A single strategy declined the input. The chain records this and moves on.
    #[error("{strategy}: {reason}")]
    Rejected {
        strategy: &'static str,
        reason: String,
    },

    /// Every strategy in the chain declined the input.
    #[error("no structured data found ({})", format_attempts(.attempts))]
    NoStructure { attempts: Vec<(&'static str, String)> },

    /// A JSON candidate failed to deserialize.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

fn format_attempts(attempts: &[(&'static str, String)]) -> String {
    attempts
        .iter()
        .map(|(strategy, reason)| format!("{strategy}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias used throughout toon-salvage.
pub type Result<T> = std::result::Result<T, ToonError>;
