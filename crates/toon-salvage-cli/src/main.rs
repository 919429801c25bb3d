//! `toon-salvage` CLI: recover JSON from TOON-formatted model output.
//!
//! ## Usage
//!
//! ```sh
//! # Raw model output → JSON, falling back to JSON extraction if needed
//! toon-salvage extract -i analysis-output.txt -o analysis-output.json
//!
//! # Lenient TOON decoding only (fails if no TOON entries are found)
//! cat analysis-output.toon | toon-salvage parse
//!
//! # JSON → TOON in the layout `parse` reads back
//! toon-salvage encode -i analysis-output.json -o analysis-output.toon
//!
//! # Size and token savings of TOON over JSON (JSON or TOON input)
//! toon-salvage stats -i analysis-output.json --json
//! ```
//!
//! Diagnostics go to stderr; set `RUST_LOG` or pass `--verbose` to see which
//! strategy produced the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use toon_salvage::{compare, encode_json, Decoder, Extractor, ParserConfig};

#[derive(Parser)]
#[command(
    name = "toon-salvage",
    version,
    about = "Recover JSON from TOON (Token-Oriented Object Notation) model output"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    limits: Limits,

    /// Log every strategy attempt to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct Limits {
    /// Maximum nesting depth before a block is dropped
    #[arg(
        long,
        global = true,
        env = "TOON_SALVAGE_MAX_DEPTH",
        default_value_t = ParserConfig::DEFAULT_MAX_DEPTH
    )]
    max_depth: usize,

    /// Maximum array length honoured from a `[count]` declaration
    #[arg(
        long,
        global = true,
        env = "TOON_SALVAGE_MAX_ARRAY_LEN",
        default_value_t = ParserConfig::DEFAULT_MAX_ARRAY_LEN
    )]
    max_array_len: usize,

    /// Maximum array elements across a whole document
    #[arg(
        long,
        global = true,
        env = "TOON_SALVAGE_MAX_TOTAL_ITEMS",
        default_value_t = ParserConfig::DEFAULT_MAX_TOTAL_ITEMS
    )]
    max_total_items: usize,
}

impl From<&Limits> for ParserConfig {
    fn from(limits: &Limits) -> Self {
        ParserConfig {
            max_depth: limits.max_depth,
            max_array_len: limits.max_array_len,
            max_total_items: limits.max_total_items,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract JSON from raw model output (TOON, then JSON fallbacks)
    Extract {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Decode TOON leniently, without JSON fallbacks
    Parse {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Encode JSON as TOON
    Encode {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show size and token estimates for TOON versus JSON
    Stats {
        /// Input JSON or TOON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = ParserConfig::from(&cli.limits);

    match cli.command {
        Commands::Extract { input, output } => {
            let raw = read_input(input.as_deref())?;
            let found = Extractor::new(config)
                .extract(&raw)
                .context("Failed to extract structured data")?;
            tracing::info!(strategy = found.strategy, "structured data extracted");
            write_output(output.as_deref(), &to_pretty(&found.value)?)?;
        }
        Commands::Parse { input, output } => {
            let raw = read_input(input.as_deref())?;
            let value = Decoder::new(config)
                .decode(&raw)
                .context("Failed to decode TOON: no entries found")?;
            write_output(output.as_deref(), &to_pretty(&value)?)?;
        }
        Commands::Encode { input, output } => {
            let raw = read_input(input.as_deref())?;
            let mut toon = encode_json(&raw).context("Failed to encode JSON")?;
            toon.push('\n');
            write_output(output.as_deref(), &toon)?;
        }
        Commands::Stats { input, json } => {
            let raw = read_input(input.as_deref())?;
            let value = match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => value,
                Err(_) => Decoder::new(config)
                    .decode(&raw)
                    .context("Failed to read input: neither JSON nor TOON")?,
            };
            let stats = compare(&value);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("JSON size:    {} chars", stats.json_size);
                println!("TOON size:    {} chars", stats.toon_size);
                println!("JSON tokens:  ~{}", stats.json_tokens_est);
                println!("TOON tokens:  ~{}", stats.toon_tokens_est);
                println!(
                    "Tokens saved: {} ({}%)",
                    stats.tokens_saved, stats.reduction_percent
                );
            }
        }
    }

    Ok(())
}

fn to_pretty(value: &serde_json::Value) -> Result<String> {
    let mut pretty = serde_json::to_string_pretty(value)?;
    pretty.push('\n');
    Ok(pretty)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
