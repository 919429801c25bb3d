//! Integration tests for the `toon-salvage` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the extract, parse,
//! encode and stats subcommands through the actual binary, including stdin/stdout
//! piping, file I/O, fallback to JSON, and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture must exist")
}

fn toon_salvage() -> Command {
    let mut cmd = Command::cargo_bin("toon-salvage").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("TOON_SALVAGE_MAX_DEPTH")
        .env_remove("TOON_SALVAGE_MAX_ARRAY_LEN")
        .env_remove("TOON_SALVAGE_MAX_TOTAL_ITEMS");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout must be JSON")
}

fn review_value() -> Value {
    json!({
        "summary": {"total_issues": 2, "verdict": "request_changes"},
        "issues": [
            {
                "type": "dependency_injection",
                "severity": "high",
                "file": "src/infrastructure/cache/CacheService.ts",
                "line": 42,
                "title": "Cache runtime constructed inline"
            },
            {
                "type": "single_responsibility",
                "severity": "medium",
                "file": "src/infrastructure/retry/RetryService.ts",
                "line": 118,
                "title": "Retry service also formats log output"
            }
        ]
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Extract subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn extract_toon_from_stdin() {
    let output = toon_salvage()
        .arg("extract")
        .write_stdin(fixture("review_toon.md"))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), review_value());
}

#[test]
fn extract_from_file_to_file() {
    let out_path = std::env::temp_dir().join("toon-salvage-test-extract.json");
    let _ = std::fs::remove_file(&out_path);

    toon_salvage()
        .args(["extract", "-i", &fixture_path("review_toon.md"), "-o"])
        .arg(&out_path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&out_path).expect("output file must exist");
    let value: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value, review_value());

    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn extract_falls_back_to_embedded_json() {
    let output = toon_salvage()
        .args(["extract", "-i", &fixture_path("review_json.md")])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({
            "summary": {"total_issues": 1, "verdict": "approve"},
            "issues": [{
                "type": "naming",
                "severity": "low",
                "file": "src/a.ts",
                "line": 3,
                "title": "Rename {tmp} variable"
            }]
        })
    );
}

#[test]
fn extract_verbose_logs_winning_strategy() {
    toon_salvage()
        .args(["extract", "--verbose", "-i", &fixture_path("review_json.md")])
        .assert()
        .success()
        .stderr(predicate::str::contains("embedded-json"));
}

#[test]
fn extract_nothing_structured_fails() {
    toon_salvage()
        .arg("extract")
        .write_stdin("I'm sorry, I could not review these files.")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no structured data found"));
}

#[test]
fn extract_empty_input_fails() {
    toon_salvage()
        .arg("extract")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input is empty"));
}

#[test]
fn extract_missing_file_fails() {
    toon_salvage()
        .args(["extract", "-i", "/nonexistent/toon-salvage-input.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Parse subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn parse_tabular_file() {
    let output = toon_salvage()
        .args(["parse", "-i", &fixture_path("tabular.toon")])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({
            "issues": [
                {"file": "src/a.ts", "line": 10, "severity": "high"},
                {"file": "src/b.ts", "line": 22, "severity": "low"},
                {"file": "src/c, d.ts", "line": 7, "severity": "medium"}
            ],
            "verdict": "request_changes"
        })
    );
}

#[test]
fn parse_does_not_fall_back_to_json() {
    toon_salvage()
        .args(["parse", "-i", &fixture_path("review_json.md")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entries found"));
}

#[test]
fn max_array_len_flag_clamps_declared_count() {
    let output = toon_salvage()
        .args(["parse", "--max-array-len", "1"])
        .write_stdin("issues[3]:\nissues[0]{file}:\n  file: a\nissues[1]{file}:\n  file: b")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!({"issues": [{"file": "a"}]}));
}

#[test]
fn max_depth_env_var_is_honoured() {
    let output = toon_salvage()
        .arg("parse")
        .env("TOON_SALVAGE_MAX_DEPTH", "0")
        .write_stdin("summary{total}:\n  total: 1\nverdict: ok")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({"summary": null, "verdict": "ok"})
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Encode subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn encode_json_from_stdin() {
    toon_salvage()
        .arg("encode")
        .write_stdin(r#"{"verdict":"ok","issues":[{"file":"a.ts","line":1},{"file":"b.ts","line":2}]}"#)
        .assert()
        .success()
        .stdout("verdict: ok\nissues[2]{file,line}:\n  a.ts,1\n  b.ts,2\n");
}

#[test]
fn encode_then_parse_roundtrips() {
    let value = review_value();
    let encoded = toon_salvage()
        .arg("encode")
        .write_stdin(value.to_string())
        .output()
        .unwrap();
    assert!(encoded.status.success());

    let decoded = toon_salvage()
        .arg("parse")
        .write_stdin(encoded.stdout)
        .output()
        .unwrap();
    assert!(decoded.status.success());
    assert_eq!(stdout_json(&decoded), value);
}

#[test]
fn encode_invalid_json_fails() {
    toon_salvage()
        .arg("encode")
        .write_stdin("issues[1]:")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to encode JSON"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Stats subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn stats_text_output() {
    toon_salvage()
        .args(["stats", "-i", &fixture_path("tabular.toon")])
        .assert()
        .success()
        .stdout(predicate::str::contains("JSON size:"))
        .stdout(predicate::str::contains("TOON size:"))
        .stdout(predicate::str::contains("Tokens saved:"));
}

#[test]
fn stats_json_output() {
    let output = toon_salvage()
        .args(["stats", "--json"])
        .write_stdin(fixture("tabular.toon"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stats = stdout_json(&output);
    let toon_size = stats["toon_size"].as_u64().unwrap();
    let json_size = stats["json_size"].as_u64().unwrap();
    assert!(toon_size > 0);
    assert!(
        json_size > toon_size,
        "tabular TOON should be smaller than JSON"
    );
    assert!(stats["tokens_saved"].as_i64().unwrap() > 0);
}

#[test]
fn stats_accepts_json_input() {
    let json_input = r#"{"issues":[{"file":"src/a.ts","line":10,"severity":"high"},{"file":"src/b.ts","line":22,"severity":"low"},{"file":"src/c, d.ts","line":7,"severity":"medium"}],"verdict":"request_changes"}"#;
    let from_json = toon_salvage()
        .args(["stats", "--json"])
        .write_stdin(json_input)
        .output()
        .unwrap();
    assert!(from_json.status.success());

    let from_toon = toon_salvage()
        .args(["stats", "--json", "-i", &fixture_path("tabular.toon")])
        .output()
        .unwrap();
    assert!(from_toon.status.success());

    let stats = stdout_json(&from_json);
    assert_eq!(stats["json_size"], json!(json_input.len()));
    assert_eq!(stats, stdout_json(&from_toon));
}

#[test]
fn stats_rejects_prose() {
    toon_salvage()
        .arg("stats")
        .write_stdin("Nothing to see here.")
        .assert()
        .failure()
        .stderr(predicate::str::contains("neither JSON nor TOON"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Usage
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    toon_salvage()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("encode"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn missing_subcommand_fails() {
    toon_salvage().assert().failure();
}

#[test]
fn unknown_subcommand_fails() {
    toon_salvage().arg("compress").assert().failure();
}
