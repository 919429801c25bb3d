use toon_salvage::normalize;

#[test]
fn labeled_fence_with_surrounding_prose() {
    let raw = "Here is my analysis:\n\n```toon\nverdict: ok\nissues[0]:\n```\n\nThanks!";
    assert_eq!(normalize(raw), "verdict: ok\nissues[0]:");
}

#[test]
fn labeled_fence_is_case_insensitive() {
    assert_eq!(normalize("```TOON\nverdict: ok\n```"), "verdict: ok");
}

#[test]
fn labeled_fence_wins_over_earlier_headers() {
    let raw = "draft{a}:\n  a: 1\n```toon\nfinal{b}:\n  b: 2\n```";
    assert_eq!(normalize(raw), "final{b}:\n  b: 2");
}

#[test]
fn unclosed_labeled_fence_runs_to_end() {
    assert_eq!(normalize("Result:\n```toon\nverdict: ok\n"), "verdict: ok");
}

#[test]
fn unlabeled_fence_starting_with_header() {
    let raw = "Output:\n```\nissues[1]:\nissues[0]{file}:\n  file: a\n```\nDone.";
    assert_eq!(normalize(raw), "issues[1]:\nissues[0]{file}:\n  file: a");
}

#[test]
fn unlabeled_fence_without_header_is_skipped() {
    let raw = "Run this:\n```\nnpm test\n```\nsummary{total}:\n  total: 0";
    assert_eq!(normalize(raw), "summary{total}:\n  total: 0");
}

#[test]
fn header_anchor_drops_leading_prose() {
    let raw = "The review is complete.\nPlease see below.\nsummary{total}:\n  total: 1\nverdict: ok";
    assert_eq!(normalize(raw), "summary{total}:\n  total: 1\nverdict: ok");
}

#[test]
fn header_anchor_stops_at_fence() {
    let raw = "Analysis follows.\nsummary{total}:\n  total: 1\n```\nTrailing notes";
    assert_eq!(normalize(raw), "summary{total}:\n  total: 1");
}

#[test]
fn childless_bare_header_is_passed_over() {
    let raw = "Note:\nthis is prose\nsummary{a}:\n  a: 1";
    assert_eq!(normalize(raw), "summary{a}:\n  a: 1");
}

#[test]
fn bare_header_used_when_no_structured_one() {
    let raw = "Sure, here it is.\nverdict:\n  ok: true";
    assert_eq!(normalize(raw), "verdict:\n  ok: true");
}

#[test]
fn bare_header_with_block_before_structured_header_is_kept() {
    let raw = "Review done.\nsummary:\n  total_issues: 1\nissues[1]:\nissues[0]{file}:\n  file: a.ts";
    assert_eq!(
        normalize(raw),
        "summary:\n  total_issues: 1\nissues[1]:\nissues[0]{file}:\n  file: a.ts"
    );
}

#[test]
fn prose_label_then_bare_header_with_block() {
    let raw = "Findings:\n\nsummary:\n  total_issues: 0\nverdict: approve";
    assert_eq!(
        normalize(raw),
        "summary:\n  total_issues: 0\nverdict: approve"
    );
}

#[test]
fn no_header_returns_trimmed_input() {
    assert_eq!(normalize("  just some text \n"), "just some text");
    assert_eq!(normalize(""), "");
}

#[test]
fn stray_fence_lines_are_stripped() {
    assert_eq!(normalize("```\nverdict: ok\n```"), "verdict: ok");
    assert_eq!(normalize("```yaml\nverdict: ok\n"), "verdict: ok");
}

#[test]
fn crlf_line_endings() {
    assert_eq!(
        normalize("Intro\r\n```toon\r\nverdict: ok\r\n```\r\n"),
        "verdict: ok"
    );
}

#[test]
fn output_is_a_slice_of_input() {
    let raw = String::from("prose\n```toon\nverdict: ok\n```");
    let out = normalize(&raw);
    let start = out.as_ptr() as usize - raw.as_ptr() as usize;
    assert_eq!(&raw[start..start + out.len()], out);
}
