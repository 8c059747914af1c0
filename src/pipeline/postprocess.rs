//! Post-processing: light, deterministic cleanup of the model's answer.
//!
//! The answer is shown as-is apart from a few transport artefacts that no
//! reader wants to see:
//!
//! 1. An outer ` ```markdown … ``` ` fence around the whole reply
//! 2. Windows-style `\r\n` line endings
//! 3. Trailing whitespace on each line
//! 4. Runs of more than one blank line
//!
//! [`match_percentage`] additionally pulls the headline number out of a
//! `Match` report so front-ends can show it without parsing prose.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules in order.
pub fn clean_response(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    collapse_blank_lines(&s).trim().to_string()
}

// ── Rule 1: Strip outer markdown fence ───────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md|text)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse blank-line runs ─────────────────────────────────────────

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUNS.replace_all(input, "\n\n").into_owned()
}

// ── Match percentage ─────────────────────────────────────────────────────────

/// A percentage that follows a "match"/"score" label within the same line,
/// e.g. `**ATS Match Percentage:** 78%` or `Match score - 64.5 %`.
static RE_LABELLED_PERCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:match|score)[^\n%]{0,40}?\b(\d+(?:\.\d+)?)\s*%").unwrap()
});

/// Any percentage at all.
static RE_ANY_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\s*%").unwrap());

/// Extract the match percentage (0–100, rounded) from a `Match` report.
///
/// Prefers a percentage labelled "match" or "score"; otherwise takes the first
/// percentage in the text. Values above 100 are ignored.
pub fn match_percentage(text: &str) -> Option<u8> {
    let labelled = RE_LABELLED_PERCENT
        .captures_iter(text)
        .filter_map(|c| to_percent(&c[1]))
        .next();
    labelled.or_else(|| {
        RE_ANY_PERCENT
            .captures_iter(text)
            .filter_map(|c| to_percent(&c[1]))
            .next()
    })
}

fn to_percent(raw: &str) -> Option<u8> {
    let value: f64 = raw.parse().ok()?;
    (0.0..=100.0)
        .contains(&value)
        .then(|| value.round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_outer_markdown_fence() {
        let raw = "```markdown\n## Strengths\n- Rust\n```";
        assert_eq!(clean_response(raw), "## Strengths\n- Rust");
    }

    #[test]
    fn keeps_inner_code_blocks() {
        let raw = "Use this snippet:\n```rust\nfn main() {}\n```\nDone.";
        assert_eq!(clean_response(raw), raw);
    }

    #[test]
    fn normalises_whitespace() {
        let raw = "Line one   \r\n\r\n\r\n\r\nLine two\t\r\n";
        assert_eq!(clean_response(raw), "Line one\n\nLine two");
    }

    #[test]
    fn percentage_prefers_labelled_value() {
        let text = "Keyword coverage is 40% of listed skills.\n\n**ATS Match Percentage:** 78%\n";
        assert_eq!(match_percentage(text), Some(78));
    }

    #[test]
    fn percentage_rounds_decimals() {
        assert_eq!(match_percentage("Match score - 64.5 %"), Some(65));
    }

    #[test]
    fn percentage_falls_back_to_first_value() {
        assert_eq!(match_percentage("Overall: 55% aligned with the role."), Some(55));
    }

    #[test]
    fn percentage_absent_or_out_of_range() {
        assert_eq!(match_percentage("Strong candidate, no number given."), None);
        assert_eq!(match_percentage("Match: 250%"), None);
        assert_eq!(match_percentage("Match: 1000%"), None);
        assert_eq!(match_percentage("Fit is 1234% off the charts"), None);
    }
}
