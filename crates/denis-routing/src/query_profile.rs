//! Query Profile classification for the legacy heuristic path
//! (spec.md §4.6, SPEC_FULL.md §3.9).
//!
//! Used only when the caller supplies no [`denis_core::InferencePlan`]:
//! the router falls back to scoring providers from a lightweight
//! classification of the last user message, ported from the original's
//! `_analyze_query`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Token count beyond which a query is considered complex regardless of
/// its content (spec.md §4.6: "complex" bonus/penalty feeds the legacy
/// heuristic score).
const COMPLEX_TOKEN_THRESHOLD: usize = 80;

static CODE_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bdef\b",
        r"\bclass\b",
        r"\bimport\b",
        r"\breturn\b",
        r"\bfunction\b",
        r"\bpython\b",
        r"\bjavascript\b",
        r"\bsql\b",
        "```",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static pattern is valid regex"))
    .collect()
});

static COMPLEX_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\banaly[sz]e\b",
        r"\bcompare\b",
        r"\btrade-?off\b",
        r"\bproof\b",
        r"\bmath\b",
        r"\breason\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static pattern is valid regex"))
    .collect()
});

/// A lightweight classification of the caller's query, used to bias the
/// legacy heuristic scoring path (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryProfile {
    /// Whitespace-delimited token count, minimum 1.
    pub token_count: usize,
    /// Whether the text contains a code marker (keyword or fenced block).
    pub has_code: bool,
    /// Whether the text is long or contains an analysis/reasoning marker.
    pub is_complex: bool,
    /// `true` iff neither `has_code` nor `is_complex`.
    pub is_general: bool,
}

/// Classify `text` (the last user message) into a [`QueryProfile`].
#[must_use]
pub fn classify_query(text: &str) -> QueryProfile {
    let lowered = text.to_lowercase();
    let token_count = text.split_whitespace().count().max(1);

    let has_code = CODE_MARKERS.iter().any(|pattern| pattern.is_match(&lowered));
    let is_complex = token_count > COMPLEX_TOKEN_THRESHOLD
        || COMPLEX_MARKERS.iter().any(|pattern| pattern.is_match(&lowered));
    let is_general = !has_code && !is_complex;

    QueryProfile {
        token_count,
        has_code,
        is_complex,
        is_general,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_greeting_is_general() {
        let profile = classify_query("hey, how's it going today?");
        assert!(profile.is_general);
        assert!(!profile.has_code);
        assert!(!profile.is_complex);
    }

    #[test]
    fn code_fence_is_flagged() {
        let profile = classify_query("can you fix this:\n```\ndef foo(): return 1\n```");
        assert!(profile.has_code);
        assert!(!profile.is_general);
    }

    #[test]
    fn long_text_is_complex() {
        let text = "word ".repeat(COMPLEX_TOKEN_THRESHOLD + 1);
        let profile = classify_query(&text);
        assert!(profile.is_complex);
    }

    #[test]
    fn reasoning_marker_is_complex() {
        let profile = classify_query("please analyze the trade-offs here");
        assert!(profile.is_complex);
    }
}
