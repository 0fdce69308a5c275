//! Sentence splitting with Unicode boundaries and a regex fallback.

use std::sync::LazyLock;

use regex::Regex;

/// One or more non-terminators followed by terminators and an optional closing
/// quote, or a trailing run with no terminator at all.
static SENTENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[^.!?]+[.!?]+["']?|[^.!?]+$"#).expect("sentence pattern is valid"));

/// Collapse every whitespace run to a single space and trim the ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into trimmed, non-empty sentences in reading order.
///
/// Uses UAX #29 sentence boundaries, which keep abbreviations such as "e.g."
/// and decimals such as "3.14" inside their sentence.
#[cfg(feature = "unicode-sentences")]
pub fn segment(text: &str) -> Vec<String> {
    use unicode_segmentation::UnicodeSegmentation;

    let text = normalize_whitespace(text);
    text.split_sentence_bounds().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Split text into trimmed, non-empty sentences in reading order.
#[cfg(not(feature = "unicode-sentences"))]
pub fn segment(text: &str) -> Vec<String> {
    segment_with_pattern(text)
}

/// Regex-based splitter used when Unicode segmentation is compiled out.
///
/// Text made only of terminators (e.g. "...") matches nothing and is kept whole.
#[cfg_attr(all(feature = "unicode-sentences", not(test)), allow(dead_code))]
pub fn segment_with_pattern(text: &str) -> Vec<String> {
    let text = normalize_whitespace(text);
    let sentences: Vec<String> =
        SENTENCE_PATTERN.find_iter(&text).map(|m| m.as_str().trim()).filter(|s| !s.is_empty()).map(str::to_string).collect();
    if sentences.is_empty() && !text.is_empty() {
        return vec![text];
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_whitespace_before_splitting() {
        let sentences = segment("  First   sentence.\n\nSecond\tone!  ");
        assert_eq!(sentences, vec!["First sentence.", "Second one!"]);
    }

    #[test]
    fn test_no_terminator_yields_whole_text() {
        let input = "  a heading without   any\nterminal punctuation ";
        assert_eq!(segment(input), vec!["a heading without any terminal punctuation"]);
        assert_eq!(segment_with_pattern(input), vec!["a heading without any terminal punctuation"]);
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        assert!(segment("").is_empty());
        assert!(segment(" \n\t ").is_empty());
        assert!(segment_with_pattern("   ").is_empty());
    }

    #[test]
    fn test_every_sentence_non_empty() {
        let input = "Results. ! ? Discussion follows? Yes! And a tail";
        for sentences in [segment(input), segment_with_pattern(input)] {
            assert!(!sentences.is_empty());
            assert!(sentences.iter().all(|s| !s.trim().is_empty() && s.trim() == s));
        }
    }

    #[test]
    fn test_terminators_only_yield_one_sentence() {
        for input in ["...", "?!", "  . ! ?  "] {
            assert!(!segment(input).is_empty(), "segment({input:?})");
            assert_eq!(segment_with_pattern(input), vec![input.split_whitespace().collect::<Vec<_>>().join(" ")]);
        }
    }

    #[test]
    fn test_pattern_keeps_closing_quote_and_tail() {
        let sentences = segment_with_pattern(r#"He said "stop." Then he left! What now"#);
        assert_eq!(sentences, vec![r#"He said "stop.""#, "Then he left!", "What now"]);
    }

    #[test]
    fn test_pattern_groups_repeated_terminators() {
        assert_eq!(segment_with_pattern("Really?! Yes..."), vec!["Really?!", "Yes..."]);
    }

    #[test]
    fn test_order_is_preserved() {
        let sentences = segment("One. Two. Three.");
        assert_eq!(sentences, vec!["One.", "Two.", "Three."]);
    }

    #[cfg(feature = "unicode-sentences")]
    #[test]
    fn test_unicode_boundaries_respect_decimals_and_abbreviations() {
        let sentences = segment("Pi is roughly 3.14 in practice. It works, e.g. in tests. Done.");
        assert_eq!(sentences, vec!["Pi is roughly 3.14 in practice.", "It works, e.g. in tests.", "Done."]);
    }
}
