//! Sentence segmentation for breakpoint detection.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into whitespace-normalized sentences.
///
/// Uses Unicode sentence boundaries, so abbreviations and non-Latin
/// punctuation behave better than a naive split on `.`.
#[must_use]
pub fn segment(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(normalize_whitespace)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Whitespace-approximated token count, used for chunk telemetry and caps.
#[must_use]
pub fn approx_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
