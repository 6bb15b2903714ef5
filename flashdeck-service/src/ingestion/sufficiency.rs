//! Decides whether a page's text layer is good enough to use directly.

/// Number of non-whitespace characters in `text`.
pub fn meaningful_char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Whether extracted page text is usable without the vision fallback.
///
/// Scanned pages tend to yield an empty or whitespace-only text layer, and
/// equations or tables come out as fragments, so characters are counted
/// rather than words.
pub fn is_text_sufficient(text: &str, min_chars: usize) -> bool {
    !text.is_empty() && meaningful_char_count(text) >= min_chars
}
