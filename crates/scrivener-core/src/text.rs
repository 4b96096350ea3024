//! Text processing utilities.
//!
//! Word tokenization with byte offsets, context-window extraction, and the
//! punctuation stripping shared by the spelling passes.

use regex::Regex;
use std::sync::LazyLock;

/// Word-boundary tokens: letters, digits, underscore, and apostrophes.
static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w']+\b").expect("valid regex"));

/// Characters kept on each side of a flagged span.
pub const CONTEXT_RADIUS: usize = 20;

/// A word token and its byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan<'a> {
    /// The token text.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

/// Split text into word-boundary tokens, in order of appearance.
pub fn word_spans(text: &str) -> Vec<WordSpan<'_>> {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| WordSpan {
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Extract a snippet of `text` around the byte range `start..end`.
///
/// The window extends up to `radius` characters (not bytes) on each side and
/// is clamped to the text. Offsets must lie on character boundaries.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map_or(0, |(idx, _)| idx);
    let from = if radius == 0 { start } else { from };

    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(idx, _)| end + idx);

    text[from..to].to_string()
}

/// Snippet around the first occurrence of `needle` in `text`.
///
/// Falls back to the start of the text when the needle is absent.
pub fn context_around_first(text: &str, needle: &str) -> String {
    let start = text.find(needle).unwrap_or(0);
    let end = (start + needle.len()).min(text.len());
    context_window(text, start, end, CONTEXT_RADIUS)
}

/// Remove every non-word character (anything but letters, digits, `_`).
pub fn strip_non_word(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
