//! The local spelling pass that accompanies online analysis.
//!
//! Deliberately lenient: a word is only flagged when it appears in a short
//! list of known misspellings. Everything else is assumed correct and left to
//! the remote model.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::correction::Correction;
use crate::text::strip_non_word;

/// Tokens on each side of a flagged word included in its context.
const CONTEXT_TOKENS: usize = 5;

static COMMON_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
        "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
        "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
        "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me",
    ]
    .into_iter()
    .collect()
});

static MISSPELLINGS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "teh",
        "taht",
        "recieve",
        "thier",
        "accomodate",
        "seperete",
        "definately",
        "occured",
        "untill",
        "wierd",
        "wich",
        "ther",
    ]
    .into_iter()
    .collect()
});

static SUGGESTIONS: LazyLock<HashMap<&'static str, [&'static str; 3]>> = LazyLock::new(|| {
    HashMap::from([
        ("teh", ["the", "then", "ten"]),
        ("taht", ["that", "tag", "taut"]),
        ("recieve", ["receive", "relieve", "reprieve"]),
    ])
});

/// Whether `word` passes the quick check. Biased toward false negatives.
pub fn is_correct(word: &str) -> bool {
    if word.is_empty() {
        return true;
    }
    let lower = word.to_lowercase();
    COMMON_WORDS.contains(lower.as_str()) || !MISSPELLINGS.contains(lower.as_str())
}

/// Fixed suggestions for a flagged word.
///
/// Words without a table entry get placeholder candidates.
pub fn suggestions(word: &str) -> Vec<String> {
    SUGGESTIONS.get(word.to_lowercase().as_str()).map_or_else(
        || vec!["example".to_string(), "suggestion".to_string(), format!("{word}s")],
        |known| known.iter().map(|s| (*s).to_string()).collect(),
    )
}

/// Flag known misspellings in `text`.
///
/// Tokens are split on whitespace and stripped of non-word characters; tokens
/// shorter than two characters are skipped. Each correction's context is the
/// original tokens up to five either side of the flagged one.
pub fn quick_spell_check(text: &str) -> Vec<Correction> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    tokens
        .iter()
        .enumerate()
        .filter_map(|(idx, token)| {
            let word = strip_non_word(token);
            if word.chars().count() < 2 || is_correct(&word) {
                return None;
            }
            let from = idx.saturating_sub(CONTEXT_TOKENS);
            let to = (idx + CONTEXT_TOKENS + 1).min(tokens.len());
            let context = tokens[from..to].join(" ");
            let suggestions = suggestions(&word);
            Some(Correction::spelling(word, suggestions, context))
        })
        .collect()
}
