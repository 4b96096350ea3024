//! Heuristic language detection.
//!
//! Detection runs in two steps. Distinctive diacritics are checked first and
//! short-circuit everything else; failing that, whitespace tokens are scored
//! against a closed set of common function words per language.
//!
//! Low-signal text that is long enough to be scored but does not produce a
//! clear winner falls back to [`DEFAULT_LANGUAGE`] rather than `None`. Only
//! very short input is reported as unknown.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum character count before detection is attempted.
const MIN_DETECT_CHARS: usize = 5;

/// Minimum whitespace token count for a word-score verdict.
const MIN_SCORED_TOKENS: usize = 5;

/// Minimum winning score for a word-score verdict.
const MIN_WINNING_SCORE: usize = 2;

/// Language used when nothing better is known.
pub const DEFAULT_LANGUAGE: Language = Language::English;

/// Languages the detector can recognize.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Language {
    /// English (`en`).
    #[serde(rename = "en")]
    English,
    /// Spanish (`es`).
    #[serde(rename = "es")]
    Spanish,
    /// French (`fr`).
    #[serde(rename = "fr")]
    French,
    /// German (`de`).
    #[serde(rename = "de")]
    German,
}

impl Language {
    /// All languages in detection order. Score ties go to the earlier entry.
    pub const ALL: [Self; 4] = [Self::English, Self::Spanish, Self::French, Self::German];

    /// Returns the ISO 639-1 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::German => "de",
        }
    }

    /// Returns the English display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::German => "German",
        }
    }

    /// Whether a spelling dictionary ships for this language.
    pub const fn has_dictionary(&self) -> bool {
        matches!(self, Self::English | Self::Spanish)
    }

    /// Parse a bare base code (`"en"`, `"ES"`). Region subtags are not accepted here.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Some(Self::English),
            "es" => Some(Self::Spanish),
            "fr" => Some(Self::French),
            "de" => Some(Self::German),
            _ => None,
        }
    }

    fn function_words(&self) -> &'static HashSet<&'static str> {
        match self {
            Self::English => &ENGLISH_WORDS,
            Self::Spanish => &SPANISH_WORDS,
            Self::French => &FRENCH_WORDS,
            Self::German => &GERMAN_WORDS,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// -- Character patterns ----------------------------------------------------

/// Diacritic classes checked in order; the first match wins.
static CHARACTER_PATTERNS: LazyLock<Vec<(Language, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Language::Spanish,
            Regex::new(r"[ñáíóú¿¡]").expect("valid regex"),
        ),
        (
            Language::French,
            Regex::new(r"[àâçéèêëîïôùûÿœ]").expect("valid regex"),
        ),
        (Language::German, Regex::new(r"[äöüß]").expect("valid regex")),
    ]
});

// -- Function words --------------------------------------------------------

static ENGLISH_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "it", "for", "not", "on",
        "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
        "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
        "what", "so",
    ]
    .into_iter()
    .collect()
});

static SPANISH_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "el", "la", "de", "que", "y", "a", "en", "un", "ser", "se", "no", "haber", "por", "con",
        "su", "para", "como", "estar", "tener", "le", "lo", "todo", "pero", "más", "hacer", "o",
        "poder", "decir", "este", "ir", "otro", "ese", "si", "me", "ya", "ver", "porque", "dar",
        "cuando", "muy",
    ]
    .into_iter()
    .collect()
});

static FRENCH_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "le", "la", "de", "et", "à", "en", "un", "être", "avoir", "que", "pour", "dans", "ce",
        "il", "qui", "ne", "sur", "se", "pas", "plus", "par", "je", "avec", "tout", "faire",
        "son", "mettre", "autre", "on", "mais", "nous", "comme", "ou", "si", "leur", "y", "dire",
        "elle", "devoir", "avant",
    ]
    .into_iter()
    .collect()
});

static GERMAN_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "der", "die", "und", "in", "den", "von", "zu", "das", "mit", "sich", "des", "auf", "für",
        "ist", "im", "dem", "nicht", "ein", "eine", "als", "auch", "es", "an", "werden", "aus",
        "er", "hat", "dass", "sie", "nach", "bei", "um", "am", "sind", "noch", "wie", "einem",
        "über", "einen", "wenn",
    ]
    .into_iter()
    .collect()
});

/// Detect the language of `text`.
///
/// Returns `None` only for input shorter than five characters. Longer input
/// without a confident verdict resolves to [`DEFAULT_LANGUAGE`].
#[tracing::instrument(skip_all, fields(text_len = text.len()))]
pub fn detect(text: &str) -> Option<Language> {
    if text.chars().count() < MIN_DETECT_CHARS {
        return None;
    }

    let normalized = text.to_lowercase();

    if let Some((language, _)) = CHARACTER_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&normalized))
    {
        tracing::debug!(language = %language, "detected by character pattern");
        return Some(*language);
    }

    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    let mut scores = [0usize; Language::ALL.len()];

    for token in &tokens {
        let word: String = token.chars().filter(|c| c.is_alphabetic()).collect();
        if word.chars().count() < 2 {
            continue;
        }
        for (idx, language) in Language::ALL.iter().enumerate() {
            if language.function_words().contains(word.as_str()) {
                scores[idx] += 1;
            }
        }
    }

    // Strictly-greater comparison keeps the earliest language on ties.
    let (best_idx, best_score) = scores
        .iter()
        .enumerate()
        .fold((0, 0), |best, (idx, &score)| {
            if score > best.1 { (idx, score) } else { best }
        });

    if tokens.len() >= MIN_SCORED_TOKENS && best_score >= MIN_WINNING_SCORE {
        let language = Language::ALL[best_idx];
        tracing::debug!(language = %language, score = best_score, "detected by word score");
        return Some(language);
    }

    Some(DEFAULT_LANGUAGE)
}

/// Map any language code to a language with a shipped dictionary.
///
/// Region-qualified codes reduce to their base subtag (`en-US` → `en`,
/// `es_MX` → `es`). Codes without a dictionary, `auto`, and unrecognized
/// input all map to [`DEFAULT_LANGUAGE`].
pub fn map_to_supported(code: &str) -> Language {
    let base = code
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default();

    Language::from_code(base)
        .filter(Language::has_dictionary)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Map a detected language (or unknown) to a language with a dictionary.
pub fn map_detected(detected: Option<Language>) -> Language {
    detected
        .filter(Language::has_dictionary)
        .unwrap_or(DEFAULT_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unknown() {
        assert_eq!(detect("hola"), None);
        assert_eq!(detect(""), None);
    }

    #[test]
    fn spanish_diacritics_short_circuit() {
        assert_eq!(detect("the niño is here"), Some(Language::Spanish));
    }

    #[test]
    fn french_diacritics_detected() {
        assert_eq!(detect("voilà the thing"), Some(Language::French));
    }

    #[test]
    fn shared_accents_are_not_spanish_markers() {
        // Only letters unique to Spanish select it.
        assert_eq!(detect("un café con leche"), Some(Language::French));
        assert_eq!(detect("el café está listo"), Some(Language::Spanish));
        assert_eq!(detect("über alles hier"), Some(Language::German));
    }

    #[test]
    fn german_diacritics_detected() {
        assert_eq!(detect("der Straße entlang"), Some(Language::German));
    }

    #[test]
    fn scores_spanish_function_words() {
        let text = "el perro de mi casa come con la familia y no para de jugar";
        assert_eq!(detect(text), Some(Language::Spanish));
    }

    #[test]
    fn scores_english_function_words() {
        let text = "the cat and the dog went to the park with their owner";
        assert_eq!(detect(text), Some(Language::English));
    }

    #[test]
    fn low_signal_defaults_to_english() {
        // Long enough to score but no function words at all.
        assert_eq!(detect("zebra quantum galaxy pixel"), Some(Language::English));
        assert_eq!(
            detect("perro gato casa árbol"),
            Some(Language::Spanish),
            "diacritics still win over the default"
        );
    }

    #[test]
    fn fewer_than_five_tokens_defaults_to_english() {
        assert_eq!(detect("el la de que"), Some(Language::English));
    }

    #[test]
    fn ties_break_toward_enumeration_order() {
        // "en" and "la" are both Spanish and French; "de" too. Spanish is listed first.
        let text = "la de en la de en xx yy";
        assert_eq!(detect(text), Some(Language::Spanish));
    }

    #[test]
    fn maps_region_codes_to_base() {
        assert_eq!(map_to_supported("en-US"), Language::English);
        assert_eq!(map_to_supported("es-MX"), Language::Spanish);
        assert_eq!(map_to_supported("es_AR"), Language::Spanish);
        assert_eq!(map_to_supported("ES"), Language::Spanish);
    }

    #[test]
    fn maps_unsupported_to_default() {
        assert_eq!(map_to_supported("fr"), Language::English);
        assert_eq!(map_to_supported("de-DE"), Language::English);
        assert_eq!(map_to_supported("auto"), Language::English);
        assert_eq!(map_to_supported(""), Language::English);
        assert_eq!(map_detected(None), Language::English);
        assert_eq!(map_detected(Some(Language::Spanish)), Language::Spanish);
    }

    #[test]
    fn language_serializes_as_code() {
        let json = serde_json::to_string(&Language::Spanish).unwrap();
        assert_eq!(json, "\"es\"");
        let back: Language = serde_json::from_str("\"de\"").unwrap();
        assert_eq!(back, Language::German);
    }
}
