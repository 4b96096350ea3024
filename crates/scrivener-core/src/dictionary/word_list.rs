//! Frequency-ordered word lists and suggestion ranking.

use std::collections::HashMap;
use std::sync::LazyLock;

use strsim::osa_distance;

use crate::language::Language;

/// Maximum number of suggestions returned for one word.
pub const MAX_SUGGESTIONS: usize = 5;

/// Maximum edit distance for a dictionary word to count as a suggestion.
const MAX_EDIT_DISTANCE: usize = 2;

/// Regular English inflections accepted on a known stem.
const ENGLISH_INFLECTIONS: &[&str] = &["s", "es", "ed", "ing", "ly"];

/// Spanish plural endings accepted on a known stem.
const SPANISH_INFLECTIONS: &[&str] = &["s", "es"];

/// Misspellings whose intended spelling is known in advance.
static KNOWN_MISSPELLINGS: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        HashMap::from([
            ("teh", &["the", "then", "ten"][..]),
            ("taht", &["that", "tag", "taut"][..]),
            ("recieve", &["receive", "relieve", "reprieve"][..]),
            ("thier", &["their"][..]),
            ("accomodate", &["accommodate"][..]),
            ("seperete", &["separate"][..]),
            ("definately", &["definitely"][..]),
            ("occured", &["occurred"][..]),
            ("untill", &["until"][..]),
            ("wierd", &["weird"][..]),
            ("wich", &["which"][..]),
            ("ther", &["there", "their", "the"][..]),
        ])
    });

/// A spelling dictionary: membership plus ranked suggestions.
pub trait SpellDictionary: Send + Sync + std::fmt::Debug {
    /// Whether `word` is spelled correctly.
    fn is_correct(&self, word: &str) -> bool;

    /// Up to [`MAX_SUGGESTIONS`] replacements for `word`, best first.
    fn suggest(&self, word: &str) -> Vec<String>;
}

/// An in-memory word list where position encodes frequency rank.
#[derive(Debug, Clone)]
pub struct WordListDictionary {
    language: Language,
    /// Lowercased word to its frequency rank (0 = most common).
    ranks: HashMap<String, usize>,
    /// Words in rank order, for suggestion scans.
    words: Vec<String>,
}

impl WordListDictionary {
    /// Build from newline-separated text. Blank lines and `#` comments are skipped.
    ///
    /// Duplicate entries keep the rank of their first appearance.
    pub fn from_text(language: Language, content: &str) -> Self {
        let mut ranks = HashMap::new();
        let mut words = Vec::new();

        for line in content.lines() {
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            let word = word.to_lowercase();
            if !ranks.contains_key(&word) {
                ranks.insert(word.clone(), words.len());
                words.push(word);
            }
        }

        Self {
            language,
            ranks,
            words,
        }
    }

    /// Language this dictionary covers.
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the dictionary has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn contains(&self, lower: &str) -> bool {
        self.ranks.contains_key(lower)
    }

    /// Accept regular inflections of a known stem. English stems may also
    /// drop a trailing `e` or double a final consonant.
    fn is_inflection(&self, lower: &str) -> bool {
        let suffixes = match self.language {
            Language::English => ENGLISH_INFLECTIONS,
            Language::Spanish => SPANISH_INFLECTIONS,
            Language::French | Language::German => return false,
        };
        suffixes.iter().any(|suffix| {
            let Some(stem) = lower.strip_suffix(suffix) else {
                return false;
            };
            if stem.len() < 2 {
                return false;
            }
            if self.contains(stem) {
                return true;
            }
            let vowel_suffix =
                self.language == Language::English && suffix.starts_with(['e', 'i']);
            if vowel_suffix && self.contains(&format!("{stem}e")) {
                return true;
            }
            // "stopped" -> "stop"
            let mut chars = stem.char_indices().rev();
            vowel_suffix
                && matches!(
                    (chars.next(), chars.next()),
                    (Some((last, a)), Some((_, b))) if a == b && self.contains(&stem[..last])
                )
        })
    }
}

impl SpellDictionary for WordListDictionary {
    fn is_correct(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.contains(&lower) || self.is_inflection(&lower)
    }

    fn suggest(&self, word: &str) -> Vec<String> {
        let lower = word.to_lowercase();
        let mut suggestions: Vec<String> = KNOWN_MISSPELLINGS
            .get(lower.as_str())
            .map(|known| known.iter().map(|s| (*s).to_string()).collect())
            .unwrap_or_default();

        let mut ranked: Vec<(usize, usize, &str)> = self
            .words
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                candidate.chars().count().abs_diff(lower.chars().count()) <= MAX_EDIT_DISTANCE
            })
            .filter_map(|(rank, candidate)| {
                let distance = osa_distance(&lower, candidate);
                (distance > 0 && distance <= MAX_EDIT_DISTANCE)
                    .then_some((distance, rank, candidate.as_str()))
            })
            .collect();
        ranked.sort_unstable();

        for (_, _, candidate) in ranked {
            if suggestions.len() >= MAX_SUGGESTIONS {
                break;
            }
            if !suggestions.iter().any(|s| s == candidate) {
                suggestions.push(candidate.to_string());
            }
        }

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> WordListDictionary {
        WordListDictionary::from_text(
            Language::English,
            "# comment\nthe\ncat\nsat\nthen\nten\nmat\nhat\nstop\nmake\nquick\nthe\n",
        )
    }

    #[test]
    fn dedups_and_skips_comments() {
        let dict = english();
        assert_eq!(dict.len(), 10);
        assert!(!dict.is_empty());
        assert_eq!(dict.language(), Language::English);
    }

    #[test]
    fn membership_is_case_insensitive() {
        let dict = english();
        assert!(dict.is_correct("The"));
        assert!(dict.is_correct("CAT"));
        assert!(!dict.is_correct("dog"));
    }

    #[test]
    fn accepts_regular_inflections() {
        let dict = english();
        assert!(dict.is_correct("cats"));
        assert!(dict.is_correct("quickly"));
        assert!(dict.is_correct("making"));
        assert!(dict.is_correct("stopped"));
        assert!(dict.is_correct("hats"));
        assert!(!dict.is_correct("catz"));
    }

    #[test]
    fn doubled_multibyte_letter_before_suffix() {
        let dict = WordListDictionary::from_text(Language::English, "the\ncafé\n");
        assert!(!dict.is_correct("ééing"));
        assert!(dict.is_correct("cafééing"));
        assert!(!dict.is_correct("cafóóing"));
    }

    #[test]
    fn spanish_accepts_plurals_only() {
        let dict = WordListDictionary::from_text(Language::Spanish, "perro\nciudad\n");
        assert!(dict.is_correct("perros"));
        assert!(dict.is_correct("ciudades"));
        assert!(!dict.is_correct("perroing"));
    }

    #[test]
    fn known_misspellings_come_first() {
        let dict = english();
        let suggestions = dict.suggest("teh");
        assert_eq!(&suggestions[..3], &["the", "then", "ten"]);
        assert!(suggestions.len() <= MAX_SUGGESTIONS);
        let unique: std::collections::HashSet<_> = suggestions.iter().collect();
        assert_eq!(unique.len(), suggestions.len());
    }

    #[test]
    fn ranks_by_distance_then_frequency() {
        let dict = english();
        // "cat", "sat", "mat", "hat" are all one edit from "zat"; rank order decides.
        let suggestions = dict.suggest("zat");
        assert_eq!(&suggestions[..4], &["cat", "sat", "mat", "hat"]);
    }

    #[test]
    fn far_words_are_not_suggested() {
        let dict = english();
        assert!(dict.suggest("xylophone").is_empty());
    }

    #[test]
    fn never_more_than_five() {
        let words: String = (b'a'..=b'z').map(|c| format!("{}at\n", c as char)).collect();
        let dict = WordListDictionary::from_text(Language::English, &words);
        assert_eq!(dict.suggest("qqt").len(), MAX_SUGGESTIONS);
    }
}
