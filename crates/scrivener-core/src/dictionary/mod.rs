//! Offline analysis: dictionary spelling, pattern grammar, and stub autocomplete.
//!
//! The [`DictionaryEngine`] keeps one lazily loaded dictionary per language.
//! Concurrent first use of a language coalesces into a single load; a load
//! that fails is not remembered, so the next call tries again.
//!
//! # Example
//!
//! ```no_run
//! use scrivener_core::dictionary::{BundledDictionaries, DictionaryEngine};
//! use scrivener_core::language::Language;
//!
//! # async fn run() {
//! let engine = DictionaryEngine::new(BundledDictionaries);
//! let result = engine.analyze_offline("teh cat sat", Language::English).await;
//! assert_eq!(result.corrections[0].suggestions[0], "the");
//! # }
//! ```

pub mod grammar;
pub mod source;
pub mod word_list;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

pub use grammar::check_grammar;
pub use source::{BundledDictionaries, DictionarySource, DirectoryDictionaries};
pub use word_list::{MAX_SUGGESTIONS, SpellDictionary, WordListDictionary};

use crate::correction::{AnalysisResult, Correction};
use crate::error::{DictionaryError, DictionaryResult};
use crate::language::Language;
use crate::text::{self, context_around_first};

/// Tokens shorter than this are never spell-checked.
const MIN_SPELLCHECK_CHARS: usize = 3;

/// The trailing word must be longer than this to get completions.
const MIN_AUTOCOMPLETE_CHARS: usize = 3;

type DictionaryCell = Arc<OnceCell<Arc<dyn SpellDictionary>>>;

/// Dictionary-backed analyzer with per-language lazy loading.
#[derive(Debug)]
pub struct DictionaryEngine {
    source: Arc<dyn DictionarySource>,
    cells: Mutex<HashMap<Language, DictionaryCell>>,
}

impl DictionaryEngine {
    /// Create an engine that loads from `source`.
    pub fn new(source: impl DictionarySource + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    /// Create an engine over an already shared source.
    pub fn from_shared(source: Arc<dyn DictionarySource>) -> Self {
        Self {
            source,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Languages whose dictionary is currently loaded, in code order.
    pub fn loaded_languages(&self) -> Vec<Language> {
        let mut loaded: Vec<Language> = self
            .cells
            .lock()
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(language, _)| *language)
            .collect();
        loaded.sort();
        loaded
    }

    /// Get the dictionary for `language`, loading it on first use.
    pub async fn dictionary(
        &self,
        language: Language,
    ) -> DictionaryResult<Arc<dyn SpellDictionary>> {
        let cell = Arc::clone(self.cells.lock().entry(language).or_default());
        cell.get_or_try_init(|| self.load(language))
            .await
            .map(Arc::clone)
    }

    /// Drop any loaded dictionary for `language` and load it again.
    #[tracing::instrument(skip(self), fields(language = %language))]
    pub async fn reinitialize(&self, language: Language) -> DictionaryResult<()> {
        self.cells.lock().remove(&language);
        self.dictionary(language).await.map(|_| ())
    }

    async fn load(&self, language: Language) -> DictionaryResult<Arc<dyn SpellDictionary>> {
        let source = Arc::clone(&self.source);
        let dictionary = tokio::task::spawn_blocking(move || source.load(language))
            .await
            .map_err(|err| DictionaryError::LoadAborted {
                language,
                reason: err.to_string(),
            })??;

        if dictionary.is_empty() {
            return Err(DictionaryError::Empty(language));
        }
        tracing::debug!(language = %language, words = dictionary.len(), "dictionary loaded");
        Ok(Arc::new(dictionary))
    }

    /// Analyze `text` offline, surfacing dictionary failures.
    #[tracing::instrument(skip(self, text), fields(text_len = text.len(), language = %language))]
    pub async fn try_analyze(
        &self,
        text: &str,
        language: Language,
    ) -> DictionaryResult<AnalysisResult> {
        let dictionary = self.dictionary(language).await?;
        let spans = text::word_spans(text);

        let mut corrections: Vec<Correction> = spans
            .iter()
            .filter(|span| {
                span.text.chars().count() >= MIN_SPELLCHECK_CHARS
                    && !span.text.chars().any(|c| c.is_ascii_digit())
            })
            .filter(|span| !dictionary.is_correct(span.text))
            .map(|span| {
                Correction::spelling(
                    span.text,
                    dictionary.suggest(span.text),
                    context_around_first(text, span.text),
                )
            })
            .collect();

        corrections.extend(check_grammar(text));

        Ok(AnalysisResult {
            corrections,
            autocomplete_suggestions: autocomplete(text, spans.last().map(|span| span.text)),
        })
    }

    /// Analyze `text` offline. A dictionary that cannot be loaded yields an empty result.
    pub async fn analyze_offline(&self, text: &str, language: Language) -> AnalysisResult {
        match self.try_analyze(text, language).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error = %err, "offline analysis failed");
                AnalysisResult::empty()
            }
        }
    }
}

/// Suffix completions for a trailing word the user may still be typing.
fn autocomplete(text: &str, last_word: Option<&str>) -> Vec<String> {
    match last_word {
        Some(word)
            if word.chars().count() > MIN_AUTOCOMPLETE_CHARS && text.trim().ends_with(word) =>
        {
            ["s", "ing", "ed", "ly"]
                .iter()
                .map(|suffix| format!("{word}{suffix}"))
                .collect()
        }
        _ => Vec::new(),
    }
}
