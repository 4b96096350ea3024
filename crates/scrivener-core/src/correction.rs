//! Analysis results and the corrections they carry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// What a correction is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionKind {
    /// A word not found in the dictionary.
    Spelling,
    /// A grammar or usage issue spanning one or more words.
    Grammar,
}

impl std::fmt::Display for CorrectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spelling => f.write_str("spelling"),
            Self::Grammar => f.write_str("grammar"),
        }
    }
}

/// A single flagged span with ranked replacement suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Correction {
    /// The flagged text as it appeared in the input.
    pub word: String,
    /// Replacement candidates, best first. May be empty.
    pub suggestions: Vec<String>,
    /// Spelling or grammar.
    #[serde(rename = "type")]
    pub kind: CorrectionKind,
    /// A snippet of the input around the flagged text.
    pub context: String,
}

impl Correction {
    /// Build a spelling correction.
    pub fn spelling(word: impl Into<String>, suggestions: Vec<String>, context: String) -> Self {
        Self {
            word: word.into(),
            suggestions,
            kind: CorrectionKind::Spelling,
            context,
        }
    }

    /// Build a grammar correction.
    pub fn grammar(word: impl Into<String>, suggestions: Vec<String>, context: String) -> Self {
        Self {
            word: word.into(),
            suggestions,
            kind: CorrectionKind::Grammar,
            context,
        }
    }
}

/// Output of one analysis. An empty result is a valid answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Spelling and grammar corrections in discovery order.
    pub corrections: Vec<Correction>,
    /// Ways to continue the text.
    pub autocomplete_suggestions: Vec<String>,
}

impl AnalysisResult {
    /// The empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the result carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty() && self.autocomplete_suggestions.is_empty()
    }

    /// Number of individual suggestions offered, across corrections and autocomplete.
    pub fn suggestion_count(&self) -> usize {
        self.corrections
            .iter()
            .map(|c| c.suggestions.len())
            .sum::<usize>()
            + self.autocomplete_suggestions.len()
    }

    /// Drop the parts the caller's settings switched off.
    pub fn filtered(mut self, settings: &Settings) -> Self {
        self.corrections.retain(|c| match c.kind {
            CorrectionKind::Spelling => settings.spelling_check,
            CorrectionKind::Grammar => settings.grammar_check,
        });
        if !settings.autocomplete {
            self.autocomplete_suggestions.clear();
        }
        self
    }
}
