//! Online analysis through a remote language model.
//!
//! [`RemoteAnalyzer`] is the seam the orchestrator talks to. The production
//! implementation is [`ChatCompletionClient`]; tests substitute scripted fakes.

pub mod client;
pub mod quick_speller;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use client::ChatCompletionClient;
pub use quick_speller::quick_spell_check;

use crate::error::{RemoteError, RemoteResult};

/// One grammar finding from the remote model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GrammarItem {
    /// The text the model flagged.
    pub incorrect: String,
    /// The model's replacement.
    pub correct: String,
    /// Surrounding text, as quoted by the model.
    pub context: String,
}

/// Parsed remote response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OnlineAnalysis {
    /// Grammar findings.
    pub grammar: Vec<GrammarItem>,
    /// Ways to continue the text.
    pub autocomplete: Vec<String>,
}

impl OnlineAnalysis {
    /// Parse the model's JSON payload.
    ///
    /// The payload must be a JSON object. Fields that are missing or not arrays
    /// become empty; array items of the wrong shape are skipped.
    pub fn from_json(payload: &str) -> RemoteResult<Self> {
        let value: Value =
            serde_json::from_str(payload).map_err(|err| RemoteError::Parse(err.to_string()))?;
        let Value::Object(object) = value else {
            return Err(RemoteError::Parse("expected a JSON object".to_string()));
        };

        let grammar = object
            .get("grammar")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(grammar_item).collect())
            .unwrap_or_default();

        let autocomplete = object
            .get("autocomplete")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            grammar,
            autocomplete,
        })
    }
}

fn grammar_item(value: &Value) -> Option<GrammarItem> {
    let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
    Some(GrammarItem {
        incorrect: field("incorrect")?,
        correct: field("correct")?,
        context: field("context").unwrap_or_default(),
    })
}

/// A service that analyzes text for grammar and completions.
#[async_trait]
pub trait RemoteAnalyzer: Send + Sync {
    /// Analyze `text` with one remote call. No internal retry.
    async fn analyze_online(&self, text: &str) -> RemoteResult<OnlineAnalysis>;
}
