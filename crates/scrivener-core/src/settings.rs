//! User-facing analysis settings.
//!
//! [`Settings`] is the closed set of switches the orchestrator reads at the
//! start of every analysis. [`SettingsPatch`] is the partial form accepted at
//! the boundary; unknown keys are rejected in both.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Language preference value that requests automatic detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Analysis switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Use only the local dictionary engine.
    pub work_offline: bool,
    /// Language preference: a code such as `en-US`, or `auto`.
    pub language: String,
    /// Report spelling corrections.
    pub spelling_check: bool,
    /// Report grammar corrections.
    pub grammar_check: bool,
    /// Report autocomplete suggestions.
    pub autocomplete: bool,
    /// Record correction outcomes in the in-memory history.
    pub store_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_offline: false,
            language: "en-US".to_string(),
            spelling_check: true,
            grammar_check: true,
            autocomplete: true,
            store_history: true,
        }
    }
}

impl Settings {
    /// Whether the language preference asks for detection.
    pub fn wants_detection(&self) -> bool {
        self.language.eq_ignore_ascii_case(AUTO_LANGUAGE)
    }

    /// Apply a partial update in place.
    ///
    /// Returns `true` when a field that cached results depend on
    /// (`work_offline` or `language`) actually changed.
    pub fn apply(&mut self, patch: SettingsPatch) -> bool {
        let before = (self.work_offline, self.language.clone());

        if let Some(v) = patch.work_offline {
            self.work_offline = v;
        }
        if let Some(v) = patch.language {
            self.language = v;
        }
        if let Some(v) = patch.spelling_check {
            self.spelling_check = v;
        }
        if let Some(v) = patch.grammar_check {
            self.grammar_check = v;
        }
        if let Some(v) = patch.autocomplete {
            self.autocomplete = v;
        }
        if let Some(v) = patch.store_history {
            self.store_history = v;
        }

        before != (self.work_offline, self.language.clone())
    }
}

/// Partial settings update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    /// New value for [`Settings::work_offline`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_offline: Option<bool>,
    /// New value for [`Settings::language`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// New value for [`Settings::spelling_check`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spelling_check: Option<bool>,
    /// New value for [`Settings::grammar_check`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar_check: Option<bool>,
    /// New value for [`Settings::autocomplete`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<bool>,
    /// New value for [`Settings::store_history`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_history: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert!(!s.work_offline);
        assert_eq!(s.language, "en-US");
        assert!(s.spelling_check && s.grammar_check && s.autocomplete && s.store_history);
        assert!(!s.wants_detection());
    }

    #[test]
    fn deserializes_with_defaults() {
        let s: Settings = serde_json::from_str(r#"{"work_offline": true}"#).unwrap();
        assert!(s.work_offline);
        assert_eq!(s.language, "en-US");
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = serde_json::from_str::<Settings>(r#"{"start_on_boot": true}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<SettingsPatch>(r#"{"bogus": 1}"#);
        assert!(err.is_err());
    }

    #[test]
    fn apply_reports_cache_relevant_changes() {
        let mut s = Settings::default();
        assert!(!s.apply(SettingsPatch {
            grammar_check: Some(false),
            ..Default::default()
        }));
        assert!(!s.grammar_check);

        assert!(s.apply(SettingsPatch {
            language: Some("auto".into()),
            ..Default::default()
        }));
        assert!(s.wants_detection());

        // Same value again is not a change.
        assert!(!s.apply(SettingsPatch {
            language: Some("auto".into()),
            ..Default::default()
        }));

        assert!(s.apply(SettingsPatch {
            work_offline: Some(true),
            ..Default::default()
        }));
    }
}
