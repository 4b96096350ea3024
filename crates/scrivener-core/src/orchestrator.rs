//! The analysis entry point.
//!
//! [`Analyzer`] owns the cache, failure tracker, dictionary engine, remote
//! client and correction history, and routes each request through them:
//!
//! 1. texts under three characters get an empty result;
//! 2. a cache hit is returned as is;
//! 3. the language is resolved from the settings (detecting it for `auto`);
//! 4. offline mode goes to the dictionary engine, online mode to the quick
//!    spelling pass plus the remote service;
//! 5. the result is cached.
//!
//! Service errors never surface to the caller. They are counted per category
//! by the [`FailureTracker`]; a degraded remote service sends requests to the
//! offline engine until a background probe sees it answer again.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::cache::{CacheStats, ResultCache};
use crate::config::Config;
use crate::correction::{AnalysisResult, Correction};
use crate::dictionary::{BundledDictionaries, DictionaryEngine, DictionarySource, DirectoryDictionaries};
use crate::error::{RemoteError, RemoteResult};
use crate::failure::{self, FailureTracker, RecoveryProbe, ServiceCategory, ServiceReport};
use crate::history::{CorrectionLog, CorrectionRecord, NewCorrection, DEFAULT_HISTORY_CAPACITY};
use crate::language::{self, Language};
use crate::remote::{ChatCompletionClient, OnlineAnalysis, RemoteAnalyzer, quick_spell_check};
use crate::settings::{Settings, SettingsPatch};
use crate::text::word_count;

/// Texts shorter than this (in characters) are not analyzed.
pub const MIN_ANALYSIS_CHARS: usize = 3;

/// Auto-detection only runs on texts longer than this (in characters).
pub const MIN_DETECTION_CHARS: usize = 10;

/// Text sent to the remote service to check whether it answers again.
const CANARY_TEXT: &str = "Hello";

/// Stand-in used when no remote analyzer is configured.
#[derive(Debug)]
struct Disconnected;

#[async_trait]
impl RemoteAnalyzer for Disconnected {
    async fn analyze_online(&self, _text: &str) -> RemoteResult<OnlineAnalysis> {
        Err(RemoteError::Unavailable("no remote analyzer configured".into()))
    }
}

/// Current settings plus a counter bumped by every routing change.
#[derive(Debug)]
struct SettingsState {
    current: Settings,
    generation: u64,
}

/// Routes analyses between the remote service and the offline engine.
pub struct Analyzer {
    settings: RwLock<SettingsState>,
    cache: ResultCache,
    tracker: FailureTracker,
    engine: Arc<DictionaryEngine>,
    remote: Arc<dyn RemoteAnalyzer>,
    history: CorrectionLog,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("settings", &self.settings.read().current)
            .field("cache", &self.cache.stats())
            .field("tracker", &self.tracker)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Start building an analyzer.
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// Analyze `text` with the current settings. Never fails; service errors
    /// degrade to fewer (possibly zero) corrections.
    #[tracing::instrument(skip_all, fields(text_len = text.len()))]
    pub async fn analyze(&self, text: &str) -> AnalysisResult {
        if text.chars().count() < MIN_ANALYSIS_CHARS {
            return AnalysisResult::empty();
        }
        if let Some(hit) = self.cache.get(text) {
            tracing::debug!("cache hit");
            return hit;
        }

        let (settings, generation) = {
            let state = self.settings.read();
            (state.current.clone(), state.generation)
        };
        let language = resolve_language(text, &settings);
        let result = if settings.work_offline {
            tracing::debug!(language = %language, "routing offline");
            self.analyze_offline(text, language).await
        } else {
            self.analyze_online(text, language).await
        };

        self.history
            .note_analysis(word_count(text), result.suggestion_count());
        {
            // Results from superseded routing stay out of the cache.
            let state = self.settings.read();
            if state.generation == generation {
                self.cache.set(text, result.clone());
            } else {
                tracing::debug!("settings changed during analysis, result not cached");
            }
        }
        result
    }

    /// The language an analysis of `text` would use under the current settings.
    pub fn resolve_language(&self, text: &str) -> Language {
        resolve_language(text, &self.settings.read().current)
    }

    async fn analyze_offline(&self, text: &str, language: Language) -> AnalysisResult {
        match self.engine.try_analyze(text, language).await {
            Ok(result) => {
                self.tracker.reset_error_count(ServiceCategory::Dictionary);
                result
            }
            Err(err) => {
                if self.tracker.record_error(ServiceCategory::Dictionary, &err) {
                    self.tracker
                        .start_recovery(ServiceCategory::Dictionary, self.dictionary_probe(language));
                }
                AnalysisResult::empty()
            }
        }
    }

    async fn analyze_online(&self, text: &str, language: Language) -> AnalysisResult {
        if self.tracker.is_failing(ServiceCategory::Api) {
            tracing::debug!(language = %language, "remote degraded, routing offline");
            self.tracker
                .start_recovery(ServiceCategory::Api, self.canary_probe());
            return self.analyze_offline(text, language).await;
        }

        let mut corrections = quick_spell_check(text);
        match self.remote.analyze_online(text).await {
            Ok(analysis) => {
                self.tracker.reset_error_count(ServiceCategory::Api);
                corrections.extend(analysis.grammar.into_iter().map(|item| {
                    Correction::grammar(item.incorrect, vec![item.correct], item.context)
                }));
                AnalysisResult {
                    corrections,
                    autocomplete_suggestions: analysis.autocomplete,
                }
            }
            Err(err) => {
                if self.tracker.record_error(ServiceCategory::Api, &err) {
                    tracing::debug!(language = %language, "remote crossed failure threshold, falling back");
                    let offline = self.analyze_offline(text, language).await;
                    corrections.extend(offline.corrections);
                    AnalysisResult {
                        corrections,
                        autocomplete_suggestions: offline.autocomplete_suggestions,
                    }
                } else {
                    AnalysisResult {
                        corrections,
                        autocomplete_suggestions: Vec::new(),
                    }
                }
            }
        }
    }

    fn dictionary_probe(&self, language: Language) -> RecoveryProbe {
        let engine = Arc::clone(&self.engine);
        failure::probe(move || {
            let engine = Arc::clone(&engine);
            async move { engine.reinitialize(language).await.is_ok() }
        })
    }

    fn canary_probe(&self) -> RecoveryProbe {
        let remote = Arc::clone(&self.remote);
        failure::probe(move || {
            let remote = Arc::clone(&remote);
            async move { remote.analyze_online(CANARY_TEXT).await.is_ok() }
        })
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().current.clone()
    }

    /// Apply a partial settings update and return the new settings.
    ///
    /// Changing `work_offline` or `language` clears the cache.
    pub fn update_settings(&self, patch: SettingsPatch) -> Settings {
        let mut state = self.settings.write();
        if state.current.apply(patch) {
            state.generation += 1;
            self.cache.clear();
        }
        tracing::debug!(settings = ?state.current, "settings updated");
        state.current.clone()
    }

    /// Record what the user did with a suggestion.
    ///
    /// Returns the stored record, or `None` when `store_history` is off (the
    /// usage counters are still updated).
    pub fn log_correction(&self, correction: NewCorrection) -> Option<CorrectionRecord> {
        if self.settings.read().current.store_history {
            Some(self.history.record(correction))
        } else {
            self.history.count_only(correction.outcome);
            None
        }
    }

    /// Correction history and usage counters.
    pub const fn history(&self) -> &CorrectionLog {
        &self.history
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Cache size and hit counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Reset the error counters of every service category.
    pub fn reset_all_error_counts(&self) {
        self.tracker.reset_all();
    }

    /// Health of every service category.
    pub fn error_report(&self) -> Vec<ServiceReport> {
        self.tracker.error_report()
    }

    /// The failure tracker shared with background probes.
    pub const fn failure_tracker(&self) -> &FailureTracker {
        &self.tracker
    }

    /// Languages whose dictionaries are currently loaded.
    pub fn loaded_languages(&self) -> Vec<Language> {
        self.engine.loaded_languages()
    }
}

fn resolve_language(text: &str, settings: &Settings) -> Language {
    if settings.wants_detection() && text.chars().count() > MIN_DETECTION_CHARS {
        language::map_detected(language::detect(text))
    } else {
        language::map_to_supported(&settings.language)
    }
}

/// Builder for [`Analyzer`].
pub struct AnalyzerBuilder {
    settings: Settings,
    source: Option<Arc<dyn DictionarySource>>,
    remote: Option<Arc<dyn RemoteAnalyzer>>,
    cache_capacity: usize,
    failure_threshold: u32,
    recovery_interval: Duration,
    history_capacity: usize,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            source: None,
            remote: None,
            cache_capacity: crate::cache::DEFAULT_CAPACITY,
            failure_threshold: failure::DEFAULT_THRESHOLD,
            recovery_interval: failure::DEFAULT_BACKOFF,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl fmt::Debug for AnalyzerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerBuilder")
            .field("settings", &self.settings)
            .field("source", &self.source)
            .field("has_remote", &self.remote.is_some())
            .field("cache_capacity", &self.cache_capacity)
            .field("failure_threshold", &self.failure_threshold)
            .field("recovery_interval", &self.recovery_interval)
            .finish_non_exhaustive()
    }
}

impl AnalyzerBuilder {
    /// Builder preloaded from configuration: initial settings, engine tuning,
    /// dictionary directory and the chat-completion client.
    pub fn from_config(config: &Config) -> RemoteResult<Self> {
        let source: Arc<dyn DictionarySource> = match &config.engine.dictionary_dir {
            Some(dir) => Arc::new(DirectoryDictionaries::new(dir.clone())),
            None => Arc::new(BundledDictionaries),
        };
        let client = ChatCompletionClient::new(&config.remote)?;
        if !client.has_api_key() {
            tracing::debug!("no API key configured; online analysis will degrade to offline");
        }

        Ok(Self {
            settings: config.analysis.clone(),
            source: Some(source),
            remote: Some(Arc::new(client)),
            cache_capacity: config.engine.cache_capacity,
            failure_threshold: config.engine.failure_threshold,
            recovery_interval: Duration::from_secs(config.engine.recovery_interval_secs),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        })
    }

    /// Initial settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Where dictionaries are loaded from. Defaults to the bundled word lists.
    pub fn dictionary_source(mut self, source: impl DictionarySource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// The remote service used in online mode.
    pub fn remote(mut self, remote: impl RemoteAnalyzer + 'static) -> Self {
        self.remote = Some(Arc::new(remote));
        self
    }

    /// Maximum number of cached results.
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Errors after which a service is treated as degraded.
    pub const fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Delay between recovery attempts.
    pub const fn recovery_interval(mut self, interval: Duration) -> Self {
        self.recovery_interval = interval;
        self
    }

    /// Maximum number of correction records kept.
    pub const fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Build the analyzer.
    pub fn build(self) -> Analyzer {
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(BundledDictionaries));
        Analyzer {
            settings: RwLock::new(SettingsState {
                current: self.settings,
                generation: 0,
            }),
            cache: ResultCache::new(self.cache_capacity),
            tracker: FailureTracker::new(self.failure_threshold, self.recovery_interval),
            engine: Arc::new(DictionaryEngine::from_shared(source)),
            remote: self.remote.unwrap_or_else(|| Arc::new(Disconnected)),
            history: CorrectionLog::new(self.history_capacity),
        }
    }
}
