//! In-memory correction history and usage counters.
//!
//! Nothing here is persisted; the log lives as long as the [`Analyzer`]
//! that owns it.
//!
//! [`Analyzer`]: crate::orchestrator::Analyzer

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of records retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// What kind of suggestion a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A spelling fix.
    Spelling,
    /// A grammar fix.
    Grammar,
    /// An accepted or rejected completion.
    Autocomplete,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spelling => "spelling",
            Self::Grammar => "grammar",
            Self::Autocomplete => "autocomplete",
        })
    }
}

/// What the user did with a suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The suggestion replaced the original text.
    #[default]
    Applied,
    /// The suggestion was ignored.
    Dismissed,
}

/// A correction outcome reported by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NewCorrection {
    /// Kind of suggestion.
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Text before the change.
    pub original: String,
    /// Text after the change (or the suggestion that was dismissed).
    pub corrected: String,
    /// Application the text was typed in.
    #[serde(default)]
    pub application: String,
    /// Whether the suggestion was applied or dismissed.
    #[serde(default)]
    pub outcome: Outcome,
}

/// A stored correction outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CorrectionRecord {
    /// Sequential identifier, starting at 1.
    pub id: u64,
    /// Kind of suggestion.
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Text before the change.
    pub original: String,
    /// Text after the change.
    pub corrected: String,
    /// Application the text was typed in.
    pub application: String,
    /// Applied or dismissed.
    pub outcome: Outcome,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl CorrectionRecord {
    /// One-line human description, e.g. `Changed "teh" to "the" in Notes`.
    pub fn describe(&self) -> String {
        let mut line = match self.outcome {
            Outcome::Applied => format!("Changed \"{}\" to \"{}\"", self.original, self.corrected),
            Outcome::Dismissed => format!("Kept \"{}\" over \"{}\"", self.original, self.corrected),
        };
        if !self.application.is_empty() {
            line.push_str(" in ");
            line.push_str(&self.application);
        }
        line
    }
}

/// Running counters since startup or the last clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UsageStatistics {
    /// Analyses that were computed rather than served from cache.
    pub analyses_run: u64,
    /// Words across those analyses.
    pub words_processed: u64,
    /// Corrections and completions offered.
    pub suggestions_made: u64,
    /// Corrections the user applied.
    pub corrections_applied: u64,
    /// Corrections the user dismissed.
    pub corrections_dismissed: u64,
}

#[derive(Debug, Default)]
struct LogState {
    records: VecDeque<CorrectionRecord>,
    next_id: u64,
    stats: UsageStatistics,
}

/// Bounded log of correction outcomes plus usage counters.
#[derive(Debug)]
pub struct CorrectionLog {
    capacity: usize,
    state: Mutex<LogState>,
}

impl Default for CorrectionLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl CorrectionLog {
    /// Create a log retaining at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LogState::default()),
        }
    }

    /// Store an outcome, dropping the oldest record when full.
    pub fn record(&self, correction: NewCorrection) -> CorrectionRecord {
        let mut state = self.state.lock();
        state.next_id += 1;
        let record = CorrectionRecord {
            id: state.next_id,
            kind: correction.kind,
            original: correction.original,
            corrected: correction.corrected,
            application: correction.application,
            outcome: correction.outcome,
            created_at: Utc::now(),
        };
        count_outcome(&mut state.stats, record.outcome);

        if state.records.len() >= self.capacity {
            state.records.pop_front();
        }
        state.records.push_back(record.clone());
        tracing::debug!(id = record.id, kind = %record.kind, "correction recorded");
        record
    }

    /// Count an outcome without storing a record.
    pub fn count_only(&self, outcome: Outcome) {
        count_outcome(&mut self.state.lock().stats, outcome);
    }

    /// Add one computed analysis to the usage counters.
    pub fn note_analysis(&self, words: usize, suggestions: usize) {
        let mut state = self.state.lock();
        let stats = &mut state.stats;
        stats.analyses_run += 1;
        stats.words_processed += words as u64;
        stats.suggestions_made += suggestions as u64;
    }

    /// Up to `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<CorrectionRecord> {
        self.state
            .lock()
            .records
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Snapshot of the usage counters.
    pub fn statistics(&self) -> UsageStatistics {
        self.state.lock().stats
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all records and zero the counters. Identifiers keep increasing.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.stats = UsageStatistics::default();
    }
}

fn count_outcome(stats: &mut UsageStatistics, outcome: Outcome) {
    match outcome {
        Outcome::Applied => stats.corrections_applied += 1,
        Outcome::Dismissed => stats.corrections_dismissed += 1,
    }
}
