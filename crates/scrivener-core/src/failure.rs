//! Per-service failure tracking with background recovery.
//!
//! Each [`ServiceCategory`] carries an error counter. Once the counter reaches
//! the threshold the service is *degraded* and callers route around it. A
//! recovery probe can then be started; it runs on a detached task and, while
//! the service stays degraded, retries after a fixed backoff. At most one
//! retry loop exists per category, and it ends as soon as a probe succeeds or
//! the counter is reset below the threshold.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default error count at which a service is degraded.
pub const DEFAULT_THRESHOLD: u32 = 5;

/// Default delay between recovery attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(60);

/// Kinds of service whose failures are tracked separately.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    /// Connectivity failures.
    Network,
    /// The remote analysis API.
    Api,
    /// Storage.
    Database,
    /// Spelling dictionaries.
    Dictionary,
    /// Resource exhaustion.
    Memory,
    /// Anything else.
    Unknown,
}

impl ServiceCategory {
    /// All categories in report order.
    pub const ALL: [Self; 6] = [
        Self::Network,
        Self::Api,
        Self::Database,
        Self::Dictionary,
        Self::Memory,
        Self::Unknown,
    ];

    /// Lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Api => "api",
            Self::Database => "database",
            Self::Dictionary => "dictionary",
            Self::Memory => "memory",
            Self::Unknown => "unknown",
        }
    }

    /// Classify a name; unrecognized names are [`ServiceCategory::Unknown`].
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Below the threshold.
    Healthy,
    /// At or over the threshold with no probe running.
    Degraded,
    /// A recovery probe is in flight.
    Recovering,
}

/// Point-in-time view of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceReport {
    /// The category described.
    pub category: ServiceCategory,
    /// Derived health.
    pub state: ServiceState,
    /// Errors since the last reset or successful recovery.
    pub error_count: u32,
    /// When the most recent error was recorded.
    pub last_error_at: Option<DateTime<Utc>>,
    /// Message of the most recent error.
    pub last_error: Option<String>,
    /// Probe attempts since the last reset.
    pub recovery_attempts: u32,
}

/// Asynchronous health check run during recovery. Resolves `true` when the
/// service works again.
pub type RecoveryProbe = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Wrap an async closure as a [`RecoveryProbe`].
pub fn probe<F, Fut>(f: F) -> RecoveryProbe
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

#[derive(Debug, Default)]
struct CategoryState {
    error_count: u32,
    last_error_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    recovery_attempts: u32,
    is_recovering: bool,
    /// A detached retry loop exists for this category.
    loop_active: bool,
}

#[derive(Debug)]
struct TrackerInner {
    threshold: u32,
    backoff: Duration,
    states: Mutex<HashMap<ServiceCategory, CategoryState>>,
}

/// Shared failure tracker. Cloning is cheap and clones share state.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    inner: Arc<TrackerInner>,
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_BACKOFF)
    }
}

impl FailureTracker {
    /// Create a tracker. A threshold of zero is raised to one.
    pub fn new(threshold: u32, backoff: Duration) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                threshold: threshold.max(1),
                backoff,
                states: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Error count at which a category is degraded.
    pub fn threshold(&self) -> u32 {
        self.inner.threshold
    }

    /// Delay between recovery attempts.
    pub fn backoff(&self) -> Duration {
        self.inner.backoff
    }

    /// Record a failure. Returns whether the category is now at or over the threshold.
    pub fn record_error(&self, category: ServiceCategory, error: &dyn fmt::Display) -> bool {
        let mut states = self.inner.states.lock();
        let state = states.entry(category).or_default();
        state.error_count = state.error_count.saturating_add(1);
        state.last_error_at = Some(Utc::now());
        state.last_error = Some(error.to_string());

        let count = state.error_count;
        tracing::warn!(category = %category, count, error = %error, "service error recorded");
        count >= self.inner.threshold
    }

    /// Whether `category` is at or over the threshold.
    pub fn is_failing(&self, category: ServiceCategory) -> bool {
        self.inner
            .states
            .lock()
            .get(&category)
            .is_some_and(|state| state.error_count >= self.inner.threshold)
    }

    /// Current error count for `category`.
    pub fn error_count(&self, category: ServiceCategory) -> u32 {
        self.inner
            .states
            .lock()
            .get(&category)
            .map_or(0, |state| state.error_count)
    }

    /// Clear the error and recovery-attempt counters for `category`.
    pub fn reset_error_count(&self, category: ServiceCategory) {
        let mut states = self.inner.states.lock();
        if let Some(state) = states.get_mut(&category) {
            if state.error_count > 0 {
                tracing::debug!(category = %category, "error count reset");
            }
            state.error_count = 0;
            state.recovery_attempts = 0;
        }
    }

    /// Clear the counters of every category.
    pub fn reset_all(&self) {
        let mut states = self.inner.states.lock();
        for state in states.values_mut() {
            state.error_count = 0;
            state.recovery_attempts = 0;
        }
        tracing::debug!("all error counts reset");
    }

    /// Report for every category, in [`ServiceCategory::ALL`] order.
    pub fn error_report(&self) -> Vec<ServiceReport> {
        let states = self.inner.states.lock();
        ServiceCategory::ALL
            .into_iter()
            .map(|category| {
                let empty = CategoryState::default();
                let state = states.get(&category).unwrap_or(&empty);
                ServiceReport {
                    category,
                    state: self.derive_state(state),
                    error_count: state.error_count,
                    last_error_at: state.last_error_at,
                    last_error: state.last_error.clone(),
                    recovery_attempts: state.recovery_attempts,
                }
            })
            .collect()
    }

    /// Derived health of `category`.
    pub fn state(&self, category: ServiceCategory) -> ServiceState {
        let states = self.inner.states.lock();
        states
            .get(&category)
            .map_or(ServiceState::Healthy, |state| self.derive_state(state))
    }

    fn derive_state(&self, state: &CategoryState) -> ServiceState {
        if state.is_recovering {
            ServiceState::Recovering
        } else if state.error_count >= self.inner.threshold {
            ServiceState::Degraded
        } else {
            ServiceState::Healthy
        }
    }

    /// Start recovering `category` in the background.
    ///
    /// Does nothing and returns `false` when a probe is already running or a
    /// retry loop is already waiting for its next attempt. Must be called
    /// from within a Tokio runtime.
    pub fn start_recovery(&self, category: ServiceCategory, probe: RecoveryProbe) -> bool {
        {
            let mut states = self.inner.states.lock();
            let state = states.entry(category).or_default();
            if state.is_recovering || state.loop_active {
                return false;
            }
            state.is_recovering = true;
            state.loop_active = true;
            state.recovery_attempts += 1;
        }

        let tracker = self.clone();
        tokio::spawn(async move { tracker.recovery_loop(category, probe).await });
        true
    }

    async fn recovery_loop(self, category: ServiceCategory, probe: RecoveryProbe) {
        loop {
            if self.run_probe(category, &probe).await {
                break;
            }
            tokio::time::sleep(self.inner.backoff).await;
            if !self.begin_retry(category) {
                break;
            }
        }

        if let Some(state) = self.inner.states.lock().get_mut(&category) {
            state.loop_active = false;
        }
    }

    /// Run one probe. A panicking probe counts as a failed one.
    async fn run_probe(&self, category: ServiceCategory, probe: &RecoveryProbe) -> bool {
        let recovered = AssertUnwindSafe(probe())
            .catch_unwind()
            .await
            .unwrap_or(false);

        let mut states = self.inner.states.lock();
        let state = states.entry(category).or_default();
        state.is_recovering = false;
        if recovered {
            state.error_count = 0;
            tracing::info!(category = %category, attempts = state.recovery_attempts, "service recovered");
        } else {
            tracing::debug!(category = %category, attempts = state.recovery_attempts, "recovery probe failed");
        }
        recovered
    }

    /// Prepare the next attempt, unless the category is no longer degraded.
    fn begin_retry(&self, category: ServiceCategory) -> bool {
        let mut states = self.inner.states.lock();
        let state = states.entry(category).or_default();
        if state.error_count < self.inner.threshold || state.is_recovering {
            return false;
        }
        state.is_recovering = true;
        state.recovery_attempts += 1;
        true
    }
}
