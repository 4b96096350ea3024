//! Bounded memoization of analysis results.
//!
//! Entries are keyed by a 32-bit rolling hash of the exact input text. The
//! original text is stored alongside each entry and compared on lookup, so a
//! hash collision reads as a miss rather than returning another text's result.
//!
//! Eviction removes the least recently used entry. Recency comes from a
//! logical clock that advances on every insert and hit, so no two entries
//! share a stamp.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

use crate::correction::AnalysisResult;

/// Texts shorter than this (in characters) are never cached.
pub const MIN_CACHED_CHARS: usize = 5;

/// Default number of entries.
pub const DEFAULT_CAPACITY: usize = 100;

/// Key function used by the cache.
pub type TextHasher = fn(&str) -> u32;

/// Order-sensitive rolling hash: `h = h * 31 + c` over UTF-16 code units, wrapping at 32 bits.
pub fn rolling_hash(text: &str) -> u32 {
    text.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

#[derive(Debug)]
struct CacheEntry {
    text: String,
    value: AnalysisResult,
    last_access: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<u32, CacheEntry>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Counters describing cache behavior since construction or the last clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Current number of entries.
    pub len: usize,
    /// Maximum number of entries.
    pub capacity: usize,
    /// Lookups that returned a result.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
}

/// A thread-safe LRU cache of analysis results.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    hasher: TextHasher,
    state: Mutex<CacheState>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ResultCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, rolling_hash)
    }

    /// Create a cache with a custom key function.
    pub fn with_hasher(capacity: usize, hasher: TextHasher) -> Self {
        Self {
            capacity: capacity.max(1),
            hasher,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the result for exactly `text`, refreshing its recency on a hit.
    pub fn get(&self, text: &str) -> Option<AnalysisResult> {
        if text.chars().count() < MIN_CACHED_CHARS {
            return None;
        }
        let key = (self.hasher)(text);
        let mut state = self.state.lock();
        let stamp = state.tick();

        let found = match state.entries.get_mut(&key) {
            Some(entry) if entry.text == text => {
                entry.last_access = stamp;
                Some(entry.value.clone())
            }
            _ => None,
        };

        if found.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        found
    }

    /// Store `result` for `text`, evicting the least recently used entry when full.
    pub fn set(&self, text: &str, result: AnalysisResult) {
        if text.chars().count() < MIN_CACHED_CHARS {
            return;
        }
        let key = (self.hasher)(text);
        let mut state = self.state.lock();
        let stamp = state.tick();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| *key);
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                text: text.to_string(),
                value: result,
                last_access: stamp,
            },
        );
    }

    /// Remove every entry and reset the counters.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        tracing::debug!("result cache cleared");
    }

    /// Snapshot of size and hit counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            len: state.entries.len(),
            capacity: self.capacity,
            hits: state.hits,
            misses: state.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::Correction;

    fn result(tag: &str) -> AnalysisResult {
        AnalysisResult {
            corrections: vec![Correction::spelling(tag, vec![], String::new())],
            autocomplete_suggestions: vec![],
        }
    }

    #[test]
    fn rolling_hash_is_order_sensitive() {
        assert_eq!(rolling_hash(""), 0);
        assert_eq!(rolling_hash("a"), 97);
        assert_eq!(rolling_hash("ab"), 97 * 31 + 98);
        assert_ne!(rolling_hash("ab"), rolling_hash("ba"));
    }

    #[test]
    fn short_texts_are_never_cached() {
        let cache = ResultCache::new(4);
        cache.set("abcd", result("x"));
        assert!(cache.is_empty());
        assert_eq!(cache.get("abcd"), None);
    }

    #[test]
    fn get_returns_stored_value() {
        let cache = ResultCache::new(4);
        cache.set("hello world", result("x"));
        assert_eq!(cache.get("hello world"), Some(result("x")));
        assert_eq!(cache.get("hello there"), None);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ResultCache::new(2);
        cache.set("first text", result("1"));
        cache.set("second text", result("2"));
        // Touch the first so the second becomes oldest.
        assert!(cache.get("first text").is_some());
        cache.set("third text", result("3"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("first text").is_some());
        assert!(cache.get("second text").is_none());
        assert!(cache.get("third text").is_some());
    }

    #[test]
    fn overwrite_does_not_evict() {
        let cache = ResultCache::new(2);
        cache.set("first text", result("1"));
        cache.set("second text", result("2"));
        cache.set("first text", result("1b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("first text"), Some(result("1b")));
        assert!(cache.get("second text").is_some());
    }

    #[test]
    fn collisions_read_as_misses() {
        let cache = ResultCache::with_hasher(4, |_| 7);
        cache.set("one text", result("1"));
        assert_eq!(cache.get("another text"), None);
        cache.set("another text", result("2"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("one text"), None);
        assert_eq!(cache.get("another text"), Some(result("2")));
    }

    #[test]
    fn len_never_exceeds_capacity() {
        let cache = ResultCache::new(3);
        for i in 0..20 {
            cache.set(&format!("text number {i}"), result("x"));
            assert!(cache.len() <= cache.capacity());
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn clear_empties_and_resets_stats() {
        let cache = ResultCache::default();
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
        cache.set("hello world", result("x"));
        cache.get("hello world");
        cache.clear();
        assert_eq!(
            cache.stats(),
            CacheStats {
                len: 0,
                capacity: DEFAULT_CAPACITY,
                hits: 0,
                misses: 0
            }
        );
    }

    #[test]
    fn usable_from_many_threads() {
        let cache = std::sync::Arc::new(ResultCache::new(16));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let text = format!("thread {t} item {i}");
                        cache.set(&text, result("x"));
                        let _ = cache.get(&text);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 16);
    }
}
