//! Metrics collection module
//!
//! Tracks source performance, error rates, and cache usage.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Response times kept per source for the rolling average
const RESPONSE_WINDOW: usize = 100;

/// Process-wide metrics collector, shared by handle
pub struct Metrics {
    /// Total search count
    total_searches: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    /// Source response times (rolling window in ms)
    response_times: RwLock<HashMap<String, VecDeque<u64>>>,
    /// Failed attempts per source
    source_errors: RwLock<HashMap<String, u64>>,
    /// Successful attempts per source
    source_successes: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            response_times: RwLock::new(HashMap::new()),
            source_errors: RwLock::new(HashMap::new()),
            source_successes: RwLock::new(HashMap::new()),
        }
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record source response time
    pub fn record_response_time(&self, source: &str, time_ms: u64) {
        let mut times = self
            .response_times
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = times.entry(source.to_string()).or_default();

        if entry.len() >= RESPONSE_WINDOW {
            entry.pop_front();
        }
        entry.push_back(time_ms);
    }

    /// Record a failed source attempt
    pub fn record_error(&self, source: &str) {
        let mut errors = self
            .source_errors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *errors.entry(source.to_string()).or_insert(0) += 1;
    }

    /// Record a successful source attempt
    pub fn record_success(&self, source: &str) {
        let mut successes = self
            .source_successes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *successes.entry(source.to_string()).or_insert(0) += 1;
    }

    /// Get total searches
    pub fn get_total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Get average response time for a source
    pub fn get_avg_response_time(&self, source: &str) -> Option<u64> {
        let times = self
            .response_times
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        times.get(source).and_then(|t| {
            if t.is_empty() {
                None
            } else {
                Some(t.iter().sum::<u64>() / t.len() as u64)
            }
        })
    }

    fn counts(&self, source: &str) -> (u64, u64) {
        let successes = self
            .source_successes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let errors = self
            .source_errors
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        (
            *successes.get(source).unwrap_or(&0),
            *errors.get(source).unwrap_or(&0),
        )
    }

    /// Get reliability percentage for a source
    pub fn get_reliability(&self, source: &str) -> f64 {
        let (successes, errors) = self.counts(source);
        reliability(successes, errors)
    }

    /// Get all source statistics
    pub fn get_source_stats(&self) -> BTreeMap<String, SourceStats> {
        let mut names: Vec<String> = {
            let successes = self
                .source_successes
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            let errors = self
                .source_errors
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            successes.keys().chain(errors.keys()).cloned().collect()
        };
        names.sort();
        names.dedup();

        names
            .into_iter()
            .map(|name| {
                let (successes, errors) = self.counts(&name);
                let stats = SourceStats {
                    attempts: successes + errors,
                    successes,
                    errors,
                    avg_response_time: self.get_avg_response_time(&name),
                    reliability: reliability(successes, errors),
                };
                (name, stats)
            })
            .collect()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_searches: self.get_total_searches(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            sources: self.get_source_stats(),
        }
    }
}

fn reliability(successes: u64, errors: u64) -> f64 {
    let total = successes + errors;
    if total == 0 {
        100.0
    } else {
        (successes as f64 / total as f64) * 100.0
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single source
#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub attempts: u64,
    pub successes: u64,
    pub errors: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub sources: BTreeMap<String, SourceStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record_cache_miss();
        metrics.record_response_time("Garuda Indonesia", 100);
        metrics.record_success("Garuda Indonesia");

        assert_eq!(metrics.get_total_searches(), 1);
        assert_eq!(metrics.get_avg_response_time("Garuda Indonesia"), Some(100));
        assert_eq!(metrics.get_reliability("Garuda Indonesia"), 100.0);
        assert_eq!(metrics.get_reliability("unknown"), 100.0);
    }

    #[test]
    fn test_snapshot() {
        let metrics = Metrics::new();
        metrics.record_cache_hit();
        metrics.record_success("AirAsia");
        metrics.record_error("AirAsia");
        metrics.record_error("AirAsia");
        metrics.record_error("AirAsia");
        metrics.record_error("Lion Air");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.sources.len(), 2);

        let airasia = &snapshot.sources["AirAsia"];
        assert_eq!(airasia.attempts, 4);
        assert_eq!(airasia.reliability, 25.0);
        assert_eq!(snapshot.sources["Lion Air"].reliability, 0.0);
    }

    #[test]
    fn test_response_window() {
        let metrics = Metrics::new();
        for _ in 0..RESPONSE_WINDOW {
            metrics.record_response_time("Batik Air", 1000);
        }
        for _ in 0..RESPONSE_WINDOW {
            metrics.record_response_time("Batik Air", 200);
        }
        assert_eq!(metrics.get_avg_response_time("Batik Air"), Some(200));
    }
}
