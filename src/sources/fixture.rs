//! Shared behaviour for fixture-backed carrier sources
//!
//! Fixture carriers answer from embedded JSON after a simulated network
//! latency, and can be configured to fail at random.

use super::traits::SourceError;
use crate::config::SourceConfig;
use crate::search::Deadline;
use rand::Rng;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;

/// Simulated latency and failure behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    /// Probability in [0, 1] that a call fails after its latency
    pub failure_rate: f64,
}

impl Simulation {
    pub fn new(min_latency_ms: u64, max_latency_ms: u64) -> Self {
        Self {
            min_latency_ms,
            max_latency_ms: max_latency_ms.max(min_latency_ms),
            failure_rate: 0.0,
        }
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = probability(rate);
        self
    }

    /// Apply overrides from a source configuration
    pub fn configure(&mut self, config: &SourceConfig) {
        if let Some(min) = config.min_latency_ms {
            self.min_latency_ms = min;
        }
        if let Some(max) = config.max_latency_ms {
            self.max_latency_ms = max;
        }
        self.max_latency_ms = self.max_latency_ms.max(self.min_latency_ms);
        if let Some(rate) = config.failure_rate {
            self.failure_rate = probability(rate);
        }
    }

    /// Wait out the simulated latency, then decide whether the call fails
    pub async fn run(&self, source: &str, deadline: &Deadline) -> Result<(), SourceError> {
        let (delay, fail) = {
            let mut rng = rand::thread_rng();
            let delay = rng.gen_range(self.min_latency_ms..=self.max_latency_ms);
            (delay, rng.gen_bool(self.failure_rate))
        };

        tokio::select! {
            _ = deadline.expired() => return Err(SourceError::Cancelled),
            _ = sleep(Duration::from_millis(delay)) => {}
        }

        if fail {
            return Err(SourceError::Unavailable(format!(
                "{} API Service Unavailable (503)",
                source
            )));
        }

        Ok(())
    }
}

/// NaN and infinities never fail a call
fn probability(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Decode an embedded fixture document
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, SourceError> {
    serde_json::from_str(raw).map_err(|e| SourceError::Parse(e.to_string()))
}
