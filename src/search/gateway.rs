//! Concurrent fan-out to every registered source

use crate::config::timeout_from_secs;
use crate::metrics::Metrics;
use crate::results::Offer;
use crate::search::{Deadline, SearchRequest};
use crate::sources::{FlightSource, SourceError, SourceRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// How often and how patiently a failed source is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Retry `n` waits `n` times this long first
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(100))
    }
}

/// Final result of one source task
#[derive(Debug)]
struct SourceOutcome {
    source: String,
    attempts: u32,
    result: Result<Vec<Offer>, SourceError>,
}

/// Everything the gateway learned from one fan-out
#[derive(Debug, Default)]
pub struct GatewayReport {
    /// Offers from every successful source, in completion order
    pub offers: Vec<Offer>,
    pub succeeded: usize,
    pub failed: usize,
    /// Whether the deadline cut the fan-out short
    pub cancelled: bool,
}

impl GatewayReport {
    fn absorb(&mut self, outcome: SourceOutcome) {
        match outcome.result {
            Ok(offers) => {
                debug!(
                    "{} returned {} offers after {} attempt(s)",
                    outcome.source,
                    offers.len(),
                    outcome.attempts
                );
                self.succeeded += 1;
                self.offers.extend(offers);
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.cancelled = true;
                }
                warn!(
                    "{} failed after {} attempt(s): {}",
                    outcome.source, outcome.attempts, e
                );
                self.failed += 1;
            }
        }
    }
}

/// Invokes every registered source concurrently under one deadline
pub struct SourceGateway {
    registry: Arc<SourceRegistry>,
    retry: RetryPolicy,
    /// Attempt timeout for sources without their own
    default_timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl SourceGateway {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self {
            registry,
            retry: RetryPolicy::default(),
            default_timeout: Duration::from_secs(1),
            metrics: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the default per-attempt timeout
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Number of sources a fan-out queries
    pub fn source_count(&self) -> usize {
        self.registry.len()
    }

    /// Query every source and wait for all of them or the deadline
    ///
    /// Tasks still running when the deadline fires are aborted and counted
    /// as failed.
    pub async fn fetch_all(&self, request: &SearchRequest, deadline: &Deadline) -> GatewayReport {
        let mut tasks = JoinSet::new();

        for source in self.registry.iter() {
            let attempt_timeout = timeout_from_secs(
                self.registry
                    .get_timeout(source.name(), self.default_timeout.as_secs_f64()),
            )
            .unwrap_or(self.default_timeout);
            let task = SourceTask {
                source: source.clone(),
                request: request.clone(),
                deadline: deadline.clone(),
                retry: self.retry,
                attempt_timeout,
                metrics: self.metrics.clone(),
            };
            tasks.spawn(task.run());
        }

        info!("Fanning out to {} sources", tasks.len());

        let mut report = GatewayReport::default();
        loop {
            tokio::select! {
                biased;
                joined = tasks.join_next() => match joined {
                    Some(Ok(outcome)) => report.absorb(outcome),
                    Some(Err(e)) => {
                        warn!("Source task ended abnormally: {}", e);
                        report.failed += 1;
                    }
                    None => break,
                },
                _ = deadline.expired() => {
                    let pending = tasks.len();
                    if pending > 0 {
                        warn!("Deadline reached with {} sources still running", pending);
                    }
                    tasks.abort_all();
                    report.failed += pending;
                    report.cancelled = true;
                    break;
                }
            }
        }

        report
    }
}

/// One source's share of a fan-out, owned by its spawned task
struct SourceTask {
    source: Arc<dyn FlightSource>,
    request: SearchRequest,
    deadline: Deadline,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl SourceTask {
    async fn run(self) -> SourceOutcome {
        let name = self.source.name().to_string();
        let mut last_error = SourceError::Cancelled;
        let mut attempts = 0;

        for attempt in 1..=self.retry.attempts() {
            if attempt > 1 {
                let delay = self.retry.backoff * (attempt - 1);
                tokio::select! {
                    _ = self.deadline.expired() => {
                        last_error = SourceError::Cancelled;
                        break;
                    }
                    _ = sleep(delay) => {}
                }
            }

            if self.deadline.is_expired() {
                last_error = SourceError::Cancelled;
                break;
            }

            attempts = attempt;
            let started = Instant::now();
            let result = timeout(
                self.attempt_timeout,
                self.source.fetch_offers(&self.request, &self.deadline),
            )
            .await
            .unwrap_or(Err(SourceError::Timeout));
            self.record(&name, &result, started);

            match result {
                Ok(offers) => {
                    return SourceOutcome {
                        source: name,
                        attempts,
                        result: Ok(offers),
                    };
                }
                Err(e) if e.is_cancelled() => {
                    last_error = e;
                    break;
                }
                Err(e) => {
                    debug!("{} attempt {} failed: {}", name, attempt, e);
                    last_error = e;
                }
            }
        }

        SourceOutcome {
            source: name,
            attempts,
            result: Err(last_error),
        }
    }

    fn record(&self, name: &str, result: &Result<Vec<Offer>, SourceError>, started: Instant) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        match result {
            Ok(_) => {
                metrics.record_success(name);
                metrics.record_response_time(name, started.elapsed().as_millis() as u64);
            }
            Err(e) if e.is_cancelled() => {}
            Err(_) => metrics.record_error(name),
        }
    }
}
