//! Search execution and orchestration

use super::error::SearchError;
use super::gateway::{RetryPolicy, SourceGateway};
use super::models::{SearchMetadata, SearchRequest, SearchResponse};
use super::Deadline;
use crate::cache::ResultCache;
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::results::merge_offers;
use crate::sources::SourceRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Search orchestrator: cache, fan-out, merge, store
pub struct Aggregator {
    gateway: SourceGateway,
    cache: Arc<ResultCache<SearchResponse>>,
    metrics: Option<Arc<Metrics>>,
}

impl Aggregator {
    /// Create an aggregator over a registry and an injected cache
    pub fn new(registry: Arc<SourceRegistry>, cache: Arc<ResultCache<SearchResponse>>) -> Self {
        Self {
            gateway: SourceGateway::new(registry),
            cache,
            metrics: None,
        }
    }

    /// Build an aggregator from the search section of the settings
    pub fn from_settings(
        settings: &Settings,
        registry: Arc<SourceRegistry>,
        cache: Arc<ResultCache<SearchResponse>>,
    ) -> Self {
        Self::new(registry, cache)
            .with_retry_policy(RetryPolicy::new(
                settings.search.max_retries,
                settings.search.retry_backoff(),
            ))
            .with_source_timeout(settings.search.source_timeout())
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.gateway = self.gateway.with_retry_policy(retry);
        self
    }

    /// Set the default per-attempt source timeout
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.gateway = self.gateway.with_source_timeout(timeout);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.gateway = self.gateway.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &ResultCache<SearchResponse> {
        &self.cache
    }

    pub fn registry(&self) -> &SourceRegistry {
        self.gateway.registry()
    }

    /// Answer a request from cache or by querying every source
    ///
    /// Source failures are reported in the metadata. A deadline that expires
    /// before or during the fetch fails the call, as does a merge stage that
    /// cannot complete; failed calls are never cached.
    pub async fn search(
        &self,
        request: &SearchRequest,
        deadline: &Deadline,
    ) -> Result<SearchResponse, SearchError> {
        let search_id = Uuid::new_v4();
        let span = info_span!(
            "search",
            id = %search_id,
            origin = %request.origin,
            destination = %request.destination,
            date = %request.departure_date,
        );
        self.execute(request, deadline).instrument(span).await
    }

    async fn execute(
        &self,
        request: &SearchRequest,
        deadline: &Deadline,
    ) -> Result<SearchResponse, SearchError> {
        let start = Instant::now();
        if let Some(metrics) = &self.metrics {
            metrics.inc_search();
        }

        request.validate().map_err(SearchError::InvalidRequest)?;

        let key = request.cache_key();
        if let Some(mut cached) = self.cache.get(&key) {
            if let Some(metrics) = &self.metrics {
                metrics.record_cache_hit();
            }
            cached.metadata.cache_hit = true;
            cached.metadata.search_time_ms = elapsed_ms(start);
            cached.search_criteria = request.clone();
            info!("Cache hit, {} results", cached.metadata.total_results);
            return Ok(cached);
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_miss();
        }

        let queried = self.gateway.source_count();
        let metadata = |succeeded: usize, failed: usize| SearchMetadata {
            total_results: 0,
            providers_queried: queried,
            providers_succeeded: succeeded,
            providers_failed: failed,
            search_time_ms: elapsed_ms(start),
            cache_hit: false,
        };

        if deadline.is_expired() {
            warn!("Deadline expired before fetching");
            return Err(SearchError::Cancelled {
                metadata: metadata(0, queried),
            });
        }

        let report = self.gateway.fetch_all(request, deadline).await;
        if report.cancelled || deadline.is_expired() {
            warn!(
                "Deadline expired during fetch ({} of {} sources succeeded)",
                report.succeeded, queried
            );
            return Err(SearchError::Cancelled {
                metadata: metadata(report.succeeded, queried - report.succeeded),
            });
        }

        let offers = merge_offers(report.offers, request).map_err(|source| {
            warn!("Merge pipeline failed: {}", source);
            SearchError::Pipeline {
                source,
                metadata: metadata(report.succeeded, report.failed),
            }
        })?;

        let response = SearchResponse {
            search_criteria: request.clone(),
            metadata: SearchMetadata {
                total_results: offers.len(),
                ..metadata(report.succeeded, report.failed)
            },
            flights: offers,
        };

        self.cache.insert(key, response.clone());
        debug!("Stored response in cache");

        info!(
            "Found {} results from {}/{} sources in {}ms",
            response.metadata.total_results,
            response.metadata.providers_succeeded,
            queried,
            response.metadata.search_time_ms
        );

        Ok(response)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
