//! Application state shared across handlers

use crate::cache::ResultCache;
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::search::Aggregator;
use crate::sources::SourceRegistry;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search orchestrator
    pub aggregator: Arc<Aggregator>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, registry: SourceRegistry) -> Self {
        let metrics = Arc::new(Metrics::new());
        let cache = Arc::new(ResultCache::new(
            settings.cache.max_entries,
            settings.cache.ttl(),
        ));
        let aggregator = Aggregator::from_settings(&settings, Arc::new(registry), cache)
            .with_metrics(metrics.clone());

        Self {
            settings: Arc::new(settings),
            aggregator: Arc::new(aggregator),
            metrics,
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
