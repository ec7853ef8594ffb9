//! Source registry for managing configured suppliers

use super::traits::FlightSource;
use crate::config::SourceConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all sources a search fans out to
pub struct SourceRegistry {
    /// Sources in registration order
    sources: Vec<Arc<dyn FlightSource>>,
    /// Source configurations by name
    configs: HashMap<String, SourceConfig>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            configs: HashMap::new(),
        }
    }

    /// Register a source, replacing any source with the same name
    pub fn register(&mut self, source: Arc<dyn FlightSource>, config: SourceConfig) {
        let name = source.name().to_string();
        self.sources.retain(|existing| existing.name() != name);
        self.sources.push(source);
        self.configs.insert(name, config);
    }

    /// Get a source by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn FlightSource>> {
        self.sources.iter().find(|source| source.name() == name)
    }

    /// Get source config
    pub fn get_config(&self, name: &str) -> Option<&SourceConfig> {
        self.configs.get(name)
    }

    /// Iterate sources in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn FlightSource>> {
        self.sources.iter()
    }

    /// Get all source names
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Get number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Get effective per-attempt timeout for a source
    pub fn get_timeout(&self, name: &str, default: f64) -> f64 {
        self.configs
            .get(name)
            .and_then(|c| c.timeout)
            .or_else(|| self.get(name).map(|s| s.timeout()))
            .unwrap_or(default)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
