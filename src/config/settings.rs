//! Settings structures for flight aggregator configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest timeout any setting may ask for, in seconds
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Convert configured seconds into a duration
///
/// `None` for values that are not finite, not positive, or above
/// [`MAX_TIMEOUT_SECS`].
pub fn timeout_from_secs(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_TIMEOUT_SECS {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

/// Main settings structure loaded from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub cache: CacheSettings,
    pub sources: Vec<SourceConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            search: SearchSettings::default(),
            cache: CacheSettings::default(),
            sources: default_sources(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject timeouts and failure rates the search path cannot use
    pub fn validate(&self) -> Result<()> {
        check_timeout("search.request_timeout", self.search.request_timeout)?;
        check_timeout("search.source_timeout", self.search.source_timeout)?;

        for source in &self.sources {
            if let Some(timeout) = source.timeout {
                check_timeout(&format!("sources.{}.timeout", source.name), timeout)?;
            }
            if let Some(rate) = source.failure_rate {
                if !(0.0..=1.0).contains(&rate) {
                    bail!(
                        "sources.{}.failure_rate must be between 0 and 1, got {}",
                        source.name,
                        rate
                    );
                }
            }
        }

        Ok(())
    }

    /// Merge with environment variables (FLIGHTS_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("FLIGHTS_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(port) = var("FLIGHTS_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("FLIGHTS_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(ttl) = var("FLIGHTS_CACHE_TTL").and_then(|v| v.parse().ok()) {
            self.cache.ttl_seconds = ttl;
        }
        if let Some(capacity) = var("FLIGHTS_CACHE_CAPACITY").and_then(|v| v.parse().ok()) {
            self.cache.max_entries = capacity;
        }
        if let Some(timeout) = var("FLIGHTS_REQUEST_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.search.request_timeout = timeout;
        }
    }

    /// Get source config by name
    pub fn get_source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Get all enabled sources
    pub fn enabled_sources(&self) -> Vec<&SourceConfig> {
        self.sources.iter().filter(|s| !s.disabled).collect()
    }
}

fn check_timeout(field: &str, seconds: f64) -> Result<()> {
    if timeout_from_secs(seconds).is_none() {
        bail!(
            "{} must be a positive number of seconds up to {}, got {}",
            field,
            MAX_TIMEOUT_SECS,
            seconds
        );
    }
    Ok(())
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the health endpoint
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "flight-aggregator".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Search behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Deadline for a whole search in seconds
    pub request_timeout: f64,
    /// Default timeout for one source attempt in seconds
    pub source_timeout: f64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Back-off unit between attempts; attempt `n` waits `n` units
    pub retry_backoff_ms: u64,
}

impl SearchSettings {
    /// Caller deadline for one search; unusable values fall back to the default
    pub fn request_timeout(&self) -> Duration {
        timeout_from_secs(self.request_timeout).unwrap_or(Duration::from_secs(2))
    }

    /// Default attempt timeout; unusable values fall back to the default
    pub fn source_timeout(&self) -> Duration {
        timeout_from_secs(self.source_timeout).unwrap_or(Duration::from_secs(1))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            request_timeout: 2.0,
            source_timeout: 1.0,
            max_retries: 2,
            retry_backoff_ms: 100,
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of cached responses
    pub max_entries: usize,
    /// Lifetime of a cached response in seconds
    pub ttl_seconds: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl_seconds: 300,
        }
    }
}

/// Individual source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source name (unique identifier)
    pub name: String,
    /// Source kind to instantiate
    pub source: String,
    /// Whether source is disabled
    pub disabled: bool,
    /// Custom per-attempt timeout in seconds
    pub timeout: Option<f64>,
    /// Simulated latency lower bound (fixture sources)
    pub min_latency_ms: Option<u64>,
    /// Simulated latency upper bound (fixture sources)
    pub max_latency_ms: Option<u64>,
    /// Simulated failure probability (fixture sources)
    pub failure_rate: Option<f64>,
    /// Base URL (http sources)
    pub base_url: Option<String>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            ..Default::default()
        }
    }
}

/// Default source configurations
fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("garuda", "garuda_indonesia"),
        SourceConfig::new("airasia", "airasia"),
        SourceConfig::new("lion_air", "lion_air"),
        SourceConfig::new("batik_air", "batik_air"),
    ]
}
