//! Source loader for initializing suppliers from configuration

use super::registry::SourceRegistry;
use super::traits::FlightSource;
use super::{airasia, batik_air, garuda, http, lion_air};
use crate::config::{Settings, SourceConfig};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing sources from configuration
pub struct SourceLoader;

impl SourceLoader {
    /// Load all sources from settings
    pub fn load(settings: &Settings) -> Result<SourceRegistry> {
        let mut registry = SourceRegistry::new();

        for config in &settings.sources {
            if config.disabled {
                info!("Skipping disabled source: {}", config.name);
                continue;
            }

            match Self::create_source(&config.source, config) {
                Ok(source) => {
                    info!("Loaded source: {} ({})", source.name(), config.source);
                    registry.register(source, config.clone());
                }
                Err(e) => {
                    warn!("Failed to load source {}: {}", config.name, e);
                }
            }
        }

        info!("Loaded {} sources", registry.len());
        Ok(registry)
    }

    /// Create a source instance by kind
    fn create_source(kind: &str, config: &SourceConfig) -> Result<Arc<dyn FlightSource>> {
        let mut source: Box<dyn FlightSource> = match kind {
            "garuda_indonesia" => Box::new(garuda::GarudaIndonesia::new()),
            "airasia" => Box::new(airasia::AirAsia::new()),
            "lion_air" => Box::new(lion_air::LionAir::new()),
            "batik_air" => Box::new(batik_air::BatikAir::new()),
            "http" => Box::new(http::HttpSource::from_config(config)?),
            _ => {
                return Err(anyhow::anyhow!(
                    "Unknown source type: {} (available: {})",
                    kind,
                    Self::available_sources().join(", ")
                ));
            }
        };

        source.init(config)?;

        Ok(Arc::from(source))
    }

    /// Get list of available source kinds
    pub fn available_sources() -> Vec<&'static str> {
        vec!["garuda_indonesia", "airasia", "lion_air", "batik_air", "http"]
    }
}
