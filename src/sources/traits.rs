//! Source traits and types

use crate::config::SourceConfig;
use crate::results::Offer;
use crate::search::{Deadline, SearchRequest};
use async_trait::async_trait;
use thiserror::Error;

/// Why a single source call failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Request timed out")]
    Timeout,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Cancelled by deadline")]
    Cancelled,
}

impl SourceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A supplier of flight offers
///
/// Implementations may be backed by anything (HTTP, fixtures, queues). They
/// must stop promptly and return [`SourceError::Cancelled`] once the deadline
/// expires.
#[async_trait]
pub trait FlightSource: Send + Sync {
    /// Source name, reported as the provider of its offers
    fn name(&self) -> &str;

    /// Default per-attempt timeout in seconds
    fn timeout(&self) -> f64 {
        1.0
    }

    /// Fetch offers for a request
    async fn fetch_offers(
        &self,
        request: &SearchRequest,
        deadline: &Deadline,
    ) -> Result<Vec<Offer>, SourceError>;

    /// Optional initialization from configuration (called once on load)
    fn init(&mut self, _config: &SourceConfig) -> anyhow::Result<()> {
        Ok(())
    }
}
