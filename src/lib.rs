//! Flight aggregator: one ranked result list from many flight suppliers
//!
//! Searches fan out to every configured source under a deadline, the raw
//! offers go through a filter, dedupe and ranking pipeline, and responses
//! are cached for a fixed time.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod results;
pub mod search;
pub mod sources;
pub mod web;

pub use config::Settings;
pub use results::Offer;
pub use search::{Aggregator, Deadline, SearchError, SearchRequest, SearchResponse};
pub use sources::{FlightSource, SourceError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
