//! Search orchestration module
//!
//! Coordinates fan-out to every source under a deadline, merges their
//! offers and caches the resulting responses.

mod deadline;
mod error;
mod executor;
mod gateway;
mod models;

pub use deadline::Deadline;
pub use error::SearchError;
pub use executor::Aggregator;
pub use gateway::{GatewayReport, RetryPolicy, SourceGateway};
pub use models::*;
