//! Offer data model and the merge pipeline
//!
//! Every source converts its own format into [`Offer`]s; the pipeline turns
//! the combined raw offers into one filtered, deduplicated, ranked list.

mod merge;
mod types;

pub use merge::*;
pub use types::*;
