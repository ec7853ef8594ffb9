//! Search failure taxonomy

use super::models::SearchMetadata;
use crate::results::PipelineError;
use thiserror::Error;

/// Why a search call failed
///
/// Individual source failures never appear here; they are absorbed into
/// the response metadata.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(
        "Search cancelled: {} of {} sources succeeded before the deadline",
        metadata.providers_succeeded,
        metadata.providers_queried
    )]
    Cancelled { metadata: SearchMetadata },

    #[error("Merge pipeline failed: {source}")]
    Pipeline {
        source: PipelineError,
        metadata: SearchMetadata,
    },
}

impl SearchError {
    /// Metadata gathered before the failure, if the search got that far
    pub fn metadata(&self) -> Option<&SearchMetadata> {
        match self {
            Self::InvalidRequest(_) => None,
            Self::Cancelled { metadata } | Self::Pipeline { metadata, .. } => Some(metadata),
        }
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Cancelled { .. } => "cancelled",
            Self::Pipeline { .. } => "pipeline_failure",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
