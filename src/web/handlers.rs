//! HTTP request handlers

use super::state::AppState;
use crate::search::{Deadline, SearchError, SearchRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Search handler
///
/// Each request gets a fresh deadline of `search.request_timeout` seconds.
/// Bodies that fail to decode get the same error shape as invalid requests.
pub async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return SearchError::InvalidRequest(rejection.body_text()).into_response(),
    };
    let deadline = Deadline::after(state.settings.search.request_timeout());

    match state.aggregator.search(&request, &deadline).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = match &self {
            SearchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SearchError::Cancelled { .. } => StatusCode::GATEWAY_TIMEOUT,
            SearchError::Pipeline { .. } => {
                error!("Search failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "metadata": self.metadata(),
        });

        (status, Json(body)).into_response()
    }
}

/// Source and cache statistics
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "instance_name": state.instance_name(),
        "sources": state.aggregator.registry().names(),
        "cache_entries": state.aggregator.cache().len(),
        "metrics": state.metrics.snapshot(),
    }))
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "instance_name": state.instance_name(),
    }))
}
