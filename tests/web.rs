use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use flight_aggregator::config::Settings;
use flight_aggregator::sources::SourceLoader;
use flight_aggregator::web::{create_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn spawn_app(settings: Settings) -> Router {
    let registry = SourceLoader::load(&settings).unwrap();
    create_router(AppState::new(settings, registry))
}

fn default_app() -> Router {
    let mut settings = Settings::default();
    for source in &mut settings.sources {
        source.failure_rate = Some(0.0);
        source.min_latency_ms = Some(0);
        source.max_latency_ms = Some(5);
    }
    spawn_app(settings)
}

fn post_search(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/search")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = default_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_search_and_stats() {
    let app = default_app();

    let response = app
        .clone()
        .oneshot(post_search(json!({
            "origin": "CGK",
            "destination": "DPS",
            "departure_date": "2025-12-15",
            "sort_by": "price_asc"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["metadata"]["total_results"], 11);
    assert_eq!(body["metadata"]["providers_succeeded"], 4);
    assert_eq!(body["metadata"]["cache_hit"], false);
    assert_eq!(body["search_criteria"]["passengers"], 1);
    assert_eq!(body["flights"].as_array().unwrap().len(), 11);

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["metrics"]["total_searches"], 1);
    assert_eq!(body["metrics"]["cache_misses"], 1);
    assert_eq!(body["cache_entries"], 1);
    assert_eq!(body["sources"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_invalid_request_is_bad_request() {
    let response = default_app()
        .oneshot(post_search(json!({
            "origin": "CGK",
            "destination": "DPS",
            "departure_date": "15-12-2025"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_request");
    assert!(body["metadata"].is_null());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let bodies = [
        ("application/json", "{\"origin\": \"CGK\","),
        ("application/json", "{\"origin\": \"CGK\", \"destination\": \"DPS\"}"),
        ("application/json", "{\"origin\": \"CGK\", \"destination\": \"DPS\", \"departure_date\": \"2025-12-15\", \"passengers\": \"two\"}"),
        ("text/plain", "origin=CGK"),
    ];

    for (content_type, raw) in bodies {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/search")
            .header("content-type", content_type)
            .body(Body::from(raw))
            .unwrap();
        let response = default_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", raw);
        let body = json_body(response).await;
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
        assert!(body["metadata"].is_null());
    }
}

#[tokio::test]
async fn test_timeout_is_gateway_timeout() {
    let mut settings = Settings::default();
    settings.search.request_timeout = 0.05;
    for source in &mut settings.sources {
        source.min_latency_ms = Some(10_000);
        source.max_latency_ms = Some(10_000);
    }
    let app = spawn_app(settings);

    let response = app
        .oneshot(post_search(json!({
            "origin": "CGK",
            "destination": "DPS",
            "departure_date": "2025-12-15"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = json_body(response).await;
    assert_eq!(body["error"], "cancelled");
    assert_eq!(body["metadata"]["providers_queried"], 4);
    assert_eq!(body["metadata"]["providers_failed"], 4);
}
