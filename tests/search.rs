use flight_aggregator::cache::ResultCache;
use flight_aggregator::config::Settings;
use flight_aggregator::search::{Aggregator, Deadline, SearchError, SearchRequest};
use flight_aggregator::sources::SourceLoader;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Default settings with AirAsia's random failures switched off
fn settings() -> Settings {
    let mut settings = Settings::default();
    for source in &mut settings.sources {
        source.failure_rate = Some(0.0);
    }
    settings
}

fn aggregator(settings: &Settings) -> Aggregator {
    let registry = SourceLoader::load(settings).unwrap();
    let cache = Arc::new(ResultCache::new(
        settings.cache.max_entries,
        settings.cache.ttl(),
    ));
    Aggregator::from_settings(settings, Arc::new(registry), cache)
}

fn cgk_to_dps() -> SearchRequest {
    SearchRequest::new("CGK", "DPS", "2025-12-15")
}

fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(2))
}

#[tokio::test(start_paused = true)]
async fn test_all_sources_succeed() {
    let aggregator = aggregator(&settings());
    let response = aggregator.search(&cgk_to_dps(), &deadline()).await.unwrap();

    let metadata = &response.metadata;
    assert_eq!(metadata.providers_queried, 4);
    assert_eq!(metadata.providers_succeeded, 4);
    assert_eq!(metadata.providers_failed, 0);
    assert!(!metadata.cache_hit);
    assert_eq!(metadata.total_results, 11);
    assert_eq!(response.flights.len(), 11);

    for offer in &response.flights {
        assert_eq!(offer.departure.airport, "CGK");
        assert_eq!(offer.arrival.airport, "DPS");
        assert!(offer.duration.total_minutes > 0);
    }

    // Lion Air's two JT25 fares collapse to the promo fare
    let jt25: Vec<_> = response
        .flights
        .iter()
        .filter(|o| o.flight_number == "JT25")
        .collect();
    assert_eq!(jt25.len(), 1);
    assert_eq!(jt25[0].price.amount, 880_000);

    let keys: HashSet<_> = response.flights.iter().map(|o| o.dedup_key()).collect();
    assert_eq!(keys.len(), response.flights.len());
}

#[tokio::test(start_paused = true)]
async fn test_default_order_is_best_value() {
    let aggregator = aggregator(&settings());
    let response = aggregator.search(&cgk_to_dps(), &deadline()).await.unwrap();

    let scores: Vec<i64> = response
        .flights
        .iter()
        .map(|o| flight_aggregator::results::best_value_score(o).unwrap())
        .collect();
    assert!(scores.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_search_hits_cache() {
    let aggregator = aggregator(&settings());

    let first = aggregator.search(&cgk_to_dps(), &deadline()).await.unwrap();
    let second = aggregator.search(&cgk_to_dps(), &deadline()).await.unwrap();

    assert!(!first.metadata.cache_hit);
    assert!(second.metadata.cache_hit);
    assert_eq!(second.metadata.total_results, first.metadata.total_results);
    assert_eq!(second.flights, first.flights);
}

#[tokio::test(start_paused = true)]
async fn test_cache_expires_after_ttl() {
    let mut settings = settings();
    settings.cache.ttl_seconds = 60;
    let aggregator = aggregator(&settings);

    aggregator.search(&cgk_to_dps(), &deadline()).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;

    let response = aggregator.search(&cgk_to_dps(), &deadline()).await.unwrap();
    assert!(!response.metadata.cache_hit);
}

#[tokio::test(start_paused = true)]
async fn test_expired_deadline_is_cancelled() {
    let aggregator = aggregator(&settings());
    let expired = Deadline::never();
    expired.cancel();

    let err = aggregator.search(&cgk_to_dps(), &expired).await.unwrap_err();
    assert!(err.is_cancelled());

    let metadata = err.metadata().unwrap();
    assert_eq!(metadata.providers_succeeded, 0);
    assert_eq!(metadata.providers_failed, metadata.providers_queried);
    assert_eq!(metadata.total_results, 0);
    assert!(aggregator.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_during_fetch_keeps_counts() {
    let mut settings = settings();
    let batik = settings
        .sources
        .iter_mut()
        .find(|s| s.source == "batik_air")
        .unwrap();
    batik.min_latency_ms = Some(5_000);
    batik.max_latency_ms = Some(5_000);
    let aggregator = aggregator(&settings);

    let started = tokio::time::Instant::now();
    let err = aggregator
        .search(&cgk_to_dps(), &Deadline::after(Duration::from_secs(1)))
        .await
        .unwrap_err();

    assert!(started.elapsed() <= Duration::from_secs(1));
    match err {
        SearchError::Cancelled { metadata } => {
            assert_eq!(metadata.providers_queried, 4);
            assert_eq!(metadata.providers_succeeded, 3);
            assert_eq!(metadata.providers_failed, 1);
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
    assert!(aggregator.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failing_source_is_absorbed() {
    let mut settings = settings();
    settings.sources[1].failure_rate = Some(1.0);
    let aggregator = aggregator(&settings);

    let response = aggregator.search(&cgk_to_dps(), &deadline()).await.unwrap();
    assert_eq!(response.metadata.providers_succeeded, 3);
    assert_eq!(response.metadata.providers_failed, 1);
    assert!(response.flights.iter().all(|o| o.provider != "AirAsia"));
}

#[tokio::test(start_paused = true)]
async fn test_combined_filters() {
    let aggregator = aggregator(&settings());
    let request = cgk_to_dps()
        .with_price_range(Some(1_000_000), None)
        .with_stop_range(None, Some(0))
        .with_airlines(vec!["Garuda Indonesia".to_string()])
        .with_duration_range(Some(100), Some(200));

    let response = aggregator.search(&request, &deadline()).await.unwrap();

    let flights: Vec<&str> = response
        .flights
        .iter()
        .map(|o| o.flight_number.as_str())
        .collect();
    assert_eq!(flights.len(), 2);
    assert!(flights.contains(&"GA400"));
    assert!(flights.contains(&"GA410"));

    for offer in &response.flights {
        assert!(offer.price.amount >= 1_000_000);
        assert_eq!(offer.stops, 0);
        assert_eq!(offer.airline.name, "Garuda Indonesia");
        assert!((100..=200).contains(&offer.duration.total_minutes));
    }
}

#[tokio::test(start_paused = true)]
async fn test_sort_by_price() {
    let aggregator = aggregator(&settings());
    let asc = aggregator
        .search(&cgk_to_dps().with_sort_by("price_asc"), &deadline())
        .await
        .unwrap();
    let desc = aggregator
        .search(&cgk_to_dps().with_sort_by("price_desc"), &deadline())
        .await
        .unwrap();

    let prices: Vec<i64> = asc.flights.iter().map(|o| o.price.amount).collect();
    assert!(prices.windows(2).all(|pair| pair[0] <= pair[1]));
    let prices: Vec<i64> = desc.flights.iter().map(|o| o.price.amount).collect();
    assert!(prices.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_sort_keeps_ranked_order() {
    let aggregator = aggregator(&settings());
    let ranked = aggregator.search(&cgk_to_dps(), &deadline()).await.unwrap();
    let unknown = aggregator
        .search(&cgk_to_dps().with_sort_by("cheapest"), &deadline())
        .await
        .unwrap();

    assert!(!unknown.metadata.cache_hit);
    assert_eq!(unknown.flights, ranked.flights);
}
