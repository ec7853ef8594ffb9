//! Generic HTTP source for suppliers exposing canonical offers

use super::traits::*;
use crate::config::{timeout_from_secs, SourceConfig};
use crate::results::Offer;
use crate::search::{Deadline, SearchRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct HttpOffers {
    #[serde(default)]
    flights: Vec<Offer>,
}

/// Source that queries `GET {base_url}/flights`
pub struct HttpSource {
    name: String,
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    /// Create a source with the default client settings
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(format!("flight-aggregator/{}", crate::VERSION))
            .build()?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout: Duration::from_secs(1),
        })
    }

    /// Create a source from its configuration entry
    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("source {} requires base_url", config.name))?;
        let mut source = Self::new(config.name.clone(), base_url)?;
        if let Some(seconds) = config.timeout {
            source.timeout = timeout_from_secs(seconds).ok_or_else(|| {
                anyhow::anyhow!("source {} has an unusable timeout: {}", config.name, seconds)
            })?;
        }
        Ok(source)
    }

    async fn request(&self, request: &SearchRequest) -> Result<Vec<Offer>, SourceError> {
        let url = format!("{}/flights", self.base_url);
        let passengers = request.passengers.to_string();

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(&[
                ("origin", request.origin.as_str()),
                ("destination", request.destination.as_str()),
                ("departure_date", request.departure_date.as_str()),
                ("passengers", passengers.as_str()),
                ("cabin_class", request.cabin_class.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http(status.as_u16()));
        }

        let body: HttpOffers = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        debug!("{} returned {} offers from {}", self.name, body.flights.len(), url);

        Ok(body
            .flights
            .into_iter()
            .map(|mut offer| {
                offer.provider = self.name.clone();
                offer
            })
            .collect())
    }
}

#[async_trait]
impl FlightSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> f64 {
        self.timeout.as_secs_f64()
    }

    async fn fetch_offers(
        &self,
        request: &SearchRequest,
        deadline: &Deadline,
    ) -> Result<Vec<Offer>, SourceError> {
        tokio::select! {
            _ = deadline.expired() => Err(SourceError::Cancelled),
            result = self.request(request) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn offer_json() -> serde_json::Value {
        json!({
            "id": "SQ938_1",
            "provider": "ignored",
            "airline": { "name": "Singapore Airlines", "code": "SQ" },
            "flight_number": "SQ938",
            "departure": { "airport": "CGK", "datetime": "2025-12-15T08:00:00+07:00", "timestamp": 1765760400 },
            "arrival": { "airport": "DPS", "datetime": "2025-12-15T11:00:00+08:00", "timestamp": 1765767600 },
            "price": { "amount": 2300000, "currency": "IDR" }
        })
    }

    #[tokio::test]
    async fn test_fetch_offers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flights"))
            .and(query_param("origin", "CGK"))
            .and(query_param("destination", "DPS"))
            .and(query_param("departure_date", "2025-12-15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "flights": [offer_json()] })))
            .mount(&server)
            .await;

        let source = HttpSource::new("Partner", server.uri()).unwrap();
        let request = SearchRequest::new("CGK", "DPS", "2025-12-15");
        let offers = source.fetch_offers(&request, &Deadline::never()).await.unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].provider, "Partner");
        assert_eq!(offers[0].flight_number, "SQ938");
        assert!(offers[0].duration.is_unset());
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flights"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpSource::new("Partner", server.uri()).unwrap();
        let request = SearchRequest::new("CGK", "DPS", "2025-12-15");
        let err = source.fetch_offers(&request, &Deadline::never()).await.unwrap_err();

        assert_eq!(err, SourceError::Http(503));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flights"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let source = HttpSource::new("Partner", server.uri()).unwrap();
        let request = SearchRequest::new("CGK", "DPS", "2025-12-15");
        let err = source.fetch_offers(&request, &Deadline::never()).await.unwrap_err();

        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_cancelled_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flights"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "flights": [] }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new("Partner", server.uri()).unwrap();
        let request = SearchRequest::new("CGK", "DPS", "2025-12-15");
        let deadline = Deadline::after(Duration::from_millis(50));
        let err = source.fetch_offers(&request, &deadline).await.unwrap_err();

        assert_eq!(err, SourceError::Cancelled);
    }

    #[test]
    fn test_from_config_requires_base_url() {
        let config = SourceConfig {
            name: "partner".to_string(),
            source: "http".to_string(),
            ..Default::default()
        };
        assert!(HttpSource::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_timeout() {
        let mut config = SourceConfig::new("partner", "http");
        config.base_url = Some("http://localhost:4000".to_string());

        config.timeout = Some(0.25);
        let source = HttpSource::from_config(&config).unwrap();
        assert_eq!(source.timeout(), 0.25);

        for bad in [-1.0, f64::INFINITY, 1e30] {
            config.timeout = Some(bad);
            assert!(HttpSource::from_config(&config).is_err(), "timeout {}", bad);
        }
    }
}
