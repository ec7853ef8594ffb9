//! Lion Air fixture source

use super::fixture::{decode, Simulation};
use super::traits::*;
use crate::config::SourceConfig;
use crate::results::{Airline, Baggage, FlightDuration, FlightEvent, Offer, Price};
use crate::search::{Deadline, SearchRequest};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

const FIXTURE: &str = include_str!("../../fixtures/lion_air.json");

#[derive(Debug, Deserialize)]
struct LionResponse {
    success: bool,
    data: LionData,
}

#[derive(Debug, Deserialize)]
struct LionData {
    available_flights: Vec<LionFlight>,
}

#[derive(Debug, Deserialize)]
struct LionFlight {
    id: String,
    flight_number: String,
    carrier: LionCarrier,
    route: LionRoute,
    schedule: LionSchedule,
    flight_time: i64,
    is_direct: bool,
    #[serde(default)]
    stop_count: u32,
    pricing: LionPricing,
    seats_left: u32,
    plane_type: Option<String>,
    services: LionServices,
}

#[derive(Debug, Deserialize)]
struct LionCarrier {
    name: String,
    iata: String,
}

#[derive(Debug, Deserialize)]
struct LionRoute {
    from: LionAirport,
    to: LionAirport,
}

#[derive(Debug, Deserialize)]
struct LionAirport {
    code: String,
    #[serde(default)]
    city: String,
}

#[derive(Debug, Deserialize)]
struct LionSchedule {
    departure: String,
    arrival: String,
}

#[derive(Debug, Deserialize)]
struct LionPricing {
    total: i64,
    currency: String,
    fare_type: String,
}

#[derive(Debug, Deserialize)]
struct LionServices {
    wifi_available: bool,
    meals_included: bool,
    baggage_allowance: LionBaggage,
}

#[derive(Debug, Deserialize)]
struct LionBaggage {
    cabin: String,
    hold: String,
}

/// Lion Air, wrapped response with one record per fare
pub struct LionAir {
    simulation: Simulation,
}

impl LionAir {
    pub fn new() -> Self {
        Self {
            simulation: Simulation::new(100, 200),
        }
    }

    fn convert(&self, flight: LionFlight) -> Option<Offer> {
        let departure = FlightEvent::parse(flight.route.from.code, flight.route.from.city, &flight.schedule.departure)?;
        let arrival = FlightEvent::parse(flight.route.to.code, flight.route.to.city, &flight.schedule.arrival)?;

        let mut amenities = Vec::new();
        if flight.services.wifi_available {
            amenities.push("wifi".to_string());
        }
        if flight.services.meals_included {
            amenities.push("meal".to_string());
        }

        Some(Offer {
            id: format!("{}_LionAir", flight.id),
            provider: self.name().to_string(),
            airline: Airline::new(flight.carrier.name, flight.carrier.iata),
            flight_number: flight.flight_number,
            departure,
            arrival,
            duration: FlightDuration::from_minutes(flight.flight_time),
            stops: if flight.is_direct { 0 } else { flight.stop_count.max(1) },
            price: Price::new(flight.pricing.total, flight.pricing.currency),
            available_seats: flight.seats_left,
            cabin_class: flight.pricing.fare_type.to_lowercase(),
            aircraft: flight.plane_type,
            amenities,
            baggage: Baggage {
                carry_on: flight.services.baggage_allowance.cabin,
                checked: flight.services.baggage_allowance.hold,
            },
        })
    }

    /// Parse a raw Lion Air response into offers
    pub fn parse(&self, raw: &str) -> Result<Vec<Offer>, SourceError> {
        let response: LionResponse = decode(raw)?;
        if !response.success {
            return Err(SourceError::Unavailable("Lion Air reported failure".to_string()));
        }

        Ok(response
            .data
            .available_flights
            .into_iter()
            .filter_map(|flight| {
                let id = flight.id.clone();
                let offer = self.convert(flight);
                if offer.is_none() {
                    warn!("Skipping Lion Air fare {} with unreadable schedule", id);
                }
                offer
            })
            .collect())
    }
}

impl Default for LionAir {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightSource for LionAir {
    fn name(&self) -> &str {
        "Lion Air"
    }

    async fn fetch_offers(
        &self,
        _request: &SearchRequest,
        deadline: &Deadline,
    ) -> Result<Vec<Offer>, SourceError> {
        self.simulation.run(self.name(), deadline).await?;
        self.parse(FIXTURE)
    }

    fn init(&mut self, config: &SourceConfig) -> anyhow::Result<()> {
        self.simulation.configure(config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixture() {
        let offers = LionAir::new().parse(FIXTURE).unwrap();
        assert_eq!(offers.len(), 4);

        let promo = &offers[1];
        assert_eq!(promo.id, "JT25-PROMO_LionAir");
        assert_eq!(promo.flight_number, "JT25");
        assert_eq!(promo.price.amount, 880_000);
        assert_eq!(promo.cabin_class, "economy");
        assert_eq!(promo.dedup_key(), offers[0].dedup_key());

        let jt650 = &offers[2];
        assert_eq!(jt650.stops, 1);
        assert_eq!(jt650.amenities, vec!["meal".to_string()]);
    }

    #[test]
    fn test_parse_reported_failure() {
        let raw = r#"{"success": false, "data": {"available_flights": []}}"#;
        let err = LionAir::new().parse(raw).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }
}
