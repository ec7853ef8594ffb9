//! AirAsia fixture source

use super::fixture::{decode, Simulation};
use super::traits::*;
use crate::config::SourceConfig;
use crate::results::{Airline, Baggage, FlightDuration, FlightEvent, Offer, Price};
use crate::search::{Deadline, SearchRequest};
use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;
use tracing::warn;

const FIXTURE: &str = include_str!("../../fixtures/airasia.json");

#[derive(Debug, Deserialize)]
struct AirAsiaResponse {
    flights: Vec<AirAsiaFlight>,
}

#[derive(Debug, Deserialize)]
struct AirAsiaFlight {
    flight_code: String,
    #[serde(default = "default_airline")]
    airline: String,
    from_airport: String,
    to_airport: String,
    depart_time: String,
    arrive_time: String,
    duration_hours: f64,
    direct_flight: bool,
    #[serde(default)]
    stops: Vec<IgnoredAny>,
    price_idr: i64,
    seats: u32,
    #[serde(default)]
    cabin_class: String,
    #[serde(default)]
    baggage_note: String,
}

fn default_airline() -> String {
    "AirAsia".to_string()
}

/// AirAsia, flat records with fractional-hour durations
pub struct AirAsia {
    simulation: Simulation,
}

impl AirAsia {
    pub fn new() -> Self {
        Self {
            simulation: Simulation::new(50, 150).with_failure_rate(0.1),
        }
    }

    fn convert(&self, flight: AirAsiaFlight) -> Option<Offer> {
        let departure = FlightEvent::parse(flight.from_airport, "", &flight.depart_time)?;
        let arrival = FlightEvent::parse(flight.to_airport, "", &flight.arrive_time)?;

        let stops = if flight.direct_flight {
            0
        } else {
            (flight.stops.len() as u32).max(1)
        };
        let code = flight
            .flight_code
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .to_string();

        Some(Offer {
            id: format!("{}_AirAsia", flight.flight_code),
            provider: self.name().to_string(),
            airline: Airline::new(flight.airline, code),
            flight_number: flight.flight_code,
            departure,
            arrival,
            duration: FlightDuration::from_minutes((flight.duration_hours * 60.0).round() as i64),
            stops,
            price: Price::new(flight.price_idr, "IDR"),
            available_seats: flight.seats,
            cabin_class: flight.cabin_class,
            aircraft: None,
            amenities: vec![],
            baggage: Baggage {
                carry_on: "Included".to_string(),
                checked: flight.baggage_note,
            },
        })
    }

    /// Parse a raw AirAsia response into offers
    pub fn parse(&self, raw: &str) -> Result<Vec<Offer>, SourceError> {
        let response: AirAsiaResponse = decode(raw)?;

        Ok(response
            .flights
            .into_iter()
            .filter_map(|flight| {
                let code = flight.flight_code.clone();
                let offer = self.convert(flight);
                if offer.is_none() {
                    warn!("Skipping AirAsia flight {} with unreadable schedule", code);
                }
                offer
            })
            .collect())
    }
}

impl Default for AirAsia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightSource for AirAsia {
    fn name(&self) -> &str {
        "AirAsia"
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
