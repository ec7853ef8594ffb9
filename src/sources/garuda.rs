//! Garuda Indonesia fixture source

use super::fixture::{decode, Simulation};
use super::traits::*;
use crate::config::SourceConfig;
use crate::results::{Airline, Baggage, FlightDuration, FlightEvent, Offer, Price};
use crate::search::{Deadline, SearchRequest};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

const FIXTURE: &str = include_str!("../../fixtures/garuda_indonesia.json");

#[derive(Debug, Deserialize)]
struct GarudaResponse {
    flights: Vec<GarudaFlight>,
}

#[derive(Debug, Deserialize)]
struct GarudaFlight {
    flight_id: String,
    airline: String,
    airline_code: String,
    departure: GarudaEvent,
    arrival: GarudaEvent,
    duration_minutes: i64,
    stops: u32,
    aircraft: Option<String>,
    price: GarudaPrice,
    available_seats: u32,
    #[serde(default)]
    fare_class: String,
    baggage: GarudaBaggage,
    #[serde(default)]
    amenities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GarudaEvent {
    airport: String,
    city: String,
    time: String,
}

#[derive(Debug, Deserialize)]
struct GarudaPrice {
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct GarudaBaggage {
    carry_on: u32,
    checked: u32,
}

/// Garuda Indonesia, nested departure/arrival records
pub struct GarudaIndonesia {
    simulation: Simulation,
}

impl GarudaIndonesia {
    pub fn new() -> Self {
        Self {
            simulation: Simulation::new(50, 100),
        }
    }

    fn convert(&self, flight: GarudaFlight) -> Option<Offer> {
        let departure = FlightEvent::parse(
            flight.departure.airport,
            flight.departure.city,
            &flight.departure.time,
        )?;
        let arrival = FlightEvent::parse(flight.arrival.airport, flight.arrival.city, &flight.arrival.time)?;

        Some(Offer {
            id: format!("{}_Garuda", flight.flight_id),
            provider: self.name().to_string(),
            airline: Airline::new(flight.airline, flight.airline_code),
            flight_number: flight.flight_id,
            departure,
            arrival,
            duration: FlightDuration::from_minutes(flight.duration_minutes),
            stops: flight.stops,
            price: Price::new(flight.price.amount, flight.price.currency),
            available_seats: flight.available_seats,
            cabin_class: flight.fare_class,
            aircraft: flight.aircraft,
            amenities: flight.amenities,
            baggage: Baggage {
                carry_on: format!("{} piece(s)", flight.baggage.carry_on),
                checked: format!("{} piece(s)", flight.baggage.checked),
            },
        })
    }

    /// Parse a raw Garuda response into offers
    pub fn parse(&self, raw: &str) -> Result<Vec<Offer>, SourceError> {
        let response: GarudaResponse = decode(raw)?;

        Ok(response
            .flights
            .into_iter()
            .filter_map(|flight| {
                let id = flight.flight_id.clone();
                let offer = self.convert(flight);
                if offer.is_none() {
                    warn!("Skipping Garuda flight {} with unreadable schedule", id);
                }
                offer
            })
            .collect())
    }
}

impl Default for GarudaIndonesia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightSource for GarudaIndonesia {
    fn name(&self) -> &str {
        "Garuda Indonesia"
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
