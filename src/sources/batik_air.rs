//! Batik Air fixture source

use super::fixture::{decode, Simulation};
use super::traits::*;
use crate::config::SourceConfig;
use crate::results::{Airline, Baggage, FlightDuration, FlightEvent, Offer, Price};
use crate::search::{Deadline, SearchRequest};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

const FIXTURE: &str = include_str!("../../fixtures/batik_air.json");

#[derive(Debug, Deserialize)]
struct BatikResponse {
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    results: Vec<BatikFlight>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatikFlight {
    flight_number: String,
    airline_name: String,
    #[serde(rename = "airlineIATA")]
    airline_iata: String,
    origin: String,
    destination: String,
    departure_date_time: String,
    arrival_date_time: String,
    /// "1h 45m"; missing for some itineraries
    travel_time: Option<String>,
    number_of_stops: u32,
    fare: BatikFare,
    seats_available: u32,
    aircraft_model: Option<String>,
    #[serde(default)]
    baggage_info: String,
    #[serde(default)]
    onboard_services: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatikFare {
    total_price: i64,
    currency_code: String,
    class: String,
}

/// Batik Air, camel-cased records with textual travel times
pub struct BatikAir {
    simulation: Simulation,
}

impl BatikAir {
    pub fn new() -> Self {
        Self {
            simulation: Simulation::new(200, 400),
        }
    }

    fn convert(&self, flight: BatikFlight) -> Option<Offer> {
        let departure = FlightEvent::parse(flight.origin, "", &flight.departure_date_time)?;
        let arrival = FlightEvent::parse(flight.destination, "", &flight.arrival_date_time)?;

        // Unreadable travel times are left at zero for the pipeline to fill
        let duration = flight
            .travel_time
            .as_deref()
            .and_then(parse_travel_time)
            .map(FlightDuration::from_minutes)
            .unwrap_or_default();

        Some(Offer {
            id: format!("{}_Batik", flight.flight_number),
            provider: self.name().to_string(),
            airline: Airline::new(flight.airline_name, flight.airline_iata),
            flight_number: flight.flight_number,
            departure,
            arrival,
            duration,
            stops: flight.number_of_stops,
            price: Price::new(flight.fare.total_price, flight.fare.currency_code),
            available_seats: flight.seats_available,
            cabin_class: cabin_for_class(&flight.fare.class),
            aircraft: flight.aircraft_model,
            amenities: flight.onboard_services,
            baggage: parse_baggage(&flight.baggage_info),
        })
    }

    /// Parse a raw Batik Air response into offers
    pub fn parse(&self, raw: &str) -> Result<Vec<Offer>, SourceError> {
        let response: BatikResponse = decode(raw)?;
        if response.code != 200 {
            return Err(SourceError::Unavailable(format!(
                "Batik Air returned {}: {}",
                response.code, response.message
            )));
        }

        Ok(response
            .results
            .into_iter()
            .filter_map(|flight| {
                let number = flight.flight_number.clone();
                let offer = self.convert(flight);
                if offer.is_none() {
                    warn!("Skipping Batik Air flight {} with unreadable schedule", number);
                }
                offer
            })
            .collect())
    }
}

/// Parse "1h 45m", "2h" or "55m" into minutes
fn parse_travel_time(text: &str) -> Option<i64> {
    let mut minutes = 0;
    let mut seen = false;

    for part in text.split_whitespace() {
        if let Some(hours) = part.strip_suffix('h') {
            minutes += hours.parse::<i64>().ok()? * 60;
        } else if let Some(mins) = part.strip_suffix('m') {
            minutes += mins.parse::<i64>().ok()?;
        } else {
            return None;
        }
        seen = true;
    }

    seen.then_some(minutes)
}

/// Split "7kg cabin, 20kg checked" into its two allowances
fn parse_baggage(info: &str) -> Baggage {
    let mut baggage = Baggage::default();
    for part in info.split(',').map(str::trim) {
        if let Some(cabin) = part.strip_suffix("cabin") {
            baggage.carry_on = cabin.trim().to_string();
        } else if let Some(checked) = part.strip_suffix("checked") {
            baggage.checked = checked.trim().to_string();
        }
    }
    baggage
}

fn cabin_for_class(class: &str) -> String {
    match class {
        "Y" => "economy".to_string(),
        "W" => "premium_economy".to_string(),
        "C" | "J" => "business".to_string(),
        "F" => "first".to_string(),
        other => other.to_lowercase(),
    }
}

impl Default for BatikAir {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightSource for BatikAir {
    fn name(&self) -> &str {
        "Batik Air"
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
