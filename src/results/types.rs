//! Offer type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single flight offer returned by a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Offer identifier, unique within its source
    pub id: String,
    /// Name of the source that returned this offer
    pub provider: String,
    /// Operating airline
    pub airline: Airline,
    /// Flight number (e.g. "GA400")
    pub flight_number: String,
    /// Departure event
    pub departure: FlightEvent,
    /// Arrival event
    pub arrival: FlightEvent,
    /// Total trip duration including layovers
    #[serde(default)]
    pub duration: FlightDuration,
    /// Number of stops (0 = direct)
    #[serde(default)]
    pub stops: u32,
    /// Total price
    pub price: Price,
    /// Remaining seats at this price
    #[serde(default)]
    pub available_seats: u32,
    /// Cabin class (economy, business, ...)
    #[serde(default)]
    pub cabin_class: String,
    /// Aircraft type
    #[serde(default)]
    pub aircraft: Option<String>,
    /// Onboard amenities
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Baggage allowance
    #[serde(default)]
    pub baggage: Baggage,
}

impl Offer {
    /// Key used to detect the same physical flight sold more than once
    pub fn dedup_key(&self) -> (String, i64) {
        (self.flight_number.clone(), self.departure.timestamp)
    }
}

/// Airline identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub name: String,
    pub code: String,
}

impl Airline {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Whether an allow-list entry names this airline (by name or code)
    pub fn matches(&self, entry: &str) -> bool {
        self.name == entry || self.code == entry
    }
}

/// A departure or arrival
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightEvent {
    /// IATA airport code
    pub airport: String,
    /// City name, when the source provides one
    #[serde(default)]
    pub city: String,
    /// Airport-local datetime for display (RFC 3339 with offset)
    #[serde(default)]
    pub datetime: String,
    /// Absolute instant in epoch seconds
    pub timestamp: i64,
}

impl FlightEvent {
    /// Build an event from an RFC 3339 datetime, deriving the timestamp
    pub fn parse(airport: impl Into<String>, city: impl Into<String>, datetime: &str) -> Option<Self> {
        let parsed = DateTime::parse_from_rfc3339(datetime).ok()?;
        Some(Self {
            airport: airport.into(),
            city: city.into(),
            datetime: datetime.to_string(),
            timestamp: parsed.timestamp(),
        })
    }

    /// Time of day as "HH:MM"
    ///
    /// Read from the display datetime so the airport's own offset applies;
    /// falls back to UTC when the display string is not RFC 3339.
    pub fn time_of_day(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.datetime) {
            Ok(local) => local.format("%H:%M").to_string(),
            Err(_) => DateTime::<Utc>::from_timestamp(self.timestamp, 0)
                .map(|utc| utc.format("%H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Trip duration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDuration {
    pub total_minutes: i64,
    pub formatted: String,
}

impl FlightDuration {
    pub fn from_minutes(total_minutes: i64) -> Self {
        Self {
            total_minutes,
            formatted: format!("{}h {}m", total_minutes / 60, total_minutes % 60),
        }
    }

    /// A zero duration means the source did not report one
    pub fn is_unset(&self) -> bool {
        self.total_minutes == 0
    }
}

/// Price in minor-less currency units (e.g. whole IDR)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: i64,
    pub currency: String,
}

impl Price {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// Baggage allowance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baggage {
    pub carry_on: String,
    pub checked: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_parse_uses_offset() {
        let event = FlightEvent::parse("CGK", "Jakarta", "2025-12-15T06:00:00+07:00").unwrap();
        assert_eq!(event.timestamp, 1_765_753_200);
        assert_eq!(event.time_of_day(), "06:00");
    }

    #[test]
    fn test_time_of_day_falls_back_to_utc() {
        let event = FlightEvent {
            airport: "CGK".to_string(),
            timestamp: 1_765_753_200,
            ..Default::default()
        };
        assert_eq!(event.time_of_day(), "23:00");
    }

    #[test]
    fn test_duration_formatting() {
        let duration = FlightDuration::from_minutes(185);
        assert_eq!(duration.formatted, "3h 5m");
        assert!(!duration.is_unset());
        assert!(FlightDuration::default().is_unset());
    }

    #[test]
    fn test_airline_matches_name_or_code() {
        let airline = Airline::new("Garuda Indonesia", "GA");
        assert!(airline.matches("GA"));
        assert!(airline.matches("Garuda Indonesia"));
        assert!(!airline.matches("garuda"));
    }
}
