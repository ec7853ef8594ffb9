//! Search request, response and related data models

use crate::results::Offer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A traveler's search with optional filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Origin airport code
    pub origin: String,
    /// Destination airport code
    pub destination: String,
    /// Departure date (YYYY-MM-DD)
    pub departure_date: String,
    /// Return date for round trips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    /// Number of passengers
    #[serde(default = "default_passengers")]
    pub passengers: u32,
    /// Cabin class
    #[serde(default = "default_cabin_class")]
    pub cabin_class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stops: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stops: Option<u32>,
    /// Earliest departure time of day ("HH:MM")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time_start: Option<String>,
    /// Latest departure time of day ("HH:MM")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time_end: Option<String>,
    /// Airline allow-list, matched against name or code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airlines: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_minutes: Option<i64>,
    /// Explicit sort directive (e.g. "price_asc")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

fn default_passengers() -> u32 {
    1
}

fn default_cabin_class() -> String {
    "economy".to_string()
}

impl SearchRequest {
    /// Create a one-passenger economy search with no filters
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure_date: departure_date.into(),
            return_date: None,
            passengers: default_passengers(),
            cabin_class: default_cabin_class(),
            min_price: None,
            max_price: None,
            min_stops: None,
            max_stops: None,
            departure_time_start: None,
            departure_time_end: None,
            arrival_time_start: None,
            arrival_time_end: None,
            airlines: None,
            min_duration_minutes: None,
            max_duration_minutes: None,
            sort_by: None,
        }
    }

    /// Set passenger count
    pub fn with_passengers(mut self, passengers: u32) -> Self {
        self.passengers = passengers;
        self
    }

    /// Set cabin class
    pub fn with_cabin_class(mut self, cabin_class: impl Into<String>) -> Self {
        self.cabin_class = cabin_class.into();
        self
    }

    /// Set inclusive price bounds
    pub fn with_price_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Set inclusive stop-count bounds
    pub fn with_stop_range(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_stops = min;
        self.max_stops = max;
        self
    }

    /// Set inclusive duration bounds in minutes
    pub fn with_duration_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_duration_minutes = min;
        self.max_duration_minutes = max;
        self
    }

    /// Restrict to the given airlines
    pub fn with_airlines(mut self, airlines: Vec<String>) -> Self {
        self.airlines = Some(airlines);
        self
    }

    /// Set sort directive
    pub fn with_sort_by(mut self, directive: impl Into<String>) -> Self {
        self.sort_by = Some(directive.into());
        self
    }

    /// Check the request is well-formed, returning the first problem found
    pub fn validate(&self) -> Result<(), String> {
        if self.origin.trim().is_empty() {
            return Err("origin is required".to_string());
        }
        if self.destination.trim().is_empty() {
            return Err("destination is required".to_string());
        }
        if NaiveDate::parse_from_str(&self.departure_date, "%Y-%m-%d").is_err() {
            return Err(format!(
                "departure_date '{}' is not YYYY-MM-DD",
                self.departure_date
            ));
        }
        if let Some(ref date) = self.return_date {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(format!("return_date '{}' is not YYYY-MM-DD", date));
            }
        }
        if self.passengers == 0 {
            return Err("passengers must be at least 1".to_string());
        }

        let bounds = [
            ("departure_time_start", &self.departure_time_start),
            ("departure_time_end", &self.departure_time_end),
            ("arrival_time_start", &self.arrival_time_start),
            ("arrival_time_end", &self.arrival_time_end),
        ];
        for (field, value) in bounds {
            if let Some(value) = value {
                if !is_time_of_day(value) {
                    return Err(format!("{} '{}' is not HH:MM", field, value));
                }
            }
        }

        Ok(())
    }

    /// Canonical cache key covering every field and optional-field presence
    ///
    /// The airline allow-list is hashed as a set since its order never
    /// changes the result.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();

        let mut put = |name: &str, value: Option<&str>| {
            hasher.update(name.as_bytes());
            match value {
                Some(value) => {
                    hasher.update([1u8]);
                    hasher.update((value.len() as u64).to_le_bytes());
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        };

        put("origin", Some(&self.origin));
        put("destination", Some(&self.destination));
        put("departure_date", Some(&self.departure_date));
        put("return_date", self.return_date.as_deref());
        put("passengers", Some(&self.passengers.to_string()));
        put("cabin_class", Some(&self.cabin_class));
        put("min_price", self.min_price.map(|v| v.to_string()).as_deref());
        put("max_price", self.max_price.map(|v| v.to_string()).as_deref());
        put("min_stops", self.min_stops.map(|v| v.to_string()).as_deref());
        put("max_stops", self.max_stops.map(|v| v.to_string()).as_deref());
        put("departure_time_start", self.departure_time_start.as_deref());
        put("departure_time_end", self.departure_time_end.as_deref());
        put("arrival_time_start", self.arrival_time_start.as_deref());
        put("arrival_time_end", self.arrival_time_end.as_deref());

        let airlines = self.airlines.as_ref().map(|list| {
            let mut list: Vec<&str> = list.iter().map(String::as_str).collect();
            list.sort_unstable();
            list.dedup();
            list.iter()
                .map(|name| format!("{}:{}", name.len(), name))
                .collect::<String>()
        });
        put("airlines", airlines.as_deref());

        put(
            "min_duration_minutes",
            self.min_duration_minutes.map(|v| v.to_string()).as_deref(),
        );
        put(
            "max_duration_minutes",
            self.max_duration_minutes.map(|v| v.to_string()).as_deref(),
        );
        put("sort_by", self.sort_by.as_deref());

        format!("{:x}", hasher.finalize())
    }
}

fn is_time_of_day(value: &str) -> bool {
    value.len() == 5 && chrono::NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}

/// Recognized explicit sort directives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    DurationAsc,
    DurationDesc,
    DepartureAsc,
    DepartureDesc,
    ArrivalAsc,
    ArrivalDesc,
}

impl SortOrder {
    /// Parse a directive, `None` when it is not recognized
    pub fn parse(directive: &str) -> Option<Self> {
        match directive {
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "duration_asc" => Some(Self::DurationAsc),
            "duration_desc" => Some(Self::DurationDesc),
            "departure_asc" => Some(Self::DepartureAsc),
            "departure_desc" => Some(Self::DepartureDesc),
            "arrival_asc" => Some(Self::ArrivalAsc),
            "arrival_desc" => Some(Self::ArrivalDesc),
            _ => None,
        }
    }
}

/// Summary of how a search was answered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub total_results: usize,
    pub providers_queried: usize,
    pub providers_succeeded: usize,
    pub providers_failed: usize,
    pub search_time_ms: u64,
    pub cache_hit: bool,
}

/// Canonical search response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The request this response answers
    pub search_criteria: SearchRequest,
    pub metadata: SearchMetadata,
    /// Offers in final order
    pub flights: Vec<Offer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = SearchRequest::new("CGK", "DPS", "2025-12-15");
        assert_eq!(request.passengers, 1);
        assert_eq!(request.cabin_class, "economy");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_deserialize_minimal() {
        let json = r#"{"origin":"CGK","destination":"DPS","departure_date":"2025-12-15"}"#;
        let request: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request, SearchRequest::new("CGK", "DPS", "2025-12-15"));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(SearchRequest::new("", "DPS", "2025-12-15").validate().is_err());
        assert!(SearchRequest::new("CGK", "DPS", "15-12-2025").validate().is_err());
        assert!(SearchRequest::new("CGK", "DPS", "2025-12-15")
            .with_passengers(0)
            .validate()
            .is_err());

        let mut request = SearchRequest::new("CGK", "DPS", "2025-12-15");
        request.departure_time_start = Some("5:00".to_string());
        assert!(request.validate().is_err());
        request.departure_time_start = Some("05:00".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_cache_key_identical_requests() {
        let a = SearchRequest::new("CGK", "DPS", "2025-12-15").with_price_range(Some(500_000), None);
        let b = SearchRequest::new("CGK", "DPS", "2025-12-15").with_price_range(Some(500_000), None);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_distinguishes_fields() {
        let base = SearchRequest::new("CGK", "DPS", "2025-12-15");
        let keys = [
            base.cache_key(),
            base.clone().with_passengers(2).cache_key(),
            base.clone().with_cabin_class("business").cache_key(),
            base.clone().with_price_range(Some(0), None).cache_key(),
            base.clone().with_price_range(None, Some(0)).cache_key(),
            base.clone().with_stop_range(Some(0), None).cache_key(),
            base.clone().with_sort_by("price_asc").cache_key(),
            base.clone().with_airlines(vec![]).cache_key(),
            base.clone().with_airlines(vec!["GA".to_string()]).cache_key(),
            SearchRequest::new("CGK", "SUB", "2025-12-15").cache_key(),
            SearchRequest::new("CGKD", "PS", "2025-12-15").cache_key(),
        ];

        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_cache_key_airline_order_independent() {
        let a = SearchRequest::new("CGK", "DPS", "2025-12-15")
            .with_airlines(vec!["GA".to_string(), "QZ".to_string()]);
        let b = SearchRequest::new("CGK", "DPS", "2025-12-15")
            .with_airlines(vec!["QZ".to_string(), "GA".to_string()]);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("price_asc"), Some(SortOrder::PriceAsc));
        assert_eq!(SortOrder::parse("arrival_desc"), Some(SortOrder::ArrivalDesc));
        assert_eq!(SortOrder::parse("PRICE_ASC"), None);
        assert_eq!(SortOrder::parse(""), None);
    }
}
