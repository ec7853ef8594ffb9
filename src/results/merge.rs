//! Merge pipeline turning raw source offers into one ranked result list
//!
//! Stages run in a fixed order: filter, deduplicate, duration-fill, rank,
//! and an optional explicit sort. All stages are pure and in-memory.

use super::types::{FlightDuration, Offer};
use crate::search::{SearchRequest, SortOrder};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Weight of one stop in the best-value score
const STOP_PENALTY: i64 = 100_000;
/// Weight of one minute of travel in the best-value score
const MINUTE_PENALTY: i64 = 100;

/// A stage that could not complete on malformed input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("flight {flight_number} arrives before it departs")]
    NegativeDuration { flight_number: String },

    #[error("best-value score overflow for flight {flight_number}")]
    ScoreOverflow { flight_number: String },
}

/// Run every stage over the raw offers for a request
pub fn merge_offers(raw: Vec<Offer>, request: &SearchRequest) -> Result<Vec<Offer>, PipelineError> {
    let raw_count = raw.len();

    let filtered = filter_offers(raw, request);
    let filtered_count = filtered.len();

    let mut offers = dedupe_offers(filtered);
    fill_durations(&mut offers)?;
    rank_offers(&mut offers)?;

    if let Some(directive) = request.sort_by.as_deref() {
        sort_offers(&mut offers, directive);
    }

    debug!(
        "Merged {} raw offers: {} after filter, {} after dedup",
        raw_count,
        filtered_count,
        offers.len()
    );

    Ok(offers)
}

/// Keep offers on the requested route that satisfy every present constraint
pub fn filter_offers(offers: Vec<Offer>, request: &SearchRequest) -> Vec<Offer> {
    offers
        .into_iter()
        .filter(|offer| matches_request(offer, request))
        .collect()
}

fn matches_request(offer: &Offer, request: &SearchRequest) -> bool {
    if offer.departure.airport != request.origin || offer.arrival.airport != request.destination {
        return false;
    }

    let price = offer.price.amount;
    if request.min_price.is_some_and(|min| price < min) || request.max_price.is_some_and(|max| price > max) {
        return false;
    }

    if request.min_stops.is_some_and(|min| offer.stops < min)
        || request.max_stops.is_some_and(|max| offer.stops > max)
    {
        return false;
    }

    if !within_window(
        &offer.departure.time_of_day(),
        request.departure_time_start.as_deref(),
        request.departure_time_end.as_deref(),
    ) {
        return false;
    }

    if !within_window(
        &offer.arrival.time_of_day(),
        request.arrival_time_start.as_deref(),
        request.arrival_time_end.as_deref(),
    ) {
        return false;
    }

    if let Some(airlines) = request.airlines.as_ref().filter(|list| !list.is_empty()) {
        if !airlines.iter().any(|entry| offer.airline.matches(entry)) {
            return false;
        }
    }

    let minutes = offer.duration.total_minutes;
    !(request.min_duration_minutes.is_some_and(|min| minutes < min)
        || request.max_duration_minutes.is_some_and(|max| minutes > max))
}

/// A window restricts only when both bounds are set; "HH:MM" strings
/// compare correctly as plain strings
fn within_window(time: &str, start: Option<&str>, end: Option<&str>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => time >= start && time <= end,
        _ => true,
    }
}

/// Collapse offers for the same flight and departure, keeping the cheapest
///
/// Equal prices resolve to the smallest `(provider, id)` so the survivor does
/// not depend on the order sources completed in.
pub fn dedupe_offers(offers: Vec<Offer>) -> Vec<Offer> {
    let mut groups: BTreeMap<(String, i64), Offer> = BTreeMap::new();

    for offer in offers {
        let key = offer.dedup_key();
        match groups.get_mut(&key) {
            Some(existing) => {
                if preferred(&offer, existing) {
                    *existing = offer;
                }
            }
            None => {
                groups.insert(key, offer);
            }
        }
    }

    groups.into_values().collect()
}

fn preferred(candidate: &Offer, current: &Offer) -> bool {
    (candidate.price.amount, &candidate.provider, &candidate.id)
        < (current.price.amount, &current.provider, &current.id)
}

/// Compute missing durations from the departure and arrival instants
pub fn fill_durations(offers: &mut [Offer]) -> Result<(), PipelineError> {
    for offer in offers.iter_mut() {
        if !offer.duration.is_unset() || offer.departure.timestamp <= 0 || offer.arrival.timestamp <= 0 {
            continue;
        }

        let seconds = offer.arrival.timestamp - offer.departure.timestamp;
        if seconds < 0 {
            return Err(PipelineError::NegativeDuration {
                flight_number: offer.flight_number.clone(),
            });
        }

        offer.duration = FlightDuration::from_minutes(seconds / 60);
    }

    Ok(())
}

/// Composite best-value score, lower is better
pub fn best_value_score(offer: &Offer) -> Result<i64, PipelineError> {
    let stops = i64::from(offer.stops).checked_mul(STOP_PENALTY);
    let minutes = offer.duration.total_minutes.checked_mul(MINUTE_PENALTY);
    let hour = offer.departure.timestamp / 3600;

    stops
        .zip(minutes)
        .and_then(|(stops, minutes)| {
            offer
                .price
                .amount
                .checked_add(stops)?
                .checked_add(minutes)?
                .checked_add(hour)
        })
        .ok_or_else(|| PipelineError::ScoreOverflow {
            flight_number: offer.flight_number.clone(),
        })
}

/// Stable-sort offers ascending by best-value score
pub fn rank_offers(offers: &mut Vec<Offer>) -> Result<(), PipelineError> {
    let mut scored = offers
        .drain(..)
        .map(|offer| best_value_score(&offer).map(|score| (score, offer)))
        .collect::<Result<Vec<_>, _>>()?;

    scored.sort_by_key(|(score, _)| *score);
    offers.extend(scored.into_iter().map(|(_, offer)| offer));

    Ok(())
}

/// Re-order ranked offers by an explicit directive
///
/// Unknown or empty directives leave the ranked order untouched.
pub fn sort_offers(offers: &mut [Offer], directive: &str) {
    if offers.len() < 2 {
        return;
    }

    let Some(order) = SortOrder::parse(directive) else {
        if !directive.is_empty() {
            debug!("Ignoring unknown sort directive '{}'", directive);
        }
        return;
    };

    match order {
        SortOrder::PriceAsc => offers.sort_by_key(|o| o.price.amount),
        SortOrder::PriceDesc => offers.sort_by(|a, b| b.price.amount.cmp(&a.price.amount)),
        SortOrder::DurationAsc => offers.sort_by_key(|o| o.duration.total_minutes),
        SortOrder::DurationDesc => {
            offers.sort_by(|a, b| b.duration.total_minutes.cmp(&a.duration.total_minutes))
        }
        SortOrder::DepartureAsc => offers.sort_by_key(|o| o.departure.timestamp),
        SortOrder::DepartureDesc => {
            offers.sort_by(|a, b| b.departure.timestamp.cmp(&a.departure.timestamp))
        }
        SortOrder::ArrivalAsc => offers.sort_by_key(|o| o.arrival.timestamp),
        SortOrder::ArrivalDesc => offers.sort_by(|a, b| b.arrival.timestamp.cmp(&a.arrival.timestamp)),
    }
}
