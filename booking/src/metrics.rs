//! Business metrics for the booking engine.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `courtside_reservations_total{outcome}` - Reservation attempts by outcome
//! - `courtside_seat_joins_total{outcome}` - Seat acquisitions by outcome
//! - `courtside_waitlist_joins_total{outcome}` - Waitlist joins by outcome
//! - `courtside_promotions_total{outcome}` - Promotions by outcome (promoted, freed, stale, or an error label)
//! - `courtside_events_saved_total{outcome}` - Event saves by outcome
//! - `courtside_slot_blocks_total{outcome}` - Slot blocks by outcome
//!
//! A successful attempt is recorded as `committed`; a failure uses
//! [`BookingError::label`].

use crate::error::BookingError;
use metrics::describe_counter;

/// Register all business metric descriptions.
///
/// Call once at startup, before recording.
pub fn register_business_metrics() {
    describe_counter!(
        "courtside_reservations_total",
        "Total number of reservation attempts by outcome"
    );
    describe_counter!(
        "courtside_seat_joins_total",
        "Total number of seat acquisitions by outcome"
    );
    describe_counter!(
        "courtside_waitlist_joins_total",
        "Total number of waitlist joins by outcome"
    );
    describe_counter!(
        "courtside_promotions_total",
        "Total number of free-and-promote operations by outcome"
    );
    describe_counter!(
        "courtside_events_saved_total",
        "Total number of event saves by outcome"
    );
    describe_counter!(
        "courtside_slot_blocks_total",
        "Total number of slot block attempts by outcome"
    );

    tracing::info!("Business metrics registered");
}

fn outcome<T>(result: &Result<T, BookingError>) -> &'static str {
    match result {
        Ok(_) => "committed",
        Err(error) => error.label(),
    }
}

/// Record a reservation attempt.
pub fn record_reservation<T>(result: &Result<T, BookingError>) {
    metrics::counter!("courtside_reservations_total", "outcome" => outcome(result)).increment(1);
}

/// Record a seat acquisition attempt.
pub fn record_seat_join<T>(result: &Result<T, BookingError>) {
    metrics::counter!("courtside_seat_joins_total", "outcome" => outcome(result)).increment(1);
}

/// Record a waitlist join attempt.
pub fn record_waitlist_join<T>(result: &Result<T, BookingError>) {
    metrics::counter!("courtside_waitlist_joins_total", "outcome" => outcome(result)).increment(1);
}

/// Record an event save.
pub fn record_event_saved<T>(result: &Result<T, BookingError>) {
    metrics::counter!("courtside_events_saved_total", "outcome" => outcome(result)).increment(1);
}

/// Record a slot block attempt.
pub fn record_slot_block<T>(result: &Result<T, BookingError>) {
    metrics::counter!("courtside_slot_blocks_total", "outcome" => outcome(result)).increment(1);
}

/// Record a promotion with an explicit outcome label.
pub fn record_promotion(label: &'static str) {
    metrics::counter!("courtside_promotions_total", "outcome" => label).increment(1);
}
