//! Usage metrics for the admin dashboard.
//!
//! Computed by reading the store on demand; no counters are maintained alongside
//! the bookings.

use crate::paths;
use crate::reservations::reservation_record;
use crate::types::{DateKey, OccupantId, Seat};
use courtside_core::store::{DocumentStore, StoreError};
use serde::Serialize;
use std::collections::HashMap;

/// Trailing window of the reservation ranking.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Number of occupants shown in the ranking.
pub const DEFAULT_RANKING_LIMIT: usize = 20;

/// Reservations made by one occupant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    /// Occupant.
    pub occupant_id: OccupantId,
    /// Display name on the most recent reservation.
    pub display_name: String,
    /// Reservations in the window.
    pub reservations: u32,
}

/// Occupants ranked by reservation count over the `window_days` days ending `today`.
///
/// Ties are ordered by occupant id.
///
/// # Errors
///
/// Propagates store failures and malformed documents.
pub async fn reservation_ranking(
    store: &dyn DocumentStore,
    today: DateKey,
    window_days: u32,
    limit: usize,
) -> Result<Vec<RankingEntry>, StoreError> {
    let mut counts: HashMap<OccupantId, (u32, String, DateKey)> = HashMap::new();

    for back in 0..i64::from(window_days) {
        let date = today.offset_days(-back);
        for snapshot in store.list(&paths::reservation_slots(date)).await? {
            let record = reservation_record(date, &snapshot)?;
            let entry = counts
                .entry(record.reservation.occupant_id)
                .or_insert_with(|| (0, record.reservation.display_name.clone(), date));
            entry.0 += 1;
            if date > entry.2 {
                entry.1 = record.reservation.display_name;
                entry.2 = date;
            }
        }
    }

    let mut ranking: Vec<RankingEntry> = counts
        .into_iter()
        .map(|(occupant_id, (reservations, display_name, _))| RankingEntry {
            occupant_id,
            display_name,
            reservations,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.reservations
            .cmp(&a.reservations)
            .then_with(|| a.occupant_id.cmp(&b.occupant_id))
    });
    ranking.truncate(limit);
    Ok(ranking)
}

/// Booking totals of one business day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    /// Business day.
    pub date: Option<DateKey>,
    /// Reservations.
    pub reservations: usize,
    /// Events.
    pub events: usize,
    /// Taken seats across all events.
    pub seats_taken: usize,
    /// Seats across all events.
    pub seats_total: usize,
    /// Waitlist entries across all events.
    pub queued: usize,
    /// Blocked slots.
    pub blocked: usize,
}

/// Totals of `date`.
///
/// # Errors
///
/// Propagates store failures and malformed documents.
pub async fn day_summary(store: &dyn DocumentStore, date: DateKey) -> Result<DaySummary, StoreError> {
    let reservations = store.list(&paths::reservation_slots(date)).await?;
    let events = store.list(&paths::event_slots(date)).await?;
    let blocks = store.list(&paths::slot_blocks(date)).await?;

    let mut summary = DaySummary {
        date: Some(date),
        reservations: reservations.len(),
        events: events.len(),
        blocked: blocks.len(),
        ..DaySummary::default()
    };

    for event in &events {
        let seats = store.list(&event.path.collection("seats")).await?;
        summary.seats_total += seats.len();
        for seat in &seats {
            if seat.decode::<Seat>()?.taken {
                summary.seats_taken += 1;
            }
        }
        summary.queued += store.list(&event.path.collection("waitlist")).await?.len();
    }

    Ok(summary)
}
