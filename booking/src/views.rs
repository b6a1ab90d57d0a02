//! Occupancy views.
//!
//! Read-only projections of the store for display. Everything here is advisory:
//! the state may change right after it is read, so no booking decision is taken
//! from these values. Authoritative checks run inside the transactions.

use crate::blocks::slot_block_record;
use crate::calendar::Calendar;
use crate::eligibility::Eligibility;
use crate::events::{event_record, seat_records};
use crate::paths;
use crate::reservations::reservation_record;
use crate::types::{
    DateKey, EventRecord, OccupantId, ReservationRecord, SeatId, SeatRecord, Slot,
    SlotBlockRecord, SlotKey, WaitlistRecord,
};
use crate::waitlist::queue;
use chrono::{DateTime, Utc};
use courtside_core::store::{DocumentStore, StoreError};
use serde::Serialize;
use std::collections::HashMap;

/// What occupies a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SlotState {
    /// Nothing booked.
    Free,
    /// Closed by an administrator. Shown over whatever else the slot holds.
    Blocked(SlotBlockRecord),
    /// Held by a single occupant.
    Reserved(ReservationRecord),
    /// Hosting an event.
    Event {
        /// The event.
        event: EventRecord,
        /// Seats ordered by index.
        seats: Vec<SeatRecord>,
        /// Waitlist in promotion order.
        waitlist: Vec<WaitlistRecord>,
    },
}

impl SlotState {
    /// Free seats of an event; zero for other states.
    #[must_use]
    pub fn free_seats(&self) -> usize {
        match self {
            Self::Event { seats, .. } => seats.iter().filter(|s| !s.seat.taken).count(),
            Self::Free | Self::Blocked(_) | Self::Reserved(_) => 0,
        }
    }
}

/// One row of the daily schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotBoard {
    /// Calendar slot.
    pub slot: Slot,
    /// Start instant.
    pub start_at: DateTime<Utc>,
    /// Whether booking actions are still accepted at the time of the read.
    pub offerable: bool,
    /// Current occupancy.
    pub state: SlotState,
}

/// Seats and waitlist of one event, read outside any transaction.
pub(crate) async fn roster(
    store: &dyn DocumentStore,
    date: DateKey,
    slot: SlotKey,
) -> Result<(Vec<SeatRecord>, Vec<WaitlistRecord>), StoreError> {
    let (seats, waitlist) = futures::try_join!(
        store.list(&paths::seats(date, slot)),
        store.list(&paths::waitlist(date, slot)),
    )?;
    Ok((seat_records(&seats)?, queue(&waitlist)?))
}

/// Every calendar slot of `date` with its occupancy.
///
/// Documents at slot keys the calendar does not know are ignored.
///
/// # Errors
///
/// Propagates store failures and malformed documents.
pub async fn day_board(
    store: &dyn DocumentStore,
    calendar: &Calendar,
    eligibility: &Eligibility,
    date: DateKey,
    now: DateTime<Utc>,
) -> Result<Vec<SlotBoard>, StoreError> {
    let (blocks, reservations, events) = futures::try_join!(
        store.list(&paths::slot_blocks(date)),
        store.list(&paths::reservation_slots(date)),
        store.list(&paths::event_slots(date)),
    )?;

    let mut blocked: HashMap<SlotKey, SlotBlockRecord> = HashMap::new();
    for snapshot in &blocks {
        let record = slot_block_record(date, snapshot)?;
        blocked.insert(record.slot, record);
    }
    let mut reserved: HashMap<SlotKey, ReservationRecord> = HashMap::new();
    for snapshot in &reservations {
        let record = reservation_record(date, snapshot)?;
        reserved.insert(record.slot, record);
    }
    let mut hosted: HashMap<SlotKey, EventRecord> = HashMap::new();
    for snapshot in &events {
        let record = event_record(date, snapshot)?;
        hosted.insert(record.slot, record);
    }

    let mut board = Vec::with_capacity(calendar.slots().len());
    for slot in calendar.slots() {
        let state = if let Some(block) = blocked.remove(&slot.key) {
            SlotState::Blocked(block)
        } else if let Some(event) = hosted.remove(&slot.key) {
            let (seats, waitlist) = roster(store, date, slot.key).await?;
            SlotState::Event {
                event,
                seats,
                waitlist,
            }
        } else if let Some(reservation) = reserved.remove(&slot.key) {
            SlotState::Reserved(reservation)
        } else {
            SlotState::Free
        };

        board.push(SlotBoard {
            slot: *slot,
            start_at: eligibility.start_at(date, slot.key),
            offerable: eligibility.is_offerable(now, date, slot.key),
            state,
        });
    }

    tracing::debug!(%date, slots = board.len(), "Read day board");
    Ok(board)
}

/// How an occupant is booked into a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BookingKind {
    /// Holds the reservation.
    Reservation,
    /// Holds a seat of the event.
    Seat {
        /// Seat id.
        seat: SeatId,
        /// Seat index.
        index: u32,
    },
    /// Waiting for a seat; position 1 is next in line.
    Waitlist {
        /// 1-based queue position.
        position: usize,
    },
}

/// One booking of an occupant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Start instant.
    pub start_at: DateTime<Utc>,
    /// End instant.
    pub end_at: DateTime<Utc>,
    /// Kind of booking.
    pub kind: BookingKind,
}

/// Reservations, seats and waitlist positions of `occupant` over `days` days from `from`.
///
/// # Errors
///
/// Propagates store failures and malformed documents.
pub async fn occupant_bookings(
    store: &dyn DocumentStore,
    calendar: &Calendar,
    eligibility: &Eligibility,
    occupant: &OccupantId,
    from: DateKey,
    days: u32,
) -> Result<Vec<Booking>, StoreError> {
    let mut bookings = Vec::new();

    for offset in 0..i64::from(days) {
        let date = from.offset_days(offset);
        let (reservations, events) = futures::try_join!(
            store.list(&paths::reservation_slots(date)),
            store.list(&paths::event_slots(date)),
        )?;

        for snapshot in &reservations {
            let record = reservation_record(date, snapshot)?;
            if &record.reservation.occupant_id == occupant {
                bookings.push(Booking {
                    date,
                    slot: record.slot,
                    start_at: record.reservation.start_at,
                    end_at: record.reservation.end_at,
                    kind: BookingKind::Reservation,
                });
            }
        }

        for snapshot in &events {
            let slot: SlotKey = snapshot.id().parse()?;
            let (seats, waitlist) = roster(store, date, slot).await?;
            let start_at = eligibility.start_at(date, slot);
            let end_at = eligibility.start_at(date, calendar.end_for(slot));

            bookings.extend(
                seats
                    .iter()
                    .filter(|record| record.seat.occupant() == Some(occupant))
                    .map(|record| Booking {
                        date,
                        slot,
                        start_at,
                        end_at,
                        kind: BookingKind::Seat {
                            seat: record.id,
                            index: record.seat.index,
                        },
                    }),
            );
            if let Some(position) = waitlist.iter().position(|e| &e.occupant_id == occupant) {
                bookings.push(Booking {
                    date,
                    slot,
                    start_at,
                    end_at,
                    kind: BookingKind::Waitlist {
                        position: position + 1,
                    },
                });
            }
        }
    }

    bookings.sort_by_key(|booking| booking.start_at);
    tracing::debug!(%occupant, %from, days, found = bookings.len(), "Read occupant bookings");
    Ok(bookings)
}
