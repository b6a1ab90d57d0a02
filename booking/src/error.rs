//! Booking outcomes that callers branch on.
//!
//! Every contended operation fails with a named [`BookingError`]; only
//! [`BookingError::Store`] represents an unexpected failure. Each variant maps to a
//! distinct user-facing message and a [`Recovery`] hint, because the right reaction
//! differs per case.

use crate::types::SlotKey;
use chrono::{DateTime, Utc};
use courtside_core::store::StoreError;
use thiserror::Error;

/// Errors from booking operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// A reservation was requested where an event exists, or vice versa.
    #[error("Slot is already used by a different kind of booking")]
    SlotTypeConflict,

    /// Someone else holds the reservation.
    #[error("Slot is already reserved")]
    AlreadyReserved,

    /// The slot starts too soon (or has already started).
    #[error("Slot starts within the minimum lead time")]
    LeadTimeViolation,

    /// No event at this slot.
    #[error("Event not found")]
    EventNotFound,

    /// No such seat in the event.
    #[error("Seat not found")]
    SeatNotFound,

    /// The waitlist head withdrew while being promoted; the seat was freed.
    #[error("Waitlist entry vanished during promotion")]
    WaitlistEntryVanished,

    /// The event roster is locked.
    #[error("Event is locked")]
    EventLocked,

    /// Someone else took the seat first.
    #[error("Seat is no longer available")]
    SeatNoLongerAvailable,

    /// The occupant is already on the waitlist.
    #[error("Already on the waitlist")]
    AlreadyQueued,

    /// The occupant already holds a seat in this event.
    #[error("Already holds a seat in this event")]
    AlreadyInEvent,

    /// Resize below the number of taken seats.
    #[error("Capacity cannot go below current occupancy")]
    CapacityBelowOccupancy,

    /// Not enough free seats to remove.
    #[error("Not enough free seats to remove")]
    InsufficientFreeSeats,

    /// Capacity must be positive.
    #[error("Capacity must be at least 1")]
    InvalidCapacity,

    /// An administrator closed the slot.
    #[error("Slot is blocked")]
    SlotBlocked,

    /// The slot already carries a block.
    #[error("Slot is already blocked")]
    AlreadyBlocked,

    /// The occupant's booking actions are suspended.
    #[error("Bookings are suspended until {until}")]
    OccupantBlocked {
        /// End of the suspension.
        until: DateTime<Utc>,
    },

    /// The slot key is not part of the daily schedule.
    #[error("No slot starts at {0}")]
    UnknownSlot(SlotKey),

    /// Store failure (backend loss, exhausted retries).
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a caller should do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Try a different free seat, or queue when none is left.
    PickAnotherSeat,
    /// Re-read current state and decide again.
    Refresh,
    /// Wait until an administrator lifts the lock or block.
    WaitForUnlock,
    /// The desired state already holds.
    TreatAsSuccess,
    /// Free occupied seats before shrinking.
    FreeSeatsFirst,
    /// The request itself is invalid.
    None,
    /// Transient store failure; retry later.
    Retry,
}

impl BookingError {
    /// Message shown to the person who triggered the operation.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::SlotTypeConflict => "This time is hosting a different kind of booking. Refresh to see the current schedule.",
            Self::AlreadyReserved => "Someone just booked this time. Pick another slot.",
            Self::LeadTimeViolation => "This time starts too soon to be booked.",
            Self::EventNotFound => "This event no longer exists. Refresh the page.",
            Self::SeatNotFound => "This seat no longer exists. Refresh the page.",
            Self::WaitlistEntryVanished => "The next person in line left the waitlist. The seat was freed; try promoting again.",
            Self::EventLocked => "Registrations for this event are closed for now.",
            Self::SeatNoLongerAvailable => "That seat was just taken. Try another seat or join the waitlist.",
            Self::AlreadyQueued => "You are already on the waitlist.",
            Self::AlreadyInEvent => "You already have a seat in this event.",
            Self::SlotBlocked => "This time was blocked by the club. Pick another slot.",
            Self::AlreadyBlocked => "This time is already blocked.",
            Self::OccupantBlocked { .. } => "Your account is blocked from booking for now.",
            Self::CapacityBelowOccupancy => "More seats are taken than the new capacity. Free some seats first.",
            Self::InsufficientFreeSeats => "There are not enough free seats to remove.",
            Self::InvalidCapacity => "Capacity must be at least 1.",
            Self::UnknownSlot(_) => "That time is not on the schedule.",
            Self::Store(_) => "We could not reach the booking service. Try again in a moment.",
        }
    }

    /// Suggested recovery.
    #[must_use]
    pub const fn recovery(&self) -> Recovery {
        match self {
            Self::SeatNoLongerAvailable => Recovery::PickAnotherSeat,
            Self::SlotTypeConflict
            | Self::AlreadyReserved
            | Self::EventNotFound
            | Self::SeatNotFound
            | Self::WaitlistEntryVanished => Recovery::Refresh,
            Self::EventLocked | Self::OccupantBlocked { .. } => Recovery::WaitForUnlock,
            Self::SlotBlocked => Recovery::Refresh,
            Self::AlreadyBlocked => Recovery::TreatAsSuccess,
            Self::AlreadyQueued | Self::AlreadyInEvent => Recovery::TreatAsSuccess,
            Self::CapacityBelowOccupancy | Self::InsufficientFreeSeats => Recovery::FreeSeatsFirst,
            Self::LeadTimeViolation | Self::InvalidCapacity | Self::UnknownSlot(_) => {
                Recovery::None
            }
            Self::Store(_) => Recovery::Retry,
        }
    }

    /// Short label used as a metric dimension.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SlotTypeConflict => "slot_type_conflict",
            Self::AlreadyReserved => "already_reserved",
            Self::LeadTimeViolation => "lead_time_violation",
            Self::EventNotFound => "event_not_found",
            Self::SeatNotFound => "seat_not_found",
            Self::WaitlistEntryVanished => "waitlist_entry_vanished",
            Self::EventLocked => "event_locked",
            Self::SeatNoLongerAvailable => "seat_no_longer_available",
            Self::AlreadyQueued => "already_queued",
            Self::AlreadyInEvent => "already_in_event",
            Self::CapacityBelowOccupancy => "capacity_below_occupancy",
            Self::InsufficientFreeSeats => "insufficient_free_seats",
            Self::InvalidCapacity => "invalid_capacity",
            Self::SlotBlocked => "slot_blocked",
            Self::AlreadyBlocked => "already_blocked",
            Self::OccupantBlocked { .. } => "occupant_blocked",
            Self::UnknownSlot(_) => "unknown_slot",
            Self::Store(_) => "store_error",
        }
    }

    /// Returns `true` for store-level failures that are not a named outcome.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all() -> Vec<BookingError> {
        vec![
            BookingError::SlotTypeConflict,
            BookingError::AlreadyReserved,
            BookingError::LeadTimeViolation,
            BookingError::EventNotFound,
            BookingError::SeatNotFound,
            BookingError::WaitlistEntryVanished,
            BookingError::EventLocked,
            BookingError::SeatNoLongerAvailable,
            BookingError::AlreadyQueued,
            BookingError::AlreadyInEvent,
            BookingError::CapacityBelowOccupancy,
            BookingError::InsufficientFreeSeats,
            BookingError::InvalidCapacity,
            BookingError::SlotBlocked,
            BookingError::AlreadyBlocked,
            BookingError::OccupantBlocked {
                until: DateTime::from_timestamp(0, 0).unwrap(),
            },
            BookingError::UnknownSlot(SlotKey::hm(7, 0)),
            BookingError::Store(StoreError::RetriesExhausted { attempts: 6 }),
        ]
    }

    #[test]
    fn every_error_has_a_distinct_message() {
        let errors = all();
        let messages: HashSet<_> = errors.iter().map(BookingError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn only_store_failures_are_unexpected() {
        let unexpected: Vec<_> = all().into_iter().filter(BookingError::is_unexpected).collect();
        assert_eq!(
            unexpected,
            vec![BookingError::Store(StoreError::RetriesExhausted { attempts: 6 })]
        );
    }

    #[test]
    fn lost_seat_race_suggests_another_seat() {
        assert_eq!(
            BookingError::SeatNoLongerAvailable.recovery(),
            Recovery::PickAnotherSeat
        );
        assert_eq!(BookingError::AlreadyQueued.recovery(), Recovery::TreatAsSuccess);
    }

    #[test]
    fn labels_are_distinct() {
        let errors = all();
        let labels: HashSet<_> = errors.iter().map(BookingError::label).collect();
        assert_eq!(labels.len(), errors.len());
        assert_eq!(BookingError::SlotBlocked.label(), "slot_blocked");
    }
}
