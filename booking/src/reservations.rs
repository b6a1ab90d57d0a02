//! Reservation store.
//!
//! At most one reservation exists per `(date, slot)`. Admission is decided inside a
//! single transaction that also checks the occupant is not suspended, the slot is
//! not blocked or hosting an event, and the slot is still offerable at `now`.

use crate::blocks::{ensure_occupant_active, ensure_slot_open};
use crate::eligibility::Eligibility;
use crate::error::BookingError;
use crate::paths;
use crate::types::{DateKey, Reservation, ReservationRecord, SlotKey};
use chrono::{DateTime, Utc};
use courtside_core::store::{encode, Snapshot, StoreError, Transaction, TransactionBody};
use futures::future::BoxFuture;

/// Create a reservation if the slot is free and offerable.
#[derive(Debug, Clone)]
pub struct Reserve {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Body to store.
    pub reservation: Reservation,
    /// Instant the request is evaluated at.
    pub now: DateTime<Utc>,
    /// Lead-time rule.
    pub eligibility: Eligibility,
}

impl TransactionBody for Reserve {
    type Output = Reservation;
    type Error = BookingError;

    fn run<'a>(
        &'a self,
        tx: &'a mut dyn Transaction,
    ) -> BoxFuture<'a, Result<Reservation, BookingError>> {
        Box::pin(async move {
            ensure_occupant_active(tx, &self.reservation.occupant_id, self.now).await?;
            ensure_slot_open(tx, self.date, self.slot).await?;

            if tx.get(&paths::event(self.date, self.slot)).await?.is_some() {
                return Err(BookingError::SlotTypeConflict);
            }

            let path = paths::reservation(self.date, self.slot);
            if tx.get(&path).await?.is_some() {
                return Err(BookingError::AlreadyReserved);
            }

            self.eligibility.check(self.now, self.date, self.slot)?;

            tx.create(&path, encode(&self.reservation)?);
            Ok(self.reservation.clone())
        })
    }
}

/// Decode a stored reservation.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the document id is not a slot key or
/// the body does not match [`Reservation`].
pub fn reservation_record(
    date: DateKey,
    snapshot: &Snapshot,
) -> Result<ReservationRecord, StoreError> {
    Ok(ReservationRecord {
        date,
        slot: snapshot.id().parse::<SlotKey>()?,
        reservation: snapshot.decode()?,
        created_at: snapshot.create_time,
    })
}
