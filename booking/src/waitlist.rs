//! Waitlist.
//!
//! Entries are keyed by occupant, so joining twice is a create on the same path and
//! surfaces as [`BookingError::AlreadyQueued`]. FIFO order is the store's commit
//! timestamp, with the document id (the occupant id) breaking ties.

use crate::blocks::ensure_occupant_active;
use crate::config::DoubleSeatPolicy;
use crate::eligibility::Eligibility;
use crate::error::BookingError;
use crate::paths;
use crate::types::{DateKey, Event, OccupantId, SlotKey, WaitlistEntry, WaitlistRecord};
use chrono::{DateTime, Utc};
use courtside_core::store::{encode, Snapshot, StoreError, Transaction, TransactionBody};
use futures::future::BoxFuture;

/// Order waitlist documents for promotion: oldest first, then by occupant id.
pub fn fifo(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| {
        a.create_time
            .cmp(&b.create_time)
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// Decode waitlist documents in FIFO order.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] for malformed documents.
pub fn queue(snapshots: &[Snapshot]) -> Result<Vec<WaitlistRecord>, StoreError> {
    let mut ordered = snapshots.to_vec();
    fifo(&mut ordered);
    ordered
        .iter()
        .map(|snapshot| {
            let entry: WaitlistEntry = snapshot.decode()?;
            Ok(WaitlistRecord {
                occupant_id: entry.occupant_id,
                created_at: snapshot.create_time,
            })
        })
        .collect()
}

/// Queue an occupant for a seat.
#[derive(Debug, Clone)]
pub struct JoinWaitlist {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Who queues.
    pub occupant: OccupantId,
    /// Instant the request is evaluated at.
    pub now: DateTime<Utc>,
    /// Lead-time rule.
    pub eligibility: Eligibility,
    /// Double seating policy.
    pub double_seat: DoubleSeatPolicy,
}

impl TransactionBody for JoinWaitlist {
    type Output = ();
    type Error = BookingError;

    fn run<'a>(&'a self, tx: &'a mut dyn Transaction) -> BoxFuture<'a, Result<(), BookingError>> {
        Box::pin(async move {
            let event: Event = tx
                .get(&paths::event(self.date, self.slot))
                .await?
                .ok_or(BookingError::EventNotFound)?
                .decode()?;
            if event.locked {
                return Err(BookingError::EventLocked);
            }

            ensure_occupant_active(tx, &self.occupant, self.now).await?;
            self.eligibility.check(self.now, self.date, self.slot)?;

            if self.double_seat == DoubleSeatPolicy::Reject
                && tx
                    .get(&paths::holder(self.date, self.slot, &self.occupant))
                    .await?
                    .is_some()
            {
                return Err(BookingError::AlreadyInEvent);
            }

            let path = paths::waitlist_entry(self.date, self.slot, &self.occupant);
            if tx.get(&path).await?.is_some() {
                return Err(BookingError::AlreadyQueued);
            }

            tx.create(
                &path,
                encode(&WaitlistEntry {
                    occupant_id: self.occupant.clone(),
                })?,
            );
            Ok(())
        })
    }
}
