//! Promotion algorithm.
//!
//! Freeing a seat and handing it to the head of the waitlist happen in the same
//! commit, so the seat is never observably free in between and no concurrent
//! [`JoinSeat`](crate::events::JoinSeat) can slip into the gap.
//!
//! The caller passes the occupant it saw on the seat. If someone else holds the
//! seat when the transaction runs, the promotion is [`PromotionOutcome::Stale`] and
//! writes nothing; re-running it would otherwise evict whoever was promoted by a
//! concurrent call. A seat that was freed in the meantime is still handed to the
//! waitlist head.

use crate::config::{DoubleSeatPolicy, PromotionLockPolicy};
use crate::error::BookingError;
use crate::events::{holder_of, read_seat};
use crate::paths;
use crate::types::{DateKey, Event, HolderMarker, OccupantId, Seat, SeatId, SlotKey};
use crate::waitlist::fifo;
use courtside_core::path::DocPath;
use courtside_core::store::{encode, StoreError, Transaction, TransactionBody};
use futures::future::BoxFuture;
use serde::Serialize;

/// Result of a committed promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PromotionOutcome {
    /// The waitlist head now holds the seat.
    Promoted {
        /// Seat handed over.
        seat: SeatId,
        /// New occupant.
        occupant: OccupantId,
        /// Occupant displaced, if the seat was taken.
        previous: Option<OccupantId>,
    },
    /// Nobody was waiting; the seat is free.
    Freed {
        /// Seat freed.
        seat: SeatId,
        /// Occupant displaced, if the seat was taken.
        previous: Option<OccupantId>,
    },
    /// Someone other than the expected occupant holds the seat; nothing changed.
    Stale {
        /// Seat left untouched.
        seat: SeatId,
    },
}

/// What one attempt of [`FreeSeatAndPromote`] committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionStep {
    /// Promotion finished.
    Completed(PromotionOutcome),
    /// The head entry disappeared between listing and re-reading it. The seat was
    /// freed and the caller reports [`BookingError::WaitlistEntryVanished`].
    HeadVanished {
        /// Occupant displaced, if the seat was taken.
        previous: Option<OccupantId>,
        /// Entry that vanished.
        head: OccupantId,
    },
}

/// Free a seat and move the earliest surviving waitlist entry into it.
#[derive(Debug, Clone)]
pub struct FreeSeatAndPromote {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Seat to free.
    pub seat: SeatId,
    /// Occupant observed on the seat before the transaction.
    pub expected_occupant: Option<OccupantId>,
    /// Double seating policy.
    pub double_seat: DoubleSeatPolicy,
    /// Lock handling.
    pub lock_policy: PromotionLockPolicy,
}

impl TransactionBody for FreeSeatAndPromote {
    type Output = PromotionStep;
    type Error = BookingError;

    fn run<'a>(
        &'a self,
        tx: &'a mut dyn Transaction,
    ) -> BoxFuture<'a, Result<PromotionStep, BookingError>> {
        Box::pin(async move {
            let (date, slot) = (self.date, self.slot);

            let event: Event = tx
                .get(&paths::event(date, slot))
                .await?
                .ok_or(BookingError::EventNotFound)?
                .decode()?;
            if event.locked && self.lock_policy == PromotionLockPolicy::Honor {
                return Err(BookingError::EventLocked);
            }

            let seat = read_seat(tx, date, slot, self.seat).await?;
            let previous = seat.occupant().cloned();
            if previous.is_some() && previous != self.expected_occupant {
                return Ok(PromotionStep::Completed(PromotionOutcome::Stale { seat: self.seat }));
            }

            let mut entries = tx.list(&paths::waitlist(date, slot)).await?;
            fifo(&mut entries);

            let old_holder = match &previous {
                Some(occupant) => holder_of(tx, date, slot, occupant, self.seat).await?,
                None => None,
            };

            // Under Reject, entries of occupants already seated elsewhere in the
            // event cannot be promoted; they are dropped from the queue.
            let mut skipped: Vec<DocPath> = Vec::new();
            let mut head: Option<OccupantId> = None;
            for entry in &entries {
                let occupant: OccupantId = entry.id().parse().map_err(StoreError::from)?;
                if self.double_seat == DoubleSeatPolicy::Reject
                    && previous.as_ref() != Some(&occupant)
                    && tx.get(&paths::holder(date, slot, &occupant)).await?.is_some()
                {
                    skipped.push(entry.path.clone());
                    continue;
                }
                head = Some(occupant);
                break;
            }

            let head_entry = match &head {
                Some(occupant) => {
                    let path = paths::waitlist_entry(date, slot, occupant);
                    let present = tx.get(&path).await?.is_some();
                    Some((path, present))
                }
                None => None,
            };

            let seat_path = paths::seat(date, slot, self.seat);
            if let Some(holder) = &old_holder {
                tx.delete(holder);
            }
            for path in &skipped {
                tx.delete(path);
            }

            match (head, head_entry) {
                (Some(occupant), Some((entry, true))) => {
                    tx.update(&seat_path, encode(&Seat::taken_by(seat.index, occupant.clone()))?);
                    tx.delete(&entry);
                    if self.double_seat == DoubleSeatPolicy::Reject {
                        tx.create(
                            &paths::holder(date, slot, &occupant),
                            encode(&HolderMarker { seat_id: self.seat })?,
                        );
                    }
                    Ok(PromotionStep::Completed(PromotionOutcome::Promoted {
                        seat: self.seat,
                        occupant,
                        previous,
                    }))
                }
                (Some(head), _) => {
                    tx.update(&seat_path, encode(&Seat::free(seat.index))?);
                    Ok(PromotionStep::HeadVanished { previous, head })
                }
                (None, _) => {
                    tx.update(&seat_path, encode(&Seat::free(seat.index))?);
                    Ok(PromotionStep::Completed(PromotionOutcome::Freed {
                        seat: self.seat,
                        previous,
                    }))
                }
            }
        })
    }
}
