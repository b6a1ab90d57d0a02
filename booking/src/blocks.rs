//! Administrative blocks.
//!
//! A slot block closes one slot of one day. An occupant block suspends one
//! occupant's reservations, seat joins and waitlist joins until an instant. Both are
//! read inside the booking transactions that honor them, so whichever commits first
//! decides: a block committed before a booking refuses it, and a booking committed
//! before a block stays in place.

use crate::error::BookingError;
use crate::paths;
use crate::types::{DateKey, OccupantBlock, OccupantId, SlotBlock, SlotBlockRecord, SlotKey};
use chrono::{DateTime, Utc};
use courtside_core::store::{encode, Snapshot, StoreError, Transaction, TransactionBody};
use futures::future::BoxFuture;

/// Refuse when an administrator closed the slot.
pub(crate) async fn ensure_slot_open(
    tx: &mut dyn Transaction,
    date: DateKey,
    slot: SlotKey,
) -> Result<(), BookingError> {
    if tx.get(&paths::slot_block(date, slot)).await?.is_some() {
        return Err(BookingError::SlotBlocked);
    }
    Ok(())
}

/// Refuse when the occupant's booking actions are suspended at `now`.
pub(crate) async fn ensure_occupant_active(
    tx: &mut dyn Transaction,
    occupant: &OccupantId,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    let Some(snapshot) = tx.get(&paths::occupant_block(occupant)).await? else {
        return Ok(());
    };
    let block: OccupantBlock = snapshot.decode()?;
    if block.is_active(now) {
        return Err(BookingError::OccupantBlocked {
            until: block.blocked_until,
        });
    }
    Ok(())
}

/// Close a slot. Blocking twice is [`BookingError::AlreadyBlocked`].
#[derive(Debug, Clone)]
pub struct BlockSlot {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Body to store.
    pub block: SlotBlock,
}

impl TransactionBody for BlockSlot {
    type Output = ();
    type Error = BookingError;

    fn run<'a>(&'a self, tx: &'a mut dyn Transaction) -> BoxFuture<'a, Result<(), BookingError>> {
        Box::pin(async move {
            let path = paths::slot_block(self.date, self.slot);
            if tx.get(&path).await?.is_some() {
                return Err(BookingError::AlreadyBlocked);
            }
            tx.create(&path, encode(&self.block)?);
            Ok(())
        })
    }
}

/// Suspend an occupant until `block.blocked_until`, replacing any earlier block.
#[derive(Debug, Clone)]
pub struct BlockOccupant {
    /// Who is suspended.
    pub occupant: OccupantId,
    /// Body to store.
    pub block: OccupantBlock,
}

impl TransactionBody for BlockOccupant {
    type Output = ();
    type Error = BookingError;

    fn run<'a>(&'a self, tx: &'a mut dyn Transaction) -> BoxFuture<'a, Result<(), BookingError>> {
        Box::pin(async move {
            let path = paths::occupant_block(&self.occupant);
            let body = encode(&self.block)?;
            if tx.get(&path).await?.is_some() {
                tx.update(&path, body);
            } else {
                tx.create(&path, body);
            }
            Ok(())
        })
    }
}

/// Decode a stored slot block.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the document id is not a slot key or
/// the body does not match [`SlotBlock`].
pub fn slot_block_record(date: DateKey, snapshot: &Snapshot) -> Result<SlotBlockRecord, StoreError> {
    Ok(SlotBlockRecord {
        date,
        slot: snapshot.id().parse::<SlotKey>()?,
        block: snapshot.decode()?,
        created_at: snapshot.create_time,
    })
}
