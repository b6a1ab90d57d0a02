//! Event/seat store.
//!
//! An event is a capacity-limited roster hosted in a slot, backed by exactly
//! `capacity` seat documents. Every change to the roster is one transaction:
//!
//! - creating an event writes the event and all of its seats in one commit
//! - resizing adds free seats with increasing index, or removes free seats from the
//!   highest index down, never occupied ones
//! - a seat acquisition re-reads the chosen seat and fails with
//!   [`BookingError::SeatNoLongerAvailable`] when someone else got there first
//!
//! **Concurrency**: decisions are made only from what the transaction reads. Two
//! acquisitions of the same seat both read it, so the second to commit conflicts,
//! re-runs, and observes the seat taken.

use crate::blocks::{ensure_occupant_active, ensure_slot_open};
use crate::config::DoubleSeatPolicy;
use crate::eligibility::Eligibility;
use crate::error::BookingError;
use crate::paths;
use crate::types::{
    DateKey, Event, EventRecord, HolderMarker, OccupantId, Seat, SeatId, SeatRecord, SlotKey,
};
use chrono::{DateTime, Utc};
use courtside_core::path::DocPath;
use courtside_core::store::{encode, Snapshot, StoreError, Transaction, TransactionBody};
use futures::future::BoxFuture;
use serde_json::json;

// ============================================================================
// Data Structures
// ============================================================================

/// Administrator input for creating or editing an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Display title
    pub title: String,
    /// Number of seats
    pub capacity: u32,
    /// Free-text rules
    pub rules: String,
    /// Image reference; `None` keeps the current image when editing
    pub image_ref: Option<String>,
    /// Roster lock
    pub locked: bool,
}

impl EventDraft {
    /// Unlocked draft without rules or image.
    #[must_use]
    pub fn new(title: impl Into<String>, capacity: u32) -> Self {
        Self {
            title: title.into(),
            capacity,
            rules: String::new(),
            image_ref: None,
            locked: false,
        }
    }

    /// Set the rules text.
    #[must_use]
    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = rules.into();
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// Set the roster lock.
    #[must_use]
    pub const fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }
}

/// Seat changes needed to reach a new capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResizePlan {
    /// Indices of free seats to create.
    pub add: Vec<u32>,
    /// Free seats to delete.
    pub remove: Vec<SeatId>,
}

/// Work out how to bring `seats` to `new_capacity`.
///
/// New seats continue after the highest existing index. Removal takes free seats
/// from the highest index down.
///
/// # Errors
///
/// - [`BookingError::CapacityBelowOccupancy`]: more seats are taken than `new_capacity`
/// - [`BookingError::InsufficientFreeSeats`]: not enough free seats to remove
pub fn plan_resize(seats: &[SeatRecord], new_capacity: u32) -> Result<ResizePlan, BookingError> {
    let target = new_capacity as usize;
    let current = seats.len();
    let taken = seats.iter().filter(|record| record.seat.taken).count();

    if target < taken {
        return Err(BookingError::CapacityBelowOccupancy);
    }

    if target > current {
        let next = seats.iter().map(|record| record.seat.index).max().unwrap_or(0) + 1;
        let missing = new_capacity - u32::try_from(current).unwrap_or(u32::MAX);
        return Ok(ResizePlan {
            add: (next..next + missing).collect(),
            remove: Vec::new(),
        });
    }

    let excess = current - target;
    let mut free: Vec<&SeatRecord> = seats.iter().filter(|record| !record.seat.taken).collect();
    if free.len() < excess {
        return Err(BookingError::InsufficientFreeSeats);
    }
    free.sort_by(|a, b| b.seat.index.cmp(&a.seat.index).then(b.id.cmp(&a.id)));

    Ok(ResizePlan {
        add: Vec::new(),
        remove: free.into_iter().take(excess).map(|record| record.id).collect(),
    })
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a stored event.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] for malformed documents.
pub fn event_record(date: DateKey, snapshot: &Snapshot) -> Result<EventRecord, StoreError> {
    Ok(EventRecord {
        date,
        slot: snapshot.id().parse::<SlotKey>()?,
        event: snapshot.decode()?,
        created_at: snapshot.create_time,
        updated_at: snapshot.update_time,
    })
}

/// Decode seat documents, ordered by index.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] for malformed documents.
pub fn seat_records(snapshots: &[Snapshot]) -> Result<Vec<SeatRecord>, StoreError> {
    let mut seats = snapshots
        .iter()
        .map(|snapshot| {
            Ok(SeatRecord {
                id: snapshot.id().parse::<SeatId>()?,
                seat: snapshot.decode()?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    seats.sort_by_key(|record| (record.seat.index, record.id));
    Ok(seats)
}

async fn read_event(
    tx: &mut dyn Transaction,
    date: DateKey,
    slot: SlotKey,
) -> Result<Event, BookingError> {
    tx.get(&paths::event(date, slot))
        .await?
        .ok_or(BookingError::EventNotFound)?
        .decode()
        .map_err(BookingError::from)
}

pub(crate) async fn read_seat(
    tx: &mut dyn Transaction,
    date: DateKey,
    slot: SlotKey,
    seat: SeatId,
) -> Result<Seat, BookingError> {
    tx.get(&paths::seat(date, slot, seat))
        .await?
        .ok_or(BookingError::SeatNotFound)?
        .decode()
        .map_err(BookingError::from)
}

async fn read_seats(
    tx: &mut dyn Transaction,
    date: DateKey,
    slot: SlotKey,
) -> Result<Vec<SeatRecord>, StoreError> {
    let snapshots = tx.list(&paths::seats(date, slot)).await?;
    seat_records(&snapshots)
}

/// Holder marker to delete when `occupant` leaves `seat`, if it points at that seat.
pub(crate) async fn holder_of(
    tx: &mut dyn Transaction,
    date: DateKey,
    slot: SlotKey,
    occupant: &OccupantId,
    seat: SeatId,
) -> Result<Option<DocPath>, StoreError> {
    let path = paths::holder(date, slot, occupant);
    let Some(snapshot) = tx.get(&path).await? else {
        return Ok(None);
    };
    let marker: HolderMarker = snapshot.decode()?;
    Ok((marker.seat_id == seat).then_some(path))
}

fn write_seats(tx: &mut dyn Transaction, date: DateKey, slot: SlotKey, plan: &ResizePlan) -> Result<(), StoreError> {
    for index in &plan.add {
        tx.create(&paths::seat(date, slot, SeatId::new()), encode(&Seat::free(*index))?);
    }
    for seat in &plan.remove {
        tx.delete(&paths::seat(date, slot, *seat));
    }
    Ok(())
}

// ============================================================================
// Transaction bodies
// ============================================================================

/// Whether [`SaveEvent`] created a new event or edited an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Event and seats were created.
    Created,
    /// Fields were merged and seats resized.
    Updated {
        /// Seats added
        added: usize,
        /// Seats removed
        removed: usize,
    },
}

/// Create an event with all of its seats, or merge into the existing one.
#[derive(Debug, Clone)]
pub struct SaveEvent {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Administrator input.
    pub draft: EventDraft,
    /// Administrator saving the event.
    pub created_by: OccupantId,
    /// Start instant of the slot.
    pub slot_start_at: DateTime<Utc>,
}

impl TransactionBody for SaveEvent {
    type Output = SaveOutcome;
    type Error = BookingError;

    fn run<'a>(
        &'a self,
        tx: &'a mut dyn Transaction,
    ) -> BoxFuture<'a, Result<SaveOutcome, BookingError>> {
        Box::pin(async move {
            if self.draft.capacity == 0 {
                return Err(BookingError::InvalidCapacity);
            }
            if tx
                .get(&paths::reservation(self.date, self.slot))
                .await?
                .is_some()
            {
                return Err(BookingError::SlotTypeConflict);
            }

            let path = paths::event(self.date, self.slot);
            let Some(existing) = tx.get(&path).await? else {
                ensure_slot_open(tx, self.date, self.slot).await?;
                let event = Event {
                    title: self.draft.title.clone(),
                    capacity: self.draft.capacity,
                    rules: self.draft.rules.clone(),
                    image_ref: self.draft.image_ref.clone(),
                    locked: self.draft.locked,
                    slot_start_at: self.slot_start_at,
                    created_by: self.created_by.clone(),
                };
                tx.create(&path, encode(&event)?);
                let plan = ResizePlan {
                    add: (1..=self.draft.capacity).collect(),
                    remove: Vec::new(),
                };
                write_seats(tx, self.date, self.slot, &plan)?;
                return Ok(SaveOutcome::Created);
            };

            let mut event: Event = existing.decode()?;
            let seats = read_seats(tx, self.date, self.slot).await?;
            let plan = plan_resize(&seats, self.draft.capacity)?;

            event.title.clone_from(&self.draft.title);
            event.capacity = self.draft.capacity;
            event.rules.clone_from(&self.draft.rules);
            if self.draft.image_ref.is_some() {
                event.image_ref.clone_from(&self.draft.image_ref);
            }
            event.locked = self.draft.locked;

            tx.update(&path, encode(&event)?);
            write_seats(tx, self.date, self.slot, &plan)?;
            Ok(SaveOutcome::Updated {
                added: plan.add.len(),
                removed: plan.remove.len(),
            })
        })
    }
}

/// Change the number of seats of an existing event.
#[derive(Debug, Clone)]
pub struct ResizeCapacity {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Target capacity.
    pub new_capacity: u32,
}

impl TransactionBody for ResizeCapacity {
    type Output = ResizePlan;
    type Error = BookingError;

    fn run<'a>(
        &'a self,
        tx: &'a mut dyn Transaction,
    ) -> BoxFuture<'a, Result<ResizePlan, BookingError>> {
        Box::pin(async move {
            if self.new_capacity == 0 {
                return Err(BookingError::InvalidCapacity);
            }
            read_event(tx, self.date, self.slot).await?;
            let seats = read_seats(tx, self.date, self.slot).await?;
            let plan = plan_resize(&seats, self.new_capacity)?;

            tx.update(
                &paths::event(self.date, self.slot),
                json!({ "capacity": self.new_capacity }),
            );
            write_seats(tx, self.date, self.slot, &plan)?;
            Ok(plan)
        })
    }
}

/// Delete an event with its seats, waitlist and holder markers.
#[derive(Debug, Clone)]
pub struct DeleteEvent {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
}

impl TransactionBody for DeleteEvent {
    type Output = usize;
    type Error = BookingError;

    fn run<'a>(&'a self, tx: &'a mut dyn Transaction) -> BoxFuture<'a, Result<usize, BookingError>> {
        Box::pin(async move {
            read_event(tx, self.date, self.slot).await?;
            let mut doomed: Vec<DocPath> = Vec::new();
            for collection in [
                paths::seats(self.date, self.slot),
                paths::waitlist(self.date, self.slot),
                paths::holders(self.date, self.slot),
            ] {
                doomed.extend(tx.list(&collection).await?.into_iter().map(|s| s.path));
            }

            for path in &doomed {
                tx.delete(path);
            }
            tx.delete(&paths::event(self.date, self.slot));
            Ok(doomed.len() + 1)
        })
    }
}

/// Take a specific free seat.
#[derive(Debug, Clone)]
pub struct JoinSeat {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Seat picked by the caller from an earlier read.
    pub seat: SeatId,
    /// Who takes the seat.
    pub occupant: OccupantId,
    /// Instant the request is evaluated at.
    pub now: DateTime<Utc>,
    /// Lead-time rule.
    pub eligibility: Eligibility,
    /// Double seating policy.
    pub double_seat: DoubleSeatPolicy,
}

impl TransactionBody for JoinSeat {
    type Output = SeatRecord;
    type Error = BookingError;

    fn run<'a>(
        &'a self,
        tx: &'a mut dyn Transaction,
    ) -> BoxFuture<'a, Result<SeatRecord, BookingError>> {
        Box::pin(async move {
            let event = read_event(tx, self.date, self.slot).await?;
            if event.locked {
                return Err(BookingError::EventLocked);
            }

            ensure_occupant_active(tx, &self.occupant, self.now).await?;
            self.eligibility.check(self.now, self.date, self.slot)?;

            let holder = paths::holder(self.date, self.slot, &self.occupant);
            if self.double_seat == DoubleSeatPolicy::Reject && tx.get(&holder).await?.is_some() {
                return Err(BookingError::AlreadyInEvent);
            }

            let seat = read_seat(tx, self.date, self.slot, self.seat).await?;
            if seat.taken {
                return Err(BookingError::SeatNoLongerAvailable);
            }

            let entry = paths::waitlist_entry(self.date, self.slot, &self.occupant);
            let queued = tx.get(&entry).await?.is_some();

            let taken = Seat::taken_by(seat.index, self.occupant.clone());
            tx.update(&paths::seat(self.date, self.slot, self.seat), encode(&taken)?);
            if queued {
                tx.delete(&entry);
            }
            if self.double_seat == DoubleSeatPolicy::Reject {
                tx.create(&holder, encode(&HolderMarker { seat_id: self.seat })?);
            }

            Ok(SeatRecord {
                id: self.seat,
                seat: taken,
            })
        })
    }
}

/// Free a seat without promoting anyone.
#[derive(Debug, Clone)]
pub struct FreeSeat {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Seat to free.
    pub seat: SeatId,
}

impl TransactionBody for FreeSeat {
    type Output = Option<OccupantId>;
    type Error = BookingError;

    fn run<'a>(
        &'a self,
        tx: &'a mut dyn Transaction,
    ) -> BoxFuture<'a, Result<Option<OccupantId>, BookingError>> {
        Box::pin(async move {
            read_event(tx, self.date, self.slot).await?;
            let seat = read_seat(tx, self.date, self.slot, self.seat).await?;
            if !seat.taken {
                return Ok(None);
            }
            let occupant = seat.occupant().cloned();
            let holder = match &occupant {
                Some(occupant) => holder_of(tx, self.date, self.slot, occupant, self.seat).await?,
                None => None,
            };

            tx.update(
                &paths::seat(self.date, self.slot, self.seat),
                encode(&Seat::free(seat.index))?,
            );
            if let Some(holder) = holder {
                tx.delete(&holder);
            }
            Ok(occupant)
        })
    }
}
