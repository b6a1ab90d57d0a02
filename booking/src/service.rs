//! Booking service.
//!
//! [`BookingService`] is the entry point callers use. It binds the store, the clock
//! and the configuration, runs each operation's transaction body through the
//! retrying driver, and turns the few store-level outcomes that have a domain
//! meaning (a create-once collision at commit time) into the matching
//! [`BookingError`].

use crate::blocks::{slot_block_record, BlockOccupant, BlockSlot};
use crate::calendar::Calendar;
use crate::config::Config;
use crate::eligibility::Eligibility;
use crate::error::BookingError;
use crate::events::{
    event_record, seat_records, DeleteEvent, EventDraft, FreeSeat, JoinSeat, ResizeCapacity,
    ResizePlan, SaveEvent, SaveOutcome,
};
use crate::metrics;
use crate::paths;
use crate::promotion::{FreeSeatAndPromote, PromotionOutcome, PromotionStep};
use crate::reservations::{reservation_record, Reserve};
use crate::types::{
    DateKey, EventRecord, OccupantBlock, OccupantId, Reservation, ReservationRecord, SeatId,
    SeatRecord, Seat, Slot, SlotBlock, SlotBlockRecord, SlotKey, WaitlistRecord,
};
use crate::usage::{self, DaySummary, RankingEntry};
use crate::views::{self, Booking, SlotBoard};
use crate::waitlist::{queue, JoinWaitlist};
use chrono::{DateTime, Utc};
use courtside_core::environment::Clock;
use courtside_core::store::{DocumentStore, StoreError, TransactionBody};
use courtside_runtime::{run_transaction, RetryPolicy};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// External collaborators of the booking engine.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Transactional document store.
    pub store: Arc<dyn DocumentStore>,
    /// Source of "now" for callers that do not pass one.
    pub clock: Arc<dyn Clock>,
}

impl BookingEnvironment {
    /// Bundle a store and a clock.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

/// Result of [`BookingService::join_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The occupant holds this seat.
    Seated(SeatId),
    /// No seat was free; the occupant is on the waitlist.
    Queued,
}

/// Slot reservations, event seats, waitlists and promotion.
pub struct BookingService {
    env: BookingEnvironment,
    config: Config,
    calendar: Calendar,
    eligibility: Eligibility,
    retry: RetryPolicy,
}

impl BookingService {
    /// Create a service over `env` with `config`.
    #[must_use]
    pub fn new(env: BookingEnvironment, config: Config) -> Self {
        Self {
            calendar: Calendar::new(&config.schedule),
            eligibility: Eligibility::from_config(&config.schedule),
            retry: config.transactions.retry_policy(),
            env,
            config,
        }
    }

    /// Current time from the environment clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.env.clock.now()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The daily schedule.
    #[must_use]
    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// The lead-time rule.
    #[must_use]
    pub const fn eligibility(&self) -> &Eligibility {
        &self.eligibility
    }

    /// Slots of every business day.
    #[must_use]
    pub fn generate_slots(&self) -> &[Slot] {
        self.calendar.slots()
    }

    /// Whether `slot` on `date` can be booked at `now`.
    #[must_use]
    pub fn is_offerable(&self, now: DateTime<Utc>, date: DateKey, slot: SlotKey) -> bool {
        self.eligibility.is_offerable(now, date, slot)
    }

    fn slot(&self, key: SlotKey) -> Result<&Slot, BookingError> {
        self.calendar.slot(key).ok_or(BookingError::UnknownSlot(key))
    }

    async fn run<B>(&self, body: &B) -> Result<B::Output, BookingError>
    where
        B: TransactionBody<Error = BookingError>,
    {
        let result = run_transaction(self.env.store.as_ref(), &self.retry, body).await;
        if let Err(BookingError::Store(error)) = &result {
            tracing::error!(%error, "Booking transaction failed");
        }
        result
    }

    // ------------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------------

    /// Reserve a slot for one occupant.
    ///
    /// # Errors
    ///
    /// - [`BookingError::UnknownSlot`]: `slot` is not on the schedule
    /// - [`BookingError::OccupantBlocked`]: the occupant is suspended
    /// - [`BookingError::SlotBlocked`]: an administrator closed the slot
    /// - [`BookingError::SlotTypeConflict`]: the slot hosts an event
    /// - [`BookingError::AlreadyReserved`]: someone else holds the slot
    /// - [`BookingError::LeadTimeViolation`]: the slot starts too soon
    pub async fn reserve(
        &self,
        date: DateKey,
        slot: SlotKey,
        occupant: &OccupantId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Reservation, BookingError> {
        let end = self.slot(slot)?.end;
        let body = Reserve {
            date,
            slot,
            reservation: Reservation {
                occupant_id: occupant.clone(),
                display_name: display_name.to_string(),
                start_at: self.eligibility.start_at(date, slot),
                end_at: self.eligibility.start_at(date, end),
            },
            now,
            eligibility: self.eligibility,
        };

        let result = self.run(&body).await.map_err(|error| match error {
            BookingError::Store(StoreError::AlreadyExists(_)) => BookingError::AlreadyReserved,
            other => other,
        });
        metrics::record_reservation(&result);

        match &result {
            Ok(_) => tracing::info!(%date, %slot, %occupant, "Reservation created"),
            Err(error) => tracing::debug!(%date, %slot, %occupant, %error, "Reservation rejected"),
        }
        result
    }

    /// Delete a reservation. Releasing a free slot is not an error.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn release(&self, date: DateKey, slot: SlotKey) -> Result<(), BookingError> {
        self.env.store.delete(&paths::reservation(date, slot)).await?;
        tracing::info!(%date, %slot, "Reservation released");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Event administration
    // ------------------------------------------------------------------------

    /// Create an event with its seats, or merge `draft` into the existing event.
    ///
    /// # Errors
    ///
    /// - [`BookingError::UnknownSlot`], [`BookingError::InvalidCapacity`]
    /// - [`BookingError::SlotTypeConflict`]: the slot is reserved
    /// - [`BookingError::SlotBlocked`]: creating an event in a closed slot
    /// - [`BookingError::CapacityBelowOccupancy`], [`BookingError::InsufficientFreeSeats`]:
    ///   editing would remove occupied seats
    pub async fn save_event(
        &self,
        date: DateKey,
        slot: SlotKey,
        draft: &EventDraft,
        admin: &OccupantId,
    ) -> Result<SaveOutcome, BookingError> {
        self.slot(slot)?;
        if draft.capacity == 0 {
            return Err(BookingError::InvalidCapacity);
        }
        let body = SaveEvent {
            date,
            slot,
            draft: draft.clone(),
            created_by: admin.clone(),
            slot_start_at: self.eligibility.start_at(date, slot),
        };

        let result = self.run(&body).await;
        metrics::record_event_saved(&result);
        if let Ok(outcome) = &result {
            tracing::info!(%date, %slot, capacity = draft.capacity, ?outcome, "Event saved");
        }
        result
    }

    /// Change an event's capacity.
    ///
    /// # Errors
    ///
    /// - [`BookingError::EventNotFound`], [`BookingError::InvalidCapacity`]
    /// - [`BookingError::CapacityBelowOccupancy`]: more seats are taken than `new_capacity`
    /// - [`BookingError::InsufficientFreeSeats`]: not enough free seats to remove
    pub async fn resize_capacity(
        &self,
        date: DateKey,
        slot: SlotKey,
        new_capacity: u32,
    ) -> Result<ResizePlan, BookingError> {
        let plan = self
            .run(&ResizeCapacity {
                date,
                slot,
                new_capacity,
            })
            .await?;
        tracing::info!(
            %date,
            %slot,
            new_capacity,
            added = plan.add.len(),
            removed = plan.remove.len(),
            "Event resized"
        );
        Ok(plan)
    }

    async fn patch_event(
        &self,
        date: DateKey,
        slot: SlotKey,
        patch: serde_json::Value,
    ) -> Result<(), BookingError> {
        self.env
            .store
            .update(&paths::event(date, slot), patch)
            .await
            .map_err(|error| match error {
                StoreError::NotFound(_) => BookingError::EventNotFound,
                other => other.into(),
            })
    }

    /// Lock or unlock an event's roster.
    ///
    /// # Errors
    ///
    /// [`BookingError::EventNotFound`] if no event is hosted in the slot.
    pub async fn set_locked(
        &self,
        date: DateKey,
        slot: SlotKey,
        locked: bool,
    ) -> Result<(), BookingError> {
        self.patch_event(date, slot, json!({ "locked": locked })).await?;
        tracing::info!(%date, %slot, locked, "Event lock changed");
        Ok(())
    }

    /// Replace or clear an event's image reference.
    ///
    /// # Errors
    ///
    /// [`BookingError::EventNotFound`] if no event is hosted in the slot.
    pub async fn update_image(
        &self,
        date: DateKey,
        slot: SlotKey,
        image_ref: Option<&str>,
    ) -> Result<(), BookingError> {
        self.patch_event(date, slot, json!({ "imageRef": image_ref })).await?;
        tracing::info!(%date, %slot, cleared = image_ref.is_none(), "Event image updated");
        Ok(())
    }

    /// Delete an event with its seats, waitlist and holder markers.
    ///
    /// # Errors
    ///
    /// [`BookingError::EventNotFound`] if no event is hosted in the slot.
    pub async fn delete_event(&self, date: DateKey, slot: SlotKey) -> Result<(), BookingError> {
        let removed = self.run(&DeleteEvent { date, slot }).await?;
        tracing::info!(%date, %slot, documents = removed, "Event deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------

    /// Close a slot to new reservations and events.
    ///
    /// Bookings committed before the block stay in place.
    ///
    /// # Errors
    ///
    /// - [`BookingError::UnknownSlot`]
    /// - [`BookingError::AlreadyBlocked`]: safe to treat as success
    pub async fn block_slot(
        &self,
        date: DateKey,
        slot: SlotKey,
        reason: &str,
    ) -> Result<(), BookingError> {
        self.slot(slot)?;
        let body = BlockSlot {
            date,
            slot,
            block: SlotBlock {
                reason: reason.to_string(),
            },
        };

        let result = self.run(&body).await.map_err(|error| match error {
            BookingError::Store(StoreError::AlreadyExists(_)) => BookingError::AlreadyBlocked,
            other => other,
        });
        metrics::record_slot_block(&result);
        if result.is_ok() {
            tracing::info!(%date, %slot, reason, "Slot blocked");
        }
        result
    }

    /// Reopen a slot. Unblocking an open slot is not an error.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn unblock_slot(&self, date: DateKey, slot: SlotKey) -> Result<(), BookingError> {
        self.env.store.delete(&paths::slot_block(date, slot)).await?;
        tracing::info!(%date, %slot, "Slot unblocked");
        Ok(())
    }

    /// Suspend an occupant's reservations, seat joins and waitlist joins until
    /// `until`. Replaces any earlier suspension.
    ///
    /// Existing bookings are left alone.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn block_occupant(
        &self,
        occupant: &OccupantId,
        until: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        self.run(&BlockOccupant {
            occupant: occupant.clone(),
            block: OccupantBlock {
                blocked_until: until,
            },
        })
        .await?;
        tracing::info!(%occupant, %until, "Occupant blocked");
        Ok(())
    }

    /// Lift an occupant's suspension. Not an error when none exists.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn unblock_occupant(&self, occupant: &OccupantId) -> Result<(), BookingError> {
        self.env.store.delete(&paths::occupant_block(occupant)).await?;
        tracing::info!(%occupant, "Occupant unblocked");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Seats and waitlist
    // ------------------------------------------------------------------------

    /// Take a specific seat.
    ///
    /// # Errors
    ///
    /// - [`BookingError::EventNotFound`], [`BookingError::SeatNotFound`]
    /// - [`BookingError::EventLocked`]
    /// - [`BookingError::OccupantBlocked`]
    /// - [`BookingError::LeadTimeViolation`]
    /// - [`BookingError::AlreadyInEvent`]: under the reject policy
    /// - [`BookingError::SeatNoLongerAvailable`]: someone took the seat first
    pub async fn join_seat(
        &self,
        date: DateKey,
        slot: SlotKey,
        seat: SeatId,
        occupant: &OccupantId,
        now: DateTime<Utc>,
    ) -> Result<SeatRecord, BookingError> {
        let body = JoinSeat {
            date,
            slot,
            seat,
            occupant: occupant.clone(),
            now,
            eligibility: self.eligibility,
            double_seat: self.config.policy.double_seat,
        };

        let result = self.run(&body).await;
        metrics::record_seat_join(&result);
        match &result {
            Ok(record) => {
                tracing::info!(%date, %slot, %seat, index = record.seat.index, %occupant, "Seat taken");
            }
            Err(error) => tracing::debug!(%date, %slot, %seat, %occupant, %error, "Seat not taken"),
        }
        result
    }

    /// Take the lowest free seat, trying the next one after each lost race, and
    /// queue on the waitlist when none is left.
    ///
    /// Being already queued counts as [`JoinOutcome::Queued`].
    ///
    /// # Errors
    ///
    /// Any [`Self::join_seat`] or [`Self::join_waitlist`] error other than a lost
    /// seat race or a duplicate waitlist entry.
    pub async fn join_event(
        &self,
        date: DateKey,
        slot: SlotKey,
        occupant: &OccupantId,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, BookingError> {
        let mut lost: HashSet<SeatId> = HashSet::new();

        loop {
            let seats = self.seats(date, slot).await?;
            let candidate = seats
                .iter()
                .find(|record| !record.seat.taken && !lost.contains(&record.id))
                .map(|record| record.id);

            let Some(seat) = candidate else {
                return match self.join_waitlist(date, slot, occupant, now).await {
                    Ok(()) | Err(BookingError::AlreadyQueued) => Ok(JoinOutcome::Queued),
                    Err(error) => Err(error),
                };
            };

            match self.join_seat(date, slot, seat, occupant, now).await {
                Ok(_) => return Ok(JoinOutcome::Seated(seat)),
                Err(BookingError::SeatNoLongerAvailable | BookingError::SeatNotFound) => {
                    tracing::debug!(%date, %slot, %seat, %occupant, "Lost seat race, trying next seat");
                    lost.insert(seat);
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Queue for a seat.
    ///
    /// # Errors
    ///
    /// - [`BookingError::EventNotFound`], [`BookingError::EventLocked`]
    /// - [`BookingError::OccupantBlocked`]
    /// - [`BookingError::LeadTimeViolation`]
    /// - [`BookingError::AlreadyInEvent`]: under the reject policy
    /// - [`BookingError::AlreadyQueued`]: safe to treat as success
    pub async fn join_waitlist(
        &self,
        date: DateKey,
        slot: SlotKey,
        occupant: &OccupantId,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let body = JoinWaitlist {
            date,
            slot,
            occupant: occupant.clone(),
            now,
            eligibility: self.eligibility,
            double_seat: self.config.policy.double_seat,
        };

        let result = self.run(&body).await.map_err(|error| match error {
            BookingError::Store(StoreError::AlreadyExists(_)) => BookingError::AlreadyQueued,
            other => other,
        });
        metrics::record_waitlist_join(&result);
        match &result {
            Ok(()) => tracing::info!(%date, %slot, %occupant, "Joined waitlist"),
            Err(error) => tracing::debug!(%date, %slot, %occupant, %error, "Waitlist join rejected"),
        }
        result
    }

    /// Leave the waitlist. Leaving when not queued is not an error.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn leave_waitlist(
        &self,
        date: DateKey,
        slot: SlotKey,
        occupant: &OccupantId,
    ) -> Result<(), BookingError> {
        self.env
            .store
            .delete(&paths::waitlist_entry(date, slot, occupant))
            .await?;
        tracing::info!(%date, %slot, %occupant, "Left waitlist");
        Ok(())
    }

    /// Administrative removal of a waitlist entry.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn remove_from_waitlist(
        &self,
        date: DateKey,
        slot: SlotKey,
        occupant: &OccupantId,
    ) -> Result<(), BookingError> {
        self.leave_waitlist(date, slot, occupant).await
    }

    /// Free a seat without promoting anyone. Returns the displaced occupant.
    ///
    /// # Errors
    ///
    /// [`BookingError::EventNotFound`], [`BookingError::SeatNotFound`].
    pub async fn free_seat(
        &self,
        date: DateKey,
        slot: SlotKey,
        seat: SeatId,
    ) -> Result<Option<OccupantId>, BookingError> {
        let previous = self.run(&FreeSeat { date, slot, seat }).await?;
        tracing::info!(%date, %slot, %seat, previous = ?previous, "Seat freed");
        Ok(previous)
    }

    /// Free a seat and hand it to the head of the waitlist in one commit.
    ///
    /// # Errors
    ///
    /// - [`BookingError::EventNotFound`], [`BookingError::SeatNotFound`]
    /// - [`BookingError::EventLocked`]: under the honor lock policy
    /// - [`BookingError::WaitlistEntryVanished`]: the head left mid-promotion; the
    ///   seat was freed and promotion can be retried
    pub async fn free_seat_and_promote(
        &self,
        date: DateKey,
        slot: SlotKey,
        seat: SeatId,
    ) -> Result<PromotionOutcome, BookingError> {
        let expected_occupant = match self.env.store.get(&paths::seat(date, slot, seat)).await? {
            Some(snapshot) => snapshot.decode::<Seat>()?.occupant().cloned(),
            None => None,
        };
        let body = FreeSeatAndPromote {
            date,
            slot,
            seat,
            expected_occupant,
            double_seat: self.config.policy.double_seat,
            lock_policy: self.config.policy.promotion_lock,
        };

        let step = match self.run(&body).await {
            Ok(step) => step,
            Err(error) => {
                metrics::record_promotion(error.label());
                tracing::debug!(%date, %slot, %seat, %error, "Promotion rejected");
                return Err(error);
            }
        };

        match step {
            PromotionStep::Completed(outcome) => {
                match &outcome {
                    PromotionOutcome::Promoted {
                        occupant, previous, ..
                    } => {
                        metrics::record_promotion("promoted");
                        tracing::info!(%date, %slot, %seat, %occupant, previous = ?previous, "Waitlist head promoted");
                    }
                    PromotionOutcome::Freed { previous, .. } => {
                        metrics::record_promotion("freed");
                        tracing::info!(%date, %slot, %seat, previous = ?previous, "Seat freed, waitlist empty");
                    }
                    PromotionOutcome::Stale { .. } => {
                        metrics::record_promotion("stale");
                        tracing::debug!(%date, %slot, %seat, "Seat changed hands before promotion");
                    }
                }
                Ok(outcome)
            }
            PromotionStep::HeadVanished { previous, head } => {
                let error = BookingError::WaitlistEntryVanished;
                metrics::record_promotion(error.label());
                tracing::warn!(%date, %slot, %seat, %head, previous = ?previous, "Waitlist head vanished; seat freed");
                Err(error)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Advisory reads
    // ------------------------------------------------------------------------

    /// The reservation of a slot.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn reservation(
        &self,
        date: DateKey,
        slot: SlotKey,
    ) -> Result<Option<ReservationRecord>, BookingError> {
        let snapshot = self.env.store.get(&paths::reservation(date, slot)).await?;
        Ok(snapshot
            .map(|snapshot| reservation_record(date, &snapshot))
            .transpose()?)
    }

    /// The block of a slot.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn slot_block(
        &self,
        date: DateKey,
        slot: SlotKey,
    ) -> Result<Option<SlotBlockRecord>, BookingError> {
        let snapshot = self.env.store.get(&paths::slot_block(date, slot)).await?;
        Ok(snapshot
            .map(|snapshot| slot_block_record(date, &snapshot))
            .transpose()?)
    }

    /// The suspension of an occupant, expired or not.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn occupant_block(
        &self,
        occupant: &OccupantId,
    ) -> Result<Option<OccupantBlock>, BookingError> {
        let snapshot = self.env.store.get(&paths::occupant_block(occupant)).await?;
        Ok(snapshot
            .map(|snapshot| snapshot.decode::<OccupantBlock>())
            .transpose()?)
    }

    /// The event hosted in a slot.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn event(
        &self,
        date: DateKey,
        slot: SlotKey,
    ) -> Result<Option<EventRecord>, BookingError> {
        let snapshot = self.env.store.get(&paths::event(date, slot)).await?;
        Ok(snapshot
            .map(|snapshot| event_record(date, &snapshot))
            .transpose()?)
    }

    /// Seats of an event, ordered by index.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn seats(&self, date: DateKey, slot: SlotKey) -> Result<Vec<SeatRecord>, BookingError> {
        let snapshots = self.env.store.list(&paths::seats(date, slot)).await?;
        Ok(seat_records(&snapshots)?)
    }

    /// Waitlist of an event in promotion order.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn waitlist(
        &self,
        date: DateKey,
        slot: SlotKey,
    ) -> Result<Vec<WaitlistRecord>, BookingError> {
        let snapshots = self.env.store.list(&paths::waitlist(date, slot)).await?;
        Ok(queue(&snapshots)?)
    }

    /// Every slot of `date` with its occupancy.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn day_board(
        &self,
        date: DateKey,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotBoard>, BookingError> {
        Ok(views::day_board(self.env.store.as_ref(), &self.calendar, &self.eligibility, date, now).await?)
    }

    /// Bookings of `occupant` over `days` days starting at `from`.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn occupant_bookings(
        &self,
        occupant: &OccupantId,
        from: DateKey,
        days: u32,
    ) -> Result<Vec<Booking>, BookingError> {
        Ok(views::occupant_bookings(
            self.env.store.as_ref(),
            &self.calendar,
            &self.eligibility,
            occupant,
            from,
            days,
        )
        .await?)
    }

    /// Top occupants by reservations over the default trailing window ending at `now`.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn reservation_ranking(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankingEntry>, BookingError> {
        Ok(usage::reservation_ranking(
            self.env.store.as_ref(),
            self.eligibility.today(now),
            usage::DEFAULT_WINDOW_DAYS,
            usage::DEFAULT_RANKING_LIMIT,
        )
        .await?)
    }

    /// Booking totals of `date`.
    ///
    /// # Errors
    ///
    /// Store failures and malformed documents.
    pub async fn day_summary(&self, date: DateKey) -> Result<DaySummary, BookingError> {
        Ok(usage::day_summary(self.env.store.as_ref(), date).await?)
    }
}
