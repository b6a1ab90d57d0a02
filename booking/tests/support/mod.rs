//! Shared fixtures for the booking integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, Utc};
use courtside_booking::{
    BookingEnvironment, BookingService, Config, DateKey, DoubleSeatPolicy, OccupantId,
    PromotionLockPolicy, SeatId, SlotKey,
};
use courtside_core::environment::Clock;
use courtside_testing::{FixedClock, InMemoryDocumentStore, ManualClock};
use std::sync::Arc;

/// Business day used throughout the tests.
pub fn day() -> DateKey {
    "2025-06-10".parse().unwrap()
}

/// Noon UTC the day before, comfortably outside every lead-time window of [`day`].
pub fn day_before() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-09T12:00:00Z")
        .unwrap()
        .to_utc()
}

pub fn occupant(id: &str) -> OccupantId {
    id.parse().unwrap()
}

pub fn admin() -> OccupantId {
    occupant("admin")
}

pub const EVENING: SlotKey = SlotKey::hm(19, 30);

/// Config with a generous retry budget for contended tests.
pub fn config() -> Config {
    let mut config = Config::default();
    config.transactions.max_retries = 50;
    config.transactions.initial_delay_ms = 1;
    config.transactions.max_delay_ms = 5;
    config
}

pub fn with_policies(double_seat: DoubleSeatPolicy, promotion_lock: PromotionLockPolicy) -> Config {
    let mut config = config();
    config.policy.double_seat = double_seat;
    config.policy.promotion_lock = promotion_lock;
    config
}

pub struct Harness {
    pub service: Arc<BookingService>,
    pub store: InMemoryDocumentStore,
}

fn build(config: Config, clock: Arc<dyn Clock>) -> Harness {
    let store = InMemoryDocumentStore::with_clock(Arc::clone(&clock));
    let env = BookingEnvironment::new(Arc::new(store.clone()), clock);
    Harness {
        service: Arc::new(BookingService::new(env, config)),
        store,
    }
}

/// Service over a fresh store whose commits are stamped by a [`ManualClock`].
pub fn harness_with_clock(config: Config) -> (Harness, ManualClock) {
    let clock = ManualClock::at(day_before());
    (build(config, clock.shared()), clock)
}

pub fn harness(config: Config) -> Harness {
    harness_with_clock(config).0
}

/// Service whose store stamps every commit with the same instant.
pub fn frozen_harness(config: Config) -> Harness {
    build(config, Arc::new(FixedClock::new(day_before())))
}

impl Harness {
    pub async fn event(&self, slot: SlotKey, capacity: u32) {
        self.service
            .save_event(
                day(),
                slot,
                &courtside_booking::EventDraft::new("Americano", capacity),
                &admin(),
            )
            .await
            .unwrap();
    }

    pub async fn seat_ids(&self, slot: SlotKey) -> Vec<SeatId> {
        self.service
            .seats(day(), slot)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect()
    }

    pub async fn taken(&self, slot: SlotKey) -> Vec<(u32, OccupantId)> {
        self.service
            .seats(day(), slot)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|record| {
                record
                    .seat
                    .occupant()
                    .cloned()
                    .map(|occupant| (record.seat.index, occupant))
            })
            .collect()
    }

    pub async fn queued(&self, slot: SlotKey) -> Vec<String> {
        self.service
            .waitlist(day(), slot)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.occupant_id.to_string())
            .collect()
    }
}
