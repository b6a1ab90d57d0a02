//! # Courtside Booking
//!
//! Reservation engine for a single padel court: one-off slot reservations,
//! capacity-limited events with seats, a FIFO waitlist per event, and atomic
//! promotion of the waitlist head into a freed seat.
//!
//! # Architecture
//!
//! ```text
//!               ┌──────────────────────────────┐
//!               │        BookingService        │
//!               └──────────────────────────────┘
//!                 │            │             │
//!     ┌───────────┘            │             └───────────┐
//!     ▼                        ▼                         ▼
//! ┌───────────┐  ┌───────────────────────────┐   ┌──────────────┐
//! │ Calendar  │  │    Transaction bodies     │   │    Views     │
//! │Eligibility│  │ Reserve  SaveEvent        │   │  day board   │
//! └───────────┘  │ JoinSeat JoinWaitlist     │   │  bookings    │
//!                │ FreeSeatAndPromote ...    │   │  usage       │
//!                └───────────────────────────┘   └──────────────┘
//!                              │                         │
//!                              ▼                         ▼
//!                   run_transaction (retry on conflict)  │
//!                              │                         │
//!                              ▼                         ▼
//!                       ┌─────────────────────────────────────┐
//!                       │     DocumentStore (optimistic)      │
//!                       └─────────────────────────────────────┘
//! ```
//!
//! # Key rules
//!
//! Every invariant-bearing change is one transaction whose decisions come only from
//! what it reads:
//!
//! - a slot holds a reservation or an event, never both
//! - a blocked slot takes no new reservation or event, and a suspended occupant
//!   books nothing until the suspension ends
//! - at most one reservation per slot (create-once)
//! - taken seats never exceed capacity, and a seat has an occupant iff it is taken
//! - freeing a seat and promoting the waitlist head commit together
//!
//! Reads outside transactions ([`views`], [`usage`], the advisory getters of
//! [`BookingService`]) only inform the caller's next choice.
//!
//! # Example
//!
//! ```no_run
//! use courtside_booking::{BookingEnvironment, BookingService, Config, SlotKey};
//! use courtside_core::environment::SystemClock;
//! use courtside_testing::InMemoryDocumentStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = BookingEnvironment::new(
//!     Arc::new(InMemoryDocumentStore::new()),
//!     Arc::new(SystemClock),
//! );
//! let service = BookingService::new(env, Config::default());
//!
//! let date = "2025-06-10".parse()?;
//! let alice = "alice".parse()?;
//! service
//!     .reserve(date, SlotKey::hm(9, 0), &alice, "Alice", service.now())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod blocks;
pub mod calendar;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod metrics;
pub mod paths;
pub mod promotion;
pub mod reservations;
pub mod service;
pub mod types;
pub mod usage;
pub mod views;
pub mod waitlist;

pub use calendar::{generate_slots, Calendar};
pub use config::{Config, DoubleSeatPolicy, PromotionLockPolicy};
pub use eligibility::{is_offerable, Eligibility};
pub use error::{BookingError, Recovery};
pub use events::{EventDraft, ResizePlan, SaveOutcome};
pub use promotion::PromotionOutcome;
pub use service::{BookingEnvironment, BookingService, JoinOutcome};
pub use types::{
    DateKey, Event, EventRecord, Money, OccupantBlock, OccupantId, Period, Reservation,
    ReservationRecord, Seat, SeatId, SeatRecord, Slot, SlotBlock, SlotBlockRecord, SlotKey,
    WaitlistRecord,
};
pub use views::{Booking, BookingKind, SlotBoard, SlotState};
