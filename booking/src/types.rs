//! Domain types for the Courtside booking engine.
//!
//! Keys and value objects used to address the schedule, the typed bodies of every
//! stored document, and the read-side records that pair a body with its
//! store-assigned metadata.
//!
//! Stored bodies use camelCase field names; they are the documents other clients of
//! the same store read.

use chrono::{DateTime, NaiveDate, Utc};
use courtside_core::path::is_valid_segment;
use courtside_core::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a key cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind} '{value}'")]
pub struct ParseKeyError {
    kind: &'static str,
    value: String,
}

impl ParseKeyError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// Stored document ids that fail to parse are malformed documents.
impl From<ParseKeyError> for StoreError {
    fn from(error: ParseKeyError) -> Self {
        Self::Serialization(error.to_string())
    }
}

// ============================================================================
// Keys
// ============================================================================

/// Calendar date of a business day, formatted `YYYY-MM-DD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Wrap a calendar date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year, month and day.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// The date `days` later (or earlier, when negative).
    #[must_use]
    pub fn offset_days(&self, days: i64) -> Self {
        Self(self.0 + chrono::Duration::days(days))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ParseKeyError::new("date key", s))
    }
}

/// Start time of a slot as minutes past local midnight, formatted `HH:MM`.
///
/// Also used for slot end times, which may reach `24:00`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotKey(u16);

impl SlotKey {
    /// Build from hour and minute of day.
    #[must_use]
    pub const fn hm(hour: u16, minute: u16) -> Self {
        Self(hour * 60 + minute)
    }

    /// Build from minutes past midnight.
    #[must_use]
    pub const fn from_minutes(minutes: u16) -> Self {
        Self(minutes)
    }

    /// Minutes past midnight.
    #[must_use]
    pub const fn minutes(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for SlotKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseKeyError::new("slot key", s);
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        if minute >= 60 || hour > 24 || (hour == 24 && minute > 0) {
            return Err(invalid());
        }
        Ok(Self::hm(hour, minute))
    }
}

impl TryFrom<String> for SlotKey {
    type Error = ParseKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotKey> for String {
    fn from(key: SlotKey) -> Self {
        key.to_string()
    }
}

/// Stable identifier of a person, supplied by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OccupantId(String);

impl OccupantId {
    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OccupantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OccupantId {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_valid_segment(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseKeyError::new("occupant id", s))
        }
    }
}

impl TryFrom<String> for OccupantId {
    type Error = ParseKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_segment(&value) {
            Ok(Self(value))
        } else {
            Err(ParseKeyError::new("occupant id", &value))
        }
    }
}

impl From<OccupantId> for String {
    fn from(id: OccupantId) -> Self {
        id.0
    }
}

impl AsRef<str> for OccupantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatId(Uuid);

impl SeatId {
    /// Creates a new random `SeatId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `SeatId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SeatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SeatId {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseKeyError::new("seat id", s))
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Amount in Brazilian real, stored as cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Slots
// ============================================================================

/// Pricing tier of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Hourly slots across the daytime window.
    Daytime,
    /// Longer slots across the evening window.
    Evening,
}

/// A bookable time window of the daily schedule. Derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Start time; identifies the slot within a day.
    pub key: SlotKey,
    /// End time.
    pub end: SlotKey,
    /// Length in minutes.
    pub duration_minutes: u16,
    /// Price of the whole slot.
    pub price: Money,
    /// Pricing tier.
    pub period: Period,
}

// ============================================================================
// Stored documents
// ============================================================================

/// Single-occupant booking of a slot.
///
/// Stored at `reservations/{date}/slots/{slot}`. Immutable once created; its
/// creation time is the store's commit timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Who holds the slot.
    pub occupant_id: OccupantId,
    /// Name shown on the schedule.
    pub display_name: String,
    /// Start instant of the slot.
    pub start_at: DateTime<Utc>,
    /// End instant of the slot.
    pub end_at: DateTime<Utc>,
}

/// Capacity-limited, multi-occupant booking of a slot.
///
/// Stored at `events/{date}/slots/{slot}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Display title.
    pub title: String,
    /// Number of seats.
    pub capacity: u32,
    /// Free-text rules.
    #[serde(default)]
    pub rules: String,
    /// Reference to an image in external file storage.
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Blocks new seat acquisitions and promotions when set.
    #[serde(default)]
    pub locked: bool,
    /// Start instant of the slot.
    pub slot_start_at: DateTime<Utc>,
    /// Administrator who created the event.
    pub created_by: OccupantId,
}

/// One occupancy unit of an event.
///
/// Stored at `events/{date}/slots/{slot}/seats/{seatId}`. `occupant_id` is always
/// written (as `null` when free) so a merge-update clears it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// Stable 1-based position.
    pub index: u32,
    /// Whether someone occupies the seat.
    pub taken: bool,
    /// Occupant; present iff `taken`.
    pub occupant_id: Option<OccupantId>,
}

impl Seat {
    /// A free seat at `index`.
    #[must_use]
    pub const fn free(index: u32) -> Self {
        Self {
            index,
            taken: false,
            occupant_id: None,
        }
    }

    /// A seat at `index` held by `occupant`.
    #[must_use]
    pub const fn taken_by(index: u32, occupant: OccupantId) -> Self {
        Self {
            index,
            taken: true,
            occupant_id: Some(occupant),
        }
    }

    /// The occupant, if the seat is consistently taken.
    #[must_use]
    pub fn occupant(&self) -> Option<&OccupantId> {
        if self.taken {
            self.occupant_id.as_ref()
        } else {
            None
        }
    }
}

/// Waiting position of an occupant.
///
/// Stored at `events/{date}/slots/{slot}/waitlist/{occupantId}`; keyed by occupant so
/// each occupant queues at most once. FIFO order is the store's creation timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    /// Who is waiting.
    pub occupant_id: OccupantId,
}

/// Marks that an occupant holds a seat in an event.
///
/// Stored at `events/{date}/slots/{slot}/holders/{occupantId}` when double seating
/// is rejected, turning "one seat per occupant" into a create-once write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderMarker {
    /// The seat held.
    pub seat_id: SeatId,
}

/// Administrative closure of one slot.
///
/// Stored at `blocks/{date}/slots/{slot}`. While present the slot accepts no
/// reservation and no new event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotBlock {
    /// Why the slot is closed; shown on the schedule.
    pub reason: String,
}

/// Suspension of an occupant's booking actions.
///
/// Stored at `occupantBlocks/{occupantId}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupantBlock {
    /// Reservations, seat joins and waitlist joins are refused before this instant.
    pub blocked_until: DateTime<Utc>,
}

impl OccupantBlock {
    /// Whether the block still applies at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until > now
    }
}

// ============================================================================
// Read-side records
// ============================================================================

/// A slot block with its address and creation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotBlockRecord {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Stored body.
    pub block: SlotBlock,
    /// Commit timestamp of the blocking transaction.
    pub created_at: DateTime<Utc>,
}

/// A reservation with its address and creation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReservationRecord {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Stored body.
    pub reservation: Reservation,
    /// Commit timestamp of the creating transaction.
    pub created_at: DateTime<Utc>,
}

/// An event with its address and timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    /// Business day.
    pub date: DateKey,
    /// Slot.
    pub slot: SlotKey,
    /// Stored body.
    pub event: Event,
    /// Commit timestamp of the creating transaction.
    pub created_at: DateTime<Utc>,
    /// Commit timestamp of the last change.
    pub updated_at: DateTime<Utc>,
}

/// A seat with its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeatRecord {
    /// Seat document id.
    pub id: SeatId,
    /// Stored body.
    pub seat: Seat,
}

/// A waitlist entry with its FIFO timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WaitlistRecord {
    /// Who is waiting.
    pub occupant_id: OccupantId,
    /// Commit timestamp of the joining transaction.
    pub created_at: DateTime<Utc>,
}
