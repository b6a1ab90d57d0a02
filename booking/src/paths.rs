//! Store layout.
//!
//! ```text
//! reservations/{date}/slots/{slot}
//! events/{date}/slots/{slot}
//! events/{date}/slots/{slot}/seats/{seatId}
//! events/{date}/slots/{slot}/waitlist/{occupantId}
//! events/{date}/slots/{slot}/holders/{occupantId}
//! blocks/{date}/slots/{slot}
//! occupantBlocks/{occupantId}
//! ```

use crate::types::{DateKey, OccupantId, SeatId, SlotKey};
use courtside_core::path::{CollectionPath, DocPath};

/// All reservations of a day.
#[must_use]
pub fn reservation_slots(date: DateKey) -> CollectionPath {
    CollectionPath::root("reservations")
        .doc(date.to_string())
        .collection("slots")
}

/// The reservation of a slot.
#[must_use]
pub fn reservation(date: DateKey, slot: SlotKey) -> DocPath {
    reservation_slots(date).doc(slot.to_string())
}

/// All events of a day.
#[must_use]
pub fn event_slots(date: DateKey) -> CollectionPath {
    CollectionPath::root("events")
        .doc(date.to_string())
        .collection("slots")
}

/// The event hosted in a slot.
#[must_use]
pub fn event(date: DateKey, slot: SlotKey) -> DocPath {
    event_slots(date).doc(slot.to_string())
}

/// Seats of an event.
#[must_use]
pub fn seats(date: DateKey, slot: SlotKey) -> CollectionPath {
    event(date, slot).collection("seats")
}

/// One seat of an event.
#[must_use]
pub fn seat(date: DateKey, slot: SlotKey, seat: SeatId) -> DocPath {
    seats(date, slot).doc(seat.to_string())
}

/// Waitlist of an event.
#[must_use]
pub fn waitlist(date: DateKey, slot: SlotKey) -> CollectionPath {
    event(date, slot).collection("waitlist")
}

/// Waitlist entry of an occupant.
#[must_use]
pub fn waitlist_entry(date: DateKey, slot: SlotKey, occupant: &OccupantId) -> DocPath {
    waitlist(date, slot).doc(occupant)
}

/// Holder markers of an event.
#[must_use]
pub fn holders(date: DateKey, slot: SlotKey) -> CollectionPath {
    event(date, slot).collection("holders")
}

/// Holder marker of an occupant.
#[must_use]
pub fn holder(date: DateKey, slot: SlotKey, occupant: &OccupantId) -> DocPath {
    holders(date, slot).doc(occupant)
}

/// All slot blocks of a day.
#[must_use]
pub fn slot_blocks(date: DateKey) -> CollectionPath {
    CollectionPath::root("blocks")
        .doc(date.to_string())
        .collection("slots")
}

/// The block of a slot.
#[must_use]
pub fn slot_block(date: DateKey, slot: SlotKey) -> DocPath {
    slot_blocks(date).doc(slot.to_string())
}

/// The booking suspension of an occupant.
#[must_use]
pub fn occupant_block(occupant: &OccupantId) -> DocPath {
    CollectionPath::root("occupantBlocks").doc(occupant)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_store_layout() {
        let date: DateKey = "2025-06-10".parse().unwrap();
        let slot = SlotKey::hm(18, 0);
        let zoe: OccupantId = "zoe".parse().unwrap();

        assert_eq!(reservation(date, slot).as_str(), "reservations/2025-06-10/slots/18:00");
        assert_eq!(event(date, slot).as_str(), "events/2025-06-10/slots/18:00");
        assert_eq!(
            waitlist_entry(date, slot, &zoe).as_str(),
            "events/2025-06-10/slots/18:00/waitlist/zoe"
        );
        assert!(seats(date, slot).contains(&seat(date, slot, SeatId::new())));
        assert_eq!(holder(date, slot, &zoe).parent(), holders(date, slot));
        assert_eq!(slot_block(date, slot).as_str(), "blocks/2025-06-10/slots/18:00");
        assert_eq!(occupant_block(&zoe).as_str(), "occupantBlocks/zoe");
    }
}
