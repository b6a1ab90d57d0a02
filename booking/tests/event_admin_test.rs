//! Event administration, occupancy views and usage metrics.
//!
//! Run with: `cargo test --test event_admin_test`

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use chrono::Duration;
use courtside_booking::usage::{reservation_ranking, RankingEntry};
use courtside_booking::{BookingError, BookingKind, EventDraft, SaveOutcome, SlotKey, SlotState};
use courtside_core::DocumentStore;
use support::{admin, config, day, day_before, harness, occupant, EVENING};

async fn indices(h: &support::Harness, slot: SlotKey) -> Vec<u32> {
    h.service
        .seats(day(), slot)
        .await
        .unwrap()
        .iter()
        .map(|record| record.seat.index)
        .collect()
}

#[tokio::test]
async fn test_create_event_allocates_every_seat() {
    let h = harness(config());
    let outcome = h
        .service
        .save_event(
            day(),
            EVENING,
            &EventDraft::new("Americano", 4)
                .with_rules("Mixed pairs")
                .with_image("events/americano.png"),
            &admin(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Created);
    assert_eq!(indices(&h, EVENING).await, [1, 2, 3, 4]);

    let event = h.service.event(day(), EVENING).await.unwrap().unwrap().event;
    assert_eq!(event.rules, "Mixed pairs");
    assert_eq!(event.created_by, admin());
    assert_eq!(
        event.slot_start_at,
        h.service.eligibility().start_at(day(), EVENING)
    );
    assert!(!event.locked);
}

#[tokio::test]
async fn test_zero_capacity_is_invalid() {
    let h = harness(config());
    let result = h
        .service
        .save_event(day(), EVENING, &EventDraft::new("Empty", 0), &admin())
        .await;
    assert_eq!(result, Err(BookingError::InvalidCapacity));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_saving_existing_event_merges_and_resizes() {
    let h = harness(config());
    h.service
        .save_event(
            day(),
            EVENING,
            &EventDraft::new("Americano", 3).with_image("a.png"),
            &admin(),
        )
        .await
        .unwrap();
    h.service
        .join_event(day(), EVENING, &occupant("ana"), day_before())
        .await
        .unwrap();

    let outcome = h
        .service
        .save_event(
            day(),
            EVENING,
            &EventDraft::new("King of the court", 5).locked(true),
            &occupant("other-admin"),
        )
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Updated { added: 2, removed: 0 });
    let event = h.service.event(day(), EVENING).await.unwrap().unwrap().event;
    assert_eq!(event.title, "King of the court");
    assert_eq!(event.capacity, 5);
    assert!(event.locked);
    assert_eq!(event.image_ref.as_deref(), Some("a.png"));
    assert_eq!(event.created_by, admin());
    assert_eq!(indices(&h, EVENING).await, [1, 2, 3, 4, 5]);
    assert_eq!(h.taken(EVENING).await, vec![(1, occupant("ana"))]);
}

#[tokio::test]
async fn test_grow_adds_free_seats_after_highest_index() {
    let h = harness(config());
    h.event(EVENING, 2).await;
    h.service
        .join_event(day(), EVENING, &occupant("ana"), day_before())
        .await
        .unwrap();

    let plan = h.service.resize_capacity(day(), EVENING, 4).await.unwrap();

    assert_eq!(plan.add, [3, 4]);
    assert_eq!(indices(&h, EVENING).await, [1, 2, 3, 4]);
    assert_eq!(h.service.event(day(), EVENING).await.unwrap().unwrap().event.capacity, 4);
}

#[tokio::test]
async fn test_shrink_removes_free_seats_from_the_top() {
    let h = harness(config());
    h.event(EVENING, 5).await;
    let seats = h.seat_ids(EVENING).await;
    // Occupy seats 2 and 4.
    for (seat, who) in [(seats[1], "ana"), (seats[3], "bia")] {
        h.service
            .join_seat(day(), EVENING, seat, &occupant(who), day_before())
            .await
            .unwrap();
    }

    h.service.resize_capacity(day(), EVENING, 3).await.unwrap();

    assert_eq!(indices(&h, EVENING).await, [1, 2, 4]);
    assert_eq!(h.taken(EVENING).await.len(), 2);

    let below = h.service.resize_capacity(day(), EVENING, 1).await;
    assert_eq!(below, Err(BookingError::CapacityBelowOccupancy));
    assert_eq!(
        below.unwrap_err().recovery(),
        courtside_booking::Recovery::FreeSeatsFirst
    );
}

#[tokio::test]
async fn test_resize_errors() {
    let h = harness(config());
    assert_eq!(
        h.service.resize_capacity(day(), EVENING, 3).await,
        Err(BookingError::EventNotFound)
    );
    h.event(EVENING, 2).await;
    assert_eq!(
        h.service.resize_capacity(day(), EVENING, 0).await,
        Err(BookingError::InvalidCapacity)
    );
}

#[tokio::test]
async fn test_lock_and_image_on_missing_event() {
    let h = harness(config());
    assert_eq!(
        h.service.set_locked(day(), EVENING, true).await,
        Err(BookingError::EventNotFound)
    );
    assert_eq!(
        h.service.update_image(day(), EVENING, Some("x.png")).await,
        Err(BookingError::EventNotFound)
    );
}

#[tokio::test]
async fn test_update_and_clear_image() {
    let h = harness(config());
    h.event(EVENING, 2).await;

    h.service
        .update_image(day(), EVENING, Some("events/poster.jpg"))
        .await
        .unwrap();
    let event = h.service.event(day(), EVENING).await.unwrap().unwrap();
    assert_eq!(event.event.image_ref.as_deref(), Some("events/poster.jpg"));

    h.service.update_image(day(), EVENING, None).await.unwrap();
    let event = h.service.event(day(), EVENING).await.unwrap().unwrap();
    assert_eq!(event.event.image_ref, None);
}

#[tokio::test]
async fn test_delete_event_removes_everything() {
    let h = harness(config());
    h.event(EVENING, 1).await;
    h.service
        .join_event(day(), EVENING, &occupant("ana"), day_before())
        .await
        .unwrap();
    h.service
        .join_event(day(), EVENING, &occupant("bia"), day_before())
        .await
        .unwrap();

    h.service.delete_event(day(), EVENING).await.unwrap();

    assert!(h.store.is_empty());
    assert_eq!(
        h.service.delete_event(day(), EVENING).await,
        Err(BookingError::EventNotFound)
    );
    // The slot is free for a reservation again.
    assert!(h
        .service
        .reserve(day(), EVENING, &occupant("ana"), "Ana", day_before())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_free_seat_without_promotion() {
    let h = harness(config());
    h.event(EVENING, 1).await;
    h.service
        .join_event(day(), EVENING, &occupant("ana"), day_before())
        .await
        .unwrap();
    h.service
        .join_event(day(), EVENING, &occupant("bia"), day_before())
        .await
        .unwrap();
    let seat = h.seat_ids(EVENING).await[0];

    let previous = h.service.free_seat(day(), EVENING, seat).await.unwrap();
    assert_eq!(previous, Some(occupant("ana")));
    assert!(h.taken(EVENING).await.is_empty());
    assert_eq!(h.queued(EVENING).await, ["bia"]);

    assert_eq!(h.service.free_seat(day(), EVENING, seat).await.unwrap(), None);
}

#[tokio::test]
async fn test_day_board() {
    let h = harness(config());
    h.service
        .reserve(day(), SlotKey::hm(9, 0), &occupant("ana"), "Ana", day_before())
        .await
        .unwrap();
    h.event(EVENING, 2).await;
    h.service
        .join_event(day(), EVENING, &occupant("bia"), day_before())
        .await
        .unwrap();

    // 09:30 local: the 08:00 and 09:00 slots have started.
    let now = h.service.eligibility().start_at(day(), SlotKey::hm(9, 30));
    let board = h.service.day_board(day(), now).await.unwrap();

    assert_eq!(board.len(), 13);
    assert!(!board[0].offerable);
    assert!(!board[1].offerable);
    assert!(board[2].offerable);
    assert!(matches!(board[0].state, SlotState::Free));
    assert!(matches!(
        &board[1].state,
        SlotState::Reserved(record) if record.reservation.display_name == "Ana"
    ));

    let evening = board.iter().find(|row| row.slot.key == EVENING).unwrap();
    let SlotState::Event { event, seats, waitlist } = &evening.state else {
        unreachable!("expected an event, got {:?}", evening.state);
    };
    assert_eq!(event.event.capacity, 2);
    assert_eq!(seats.len(), 2);
    assert!(waitlist.is_empty());
    assert_eq!(evening.state.free_seats(), 1);
}

#[tokio::test]
async fn test_occupant_bookings_are_sorted_by_start() {
    let h = harness(config());
    let ana = occupant("ana");
    let tomorrow = day().offset_days(1);

    h.event(EVENING, 1).await;
    h.service
        .join_event(day(), EVENING, &occupant("bia"), day_before())
        .await
        .unwrap();
    h.service
        .join_event(day(), EVENING, &ana, day_before())
        .await
        .unwrap();
    h.service
        .reserve(tomorrow, SlotKey::hm(8, 0), &ana, "Ana", day_before())
        .await
        .unwrap();
    h.service
        .reserve(day(), SlotKey::hm(10, 0), &ana, "Ana", day_before())
        .await
        .unwrap();

    let bookings = h.service.occupant_bookings(&ana, day(), 2).await.unwrap();
    let lengths: Vec<i64> = bookings
        .iter()
        .map(|b| (b.end_at - b.start_at).num_minutes())
        .collect();
    assert_eq!(lengths, [60, 90, 60]);

    let summary: Vec<(String, String, BookingKind)> = bookings
        .into_iter()
        .map(|b| (b.date.to_string(), b.slot.to_string(), b.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("2025-06-10".into(), "10:00".into(), BookingKind::Reservation),
            ("2025-06-10".into(), "19:30".into(), BookingKind::Waitlist { position: 1 }),
            ("2025-06-11".into(), "08:00".into(), BookingKind::Reservation),
        ]
    );
}

#[tokio::test]
async fn test_reservation_ranking_and_day_summary() {
    let h = harness(config());
    let today = day();
    for (offset, slot, who) in [
        (0, 9, "ana"),
        (0, 10, "bia"),
        (-1, 9, "ana"),
        (-2, 9, "caio"),
        (-40, 9, "caio"),
    ] {
        // Write directly: past days are outside the booking window.
        let date = today.offset_days(offset);
        h.store
            .create(
                &courtside_booking::paths::reservation(date, SlotKey::hm(slot, 0)),
                serde_json::json!({
                    "occupantId": who,
                    "displayName": who.to_uppercase(),
                    "startAt": (day_before() + Duration::days(offset)).to_rfc3339(),
                    "endAt": (day_before() + Duration::days(offset) + Duration::hours(1)).to_rfc3339(),
                }),
            )
            .await
            .unwrap();
    }

    let ranking = reservation_ranking(&h.store, today, 30, 2).await.unwrap();
    assert_eq!(
        ranking,
        vec![
            RankingEntry {
                occupant_id: occupant("ana"),
                display_name: "ANA".into(),
                reservations: 2,
            },
            RankingEntry {
                occupant_id: occupant("bia"),
                display_name: "BIA".into(),
                reservations: 1,
            },
        ]
    );

    h.event(EVENING, 2).await;
    for who in ["dani", "edu", "fabi"] {
        h.service
            .join_event(today, EVENING, &occupant(who), day_before())
            .await
            .unwrap();
    }
    let summary = h.service.day_summary(today).await.unwrap();
    assert_eq!(summary.reservations, 2);
    assert_eq!(summary.events, 1);
    assert_eq!((summary.seats_taken, summary.seats_total), (2, 2));
    assert_eq!(summary.queued, 1);
}
