//! Courtside demo.
//!
//! Walks through the booking protocol against the in-memory store:
//! - the daily schedule
//! - a contended reservation
//! - an event filling up, with the overflow routed to the waitlist
//! - an atomic free-and-promote
//! - the lead-time rule
//! - a rejected resize
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info,courtside_booking=debug cargo run --bin courtside-demo
//! ```

use anyhow::{ensure, Context};
use chrono::{DateTime, Duration, Utc};
use courtside_booking::metrics::register_business_metrics;
use courtside_booking::{
    BookingEnvironment, BookingError, BookingService, Config, DateKey, EventDraft, JoinOutcome,
    OccupantId, PromotionOutcome, SlotKey,
};
use courtside_runtime::metrics::install_prometheus;
use courtside_testing::{FixedClock, InMemoryDocumentStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,courtside_booking=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    match install_prometheus(config.observability.metrics_addr) {
        Ok(()) => register_business_metrics(),
        Err(error) => tracing::warn!(%error, "Metrics exporter not started"),
    }

    let date: DateKey = "2025-06-10".parse()?;
    let now: DateTime<Utc> = DateTime::parse_from_rfc3339("2025-06-09T12:00:00Z")?.to_utc();

    let env = BookingEnvironment::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(FixedClock::new(now)),
    );
    let service = BookingService::new(env, config);

    schedule(&service);
    contended_reservation(&service, date, now).await?;
    let event_slot = SlotKey::hm(19, 30);
    event_overflow(&service, date, event_slot, now).await?;
    promotion(&service, date, event_slot).await?;
    lead_time(&service, date).await?;
    rejected_resize(&service, date, now).await?;
    blocks(&service, date, now).await?;

    let summary = service.day_summary(date).await?;
    tracing::info!(?summary, "Demo finished");
    Ok(())
}

fn occupant(id: &str) -> anyhow::Result<OccupantId> {
    id.parse::<OccupantId>().with_context(|| format!("invalid occupant id {id}"))
}

fn schedule(service: &BookingService) {
    tracing::info!("== Scenario 1: daily schedule ==");
    for slot in service.generate_slots() {
        tracing::info!(
            start = %slot.key,
            end = %slot.end,
            minutes = slot.duration_minutes,
            price = %slot.price,
            period = ?slot.period,
            "Slot"
        );
    }
}

async fn contended_reservation(
    service: &BookingService,
    date: DateKey,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    tracing::info!("== Scenario 2: two occupants reserve 09:00 ==");
    let slot = SlotKey::hm(9, 0);

    service.reserve(date, slot, &occupant("ana")?, "Ana", now).await?;
    let second = service.reserve(date, slot, &occupant("bruno")?, "Bruno", now).await;

    ensure!(
        second == Err(BookingError::AlreadyReserved),
        "expected AlreadyReserved, got {second:?}"
    );
    if let Err(error) = second {
        tracing::info!(message = error.user_message(), "Second reservation rejected");
    }
    Ok(())
}

async fn event_overflow(
    service: &BookingService,
    date: DateKey,
    slot: SlotKey,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    tracing::info!("== Scenario 3: capacity-2 event, three players ==");
    let admin = occupant("admin")?;
    service
        .save_event(date, slot, &EventDraft::new("Americano", 2), &admin)
        .await?;

    let (carla, diego) = (occupant("carla")?, occupant("diego")?);
    let (first, second) = tokio::join!(
        service.join_event(date, slot, &carla, now),
        service.join_event(date, slot, &diego, now),
    );
    ensure!(
        matches!((first?, second?), (JoinOutcome::Seated(_), JoinOutcome::Seated(_))),
        "both early players should be seated"
    );

    let third = service.join_event(date, slot, &occupant("elena")?, now).await?;
    ensure!(third == JoinOutcome::Queued, "third player should be queued");
    tracing::info!(waitlist = service.waitlist(date, slot).await?.len(), "Overflow queued");
    Ok(())
}

async fn promotion(service: &BookingService, date: DateKey, slot: SlotKey) -> anyhow::Result<()> {
    tracing::info!("== Scenario 4: free a seat and promote ==");
    let seats = service.seats(date, slot).await?;
    let seat = seats
        .iter()
        .find(|record| record.seat.taken)
        .context("no taken seat")?
        .id;

    let outcome = service.free_seat_and_promote(date, slot, seat).await?;
    ensure!(
        matches!(&outcome, PromotionOutcome::Promoted { occupant: promoted, .. } if promoted.as_str() == "elena"),
        "expected elena to be promoted, got {outcome:?}"
    );

    let taken = service
        .seats(date, slot)
        .await?
        .iter()
        .filter(|record| record.seat.taken)
        .count();
    ensure!(taken == 2, "taken seats should stay at 2");
    ensure!(service.waitlist(date, slot).await?.is_empty(), "waitlist should be empty");
    Ok(())
}

async fn lead_time(service: &BookingService, date: DateKey) -> anyhow::Result<()> {
    tracing::info!("== Scenario 5: join 19 minutes before start ==");
    let slot = SlotKey::hm(21, 0);
    let admin = occupant("admin")?;
    service
        .save_event(date, slot, &EventDraft::new("Late game", 4), &admin)
        .await?;

    let seat = service.seats(date, slot).await?.first().context("no seats")?.id;
    let too_late = service.eligibility().start_at(date, slot) - Duration::minutes(19);
    let result = service
        .join_seat(date, slot, seat, &occupant("felipe")?, too_late)
        .await;

    ensure!(
        result == Err(BookingError::LeadTimeViolation),
        "expected LeadTimeViolation, got {result:?}"
    );
    Ok(())
}

async fn rejected_resize(
    service: &BookingService,
    date: DateKey,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    tracing::info!("== Scenario 6: shrink 5 -> 2 with 3 taken ==");
    let slot = SlotKey::hm(18, 0);
    let admin = occupant("admin")?;
    service
        .save_event(date, slot, &EventDraft::new("Clinic", 5), &admin)
        .await?;
    for id in ["gabi", "hugo", "iris"] {
        service.join_event(date, slot, &occupant(id)?, now).await?;
    }

    let before = service.seats(date, slot).await?;
    let result = service.resize_capacity(date, slot, 2).await;
    ensure!(
        result == Err(BookingError::CapacityBelowOccupancy),
        "expected CapacityBelowOccupancy, got {result:?}"
    );
    ensure!(service.seats(date, slot).await? == before, "seats must be unchanged");
    Ok(())
}

async fn blocks(service: &BookingService, date: DateKey, now: DateTime<Utc>) -> anyhow::Result<()> {
    tracing::info!("== Scenario 7: blocked slot and suspended occupant ==");
    let slot = SlotKey::hm(11, 0);
    service.block_slot(date, slot, "maintenance").await?;
    let refused = service.reserve(date, slot, &occupant("ana")?, "Ana", now).await;
    ensure!(
        refused == Err(BookingError::SlotBlocked),
        "expected SlotBlocked, got {refused:?}"
    );
    service.unblock_slot(date, slot).await?;

    let julia = occupant("julia")?;
    service.block_occupant(&julia, now + Duration::days(7)).await?;
    let suspended = service.reserve(date, slot, &julia, "Julia", now).await;
    ensure!(
        matches!(suspended, Err(BookingError::OccupantBlocked { .. })),
        "expected OccupantBlocked, got {suspended:?}"
    );
    service.unblock_occupant(&julia).await?;
    service.reserve(date, slot, &julia, "Julia", now).await?;
    Ok(())
}
