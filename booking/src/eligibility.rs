//! Eligibility filter.
//!
//! A slot is offerable when it starts at least the lead time after `now`, and, for
//! the current business day, has not started yet. The same check runs when the
//! schedule is displayed and again inside every booking transaction.

use crate::config::ScheduleConfig;
use crate::error::BookingError;
use crate::types::{DateKey, SlotKey};
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, Utc};

/// Longest accepted lead time: thirty days.
pub const MAX_LEAD_TIME_MINUTES: i64 = 30 * 24 * 60;

fn lead_time(minutes: i64) -> Duration {
    Duration::try_minutes(minutes.clamp(0, MAX_LEAD_TIME_MINUTES)).unwrap_or_else(Duration::zero)
}

/// Lead-time rule bound to the business timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    lead_time: Duration,
    offset: FixedOffset,
}

impl Eligibility {
    /// Rule with `lead_time_minutes` in a timezone `utc_offset_minutes` east of UTC.
    ///
    /// An out-of-range offset falls back to UTC. The lead time is clamped to
    /// `0..=MAX_LEAD_TIME_MINUTES`.
    #[must_use]
    pub fn new(lead_time_minutes: i64, utc_offset_minutes: i32) -> Self {
        Self {
            lead_time: lead_time(lead_time_minutes),
            offset: FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
                .unwrap_or_else(|| Utc.fix()),
        }
    }

    /// Rule from the schedule configuration.
    #[must_use]
    pub fn from_config(schedule: &ScheduleConfig) -> Self {
        Self::new(schedule.lead_time_minutes, schedule.utc_offset_minutes)
    }

    /// The business timezone.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Instant a slot starts on a business day.
    #[must_use]
    pub fn start_at(&self, day: DateKey, slot: SlotKey) -> DateTime<Utc> {
        let local =
            day.date().and_time(NaiveTime::MIN) + Duration::minutes(i64::from(slot.minutes()));
        (local - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    /// The business day `now` falls on.
    #[must_use]
    pub fn today(&self, now: DateTime<Utc>) -> DateKey {
        DateKey::new(now.with_timezone(&self.offset).date_naive())
    }

    /// Whether a slot can still be booked at `now`.
    #[must_use]
    pub fn is_offerable(&self, now: DateTime<Utc>, day: DateKey, slot: SlotKey) -> bool {
        let start_at = self.start_at(day, slot);
        if start_at - now < self.lead_time {
            return false;
        }
        !(day == self.today(now) && start_at <= now)
    }

    /// Transactional re-check of [`Self::is_offerable`].
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::LeadTimeViolation`] when the slot is not offerable.
    pub fn check(
        &self,
        now: DateTime<Utc>,
        day: DateKey,
        slot: SlotKey,
    ) -> Result<(), BookingError> {
        if self.is_offerable(now, day, slot) {
            Ok(())
        } else {
            Err(BookingError::LeadTimeViolation)
        }
    }
}

/// Whether `slot` on `day` can still be booked at `now`.
#[must_use]
pub fn is_offerable(
    now: DateTime<Utc>,
    day: DateKey,
    slot: SlotKey,
    lead_time_minutes: i64,
    offset: FixedOffset,
) -> bool {
    Eligibility {
        lead_time: lead_time(lead_time_minutes),
        offset,
    }
    .is_offerable(now, day, slot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day() -> DateKey {
        "2025-06-10".parse().unwrap()
    }

    fn rule() -> Eligibility {
        Eligibility::from_config(&ScheduleConfig::default())
    }

    #[test]
    fn start_at_is_local_time() {
        // 09:00 in Sao Paulo is 12:00 UTC.
        let start = rule().start_at(day(), SlotKey::hm(9, 0));
        assert_eq!(start.to_rfc3339(), "2025-06-10T12:00:00+00:00");
    }

    #[test]
    fn today_follows_business_timezone() {
        // 01:30 UTC on the 11th is still the 10th in Sao Paulo.
        let now = DateTime::parse_from_rfc3339("2025-06-11T01:30:00Z").unwrap().to_utc();
        assert_eq!(rule().today(now), day());
    }

    #[test]
    fn lead_time_boundary() {
        let start = rule().start_at(day(), SlotKey::hm(9, 0));

        assert!(rule().is_offerable(start - Duration::minutes(20), day(), SlotKey::hm(9, 0)));
        assert!(!rule().is_offerable(start - Duration::minutes(19), day(), SlotKey::hm(9, 0)));
        assert_eq!(
            rule().check(start - Duration::minutes(19), day(), SlotKey::hm(9, 0)),
            Err(BookingError::LeadTimeViolation)
        );
    }

    #[test]
    fn started_slots_are_not_offered_even_without_lead_time() {
        let rule = Eligibility::new(0, -180);
        let start = rule.start_at(day(), SlotKey::hm(9, 0));

        assert!(rule.is_offerable(start - Duration::minutes(1), day(), SlotKey::hm(9, 0)));
        assert!(!rule.is_offerable(start, day(), SlotKey::hm(9, 0)));
    }

    #[test]
    fn future_days_only_need_lead_time() {
        let now = rule().start_at(day(), SlotKey::hm(21, 0));
        let tomorrow = day().offset_days(1);
        assert!(rule().is_offerable(now, tomorrow, SlotKey::hm(8, 0)));
        assert!(!rule().is_offerable(now, day().offset_days(-1), SlotKey::hm(21, 0)));
    }

    #[test]
    fn free_function_matches_rule() {
        let now = rule().start_at(day(), SlotKey::hm(8, 0));
        assert_eq!(
            is_offerable(now, day(), SlotKey::hm(9, 0), 20, rule().offset()),
            rule().is_offerable(now, day(), SlotKey::hm(9, 0))
        );
    }

    #[test]
    fn oversized_lead_time_is_clamped() {
        let rule = Eligibility::new(i64::MAX / 10, -180);
        let now = rule.start_at(day(), SlotKey::hm(8, 0));

        assert!(!rule.is_offerable(now, day().offset_days(29), SlotKey::hm(8, 0)));
        assert!(rule.is_offerable(now, day().offset_days(31), SlotKey::hm(8, 0)));
        assert!(!is_offerable(now, day(), SlotKey::hm(9, 0), i64::MAX, rule.offset()));
        assert_eq!(Eligibility::new(-5, -180), Eligibility::new(0, -180));
    }

    #[test]
    fn invalid_offset_falls_back_to_utc() {
        let rule = Eligibility::new(20, 100_000);
        assert_eq!(rule.offset().local_minus_utc(), 0);
    }
}
