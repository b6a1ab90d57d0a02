//! Slot calendar.
//!
//! The daily schedule is a pure function of the business constants in
//! [`ScheduleConfig`]: one slot per daytime increment, one per evening increment,
//! each fully contained in its window.

use crate::config::ScheduleConfig;
use crate::types::{Money, Period, Slot, SlotKey};

/// The fixed daily schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    slots: Vec<Slot>,
    evening_start: SlotKey,
    day_slot_minutes: u16,
    evening_slot_minutes: u16,
}

impl Calendar {
    /// Build the schedule for `schedule`.
    #[must_use]
    pub fn new(schedule: &ScheduleConfig) -> Self {
        Self {
            slots: generate_slots(schedule),
            evening_start: schedule.evening_start,
            day_slot_minutes: schedule.day_slot_minutes,
            evening_slot_minutes: schedule.evening_slot_minutes,
        }
    }

    /// All slots, ordered by start time.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Look a slot up by its start time.
    #[must_use]
    pub fn slot(&self, key: SlotKey) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.key == key)
    }

    /// End time of a slot starting at `start`: daytime length before the evening
    /// window, evening length from it on.
    #[must_use]
    pub fn end_for(&self, start: SlotKey) -> SlotKey {
        let length = if start < self.evening_start {
            self.day_slot_minutes
        } else {
            self.evening_slot_minutes
        };
        SlotKey::from_minutes(start.minutes().saturating_add(length))
    }
}

/// Generate the ordered slots of a business day.
///
/// A tier with a zero-length slot produces nothing.
#[must_use]
pub fn generate_slots(schedule: &ScheduleConfig) -> Vec<Slot> {
    let mut slots = tier(
        schedule.day_start,
        schedule.day_end,
        schedule.day_slot_minutes,
        schedule.day_price,
        Period::Daytime,
    );
    slots.extend(tier(
        schedule.evening_start,
        schedule.evening_end,
        schedule.evening_slot_minutes,
        schedule.evening_price,
        Period::Evening,
    ));
    slots.sort_by_key(|slot| slot.key);
    slots.dedup_by_key(|slot| slot.key);
    slots
}

fn tier(start: SlotKey, end: SlotKey, length: u16, price: Money, period: Period) -> Vec<Slot> {
    let mut slots = Vec::new();
    if length == 0 {
        return slots;
    }

    let mut at = start.minutes();
    while u32::from(at) + u32::from(length) <= u32::from(end.minutes()) {
        slots.push(Slot {
            key: SlotKey::from_minutes(at),
            end: SlotKey::from_minutes(at + length),
            duration_minutes: length,
            price,
            period,
        });
        at += length;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(slots: &[Slot]) -> Vec<String> {
        slots.iter().map(|slot| slot.key.to_string()).collect()
    }

    #[test]
    fn default_day_has_ten_daytime_and_three_evening_slots() {
        let slots = generate_slots(&ScheduleConfig::default());

        let daytime: Vec<_> = slots.iter().filter(|s| s.period == Period::Daytime).collect();
        let evening: Vec<_> = slots.iter().filter(|s| s.period == Period::Evening).collect();
        assert_eq!(daytime.len(), 10);
        assert_eq!(evening.len(), 3);

        assert_eq!(
            keys(&slots),
            vec![
                "08:00", "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00",
                "17:00", "18:00", "19:30", "21:00"
            ]
        );
    }

    #[test]
    fn slots_carry_tier_metadata() {
        let calendar = Calendar::new(&ScheduleConfig::default());

        let morning = calendar.slot(SlotKey::hm(9, 0)).copied();
        let late = calendar.slot(SlotKey::hm(21, 0)).copied();

        let morning = morning.map(|s| (s.end.to_string(), s.duration_minutes, s.price.cents()));
        let late = late.map(|s| (s.end.to_string(), s.duration_minutes, s.price.cents()));
        assert_eq!(morning, Some(("10:00".to_string(), 60, 9000)));
        assert_eq!(late, Some(("22:30".to_string(), 90, 14_000)));
        assert!(calendar.slot(SlotKey::hm(9, 30)).is_none());
    }

    #[test]
    fn end_for_switches_length_at_evening_start() {
        let calendar = Calendar::new(&ScheduleConfig::default());
        assert_eq!(calendar.end_for(SlotKey::hm(17, 0)), SlotKey::hm(18, 0));
        assert_eq!(calendar.end_for(SlotKey::hm(18, 0)), SlotKey::hm(19, 30));
    }

    #[test]
    fn zero_length_tier_is_empty() {
        let schedule = ScheduleConfig {
            evening_slot_minutes: 0,
            ..ScheduleConfig::default()
        };
        assert_eq!(generate_slots(&schedule).len(), 10);
    }

    #[test]
    fn generation_is_deterministic() {
        let schedule = ScheduleConfig::default();
        assert_eq!(generate_slots(&schedule), generate_slots(&schedule));
    }
}
