//! Configuration management for the booking engine.
//!
//! Loads configuration from environment variables with sensible defaults. Values that
//! fail to parse fall back to their default.

use crate::eligibility::MAX_LEAD_TIME_MINUTES;
use crate::types::{Money, SlotKey};
use courtside_runtime::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Daily schedule and booking window
    pub schedule: ScheduleConfig,
    /// Explicit answers to policy questions
    pub policy: PolicyConfig,
    /// Store transaction retry budget
    pub transactions: TransactionConfig,
    /// Logging and metrics
    pub observability: ObservabilityConfig,
}

/// Business hours, slot tiers and booking window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// First daytime slot start
    pub day_start: SlotKey,
    /// Daytime slots must end by this time
    pub day_end: SlotKey,
    /// First evening slot start
    pub evening_start: SlotKey,
    /// Evening slots must end by this time
    pub evening_end: SlotKey,
    /// Daytime slot length in minutes
    pub day_slot_minutes: u16,
    /// Evening slot length in minutes
    pub evening_slot_minutes: u16,
    /// Price of a daytime slot
    pub day_price: Money,
    /// Price of an evening slot
    pub evening_price: Money,
    /// Minimum minutes between now and a slot start for any booking action
    pub lead_time_minutes: i64,
    /// Business timezone as minutes east of UTC (America/Sao_Paulo is -180)
    pub utc_offset_minutes: i32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            day_start: SlotKey::hm(8, 0),
            day_end: SlotKey::hm(18, 0),
            evening_start: SlotKey::hm(18, 0),
            evening_end: SlotKey::hm(22, 30),
            day_slot_minutes: 60,
            evening_slot_minutes: 90,
            day_price: Money::from_cents(9000),
            evening_price: Money::from_cents(14_000),
            lead_time_minutes: 20,
            utc_offset_minutes: -180,
        }
    }
}

/// Whether one occupant may hold several seats of the same event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoubleSeatPolicy {
    /// A second seat for the same occupant fails with `AlreadyInEvent`.
    #[default]
    Reject,
    /// Occupants may take several seats (group bookings).
    Allow,
}

impl FromStr for DoubleSeatPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "allow" => Ok(Self::Allow),
            other => Err(format!("unknown double-seat policy '{other}'")),
        }
    }
}

/// Whether administrative promotion respects the roster lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionLockPolicy {
    /// Promotion on a locked event fails with `EventLocked`.
    #[default]
    Honor,
    /// Administrators may promote on a locked roster.
    Bypass,
}

impl FromStr for PromotionLockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "honor" => Ok(Self::Honor),
            "bypass" => Ok(Self::Bypass),
            other => Err(format!("unknown promotion lock policy '{other}'")),
        }
    }
}

/// Policy choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Double seating
    pub double_seat: DoubleSeatPolicy,
    /// Lock handling during promotion
    pub promotion_lock: PromotionLockPolicy,
}

/// Store transaction retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,
    /// Backoff cap in milliseconds
    pub max_delay_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 10,
            max_delay_ms: 500,
        }
    }
}

impl TransactionConfig {
    /// The retry policy for [`courtside_runtime::run_transaction`].
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.max_retries)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .build()
    }
}

/// Logging and metrics configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Prometheus exporter listen address
    pub metrics_addr: SocketAddr,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing or unparsable variables keep their default value.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let schedule = defaults.schedule;

        Self {
            schedule: ScheduleConfig {
                day_start: env::var("COURTSIDE_DAY_START")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(schedule.day_start),
                day_end: env::var("COURTSIDE_DAY_END")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(schedule.day_end),
                evening_start: env::var("COURTSIDE_EVENING_START")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(schedule.evening_start),
                evening_end: env::var("COURTSIDE_EVENING_END")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(schedule.evening_end),
                day_slot_minutes: env::var("COURTSIDE_DAY_SLOT_MINUTES")
                    .ok()
                    .and_then(|s| s.parse::<u16>().ok())
                    .filter(|&minutes| minutes > 0)
                    .unwrap_or(schedule.day_slot_minutes),
                evening_slot_minutes: env::var("COURTSIDE_EVENING_SLOT_MINUTES")
                    .ok()
                    .and_then(|s| s.parse::<u16>().ok())
                    .filter(|&minutes| minutes > 0)
                    .unwrap_or(schedule.evening_slot_minutes),
                day_price: env::var("COURTSIDE_DAY_PRICE_CENTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map_or(schedule.day_price, Money::from_cents),
                evening_price: env::var("COURTSIDE_EVENING_PRICE_CENTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map_or(schedule.evening_price, Money::from_cents),
                lead_time_minutes: env::var("COURTSIDE_LEAD_TIME_MINUTES")
                    .ok()
                    .and_then(|s| parse_lead_time(&s))
                    .unwrap_or(schedule.lead_time_minutes),
                utc_offset_minutes: env::var("COURTSIDE_UTC_OFFSET_MINUTES")
                    .ok()
                    .and_then(|s| s.parse::<i32>().ok())
                    .filter(|minutes| minutes.abs() < 24 * 60)
                    .unwrap_or(schedule.utc_offset_minutes),
            },
            policy: PolicyConfig {
                double_seat: env::var("COURTSIDE_DOUBLE_SEAT_POLICY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
                promotion_lock: env::var("COURTSIDE_PROMOTION_LOCK_POLICY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
            },
            transactions: TransactionConfig {
                max_retries: env::var("COURTSIDE_TX_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.transactions.max_retries),
                initial_delay_ms: env::var("COURTSIDE_TX_INITIAL_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.transactions.initial_delay_ms),
                max_delay_ms: env::var("COURTSIDE_TX_MAX_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.transactions.max_delay_ms),
            },
            observability: ObservabilityConfig {
                log_level: env::var("RUST_LOG")
                    .unwrap_or(defaults.observability.log_level),
                metrics_addr: env::var("COURTSIDE_METRICS_ADDR")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.observability.metrics_addr),
            },
        }
    }
}

/// Lead time in minutes, accepted within `0..=MAX_LEAD_TIME_MINUTES`.
fn parse_lead_time(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|minutes| (0..=MAX_LEAD_TIME_MINUTES).contains(minutes))
}
