//! # Courtside Testing
//!
//! Test doubles for the Courtside booking engine.
//!
//! This crate provides:
//! - [`InMemoryDocumentStore`]: a versioned, optimistic transactional store
//! - Deterministic clocks ([`FixedClock`], [`ManualClock`])
//!
//! ## Example
//!
//! ```ignore
//! use courtside_testing::{InMemoryDocumentStore, ManualClock};
//!
//! #[tokio::test]
//! async fn reserve_then_release() {
//!     let clock = ManualClock::at(day_before());
//!     let store = InMemoryDocumentStore::with_clock(clock.shared());
//!     let env = BookingEnvironment::new(Arc::new(store), clock.shared());
//!     let service = BookingService::new(env, Config::default());
//!
//!     service.reserve(date, slot, &occupant, "Ana", day_before()).await.unwrap();
//!     service.release(date, slot).await.unwrap();
//! }
//! ```

use chrono::{DateTime, Utc};
use courtside_core::environment::Clock;

pub mod memory_store;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::Duration;
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible. Commits stamped with
    /// a fixed clock all share one timestamp, which is how tests force FIFO ties.
    ///
    /// # Example
    ///
    /// ```
    /// use courtside_testing::mocks::FixedClock;
    /// use courtside_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same instant, so a test can hand one clone to the store and
    /// one to the service and advance both at once.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock stopped at `time`.
        #[must_use]
        pub fn at(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute instant.
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }

        /// This clock as a shareable trait object.
        #[must_use]
        pub fn shared(&self) -> Arc<dyn Clock> {
            Arc::new(self.clone())
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use memory_store::InMemoryDocumentStore;
pub use mocks::{test_clock, FixedClock, ManualClock};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::at(test_clock().now());
        let shared = clock.shared();

        clock.advance(Duration::minutes(20));

        assert_eq!(shared.now(), test_clock().now() + Duration::minutes(20));
    }
}
