//! # Courtside Core
//!
//! Core traits and types for the Courtside booking engine.
//!
//! This crate defines the one external collaborator the booking protocol depends on:
//! a **transactional document store**. Everything invariant-bearing in the booking
//! crate (slot reservations, seat acquisition, waitlist promotion) is expressed as a
//! single atomic transaction against this abstraction.
//!
//! ## Core Concepts
//!
//! - **Document path**: `collection/{id}/collection/{id}` addressing ([`path`])
//! - **Snapshot**: a document body plus store-assigned metadata ([`store::Snapshot`])
//! - **Document store**: `get`/`list`/`create`/`update`/`delete` and `begin` ([`store::DocumentStore`])
//! - **Transaction**: snapshot reads + buffered writes, committed atomically or
//!   aborted on conflict ([`store::Transaction`])
//! - **Transaction body**: a command that runs inside a transaction and may be
//!   re-executed on conflict ([`store::TransactionBody`])
//! - **Environment**: injected dependencies such as the [`environment::Clock`]
//!
//! ## Implementations
//!
//! - `InMemoryDocumentStore` (in `courtside-testing`): optimistic, versioned, deterministic
//!
//! The transaction driver with conflict retries lives in `courtside-runtime`.

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod path;
pub mod store;

pub use path::{CollectionPath, DocPath, ParsePathError};
pub use store::{
    decode, encode, CommitInfo, DocumentStore, Snapshot, StoreError, Transaction,
    TransactionBody,
};

/// Environment module - Dependency injection for external concerns
///
/// All external dependencies that are not the store itself are abstracted behind
/// traits and injected, so tests can substitute deterministic implementations.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use courtside_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let a = clock.now();
    /// let b = clock.now();
    /// assert!(b >= a);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
