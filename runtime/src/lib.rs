//! # Courtside Runtime
//!
//! Execution support for the Courtside booking engine:
//!
//! - [`retry`]: exponential backoff policy and conditional retry loop
//! - [`transaction`]: the driver that runs a transaction body, commits, and re-runs
//!   it on optimistic conflicts
//! - [`metrics`]: Prometheus exporter and transaction counters
//!
//! ## Example
//!
//! ```ignore
//! use courtside_runtime::{run_transaction, RetryPolicy};
//!
//! let seat = run_transaction(store.as_ref(), &RetryPolicy::default(), &join_seat).await?;
//! ```

pub mod metrics;
pub mod retry;
pub mod transaction;

pub use retry::{retry_if, RetryPolicy, RetryPolicyBuilder};
pub use transaction::run_transaction;
