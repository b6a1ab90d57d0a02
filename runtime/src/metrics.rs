//! Prometheus metrics for the transaction layer.
//!
//! # Exported Metrics
//!
//! - `courtside_transactions_committed_total` - Transactions that committed
//! - `courtside_transactions_aborted_total` - Transactions aborted by their body
//! - `courtside_transaction_retries_total` - Attempts re-run after a conflict
//! - `courtside_transactions_exhausted_total` - Transactions that ran out of retries
//!
//! # Example
//!
//! ```rust,no_run
//! use courtside_runtime::metrics::install_prometheus;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! install_prometheus("0.0.0.0:9090".parse()?)?;
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build or install the exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if a recorder is already installed or the
/// listener cannot be set up.
pub fn install_prometheus(addr: SocketAddr) -> Result<(), MetricsError> {
    register_metrics();

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Register transaction metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "courtside_transactions_committed_total",
        "Total number of committed transactions"
    );
    describe_counter!(
        "courtside_transactions_aborted_total",
        "Total number of transactions aborted by a domain rule"
    );
    describe_counter!(
        "courtside_transaction_retries_total",
        "Total number of attempts re-run after an optimistic conflict"
    );
    describe_counter!(
        "courtside_transactions_exhausted_total",
        "Total number of transactions that exhausted their retry budget"
    );
}

/// Transaction metrics recorder.
pub struct TransactionMetrics;

impl TransactionMetrics {
    /// Record a committed transaction.
    pub fn record_commit() {
        counter!("courtside_transactions_committed_total").increment(1);
    }

    /// Record a transaction aborted by its body.
    pub fn record_abort() {
        counter!("courtside_transactions_aborted_total").increment(1);
    }

    /// Record conflict retries.
    pub fn record_retries(count: usize) {
        counter!("courtside_transaction_retries_total").increment(count as u64);
    }

    /// Record a transaction that ran out of retries.
    pub fn record_exhausted() {
        counter!("courtside_transactions_exhausted_total").increment(1);
    }
}
