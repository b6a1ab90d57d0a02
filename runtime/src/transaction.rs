//! Transaction driver.
//!
//! [`run_transaction`] opens a transaction, runs a [`TransactionBody`] against it and
//! commits. Commit conflicts re-run the body from scratch against fresh reads, up to
//! the retry policy's budget; once the budget is spent the caller receives
//! [`StoreError::RetriesExhausted`]. Errors returned by the body abort the
//! transaction and are passed through untouched.

use crate::metrics::TransactionMetrics;
use crate::retry::{retry_if, RetryPolicy};
use courtside_core::store::{DocumentStore, StoreError, TransactionBody};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of a single attempt.
enum Attempt<E> {
    /// The body returned an error; nothing was committed.
    Aborted(E),
    /// Opening or committing the transaction failed.
    Store(StoreError),
}

impl<E: fmt::Display> fmt::Display for Attempt<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted(error) => write!(f, "aborted: {error}"),
            Self::Store(error) => write!(f, "{error}"),
        }
    }
}

async fn attempt<B>(store: &dyn DocumentStore, body: &B) -> Result<B::Output, Attempt<B::Error>>
where
    B: TransactionBody + ?Sized,
{
    let mut tx = store.begin().await.map_err(Attempt::Store)?;
    let output = body.run(&mut *tx).await.map_err(Attempt::Aborted)?;
    tx.commit().await.map_err(Attempt::Store)?;
    Ok(output)
}

/// Run `body` as one atomic transaction, retrying on commit conflicts.
///
/// # Errors
///
/// - Any error the body returns (the transaction is aborted)
/// - [`StoreError::RetriesExhausted`] when every attempt conflicted
/// - Other store failures (backend loss, invalid writes at commit time)
pub async fn run_transaction<B>(
    store: &dyn DocumentStore,
    policy: &RetryPolicy,
    body: &B,
) -> Result<B::Output, B::Error>
where
    B: TransactionBody + ?Sized,
{
    let attempts = AtomicUsize::new(0);

    let result = retry_if(
        policy,
        || {
            attempts.fetch_add(1, Ordering::Relaxed);
            attempt(store, body)
        },
        |error| matches!(error, Attempt::Store(err) if err.is_conflict()),
    )
    .await;

    let attempts = attempts.into_inner();
    if attempts > 1 {
        TransactionMetrics::record_retries(attempts - 1);
    }

    match result {
        Ok(output) => {
            TransactionMetrics::record_commit();
            Ok(output)
        }
        Err(Attempt::Aborted(error)) => {
            TransactionMetrics::record_abort();
            Err(error)
        }
        Err(Attempt::Store(error)) if error.is_conflict() => {
            TransactionMetrics::record_exhausted();
            Err(StoreError::RetriesExhausted { attempts }.into())
        }
        Err(Attempt::Store(error)) => Err(error.into()),
    }
}
