//! Transactional document store trait and related types.
//!
//! This module defines the abstraction the booking protocol runs against: a document
//! database with create-once semantics and optimistic, snapshot-validated transactions.
//!
//! # Design
//!
//! The store is deliberately minimal. It provides exactly what the protocol needs:
//!
//! - `get` / `list` reads (lists are ordered by document id, the store's natural key order)
//! - `create` that fails if the document exists (create-once semantics)
//! - `update` that fails if the document is absent (top-level fields are merged)
//! - `delete` that is idempotent
//! - `begin` to open a [`Transaction`]
//! - store-assigned commit timestamps exposed as [`Snapshot::create_time`], usable
//!   as a FIFO ordering field that never depends on a client clock
//!
//! # Optimistic concurrency
//!
//! A transaction records the version of every document (and every listed collection)
//! it reads. Writes are buffered. On commit the store re-checks all recorded versions;
//! if any changed, the commit fails with [`StoreError::Conflict`] and nothing is applied.
//! Reads of absent documents are versioned too, so two transactions that both
//! observed "absent" cannot both create the document.
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures instead of using `async fn` so the store can be held
//! as `Arc<dyn DocumentStore>` inside an environment.

use crate::path::{CollectionPath, DocPath};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Optimistic concurrency conflict: something this transaction read has changed.
    #[error("Transaction conflict on {path}")]
    Conflict {
        /// The first path whose version no longer matched.
        path: String,
    },

    /// `create` targeted a path that already holds a document.
    #[error("Document already exists: {0}")]
    AlreadyExists(DocPath),

    /// `update` targeted a path that holds no document.
    #[error("Document not found: {0}")]
    NotFound(DocPath),

    /// The transaction kept conflicting until the retry budget was spent.
    #[error("Transaction aborted after {attempts} attempts")]
    RetriesExhausted {
        /// Total attempts made (first try included).
        attempts: usize,
    },

    /// A read was issued after a write in the same transaction.
    #[error("Transactions must perform all reads before any write")]
    ReadAfterWrite,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend failure (network loss, unavailable service, ...).
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` if retrying the whole transaction may succeed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// A document as read from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Where the document lives.
    pub path: DocPath,
    /// Document body (always a JSON object).
    pub data: Value,
    /// Store-assigned version; changes on every write.
    pub version: u64,
    /// Commit timestamp of the transaction that created the document.
    pub create_time: DateTime<Utc>,
    /// Commit timestamp of the last write.
    pub update_time: DateTime<Utc>,
}

impl Snapshot {
    /// The document id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Decode the body into a typed document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        decode(&self.data)
    }
}

/// Encode a typed document into a store body.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if `value` cannot be represented as JSON.
pub fn encode<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(value)?)
}

/// Decode a store body into a typed document.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the body does not match `T`.
pub fn decode<T: DeserializeOwned>(data: &Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(data.clone())?)
}

/// Result of a successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    /// Store-assigned commit timestamp (non-decreasing across commits).
    pub commit_time: DateTime<Utc>,
}

/// Document store abstraction.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to be shared across tasks.
pub trait DocumentStore: Send + Sync {
    /// Read a single document.
    ///
    /// # Errors
    ///
    /// - `Backend`: the store could not be reached
    fn get(&self, path: &DocPath) -> BoxFuture<'_, Result<Option<Snapshot>, StoreError>>;

    /// Read every direct child document of a collection, ordered by document id.
    ///
    /// # Errors
    ///
    /// - `Backend`: the store could not be reached
    fn list(
        &self,
        collection: &CollectionPath,
    ) -> BoxFuture<'_, Result<Vec<Snapshot>, StoreError>>;

    /// Create a document; fails if one already exists at `path`.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists`: a document is already stored at `path`
    /// - `Backend`: the store could not be reached
    fn create(&self, path: &DocPath, data: Value) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Merge top-level fields into an existing document; fails if absent.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no document at `path`
    /// - `Backend`: the store could not be reached
    fn update(&self, path: &DocPath, data: Value) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Delete a document. Deleting an absent document is not an error.
    ///
    /// # Errors
    ///
    /// - `Backend`: the store could not be reached
    fn delete(&self, path: &DocPath) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Open a new transaction.
    ///
    /// # Errors
    ///
    /// - `Backend`: the store could not be reached
    fn begin(&self) -> BoxFuture<'_, Result<Box<dyn Transaction>, StoreError>>;
}

/// A single optimistic transaction.
///
/// All reads must be issued before the first write. Writes are buffered and become
/// visible atomically on [`Transaction::commit`]. Dropping a transaction without
/// committing aborts it.
pub trait Transaction: Send {
    /// Read a document and record its version in the read set.
    ///
    /// # Errors
    ///
    /// - `ReadAfterWrite`: a write was already buffered
    /// - `Backend`: the store could not be reached
    fn get(&mut self, path: &DocPath) -> BoxFuture<'_, Result<Option<Snapshot>, StoreError>>;

    /// List a collection and record its membership and every listed version.
    ///
    /// # Errors
    ///
    /// - `ReadAfterWrite`: a write was already buffered
    /// - `Backend`: the store could not be reached
    fn list(
        &mut self,
        collection: &CollectionPath,
    ) -> BoxFuture<'_, Result<Vec<Snapshot>, StoreError>>;

    /// Buffer a create-once write.
    fn create(&mut self, path: &DocPath, data: Value);

    /// Buffer a merge-update write.
    fn update(&mut self, path: &DocPath, data: Value);

    /// Buffer an idempotent delete.
    fn delete(&mut self, path: &DocPath);

    /// Validate the read set and apply all buffered writes atomically.
    ///
    /// # Errors
    ///
    /// - `Conflict`: a read document or collection changed since it was read
    /// - `AlreadyExists` / `NotFound`: a buffered create/update is invalid at commit time
    /// - `Backend`: the store could not be reached
    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<CommitInfo, StoreError>>;
}

/// A unit of work executed inside a transaction.
///
/// The body may be run several times: once per attempt, until a commit succeeds or
/// the body itself returns an error. It must therefore derive every decision from
/// what it reads through `tx`, never from state captured before the transaction.
pub trait TransactionBody: Send + Sync {
    /// Value produced by a committed attempt.
    type Output: Send;

    /// Domain error; store failures convert into it.
    type Error: From<StoreError> + std::fmt::Display + Send;

    /// Run one attempt against `tx`. Returning `Err` aborts without committing.
    fn run<'a>(
        &'a self,
        tx: &'a mut dyn Transaction,
    ) -> BoxFuture<'a, Result<Self::Output, Self::Error>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn conflict_error_display() {
        let error = StoreError::Conflict {
            path: "events/2025-06-10/slots/18:00".to_string(),
        };
        let display = format!("{error}");
        assert!(display.contains("events/2025-06-10/slots/18:00"));
        assert!(error.is_conflict());
    }

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(!StoreError::RetriesExhausted { attempts: 6 }.is_conflict());
        assert!(!StoreError::Backend("offline".to_string()).is_conflict());
    }

    #[test]
    fn encode_decode_typed_documents() {
        let sample = Sample {
            name: "court".to_string(),
            count: 2,
        };
        let value = encode(&sample).unwrap();
        assert_eq!(value, json!({ "name": "court", "count": 2 }));
        assert_eq!(decode::<Sample>(&value).unwrap(), sample);
    }

    #[test]
    fn decode_mismatch_is_serialization_error() {
        let result = decode::<Sample>(&json!({ "name": 3 }));
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
