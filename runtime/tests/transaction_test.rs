//! Integration tests for the transaction driver against the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use courtside_core::path::DocPath;
use courtside_core::store::{StoreError, Transaction, TransactionBody};
use courtside_core::DocumentStore;
use courtside_runtime::{run_transaction, RetryPolicy};
use courtside_testing::InMemoryDocumentStore;
use futures::future::{join_all, BoxFuture};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, PartialEq, thiserror::Error)]
enum CounterError {
    #[error("counter is closed")]
    Closed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read-modify-write increment of a counter document.
struct Increment {
    path: DocPath,
    runs: AtomicUsize,
}

impl Increment {
    fn new(path: &DocPath) -> Self {
        Self {
            path: path.clone(),
            runs: AtomicUsize::new(0),
        }
    }
}

impl TransactionBody for Increment {
    type Output = i64;
    type Error = CounterError;

    fn run<'a>(&'a self, tx: &'a mut dyn Transaction) -> BoxFuture<'a, Result<i64, CounterError>> {
        Box::pin(async move {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let snapshot = tx.get(&self.path).await?;
            let data = snapshot.map(|s| s.data).unwrap_or_default();
            if data["closed"] == json!(true) {
                return Err(CounterError::Closed);
            }
            let next = data["value"].as_i64().unwrap_or(0) + 1;
            tx.update(&self.path, json!({ "value": next }));
            Ok(next)
        })
    }
}

fn counter() -> DocPath {
    "counters/shared".parse().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_never_lose_updates() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store.create(&counter(), json!({ "value": 0 })).await.unwrap();
    let policy = RetryPolicy::immediate(100);

    let tasks = (0..16).map(|_| {
        let store = Arc::clone(&store);
        let policy = policy.clone();
        tokio::spawn(async move {
            let body = Increment::new(&counter());
            run_transaction(store.as_ref(), &policy, &body).await
        })
    });

    let results: Vec<i64> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let mut sorted = results.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (1..=16).collect::<Vec<_>>());

    let stored = store.get(&counter()).await.unwrap().unwrap();
    assert_eq!(stored.data["value"], 16);
}

#[tokio::test]
async fn body_errors_abort_without_retry() {
    let store = InMemoryDocumentStore::new();
    store
        .create(&counter(), json!({ "value": 3, "closed": true }))
        .await
        .unwrap();
    let body = Increment::new(&counter());

    let result = run_transaction(&store, &RetryPolicy::immediate(5), &body).await;

    assert_eq!(result, Err(CounterError::Closed));
    assert_eq!(body.runs.load(Ordering::SeqCst), 1);
    assert_eq!(store.get(&counter()).await.unwrap().unwrap().data["value"], 3);
}

#[tokio::test]
async fn conflicts_are_retried_then_exhausted() {
    let store = InMemoryDocumentStore::new();
    store.create(&counter(), json!({ "value": 0 })).await.unwrap();

    store.inject_conflicts(2);
    let body = Increment::new(&counter());
    let value = run_transaction(&store, &RetryPolicy::immediate(2), &body)
        .await
        .unwrap();
    assert_eq!(value, 1);
    assert_eq!(body.runs.load(Ordering::SeqCst), 3);

    store.inject_conflicts(10);
    let body = Increment::new(&counter());
    let result = run_transaction(&store, &RetryPolicy::immediate(2), &body).await;
    assert_eq!(
        result,
        Err(CounterError::Store(StoreError::RetriesExhausted { attempts: 3 }))
    );
}

#[tokio::test]
async fn commit_time_validation_errors_are_not_retried() {
    struct CreateTwice;

    impl TransactionBody for CreateTwice {
        type Output = ();
        type Error = StoreError;

        fn run<'a>(&'a self, tx: &'a mut dyn Transaction) -> BoxFuture<'a, Result<(), StoreError>> {
            Box::pin(async move {
                tx.create(&counter(), json!({}));
                tx.create(&counter(), json!({}));
                Ok(())
            })
        }
    }

    let store = InMemoryDocumentStore::new();
    let result = run_transaction(&store, &RetryPolicy::immediate(5), &CreateTwice).await;

    assert_eq!(result, Err(StoreError::AlreadyExists(counter())));
    assert!(store.is_empty());
}
