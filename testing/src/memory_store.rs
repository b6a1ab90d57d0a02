//! In-memory transactional document store.
//!
//! [`InMemoryDocumentStore`] implements the full optimistic-transaction contract of
//! [`DocumentStore`] so booking logic can be exercised, including under real task
//! concurrency, without a backend:
//!
//! - every path carries a monotonically increasing version that survives deletion,
//!   so "read as absent" is validated at commit just like "read as present"
//! - every collection carries a membership version bumped on create/delete
//! - transactional reads yield to the scheduler, so concurrent transactions
//!   genuinely interleave between read and commit
//! - commit timestamps come from the injected [`Clock`] and never go backwards;
//!   with a fixed clock, documents created in different commits share a timestamp

use chrono::{DateTime, Utc};
use courtside_core::environment::{Clock, SystemClock};
use courtside_core::path::{CollectionPath, DocPath};
use courtside_core::store::{CommitInfo, DocumentStore, Snapshot, StoreError, Transaction};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct Entry {
    data: Value,
    version: u64,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
enum Write {
    Create(DocPath, Value),
    Update(DocPath, Value),
    Delete(DocPath),
}

impl Write {
    const fn path(&self) -> &DocPath {
        match self {
            Self::Create(path, _) | Self::Update(path, _) | Self::Delete(path) => path,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    docs: BTreeMap<DocPath, Entry>,
    versions: HashMap<DocPath, u64>,
    collection_versions: HashMap<CollectionPath, u64>,
    sequence: u64,
    last_commit: Option<DateTime<Utc>>,
    injected_conflicts: usize,
    commits: u64,
}

impl State {
    fn doc_version(&self, path: &DocPath) -> u64 {
        self.versions.get(path).copied().unwrap_or(0)
    }

    fn collection_version(&self, collection: &CollectionPath) -> u64 {
        self.collection_versions.get(collection).copied().unwrap_or(0)
    }

    fn snapshot(&self, path: &DocPath) -> Option<Snapshot> {
        self.docs.get(path).map(|entry| Snapshot {
            path: path.clone(),
            data: entry.data.clone(),
            version: entry.version,
            create_time: entry.create_time,
            update_time: entry.update_time,
        })
    }

    fn list(&self, collection: &CollectionPath) -> Vec<Snapshot> {
        self.docs
            .keys()
            .filter(|path| collection.contains(path))
            .filter_map(|path| self.snapshot(path))
            .collect()
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn commit(
        &mut self,
        now: DateTime<Utc>,
        reads: &HashMap<DocPath, u64>,
        collection_reads: &HashMap<CollectionPath, u64>,
        writes: Vec<Write>,
    ) -> Result<CommitInfo, StoreError> {
        if self.injected_conflicts > 0 {
            self.injected_conflicts -= 1;
            return Err(StoreError::Conflict {
                path: writes
                    .first()
                    .map_or_else(|| "<injected>".to_string(), |w| w.path().to_string()),
            });
        }

        for (path, version) in reads {
            if self.doc_version(path) != *version {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                });
            }
        }
        for (collection, version) in collection_reads {
            if self.collection_version(collection) != *version {
                return Err(StoreError::Conflict {
                    path: collection.to_string(),
                });
            }
        }

        // Validate the whole batch before applying anything.
        let mut exists: HashMap<&DocPath, bool> = HashMap::new();
        for write in &writes {
            let path = write.path();
            let present = exists
                .get(path)
                .copied()
                .unwrap_or_else(|| self.docs.contains_key(path));
            match write {
                Write::Create(..) if present => {
                    return Err(StoreError::AlreadyExists(path.clone()));
                }
                Write::Update(..) if !present => {
                    return Err(StoreError::NotFound(path.clone()));
                }
                Write::Create(..) | Write::Update(..) => {
                    exists.insert(path, true);
                }
                Write::Delete(_) => {
                    exists.insert(path, false);
                }
            }
        }

        let commit_time = self.last_commit.map_or(now, |last| last.max(now));
        self.last_commit = Some(commit_time);

        for write in writes {
            self.apply(write, commit_time);
        }
        self.commits += 1;

        Ok(CommitInfo { commit_time })
    }

    fn apply(&mut self, write: Write, at: DateTime<Utc>) {
        match write {
            Write::Create(path, data) => {
                let version = self.next_sequence();
                self.collection_versions.insert(path.parent(), version);
                self.versions.insert(path.clone(), version);
                self.docs.insert(
                    path,
                    Entry {
                        data,
                        version,
                        create_time: at,
                        update_time: at,
                    },
                );
            }
            Write::Update(path, patch) => {
                let version = self.next_sequence();
                if let Some(entry) = self.docs.get_mut(&path) {
                    merge_fields(&mut entry.data, patch);
                    entry.version = version;
                    entry.update_time = at;
                }
                self.versions.insert(path, version);
            }
            Write::Delete(path) => {
                if self.docs.remove(&path).is_some() {
                    let version = self.next_sequence();
                    self.collection_versions.insert(path.parent(), version);
                    self.versions.insert(path, version);
                }
            }
        }
    }
}

fn merge_fields(target: &mut Value, patch: Value) {
    match patch {
        Value::Object(fields) if target.is_object() => {
            if let Some(object) = target.as_object_mut() {
                for (key, value) in fields {
                    object.insert(key, value);
                }
            }
        }
        other => *target = other,
    }
}

/// In-memory document store for fast, deterministic tests.
///
/// # Example
///
/// ```
/// use courtside_core::path::CollectionPath;
/// use courtside_core::store::DocumentStore;
/// use courtside_testing::InMemoryDocumentStore;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryDocumentStore::new();
/// let path = CollectionPath::root("reservations").doc("2025-06-10");
///
/// store.create(&path, json!({ "occupantId": "alice" })).await?;
/// assert!(store.create(&path, json!({})).await.is_err()); // create-once
/// assert!(store.get(&path).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDocumentStore {
    /// Create an empty store stamping commits with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamping commits with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `count` commits fail with [`StoreError::Conflict`].
    ///
    /// Useful to exercise retry exhaustion deterministically.
    pub fn inject_conflicts(&self, count: usize) {
        self.lock().injected_conflicts = count;
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().docs.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().docs.is_empty()
    }

    /// Check if a document exists.
    #[must_use]
    pub fn contains(&self, path: &DocPath) -> bool {
        self.lock().docs.contains_key(path)
    }

    /// Number of successful commits so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.lock().commits
    }

    fn read_doc(&self, path: &DocPath) -> (u64, Option<Snapshot>) {
        let state = self.lock();
        (state.doc_version(path), state.snapshot(path))
    }

    fn read_collection(&self, collection: &CollectionPath) -> (u64, Vec<Snapshot>) {
        let state = self.lock();
        (state.collection_version(collection), state.list(collection))
    }

    fn commit_writes(
        &self,
        reads: &HashMap<DocPath, u64>,
        collection_reads: &HashMap<CollectionPath, u64>,
        writes: Vec<Write>,
    ) -> Result<CommitInfo, StoreError> {
        let now = self.clock.now();
        self.lock().commit(now, reads, collection_reads, writes)
    }

    fn single_write(&self, write: Write) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.commit_writes(&HashMap::new(), &HashMap::new(), vec![write])
                .map(|_| ())
        })
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("documents", &self.len())
            .finish_non_exhaustive()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, path: &DocPath) -> BoxFuture<'_, Result<Option<Snapshot>, StoreError>> {
        let path = path.clone();
        Box::pin(async move { Ok(self.read_doc(&path).1) })
    }

    fn list(
        &self,
        collection: &CollectionPath,
    ) -> BoxFuture<'_, Result<Vec<Snapshot>, StoreError>> {
        let collection = collection.clone();
        Box::pin(async move { Ok(self.read_collection(&collection).1) })
    }

    fn create(&self, path: &DocPath, data: Value) -> BoxFuture<'_, Result<(), StoreError>> {
        self.single_write(Write::Create(path.clone(), data))
    }

    fn update(&self, path: &DocPath, data: Value) -> BoxFuture<'_, Result<(), StoreError>> {
        self.single_write(Write::Update(path.clone(), data))
    }

    fn delete(&self, path: &DocPath) -> BoxFuture<'_, Result<(), StoreError>> {
        self.single_write(Write::Delete(path.clone()))
    }

    fn begin(&self) -> BoxFuture<'_, Result<Box<dyn Transaction>, StoreError>> {
        let tx: Box<dyn Transaction> = Box::new(InMemoryTransaction {
            store: self.clone(),
            reads: HashMap::new(),
            collection_reads: HashMap::new(),
            writes: Vec::new(),
        });
        Box::pin(async move { Ok(tx) })
    }
}

/// Transaction handle of [`InMemoryDocumentStore`].
struct InMemoryTransaction {
    store: InMemoryDocumentStore,
    reads: HashMap<DocPath, u64>,
    collection_reads: HashMap<CollectionPath, u64>,
    writes: Vec<Write>,
}

impl Transaction for InMemoryTransaction {
    fn get(&mut self, path: &DocPath) -> BoxFuture<'_, Result<Option<Snapshot>, StoreError>> {
        let path = path.clone();
        Box::pin(async move {
            if !self.writes.is_empty() {
                return Err(StoreError::ReadAfterWrite);
            }
            tokio::task::yield_now().await;

            let (version, snapshot) = self.store.read_doc(&path);
            self.reads.entry(path).or_insert(version);
            Ok(snapshot)
        })
    }

    fn list(
        &mut self,
        collection: &CollectionPath,
    ) -> BoxFuture<'_, Result<Vec<Snapshot>, StoreError>> {
        let collection = collection.clone();
        Box::pin(async move {
            if !self.writes.is_empty() {
                return Err(StoreError::ReadAfterWrite);
            }
            tokio::task::yield_now().await;

            let (version, snapshots) = self.store.read_collection(&collection);
            self.collection_reads.entry(collection).or_insert(version);
            for snapshot in &snapshots {
                self.reads
                    .entry(snapshot.path.clone())
                    .or_insert(snapshot.version);
            }
            Ok(snapshots)
        })
    }

    fn create(&mut self, path: &DocPath, data: Value) {
        self.writes.push(Write::Create(path.clone(), data));
    }

    fn update(&mut self, path: &DocPath, data: Value) {
        self.writes.push(Write::Update(path.clone(), data));
    }

    fn delete(&mut self, path: &DocPath) {
        self.writes.push(Write::Delete(path.clone()));
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<CommitInfo, StoreError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let Self {
                store,
                reads,
                collection_reads,
                writes,
            } = *self;
            store.commit_writes(&reads, &collection_reads, writes)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::FixedClock;
    use serde_json::json;

    fn doc(path: &str) -> DocPath {
        path.parse().unwrap()
    }

    #[tokio::test]
    async fn create_is_create_once() {
        let store = InMemoryDocumentStore::new();
        let path = doc("reservations/2025-06-10/slots/09:00");

        store.create(&path, json!({ "occupantId": "a" })).await.unwrap();
        let second = store.create(&path, json!({ "occupantId": "b" })).await;

        assert_eq!(second, Err(StoreError::AlreadyExists(path.clone())));
        let snapshot = store.get(&path).await.unwrap().unwrap();
        assert_eq!(snapshot.data["occupantId"], "a");
    }

    #[tokio::test]
    async fn update_merges_and_requires_presence() {
        let store = InMemoryDocumentStore::new();
        let path = doc("events/2025-06-10/slots/18:00");

        assert_eq!(
            store.update(&path, json!({ "locked": true })).await,
            Err(StoreError::NotFound(path.clone()))
        );

        store
            .create(&path, json!({ "title": "Americano", "locked": false }))
            .await
            .unwrap();
        store.update(&path, json!({ "locked": true })).await.unwrap();

        let data = store.get(&path).await.unwrap().unwrap().data;
        assert_eq!(data, json!({ "title": "Americano", "locked": true }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        let path = doc("reservations/2025-06-10/slots/09:00");
        store.create(&path, json!({})).await.unwrap();

        store.delete(&path).await.unwrap();
        store.delete(&path).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn list_returns_direct_children_in_id_order() {
        let store = InMemoryDocumentStore::new();
        for id in ["c", "a", "b"] {
            store
                .create(&doc(&format!("events/d/slots/s/waitlist/{id}")), json!({}))
                .await
                .unwrap();
        }
        store
            .create(&doc("events/d/slots/s/waitlist/a/nested/x"), json!({}))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list(&"events/d/slots/s/waitlist".parse().unwrap())
            .await
            .unwrap()
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn concurrent_read_then_write_conflicts() {
        let store = InMemoryDocumentStore::new();
        let path = doc("events/d/slots/s/seats/1");
        store.create(&path, json!({ "taken": false })).await.unwrap();

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        first.get(&path).await.unwrap();
        second.get(&path).await.unwrap();
        first.update(&path, json!({ "taken": true }));
        second.update(&path, json!({ "taken": true }));

        assert!(first.commit().await.is_ok());
        assert!(second.commit().await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn absent_reads_are_validated() {
        let store = InMemoryDocumentStore::new();
        let reservation = doc("reservations/d/slots/s");

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get(&reservation).await.unwrap().is_none());

        store.create(&reservation, json!({})).await.unwrap();
        tx.create(&doc("events/d/slots/s"), json!({}));

        assert!(tx.commit().await.unwrap_err().is_conflict());
        assert!(!store.contains(&doc("events/d/slots/s")));
    }

    #[tokio::test]
    async fn collection_membership_is_validated() {
        let store = InMemoryDocumentStore::new();
        let waitlist: CollectionPath = "events/d/slots/s/waitlist".parse().unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.list(&waitlist).await.unwrap().is_empty());

        store.create(&waitlist.doc("zoe"), json!({})).await.unwrap();
        tx.create(&doc("events/d/slots/s/seats/1"), json!({}));

        assert!(tx.commit().await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn failed_batch_applies_nothing() {
        let store = InMemoryDocumentStore::new();
        let existing = doc("events/d/slots/s");
        store.create(&existing, json!({})).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.create(&doc("events/d/slots/s/seats/1"), json!({}));
        tx.create(&existing, json!({}));

        assert_eq!(
            tx.commit().await,
            Err(StoreError::AlreadyExists(existing))
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn reads_after_writes_are_rejected() {
        let store = InMemoryDocumentStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.delete(&doc("a/b"));
        assert_eq!(tx.get(&doc("a/c")).await, Err(StoreError::ReadAfterWrite));
    }

    #[tokio::test]
    async fn commit_times_come_from_clock() {
        let at = crate::mocks::test_clock().now();
        let store = InMemoryDocumentStore::with_clock(Arc::new(FixedClock::new(at)));
        let path = doc("a/b");

        store.create(&path, json!({})).await.unwrap();
        let snapshot = store.get(&path).await.unwrap().unwrap();
        assert_eq!(snapshot.create_time, at);
        assert_eq!(snapshot.update_time, at);
    }

    #[tokio::test]
    async fn injected_conflicts_fail_commits() {
        let store = InMemoryDocumentStore::new();
        store.inject_conflicts(1);

        assert!(store.create(&doc("a/b"), json!({})).await.unwrap_err().is_conflict());
        assert!(store.create(&doc("a/b"), json!({})).await.is_ok());
        assert_eq!(store.commit_count(), 1);
    }
}
