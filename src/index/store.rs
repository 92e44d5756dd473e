//! Index store
//!
//! Concurrent filename → entry map, the single source of truth for the read
//! path. Request handlers read entries concurrently; the worker currently
//! scanning a file is its sole writer. `add` replaces any existing entry
//! wholesale and enqueues a full-index job; jobs for files that have since
//! been removed degrade to no-ops when a worker finds no entry.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::index::window::{PositionWindow, Status};

/// Mutable indexing state of one tracked file.
#[derive(Debug)]
pub struct IndexState {
    pub status: Status,
    pub window: PositionWindow,
}

/// One tracked file.
///
/// The scan lock serializes workers that picked up duplicate queue items for
/// the same file; it is never held by readers, so lookups stay concurrent
/// with an in-progress scan.
#[derive(Debug)]
pub struct IndexEntry {
    pub(crate) state: RwLock<IndexState>,
    pub(crate) scan: Mutex<()>,
}

impl IndexEntry {
    pub(crate) fn new(window_limit: usize) -> Self {
        Self {
            state: RwLock::new(IndexState {
                status: Status::Init,
                window: PositionWindow::new(window_limit),
            }),
            scan: Mutex::new(()),
        }
    }
}

/// Point-in-time view of an entry, taken by the read path to decide between
/// the fast and slow tail strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub status: Status,
    pub window_len: usize,
}

/// Concurrent mapping from filename to index entry.
pub struct IndexStore {
    entries: RwLock<HashMap<String, Arc<IndexEntry>>>,
    queue_tx: mpsc::UnboundedSender<String>,
    window_limit: usize,
}

impl IndexStore {
    /// Create a store together with the receiving half of its indexing
    /// queue. The receiver is handed to the worker pool; producers go
    /// through `add` / `update` and never block.
    pub fn new(window_limit: usize) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        (
            Self {
                entries: RwLock::new(HashMap::new()),
                queue_tx,
                window_limit,
            },
            queue_rx,
        )
    }

    /// Track `filename`, replacing any existing entry with a fresh empty one,
    /// and enqueue a full-index job.
    pub async fn add(&self, filename: &str) {
        let entry = Arc::new(IndexEntry::new(self.window_limit));
        self.entries
            .write()
            .await
            .insert(filename.to_string(), entry);
        self.enqueue(filename);
    }

    /// Enqueue an incremental job for a known file. Unknown files are
    /// ignored: modification events never implicitly create entries.
    pub async fn update(&self, filename: &str) {
        if self.entries.read().await.contains_key(filename) {
            self.enqueue(filename);
        }
    }

    /// Stop tracking `filename` immediately. Jobs still queued for it become
    /// no-ops once a worker looks it up.
    pub async fn remove(&self, filename: &str) {
        self.entries.write().await.remove(filename);
    }

    /// Tracked filenames and their statuses, in lexicographic order.
    pub async fn list_files(&self) -> Vec<(String, Status)> {
        let entries = self.entries.read().await;
        let mut files = Vec::with_capacity(entries.len());
        for (name, entry) in entries.iter() {
            files.push((name.clone(), entry.state.read().await.status));
        }
        drop(entries);
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// The live entry for `filename`, if tracked. Workers re-resolve through
    /// this on every job so that replaced or removed entries go stale
    /// harmlessly.
    pub async fn entry(&self, filename: &str) -> Option<Arc<IndexEntry>> {
        self.entries.read().await.get(filename).cloned()
    }

    /// Snapshot of `filename`'s status and window coverage.
    pub async fn get(&self, filename: &str) -> Option<EntrySnapshot> {
        let entry = self.entry(filename).await?;
        let state = entry.state.read().await;
        Some(EntrySnapshot {
            status: state.status,
            window_len: state.window.len(),
        })
    }

    /// Line-start offset for a tail of `n` lines. Callers must have verified
    /// `n` against the window length; see `PositionWindow::starting_offset`.
    pub async fn starting_offset(&self, filename: &str, n: usize) -> Option<u64> {
        let entry = self.entry(filename).await?;
        let state = entry.state.read().await;
        state.window.starting_offset(n)
    }

    fn enqueue(&self, filename: &str) {
        // The send half only closes at shutdown, once the workers are gone.
        if self.queue_tx.send(filename.to_string()).is_err() {
            tracing::debug!(file = %filename, "indexing queue closed, dropping job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;

    #[tokio::test]
    async fn add_creates_init_entry_and_enqueues_job() {
        let (store, mut queue_rx) = IndexStore::new(1024);

        store.add("a.log").await;

        let snapshot = store.get("a.log").await.unwrap();
        assert_eq!(snapshot.status, Status::Init);
        assert_eq!(snapshot.window_len, 0);
        assert_eq!(queue_rx.recv().await, Some("a.log".to_string()));
    }

    #[tokio::test]
    async fn update_unknown_file_enqueues_nothing() {
        let (store, mut queue_rx) = IndexStore::new(1024);

        store.update("missing.log").await;

        assert!(matches!(queue_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn update_known_file_enqueues_job() {
        let (store, mut queue_rx) = IndexStore::new(1024);

        store.add("a.log").await;
        store.update("a.log").await;

        assert_eq!(queue_rx.recv().await, Some("a.log".to_string()));
        assert_eq!(queue_rx.recv().await, Some("a.log".to_string()));
    }

    #[tokio::test]
    async fn re_add_replaces_the_entry_wholesale() {
        let (store, mut queue_rx) = IndexStore::new(1024);

        store.add("a.log").await;
        {
            let entry = store.entry("a.log").await.unwrap();
            let mut state = entry.state.write().await;
            state.status = Status::Ready;
            state.window.push(0);
            state.window.push(12);
        }

        store.add("a.log").await;

        let snapshot = store.get("a.log").await.unwrap();
        assert_eq!(snapshot.status, Status::Init);
        assert_eq!(snapshot.window_len, 0);
        assert_eq!(queue_rx.recv().await, Some("a.log".to_string()));
        assert_eq!(queue_rx.recv().await, Some("a.log".to_string()));
    }

    #[tokio::test]
    async fn remove_deletes_the_entry() {
        let (store, _queue_rx) = IndexStore::new(1024);

        store.add("a.log").await;
        store.remove("a.log").await;

        assert!(store.get("a.log").await.is_none());
        assert!(store.entry("a.log").await.is_none());
    }

    #[tokio::test]
    async fn list_files_is_lexicographic() {
        let (store, _queue_rx) = IndexStore::new(1024);

        store.add("b.log").await;
        store.add("a.log").await;
        store.add("c.log").await;

        let names: Vec<String> = store
            .list_files()
            .await
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a.log", "b.log", "c.log"]);
    }

    #[tokio::test]
    async fn starting_offset_follows_the_window_contract() {
        let (store, _queue_rx) = IndexStore::new(1024);

        store.add("a.log").await;
        {
            let entry = store.entry("a.log").await.unwrap();
            let mut state = entry.state.write().await;
            for offset in [0, 4, 8] {
                state.window.push(offset);
            }
        }

        assert_eq!(store.starting_offset("a.log", 2).await, Some(4));
        assert_eq!(store.starting_offset("a.log", 3).await, Some(0));
        // Defensive floor when the caller skipped the length check.
        assert_eq!(store.starting_offset("a.log", 99).await, Some(0));
        assert_eq!(store.starting_offset("missing.log", 1).await, None);
    }
}
