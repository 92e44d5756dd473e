//! Indexing worker pool
//!
//! A fixed set of tokio tasks drains the shared indexing queue. Each job
//! resolves its filename against the store (entries removed in the meantime
//! make the job a no-op), then either builds the index with a full scan from
//! offset 0 (`INIT`) or extends it with an incremental scan resuming at the
//! last recorded line start (`READY`).
//!
//! Scans only ever append to the in-memory window, so an interruption at any
//! point leaves a shorter but still valid index. I/O failures abandon the
//! job and leave the entry in its last-known-good state; only the
//! cancellation token stops a worker.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::index::store::{IndexEntry, IndexStore};
use crate::index::window::Status;

/// Read granularity for scans. Offsets are still tracked per byte.
const SCAN_BUF_SIZE: usize = 8 * 1024;

/// Fixed-size pool of indexing workers.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks draining `queue_rx`. Workers exit when the
    /// cancellation token fires or the queue's send half is dropped.
    pub fn spawn(
        store: Arc<IndexStore>,
        dir: PathBuf,
        queue_rx: mpsc::UnboundedReceiver<String>,
        workers: usize,
        cancel: CancellationToken,
    ) -> Self {
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let handles = (0..workers.max(1))
            .map(|id| {
                let store = Arc::clone(&store);
                let queue_rx = Arc::clone(&queue_rx);
                let cancel = cancel.clone();
                let dir = dir.clone();
                tokio::spawn(worker_loop(id, store, dir, queue_rx, cancel))
            })
            .collect();
        Self { handles }
    }

    /// Wait for every worker to exit. Cancel the shared token first.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("indexing worker panicked: {}", e);
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    store: Arc<IndexStore>,
    dir: PathBuf,
    queue_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    cancel: CancellationToken,
) {
    loop {
        // Hold the receiver only while blocked on the queue, so the other
        // workers can take the next item as soon as this one has a job.
        let filename = {
            let mut rx = queue_rx.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => None,
                item = rx.recv() => item,
            }
        };
        let Some(filename) = filename else { break };
        index_file(&store, &dir, &filename).await;
    }
    debug!(worker = id, "indexing worker stopped");
}

/// Process one queue item end to end.
async fn index_file(store: &IndexStore, dir: &Path, filename: &str) {
    let Some(entry) = store.entry(filename).await else {
        debug!(file = %filename, "skipping job for untracked file");
        return;
    };

    // Serialize duplicate jobs for the same file. Readers never take this
    // lock, so lookups stay concurrent with the scan.
    let _scan = entry.scan.lock().await;

    let path = dir.join(filename);
    let status = entry.state.read().await.status;
    let result = match status {
        Status::Init => {
            debug!(file = %filename, "building position index");
            build(&entry, &path).await
        }
        Status::Ready => {
            debug!(file = %filename, "refreshing position index");
            refresh(&entry, &path).await
        }
    };

    if let Err(e) = result {
        // Abandon the job; the entry keeps its last-known-good window and a
        // future modification event may schedule another attempt.
        warn!(file = %filename, "indexing failed: {}", e);
    }
}

/// Full scan from offset 0, then flip the entry to `Ready` while keeping the
/// accumulated offsets.
async fn build(entry: &IndexEntry, path: &Path) -> std::io::Result<()> {
    scan_from(entry, path, 0).await?;
    entry.state.write().await.status = Status::Ready;
    Ok(())
}

/// Incremental scan: resume at the last recorded line start, re-reading the
/// final (possibly still growing) line. A file that shrank since the last
/// scan is reindexed from scratch in place.
async fn refresh(entry: &IndexEntry, path: &Path) -> std::io::Result<()> {
    let resume = entry.state.read().await.window.last().unwrap_or(0);

    let file_len = tokio::fs::metadata(path).await?.len();
    if file_len < resume {
        debug!(path = %path.display(), "file shrank, rebuilding index");
        entry.state.write().await.window.clear();
        return scan_from(entry, path, 0).await;
    }
    scan_from(entry, path, resume).await
}

/// Scan `path` from byte `offset`, appending every newly discovered
/// line-start offset to the entry's window.
///
/// Offset 0 is recorded as a line start as soon as the file proves
/// non-empty; after that, a line start is the first byte following a `\n`.
/// A terminator at end-of-file records nothing until a later byte arrives.
async fn scan_from(entry: &IndexEntry, path: &Path, offset: u64) -> std::io::Result<()> {
    let mut file = File::open(path).await?;
    if offset > 0 {
        file.seek(SeekFrom::Start(offset)).await?;
    }
    let mut reader = BufReader::new(file);
    let mut buf = vec![0u8; SCAN_BUF_SIZE];
    let mut pos = offset;
    let mut after_terminator = false;
    let mut batch: Vec<u64> = Vec::new();

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        for &byte in &buf[..n] {
            if pos == 0 || after_terminator {
                batch.push(pos);
            }
            after_terminator = byte == b'\n';
            pos += 1;
        }
        // Append per chunk, not per scan, so readers are never blocked for
        // the duration of a long file.
        if !batch.is_empty() {
            let mut state = entry.state.write().await;
            for &line_start in &batch {
                state.window.push(line_start);
            }
            batch.clear();
        }
    }
    Ok(())
}
