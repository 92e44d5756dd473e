//! Log directory discovery
//!
//! Bridges filesystem change notifications into the index store. On startup
//! every regular file already present in the directory is added; afterwards
//! creation, modification, and deletion events dispatch to the store's
//! `add` / `update` / `remove`. Non-regular entries (directories, sockets)
//! are filtered out before any call.
//!
//! The directory is flat: a file's final path component is its tracking key.

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::index::IndexStore;

/// Errors raised while setting up directory watching. All of them are fatal
/// at startup.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch {path:?}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },

    #[error("failed to list {path:?}: {source}")]
    List {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Watches one log directory and keeps the index store in sync with it.
pub struct LogWatcher {
    handle: JoinHandle<()>,
}

impl LogWatcher {
    /// Index every regular file already in `dir`, then watch it for changes
    /// until the cancellation token fires.
    pub async fn start(
        dir: PathBuf,
        store: Arc<IndexStore>,
        cancel: CancellationToken,
    ) -> Result<Self, WatchError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        // notify invokes this on its own thread; sends fail only once the
        // event loop has shut down and nobody is listening.
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        })
        .map_err(|e| WatchError::Watch {
            path: dir.clone(),
            source: e,
        })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Watch {
                path: dir.clone(),
                source: e,
            })?;

        seed(&dir, &store).await.map_err(|e| WatchError::List {
            path: dir.clone(),
            source: e,
        })?;

        let handle = tokio::spawn(event_loop(watcher, store, event_rx, cancel));
        Ok(Self { handle })
    }

    /// Wait for the event loop to exit. Cancel the shared token first.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!("log watcher task panicked: {}", e);
        }
    }
}

/// Add every regular file present in the directory at startup.
async fn seed(dir: &Path, store: &IndexStore) -> std::io::Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            debug!(path = %entry.path().display(), "skipping non-regular entry");
            continue;
        }
        if let Some(name) = filename_of(&entry.path()) {
            store.add(&name).await;
            count += 1;
        }
    }
    info!(files = count, "seeded index from existing log files");
    Ok(())
}

async fn event_loop(
    _watcher: RecommendedWatcher,
    store: Arc<IndexStore>,
    mut event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = event_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        match event {
            Ok(event) => dispatch(&store, event).await,
            Err(e) => warn!("filesystem watch error: {}", e),
        }
    }
    debug!("log watcher stopped");
}

/// Map one filesystem event onto store operations.
async fn dispatch(store: &IndexStore, event: Event) {
    for path in &event.paths {
        let Some(name) = filename_of(path) else {
            continue;
        };
        match event.kind {
            EventKind::Create(_) => {
                if !is_regular_file(path).await {
                    debug!(path = %path.display(), "skipping non-regular entry");
                    continue;
                }
                debug!(file = %name, "log file created");
                store.add(&name).await;
            }
            // A rename shows up with the old path gone and the new one
            // present; re-add the survivor and drop the vanished name.
            EventKind::Modify(ModifyKind::Name(_)) => {
                if is_regular_file(path).await {
                    debug!(file = %name, "log file renamed in");
                    store.add(&name).await;
                } else {
                    debug!(file = %name, "log file renamed away");
                    store.remove(&name).await;
                }
            }
            EventKind::Modify(_) => {
                if !is_regular_file(path).await {
                    continue;
                }
                debug!(file = %name, "log file modified");
                store.update(&name).await;
            }
            EventKind::Remove(_) => {
                debug!(file = %name, "log file removed");
                store.remove(&name).await;
            }
            _ => {}
        }
    }
}

fn filename_of(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
