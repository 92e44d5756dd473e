//! Incremental line-position index
//!
//! Maintains, per tracked log file, a bounded sliding window of line-start
//! byte offsets, built incrementally as the file grows:
//!
//! - **window**: bounded ascending offset window + lifecycle status
//! - **store**: concurrent filename → entry map, single source of truth
//! - **worker**: pool draining the indexing queue, running the scans
//!
//! # Architecture
//!
//! ```text
//! fs event → IndexStore.add/update/remove
//!                 ↓ enqueue
//!           indexing queue (FIFO, unbounded, duplicates allowed)
//!                 ↓ drain
//!           WorkerPool: INIT → full scan → READY
//!                       READY → incremental scan from last line start
//!                 ↓ append / evict
//!           PositionWindow (≤ limit most recent line starts)
//! ```
//!
//! Readers snapshot entries concurrently while the worker assigned to a file
//! appends to its window; a slightly stale window is fine, a torn one never
//! happens.

pub mod store;
pub mod window;
pub mod worker;

pub use store::{EntrySnapshot, IndexEntry, IndexState, IndexStore};
pub use window::{PositionWindow, Status, WINDOW_LIMIT};
pub use worker::WorkerPool;
