//! # logtail
//!
//! Fast "tail" reads over growing text log files, without rescanning whole
//! files on every request.
//!
//! logtail keeps, per file, a bounded sliding window of line-start byte
//! offsets, built incrementally as the file grows. Small/recent tail
//! requests seek straight to an indexed offset; deeper requests fall back to
//! a full linear scan. The index lives purely in memory and is rebuilt from
//! scratch on every process start.
//!
//! ## Architecture
//!
//! ```text
//! Index path:
//!   fs event → IndexStore (add/update/remove) → queue → WorkerPool → PositionWindow
//!
//! Read path:
//!   GET /logs/tail → route (n ≤ window ? fast : slow) → TailReader → response body
//! ```
//!
//! ## Modules
//!
//! - [`index`]: incremental line-position index (window, store, workers)
//! - [`reader`]: dual-path tail reader
//! - [`watch`]: log directory discovery and change dispatch
//! - [`api`]: REST API server with Axum
//! - [`config`]: configuration loading

pub mod api;
pub mod config;
pub mod index;
pub mod reader;
pub mod watch;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiConfig, ApiError, ApiResult, AppState};

pub use config::{Config, ConfigError, IndexerConfig, ServerConfig};

pub use index::{
    EntrySnapshot, IndexStore, PositionWindow, Status, WorkerPool, WINDOW_LIMIT,
};

pub use reader::TailReader;

pub use watch::{LogWatcher, WatchError};
