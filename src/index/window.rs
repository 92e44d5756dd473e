//! Line-position window
//!
//! Per-file bounded sliding window of line-start byte offsets, plus the
//! indexing lifecycle marker. The window only ever covers the most recent
//! line starts: appending past capacity evicts from the front, which bounds
//! per-file memory regardless of how large the file grows.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Default capacity of a position window.
pub const WINDOW_LIMIT: usize = 1024;

/// Indexing lifecycle of a tracked file.
///
/// `Init` entries are still building their first index and are not queryable;
/// `Ready` entries have completed at least one full scan. The transition is
/// one-way for the lifetime of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Init,
    Ready,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Init => write!(f, "INIT"),
            Status::Ready => write!(f, "READY"),
        }
    }
}

/// Bounded, strictly ascending sequence of line-start byte offsets.
#[derive(Debug, Clone)]
pub struct PositionWindow {
    positions: VecDeque<u64>,
    limit: usize,
}

impl PositionWindow {
    pub fn new(limit: usize) -> Self {
        Self {
            positions: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Most recent line-start offset, if any.
    pub fn last(&self) -> Option<u64> {
        self.positions.back().copied()
    }

    /// Append a newly discovered line start, evicting the oldest offset when
    /// the window is full. Offsets must arrive in ascending order.
    pub fn push(&mut self, offset: u64) {
        debug_assert!(
            self.positions.back().map_or(true, |&back| back < offset),
            "line-start offsets must be strictly ascending"
        );
        self.positions.push_back(offset);
        if self.positions.len() > self.limit {
            self.positions.pop_front();
        }
    }

    /// Drop every recorded offset (used when a file shrinks and must be
    /// reindexed from scratch).
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Offset of the line `n` lines from the end of the window.
    ///
    /// Callers must verify `n <= len()` before relying on the result. When
    /// that contract is violated this clamps to the oldest retained offset, a
    /// defensive floor that callers must treat as "take the slow path", not
    /// as a usable position.
    pub fn starting_offset(&self, n: usize) -> Option<u64> {
        if self.positions.is_empty() {
            return None;
        }
        let i = self.len().saturating_sub(n).min(self.len() - 1);
        self.positions.get(i).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.positions.iter().copied()
    }
}
