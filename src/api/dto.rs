//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::index::Status;

// ============================================
// LOG DTOs
// ============================================

/// One tracked file in the list response
#[derive(Debug, Serialize)]
pub struct LogFileEntry {
    /// Filename within the log directory
    pub name: String,
    /// Current indexing status
    pub status: Status,
}

/// List response
#[derive(Debug, Serialize)]
pub struct ListLogsResponse {
    pub total: usize,
    pub files: Vec<LogFileEntry>,
}

/// Raw tail query parameters.
///
/// Both fields are optional here so the handler can validate presence and
/// shape itself, before any index lookup.
#[derive(Debug, Deserialize)]
pub struct TailParams {
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
}

/// Body for the "still indexing" response
#[derive(Debug, Serialize)]
pub struct NotReadyResponse {
    /// Always "indexing"
    pub status: String,
    pub message: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub tracked_files: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
