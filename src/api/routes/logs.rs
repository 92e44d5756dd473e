//! Log Routes
//!
//! - `GET /api/v1/logs` - List tracked files and their index status
//! - `GET /api/v1/logs/tail?log=<name>&n=<count>` - Stream the last `n`
//!   lines of one file

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::dto::{ListLogsResponse, LogFileEntry, NotReadyResponse, TailParams};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::index::Status;

/// Buffer size for bridging file reads into the response body.
const STREAM_BUF_SIZE: usize = 16 * 1024;

/// GET /api/v1/logs
///
/// List every tracked file with its current indexing status,
/// lexicographically ordered.
pub async fn list_logs(State(state): State<Arc<AppState>>) -> Json<ListLogsResponse> {
    let files: Vec<LogFileEntry> = state
        .index
        .list_files()
        .await
        .into_iter()
        .map(|(name, status)| LogFileEntry { name, status })
        .collect();

    Json(ListLogsResponse {
        total: files.len(),
        files,
    })
}

/// GET /api/v1/logs/tail?log=<name>&n=<count>
///
/// Stream the last `n` lines of a tracked file. Depths covered by the index
/// window are served by seeking straight to the recorded line start; deeper
/// requests fall back to a full two-pass scan.
pub async fn tail_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TailParams>,
) -> ApiResult<Response> {
    let (name, n) = validate_params(params)?;

    let snapshot = state
        .index
        .get(&name)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Log file '{}' is not tracked", name)))?;

    // Not an error: the first scan just hasn't finished yet.
    if snapshot.status == Status::Init {
        let body = NotReadyResponse {
            status: "indexing".to_string(),
            message: format!("Log file '{}' is still being indexed, try again later", name),
        };
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    }

    if n == 0 {
        return Ok(text_response(Body::empty()));
    }

    let body = if n <= snapshot.window_len as u64 {
        let offset = state
            .index
            .starting_offset(&name, n as usize)
            .await
            .ok_or_else(|| {
                ApiError::Internal(format!("Index window for '{}' vanished mid-request", name))
            })?;
        tracing::debug!(file = %name, n, offset, "serving tail from index");
        stream_fast(state, name, offset)
    } else {
        tracing::debug!(file = %name, n, window = snapshot.window_len, "serving tail via full scan");
        stream_slow(state, name, n)
    };

    Ok(text_response(body))
}

/// Validate presence and shape of the tail parameters, before any index
/// lookup.
fn validate_params(params: TailParams) -> ApiResult<(String, u64)> {
    let name = params
        .log
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing required parameter 'log'".to_string()))?;

    let raw = params
        .n
        .ok_or_else(|| ApiError::BadRequest("missing required parameter 'n'".to_string()))?;
    let n = raw.parse::<u64>().map_err(|_| {
        ApiError::BadRequest(format!(
            "parameter 'n' must be a non-negative integer, got '{}'",
            raw
        ))
    })?;

    Ok((name, n))
}

/// Bridge a positional read into a streamed response body.
fn stream_fast(state: Arc<AppState>, name: String, offset: u64) -> Body {
    let (mut writer, rx) = tokio::io::duplex(STREAM_BUF_SIZE);
    tokio::spawn(async move {
        if let Err(e) = state.reader.read_fast(&name, offset, &mut writer).await {
            tracing::warn!(file = %name, "fast tail read failed mid-stream: {}", e);
        }
    });
    Body::from_stream(ReaderStream::new(rx))
}

/// Bridge a two-pass scan into a streamed response body.
fn stream_slow(state: Arc<AppState>, name: String, n: u64) -> Body {
    let (mut writer, rx) = tokio::io::duplex(STREAM_BUF_SIZE);
    tokio::spawn(async move {
        if let Err(e) = state.reader.read_slow(&name, n, &mut writer).await {
            tracing::warn!(file = %name, "slow tail read failed mid-stream: {}", e);
        }
    });
    Body::from_stream(ReaderStream::new(rx))
}

fn text_response(body: Body) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
