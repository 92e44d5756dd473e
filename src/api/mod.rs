//! logtail REST API
//!
//! HTTP API layer for logtail, built with Axum.
//!
//! # Endpoints
//!
//! ## Logs
//! - `GET /api/v1/logs` - List tracked files and their index status
//! - `GET /api/v1/logs/tail?log=<name>&n=<count>` - Stream the last `n`
//!   lines of one file
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use logtail::api::{build_router, serve, ApiConfig, AppState};
//! use logtail::index::{IndexStore, WorkerPool, WINDOW_LIMIT};
//! use logtail::reader::TailReader;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = std::path::PathBuf::from("/var/log/myapp");
//!     let cancel = CancellationToken::new();
//!
//!     let (store, queue_rx) = IndexStore::new(WINDOW_LIMIT);
//!     let store = Arc::new(store);
//!     let _pool = WorkerPool::spawn(Arc::clone(&store), dir.clone(), queue_rx, 4, cancel.clone());
//!
//!     let reader = Arc::new(TailReader::new(dir));
//!     let config = ApiConfig::default();
//!     let state = AppState::new(store, reader, config.clone());
//!     serve(state, &config, cancel).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/logs", get(routes::logs::list_logs))
        .route("/logs/tail", get(routes::logs::tail_log));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server; runs until the cancellation token fires.
pub async fn serve(
    state: AppState,
    config: &ApiConfig,
    cancel: CancellationToken,
) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("logtail API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("logtail API shut down gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexStore, Status, WorkerPool};
    use crate::reader::TailReader;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};
    use tower::util::ServiceExt;

    /// Full stack against a scratch directory: store, worker pool, reader,
    /// router. Workers die with the test runtime.
    async fn create_test_app(window_limit: usize) -> (Router, Arc<IndexStore>, TempDir) {
        let dir = tempdir().unwrap();
        let (store, queue_rx) = IndexStore::new(window_limit);
        let store = Arc::new(store);
        WorkerPool::spawn(
            Arc::clone(&store),
            dir.path().to_path_buf(),
            queue_rx,
            2,
            CancellationToken::new(),
        );

        let reader = Arc::new(TailReader::new(dir.path()));
        let state = AppState::new(Arc::clone(&store), reader, ApiConfig::default());
        let router = build_router(state);

        (router, store, dir)
    }

    /// Same stack but with no workers, so entries stay in INIT.
    fn create_test_app_without_workers() -> (Router, Arc<IndexStore>, TempDir) {
        let dir = tempdir().unwrap();
        let (store, _queue_rx) = IndexStore::new(1024);
        let store = Arc::new(store);

        let reader = Arc::new(TailReader::new(dir.path()));
        let state = AppState::new(Arc::clone(&store), reader, ApiConfig::default());
        let router = build_router(state);

        (router, store, dir)
    }

    async fn wait_ready(store: &IndexStore, name: &str) {
        for _ in 0..200 {
            if store.get(name).await.map(|s| s.status) == Some(Status::Ready) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never became ready", name);
    }

    async fn get_response(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _store, _dir) = create_test_app(1024).await;

        let response = get_response(app, "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _store, _dir) = create_test_app(1024).await;

        let response = get_response(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_logs_empty() {
        let (app, _store, _dir) = create_test_app(1024).await;

        let response = get_response(app, "/api/v1/logs").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_list_logs_reports_status() {
        let (app, store, dir) = create_test_app(1024).await;
        std::fs::write(dir.path().join("a.log"), "one\n").unwrap();
        store.add("a.log").await;
        wait_ready(&store, "a.log").await;

        let response = get_response(app, "/api/v1/logs").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["total"], 1);
        assert_eq!(body["files"][0]["name"], "a.log");
        assert_eq!(body["files"][0]["status"], "READY");
    }

    #[tokio::test]
    async fn test_tail_missing_params() {
        let (app, _store, _dir) = create_test_app(1024).await;

        let response = get_response(app, "/api/v1/logs/tail").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tail_rejects_non_numeric_n() {
        let (app, store, dir) = create_test_app(1024).await;
        std::fs::write(dir.path().join("a.log"), "one\n").unwrap();
        store.add("a.log").await;
        wait_ready(&store, "a.log").await;

        let response = get_response(app, "/api/v1/logs/tail?log=a.log&n=abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tail_rejects_negative_n() {
        let (app, _store, _dir) = create_test_app(1024).await;

        // Validation runs before the index lookup, so even an untracked
        // file reports the parameter problem first.
        let response = get_response(app, "/api/v1/logs/tail?log=a.log&n=-1").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tail_unknown_log_is_not_found() {
        let (app, _store, _dir) = create_test_app(1024).await;

        let response = get_response(app, "/api/v1/logs/tail?log=missing.log&n=5").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tail_init_entry_is_not_ready() {
        let (app, store, dir) = create_test_app_without_workers();
        std::fs::write(dir.path().join("a.log"), "one\n").unwrap();
        store.add("a.log").await;

        let response = get_response(app, "/api/v1/logs/tail?log=a.log&n=1").await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = body_string(response).await;
        assert!(body.contains("indexing"));
    }

    #[tokio::test]
    async fn test_tail_fast_path() {
        let (app, store, dir) = create_test_app(1024).await;
        std::fs::write(dir.path().join("a.log"), "one\ntwo\nthree\n").unwrap();
        store.add("a.log").await;
        wait_ready(&store, "a.log").await;

        let response = get_response(app, "/api/v1/logs/tail?log=a.log&n=2").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "two\nthree\n");
    }

    #[tokio::test]
    async fn test_tail_whole_file_within_window() {
        let (app, store, dir) = create_test_app(1024).await;
        std::fs::write(dir.path().join("a.log"), "one\ntwo\nthree\n").unwrap();
        store.add("a.log").await;
        wait_ready(&store, "a.log").await;

        let response = get_response(app, "/api/v1/logs/tail?log=a.log&n=3").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn test_tail_beyond_window_uses_slow_path() {
        // Window keeps only the last 4 line starts; asking for 6 must fall
        // back to the full scan and still return the right lines.
        let (app, store, dir) = create_test_app(4).await;
        std::fs::write(
            dir.path().join("a.log"),
            "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\n",
        )
        .unwrap();
        store.add("a.log").await;
        wait_ready(&store, "a.log").await;

        let response = get_response(app, "/api/v1/logs/tail?log=a.log&n=6").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "l3\nl4\nl5\nl6\nl7\nl8\n");
    }

    #[tokio::test]
    async fn test_tail_deeper_than_default_window() {
        let (app, store, dir) = create_test_app(1024).await;
        let mut content = String::new();
        for i in 0..2000 {
            content.push_str(&format!("line-{:04}\n", i));
        }
        std::fs::write(dir.path().join("big.log"), &content).unwrap();
        store.add("big.log").await;
        wait_ready(&store, "big.log").await;

        let response = get_response(app, "/api/v1/logs/tail?log=big.log&n=1500").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 1500);
        assert_eq!(lines[0], "line-0500");
        assert_eq!(lines[1499], "line-1999");
    }

    #[tokio::test]
    async fn test_tail_zero_lines_is_empty() {
        let (app, store, dir) = create_test_app(1024).await;
        std::fs::write(dir.path().join("a.log"), "one\ntwo\n").unwrap();
        store.add("a.log").await;
        wait_ready(&store, "a.log").await;

        let response = get_response(app, "/api/v1/logs/tail?log=a.log&n=0").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "");
    }
}
