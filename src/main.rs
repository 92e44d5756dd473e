//! logtail server
//!
//! Run with: cargo run -- --logs-dir /var/log/myapp
//!
//! # Configuration
//!
//! CLI flags take precedence over environment variables, which take
//! precedence over the optional TOML config file:
//! - `--logs-dir` / `LOGTAIL_LOGS_DIR`: directory of log files (required)
//! - `--host` / `LOGTAIL_HOST`: host to bind to (default: 0.0.0.0)
//! - `--port` / `LOGTAIL_PORT`: port to listen on (default: 8000)
//! - `--workers` / `LOGTAIL_WORKERS`: indexing workers (default: available parallelism)
//! - `--config`: path to a TOML config file
//! - `RUST_LOG`: log level (default: info)

use clap::Parser;
use logtail::api::{serve, ApiConfig, AppState};
use logtail::config::{Config, ConfigError};
use logtail::index::{IndexStore, WorkerPool};
use logtail::reader::TailReader;
use logtail::watch::LogWatcher;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "logtail", version, about = "Fast tail reads over growing log files")]
struct Cli {
    /// Directory of log files to index and serve
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Number of indexing workers
    #[arg(long)]
    workers: Option<usize>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logtail=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting logtail server v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = resolve_config(cli)?;

    // Fatal before any component starts: the whole service is about this
    // one directory.
    let logs_dir = config.validated_logs_dir()?;
    tracing::info!("Logs directory: {:?}", logs_dir);

    let cancel = CancellationToken::new();

    let (store, queue_rx) = IndexStore::new(config.indexer.window_limit);
    let store = Arc::new(store);

    tracing::info!("Starting {} indexing workers", config.indexer.workers);
    let pool = WorkerPool::spawn(
        Arc::clone(&store),
        logs_dir.clone(),
        queue_rx,
        config.indexer.workers,
        cancel.clone(),
    );

    let watcher = LogWatcher::start(logs_dir.clone(), Arc::clone(&store), cancel.clone()).await?;

    let reader = Arc::new(TailReader::new(logs_dir));
    let api_config = ApiConfig::new(config.server.host.clone(), config.server.port);
    let state = AppState::new(Arc::clone(&store), reader, api_config.clone());

    // SIGINT/SIGTERM trip the token, winding down the server, the watcher,
    // and the worker pool together.
    tokio::spawn(shutdown_signal(cancel.clone()));

    serve(state, &api_config, cancel.clone()).await?;

    cancel.cancel();
    watcher.join().await;
    pool.join().await;

    tracing::info!("logtail shutdown complete");
    Ok(())
}

/// Merge CLI flags over `LOGTAIL_*` environment variables over the optional
/// config file.
fn resolve_config(cli: Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(dir) = cli
        .logs_dir
        .or_else(|| std::env::var("LOGTAIL_LOGS_DIR").ok().map(PathBuf::from))
    {
        config.logs_dir = Some(dir);
    }

    if let Some(host) = cli.host.or_else(|| std::env::var("LOGTAIL_HOST").ok()) {
        config.server.host = host;
    }

    if let Some(port) = cli
        .port
        .or_else(|| std::env::var("LOGTAIL_PORT").ok().and_then(|s| s.parse().ok()))
    {
        config.server.port = port;
    }

    if let Some(workers) = cli
        .workers
        .or_else(|| std::env::var("LOGTAIL_WORKERS").ok().and_then(|s| s.parse().ok()))
    {
        config.indexer.workers = workers.max(1);
    }

    Ok(config)
}

/// Wait for a shutdown signal, then cancel the shared token.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
    cancel.cancel();
}
