//! shellcache - Caching proxy that keeps a web app's shell and data available offline

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{
    Config, ConfigManager, LoggingConfig, MetricsConfig, StorageBackendKind, StorageConfig,
};
use shellcache_api::{AppState, create_router};
use shellcache_core::{Registration, SettingsProvider, spawn_update_task};
use shellcache_db::SqliteStorage;
use shellcache_fetch::{Fetcher, OriginClient, OriginClientConfig};
use shellcache_storage::{CacheStorage, MemoryStorage};

/// shellcache - Offline-first caching proxy for web applications
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "SHELLCACHE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "SHELLCACHE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting shellcache v{}", env!("CARGO_PKG_VERSION"));

    // Before anything emits counters
    let metrics_handle = install_metrics(&config.metrics)?;

    // Initialize storage backend
    let storage = open_storage(&config.storage).await?;

    // Initialize origin client
    let client = OriginClient::new(OriginClientConfig {
        url: config.origin.url.clone(),
        skip_tls_verify: config.origin.skip_tls_verify,
        timeout: config.fetch.timeout(),
    })?;
    let origin = client.base().clone();
    let fetcher: Arc<dyn Fetcher> = Arc::new(client);

    // Install and activate the configured version
    let registration = Arc::new(Registration::new(origin, storage, fetcher.clone()));
    match registration.register(&config.cache).await {
        Ok(outcome) => info!(
            "Cache version {} active ({} app shell assets)",
            outcome.version, outcome.installed_assets
        ),
        Err(e) => warn!(
            "Install failed, passing requests through until the next update: {}",
            e
        ),
    }

    let settings: Arc<dyn SettingsProvider> =
        Arc::new(ConfigManager::new(config.clone(), args.config.clone()));

    if let Some(interval_secs) = config.cache.update_interval_secs {
        spawn_update_task(registration.clone(), settings.clone(), interval_secs);
    }

    // Create application state
    let state = AppState::new(registration, fetcher, settings);

    // Create router
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);
    info!("Origin: {}", config.origin.url);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Open the configured storage backend
async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn CacheStorage>> {
    match config.backend {
        StorageBackendKind::Memory => {
            info!("Using in-memory cache storage");
            Ok(match config.quota_bytes {
                Some(quota) => Arc::new(MemoryStorage::with_quota(quota)),
                None => Arc::new(MemoryStorage::new()),
            })
        }
        StorageBackendKind::Sqlite => {
            if let Some(parent) = Path::new(&config.path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let url = format!("sqlite:{}?mode=rwc", config.path);
            let storage = SqliteStorage::connect(&url)
                .await
                .with_context(|| format!("Failed to open cache database {}", config.path))?;
            Ok(Arc::new(storage))
        }
    }
}

/// Install the global Prometheus recorder when metrics are enabled
fn install_metrics(config: &MetricsConfig) -> Result<Option<Arc<PrometheusHandle>>> {
    if !config.enabled {
        return Ok(None);
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    Ok(Some(Arc::new(handle)))
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
