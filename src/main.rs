//! Task Cache - task records API with a cache-aside layer
//!
//! Binary entry point: wires the configured backends into the coordinator
//! and serves the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_cache::api::{create_router, AppState};
use task_cache::cache::{CacheLayer, MemoryCache, RedisCache};
use task_cache::store::{MemoryStore, PgStore, PgStoreConfig, RecordStore};
use task_cache::{spawn_cleanup_task, spawn_health_task, Config, Coordinator, HealthStatus};

/// Main entry point for the tasks server.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Build the record store and the cache
/// 4. Start the liveness task (and the TTL cleanup task for the in-memory cache)
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_json);

    info!("Starting tasks server");
    info!(
        "Configuration loaded: port={}, cache_ttl={}s, health_interval={}s, operation_timeout={}ms",
        config.server_port, config.cache_ttl, config.health_interval, config.operation_timeout_ms
    );

    let store = build_store(&config).await?;
    let (cache, memory_cache) = build_cache(&config)?;

    let health = HealthStatus::new();
    let coordinator = Coordinator::new(store.clone(), cache.clone())
        .with_ttl(config.cache_ttl())
        .with_operation_timeout(config.operation_timeout());
    let state = AppState::new(coordinator, health.clone());

    let mut background = vec![spawn_health_task(
        store,
        cache,
        health,
        config.health_interval(),
        config.operation_timeout(),
    )];
    if let Some(memory_cache) = memory_cache {
        background.push(spawn_cleanup_task(memory_cache, config.cleanup_interval()));
    }
    info!("Background tasks started");

    let app = create_router(state, config.request_timeout());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(background))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Installs the global subscriber. Defaults to "info" level, can be
/// overridden with RUST_LOG.
fn init_tracing(json: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_cache=info,tower_http=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store.
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL not set, tasks are kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let store = PgStore::from_config(&PgStoreConfig::new(url.clone(), config.db_pool_size))
        .context("creating PostgreSQL pool")?;
    store
        .ensure_schema()
        .await
        .context("preparing tasks schema")?;
    info!("Record store: PostgreSQL (pool size {})", store.pool_size());
    Ok(Arc::new(store))
}

/// Redis when `REDIS_URL` is set, otherwise an in-memory cache. The
/// in-memory cache is also returned on its own so it can be swept.
fn build_cache(config: &Config) -> anyhow::Result<(Arc<dyn CacheLayer>, Option<MemoryCache>)> {
    let Some(url) = &config.redis_url else {
        warn!("REDIS_URL not set, using in-process cache");
        let cache = MemoryCache::new();
        return Ok((Arc::new(cache.clone()), Some(cache)));
    };

    let cache = RedisCache::new(url).context("parsing REDIS_URL")?;
    info!("Cache layer: Redis");
    Ok((Arc::new(cache), None))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the background tasks and allows graceful shutdown.
async fn shutdown_signal(background: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for handle in background {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
