//! Liveness Task
//!
//! Background task that periodically pings the record store and the cache
//! and publishes the results through a shared `HealthStatus`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheLayer;
use crate::store::RecordStore;

// == Health Status ==
/// Last probe results, readable from any request without locking.
///
/// Both components start out as up so that requests arriving before the
/// first probe use the cache normally.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    store_up: Arc<AtomicBool>,
    cache_up: Arc<AtomicBool>,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            store_up: Arc::new(AtomicBool::new(true)),
            cache_up: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl HealthStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_up(&self) -> bool {
        self.store_up.load(Ordering::Relaxed)
    }

    pub fn cache_up(&self) -> bool {
        self.cache_up.load(Ordering::Relaxed)
    }

    /// Records a store probe result, returning the previous value.
    pub fn set_store_up(&self, up: bool) -> bool {
        self.store_up.swap(up, Ordering::Relaxed)
    }

    /// Records a cache probe result, returning the previous value.
    pub fn set_cache_up(&self, up: bool) -> bool {
        self.cache_up.swap(up, Ordering::Relaxed)
    }
}

/// Runs one round of probes, each bounded by `timeout`.
pub async fn probe_once(
    store: &dyn RecordStore,
    cache: &dyn CacheLayer,
    status: &HealthStatus,
    timeout: Duration,
) {
    let store_result = match tokio::time::timeout(timeout, store.ping()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!("ping timed out after {:?}", timeout)),
    };
    let was_up = status.set_store_up(store_result.is_ok());
    match (&store_result, was_up) {
        (Err(err), true) => warn!(error = %err, "record store ping failed"),
        (Ok(()), false) => info!("record store reachable again"),
        _ => debug!(up = store_result.is_ok(), "record store probed"),
    }

    let cache_result = match tokio::time::timeout(timeout, cache.ping()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!("ping timed out after {:?}", timeout)),
    };
    let was_up = status.set_cache_up(cache_result.is_ok());
    match (&cache_result, was_up) {
        (Err(err), true) => warn!(error = %err, "cache ping failed, bypassing cache"),
        (Ok(()), false) => info!("cache reachable again"),
        _ => debug!(up = cache_result.is_ok(), "cache probed"),
    }
}

/// Spawns a background task that probes both backends every `interval`.
///
/// The first round runs immediately. Failures are logged on the transition
/// from up to down and back; they never stop the task.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_health_task(
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn CacheLayer>,
    status: HealthStatus,
    interval: Duration,
    probe_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting liveness task with interval of {} seconds",
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            probe_once(store.as_ref(), cache.as_ref(), &status, probe_timeout).await;
        }
    })
}
