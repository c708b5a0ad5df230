//! Response DTOs for the tasks API
//!
//! Defines the structure of outgoing HTTP response bodies other than `Task`.

use serde::Serialize;

use crate::coordinator::StatsSnapshot;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Reads answered from the cache
    pub hits: u64,
    /// Reads where the cache reported the key absent
    pub misses: u64,
    /// Cache calls that failed with a connection error or timed out
    pub cache_errors: u64,
    /// Cached payloads that could not be decoded
    pub decode_failures: u64,
    /// Failed cache writes after a store read or create
    pub populate_failures: u64,
    /// Failed cache deletes after an update or delete
    pub invalidate_failures: u64,
    /// Lookups and populations skipped while the cache was marked down
    pub bypassed: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from coordinator counters
    pub fn new(stats: StatsSnapshot) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            cache_errors: stats.cache_errors,
            decode_failures: stats.decode_failures,
            populate_failures: stats.populate_failures,
            invalidate_failures: stats.invalidate_failures,
            bypassed: stats.bypassed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", "degraded" (cache down) or "unhealthy" (store down)
    pub status: String,
    /// Result of the last record store probe
    pub store: bool,
    /// Result of the last cache probe
    pub cache: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn new(store: bool, cache: bool) -> Self {
        let status = match (store, cache) {
            (true, true) => "healthy",
            (true, false) => "degraded",
            (false, _) => "unhealthy",
        };
        Self {
            status: status.to_string(),
            store,
            cache,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The service can answer requests as long as the store is reachable.
    pub fn is_serving(&self) -> bool {
        self.store
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
