//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// PostgreSQL connection URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections
    pub db_pool_size: usize,
    /// Redis connection URL; the in-memory cache is used when unset
    pub redis_url: Option<String>,
    /// TTL in seconds for every cache entry
    pub cache_ttl: u64,
    /// Liveness probe interval in seconds
    pub health_interval: u64,
    /// In-memory cache cleanup interval in seconds
    pub cleanup_interval: u64,
    /// Deadline in milliseconds for each store or cache call
    pub operation_timeout_ms: u64,
    /// Deadline in seconds for a whole HTTP request
    pub request_timeout: u64,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `DATABASE_URL` - PostgreSQL URL (default: unset, in-memory store)
    /// - `DB_POOL_SIZE` - Connection pool size (default: 16)
    /// - `REDIS_URL` - Redis URL (default: unset, in-memory cache)
    /// - `CACHE_TTL` - Cache entry TTL in seconds (default: 300)
    /// - `HEALTH_INTERVAL` - Liveness probe interval in seconds (default: 15)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `OPERATION_TIMEOUT_MS` - Per-call deadline in milliseconds (default: 2000)
    /// - `REQUEST_TIMEOUT` - Per-request deadline in seconds (default: 10)
    /// - `LOG_FORMAT` - `json` or `pretty` (default: pretty)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            database_url: non_empty_var("DATABASE_URL"),
            db_pool_size: parse_var("DB_POOL_SIZE").unwrap_or(defaults.db_pool_size),
            redis_url: non_empty_var("REDIS_URL"),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            health_interval: parse_var("HEALTH_INTERVAL").unwrap_or(defaults.health_interval),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            operation_timeout_ms: parse_var("OPERATION_TIMEOUT_MS")
                .unwrap_or(defaults.operation_timeout_ms),
            request_timeout: parse_var("REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Never zero: the liveness ticker cannot run on a zero period.
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval.max(1))
    }

    /// Never zero: a zero period would sweep the cache on every tick.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            database_url: None,
            db_pool_size: 16,
            redis_url: None,
            cache_ttl: 300,
            health_interval: 15,
            cleanup_interval: 1,
            operation_timeout_ms: 2000,
            request_timeout: 10,
            log_json: false,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
