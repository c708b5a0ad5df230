//! Cache Module
//!
//! The advisory key-value layer in front of the record store. Values are
//! opaque bytes with a fixed time-to-live; the coordinator decides what goes
//! in and when it is removed.

mod entry;
mod memory;
mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

// == Cache Error Enum ==
/// Failure of a cache call. A missing key is not an error: `get` returns
/// `Ok(None)` for that.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Connection refused, reset, or any backend-side failure
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within its deadline
    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),
}

/// Convenience Result type for cache calls.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// == Cache Layer Trait ==
/// Key-value cache with per-entry TTL.
///
/// Implementations provide their own per-key atomicity; callers never lock
/// around these calls.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Returns the stored bytes, `Ok(None)` on a miss.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Liveness probe used by the health task.
    async fn ping(&self) -> CacheResult<()>;
}
