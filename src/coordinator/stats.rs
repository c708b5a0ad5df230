//! Coordinator Statistics Module
//!
//! Counters for cache outcomes, including the advisory failures the
//! coordinator absorbs instead of returning.

use std::sync::atomic::{AtomicU64, Ordering};

// == Coordinator Stats ==
/// Lock-free counters shared by every request.
#[derive(Debug, Default)]
pub struct CoordinatorStats {
    hits: AtomicU64,
    misses: AtomicU64,
    cache_errors: AtomicU64,
    decode_failures: AtomicU64,
    populate_failures: AtomicU64,
    invalidate_failures: AtomicU64,
    bypassed: AtomicU64,
}

/// Point-in-time copy of `CoordinatorStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub cache_errors: u64,
    pub decode_failures: u64,
    pub populate_failures: u64,
    pub invalidate_failures: u64,
    pub bypassed: u64,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl CoordinatorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A lookup failed because the cache was unreachable or timed out.
    pub fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_populate_failure(&self) {
        self.populate_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidate_failure(&self) {
        self.invalidate_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            populate_failures: self.populate_failures.load(Ordering::Relaxed),
            invalidate_failures: self.invalidate_failures.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CoordinatorStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(StatsSnapshot::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = CoordinatorStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.snapshot().hit_rate(), 0.75);
    }

    #[test]
    fn test_cache_errors_do_not_count_as_misses() {
        let stats = CoordinatorStats::new();
        stats.record_cache_error();
        stats.record_bypass();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.misses, 0);
        assert_eq!(snapshot.cache_errors, 1);
        assert_eq!(snapshot.bypassed, 1);
        assert_eq!(snapshot.hit_rate(), 0.0);
    }

    #[test]
    fn test_advisory_counters() {
        let stats = CoordinatorStats::new();
        stats.record_populate_failure();
        stats.record_invalidate_failure();
        stats.record_invalidate_failure();
        stats.record_decode_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.populate_failures, 1);
        assert_eq!(snapshot.invalidate_failures, 2);
        assert_eq!(snapshot.decode_failures, 1);
    }
}
