//! Cache-Aside Coordinator
//!
//! Every task access goes through here. Reads consult the cache first and
//! fill it from the record store on a miss; writes go to the store first and
//! then drop the cache entry. The cache is advisory: its failures are logged
//! and counted in one place and never reach the caller,
//! with one exception: a cached payload that does not decode is reported as
//! an error rather than silently refetched.

mod stats;


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::{CacheError, CacheLayer, CacheResult};
use crate::error::{Result, ServiceError};
use crate::models::{NewTask, Task, TaskId, TaskPatch};
use crate::store::{RecordStore, StoreError, StoreResult};
use crate::tasks::HealthStatus;

pub use stats::{CoordinatorStats, StatsSnapshot};

// == Public Constants ==
/// Prefix of every cache key
pub const CACHE_KEY_PREFIX: &str = "entity";

/// TTL applied to every cache entry unless configured otherwise
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Deadline for a single cache or store call
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Builds the cache key for a task id.
pub fn cache_key(id: TaskId) -> String {
    format!("{}:{}", CACHE_KEY_PREFIX, id)
}

/// Parses an id received from the transport. Only positive integers are ids.
pub fn parse_id(raw: &str) -> Result<TaskId> {
    match raw.parse::<TaskId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServiceError::InvalidInput(format!(
            "Invalid task id: {:?}",
            raw
        ))),
    }
}

/// Which cache call an advisory failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Lookup,
    Populate,
    Invalidate,
}

impl CacheOp {
    fn as_str(self) -> &'static str {
        match self {
            CacheOp::Lookup => "lookup",
            CacheOp::Populate => "populate",
            CacheOp::Invalidate => "invalidate",
        }
    }
}

/// Outcome of a cache lookup, keeping a miss apart from a failure.
enum Lookup {
    Hit(Vec<u8>),
    Miss,
    Unavailable,
    Bypassed,
}

// == Coordinator ==
/// Mediates task access between the record store and the cache.
///
/// Holds no per-request state and no locks; clone the surrounding `Arc` to
/// share it between handlers.
pub struct Coordinator {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn CacheLayer>,
    ttl: Duration,
    op_timeout: Duration,
    health: HealthStatus,
    stats: CoordinatorStats,
}

impl Coordinator {
    // == Constructor ==
    /// Creates a coordinator with the default TTL and call deadline.
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<dyn CacheLayer>) -> Self {
        Self {
            store,
            cache,
            ttl: DEFAULT_CACHE_TTL,
            op_timeout: DEFAULT_OPERATION_TIMEOUT,
            health: HealthStatus::new(),
            stats: CoordinatorStats::new(),
        }
    }

    /// Sets the TTL for cache entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the deadline applied to each individual store and cache call.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Shares the health status maintained by the liveness task. While it
    /// reports the cache down, lookups and populations skip the cache.
    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = health;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // == List ==
    /// Returns all live tasks straight from the store. Collections are not
    /// cached.
    pub async fn list(&self) -> Result<Vec<Task>> {
        self.store_call(self.store.find_all()).await
    }

    // == Read ==
    /// Reads a task through the cache.
    ///
    /// - hit: the cached payload is decoded and returned; a payload that does
    ///   not decode is a `Serialization` error
    /// - miss: loaded from the store, then written to the cache
    /// - cache unavailable: loaded from the store, cache left alone
    ///
    /// Absence in the store is `NotFound` and is never cached.
    pub async fn read(&self, raw_id: &str) -> Result<Task> {
        let id = parse_id(raw_id)?;
        let key = cache_key(id);

        let populate = match self.lookup(&key).await {
            Lookup::Hit(bytes) => {
                debug!(id, "task served from cache");
                return self.decode(&key, &bytes);
            }
            Lookup::Miss => true,
            Lookup::Unavailable | Lookup::Bypassed => false,
        };

        let task = self
            .store_call(self.store.find(id))
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        debug!(id, "task loaded from record store");

        if populate {
            self.populate(&task).await;
        }
        Ok(task)
    }

    // == Create ==
    /// Persists a new task and caches it under its assigned id.
    pub async fn create(&self, new_task: NewTask) -> Result<Task> {
        if let Some(msg) = new_task.validate() {
            return Err(ServiceError::InvalidInput(msg));
        }

        let task = self.store_call(self.store.create(new_task)).await?;
        info!(id = task.id, "task created");

        self.populate(&task).await;
        Ok(task)
    }

    // == Update ==
    /// Applies `patch` to a live task, persists it, then invalidates the
    /// cache entry. The entry is not refreshed; the next read repopulates it.
    pub async fn update(&self, raw_id: &str, patch: TaskPatch) -> Result<Task> {
        let id = parse_id(raw_id)?;
        if let Some(msg) = patch.validate() {
            return Err(ServiceError::InvalidInput(msg));
        }

        let mut task = self
            .store_call(self.store.find(id))
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        patch.apply(&mut task);

        // A concurrent delete between find and save leaves no live row
        let saved = self
            .store_call(self.store.save(&task))
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        info!(id, "task updated");

        self.invalidate(id).await;
        Ok(saved)
    }

    // == Delete ==
    /// Soft-deletes a task and invalidates its cache entry. Returns the task
    /// as it was marked deleted.
    pub async fn delete(&self, raw_id: &str) -> Result<Task> {
        let id = parse_id(raw_id)?;

        let deleted = self
            .store_call(self.store.delete(id))
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        info!(id, "task deleted");

        self.invalidate(id).await;
        Ok(deleted)
    }

    // == Cache Helpers ==
    async fn lookup(&self, key: &str) -> Lookup {
        if !self.health.cache_up() {
            self.stats.record_bypass();
            debug!(key, "cache marked down, reading from record store");
            return Lookup::Bypassed;
        }

        match self.cache_call(self.cache.get(key)).await {
            Ok(Some(bytes)) => {
                self.stats.record_hit();
                Lookup::Hit(bytes)
            }
            Ok(None) => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                Lookup::Miss
            }
            Err(err) => {
                self.advisory(CacheOp::Lookup, key, &err);
                Lookup::Unavailable
            }
        }
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> Result<Task> {
        serde_json::from_slice(bytes).map_err(|source| {
            self.stats.record_decode_failure();
            error!(key, error = %source, "cached task payload does not decode");
            ServiceError::Serialization {
                key: key.to_string(),
                source,
            }
        })
    }

    /// Best-effort write of `task` under its key.
    async fn populate(&self, task: &Task) {
        let key = cache_key(task.id);
        if !self.health.cache_up() {
            self.stats.record_bypass();
            return;
        }

        let payload = match serde_json::to_vec(task) {
            Ok(payload) => payload,
            Err(err) => {
                self.stats.record_populate_failure();
                warn!(key = %key, error = %err, "could not serialize task for caching");
                return;
            }
        };

        if let Err(err) = self.cache_call(self.cache.set(&key, &payload, self.ttl)).await {
            self.advisory(CacheOp::Populate, &key, &err);
        }
    }

    /// Best-effort removal of the entry for `id`. Attempted even while the
    /// cache is marked down.
    async fn invalidate(&self, id: TaskId) {
        let key = cache_key(id);
        if let Err(err) = self.cache_call(self.cache.delete(&key)).await {
            self.advisory(CacheOp::Invalidate, &key, &err);
        }
    }

    // == Advisory ==
    /// The single sink for absorbed cache failures: one structured log line
    /// and one counter per failure.
    fn advisory(&self, op: CacheOp, key: &str, err: &CacheError) {
        match op {
            CacheOp::Lookup => self.stats.record_cache_error(),
            CacheOp::Populate => self.stats.record_populate_failure(),
            CacheOp::Invalidate => self.stats.record_invalidate_failure(),
        }
        warn!(
            op = op.as_str(),
            key,
            error = %err,
            "cache call failed, continuing with record store"
        );
    }

    // == Deadlines ==
    async fn cache_call<T>(&self, call: impl Future<Output = CacheResult<T>>) -> CacheResult<T> {
        match tokio::time::timeout(self.op_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }

    async fn store_call<T>(&self, call: impl Future<Output = StoreResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => Err(StoreError::Unavailable(format!(
                "record store call timed out after {:?}",
                self.op_timeout
            ))
            .into()),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Wraps a `MemoryCache` and fails selected calls on demand.
    #[derive(Default)]
    struct FaultyCache {
        inner: MemoryCache,
        fail_get: AtomicBool,
        fail_set: AtomicBool,
        fail_delete: AtomicBool,
        stall: AtomicBool,
    }

    impl FaultyCache {
        fn down() -> Self {
            let cache = Self::default();
            cache.fail_get.store(true, Ordering::SeqCst);
            cache.fail_set.store(true, Ordering::SeqCst);
            cache.fail_delete.store(true, Ordering::SeqCst);
            cache
        }

        async fn check(&self, flag: &AtomicBool) -> CacheResult<()> {
            if self.stall.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            if flag.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheLayer for FaultyCache {
        async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
            self.check(&self.fail_get).await?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
            self.check(&self.fail_set).await?;
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            self.check(&self.fail_delete).await?;
            self.inner.delete(key).await
        }

        async fn ping(&self) -> CacheResult<()> {
            self.check(&self.fail_get).await
        }
    }

    /// Store whose every call fails as unreachable.
    struct DownStore;

    #[async_trait]
    impl RecordStore for DownStore {
        async fn find(&self, _id: TaskId) -> StoreResult<Option<Task>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn find_all(&self) -> StoreResult<Vec<Task>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn create(&self, _task: NewTask) -> StoreResult<Task> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn save(&self, _task: &Task) -> StoreResult<Option<Task>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _id: TaskId) -> StoreResult<Option<Task>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn setup() -> (Coordinator, MemoryStore, MemoryCache) {
        let store = MemoryStore::new();
        let cache = MemoryCache::new();
        let coordinator = Coordinator::new(Arc::new(store.clone()), Arc::new(cache.clone()));
        (coordinator, store, cache)
    }

    fn with_faulty_cache(cache: Arc<FaultyCache>) -> (Coordinator, MemoryStore) {
        let store = MemoryStore::new();
        let coordinator = Coordinator::new(Arc::new(store.clone()), cache)
            .with_operation_timeout(Duration::from_millis(100));
        (coordinator, store)
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        for raw in ["", "abc", "0", "-3", "1.5", " 7", "99999999999999999999"] {
            assert!(
                matches!(parse_id(raw), Err(ServiceError::InvalidInput(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_cache_key_is_canonical() {
        assert_eq!(cache_key(7), "entity:7");
        assert_eq!(cache_key(parse_id("007").unwrap()), "entity:7");
    }

    #[tokio::test]
    async fn test_create_then_read_returns_task() {
        let (coordinator, _, cache) = setup();

        let created = coordinator.create(NewTask::titled("A")).await.unwrap();
        assert_eq!(created.id, 1);
        assert!(cache.contains("entity:1").await, "create populates the cache");

        let read = coordinator.read("1").await.unwrap();
        assert_eq!(read, created);
        assert_eq!(coordinator.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_without_touching_store() {
        let (coordinator, store, cache) = setup();

        let result = coordinator.create(NewTask::titled("  ")).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        assert_eq!(store.row_count().await, 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_read_miss_populates_cache() {
        let (coordinator, store, cache) = setup();
        let task = store.create(NewTask::titled("stored only")).await.unwrap();

        let read = coordinator.read(&task.id.to_string()).await.unwrap();
        assert_eq!(read, task);
        assert!(cache.contains(&cache_key(task.id)).await);

        let stats = coordinator.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_read_unknown_id_is_not_found_and_not_cached() {
        let (coordinator, _, cache) = setup();

        let result = coordinator.read("404").await;
        assert!(matches!(result, Err(ServiceError::NotFound(404))));
        assert!(cache.is_empty().await, "absence is never cached");
    }

    #[tokio::test]
    async fn test_read_invalid_id_touches_nothing() {
        let (coordinator, _, _) = setup();

        let result = coordinator.read("abc").await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        assert_eq!(coordinator.stats(), StatsSnapshot::default());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_an_error_not_a_miss() {
        let (coordinator, store, cache) = setup();
        let task = store.create(NewTask::titled("A")).await.unwrap();
        cache
            .set(&cache_key(task.id), b"{not json", DEFAULT_CACHE_TTL)
            .await
            .unwrap();

        let result = coordinator.read("1").await;
        assert!(matches!(result, Err(ServiceError::Serialization { .. })));
        assert_eq!(coordinator.stats().decode_failures, 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_instead_of_refreshing() {
        let (coordinator, _, cache) = setup();
        coordinator.create(NewTask::titled("A")).await.unwrap();
        assert!(cache.contains("entity:1").await);

        let patch = TaskPatch {
            finished: Some(true),
            ..TaskPatch::default()
        };
        let updated = coordinator.update("1", patch).await.unwrap();
        assert!(updated.finished);
        assert!(!cache.contains("entity:1").await, "entry dropped, not rewritten");

        let read = coordinator.read("1").await.unwrap();
        assert!(read.finished);
        assert_eq!(read.title, "A");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let (coordinator, _, _) = setup();
        let result = coordinator.update("9", TaskPatch::default()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(9))));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title() {
        let (coordinator, _, _) = setup();
        coordinator.create(NewTask::titled("A")).await.unwrap();

        let patch = TaskPatch {
            title: Some(String::new()),
            ..TaskPatch::default()
        };
        let result = coordinator.update("1", patch).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        assert_eq!(coordinator.read("1").await.unwrap().title, "A");
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let (coordinator, _, cache) = setup();
        coordinator.create(NewTask::titled("A")).await.unwrap();

        let deleted = coordinator.delete("1").await.unwrap();
        assert!(deleted.deleted_at.is_some());
        assert!(!cache.contains("entity:1").await);

        assert!(matches!(
            coordinator.delete("1").await,
            Err(ServiceError::NotFound(1))
        ));
        assert!(matches!(
            coordinator.read("1").await,
            Err(ServiceError::NotFound(1))
        ));
    }

    #[tokio::test]
    async fn test_list_returns_live_tasks() {
        let (coordinator, _, _) = setup();
        for title in ["a", "b", "c"] {
            coordinator.create(NewTask::titled(title)).await.unwrap();
        }
        coordinator.delete("2").await.unwrap();

        let titles: Vec<String> = coordinator
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_everything_works_with_cache_down() {
        let cache = Arc::new(FaultyCache::down());
        let (coordinator, _) = with_faulty_cache(cache);

        let created = coordinator.create(NewTask::titled("A")).await.unwrap();
        assert_eq!(coordinator.read("1").await.unwrap(), created);

        let patch = TaskPatch {
            comment: Some("degraded".into()),
            ..TaskPatch::default()
        };
        assert_eq!(coordinator.update("1", patch).await.unwrap().comment, "degraded");
        coordinator.delete("1").await.unwrap();
        assert!(matches!(
            coordinator.read("1").await,
            Err(ServiceError::NotFound(1))
        ));

        let stats = coordinator.stats();
        assert_eq!(stats.cache_errors, 2);
        assert_eq!(stats.populate_failures, 1);
        assert_eq!(stats.invalidate_failures, 2);
        assert_eq!(stats.misses, 0, "an unreachable cache is not a miss");
    }

    #[tokio::test]
    async fn test_unavailable_lookup_skips_population() {
        let cache = Arc::new(FaultyCache::default());
        cache.fail_get.store(true, Ordering::SeqCst);
        let (coordinator, store) = with_faulty_cache(cache.clone());
        let task = store.create(NewTask::titled("A")).await.unwrap();

        assert_eq!(coordinator.read("1").await.unwrap(), task);
        assert!(
            !cache.inner.contains("entity:1").await,
            "no population after a failed lookup"
        );
    }

    #[tokio::test]
    async fn test_create_survives_cache_set_failure() {
        let cache = Arc::new(FaultyCache::default());
        cache.fail_set.store(true, Ordering::SeqCst);
        let (coordinator, store) = with_faulty_cache(cache);

        let created = coordinator.create(NewTask::titled("A")).await.unwrap();
        assert_eq!(store.find(created.id).await.unwrap(), Some(created));
        assert_eq!(coordinator.stats().populate_failures, 1);
    }

    #[tokio::test]
    async fn test_stalled_cache_is_bounded_by_deadline() {
        let cache = Arc::new(FaultyCache::default());
        cache.stall.store(true, Ordering::SeqCst);
        let (coordinator, _) = with_faulty_cache(cache);

        let started = std::time::Instant::now();
        coordinator.create(NewTask::titled("A")).await.unwrap();
        coordinator.read("1").await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));

        let stats = coordinator.stats();
        assert_eq!(stats.cache_errors, 1);
        assert_eq!(stats.populate_failures, 1);
    }

    #[tokio::test]
    async fn test_failed_invalidation_does_not_fail_update() {
        let cache = Arc::new(FaultyCache::default());
        let (coordinator, _) = with_faulty_cache(cache.clone());
        coordinator.create(NewTask::titled("A")).await.unwrap();
        cache.fail_delete.store(true, Ordering::SeqCst);

        let patch = TaskPatch {
            finished: Some(true),
            ..TaskPatch::default()
        };
        assert!(coordinator.update("1", patch).await.unwrap().finished);
        assert_eq!(coordinator.stats().invalidate_failures, 1);
    }

    #[tokio::test]
    async fn test_store_outage_aborts_writes_without_cache_mutation() {
        let cache = MemoryCache::new();
        let coordinator = Coordinator::new(Arc::new(DownStore), Arc::new(cache.clone()));

        assert!(matches!(
            coordinator.create(NewTask::titled("A")).await,
            Err(ServiceError::StoreUnavailable(_))
        ));
        assert!(matches!(
            coordinator.delete("1").await,
            Err(ServiceError::StoreUnavailable(_))
        ));
        assert!(matches!(
            coordinator.read("1").await,
            Err(ServiceError::StoreUnavailable(_))
        ));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_marked_down_is_bypassed_but_still_invalidated() {
        let (coordinator, _, cache) = setup();
        let health = HealthStatus::new();
        let coordinator = coordinator.with_health(health.clone());

        coordinator.create(NewTask::titled("A")).await.unwrap();
        health.set_cache_up(false);

        coordinator.read("1").await.unwrap();
        assert_eq!(coordinator.stats().hits, 0);
        assert_eq!(coordinator.stats().bypassed, 1);

        coordinator.delete("1").await.unwrap();
        assert!(!cache.contains("entity:1").await);
    }
}
