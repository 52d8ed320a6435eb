//! Fetch-Through Cache Handle
//!
//! [`SharedCache`] wraps a [`CacheStore`] for use from async code and adds
//! fetch-through helpers around caller-supplied producers.
//!
//! Producer errors are returned unchanged and never cached. The store lock is
//! released while a producer runs, so other cache operations proceed during
//! the await.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::debug;

use crate::cache::{CacheStats, CacheStore};
use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::error::Result;

/// In-flight producers keyed by cache key.
type InFlight<V> = HashMap<String, Arc<OnceCell<V>>>;

/// Cloneable handle to a cache store.
///
/// Clones share the same store. Each consumer builds its own handle and passes
/// it to whatever needs it.
#[derive(Debug)]
pub struct SharedCache<V> {
    store: Arc<RwLock<CacheStore<V>>>,
    in_flight: Arc<Mutex<InFlight<V>>>,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<V: Clone + Send + Sync> SharedCache<V> {
    /// Wraps an existing store.
    pub fn new(store: CacheStore<V>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Builds a store from configuration on the system clock.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(CacheStore::new(config)?))
    }

    /// Builds a store from configuration reading time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self::new(CacheStore::with_clock(config, clock)?))
    }

    // == Fetch With Cache ==
    /// Returns the cached value for `key`, or runs `producer` and caches its result.
    ///
    /// On a hit the producer is never called. On a miss the producer's `Ok`
    /// value is stored with `ttl` (or the default TTL) and returned; an `Err`
    /// is returned as-is and leaves the cache untouched.
    ///
    /// Overlapping calls for the same key may each run their producer. Use
    /// [`SharedCache::fetch_single_flight`] to share one in-flight producer.
    pub async fn fetch_with_cache<F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key, "cache hit");
            return Ok(value);
        }

        debug!(key, "cache miss, running producer");
        let value = producer().await?;
        self.set(key, value.clone(), ttl).await;
        Ok(value)
    }

    // == Fetch Single Flight ==
    /// Like [`SharedCache::fetch_with_cache`], but callers arriving while a
    /// producer for `key` is already running wait for that producer instead of
    /// starting their own.
    ///
    /// If the running producer fails, its caller gets the error and the next
    /// waiter runs its own producer.
    pub async fn fetch_single_flight<F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key, "cache hit");
            return Ok(value);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(
                in_flight
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let result = cell
            .get_or_try_init(move || async move {
                debug!(key, "cache miss, running single-flight producer");
                let value = producer().await?;
                self.set(key, value.clone(), ttl).await;
                Ok::<V, E>(value)
            })
            .await
            .cloned();

        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
            && (cell.initialized() || Arc::strong_count(&cell) <= 2)
        {
            in_flight.remove(key);
        }

        result
    }

    // == Pass-through Operations ==
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.write().await.get(key)
    }

    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        self.store.write().await.set(key, value, ttl);
    }

    pub async fn remove(&self, key: &str) -> bool {
        self.store.write().await.remove(key)
    }

    /// Drops `key` so the next fetch runs its producer again.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.store.write().await.invalidate(key)
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.store.write().await.invalidate_prefix(prefix)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn sweep_expired(&self) -> usize {
        self.store.write().await.sweep_expired()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.store.read().await.contains_key(key)
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_cache() -> (SharedCache<u32>, ManualClock) {
        let clock = ManualClock::new(0);
        let cache =
            SharedCache::with_clock(&CacheConfig::new(1000, 10), Arc::new(clock.clone())).unwrap();
        (cache, clock)
    }

    #[tokio::test]
    async fn test_fetch_hit_skips_producer() {
        let (cache, _) = test_cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let value = cache
                .fetch_with_cache(
                    "match_score:job1",
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(87)
                    },
                    None,
                )
                .await
                .unwrap();
            assert_eq!(value, 87);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let (cache, _) = test_cache();

        let first = cache
            .fetch_with_cache("k", || async { Err::<u32, _>("backend down") }, None)
            .await;
        assert_eq!(first, Err("backend down"));
        assert!(cache.is_empty().await);

        let second = cache
            .fetch_with_cache("k", || async { Ok::<_, &str>(5) }, None)
            .await;
        assert_eq!(second, Ok(5));
    }

    #[tokio::test]
    async fn test_fetch_respects_ttl_override() {
        let (cache, clock) = test_cache();

        cache
            .fetch_with_cache("k", || async { Ok::<_, ()>(1) }, Some(Duration::from_millis(10)))
            .await
            .unwrap();
        clock.advance(Duration::from_millis(20));

        let value = cache
            .fetch_with_cache("k", || async { Ok::<_, ()>(2) }, None)
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (cache, _) = test_cache();

        cache
            .fetch_with_cache("job:1", || async { Ok::<_, ()>(1) }, None)
            .await
            .unwrap();
        assert!(cache.invalidate("job:1").await);

        let value = cache
            .fetch_with_cache("job:1", || async { Ok::<_, ()>(2) }, None)
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_single_flight_clears_in_flight_map() {
        let (cache, _) = test_cache();

        let value = cache
            .fetch_single_flight("k", || async { Ok::<_, ()>(3) }, None)
            .await
            .unwrap();
        assert_eq!(value, 3);
        assert!(cache.in_flight.lock().await.is_empty());

        let failed = cache
            .fetch_single_flight("other", || async { Err::<u32, _>("nope") }, None)
            .await;
        assert_eq!(failed, Err("nope"));
        assert!(cache.in_flight.lock().await.is_empty());
        assert!(!cache.contains_key("other").await);
    }
}
