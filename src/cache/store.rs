//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with FIFO insertion tracking and
//! lazy TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, InsertionOrder};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Result cache with FIFO eviction and TTL support.
///
/// The store owns its entries exclusively; `get` hands out clones.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order, oldest first
    order: InsertionOrder,
    stats: CacheStats,
    /// Maximum number of resident entries
    max_size: usize,
    /// TTL for entries created without an explicit override
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore on the system clock.
    ///
    /// Fails with [`CacheError::InvalidConfig`] when `max_size` is zero.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a new CacheStore reading time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.max_size < 1 {
            return Err(CacheError::InvalidConfig(format!(
                "max_size must be at least 1, got {}",
                config.max_size
            )));
        }

        Ok(Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_size: config.max_size,
            default_ttl: config.default_ttl(),
            clock,
        })
    }

    // == Set ==
    /// Stores a value under `key`.
    ///
    /// Overwriting an existing key replaces its entry, resets its TTL and moves
    /// it to the newest insertion position without evicting anything. Inserting
    /// a new key into a full store first evicts the earliest inserted key.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(value, ttl, self.clock.now_ms());
        self.order.push_newest(&key);
        self.entries.insert(key, entry);

        self.stats.set_size(self.entries.len());
    }

    fn evict_oldest(&mut self) {
        // Skip order keys that no longer have an entry
        while let Some(oldest) = self.order.pop_oldest() {
            if self.entries.remove(&oldest).is_some() {
                debug!(key = %oldest, "evicted oldest cache entry");
                self.stats.record_eviction();
                return;
            }
        }
    }

    // == Remove ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.remove(key);
            self.stats.set_size(self.entries.len());
        }
        removed
    }

    /// Drops `key` so the next lookup goes back to the producer.
    ///
    /// Intended for push-style change notifications.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.remove(key)
    }

    // == Invalidate Prefix ==
    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        self.order.retain(|key| !key.starts_with(prefix));
        self.stats.set_size(self.entries.len());
        before - self.entries.len()
    }

    // == Clear ==
    /// Removes every entry and resets statistics to zero.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.reset();
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Hit and miss counters are untouched. Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired(now));
        let entries = &self.entries;
        self.order.retain(|key| entries.contains_key(key));

        self.stats.set_size(self.entries.len());
        before - self.entries.len()
    }

    /// Checks for a live entry without touching statistics.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_size(self.entries.len());
        stats
    }

    /// Returns the number of physically resident entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl<V: Clone> CacheStore<V> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns a clone of the value if found and not expired. Expired entries
    /// are removed on the spot and counted as misses. Lookups never change
    /// eviction order.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            debug!(key, "lazily expired cache entry");
            self.entries.remove(key);
            self.order.remove(key);
            self.stats.set_size(self.entries.len());
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }
}
