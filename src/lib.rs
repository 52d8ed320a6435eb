//! Smart Cache - An in-process result cache
//!
//! Caches expensive derived values (match scores, dashboard aggregates) with
//! TTL expiration, FIFO eviction and fetch-through coalescing.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod tasks;

pub use cache::{build_key, to_params, CacheStats, CacheStore, KeyBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use fetch::SharedCache;
pub use tasks::spawn_sweep_task;
