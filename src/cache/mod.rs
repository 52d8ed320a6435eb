//! Cache Module
//!
//! Provides in-memory result caching with TTL expiration and FIFO eviction.

mod entry;
mod key;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{build_key, to_params, HashedKeyBuilder, JsonKeyBuilder, KeyBuilder};
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::CacheStore;
