//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default time-to-live for entries created without an override (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 300_000;

/// Default maximum number of resident entries
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Default interval between background sweeps (1 minute)
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Default TTL in milliseconds for entries without explicit TTL
    pub ttl_ms: u64,
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// Background sweep interval in milliseconds
    pub sweep_interval_ms: u64,
}

impl CacheConfig {
    /// Creates a config with the given TTL and bound, keeping the default sweep interval.
    pub fn new(ttl_ms: u64, max_size: usize) -> Self {
        Self {
            ttl_ms,
            max_size,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SMART_CACHE_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `SMART_CACHE_MAX_SIZE` - Maximum resident entries (default: 100)
    /// - `SMART_CACHE_SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 60000)
    ///
    /// Values that fail to parse fall back to their defaults. Call
    /// [`CacheConfig::validate`] before use; a parsed `0` is kept as-is.
    pub fn from_env() -> Self {
        Self {
            ttl_ms: parse_env("SMART_CACHE_TTL_MS").unwrap_or(DEFAULT_TTL_MS),
            max_size: parse_env("SMART_CACHE_MAX_SIZE").unwrap_or(DEFAULT_MAX_SIZE),
            sweep_interval_ms: parse_env("SMART_CACHE_SWEEP_INTERVAL_MS")
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_MS),
        }
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval_ms(mut self, sweep_interval_ms: u64) -> Self {
        self.sweep_interval_ms = sweep_interval_ms;
        self
    }

    // == Validate ==
    /// Rejects configurations that make the cache invariants unsatisfiable.
    pub fn validate(&self) -> Result<()> {
        if self.max_size < 1 {
            return Err(CacheError::InvalidConfig(format!(
                "max_size must be at least 1, got {}",
                self.max_size
            )));
        }
        if self.sweep_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "sweep_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Sweep interval as a Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            max_size: DEFAULT_MAX_SIZE,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
