//! Error types for the result cache
//!
//! Provides unified error handling using thiserror.
//!
//! Producer failures are not represented here: `fetch_with_cache` hands the
//! producer's own error back to the caller untouched.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Configuration that cannot satisfy the cache invariants
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = CacheError::InvalidConfig("max_size must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: max_size must be at least 1"
        );
    }
}
