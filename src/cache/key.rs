//! Key Builder Module
//!
//! Derives deterministic cache keys from an operation name and its parameters.
//!
//! Parameters are canonicalized to JSON with object keys sorted at every
//! level, so two structurally equal parameter maps always produce the same key.

use std::fmt::Debug;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

// == Key Builder Trait ==
/// Turns an operation name and parameters into a cache key.
pub trait KeyBuilder: Send + Sync {
    /// Builds the key. Must be pure and deterministic.
    fn build_key(&self, operation: &str, params: &Value) -> String;
}

// == JSON Key Builder ==
/// Keys of the form `operation:{canonical json}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonKeyBuilder;

impl KeyBuilder for JsonKeyBuilder {
    fn build_key(&self, operation: &str, params: &Value) -> String {
        format!("{}:{}", operation, canonical_json(params))
    }
}

// == Hashed Key Builder ==
/// Keys of the form `operation:{sha256 of canonical json}`.
///
/// Keeps keys a fixed length regardless of how large the parameters are.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedKeyBuilder;

impl KeyBuilder for HashedKeyBuilder {
    fn build_key(&self, operation: &str, params: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(canonical_json(params).as_bytes());
        format!("{}:{}", operation, hex::encode(hasher.finalize()))
    }
}

/// Builds a key with the default [`JsonKeyBuilder`].
pub fn build_key(operation: &str, params: &Value) -> String {
    JsonKeyBuilder.build_key(operation, params)
}

// == Params Conversion ==
/// Converts any serializable parameters into a JSON value.
///
/// Values serde cannot represent as JSON (maps with non-string keys, for
/// instance) fall back to their `Debug` rendering as a JSON string. Distinct
/// values with the same rendering will share a key.
pub fn to_params<P: Serialize + Debug + ?Sized>(params: &P) -> Value {
    match serde_json::to_value(params) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "cache key params not serializable, using debug rendering");
            Value::String(format!("{:?}", params))
        }
    }
}

fn canonical_json(params: &Value) -> String {
    canonicalize(params).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
