//! Cache key generation strategies

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Prefix of the records holding a tag's key set
pub const TAG_NAMESPACE: &str = "tag";

/// Prefix of rate-limit window counters
pub const RATE_LIMIT_NAMESPACE: &str = "ratelimit";

/// Prefix of single-flight computation markers
pub const LOCK_NAMESPACE: &str = "lock";

/// Returns the storage key of a tag's key set
pub fn tag_key(tag: &str) -> String {
    format!("{}:{}", TAG_NAMESPACE, tag)
}

/// Returns the storage key of a rate-limit window
pub fn rate_limit_key(endpoint_class: &str, client_id: &str) -> String {
    format!("{}:{}:{}", RATE_LIMIT_NAMESPACE, endpoint_class, client_id)
}

/// Returns the storage key of the in-progress marker for a value key
pub fn lock_key(key: &str) -> String {
    format!("{}:{}", LOCK_NAMESPACE, key)
}

/// Trait for generating cache keys from request parameters
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Generates the parameter part of a key
    fn generate(&self, params: &CacheKeyParams) -> Option<String>;

    /// Builds the full key `namespace:operation[:params]`
    fn build_key(&self, namespace: &str, operation: &str, params: &CacheKeyParams) -> String {
        match self.generate(params) {
            Some(suffix) => format!("{}:{}:{}", namespace, operation, suffix),
            None => format!("{}:{}", namespace, operation),
        }
    }
}

/// Parameters for cache key generation
///
/// Components are kept in a sorted map and nested values are canonicalized
/// before hashing, so argument order never changes the resulting key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheKeyParams {
    components: BTreeMap<String, Value>,
}

impl CacheKeyParams {
    /// Creates empty key parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Creates parameters from a serializable value
    ///
    /// Objects contribute one component per field, anything else is stored
    /// under the `value` component.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let components = match serde_json::to_value(value)? {
            Value::Object(map) => map.into_iter().collect(),
            Value::Null => BTreeMap::new(),
            other => BTreeMap::from([("value".to_string(), other)]),
        };

        Ok(Self { components })
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Canonical JSON text of the parameters
    pub fn canonical_json(&self) -> String {
        let object: Map<String, Value> = self
            .components
            .iter()
            .map(|(k, v)| (k.clone(), canonicalize(v)))
            .collect();

        Value::Object(object).to_string()
    }
}

/// Recursively rebuilds objects with their keys in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            let mut out = Map::new();

            for (k, v) in sorted {
                out.insert(k.clone(), v);
            }

            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Default cache key generator using sha256 digests of the canonical parameters
#[derive(Debug, Clone)]
pub struct DefaultKeyGenerator {
    digest_len: usize,
}

impl Default for DefaultKeyGenerator {
    fn default() -> Self {
        Self { digest_len: 32 }
    }
}

impl DefaultKeyGenerator {
    /// Creates a new default key generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of hex characters kept from the digest (8..=64)
    pub fn with_digest_len(mut self, len: usize) -> Self {
        self.digest_len = len.clamp(8, 64);
        self
    }
}

impl CacheKeyGenerator for DefaultKeyGenerator {
    fn generate(&self, params: &CacheKeyParams) -> Option<String> {
        if params.is_empty() {
            return None;
        }

        let digest = Sha256::digest(params.canonical_json().as_bytes());
        let mut encoded = hex::encode(digest);
        encoded.truncate(self.digest_len);

        Some(encoded)
    }
}

/// Builds a key with the default generator
pub fn build_key(namespace: &str, operation: &str, params: &CacheKeyParams) -> String {
    DefaultKeyGenerator::new().build_key(namespace, operation, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_key_without_params() {
        let key = build_key("api", "services.list", &CacheKeyParams::new());
        assert_eq!(key, "api:services.list");
    }

    #[test]
    fn test_build_key_is_order_independent() {
        let first = CacheKeyParams::new()
            .with_component("page", 2)
            .with_component("locale", "uk")
            .with_component("filter", json!({"featured": true, "category": "design"}));

        let second = CacheKeyParams::new()
            .with_component("filter", json!({"category": "design", "featured": true}))
            .with_component("locale", "uk")
            .with_component("page", 2);

        assert_eq!(
            build_key("api", "services.list", &first),
            build_key("api", "services.list", &second)
        );
    }

    #[test]
    fn test_build_key_differs_by_value() {
        let a = CacheKeyParams::new().with_component("locale", "uk");
        let b = CacheKeyParams::new().with_component("locale", "en");

        assert_ne!(build_key("api", "list", &a), build_key("api", "list", &b));
    }

    #[test]
    fn test_build_key_differs_by_operation() {
        let params = CacheKeyParams::new().with_component("id", 1);

        assert_ne!(
            build_key("api", "services.get", &params),
            build_key("api", "projects.get", &params)
        );
    }

    #[test]
    fn test_key_shape() {
        let params = CacheKeyParams::new().with_component("id", 1);
        let key = build_key("api", "services.get", &params);

        let suffix = key.strip_prefix("api:services.get:").unwrap();
        assert_eq!(suffix.len(), 32);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_len() {
        let generator = DefaultKeyGenerator::new().with_digest_len(12);
        let params = CacheKeyParams::new().with_component("a", 1);

        assert_eq!(generator.generate(&params).unwrap().len(), 12);
    }

    #[test]
    fn test_nested_arrays_keep_order() {
        let a = CacheKeyParams::new().with_component("ids", json!([1, 2]));
        let b = CacheKeyParams::new().with_component("ids", json!([2, 1]));

        assert_ne!(build_key("api", "batch", &a), build_key("api", "batch", &b));
    }

    #[test]
    fn test_from_serializable() {
        #[derive(Serialize)]
        struct Query {
            locale: String,
            page: u32,
        }

        let params = CacheKeyParams::from_serializable(&Query {
            locale: "en".to_string(),
            page: 3,
        })
        .unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(
            params,
            CacheKeyParams::new()
                .with_component("page", 3)
                .with_component("locale", "en")
        );
    }

    #[test]
    fn test_namespace_helpers() {
        assert_eq!(tag_key("model:Service"), "tag:model:Service");
        assert_eq!(
            rate_limit_key("translations", "10.0.0.1"),
            "ratelimit:translations:10.0.0.1"
        );
        assert_eq!(lock_key("api:list"), "lock:api:list");
    }
}
