//! Cache trait definition

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Generic cache trait for key-value operations with TTL support
///
/// This trait uses JSON strings internally to be dyn-compatible.
/// Use the helper methods for typed get/set operations.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Short backend name used in stats and logs
    fn backend_name(&self) -> &'static str;

    /// Gets a raw JSON value from the cache
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw JSON value in the cache with a TTL
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Sets a value only if the key doesn't exist
    async fn set_nx_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, DomainError> {
        if self.exists(key).await? {
            Ok(false)
        } else {
            self.set_raw(key, value, ttl).await?;
            Ok(true)
        }
    }

    /// Deletes a value from the cache
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes a batch of keys, returning how many existed
    async fn delete_many(&self, keys: &[String]) -> Result<usize, DomainError> {
        let mut deleted = 0;

        for key in keys {
            if self.delete(key).await? {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    /// Deletes multiple keys matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError>;

    /// Lists keys matching a glob pattern
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError>;

    /// Checks if a key exists in the cache
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Updates the TTL for an existing key
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError>;

    /// Gets the remaining TTL for a key
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;

    /// Clears all entries from the cache
    async fn clear(&self) -> Result<(), DomainError>;

    /// Returns approximate number of entries in the cache
    async fn size(&self) -> Result<usize, DomainError>;

    /// Increments a numeric value, returning the new value
    ///
    /// An existing expiry is kept; a fresh counter has no meaningful TTL
    /// until `expire` is called.
    async fn increment(&self, key: &str, delta: i64) -> Result<i64, DomainError>;

    /// Adds members to the set stored at `key`
    ///
    /// The TTL of the set is only ever extended, never shortened.
    async fn add_to_set(
        &self,
        key: &str,
        members: &[String],
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let mut set: BTreeSet<String> = match self.get_raw(key).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            None => BTreeSet::new(),
        };
        set.extend(members.iter().cloned());

        let remaining = self.ttl(key).await?.unwrap_or_default();
        let data = serde_json::to_string(&set)
            .map_err(|e| DomainError::cache(format!("Failed to serialize set '{}': {}", key, e)))?;

        self.set_raw(key, &data, remaining.max(ttl)).await
    }

    /// Returns the members of the set stored at `key`
    async fn set_members(&self, key: &str) -> Result<Vec<String>, DomainError> {
        match self.get_raw(key).await? {
            Some(raw) => {
                let set: BTreeSet<String> = serde_json::from_str(&raw).map_err(|e| {
                    DomainError::cache(format!("Failed to decode set '{}': {}", key, e))
                })?;
                Ok(set.into_iter().collect())
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Extension trait providing typed get/set operations
pub trait CacheExt: Cache {
    /// Gets a typed value from the cache
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value in the cache with a TTL
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }

    /// Sets a value only if the key doesn't exist
    fn set_nx<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<bool, DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_nx_raw(key, &data, ttl).await
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}

/// Compiles a glob pattern (`*` and `?` wildcards) into an anchored regex
pub fn glob_to_regex(pattern: &str) -> Result<Regex, DomainError> {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");

    Regex::new(&format!("^{}$", escaped))
        .map_err(|e| DomainError::cache(format!("Invalid pattern '{}': {}", pattern, e)))
}
