//! In-memory cache implementation using moka

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::Expiry;

use crate::domain::cache::{glob_to_regex, Cache};
use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Lifetime given to counters created by `increment`
    pub default_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            default_ttl: Duration::from_secs(3600),
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: String, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Per-entry expiry policy driven by the entry's own deadline
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.remaining())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.remaining())
    }
}

/// Thread-safe in-memory cache implementation using moka
///
/// Every entry carries its own deadline. Counters and tag sets are updated
/// with atomic upserts so concurrent writers never lose an update.
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self { cache, config }
    }

    async fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_expired() => {
                self.cache.remove(key).await;
                None
            }
            other => other,
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.live_entry(key).await.map(|entry| entry.data))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.cache
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl))
            .await;
        Ok(())
    }

    async fn set_nx_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, DomainError> {
        let inserted = self
            .cache
            .entry(key.to_string())
            .or_insert_with_if(
                async { CacheEntry::new(value.to_string(), ttl) },
                |existing| existing.is_expired(),
            )
            .await;

        Ok(inserted.is_fresh())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self
            .cache
            .remove(key)
            .await
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let keys = self.scan_keys(pattern).await?;
        self.delete_many(&keys).await
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let regex = glob_to_regex(pattern)?;

        self.cache.run_pending_tasks().await;

        let cache_clone = self.cache.clone();
        let mut keys: Vec<String> = tokio::task::spawn_blocking(move || {
            cache_clone
                .iter()
                .filter(|(k, entry)| !entry.is_expired() && regex.is_match(k.as_str()))
                .map(|(k, _)| k.as_ref().clone())
                .collect()
        })
        .await
        .map_err(|e| DomainError::cache(format!("Failed to iterate cache: {}", e)))?;

        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.live_entry(key).await.is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        match self.live_entry(key).await {
            Some(entry) => {
                self.cache
                    .insert(key.to_string(), CacheEntry::new(entry.data, ttl))
                    .await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        Ok(self.live_entry(key).await.map(|entry| entry.remaining()))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64, DomainError> {
        let default_ttl = self.config.default_ttl;

        let entry = self
            .cache
            .entry(key.to_string())
            .and_upsert_with(|existing| {
                let updated = match existing.map(|e| e.into_value()) {
                    Some(current) if !current.is_expired() => match current.data.parse::<i64>() {
                        Ok(value) => CacheEntry {
                            data: (value + delta).to_string(),
                            expires_at: current.expires_at,
                        },
                        // left untouched so the caller sees the type error
                        Err(_) => current,
                    },
                    _ => CacheEntry::new(delta.to_string(), default_ttl),
                };
                std::future::ready(updated)
            })
            .await;

        entry
            .into_value()
            .data
            .parse::<i64>()
            .map_err(|_| DomainError::cache(format!("Value at '{}' is not an integer", key)))
    }

    async fn add_to_set(
        &self,
        key: &str,
        members: &[String],
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let deadline = Instant::now() + ttl;

        self.cache
            .entry(key.to_string())
            .and_upsert_with(|existing| {
                let (mut set, expires_at) = match existing.map(|e| e.into_value()) {
                    Some(current) if !current.is_expired() => (
                        serde_json::from_str::<BTreeSet<String>>(&current.data)
                            .unwrap_or_default(),
                        current.expires_at.max(deadline),
                    ),
                    _ => (BTreeSet::new(), deadline),
                };
                set.extend(members.iter().cloned());

                let data = serde_json::to_string(&set).unwrap_or_else(|_| "[]".to_string());
                std::future::ready(CacheEntry { data, expires_at })
            })
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(cache.exists("key1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(100)).await;

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_per_entry_ttl() {
        let cache = InMemoryCache::with_config(
            InMemoryCacheConfig::default().with_default_ttl(Duration::from_secs(1)),
        );

        // longer than the configured default
        cache
            .set("long", &"value", Duration::from_secs(7200))
            .await
            .unwrap();

        let remaining = cache.ttl("long").await.unwrap().unwrap();
        assert!(remaining > Duration::from_secs(7000));
    }

    #[tokio::test]
    async fn test_expire() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.expire("key1", Duration::from_secs(2)).await.unwrap());
        assert!(!cache.expire("missing", Duration::from_secs(2)).await.unwrap());

        let ttl = cache.ttl("key1").await.unwrap().unwrap();
        assert!(ttl <= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("key2", &"value2", Duration::from_secs(60))
            .await
            .unwrap();

        cache.clear().await.unwrap();

        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_keeps_expiry() {
        let cache = InMemoryCache::new();

        assert_eq!(cache.increment("counter", 1).await.unwrap(), 1);
        cache
            .expire("counter", Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(cache.increment("counter", 1).await.unwrap(), 2);
        assert_eq!(cache.increment("counter", -3).await.unwrap(), -1);

        let ttl = cache.ttl("counter").await.unwrap().unwrap();
        assert!(ttl <= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_increment_concurrent() {
        let cache = std::sync::Arc::new(InMemoryCache::new());

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.increment("hits", 1).await.unwrap() })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let total: Option<i64> = cache.get("hits").await.unwrap();
        assert_eq!(total, Some(20));
    }

    #[tokio::test]
    async fn test_increment_non_integer() {
        let cache = InMemoryCache::new();
        cache
            .set("word", &"hello", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.increment("word", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_set_nx() {
        let cache = InMemoryCache::new();

        assert!(cache
            .set_nx("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap());
        assert!(!cache
            .set_nx("key1", &"value2", Duration::from_secs(60))
            .await
            .unwrap());

        let value: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(value, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_set_operations() {
        let cache = InMemoryCache::new();

        cache
            .add_to_set(
                "tag:api",
                &["api:a".to_string(), "api:b".to_string()],
                Duration::from_secs(3600),
            )
            .await
            .unwrap();
        cache
            .add_to_set("tag:api", &["api:a".to_string()], Duration::from_secs(5))
            .await
            .unwrap();

        let members = cache.set_members("tag:api").await.unwrap();
        assert_eq!(members, vec!["api:a".to_string(), "api:b".to_string()]);

        let ttl = cache.ttl("tag:api").await.unwrap().unwrap();
        assert!(ttl > Duration::from_secs(3000));
    }

    #[tokio::test]
    async fn test_scan_and_delete_pattern() {
        let cache = InMemoryCache::new();

        cache
            .set("user:1:profile", &"data1", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("user:2:profile", &"data2", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("other:key", &"data3", Duration::from_secs(60))
            .await
            .unwrap();

        let keys = cache.scan_keys("user:*").await.unwrap();
        assert_eq!(keys, vec!["user:1:profile", "user:2:profile"]);

        let deleted = cache.delete_pattern("user:*:profile").await.unwrap();
        assert_eq!(deleted, 2);

        assert_eq!(cache.size().await.unwrap(), 1);
    }
}
