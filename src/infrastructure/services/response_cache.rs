//! Response caching service
//!
//! Compute-once-serve-many entry point for read endpoints: looks the value up
//! through the safe gateway, computes on a miss and records the entry under
//! its tags so it can be invalidated as a group.

use std::future::Future;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::domain::cache::{lock_key, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
use crate::infrastructure::cache::{SafeCache, TagIndex};

/// Configuration for response caching
#[derive(Debug, Clone)]
pub struct ResponseCacheConfig {
    /// TTL used by callers that do not pick one
    pub default_ttl: Duration,
    /// Let concurrent misses wait for the first computation
    pub single_flight: bool,
    /// How long a waiting caller polls before computing itself
    pub single_flight_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            single_flight: false,
            single_flight_wait: Duration::from_secs(2),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl ResponseCacheConfig {
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Enables single-flight computation with the given wait budget
    pub fn with_single_flight(mut self, wait: Duration) -> Self {
        self.single_flight = true;
        self.single_flight_wait = wait;
        self
    }
}

/// Service for caching computed responses under tags
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache: SafeCache,
    tags: TagIndex,
    config: ResponseCacheConfig,
    key_generator: DefaultKeyGenerator,
}

impl ResponseCache {
    pub fn new(cache: SafeCache, tags: TagIndex) -> Self {
        Self::with_config(cache, tags, ResponseCacheConfig::default())
    }

    pub fn with_config(cache: SafeCache, tags: TagIndex, config: ResponseCacheConfig) -> Self {
        Self {
            cache,
            tags,
            config,
            key_generator: DefaultKeyGenerator::new(),
        }
    }

    pub fn gateway(&self) -> &SafeCache {
        &self.cache
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tags
    }

    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    /// Builds the key for an operation and serves it through `get_or_compute`
    pub async fn cached<T, E, F, Fut>(
        &self,
        namespace: &str,
        operation: &str,
        params: &CacheKeyParams,
        tags: &[String],
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = self.key_generator.build_key(namespace, operation, params);
        self.get_or_compute(&key, tags, ttl, compute).await
    }

    /// Returns the cached value for `key` or computes, stores and tags it
    ///
    /// The store runs on a spawned task, so it completes even when the
    /// caller is dropped mid-request. Compute errors are returned as-is and
    /// nothing is stored.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        tags: &[String],
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.cache.get::<T>(key).await {
            return Ok(value);
        }

        let mut holds_lock = false;

        if self.config.single_flight {
            holds_lock = self.try_lock(key).await;

            if !holds_lock {
                if let Some(value) = self.wait_for::<T>(key).await {
                    return Ok(value);
                }
                debug!(key = %key, "Single-flight wait expired, computing");
            }
        }

        let value = match compute().await {
            Ok(value) => value,
            Err(e) => {
                if holds_lock {
                    self.cache.delete(&lock_key(key)).await;
                }
                return Err(e);
            }
        };

        match serde_json::to_string(&value) {
            Ok(data) => self.store(key, data, tags, ttl, holds_lock).await,
            Err(e) => warn!(key = %key, error = %e, "Failed to serialize response for cache"),
        }

        Ok(value)
    }

    /// Invalidates every entry recorded under the given tags
    pub async fn invalidate(&self, tags: &[String]) -> usize {
        self.tags.invalidate(tags).await
    }

    async fn store(&self, key: &str, data: String, tags: &[String], ttl: Duration, holds_lock: bool) {
        let cache = self.cache.clone();
        let index = self.tags.clone();
        let key = key.to_string();
        let tags = tags.to_vec();

        let handle = tokio::spawn(async move {
            if cache.set_raw(&key, &data, ttl).await && !tags.is_empty() {
                index.associate(&key, &tags, ttl).await;
            }

            if holds_lock {
                cache.delete(&lock_key(&key)).await;
            }
        });

        if let Err(e) = handle.await {
            warn!(error = %e, "Cache store task failed");
        }
    }

    async fn try_lock(&self, key: &str) -> bool {
        let lock_ttl = self.config.single_flight_wait.max(Duration::from_secs(1));
        let backend = self.cache.backend();

        match self
            .cache
            .bounded("set_nx", backend.set_nx_raw(&lock_key(key), "1", lock_ttl))
            .await
        {
            Ok(acquired) => acquired,
            // without a working backend nobody can wait on us
            Err(_) => true,
        }
    }

    async fn wait_for<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let deadline = tokio::time::Instant::now() + self.config.single_flight_wait;

        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(self.config.poll_interval).await;

            if let Some(value) = self.cache.get::<T>(key).await {
                return Some(value);
            }
        }

        None
    }
}
