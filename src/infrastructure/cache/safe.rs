//! Failure-tolerant cache gateway
//!
//! Wraps a backend so that decode failures, backend errors and timeouts
//! degrade to cache misses instead of reaching the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::domain::cache::Cache;
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_cache_corrupted, record_cache_error, record_cache_lookup,
};

/// Outcome of a corruption sweep
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub corrupted: usize,
    pub deleted: usize,
    /// Keys that could not be read at all
    pub errors: usize,
    pub corrupted_keys: Vec<String>,
}

impl SweepReport {
    /// Adds the counts of another sweep to this one
    pub fn absorb(&mut self, other: SweepReport) {
        self.scanned += other.scanned;
        self.corrupted += other.corrupted;
        self.deleted += other.deleted;
        self.errors += other.errors;
        self.corrupted_keys.extend(other.corrupted_keys);
    }
}

/// Cache gateway that never fails its caller
#[derive(Debug, Clone)]
pub struct SafeCache {
    cache: Arc<dyn Cache>,
    timeout: Duration,
}

impl SafeCache {
    pub fn new(cache: Arc<dyn Cache>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    /// The wrapped backend
    pub fn backend(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Runs a backend call under the operation timeout
    pub async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                record_cache_error(operation);
                Err(e)
            }
            Err(_) => {
                record_cache_error(operation);
                Err(DomainError::cache(format!(
                    "{} timed out after {}ms",
                    operation,
                    self.timeout.as_millis()
                )))
            }
        }
    }

    /// Reads and decodes a value, treating any failure as a miss
    ///
    /// A stored value that does not decode as `T` is deleted so the next
    /// read recomputes it.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.bounded("get", self.cache.get_raw(key)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                record_cache_lookup(false);
                return None;
            }
        };

        let Some(raw) = raw else {
            debug!(key = %key, "Cache miss");
            record_cache_lookup(false);
            return None;
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                record_cache_lookup(true);
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupted cache entry, purging");
                record_cache_corrupted();
                record_cache_lookup(false);
                self.purge_in_background(key);

                None
            }
        }
    }

    fn purge_in_background(&self, key: &str) {
        let gateway = self.clone();
        let key = key.to_string();

        tokio::spawn(async move {
            if let Err(e) = gateway.bounded("delete", gateway.cache.delete(&key)).await {
                warn!(key = %key, error = %e, "Failed to purge corrupted cache entry");
            }
        });
    }

    /// Stores a value, returning whether the write succeeded
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        match serde_json::to_string(value) {
            Ok(data) => self.set_raw(key, &data, ttl).await,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize value for cache");
                false
            }
        }
    }

    /// Stores an already serialized value
    pub async fn set_raw(&self, key: &str, data: &str, ttl: Duration) -> bool {
        match self.bounded("set", self.cache.set_raw(key, data, ttl)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache write failed");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        match self.bounded("delete", self.cache.delete(key)).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache delete failed");
                false
            }
        }
    }

    /// Deletes a batch of keys, falling back to one-by-one deletes
    ///
    /// Returns how many keys were actually removed, counting partial success.
    pub async fn delete_many(&self, keys: &[String]) -> usize {
        if keys.is_empty() {
            return 0;
        }

        match self.bounded("delete_many", self.cache.delete_many(keys)).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(count = keys.len(), error = %e, "Batch delete failed, deleting keys one by one");

                let mut deleted = 0;
                for key in keys {
                    if self.delete(key).await {
                        deleted += 1;
                    }
                }
                deleted
            }
        }
    }

    /// Cache-aside read: return the cached value or compute and store it
    ///
    /// Cache failures never change the returned value. Compute errors are
    /// propagated and nothing is stored.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.set(key, &value, ttl).await;

        Ok(value)
    }

    /// Scans keys matching `pattern` and deletes every entry that does not decode as `T`
    pub async fn sweep_corrupted<T: DeserializeOwned>(
        &self,
        pattern: &str,
    ) -> Result<SweepReport, DomainError> {
        let keys = self.bounded("scan", self.cache.scan_keys(pattern)).await?;
        let mut report = SweepReport {
            scanned: keys.len(),
            ..Default::default()
        };

        for key in keys {
            let raw = match self.bounded("get", self.cache.get_raw(&key)).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping unreadable key during sweep");
                    report.errors += 1;
                    continue;
                }
            };

            if serde_json::from_str::<T>(&raw).is_err() {
                record_cache_corrupted();
                report.corrupted += 1;

                if self.delete(&key).await {
                    report.deleted += 1;
                }
                report.corrupted_keys.push(key);
            }
        }

        Ok(report)
    }
}
