//! Cache administration - statistics, clearing and corruption sweeps

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::domain::cache::{LOCK_NAMESPACE, RATE_LIMIT_NAMESPACE, TAG_NAMESPACE};
use crate::domain::DomainError;
use crate::infrastructure::cache::{SafeCache, SweepReport, TagIndex};

use super::content_service::API_NAMESPACE;

/// Namespaces holding cached values, swept by default
pub const VALUE_NAMESPACES: &[&str] = &["translations", API_NAMESPACE];

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub total_keys: usize,
    /// Key count per namespace
    pub namespaces: BTreeMap<String, usize>,
}

/// What a clear request removed
#[derive(Debug, Clone, Serialize)]
pub struct ClearOutcome {
    /// `all`, `pattern` or `tags`
    pub scope: &'static str,
    pub removed: usize,
}

/// Administrative operations over the shared cache
#[derive(Debug, Clone)]
pub struct CacheAdminService {
    cache: SafeCache,
    tags: TagIndex,
}

impl CacheAdminService {
    pub fn new(cache: SafeCache, tags: TagIndex) -> Self {
        Self { cache, tags }
    }

    fn namespaces() -> Vec<&'static str> {
        let mut namespaces = VALUE_NAMESPACES.to_vec();
        namespaces.extend([TAG_NAMESPACE, RATE_LIMIT_NAMESPACE, LOCK_NAMESPACE]);
        namespaces
    }

    pub async fn stats(&self) -> Result<CacheStats, DomainError> {
        let backend = self.cache.backend();
        let total_keys = self.cache.bounded("size", backend.size()).await?;

        let mut namespaces = BTreeMap::new();
        for namespace in Self::namespaces() {
            let pattern = format!("{}:*", namespace);
            let keys = self.cache.bounded("scan", backend.scan_keys(&pattern)).await?;
            namespaces.insert(namespace.to_string(), keys.len());
        }

        Ok(CacheStats {
            backend: backend.backend_name(),
            total_keys,
            namespaces,
        })
    }

    /// Removes every key
    pub async fn clear_all(&self) -> Result<ClearOutcome, DomainError> {
        let backend = self.cache.backend();
        let removed = self.cache.bounded("size", backend.size()).await?;
        self.cache.bounded("clear", backend.clear()).await?;

        info!(removed = removed, "Cleared cache");
        Ok(ClearOutcome {
            scope: "all",
            removed,
        })
    }

    /// Removes keys matching a glob pattern
    pub async fn clear_pattern(&self, pattern: &str) -> Result<ClearOutcome, DomainError> {
        let backend = self.cache.backend();
        let removed = self
            .cache
            .bounded("delete_pattern", backend.delete_pattern(pattern))
            .await?;

        info!(pattern = %pattern, removed = removed, "Cleared cache keys by pattern");
        Ok(ClearOutcome {
            scope: "pattern",
            removed,
        })
    }

    /// Invalidates every entry recorded under the given tags
    pub async fn clear_tags(&self, tags: &[String]) -> ClearOutcome {
        ClearOutcome {
            scope: "tags",
            removed: self.tags.invalidate(tags).await,
        }
    }

    /// Deletes entries that do not hold valid JSON
    ///
    /// Without a pattern every value namespace is swept.
    pub async fn sweep(&self, pattern: Option<&str>) -> Result<SweepReport, DomainError> {
        let patterns = match pattern {
            Some(pattern) => vec![pattern.to_string()],
            None => VALUE_NAMESPACES
                .iter()
                .map(|ns| format!("{}:*", ns))
                .collect(),
        };

        let mut report = SweepReport::default();
        for pattern in &patterns {
            report.absorb(self.cache.sweep_corrupted::<Value>(pattern).await?);
        }

        info!(
            scanned = report.scanned,
            corrupted = report.corrupted,
            deleted = report.deleted,
            "Cache sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{Cache, CacheExt, MockCache};
    use std::sync::Arc;
    use std::time::Duration;

    fn admin(mock: MockCache) -> (CacheAdminService, Arc<MockCache>) {
        let mock = Arc::new(mock);
        let safe = SafeCache::new(mock.clone(), Duration::from_millis(200));
        let tags = TagIndex::new(safe.clone(), Duration::from_secs(3600));
        (CacheAdminService::new(safe, tags), mock)
    }

    #[tokio::test]
    async fn test_stats_counts_namespaces() {
        let (admin, _) = admin(
            MockCache::new()
                .with_entry("translations:static:uk", &"{}", None)
                .with_entry("translations:static:en", &"{}", None)
                .with_entry("api:content_list:abc", &"[]", None)
                .with_raw_entry("ratelimit:translations:1.2.3.4", "3"),
        );

        let stats = admin.stats().await.unwrap();

        assert_eq!(stats.backend, "mock");
        assert_eq!(stats.total_keys, 4);
        assert_eq!(stats.namespaces["translations"], 2);
        assert_eq!(stats.namespaces["api"], 1);
        assert_eq!(stats.namespaces["ratelimit"], 1);
        assert_eq!(stats.namespaces["tag"], 0);
    }

    #[tokio::test]
    async fn test_sweep_defaults_to_value_namespaces() {
        let (admin, mock) = admin(
            MockCache::new()
                .with_raw_entry("translations:static:uk", "{broken")
                .with_raw_entry("api:content_list:abc", "[]")
                .with_raw_entry("other:key", "{broken"),
        );

        let report = admin.sweep(None).await.unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.corrupted_keys, vec!["translations:static:uk".to_string()]);
        assert!(mock.contains("other:key"));
    }

    #[tokio::test]
    async fn test_clear_scopes() {
        let (admin, mock) = admin(
            MockCache::new()
                .with_raw_entry("api:a", "1")
                .with_raw_entry("api:b", "2")
                .with_raw_entry("translations:static:uk", "{}"),
        );

        let outcome = admin.clear_pattern("api:*").await.unwrap();
        assert_eq!(outcome.removed, 2);
        assert!(mock.contains("translations:static:uk"));

        let outcome = admin.clear_all().await.unwrap();
        assert_eq!(outcome.scope, "all");
        assert_eq!(outcome.removed, 1);
        assert_eq!(mock.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_tags() {
        let (admin, mock) = admin(MockCache::new());
        mock.set("api:x", &1, Duration::from_secs(60)).await.unwrap();
        admin
            .tags
            .associate("api:x", &["model:Office".to_string()], Duration::from_secs(60))
            .await;

        let outcome = admin.clear_tags(&["model:Office".to_string()]).await;
        assert_eq!(outcome.removed, 1);
        assert!(!mock.contains("api:x"));
    }

    #[tokio::test]
    async fn test_unavailable_backend_is_error() {
        let (admin, _) = admin(MockCache::new().with_error("connection refused"));
        assert!(admin.stats().await.is_err());
    }
}
