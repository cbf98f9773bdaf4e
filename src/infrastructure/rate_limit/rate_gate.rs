//! Fixed-window rate gate
//!
//! One counter per endpoint class and client lives in the shared cache at
//! `ratelimit:<class>:<client>` with a TTL equal to the window, so every
//! process sharing the backend enforces the same ceiling.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{RateLimitClass, RateLimitSettings};
use crate::domain::cache::rate_limit_key;
use crate::infrastructure::cache::SafeCache;
use crate::infrastructure::observability::record_rate_limited;

/// Result of a rate gate check
#[derive(Debug, Clone, PartialEq)]
pub struct RateDecision {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Requests counted in the current window
    pub count: u64,
    /// Ceiling for the window
    pub limit: u64,
    /// Remaining requests in the current window
    pub remaining: u64,
    /// Seconds until the window resets
    pub reset_in_seconds: u64,
}

impl RateDecision {
    fn fail_open(limit: u64, window: Duration) -> Self {
        Self {
            allowed: true,
            count: 0,
            limit,
            remaining: limit,
            reset_in_seconds: window.as_secs(),
        }
    }
}

/// Rate gate configuration
#[derive(Debug, Clone)]
pub struct RateGateConfig {
    pub enabled: bool,
    pub window: Duration,
    pub max_requests: u64,
    /// Guarded path prefixes, first match wins
    pub classes: Vec<RateLimitClass>,
}

impl Default for RateGateConfig {
    fn default() -> Self {
        Self::from(&RateLimitSettings::default())
    }
}

impl From<&RateLimitSettings> for RateGateConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            enabled: settings.enabled,
            window: Duration::from_secs(settings.window_secs.max(1)),
            max_requests: settings.max_requests,
            classes: settings.classes.clone(),
        }
    }
}

impl RateGateConfig {
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_max_requests(mut self, max_requests: u64) -> Self {
        self.max_requests = max_requests;
        self
    }
}

/// Counts requests per client and endpoint class in fixed windows
#[derive(Debug, Clone)]
pub struct RateGate {
    cache: SafeCache,
    config: RateGateConfig,
    class_limits: HashMap<String, u64>,
}

impl RateGate {
    pub fn new(cache: SafeCache, config: RateGateConfig) -> Self {
        let class_limits = config
            .classes
            .iter()
            .filter_map(|c| c.max_requests.map(|limit| (c.class.clone(), limit)))
            .collect();

        Self {
            cache,
            config,
            class_limits,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Endpoint class guarding `path`, if any
    pub fn class_for_path(&self, path: &str) -> Option<&str> {
        self.config
            .classes
            .iter()
            .find(|c| path.starts_with(&c.path_prefix))
            .map(|c| c.class.as_str())
    }

    fn limit_for(&self, class: &str) -> u64 {
        self.class_limits
            .get(class)
            .copied()
            .unwrap_or(self.config.max_requests)
    }

    async fn reset_in(&self, key: &str) -> u64 {
        match self
            .cache
            .bounded("ttl", self.cache.backend().ttl(key))
            .await
        {
            Ok(Some(ttl)) => ttl.as_secs().max(1),
            _ => self.config.window.as_secs(),
        }
    }

    /// Counts a request and decides whether it may proceed
    ///
    /// A client already at the ceiling is denied without incrementing, so
    /// rejected requests never extend the count. Backend failures allow
    /// the request.
    pub async fn allow(&self, client_id: &str, endpoint_class: &str) -> RateDecision {
        let limit = self.limit_for(endpoint_class);
        let window = self.config.window;
        let key = rate_limit_key(endpoint_class, client_id);
        let backend = self.cache.backend();

        let current = match self.cache.bounded("get", backend.get_raw(&key)).await {
            Ok(raw) => raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0),
            Err(e) => {
                warn!(key = %key, error = %e, "Rate gate backend unavailable, allowing request");
                return RateDecision::fail_open(limit, window);
            }
        };

        if current >= limit {
            return self.deny(&key, endpoint_class, current, limit).await;
        }

        let count = match self.cache.bounded("increment", backend.increment(&key, 1)).await {
            Ok(count) => count.max(0) as u64,
            Err(e) => {
                warn!(key = %key, error = %e, "Rate gate increment failed, allowing request");
                return RateDecision::fail_open(limit, window);
            }
        };

        if count == 1 {
            let expired = self
                .cache
                .bounded("expire", backend.expire(&key, window))
                .await;

            if !matches!(expired, Ok(true)) {
                // never leave a counter that could outlive its window
                warn!(key = %key, "Failed to set rate window TTL, dropping counter");
                self.cache.delete(&key).await;
            }
        }

        if count > limit {
            return self.deny(&key, endpoint_class, count, limit).await;
        }

        debug!(key = %key, count, limit, "Rate gate allowed request");

        RateDecision {
            allowed: true,
            count,
            limit,
            remaining: limit - count,
            reset_in_seconds: self.reset_in(&key).await,
        }
    }

    async fn deny(&self, key: &str, class: &str, count: u64, limit: u64) -> RateDecision {
        record_rate_limited(class);
        debug!(key = %key, count, limit, "Rate gate denied request");

        RateDecision {
            allowed: false,
            count,
            limit,
            remaining: 0,
            reset_in_seconds: self.reset_in(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{Cache, MockCache};
    use crate::infrastructure::cache::InMemoryCache;
    use std::sync::Arc;

    fn gate(cache: Arc<dyn Cache>, config: RateGateConfig) -> RateGate {
        RateGate::new(SafeCache::new(cache, Duration::from_millis(200)), config)
    }

    #[tokio::test]
    async fn test_allows_first_request() {
        let gate = gate(Arc::new(InMemoryCache::new()), RateGateConfig::default());

        let decision = gate.allow("10.0.0.1", "translations").await;

        assert!(decision.allowed);
        assert_eq!(decision.count, 1);
        assert_eq!(decision.remaining, 99);
        assert_eq!(decision.limit, 100);
    }

    #[tokio::test]
    async fn test_denies_over_ceiling_until_window_expires() {
        let config = RateGateConfig::default().with_window(Duration::from_millis(300));
        let gate = gate(Arc::new(InMemoryCache::new()), config);

        for _ in 0..100 {
            assert!(gate.allow("client", "translations").await.allowed);
        }

        let decision = gate.allow("client", "translations").await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);

        tokio::time::sleep(Duration::from_millis(400)).await;

        let decision = gate.allow("client", "translations").await;
        assert!(decision.allowed);
        assert_eq!(decision.count, 1);
    }

    #[tokio::test]
    async fn test_denied_requests_do_not_increment() {
        let cache = Arc::new(InMemoryCache::new());
        let gate = gate(cache.clone(), RateGateConfig::default().with_max_requests(2));

        gate.allow("c", "translations").await;
        gate.allow("c", "translations").await;

        for _ in 0..5 {
            assert!(!gate.allow("c", "translations").await.allowed);
        }

        let raw = cache.get_raw("ratelimit:translations:c").await.unwrap();
        assert_eq!(raw.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_clients_and_classes_are_independent() {
        let gate = gate(
            Arc::new(InMemoryCache::new()),
            RateGateConfig::default().with_max_requests(1),
        );

        assert!(gate.allow("a", "translations").await.allowed);
        assert!(!gate.allow("a", "translations").await.allowed);
        assert!(gate.allow("b", "translations").await.allowed);
        assert!(gate.allow("a", "content").await.allowed);
    }

    #[tokio::test]
    async fn test_first_increment_sets_window_ttl() {
        let cache = Arc::new(MockCache::new());
        let gate = gate(cache.clone(), RateGateConfig::default());

        gate.allow("c", "translations").await;

        let ttl = cache.ttl("ratelimit:translations:c").await.unwrap();
        assert_eq!(ttl, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_fails_open() {
        let gate = gate(
            Arc::new(MockCache::new().with_error("connection refused")),
            RateGateConfig::default().with_max_requests(1),
        );

        for _ in 0..3 {
            assert!(gate.allow("c", "translations").await.allowed);
        }
    }

    #[tokio::test]
    async fn test_class_limit_override() {
        let mut config = RateGateConfig::default().with_max_requests(100);
        config.classes.push(RateLimitClass {
            path_prefix: "/api/v1/webhooks".to_string(),
            class: "webhooks".to_string(),
            max_requests: Some(1),
        });
        let gate = gate(Arc::new(InMemoryCache::new()), config);

        assert!(gate.allow("c", "webhooks").await.allowed);
        assert!(!gate.allow("c", "webhooks").await.allowed);
    }

    #[test]
    fn test_class_for_path() {
        let gate = gate(Arc::new(MockCache::new()), RateGateConfig::default());

        assert_eq!(
            gate.class_for_path("/api/v1/translations/uk"),
            Some("translations")
        );
        assert_eq!(gate.class_for_path("/api/v1/cache"), None);
    }
}
