//! Application state for shared services

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::cache::Cache;
use crate::domain::content::ContentRepository;
use crate::domain::events::EventBus;
use crate::domain::translation::{CatalogStore, LocalizedContentProvider};
use crate::infrastructure::cache::{SafeCache, TagIndex};
use crate::infrastructure::events::InvalidationBus;
use crate::infrastructure::rate_limit::{RateGate, RateGateConfig};
use crate::infrastructure::services::{
    CacheAdminService, ContentService, ResponseCache, ResponseCacheConfig, TranslationService,
};
use crate::infrastructure::translation::ContentProviderRegistry;

/// Application state shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: SafeCache,
    pub response_cache: ResponseCache,
    pub translations: TranslationService,
    pub content: ContentService,
    pub cache_admin: CacheAdminService,
    pub rate_gate: RateGate,
    pub events: Arc<EventBus>,
    pub invalidation: Arc<InvalidationBus>,
}

/// Collaborators the state is assembled from
pub struct AppStateParts {
    pub cache: Arc<dyn Cache>,
    pub catalog_store: Arc<dyn CatalogStore>,
    pub content_repository: Arc<dyn ContentRepository>,
    /// Dynamic translation sources, consulted in order
    pub providers: Vec<Arc<dyn LocalizedContentProvider>>,
}

impl AppState {
    /// Wires every service around one cache backend
    ///
    /// The invalidation bus is subscribed to the event bus before the state
    /// is returned.
    pub async fn new(config: AppConfig, parts: AppStateParts) -> Self {
        let settings = &config.cache;

        let cache = SafeCache::new(parts.cache, settings.operation_timeout());
        let tags = TagIndex::new(cache.clone(), settings.tag_ttl());

        let mut response_config = ResponseCacheConfig::default().with_default_ttl(settings.default_ttl());
        if settings.single_flight {
            response_config = response_config
                .with_single_flight(std::time::Duration::from_millis(settings.single_flight_wait_ms));
        }
        let response_cache = ResponseCache::with_config(cache.clone(), tags.clone(), response_config);

        let mut registry = ContentProviderRegistry::new();
        for provider in parts.providers {
            registry.register(provider);
        }

        let translations = TranslationService::new(
            parts.catalog_store,
            registry,
            response_cache.clone(),
            config.translations.clone(),
        );

        let cache_admin = CacheAdminService::new(cache.clone(), tags.clone());

        let events = Arc::new(EventBus::new());
        let invalidation = Arc::new(InvalidationBus::from_config(tags, &config.invalidation));
        events.subscribe(invalidation.clone(), None).await;

        let content = ContentService::new(
            parts.content_repository,
            response_cache.clone(),
            events.clone(),
        );

        let rate_gate = RateGate::new(cache.clone(), RateGateConfig::from(&config.rate_limit));

        Self {
            config: Arc::new(config),
            cache,
            response_cache,
            translations,
            content,
            cache_admin,
            rate_gate,
            events,
            invalidation,
        }
    }
}
