//! Infrastructure services

mod cache_admin_service;
mod content_service;
mod response_cache;
mod translation_service;

pub use cache_admin_service::{CacheAdminService, CacheStats, ClearOutcome, VALUE_NAMESPACES};
pub use content_service::{ContentService, API_NAMESPACE};
pub use response_cache::{ResponseCache, ResponseCacheConfig};
pub use translation_service::{
    catalog_key, FixOutcome, LocaleStats, TranslationService, TranslationStats, DYNAMIC_TAG,
    STATIC_TAG, TRANSLATIONS_TAG,
};
