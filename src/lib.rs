//! Site Content Cache
//!
//! Cache and translation delivery layer for a content-managed website:
//! - Static translation catalogs merged with translations taken from site content
//! - Tag based invalidation driven by content mutation events
//! - Failure tolerant cache access over Redis or an in-process store
//! - Fixed-window rate limiting and a Prometheus metrics surface

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::{AppState, AppStateParts};
use domain::translation::LocalizedContentProvider;
use infrastructure::{
    cache::{CacheConfig, CacheFactory},
    content::InMemoryContentRepository,
    translation::FileCatalogStore,
};
use tracing::info;

/// Create the application state from configuration
///
/// The configured cache backend is connected here; content lives in memory
/// and also feeds the dynamic translation catalogs.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache_config = CacheConfig::from_settings(&config.cache)?;
    let cache = CacheFactory::new().create(&cache_config).await?;
    info!(backend = cache.backend_name(), "Cache backend ready");

    let catalog_store = Arc::new(FileCatalogStore::new(&config.translations.directory));
    info!(
        directory = %config.translations.directory.display(),
        locales = ?config.translations.locales,
        "Translation catalogs configured"
    );

    let content = Arc::new(InMemoryContentRepository::new());

    let parts = AppStateParts {
        cache,
        catalog_store,
        content_repository: content.clone(),
        providers: vec![content as Arc<dyn LocalizedContentProvider>],
    };

    Ok(AppState::new(config.clone(), parts).await)
}
