//! Translation service - layered catalog loading, parity tracking and maintenance

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::TranslationsConfig;
use crate::domain::translation::{
    missing_keys, CatalogSource, CatalogStore, CombinedCatalog, LocaleCatalogs,
    TranslationCatalog, ValidationReport,
};
use crate::domain::DomainError;
use crate::infrastructure::translation::ContentProviderRegistry;

use super::response_cache::ResponseCache;

/// Tag carried by every cached catalog
pub const TRANSLATIONS_TAG: &str = "translations";
/// Tag of catalogs built from the static files
pub const STATIC_TAG: &str = "translations:static";
/// Tag of catalogs built from content providers
pub const DYNAMIC_TAG: &str = "dynamic";

pub fn catalog_key(source: CatalogSource, locale: &str) -> String {
    format!("translations:{}:{}", source, locale)
}

fn tags_for(source: CatalogSource) -> Vec<String> {
    let tags: &[&str] = match source {
        CatalogSource::Static => &[TRANSLATIONS_TAG, STATIC_TAG],
        CatalogSource::Dynamic => &[TRANSLATIONS_TAG, DYNAMIC_TAG],
        CatalogSource::Combined => &[TRANSLATIONS_TAG, STATIC_TAG, DYNAMIC_TAG],
    };
    tags.iter().map(|t| t.to_string()).collect()
}

/// Per-locale entry counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocaleStats {
    pub static_count: usize,
    pub dynamic_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TranslationStats {
    pub languages: BTreeMap<String, LocaleStats>,
    pub total_languages: usize,
}

/// What an automatic fix changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FixOutcome {
    /// Placeholder entries added for missing keys
    pub synced: usize,
    /// Values stripped of surrounding whitespace
    pub trimmed: usize,
}

/// Loads, merges and maintains translation catalogs
#[derive(Debug, Clone)]
pub struct TranslationService {
    store: Arc<dyn CatalogStore>,
    providers: Arc<ContentProviderRegistry>,
    cache: ResponseCache,
    config: TranslationsConfig,
}

impl TranslationService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        providers: ContentProviderRegistry,
        cache: ResponseCache,
        config: TranslationsConfig,
    ) -> Self {
        Self {
            store,
            providers: Arc::new(providers),
            cache,
            config,
        }
    }

    pub fn locales(&self) -> &[String] {
        &self.config.locales
    }

    pub fn default_locale(&self) -> &str {
        &self.config.default_locale
    }

    /// Maps an unknown locale onto the default one
    pub fn resolve_locale(&self, requested: &str) -> String {
        if self.config.locales.iter().any(|l| l == requested) {
            requested.to_string()
        } else {
            debug!(requested = %requested, fallback = %self.config.default_locale, "Unknown locale, using default");
            self.config.default_locale.clone()
        }
    }

    fn ttl(&self, source: CatalogSource) -> Duration {
        let secs = match source {
            CatalogSource::Static => self.config.static_ttl_secs,
            CatalogSource::Dynamic => self.config.dynamic_ttl_secs,
            CatalogSource::Combined => self.config.combined_ttl_secs,
        };
        Duration::from_secs(secs)
    }

    /// Static catalog of a locale
    ///
    /// A missing file yields an empty catalog. A file that cannot be read
    /// is logged and also yields an empty catalog, which is not cached.
    pub async fn load_static(&self, locale: &str) -> TranslationCatalog {
        match self.cached_static(locale).await {
            Ok(catalog) => catalog,
            Err(e) => {
                error!(locale = %locale, error = %e, "Failed to load static translations");
                TranslationCatalog::new()
            }
        }
    }

    async fn cached_static(&self, locale: &str) -> Result<TranslationCatalog, DomainError> {
        let source = CatalogSource::Static;

        self.cache
            .get_or_compute(
                &catalog_key(source, locale),
                &tags_for(source),
                self.ttl(source),
                || self.read_static(locale),
            )
            .await
    }

    async fn read_static(&self, locale: &str) -> Result<TranslationCatalog, DomainError> {
        match self.store.load(locale).await? {
            Some(catalog) => {
                debug!(locale = %locale, entries = catalog.len(), "Loaded static translations");
                Ok(catalog)
            }
            None => {
                warn!(locale = %locale, path = %self.store.describe(locale), "Translation file not found");
                Ok(TranslationCatalog::new())
            }
        }
    }

    /// Dynamic catalog of a locale, merged from every registered provider
    pub async fn load_dynamic(&self, locale: &str) -> TranslationCatalog {
        let source = CatalogSource::Dynamic;
        let providers = self.providers.clone();

        let result = self
            .cache
            .get_or_compute(
                &catalog_key(source, locale),
                &tags_for(source),
                self.ttl(source),
                || async move { Ok::<_, Infallible>(providers.collect(locale).await) },
            )
            .await;

        match result {
            Ok(catalog) => catalog,
            Err(never) => match never {},
        }
    }

    /// Static catalog overlaid by the dynamic one
    pub async fn load_combined(&self, locale: &str) -> CombinedCatalog {
        let source = CatalogSource::Combined;

        let result = self
            .cache
            .get_or_compute(
                &catalog_key(source, locale),
                &tags_for(source),
                self.ttl(source),
                || async {
                    let static_catalog = self.cached_static(locale).await?;
                    let dynamic_catalog = self.load_dynamic(locale).await;
                    Ok::<_, DomainError>(CombinedCatalog::merge(&static_catalog, &dynamic_catalog))
                },
            )
            .await;

        match result {
            Ok(combined) => combined,
            Err(e) => {
                error!(locale = %locale, error = %e, "Failed to load static translations, serving dynamic only");
                let dynamic_catalog = self.load_dynamic(locale).await;
                CombinedCatalog::merge(&TranslationCatalog::new(), &dynamic_catalog)
            }
        }
    }

    /// Case-insensitive search over the combined catalog
    pub async fn search(&self, query: &str, locale: &str) -> TranslationCatalog {
        self.load_combined(locale).await.translations.search(query)
    }

    /// Static keys of a locale grouped by their first segment
    pub async fn grouped_keys(&self, locale: &str) -> BTreeMap<String, Vec<String>> {
        self.load_static(locale).await.grouped_keys()
    }

    /// Static catalogs of every configured locale, read from the store
    async fn read_catalogs(&self) -> Result<LocaleCatalogs, DomainError> {
        let mut catalogs = LocaleCatalogs::new();

        for locale in &self.config.locales {
            let catalog = self.store.load(locale).await?.unwrap_or_default();
            catalogs.insert(locale.clone(), catalog);
        }

        Ok(catalogs)
    }

    /// Keys each configured locale is missing relative to all others
    pub async fn validate_parity(&self) -> Result<BTreeMap<String, Vec<String>>, DomainError> {
        let catalogs = self.read_catalogs().await?;
        Ok(missing_keys(&catalogs))
    }

    /// Fills missing keys with `[LOCALE: key]` placeholders, returning how many were added
    pub async fn sync_keys(&self) -> Result<usize, DomainError> {
        let mut catalogs = self.read_catalogs().await?;
        let missing = missing_keys(&catalogs);
        let mut added = 0;

        for (locale, keys) in missing {
            if keys.is_empty() {
                continue;
            }

            let Some(catalog) = catalogs.get_mut(&locale) else {
                continue;
            };

            let marker = locale.to_uppercase();
            for key in &keys {
                catalog.insert(key.clone(), format!("[{}: {}]", marker, key));
            }

            self.store.save(&locale, catalog).await?;
            self.invalidate_static(&locale).await;

            info!(locale = %locale, added = keys.len(), "Synced missing translation keys");
            added += keys.len();
        }

        Ok(added)
    }

    /// Full data-quality report over the static catalogs
    pub async fn validate(&self) -> Result<ValidationReport, DomainError> {
        let catalogs = self.read_catalogs().await?;
        Ok(ValidationReport::build(&catalogs))
    }

    /// Syncs missing keys and trims whitespace around values
    pub async fn fix(&self) -> Result<FixOutcome, DomainError> {
        let synced = self.sync_keys().await?;
        let mut trimmed = 0;

        for (locale, mut catalog) in self.read_catalogs().await? {
            let mut changed = 0;
            for (_, value) in catalog.iter_mut() {
                let clean = value.trim();
                if clean.len() != value.len() {
                    *value = clean.to_string();
                    changed += 1;
                }
            }

            if changed > 0 {
                self.store.save(&locale, &catalog).await?;
                self.invalidate_static(&locale).await;
                trimmed += changed;
            }
        }

        Ok(FixOutcome { synced, trimmed })
    }

    /// Adds or replaces a single static translation
    pub async fn add_translation(
        &self,
        locale: &str,
        key: &str,
        value: &str,
    ) -> Result<(), DomainError> {
        let mut entries = BTreeMap::new();
        entries.insert(key.to_string(), value.to_string());
        self.bulk_add(locale, entries).await.map(|_| ())
    }

    /// Adds or replaces several static translations of one locale
    pub async fn bulk_add(
        &self,
        locale: &str,
        entries: BTreeMap<String, String>,
    ) -> Result<usize, DomainError> {
        self.check_locale(locale)?;

        if let Some(key) = entries.keys().find(|k| k.trim().is_empty()) {
            return Err(DomainError::validation(format!(
                "Translation key '{}' is empty",
                key
            )));
        }

        let mut catalog = self.store.load(locale).await?.unwrap_or_default();
        let count = entries.len();
        catalog.overlay(&TranslationCatalog::from(entries));

        self.store.save(locale, &catalog).await?;
        self.invalidate_static(locale).await;

        info!(locale = %locale, count = count, "Added translations");
        Ok(count)
    }

    /// Removes a key from every locale, returning how many locales had it
    pub async fn remove_translation(&self, key: &str) -> Result<usize, DomainError> {
        let mut removed = 0;

        for locale in &self.config.locales {
            let Some(mut catalog) = self.store.load(locale).await? else {
                continue;
            };

            if catalog.remove(key).is_some() {
                self.store.save(locale, &catalog).await?;
                self.invalidate_static(locale).await;
                removed += 1;
            }
        }

        if removed == 0 {
            return Err(DomainError::not_found(format!(
                "Translation key '{}' not found",
                key
            )));
        }

        info!(key = %key, locales = removed, "Removed translation");
        Ok(removed)
    }

    /// Entry counts per configured locale
    pub async fn stats(&self) -> TranslationStats {
        let mut languages = BTreeMap::new();

        for locale in &self.config.locales {
            let static_count = self.load_static(locale).await.len();
            let dynamic_count = self.load_dynamic(locale).await.len();
            let total_count = self.load_combined(locale).await.translations.len();

            languages.insert(
                locale.clone(),
                LocaleStats {
                    static_count,
                    dynamic_count,
                    total_count,
                },
            );
        }

        TranslationStats {
            total_languages: languages.len(),
            languages,
        }
    }

    /// Loads every configured locale into the cache, returning how many were loaded
    pub async fn warmup(&self) -> usize {
        for locale in &self.config.locales {
            let combined = self.load_combined(locale).await;
            debug!(locale = %locale, entries = combined.translations.len(), "Warmed translations");
        }

        info!(locales = self.config.locales.len(), "Translation cache warmed");
        self.config.locales.len()
    }

    /// Drops every cached catalog of one locale
    pub async fn invalidate_locale(&self, locale: &str) -> usize {
        let keys = [
            CatalogSource::Static,
            CatalogSource::Dynamic,
            CatalogSource::Combined,
        ]
        .map(|source| catalog_key(source, locale));

        self.cache.gateway().delete_many(&keys).await
    }

    /// Drops every cached catalog
    pub async fn invalidate_all(&self) -> usize {
        let mut removed = self.cache.invalidate(&[TRANSLATIONS_TAG.to_string()]).await;

        // tag records can be lost while the entries survive
        for locale in &self.config.locales {
            removed += self.invalidate_locale(locale).await;
        }

        info!(removed = removed, "Invalidated all translation caches");
        removed
    }

    async fn invalidate_static(&self, locale: &str) {
        let keys = [
            catalog_key(CatalogSource::Static, locale),
            catalog_key(CatalogSource::Combined, locale),
        ];
        self.cache.gateway().delete_many(&keys).await;
    }

    fn check_locale(&self, locale: &str) -> Result<(), DomainError> {
        if self.config.locales.iter().any(|l| l == locale) {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "Unsupported locale '{}'",
                locale
            )))
        }
    }
}
