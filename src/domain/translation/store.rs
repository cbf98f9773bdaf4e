//! Catalog persistence and dynamic content provider traits

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use async_trait::async_trait;

use super::catalog::TranslationCatalog;
use crate::domain::DomainError;

/// Persistent source of static catalogs, one per locale
#[async_trait]
pub trait CatalogStore: Send + Sync + Debug {
    /// Loads the catalog of a locale, `None` when the locale has none
    async fn load(&self, locale: &str) -> Result<Option<TranslationCatalog>, DomainError>;

    /// Replaces the stored catalog of a locale
    async fn save(&self, locale: &str, catalog: &TranslationCatalog) -> Result<(), DomainError>;

    /// Human readable location of a locale's catalog, for logs
    fn describe(&self, locale: &str) -> String;
}

/// Localized text produced by a content source: locale -> key -> text
pub type LocalizedFields = HashMap<String, BTreeMap<String, String>>;

/// Content source that contributes dynamic translations
#[async_trait]
pub trait LocalizedContentProvider: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Every localized text the provider currently exposes
    async fn localized_fields(&self) -> Result<LocalizedFields, DomainError>;
}
