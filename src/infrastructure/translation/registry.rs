//! Registry of dynamic translation sources

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::translation::{LocalizedContentProvider, TranslationCatalog};

/// Content providers consulted for dynamic translations, in registration order
#[derive(Debug, Clone, Default)]
pub struct ContentProviderRegistry {
    providers: Vec<Arc<dyn LocalizedContentProvider>>,
}

impl ContentProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn LocalizedContentProvider>) {
        debug!(provider = %provider.name(), "Registered content provider");
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn LocalizedContentProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Merges every provider's texts for `locale`
    ///
    /// Later providers win on key collisions. A failing provider is logged
    /// and skipped.
    pub async fn collect(&self, locale: &str) -> TranslationCatalog {
        let mut catalog = TranslationCatalog::new();

        for provider in &self.providers {
            match provider.localized_fields().await {
                Ok(mut fields) => {
                    if let Some(texts) = fields.remove(locale) {
                        catalog.overlay(&TranslationCatalog::from(texts));
                    }
                }
                Err(e) => {
                    warn!(provider = %provider.name(), locale = %locale, error = %e, "Content provider failed, skipping");
                }
            }
        }

        catalog
    }
}
