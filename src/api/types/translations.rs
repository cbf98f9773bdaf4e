//! Translation endpoint types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::translation::{CatalogSource, CombinedCatalog, TranslationCatalog};

/// Catalog of one locale and source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationsResponse {
    pub language: String,
    pub translations: TranslationCatalog,
    pub count: usize,
    pub source: CatalogSource,
    pub available_languages: Vec<String>,
}

impl TranslationsResponse {
    pub fn new(
        language: impl Into<String>,
        translations: TranslationCatalog,
        source: CatalogSource,
        available_languages: Vec<String>,
    ) -> Self {
        Self {
            language: language.into(),
            count: translations.len(),
            translations,
            source,
            available_languages,
        }
    }
}

/// Combined catalog with the size of each source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedTranslationsResponse {
    pub language: String,
    pub translations: TranslationCatalog,
    pub count: usize,
    pub static_count: usize,
    pub dynamic_count: usize,
    pub source: CatalogSource,
    pub available_languages: Vec<String>,
}

impl CombinedTranslationsResponse {
    pub fn new(
        language: impl Into<String>,
        combined: CombinedCatalog,
        available_languages: Vec<String>,
    ) -> Self {
        Self {
            language: language.into(),
            count: combined.translations.len(),
            static_count: combined.static_count,
            dynamic_count: combined.dynamic_count,
            translations: combined.translations,
            source: CatalogSource::Combined,
            available_languages,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Static keys grouped by prefix
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub language: String,
    pub groups: BTreeMap<String, Vec<String>>,
    pub total_keys: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub language: String,
    pub query: String,
    pub results: TranslationCatalog,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translations_response_shape() {
        let response = TranslationsResponse::new(
            "uk",
            TranslationCatalog::from([("nav.home", "Головна")]),
            CatalogSource::Static,
            vec!["uk".to_string(), "en".to_string()],
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["language"], "uk");
        assert_eq!(json["count"], 1);
        assert_eq!(json["source"], "static");
        assert_eq!(json["translations"]["nav.home"], "Головна");
    }

    #[test]
    fn test_combined_response_counts() {
        let combined = CombinedCatalog::merge(
            &TranslationCatalog::from([("a", "1")]),
            &TranslationCatalog::from([("b", "2")]),
        );

        let response = CombinedTranslationsResponse::new("en", combined, vec![]);
        assert_eq!(response.count, 2);
        assert_eq!(response.static_count, 1);
        assert_eq!(response.dynamic_count, 1);
        assert_eq!(response.source, CatalogSource::Combined);
    }
}
