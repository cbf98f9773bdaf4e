//! Translation catalog entity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where a catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Per-locale file, authoritative
    Static,
    /// Derived from registered content providers
    Dynamic,
    /// Static overlaid by dynamic
    Combined,
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Combined => "combined",
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered key to text map for one locale
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationCatalog(BTreeMap<String, String>);

impl TranslationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut String)> {
        self.0.iter_mut()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Copies every entry of `other` over this catalog; `other` wins on collision
    pub fn overlay(&mut self, other: &TranslationCatalog) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Returns a new catalog with `top` laid over `self`
    pub fn overlaid_by(&self, top: &TranslationCatalog) -> TranslationCatalog {
        let mut merged = self.clone();
        merged.overlay(top);
        merged
    }

    /// Case-insensitive substring match over keys and values
    pub fn search(&self, query: &str) -> TranslationCatalog {
        let needle = query.to_lowercase();

        self.0
            .iter()
            .filter(|(k, v)| k.to_lowercase().contains(&needle) || v.to_lowercase().contains(&needle))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Keys grouped by the segment before the first `.` (`other` when there is none)
    pub fn grouped_keys(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for key in self.0.keys() {
            let prefix = match key.split_once('.') {
                Some((prefix, _)) => prefix.to_string(),
                None => "other".to_string(),
            };
            groups.entry(prefix).or_default().push(key.clone());
        }

        groups
    }
}

impl FromIterator<(String, String)> for TranslationCatalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for TranslationCatalog {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for TranslationCatalog {
    fn from(entries: [(&str, &str); N]) -> Self {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl IntoIterator for TranslationCatalog {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Combined catalog together with the size of each source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedCatalog {
    pub translations: TranslationCatalog,
    pub static_count: usize,
    pub dynamic_count: usize,
}

impl CombinedCatalog {
    pub fn merge(static_catalog: &TranslationCatalog, dynamic_catalog: &TranslationCatalog) -> Self {
        Self {
            translations: static_catalog.overlaid_by(dynamic_catalog),
            static_count: static_catalog.len(),
            dynamic_count: dynamic_catalog.len(),
        }
    }
}
