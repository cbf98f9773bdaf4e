//! Catalog store implementations

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::translation::{CatalogStore, TranslationCatalog};
use crate::domain::DomainError;

/// One pretty-printed `<locale>.json` file per locale
#[derive(Debug, Clone)]
pub struct FileCatalogStore {
    directory: PathBuf,
}

impl FileCatalogStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, locale: &str) -> PathBuf {
        self.directory.join(format!("{}.json", locale))
    }
}

/// Rejects locale names that could escape the catalog directory
fn check_locale(locale: &str) -> Result<(), DomainError> {
    let valid = !locale.is_empty()
        && locale
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DomainError::validation(format!("Invalid locale '{}'", locale)))
    }
}

#[async_trait]
impl CatalogStore for FileCatalogStore {
    async fn load(&self, locale: &str) -> Result<Option<TranslationCatalog>, DomainError> {
        check_locale(locale)?;
        let path = self.path_for(locale);

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let catalog = serde_json::from_str(&contents).map_err(|e| {
            DomainError::storage(format!("Invalid catalog {}: {}", path.display(), e))
        })?;

        Ok(Some(catalog))
    }

    async fn save(&self, locale: &str, catalog: &TranslationCatalog) -> Result<(), DomainError> {
        check_locale(locale)?;

        fs::create_dir_all(&self.directory).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to create {}: {}",
                self.directory.display(),
                e
            ))
        })?;

        let mut data = serde_json::to_string_pretty(catalog)
            .map_err(|e| DomainError::storage(format!("Failed to encode catalog: {}", e)))?;
        data.push('\n');

        let path = self.path_for(locale);
        let temp_path = self.directory.join(format!(".{}.json.tmp", locale));

        fs::write(&temp_path, data).await.map_err(|e| {
            DomainError::storage(format!("Failed to write {}: {}", temp_path.display(), e))
        })?;

        // readers see either the old file or the new one, never a partial write
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(DomainError::storage(format!(
                "Failed to replace {}: {}",
                path.display(),
                e
            )));
        }

        debug!(path = %path.display(), entries = catalog.len(), "Saved translation catalog");
        Ok(())
    }

    fn describe(&self, locale: &str) -> String {
        self.path_for(locale).display().to_string()
    }
}

/// Catalog store kept in memory
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    catalogs: RwLock<HashMap<String, TranslationCatalog>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, locale: &str, catalog: TranslationCatalog) -> Self {
        self.catalogs
            .get_mut()
            .insert(locale.to_string(), catalog);
        self
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn load(&self, locale: &str) -> Result<Option<TranslationCatalog>, DomainError> {
        Ok(self.catalogs.read().await.get(locale).cloned())
    }

    async fn save(&self, locale: &str, catalog: &TranslationCatalog) -> Result<(), DomainError> {
        self.catalogs
            .write()
            .await
            .insert(locale.to_string(), catalog.clone());
        Ok(())
    }

    fn describe(&self, locale: &str) -> String {
        format!("memory:{}", locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCatalogStore::new(dir.path());

        assert!(store.load("uk").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_writes_sorted_pretty_json() {
        let dir = TempDir::new().unwrap();
        let store = FileCatalogStore::new(dir.path().join("translations"));
        let catalog = TranslationCatalog::from([("nav.home", "Головна"), ("about.title", "Про нас")]);

        store.save("uk", &catalog).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("translations/uk.json")).unwrap();
        assert_eq!(
            written,
            "{\n  \"about.title\": \"Про нас\",\n  \"nav.home\": \"Головна\"\n}\n"
        );
        assert_eq!(store.load("uk").await.unwrap(), Some(catalog));
        assert!(!dir.path().join("translations/.uk.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("en.json"), "{ broken").unwrap();
        let store = FileCatalogStore::new(dir.path());

        assert!(store.load("en").await.is_err());
    }

    #[tokio::test]
    async fn test_non_string_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("en.json"), r#"{"a": 1}"#).unwrap();
        let store = FileCatalogStore::new(dir.path());

        assert!(store.load("en").await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FileCatalogStore::new(dir.path());

        assert!(store.load("../secrets").await.is_err());
        assert!(store
            .save("../uk", &TranslationCatalog::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryCatalogStore::new().with_catalog("en", TranslationCatalog::from([("a", "A")]));

        assert_eq!(store.load("en").await.unwrap().unwrap().len(), 1);
        assert!(store.load("uk").await.unwrap().is_none());

        store.save("uk", &TranslationCatalog::from([("a", "А")])).await.unwrap();
        assert!(store.load("uk").await.unwrap().is_some());
    }
}
