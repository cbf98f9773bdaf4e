//! In-memory content repository

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::content::{ContentRecord, ContentRepository};
use crate::domain::translation::{LocalizedContentProvider, LocalizedFields};
use crate::domain::DomainError;

/// In-memory implementation of ContentRepository
///
/// Also exposes the localized fields of its active records as dynamic
/// translations.
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    records: RwLock<BTreeMap<(String, String), ContentRecord>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: ContentRecord) -> Self {
        if let Ok(records) = self.records.get_mut() {
            records.insert((record.entity_type.clone(), record.id.clone()), record);
        }
        self
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn list_active(&self, entity_type: &str) -> Result<Vec<ContentRecord>, DomainError> {
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))?;

        Ok(records
            .values()
            .filter(|r| r.entity_type == entity_type && r.active)
            .cloned()
            .collect())
    }

    async fn get(&self, entity_type: &str, id: &str) -> Result<Option<ContentRecord>, DomainError> {
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))?;

        Ok(records
            .get(&(entity_type.to_string(), id.to_string()))
            .cloned())
    }

    async fn upsert(&self, record: ContentRecord) -> Result<bool, DomainError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))?;

        let key = (record.entity_type.clone(), record.id.clone());
        Ok(records.insert(key, record).is_none())
    }

    async fn delete(&self, entity_type: &str, id: &str) -> Result<bool, DomainError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))?;

        Ok(records
            .remove(&(entity_type.to_string(), id.to_string()))
            .is_some())
    }
}

#[async_trait]
impl LocalizedContentProvider for InMemoryContentRepository {
    fn name(&self) -> &str {
        "content"
    }

    async fn localized_fields(&self) -> Result<LocalizedFields, DomainError> {
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))?;

        let mut fields = LocalizedFields::new();

        for record in records.values().filter(|r| r.active) {
            for (locale, entries) in record.localized_entries() {
                fields.entry(locale).or_default().extend(entries);
            }
        }

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> InMemoryContentRepository {
        InMemoryContentRepository::new()
            .with_record(ContentRecord::new("Service", "1").with_text("title", "en", "Design"))
            .with_record(
                ContentRecord::new("Service", "2")
                    .with_text("title", "en", "Hidden")
                    .inactive(),
            )
            .with_record(ContentRecord::new("Project", "1").with_text("title", "uk", "Офіс"))
    }

    #[tokio::test]
    async fn test_list_active_filters_type_and_state() {
        let repo = repository();

        let services = repo.list_active("Service").await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].id, "1");
    }

    #[tokio::test]
    async fn test_upsert_and_delete() {
        let repo = InMemoryContentRepository::new();
        let record = ContentRecord::new("Office", "kyiv");

        assert!(repo.upsert(record.clone()).await.unwrap());
        assert!(!repo.upsert(record).await.unwrap());
        assert!(repo.get("Office", "kyiv").await.unwrap().is_some());

        assert!(repo.delete("Office", "kyiv").await.unwrap());
        assert!(!repo.delete("Office", "kyiv").await.unwrap());
    }

    #[tokio::test]
    async fn test_localized_fields_of_active_records() {
        let fields = repository().localized_fields().await.unwrap();

        assert_eq!(fields["en"].get("service.1.title").map(String::as_str), Some("Design"));
        assert!(!fields["en"].contains_key("service.2.title"));
        assert_eq!(fields["uk"].get("project.1.title").map(String::as_str), Some("Офіс"));
    }
}
