//! Content repository trait

use async_trait::async_trait;

use super::record::ContentRecord;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Persistence of content records, addressed by entity type and id
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync + std::fmt::Debug {
    /// Active records of one entity type, ordered by id
    async fn list_active(&self, entity_type: &str) -> Result<Vec<ContentRecord>, DomainError>;

    async fn get(&self, entity_type: &str, id: &str) -> Result<Option<ContentRecord>, DomainError>;

    /// Inserts or replaces a record, returning true when it was created
    async fn upsert(&self, record: ContentRecord) -> Result<bool, DomainError>;

    /// Removes a record, returning false when it did not exist
    async fn delete(&self, entity_type: &str, id: &str) -> Result<bool, DomainError>;
}
