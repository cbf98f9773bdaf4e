//! Content service - cached reads and mutations that publish events

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::domain::cache::CacheKeyParams;
use crate::domain::content::{ContentRecord, ContentRepository};
use crate::domain::events::{EventBus, MutationEvent};
use crate::domain::DomainError;

use super::response_cache::ResponseCache;

/// Value namespace of cached API responses
pub const API_NAMESPACE: &str = "api";

/// Content service for reads through the response cache and event-publishing writes
#[derive(Debug, Clone)]
pub struct ContentService {
    repository: Arc<dyn ContentRepository>,
    cache: ResponseCache,
    events: Arc<EventBus>,
    list_ttl: Duration,
}

impl ContentService {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        cache: ResponseCache,
        events: Arc<EventBus>,
    ) -> Self {
        let list_ttl = cache.default_ttl();
        Self {
            repository,
            cache,
            events,
            list_ttl,
        }
    }

    pub fn with_list_ttl(mut self, ttl: Duration) -> Self {
        self.list_ttl = ttl;
        self
    }

    /// Tags of every cached response built from an entity type
    pub fn tags_for(entity_type: &str) -> Vec<String> {
        vec![API_NAMESPACE.to_string(), format!("model:{}", entity_type)]
    }

    /// Active records of a type, served from the cache when possible
    pub async fn list(&self, entity_type: &str) -> Result<Vec<ContentRecord>, DomainError> {
        let params = CacheKeyParams::new().with_component("entity_type", entity_type);
        let repository = self.repository.clone();

        self.cache
            .cached(
                API_NAMESPACE,
                "content_list",
                &params,
                &Self::tags_for(entity_type),
                self.list_ttl,
                || async move { repository.list_active(entity_type).await },
            )
            .await
    }

    pub async fn get(&self, entity_type: &str, id: &str) -> Result<ContentRecord, DomainError> {
        self.repository
            .get(entity_type, id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("{} '{}' not found", entity_type, id))
            })
    }

    /// Stores a record and announces the change after the write succeeded
    pub async fn upsert(&self, record: ContentRecord) -> Result<ContentRecord, DomainError> {
        if record.entity_type.trim().is_empty() || record.id.trim().is_empty() {
            return Err(DomainError::validation(
                "Content record requires an entity type and an id",
            ));
        }

        let created = self.repository.upsert(record.clone()).await?;

        let event = if created {
            MutationEvent::created(&record.entity_type)
        } else {
            MutationEvent::updated(&record.entity_type)
        };

        info!(entity_type = %record.entity_type, id = %record.id, change = %event.change, "Content saved");
        self.events.publish(event.with_entity_id(&record.id)).await;

        Ok(record)
    }

    pub async fn delete(&self, entity_type: &str, id: &str) -> Result<(), DomainError> {
        if !self.repository.delete(entity_type, id).await? {
            return Err(DomainError::not_found(format!(
                "{} '{}' not found",
                entity_type, id
            )));
        }

        info!(entity_type = %entity_type, id = %id, "Content deleted");
        self.events
            .publish(MutationEvent::deleted(entity_type).with_entity_id(id))
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InvalidationConfig;
    use crate::domain::cache::MockCache;
    use crate::domain::content::MockContentRepository;
    use crate::domain::events::{ChangeKind, MockMutationHandler};
    use crate::infrastructure::cache::{SafeCache, TagIndex};
    use crate::infrastructure::content::InMemoryContentRepository;
    use crate::infrastructure::events::InvalidationBus;

    fn response_cache() -> ResponseCache {
        let safe = SafeCache::new(Arc::new(MockCache::new()), Duration::from_millis(200));
        let tags = TagIndex::new(safe.clone(), Duration::from_secs(3600));
        ResponseCache::new(safe, tags)
    }

    #[tokio::test]
    async fn test_list_is_cached() {
        let mut repository = MockContentRepository::new();
        repository
            .expect_list_active()
            .times(1)
            .returning(|_| Ok(vec![ContentRecord::new("Service", "1")]));

        let service = ContentService::new(
            Arc::new(repository),
            response_cache(),
            Arc::new(EventBus::new()),
        );

        for _ in 0..3 {
            assert_eq!(service.list("Service").await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_upsert_publishes_after_commit() {
        let events = Arc::new(EventBus::new());

        let mut handler = MockMutationHandler::new();
        handler.expect_name().return_const("recorder");
        handler
            .expect_handle()
            .withf(|event| {
                event.entity_type == "Project"
                    && event.change == ChangeKind::Created
                    && event.entity_id.as_deref() == Some("5")
            })
            .times(1)
            .returning(|_| Ok(()));
        events.subscribe(Arc::new(handler), None).await;

        let service = ContentService::new(
            Arc::new(InMemoryContentRepository::new()),
            response_cache(),
            events,
        );

        service
            .upsert(ContentRecord::new("Project", "5"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_write_publishes_nothing() {
        let mut repository = MockContentRepository::new();
        repository
            .expect_upsert()
            .returning(|_| Err(DomainError::storage("disk full")));

        let mut handler = MockMutationHandler::new();
        handler.expect_name().return_const("recorder");
        handler.expect_handle().never();

        let events = Arc::new(EventBus::new());
        events.subscribe(Arc::new(handler), None).await;

        let service = ContentService::new(Arc::new(repository), response_cache(), events);
        assert!(service
            .upsert(ContentRecord::new("Project", "5"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_mutation_refreshes_cached_list() {
        let cache = response_cache();
        let events = Arc::new(EventBus::new());
        events
            .subscribe(
                Arc::new(InvalidationBus::from_config(
                    cache.tag_index().clone(),
                    &InvalidationConfig::default(),
                )),
                None,
            )
            .await;

        let service = ContentService::new(
            Arc::new(InMemoryContentRepository::new()),
            cache,
            events,
        );

        assert!(service.list("Service").await.unwrap().is_empty());

        service
            .upsert(ContentRecord::new("Service", "1"))
            .await
            .unwrap();
        assert_eq!(service.list("Service").await.unwrap().len(), 1);

        service.delete("Service", "1").await.unwrap();
        assert!(service.list("Service").await.unwrap().is_empty());
        assert!(service.delete("Service", "1").await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_requires_identity() {
        let service = ContentService::new(
            Arc::new(InMemoryContentRepository::new()),
            response_cache(),
            Arc::new(EventBus::new()),
        );

        assert!(service
            .upsert(ContentRecord::new("", "1"))
            .await
            .is_err());
    }
}
