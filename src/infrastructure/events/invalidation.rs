//! Cache invalidation driven by content mutations

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::InvalidationConfig;
use crate::domain::events::{ChangeKind, MutationEvent, MutationHandler};
use crate::domain::DomainError;
use crate::infrastructure::cache::TagIndex;

/// Clears the cache tags routed to a mutated entity type
#[derive(Debug)]
pub struct InvalidationBus {
    routes: RwLock<BTreeMap<String, Vec<String>>>,
    tags: TagIndex,
}

impl InvalidationBus {
    pub fn new(tags: TagIndex) -> Self {
        Self {
            routes: RwLock::new(BTreeMap::new()),
            tags,
        }
    }

    pub fn from_config(tags: TagIndex, config: &InvalidationConfig) -> Self {
        Self {
            routes: RwLock::new(config.routes.clone()),
            tags,
        }
    }

    /// Routes an entity type to the tags its mutations clear, replacing any previous route
    pub fn register(&self, entity_type: impl Into<String>, tags: Vec<String>) {
        let entity_type = entity_type.into();

        match self.routes.write() {
            Ok(mut routes) => {
                debug!(entity_type = %entity_type, tags = ?tags, "Registered invalidation route");
                routes.insert(entity_type, tags);
            }
            Err(_) => warn!(entity_type = %entity_type, "Invalidation routes lock poisoned"),
        }
    }

    pub fn routes(&self) -> BTreeMap<String, Vec<String>> {
        self.routes
            .read()
            .map(|routes| routes.clone())
            .unwrap_or_default()
    }

    pub fn tags_for(&self, entity_type: &str) -> Vec<String> {
        self.routes
            .read()
            .ok()
            .and_then(|routes| routes.get(entity_type).cloned())
            .unwrap_or_default()
    }

    /// Invalidates the tags routed to `entity_type`, returning the removed entry count
    ///
    /// Unrouted types are a no-op. Never fails; tag errors are logged by the index.
    pub async fn on_mutation(&self, entity_type: &str, change: ChangeKind) -> usize {
        let tags = self.tags_for(entity_type);

        if tags.is_empty() {
            debug!(entity_type = %entity_type, change = %change, "No invalidation route");
            return 0;
        }

        let removed = self.tags.invalidate(&tags).await;
        info!(entity_type = %entity_type, change = %change, tags = ?tags, removed = removed, "Invalidated cache after mutation");
        removed
    }
}

#[async_trait]
impl MutationHandler for InvalidationBus {
    fn name(&self) -> &'static str {
        "cache-invalidation"
    }

    async fn handle(&self, event: &MutationEvent) -> Result<(), DomainError> {
        self.on_mutation(&event.entity_type, event.change).await;
        Ok(())
    }
}
