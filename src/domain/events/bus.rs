//! Publish/subscribe of mutation events

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::event::MutationEvent;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Reacts to committed content mutations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MutationHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &MutationEvent) -> Result<(), DomainError>;
}

struct Subscription {
    handler: Arc<dyn MutationHandler>,
    entity_type: Option<String>,
}

impl Subscription {
    fn matches(&self, event: &MutationEvent) -> bool {
        self.entity_type
            .as_deref()
            .is_none_or(|entity| entity == event.entity_type)
    }
}

/// Dispatches mutation events to subscribed handlers in subscription order
///
/// Handlers run inline, so once `publish` returns every handler has seen the
/// event. A failing handler is logged and never reaches the publisher.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a handler, optionally only to one entity type
    pub async fn subscribe(&self, handler: Arc<dyn MutationHandler>, entity_type: Option<&str>) {
        debug!(handler = %handler.name(), entity_type = ?entity_type, "Subscribed mutation handler");

        self.subscriptions.write().await.push(Subscription {
            handler,
            entity_type: entity_type.map(str::to_string),
        });
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    /// Delivers an event, returning how many handlers accepted it
    pub async fn publish(&self, event: MutationEvent) -> usize {
        let handlers: Vec<Arc<dyn MutationHandler>> = self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.matches(&event))
            .map(|s| s.handler.clone())
            .collect();

        let mut delivered = 0;

        for handler in handlers {
            match handler.handle(&event).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    handler = %handler.name(),
                    entity_type = %event.entity_type,
                    change = %event.change,
                    error = %e,
                    "Mutation handler failed"
                ),
            }
        }

        debug!(entity_type = %event.entity_type, change = %event.change, delivered = delivered, "Published mutation event");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::ChangeKind;

    fn handler(name: &'static str, calls: usize) -> MockMutationHandler {
        let mut handler = MockMutationHandler::new();
        handler.expect_name().return_const(name);
        handler.expect_handle().times(calls).returning(|_| Ok(()));
        handler
    }

    #[tokio::test]
    async fn test_publish_respects_entity_filter() {
        let bus = EventBus::new();
        bus.subscribe(Arc::new(handler("all", 2)), None).await;
        bus.subscribe(Arc::new(handler("services", 1)), Some("Service"))
            .await;

        assert_eq!(bus.publish(MutationEvent::updated("Service")).await, 2);
        assert_eq!(bus.publish(MutationEvent::created("Project")).await, 1);
        assert_eq!(bus.subscriber_count().await, 2);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_others() {
        let bus = EventBus::new();

        let mut failing = MockMutationHandler::new();
        failing.expect_name().return_const("failing");
        failing
            .expect_handle()
            .times(1)
            .returning(|_| Err(DomainError::cache("unavailable")));

        bus.subscribe(Arc::new(failing), None).await;
        bus.subscribe(Arc::new(handler("next", 1)), None).await;

        let event = MutationEvent::new("Office", ChangeKind::Deleted);
        assert_eq!(bus.publish(event).await, 1);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        assert_eq!(EventBus::new().publish(MutationEvent::created("Partner")).await, 0);
    }
}
