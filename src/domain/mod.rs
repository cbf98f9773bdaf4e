//! Domain layer - Core entities and traits

pub mod cache;
pub mod content;
pub mod error;
pub mod events;
pub mod translation;

pub use cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
pub use content::{ContentRecord, ContentRepository};
pub use error::DomainError;
pub use events::{ChangeKind, EventBus, MutationEvent, MutationHandler};
pub use translation::{CatalogSource, CatalogStore, LocalizedContentProvider, TranslationCatalog};
