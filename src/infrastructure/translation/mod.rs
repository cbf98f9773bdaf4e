//! Translation infrastructure - catalog stores and dynamic source registry

mod registry;
mod store;

pub use registry::ContentProviderRegistry;
pub use store::{FileCatalogStore, InMemoryCatalogStore};
