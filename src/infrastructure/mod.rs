//! Infrastructure layer - Cache backends, services and adapters

pub mod cache;
pub mod content;
pub mod events;
pub mod logging;
pub mod observability;
pub mod rate_limit;
pub mod services;
pub mod translation;
