//! Mutation event subscribers

mod invalidation;

pub use invalidation::InvalidationBus;
