//! Cache infrastructure - backends, failure-tolerant gateway and tag index

mod factory;
mod in_memory;
mod redis;
mod safe;
mod tag_index;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
pub use safe::{SafeCache, SweepReport};
pub use tag_index::TagIndex;
