//! Cache domain - Generic caching abstraction layer

mod key;
mod repository;

pub use key::{
    build_key, lock_key, rate_limit_key, tag_key, CacheKeyGenerator, CacheKeyParams,
    DefaultKeyGenerator, LOCK_NAMESPACE, RATE_LIMIT_NAMESPACE, TAG_NAMESPACE,
};
pub use repository::{glob_to_regex, Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
