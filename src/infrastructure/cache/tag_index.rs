//! Tag index for group invalidation

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::cache::tag_key;
use crate::infrastructure::observability::record_invalidation;

use super::safe::SafeCache;

/// Maps tags to the cache keys stored under them
///
/// Each tag owns a set at `tag:<tag>`. The set may reference keys that have
/// already expired; those are skipped when the tag is invalidated.
#[derive(Debug, Clone)]
pub struct TagIndex {
    cache: SafeCache,
    tag_ttl: Duration,
}

impl TagIndex {
    pub fn new(cache: SafeCache, tag_ttl: Duration) -> Self {
        Self { cache, tag_ttl }
    }

    /// Records `key` under every tag, returning how many tags were updated
    ///
    /// The tag set lives at least as long as the entry it references.
    pub async fn associate(&self, key: &str, tags: &[String], entry_ttl: Duration) -> usize {
        let ttl = self.tag_ttl.max(entry_ttl);
        let member = [key.to_string()];
        let mut recorded = 0;

        for tag in tags {
            let record = tag_key(tag);
            let result = self
                .cache
                .bounded("add_to_set", self.cache.backend().add_to_set(&record, &member, ttl))
                .await;

            match result {
                Ok(()) => recorded += 1,
                Err(e) => warn!(tag = %tag, key = %key, error = %e, "Failed to record cache tag"),
            }
        }

        recorded
    }

    /// Keys currently recorded under a tag
    pub async fn keys_for(&self, tag: &str) -> Vec<String> {
        match self
            .cache
            .bounded("set_members", self.cache.backend().set_members(&tag_key(tag)))
            .await
        {
            Ok(keys) => keys,
            Err(e) => {
                warn!(tag = %tag, error = %e, "Failed to read cache tag");
                Vec::new()
            }
        }
    }

    /// Deletes every entry recorded under the given tags, then the tag records
    ///
    /// Returns how many entries were actually removed. A tag that fails is
    /// logged and the remaining tags are still processed.
    pub async fn invalidate(&self, tags: &[String]) -> usize {
        let mut removed = 0;

        for tag in tags {
            let record = tag_key(tag);

            let keys = match self
                .cache
                .bounded("set_members", self.cache.backend().set_members(&record))
                .await
            {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(tag = %tag, error = %e, "Failed to read cache tag, dropping its record");
                    self.cache.delete(&record).await;
                    continue;
                }
            };

            let deleted = self.cache.delete_many(&keys).await;
            self.cache.delete(&record).await;

            record_invalidation(tag, deleted);

            if deleted > 0 {
                info!(tag = %tag, tagged = keys.len(), removed = deleted, "Invalidated cache tag");
            } else {
                debug!(tag = %tag, "Cache tag had no live entries");
            }

            removed += deleted;
        }

        removed
    }
}
