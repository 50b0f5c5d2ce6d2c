use moka::future::Cache;
use std::time::Duration;

use super::CacheKey;
use crate::config::CacheConfig;

/// Hot tier of the chunk cache.
///
/// Capacity is counted in bytes of translated text, so a handful of long
/// chunks can evict many short ones.
pub struct MemoryCache {
    chunks: Cache<CacheKey, String>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = config.memory_max_mb.saturating_mul(1024 * 1024);
        let builder = Cache::builder()
            .max_capacity(capacity)
            .weigher(|_: &CacheKey, translated: &String| {
                u32::try_from(translated.len()).unwrap_or(u32::MAX)
            });

        let chunks = match config.memory_ttl_seconds {
            0 => builder.build(),
            ttl => builder.time_to_live(Duration::from_secs(ttl)).build(),
        };

        Self { chunks }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        self.chunks.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, translated: String) {
        self.chunks.insert(key, translated).await;
    }

    pub fn clear(&self) {
        self.chunks.invalidate_all();
    }
}
