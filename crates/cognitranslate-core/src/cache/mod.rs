mod disk;
mod key;
mod memory;

pub use disk::DiskCache;
pub use key::CacheKey;
pub use memory::MemoryCache;

use tracing::warn;

use crate::config::CacheConfig;
use crate::error::Result;

/// Chunk translation cache with memory and disk layers
pub struct TranslationCache {
    memory: Option<MemoryCache>,
    disk: Option<DiskCache>,
}

impl TranslationCache {
    /// Create a new translation cache from configuration
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let memory = config
            .memory_enabled
            .then(|| MemoryCache::new(config));

        let disk = if config.disk_enabled {
            let path = config
                .disk_path
                .clone()
                .unwrap_or_else(crate::util::translation_cache_path);
            Some(DiskCache::new(path)?)
        } else {
            None
        };

        Ok(Self { memory, disk })
    }

    /// A cache that stores nothing.
    pub const fn disabled() -> Self {
        Self {
            memory: None,
            disk: None,
        }
    }

    /// Get a cached chunk translation
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        if let Some(ref memory) = self.memory
            && let Some(value) = memory.get(key).await
        {
            return Some(value);
        }

        let value = self.disk.as_ref()?.get(key.as_str())?;
        if let Some(ref memory) = self.memory {
            memory.insert(key.clone(), value.clone()).await;
        }
        Some(value)
    }

    /// Store a chunk translation
    pub async fn insert(&self, key: &CacheKey, value: &str) {
        if let Some(ref memory) = self.memory {
            memory.insert(key.clone(), value.to_string()).await;
        }

        if let Some(ref disk) = self.disk
            && let Err(e) = disk.insert(key.as_str(), value)
        {
            warn!("Failed to persist cached chunk {}: {}", key, e);
        }
    }

    /// Clear all layers
    pub fn clear(&self) {
        if let Some(ref memory) = self.memory {
            memory.clear();
        }

        if let Some(ref disk) = self.disk
            && let Err(e) = disk.clear()
        {
            warn!("Failed to clear disk cache: {}", e);
        }
    }
}
