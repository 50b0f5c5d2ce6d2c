use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Tree holding translated chunks, keyed by [`super::CacheKey`] hash.
const CHUNK_TREE: &str = "chunks";

/// Disk-based chunk cache using sled
pub struct DiskCache {
    db: Db,
    chunks: Tree,
}

impl DiskCache {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::CacheInit(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let db = sled::open(path).map_err(|e| open_error(path, &e))?;
        let chunks = db
            .open_tree(CHUNK_TREE)
            .map_err(|e| Error::CacheInit(format!("cannot open chunk tree: {e}")))?;

        debug!("Opened disk cache at {} ({} chunks)", path.display(), chunks.len());

        Ok(Self { db, chunks })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let bytes = match self.chunks.get(key) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!("Cache read error: {}", e);
                return None;
            }
        };

        String::from_utf8(bytes.to_vec())
            .inspect_err(|e| warn!("Discarding non UTF-8 cache entry {}: {}", key, e))
            .ok()
    }

    /// Store a translation and flush it to disk.
    pub fn insert(&self, key: &str, value: &str) -> Result<()> {
        self.chunks
            .insert(key, value.as_bytes())
            .map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.flush()
    }

    pub fn clear(&self) -> Result<()> {
        self.chunks
            .clear()
            .map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.flush()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|e| Error::CacheWrite(format!("flush failed: {e}")))
    }
}

/// sled reports a held lock as an I/O error; turn that into an actionable message.
fn open_error(path: &Path, e: &sled::Error) -> Error {
    let reason = e.to_string();
    if reason.contains("WouldBlock") || reason.contains("lock") {
        Error::CacheInit(format!(
            "cache at {0} is locked by another process (or a crashed one). \
             Remove {0}/db/LOCK or run with the disk cache disabled",
            path.display()
        ))
    } else {
        Error::CacheInit(format!("cannot open cache at {}: {reason}", path.display()))
    }
}
