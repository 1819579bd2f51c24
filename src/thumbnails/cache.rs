//! Thumbnail caching with both disk and memory layers.
//!
//! - Disk cache: Stores thumbnails in XDG_CACHE_HOME/photopick/thumbs/
//! - Memory cache: LRU cache of decoded RGBA thumbnails with a byte budget
//!
//! Filenames are based on xxhash of (path + mtime + size + edge) for fast invalidation.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use xxhash_rust::xxh3::xxh3_64;

use super::generator::ThumbnailGenerator;
use super::Thumbnail;
use crate::models::Asset;

/// Bump when thumbnail generation semantics change.
const THUMB_CACHE_VERSION: u8 = 1;

/// Upper bound on entry count regardless of byte budget.
const DEFAULT_LRU_CAPACITY: usize = 2048;

/// Cache key for thumbnail lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hash: u64,
}

impl CacheKey {
    pub fn new(path: &Path, mtime: i64, size: i64, edge: u32) -> Self {
        let path_str = path.to_string_lossy();
        let mut data = Vec::with_capacity(path_str.len() + 21);
        data.push(THUMB_CACHE_VERSION);
        data.extend_from_slice(path_str.as_bytes());
        data.extend_from_slice(&mtime.to_le_bytes());
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(&edge.to_le_bytes());
        Self {
            hash: xxh3_64(&data),
        }
    }

    pub fn for_asset(asset: &Asset, edge: u32) -> Self {
        Self::new(&asset.path, asset.mtime, asset.size, edge)
    }

    pub fn disk_filename(&self) -> String {
        format!("{:016x}.jpg", self.hash)
    }
}

struct MemoryLayer {
    entries: LruCache<CacheKey, Thumbnail>,
    bytes: usize,
}

/// Thumbnail cache with disk and memory layers. Clones share both layers.
#[derive(Clone)]
pub struct ThumbnailCache {
    cache_dir: PathBuf,
    max_memory_bytes: usize,
    memory: Arc<Mutex<MemoryLayer>>,
}

impl ThumbnailCache {
    pub fn new(cache_dir: PathBuf, max_memory_mb: usize) -> Self {
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            warn!(?cache_dir, error = ?e, "Failed to create cache directory");
        }

        debug!(?cache_dir, max_memory_mb, "Initialized thumbnail cache");

        let capacity = NonZeroUsize::new(DEFAULT_LRU_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache_dir,
            max_memory_bytes: max_memory_mb * 1024 * 1024,
            memory: Arc::new(Mutex::new(MemoryLayer {
                entries: LruCache::new(capacity),
                bytes: 0,
            })),
        }
    }

    /// Get a thumbnail from the cache, generating it if necessary.
    ///
    /// Checks memory first, then disk, and renders from the source as a last resort.
    pub fn get_or_generate(&self, asset: &Asset, edge: u32) -> Result<Thumbnail> {
        let key = CacheKey::for_asset(asset, edge);

        if let Some(cached) = self.memory.lock().entries.get(&key).cloned() {
            trace!(path = ?asset.path, "Memory cache hit");
            return Ok(cached);
        }

        let disk_path = self.disk_path(&key);
        if disk_path.exists() {
            match ThumbnailGenerator::load_jpeg(&disk_path) {
                Ok(thumbnail) => {
                    trace!(path = ?asset.path, "Disk cache hit");
                    self.insert_memory(key, thumbnail.clone());
                    return Ok(thumbnail);
                }
                Err(e) => {
                    warn!(?disk_path, error = ?e, "Removing corrupt cached thumbnail");
                    let _ = std::fs::remove_file(&disk_path);
                }
            }
        }

        debug!(path = ?asset.path, "Cache miss, generating thumbnail");
        let thumbnail = ThumbnailGenerator::render(&asset.path, asset.kind, edge)?;
        if let Err(e) = ThumbnailGenerator::save_jpeg(&thumbnail, &disk_path) {
            warn!(?disk_path, error = ?e, "Failed to persist thumbnail");
        }
        self.insert_memory(key, thumbnail.clone());
        Ok(thumbnail)
    }

    pub fn disk_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.disk_filename())
    }

    /// Add an entry to the memory layer, evicting least recently used entries past the budget.
    fn insert_memory(&self, key: CacheKey, thumbnail: Thumbnail) {
        let needed = thumbnail.memory_bytes();
        let mut memory = self.memory.lock();

        if let Some(old) = memory.entries.pop(&key) {
            memory.bytes = memory.bytes.saturating_sub(old.memory_bytes());
        }

        while memory.bytes + needed > self.max_memory_bytes {
            match memory.entries.pop_lru() {
                Some((_, evicted)) => {
                    memory.bytes = memory.bytes.saturating_sub(evicted.memory_bytes());
                    trace!(
                        evicted_bytes = evicted.memory_bytes(),
                        current_bytes = memory.bytes,
                        "Evicted thumbnail from memory cache"
                    );
                }
                None => break,
            }
        }

        if let Some((_, evicted)) = memory.entries.push(key, thumbnail) {
            // Capacity eviction; `push` hands back the displaced entry.
            memory.bytes = memory.bytes.saturating_sub(evicted.memory_bytes());
        }
        memory.bytes += needed;
    }

    pub fn memory_usage(&self) -> usize {
        self.memory.lock().bytes
    }

    pub fn memory_entry_count(&self) -> usize {
        self.memory.lock().entries.len()
    }
}
