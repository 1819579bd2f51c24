//! Thumbnail pipeline for the photo picker.
//!
//! This module provides:
//! - `ThumbnailGenerator` - Renders square aspect-fill thumbnails from images and videos
//! - `ThumbnailCache` - Disk and memory caching with LRU eviction
//! - `ThumbnailQueue` - Cancellable worker queue for async generation

pub mod cache;
pub mod generator;
pub mod queue;

use std::sync::Arc;

pub use cache::ThumbnailCache;
pub use generator::ThumbnailGenerator;
pub use queue::{ThumbnailJob, ThumbnailQueue};

/// A decoded thumbnail ready to be uploaded as a texture.
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Tightly packed RGBA8 pixels, row-major.
    pub rgba: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

impl Thumbnail {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba: rgba.into(),
            width,
            height,
        }
    }

    pub fn memory_bytes(&self) -> usize {
        self.rgba.len()
    }

    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}
