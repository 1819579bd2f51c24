//! Directory-backed media library.
//!
//! This module provides the `FolderLibrary` struct which handles:
//! - Access checks against the library root
//! - Recursive scanning using walkdir, preferring the primary album directory
//! - Capture-order sorting (oldest first)
//! - Thumbnail fetches through the shared worker queue
//! - Live change notifications through `LibraryWatcher`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::probe::video_duration;
use super::watcher::LibraryWatcher;
use super::{AccessStatus, AssetSource, ChangeCallback, FetchHandle, Subscription};
use crate::config::GalleryConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::models::{Asset, AssetSnapshot, MediaKind, SnapshotOrigin};
use crate::thumbnails::queue::ThumbnailReply;
use crate::thumbnails::{ThumbnailCache, ThumbnailJob, ThumbnailQueue};

/// Scanning rules shared by the initial fetch and watcher rescans.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    pub root: PathBuf,
    pub primary_album: String,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl LibraryLayout {
    pub fn new(root: PathBuf, primary_album: impl Into<String>) -> Self {
        Self {
            root,
            primary_album: primary_album.into(),
            follow_symlinks: false,
        }
    }

    /// Scan the primary album if present, otherwise the whole library.
    pub fn scan(&self) -> GalleryResult<AssetSnapshot> {
        let album = self.root.join(&self.primary_album);
        let (dir, origin) = if !self.primary_album.is_empty() && album.is_dir() {
            (album, SnapshotOrigin::PrimaryAlbum)
        } else {
            (self.root.clone(), SnapshotOrigin::AllAssets)
        };

        info!(?dir, ?origin, "Scanning media library");
        let assets = self.discover_assets(&dir)?;
        info!(count = assets.len(), "Library scan complete");

        Ok(AssetSnapshot::new(assets, origin))
    }

    /// Whether a change at `path` can alter what `scan` returns.
    ///
    /// Hidden entries are never scanned. Once the primary album exists only
    /// the album itself and paths below it matter.
    pub fn covers(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.components().any(|c| is_hidden(c.as_os_str())) {
            return false;
        }
        if self.primary_album.is_empty() {
            return true;
        }
        let album = self.root.join(&self.primary_album);
        path.starts_with(&album) || !album.is_dir()
    }

    fn discover_assets(&self, dir: &Path) -> GalleryResult<Vec<Asset>> {
        std::fs::read_dir(dir).map_err(|source| GalleryError::LibraryUnavailable {
            root: dir.to_path_buf(),
            source,
        })?;

        let walker = WalkDir::new(dir)
            .follow_links(self.follow_symlinks)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        let mut assets = Vec::new();

        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let Some(kind) = MediaKind::from_path(path) else {
                continue;
            };

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!("Failed to read metadata for {:?}: {}", path, e);
                    continue;
                }
            };

            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);

            let duration = match kind {
                MediaKind::Video => video_duration(path),
                MediaKind::Image => None,
            };

            assets.push(
                Asset::new(path.to_path_buf(), kind, mtime, metadata.len() as i64)
                    .with_duration(duration),
            );
        }

        // Oldest first; the grid treats the last asset as the newest.
        assets.sort_by(|a, b| a.mtime.cmp(&b.mtime).then_with(|| a.path.cmp(&b.path)));

        Ok(assets)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// Watcher state shared between a subscription and its registration thread.
enum WatchSlot {
    Pending,
    Active(LibraryWatcher),
    Stopped,
}

/// A media library rooted at a directory on disk.
pub struct FolderLibrary {
    layout: Arc<LibraryLayout>,
    queue: ThumbnailQueue,
    watch_debounce: Duration,
}

impl FolderLibrary {
    pub fn new(config: &GalleryConfig) -> Self {
        let cache = ThumbnailCache::new(config.cache_dir.clone(), config.cache_mb);
        Self {
            layout: Arc::new(LibraryLayout::new(
                config.library_root.clone(),
                config.primary_album.clone(),
            )),
            queue: ThumbnailQueue::new(config.workers, cache),
            watch_debounce: config.watch_debounce,
        }
    }

    pub fn root(&self) -> &Path {
        &self.layout.root
    }
}

impl AssetSource for FolderLibrary {
    fn request_access(&self) -> AccessStatus {
        let root = self.root();
        match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                warn!(?root, "Library root is not a directory");
                return AccessStatus::Restricted;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(?root, "Library root does not exist");
                return AccessStatus::Restricted;
            }
            Err(e) => {
                warn!(?root, error = ?e, "Library root is not accessible");
                return AccessStatus::Denied;
            }
        }

        match std::fs::read_dir(root) {
            Ok(_) => AccessStatus::Granted,
            Err(e) => {
                warn!(?root, error = ?e, "Library root is not readable");
                AccessStatus::Denied
            }
        }
    }

    fn fetch_snapshot(&self) -> GalleryResult<AssetSnapshot> {
        self.layout.scan()
    }

    fn fetch_thumbnail(
        &self,
        asset: &Asset,
        target_size: u32,
        reply: ThumbnailReply,
    ) -> FetchHandle {
        let job = ThumbnailJob::new(asset.clone(), target_size, reply);
        let handle = FetchHandle::new(Arc::clone(&job.cancelled));
        self.queue.submit(job);
        handle
    }

    fn subscribe(&self, on_change: ChangeCallback) -> GalleryResult<Subscription> {
        let slot = Arc::new(Mutex::new(WatchSlot::Pending));
        let layout = Arc::clone(&self.layout);
        let debounce = self.watch_debounce;
        let register_slot = Arc::clone(&slot);

        // Recursive registration walks the whole tree; keep it off the caller's thread.
        thread::Builder::new()
            .name("library-watch-init".into())
            .spawn(move || {
                let scan_layout = Arc::clone(&layout);
                let result = LibraryWatcher::spawn(layout, debounce, move || {
                    match scan_layout.scan() {
                        Ok(snapshot) => on_change(snapshot),
                        Err(e) => warn!(error = ?e, "Rescan after library change failed"),
                    }
                });
                let watcher = match result {
                    Ok(watcher) => watcher,
                    Err(e) => {
                        warn!(error = %e, "Live library updates unavailable");
                        return;
                    }
                };
                let mut slot = register_slot.lock();
                if matches!(*slot, WatchSlot::Pending) {
                    debug!("Subscribed to library changes");
                    *slot = WatchSlot::Active(watcher);
                } else {
                    // Unsubscribed while registering.
                    watcher.stop();
                }
            })
            .map_err(|e| GalleryError::Watch(notify::Error::io(e)))?;

        Ok(Subscription::new(move || {
            let previous = std::mem::replace(&mut *slot.lock(), WatchSlot::Stopped);
            if let WatchSlot::Active(watcher) = previous {
                watcher.stop();
            }
        }))
    }

    fn location(&self) -> Option<&Path> {
        Some(self.root())
    }
}
