//! Media library access.
//!
//! The grid never talks to the filesystem directly; it goes through an
//! [`AssetSource`], which the application injects. [`FolderLibrary`] is the
//! directory-backed implementation used by the desktop app.

pub mod folder;
pub mod probe;
pub mod watcher;

#[cfg(test)]
pub mod testing;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::GalleryResult;
use crate::models::{Asset, AssetSnapshot};
use crate::thumbnails::queue::ThumbnailReply;

pub use folder::FolderLibrary;

/// Outcome of an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    Granted,
    Denied,
    /// Access cannot be granted at all, e.g. the library does not exist.
    Restricted,
}

impl AccessStatus {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Callback receiving a complete replacement snapshot after a library change.
pub type ChangeCallback = Box<dyn Fn(AssetSnapshot) + Send + Sync>;

/// The media library as seen by the grid.
pub trait AssetSource: Send + Sync {
    /// Must resolve to `Granted` before any other call is made.
    fn request_access(&self) -> AccessStatus;

    /// Fetch the preferred album, or every asset when no such album exists.
    ///
    /// Assets are ordered oldest first, so the last asset is the newest one.
    /// This call blocks; callers run it off the UI thread.
    fn fetch_snapshot(&self) -> GalleryResult<AssetSnapshot>;

    /// Start rendering a thumbnail of `asset` no larger than `target_size`.
    ///
    /// `reply` runs on a worker thread with `None` when no image could be
    /// produced. Once the returned handle is cancelled the source makes a
    /// best effort not to call `reply` at all.
    fn fetch_thumbnail(&self, asset: &Asset, target_size: u32, reply: ThumbnailReply)
        -> FetchHandle;

    /// Deliver a fresh snapshot every time the library changes, until the
    /// returned subscription is dropped.
    fn subscribe(&self, on_change: ChangeCallback) -> GalleryResult<Subscription>;

    /// Filesystem location the user can inspect to repair access.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Cancellation handle for one thumbnail fetch.
#[derive(Debug, Clone)]
pub struct FetchHandle {
    cancelled: Arc<AtomicBool>,
}

impl FetchHandle {
    pub fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self { cancelled }
    }

    /// Cancel the fetch. Safe to call repeatedly and after completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Live change subscription. Dropping it unsubscribes.
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.run_teardown();
    }

    fn run_teardown(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_teardown();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_fetch_handle_cancel_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let handle = FetchHandle::new(Arc::clone(&flag));
        let copy = handle.clone();
        copy.cancel();
        copy.cancel();
        assert!(handle.is_cancelled());
        assert!(flag.load(Ordering::Acquire));
    }

    #[test]
    fn test_subscription_tears_down_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let counter = Arc::clone(&calls);
        drop(Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
