//! Filesystem watcher that turns bursts of change events into rescans.
//!
//! notify delivers events on its own thread; a debounce thread collects them
//! until the library has been quiet for the configured interval and then runs
//! the rescan callback once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

use super::folder::LibraryLayout;
use crate::error::{GalleryError, GalleryResult};
use crate::models::MediaKind;

pub struct LibraryWatcher {
    watcher: RecommendedWatcher,
    stopped: Arc<AtomicBool>,
}

impl LibraryWatcher {
    /// Watch the library root recursively and call `on_settled` after each
    /// burst of events that can change what `layout` scans.
    pub fn spawn<F>(layout: Arc<LibraryLayout>, debounce: Duration, on_settled: F) -> GalleryResult<Self>
    where
        F: Fn() + Send + 'static,
    {
        let root = layout.root.clone();
        let (tx, rx) = flume::unbounded::<Event>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if is_relevant(&layout, &event) => {
                    let _ = tx.send(event);
                }
                Ok(event) => trace!(kind = ?event.kind, "Ignoring filesystem event"),
                Err(e) => warn!(error = ?e, "Filesystem watch error"),
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        let stopped = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stopped);

        thread::Builder::new()
            .name("library-watch".into())
            .spawn(move || {
                // Exits once the watcher, and with it the sender, is dropped.
                while let Ok(first) = rx.recv() {
                    trace!(paths = ?first.paths, "Library change detected");
                    loop {
                        match rx.recv_timeout(debounce) {
                            Ok(_) => continue,
                            Err(flume::RecvTimeoutError::Timeout) => break,
                            Err(flume::RecvTimeoutError::Disconnected) => return,
                        }
                    }
                    if stop_flag.load(Ordering::Acquire) {
                        return;
                    }
                    debug!("Library settled, rescanning");
                    on_settled();
                }
            })
            .map_err(|e| GalleryError::Watch(notify::Error::io(e)))?;

        Ok(Self { watcher, stopped })
    }

    /// Stop watching. Pending rescans are abandoned.
    pub fn stop(self) {
        self.stopped.store(true, Ordering::Release);
        drop(self.watcher);
    }
}

/// Access events and pure metadata touches never change the asset list,
/// and neither do paths the scan skips.
fn is_relevant(layout: &LibraryLayout, event: &Event) -> bool {
    match event.kind {
        EventKind::Access(_) | EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => {
            false
        }
        _ => event.paths.iter().any(|p| {
            (MediaKind::from_path(p).is_some() || p.extension().is_none()) && layout.covers(p)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, MetadataKind, ModifyKind, RemoveKind};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn event(kind: EventKind, path: &Path) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_is_relevant() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let layout = LibraryLayout::new(root.to_path_buf(), "DCIM");

        assert!(is_relevant(
            &layout,
            &event(EventKind::Create(CreateKind::File), &root.join("a.jpg"))
        ));
        assert!(is_relevant(
            &layout,
            &event(EventKind::Remove(RemoveKind::Folder), &root.join("album"))
        ));
        assert!(!is_relevant(
            &layout,
            &event(EventKind::Create(CreateKind::File), &root.join("notes.txt"))
        ));
        assert!(!is_relevant(
            &layout,
            &event(EventKind::Access(AccessKind::Any), &root.join("a.jpg"))
        ));
        assert!(!is_relevant(
            &layout,
            &event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)),
                &root.join("a.jpg")
            )
        ));
    }

    #[test]
    fn test_thumbnail_writes_are_not_relevant() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("DCIM")).unwrap();
        let layout = LibraryLayout::new(root.to_path_buf(), "DCIM");
        let create = EventKind::Create(CreateKind::File);

        assert!(!is_relevant(&layout, &event(create, &root.join(".cache/photopick/thumbs/0123.jpg"))));
        assert!(!is_relevant(&layout, &event(create, &root.join(".cache/x.jpg"))));
        assert!(!is_relevant(&layout, &event(create, &root.join("Downloads/x.jpg"))));
        assert!(is_relevant(&layout, &event(create, &root.join("DCIM/x.jpg"))));
    }

    #[test]
    fn test_rescans_after_new_file() {
        let dir = tempdir().unwrap();
        let layout = Arc::new(LibraryLayout::new(dir.path().to_path_buf(), "DCIM"));
        let (tx, rx) = flume::unbounded();
        let watcher = LibraryWatcher::spawn(layout, Duration::from_millis(50), move || {
            let _ = tx.send(());
        })
        .unwrap();

        std::fs::write(dir.path().join(".hidden.jpg"), b"skipped").unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

        std::fs::write(dir.path().join("new.jpg"), b"not really a jpeg").unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(10)).is_ok());

        watcher.stop();
    }
}
