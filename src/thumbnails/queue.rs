//! Thumbnail worker queue for async generation.
//!
//! - Bounded worker pool (2-4 threads) for thumbnail generation
//! - Every job carries its own cancel flag, checked before decode and before reply
//! - Replies run on the worker thread; callers marshal them to the UI themselves
//! - Uses flume for communication between callers and workers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender};
use tracing::{debug, error, trace, warn};

use super::cache::ThumbnailCache;
use super::Thumbnail;
use crate::error::GalleryError;
use crate::models::Asset;

/// Maximum number of worker threads.
const MAX_WORKERS: usize = 4;

/// Maximum number of pending requests in the queue.
const MAX_QUEUE_SIZE: usize = 256;

/// Completion callback for a job. Receives `None` when generation failed.
pub type ThumbnailReply = Box<dyn FnOnce(Option<Thumbnail>) + Send>;

/// A request to render one thumbnail.
pub struct ThumbnailJob {
    pub asset: Asset,
    pub edge: u32,
    pub cancelled: Arc<AtomicBool>,
    pub reply: ThumbnailReply,
}

impl ThumbnailJob {
    pub fn new(asset: Asset, edge: u32, reply: ThumbnailReply) -> Self {
        Self {
            asset,
            edge,
            cancelled: Arc::new(AtomicBool::new(false)),
            reply,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Worker queue for thumbnail generation.
pub struct ThumbnailQueue {
    request_tx: Option<Sender<ThumbnailJob>>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl ThumbnailQueue {
    /// Create a new thumbnail queue with the specified number of workers.
    pub fn new(workers: usize, cache: ThumbnailCache) -> Self {
        let num_workers = workers.clamp(1, MAX_WORKERS);

        let (request_tx, request_rx) = flume::bounded(MAX_QUEUE_SIZE);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut worker_handles = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let rx = request_rx.clone();
            let shutdown = Arc::clone(&shutdown);
            let cache = cache.clone();

            let spawned = thread::Builder::new()
                .name(format!("thumb-worker-{}", worker_id))
                .spawn(move || worker_loop(worker_id, rx, shutdown, cache));

            match spawned {
                Ok(handle) => worker_handles.push(handle),
                Err(e) => error!(worker_id, error = ?e, "Failed to spawn thumbnail worker"),
            }
        }

        debug!(num_workers = worker_handles.len(), "Started thumbnail worker queue");

        Self {
            request_tx: Some(request_tx),
            workers: worker_handles,
            shutdown,
        }
    }

    /// Submit a job. A full or closed queue answers the job with `None` right away.
    pub fn submit(&self, job: ThumbnailJob) {
        let Some(tx) = self.request_tx.as_ref() else {
            reject(job);
            return;
        };

        match tx.try_send(job) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(job)) => {
                warn!("Thumbnail queue full, dropping request");
                reject(job);
            }
            Err(flume::TrySendError::Disconnected(job)) => {
                error!("Thumbnail queue disconnected");
                reject(job);
            }
        }
    }

    /// Shutdown the worker queue, waiting for in-flight jobs to finish.
    pub fn shutdown(&mut self) {
        debug!("Shutting down thumbnail queue");

        self.shutdown.store(true, Ordering::SeqCst);
        // Closing the channel wakes idle workers.
        self.request_tx = None;

        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }

        debug!("Thumbnail queue shutdown complete");
    }
}

impl Drop for ThumbnailQueue {
    fn drop(&mut self) {
        if !self.shutdown.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

fn reject(job: ThumbnailJob) {
    if !job.is_cancelled() {
        (job.reply)(None);
    }
}

/// Worker thread loop.
fn worker_loop(
    worker_id: usize,
    rx: Receiver<ThumbnailJob>,
    shutdown: Arc<AtomicBool>,
    cache: ThumbnailCache,
) {
    debug!(worker_id, "Thumbnail worker started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(job) => process_job(job, &cache),
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker_id, "Thumbnail worker stopped");
}

/// Process a single job, honouring cancellation on both sides of the decode.
fn process_job(job: ThumbnailJob, cache: &ThumbnailCache) {
    if job.is_cancelled() {
        trace!(path = ?job.asset.path, "Skipping cancelled thumbnail job");
        return;
    }

    let thumbnail = match cache.get_or_generate(&job.asset, job.edge) {
        Ok(thumbnail) => Some(thumbnail),
        Err(e) => {
            let err = GalleryError::FetchFailed {
                path: job.asset.path.clone(),
                reason: format!("{e:#}"),
            };
            warn!("{err}");
            None
        }
    };

    if job.is_cancelled() {
        trace!(path = ?job.asset.path, "Dropping result of cancelled thumbnail job");
        return;
    }

    (job.reply)(thumbnail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;
    use image::{Rgb, RgbImage};
    use std::path::Path;
    use tempfile::tempdir;

    fn image_asset(dir: &Path, name: &str) -> Asset {
        let path = dir.join(name);
        RgbImage::from_pixel(40, 40, Rgb([0, 128, 255]))
            .save(&path)
            .unwrap();
        Asset::new(path, MediaKind::Image, 1, 1)
    }

    #[test]
    fn test_job_delivers_thumbnail() {
        let src = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        let queue = ThumbnailQueue::new(
            2,
            ThumbnailCache::new(cache_dir.path().to_path_buf(), 64),
        );

        let (tx, rx) = flume::unbounded();
        let asset = image_asset(src.path(), "a.png");
        queue.submit(ThumbnailJob::new(
            asset,
            16,
            Box::new(move |thumb| {
                let _ = tx.send(thumb);
            }),
        ));

        let thumb = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
        assert_eq!((thumb.width, thumb.height), (16, 16));
    }

    #[test]
    fn test_failed_generation_replies_none() {
        let cache_dir = tempdir().unwrap();
        let queue = ThumbnailQueue::new(
            1,
            ThumbnailCache::new(cache_dir.path().to_path_buf(), 64),
        );

        let (tx, rx) = flume::unbounded();
        let asset = Asset::new("/definitely/not/here.png".into(), MediaKind::Image, 0, 0);
        queue.submit(ThumbnailJob::new(
            asset,
            16,
            Box::new(move |thumb| {
                let _ = tx.send(thumb);
            }),
        ));

        assert!(rx.recv_timeout(Duration::from_secs(10)).unwrap().is_none());
    }

    #[test]
    fn test_cancelled_job_never_replies() {
        let src = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        let mut queue = ThumbnailQueue::new(
            1,
            ThumbnailCache::new(cache_dir.path().to_path_buf(), 64),
        );

        let (tx, rx) = flume::unbounded::<Option<Thumbnail>>();
        let job = ThumbnailJob::new(
            image_asset(src.path(), "a.png"),
            16,
            Box::new(move |thumb| {
                let _ = tx.send(thumb);
            }),
        );
        job.cancelled.store(true, Ordering::Release);
        queue.submit(job);

        queue.shutdown();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_submit_after_shutdown_rejects() {
        let cache_dir = tempdir().unwrap();
        let mut queue = ThumbnailQueue::new(
            1,
            ThumbnailCache::new(cache_dir.path().to_path_buf(), 64),
        );
        queue.shutdown();

        let (tx, rx) = flume::unbounded();
        let asset = Asset::new("/x.png".into(), MediaKind::Image, 0, 0);
        queue.submit(ThumbnailJob::new(
            asset,
            16,
            Box::new(move |thumb| {
                let _ = tx.send(thumb);
            }),
        ));
        assert!(rx.try_recv().unwrap().is_none());
    }
}
