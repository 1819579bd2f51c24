//! In-memory asset source whose callbacks the test drives by hand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{AccessStatus, AssetSource, ChangeCallback, FetchHandle, Subscription};
use crate::error::GalleryResult;
use crate::models::{Asset, AssetId, AssetSnapshot, MediaKind, SnapshotOrigin};
use crate::thumbnails::queue::ThumbnailReply;
use crate::thumbnails::Thumbnail;

pub struct PendingFetch {
    pub asset: AssetId,
    pub target_size: u32,
    pub cancelled: Arc<AtomicBool>,
    reply: Option<ThumbnailReply>,
}

#[derive(Default)]
struct ScriptState {
    fetches: Vec<PendingFetch>,
    listener: Option<Arc<ChangeCallback>>,
}

pub struct ScriptedSource {
    access: Mutex<AccessStatus>,
    snapshot: Mutex<AssetSnapshot>,
    state: Mutex<ScriptState>,
    subscriptions: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(snapshot: AssetSnapshot) -> Arc<Self> {
        Arc::new(Self {
            access: Mutex::new(AccessStatus::Granted),
            snapshot: Mutex::new(snapshot),
            state: Mutex::new(ScriptState::default()),
            subscriptions: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn set_access(&self, status: AccessStatus) {
        *self.access.lock() = status;
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetches.len()
    }

    pub fn fetch_asset(&self, index: usize) -> AssetId {
        self.state.lock().fetches[index].asset
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.state.lock().fetches[index].cancelled.load(Ordering::Acquire)
    }

    /// Complete fetch `index` the way a worker would, honouring cancellation.
    pub fn complete(&self, index: usize, image: Option<Thumbnail>) -> bool {
        let (reply, cancelled) = {
            let mut state = self.state.lock();
            let fetch = &mut state.fetches[index];
            (fetch.reply.take(), fetch.cancelled.load(Ordering::Acquire))
        };
        match reply {
            Some(reply) if !cancelled => {
                reply(image);
                true
            }
            _ => false,
        }
    }

    /// Complete fetch `index` ignoring its cancel flag, as a racing worker might.
    pub fn complete_racing(&self, index: usize, image: Option<Thumbnail>) {
        let reply = self.state.lock().fetches[index].reply.take();
        if let Some(reply) = reply {
            reply(image);
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Replace the library contents and notify the subscriber, if any.
    pub fn emit_change(&self, snapshot: AssetSnapshot) {
        *self.snapshot.lock() = snapshot.clone();
        let listener = self.state.lock().listener.clone();
        if let Some(listener) = listener {
            listener(snapshot);
        }
    }
}

impl AssetSource for ScriptedSource {
    fn request_access(&self) -> AccessStatus {
        *self.access.lock()
    }

    fn fetch_snapshot(&self) -> GalleryResult<AssetSnapshot> {
        Ok(self.snapshot.lock().clone())
    }

    fn fetch_thumbnail(
        &self,
        asset: &Asset,
        target_size: u32,
        reply: ThumbnailReply,
    ) -> FetchHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.state.lock().fetches.push(PendingFetch {
            asset: asset.id,
            target_size,
            cancelled: Arc::clone(&cancelled),
            reply: Some(reply),
        });
        FetchHandle::new(cancelled)
    }

    fn subscribe(&self, on_change: ChangeCallback) -> GalleryResult<Subscription> {
        self.state.lock().listener = Some(Arc::new(on_change));
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let subscriptions = Arc::clone(&self.subscriptions);
        Ok(Subscription::new(move || {
            subscriptions.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}

/// A snapshot of `count` stills named `img0.jpg`.. in capture order.
pub fn numbered_snapshot(count: usize) -> AssetSnapshot {
    AssetSnapshot::new(
        (0..count).map(|i| numbered_asset(i, None)).collect(),
        SnapshotOrigin::AllAssets,
    )
}

pub fn numbered_asset(i: usize, duration: Option<f64>) -> Asset {
    let kind = if duration.is_some() {
        MediaKind::Video
    } else {
        MediaKind::Image
    };
    Asset::new(format!("/library/img{i}.jpg").into(), kind, i as i64, 100).with_duration(duration)
}

pub fn solid_thumbnail(value: u8) -> Thumbnail {
    Thumbnail::new(vec![value; 4], 1, 1)
}
