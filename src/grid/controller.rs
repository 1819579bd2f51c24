//! Gallery screen state machine.
//!
//! The controller owns the snapshot, the selection and the cell bindings,
//! and is only ever touched from the UI thread. Work that runs elsewhere
//! (snapshot scans, thumbnail workers, the change watcher) reports back by
//! posting a [`GridEvent`] to [`AssetGridController::events`]; the front-end
//! feeds those to [`AssetGridController::handle_event`] and applies the
//! returned [`ViewUpdate`]s.

use std::path::Path;
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::coordinator::ThumbnailLoadCoordinator;
use super::layout::{format_duration, CellInsets, GUTTER};
use super::selection::SelectionModel;
use super::{CellContent, CellId, GridEvent, GridMode, ViewUpdate};
use crate::error::GalleryError;
use crate::library::{AssetSource, Subscription};
use crate::models::{Asset, AssetId, AssetSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    /// Access has not been requested yet.
    Unauthorized,
    Loading,
    Ready,
    /// Access was refused; only `retry` leaves this state.
    Denied,
    Closed,
}

pub struct AssetGridController {
    source: Arc<dyn AssetSource>,
    mode: GridMode,
    runtime: Handle,
    state: GridState,
    /// Bumped on every activation and on teardown; events tagged with an
    /// older value are dropped.
    generation: u64,
    snapshot: AssetSnapshot,
    selection: SelectionModel<AssetId>,
    picked: Option<AssetId>,
    coordinator: ThumbnailLoadCoordinator,
    subscription: Option<Subscription>,
    sender: Sender<GridEvent>,
    receiver: Receiver<GridEvent>,
}

impl AssetGridController {
    pub fn new(
        source: Arc<dyn AssetSource>,
        mode: GridMode,
        runtime: Handle,
        target_size: u32,
    ) -> Self {
        let (sender, receiver) = async_channel::unbounded();
        let coordinator = ThumbnailLoadCoordinator::new(Arc::clone(&source), sender.clone(), target_size);
        Self {
            source,
            mode,
            runtime,
            state: GridState::Unauthorized,
            generation: 0,
            snapshot: AssetSnapshot::empty(),
            selection: SelectionModel::new(),
            picked: None,
            coordinator,
            subscription: None,
            sender,
            receiver,
        }
    }

    /// Request library access and, once granted, start loading.
    pub fn activate(&mut self) -> Vec<ViewUpdate> {
        if !matches!(self.state, GridState::Unauthorized | GridState::Denied) {
            debug!(state = ?self.state, "Grid already active");
            return Vec::new();
        }

        let status = self.source.request_access();
        if !status.is_granted() {
            let err = GalleryError::PermissionDenied {
                root: self
                    .source
                    .location()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            };
            warn!(?status, "{err}");
            self.state = GridState::Denied;
            return vec![ViewUpdate::PermissionDenied];
        }

        self.state = GridState::Loading;
        self.generation = self.generation.wrapping_add(1);
        self.subscribe(self.generation);
        self.spawn_snapshot_fetch(self.generation);
        Vec::new()
    }

    /// Ask for access again after the user was sent to fix it.
    pub fn retry(&mut self) -> Vec<ViewUpdate> {
        if self.state != GridState::Denied {
            return Vec::new();
        }
        info!("Retrying library access");
        self.activate()
    }

    fn subscribe(&mut self, generation: u64) {
        let sender = self.sender.clone();
        let on_change = Box::new(move |snapshot: AssetSnapshot| {
            let _ = sender.send_blocking(GridEvent::LibraryChanged {
                generation,
                snapshot,
            });
        });
        // Replacing an old subscription drops it, which unsubscribes.
        match self.source.subscribe(on_change) {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(err) => {
                self.subscription = None;
                warn!(error = %err, "Live library updates unavailable");
            }
        }
    }

    fn spawn_snapshot_fetch(&self, generation: u64) {
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        self.runtime.spawn_blocking(move || {
            let result = source.fetch_snapshot();
            let _ = sender.send_blocking(GridEvent::SnapshotLoaded { generation, result });
        });
    }

    pub fn handle_event(&mut self, event: GridEvent) -> Vec<ViewUpdate> {
        if self.state == GridState::Closed {
            debug!("Discarding event after teardown");
            return Vec::new();
        }

        match event {
            GridEvent::SnapshotLoaded { generation, result } => {
                if !self.is_current(generation) {
                    return Vec::new();
                }
                if self.state != GridState::Loading {
                    // A change notification already delivered a newer listing.
                    debug!("Initial snapshot superseded by change notification");
                    return Vec::new();
                }
                match result {
                    Ok(snapshot) => self.apply_snapshot(snapshot),
                    Err(err) => {
                        warn!(error = %err, "Failed to load media library");
                        vec![ViewUpdate::LoadFailed(err.to_string())]
                    }
                }
            }
            GridEvent::LibraryChanged {
                generation,
                snapshot,
            } => {
                if !self.is_current(generation) {
                    return Vec::new();
                }
                self.apply_snapshot(snapshot)
            }
            GridEvent::ThumbnailLoaded { cell, token, image } => {
                match self.coordinator.complete(cell, token, image) {
                    Ok(Some(image)) => vec![ViewUpdate::Thumbnail { cell, image }],
                    Ok(None) => Vec::new(),
                    Err(err) => {
                        debug!(%cell, "{err}");
                        Vec::new()
                    }
                }
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Discarding stale library event");
            return false;
        }
        true
    }

    fn apply_snapshot(&mut self, snapshot: AssetSnapshot) -> Vec<ViewUpdate> {
        let first_load = self.state == GridState::Loading;
        self.state = GridState::Ready;
        self.snapshot = snapshot;

        let snapshot = &self.snapshot;
        let dropped = self.selection.retain(|id| snapshot.contains(id));
        if self.picked.is_some_and(|id| !snapshot.contains(id)) {
            self.picked = None;
        }

        let count = self.snapshot.len();
        let mut updates = vec![ViewUpdate::Reload { count }];
        if first_load {
            info!(count, origin = ?self.snapshot.origin(), "Media library loaded");
            if !self.snapshot.is_empty() {
                updates.push(ViewUpdate::ScrollTo(self.snapshot.last_position()));
            }
        } else {
            info!(count, dropped, "Media library changed");
        }

        for (cell, position, _) in self.coordinator.bound_cells() {
            if position < count {
                updates.extend(self.bind_cell(cell, position));
            } else {
                self.coordinator.unbind(cell);
                updates.push(ViewUpdate::Clear { cell });
            }
        }
        updates
    }

    /// Show the asset at `position` in `cell` and start loading its thumbnail.
    pub fn bind_cell(&mut self, cell: CellId, position: usize) -> Vec<ViewUpdate> {
        if self.state != GridState::Ready {
            return Vec::new();
        }
        let Some(asset) = self.snapshot.get(position).cloned() else {
            self.coordinator.unbind(cell);
            return vec![ViewUpdate::Clear { cell }];
        };

        // Single-select cells show the bare thumbnail.
        let (duration_label, rank) = match self.mode {
            GridMode::Single => (None, None),
            GridMode::Multi => (
                format_duration(asset.duration),
                self.selection.rank_of(asset.id),
            ),
        };
        let content = CellContent {
            position,
            asset: asset.id,
            insets: CellInsets::for_position(position, GUTTER),
            duration_label,
            rank,
        };
        self.coordinator.bind(cell, position, &asset);
        vec![ViewUpdate::Cell { cell, content }]
    }

    /// The cell went off-screen or was recycled without a new item.
    pub fn unbind_cell(&mut self, cell: CellId) {
        self.coordinator.unbind(cell);
    }

    /// Handle a tap on the asset at `position`.
    pub fn activate_cell(&mut self, position: usize) -> Vec<ViewUpdate> {
        if self.state != GridState::Ready {
            return Vec::new();
        }
        let Some(asset) = self.snapshot.get(position) else {
            return Vec::new();
        };
        let id = asset.id;

        match self.mode {
            GridMode::Single => {
                info!(position, asset = %id, path = %asset.path.display(), "Asset picked");
                self.picked = Some(id);
                Vec::new()
            }
            GridMode::Multi if self.selection.contains(id) => {
                self.selection.deselect(id);
                let mut updates: Vec<_> = self
                    .cells_showing(id)
                    .map(|cell| ViewUpdate::Badge {
                        cell,
                        rank: None,
                        animate: true,
                    })
                    .collect();

                // Everything ranked after the removed entry moved down by one.
                // Off-screen cells pick up their new rank on the next bind.
                for (cell, _, asset) in self.coordinator.bound_cells() {
                    if let Some(rank) = self.selection.rank_of(asset) {
                        updates.push(ViewUpdate::Badge {
                            cell,
                            rank: Some(rank),
                            animate: false,
                        });
                    }
                }
                updates
            }
            GridMode::Multi => {
                let rank = self.selection.select(id);
                debug!(position, asset = %id, rank, "Asset selected");
                self.cells_showing(id)
                    .map(|cell| ViewUpdate::Badge {
                        cell,
                        rank: Some(rank),
                        animate: true,
                    })
                    .collect()
            }
        }
    }

    fn cells_showing(&self, id: AssetId) -> impl Iterator<Item = CellId> {
        self.coordinator
            .bound_cells()
            .into_iter()
            .filter(move |(_, _, asset)| *asset == id)
            .map(|(cell, _, _)| cell)
    }

    /// Tear the screen down. Pending and future events are ignored.
    pub fn deactivate(&mut self) {
        if self.state == GridState::Closed {
            return;
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        debug!(in_flight = self.coordinator.in_flight_count(), "Cancelling thumbnail fetches");
        self.coordinator.cancel_all();
        self.generation = self.generation.wrapping_add(1);
        self.state = GridState::Closed;
        info!(mode = ?self.mode, selected = self.selection.len(), "Gallery closed");
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    pub fn mode(&self) -> GridMode {
        self.mode
    }

    pub fn snapshot(&self) -> &AssetSnapshot {
        &self.snapshot
    }

    pub fn selection(&self) -> &SelectionModel<AssetId> {
        &self.selection
    }

    /// Last asset tapped in single-select mode.
    pub fn picked(&self) -> Option<&Asset> {
        let position = self.snapshot.position_of(self.picked?)?;
        self.snapshot.get(position)
    }

    /// Selected assets in rank order.
    pub fn selected_assets(&self) -> Vec<Asset> {
        self.selection
            .iter()
            .filter_map(|id| self.snapshot.position_of(id))
            .filter_map(|position| self.snapshot.get(position))
            .cloned()
            .collect()
    }

    /// Where background work posts its results.
    pub fn events(&self) -> Receiver<GridEvent> {
        self.receiver.clone()
    }

    pub fn source(&self) -> &Arc<dyn AssetSource> {
        &self.source
    }
}

impl Drop for AssetGridController {
    fn drop(&mut self) {
        self.deactivate();
    }
}
