//! Per-cell thumbnail request tracking.
//!
//! Cells are recycled as the grid scrolls. Each one may have at most one
//! fetch in flight; rebinding a cell cancels the old fetch and clears its
//! token before the new fetch is issued, so a late completion for the old
//! asset is recognised as stale and dropped.

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::Sender;
use tracing::{debug, trace};

use super::{CellId, GridEvent};
use crate::error::{GalleryError, GalleryResult};
use crate::library::{AssetSource, FetchHandle};
use crate::models::{Asset, AssetId};
use crate::thumbnails::Thumbnail;

/// Tags one fetch so its completion can be matched to the binding that issued it.
/// Token zero is never issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// What a cell currently shows and the fetch feeding it.
#[derive(Debug)]
pub struct CellBinding {
    pub cell: CellId,
    pub position: usize,
    pub asset: AssetId,
    token: Option<RequestToken>,
    handle: Option<FetchHandle>,
}

impl CellBinding {
    pub fn is_loading(&self) -> bool {
        self.token.is_some()
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
        self.token = None;
    }
}

pub struct ThumbnailLoadCoordinator {
    source: Arc<dyn AssetSource>,
    events: Sender<GridEvent>,
    target_size: u32,
    bindings: HashMap<CellId, CellBinding>,
    next_token: u64,
}

impl ThumbnailLoadCoordinator {
    pub fn new(source: Arc<dyn AssetSource>, events: Sender<GridEvent>, target_size: u32) -> Self {
        Self {
            source,
            events,
            target_size,
            bindings: HashMap::new(),
            next_token: 1,
        }
    }

    /// Point `cell` at `asset` and start fetching its thumbnail.
    pub fn bind(&mut self, cell: CellId, position: usize, asset: &Asset) -> RequestToken {
        if let Some(binding) = self.bindings.get_mut(&cell) {
            if binding.is_loading() {
                trace!(%cell, old = %binding.asset, "Cancelling superseded thumbnail fetch");
            }
            binding.cancel();
        }

        let token = RequestToken(self.next_token);
        self.next_token += 1;

        let events = self.events.clone();
        let handle = self.source.fetch_thumbnail(
            asset,
            self.target_size,
            Box::new(move |image| {
                // The receiver is gone once the grid is torn down.
                let _ = events.send_blocking(GridEvent::ThumbnailLoaded { cell, token, image });
            }),
        );

        self.bindings.insert(
            cell,
            CellBinding {
                cell,
                position,
                asset: asset.id,
                token: Some(token),
                handle: Some(handle),
            },
        );
        token
    }

    /// Accept a finished fetch if it is still the one `cell` is waiting for.
    ///
    /// Returns the image to show, `None` when the fetch produced nothing.
    pub fn complete(
        &mut self,
        cell: CellId,
        token: RequestToken,
        image: Option<Thumbnail>,
    ) -> GalleryResult<Option<Thumbnail>> {
        let Some(binding) = self.bindings.get_mut(&cell) else {
            return Err(GalleryError::StaleCallback);
        };
        if binding.token != Some(token) {
            return Err(GalleryError::StaleCallback);
        }

        binding.token = None;
        binding.handle = None;
        if image.is_none() {
            debug!(%cell, asset = %binding.asset, "Thumbnail fetch produced no image");
        }
        Ok(image)
    }

    /// Forget `cell`, cancelling its fetch.
    pub fn unbind(&mut self, cell: CellId) -> Option<CellBinding> {
        let mut binding = self.bindings.remove(&cell)?;
        binding.cancel();
        Some(binding)
    }

    pub fn cancel_all(&mut self) {
        let count = self.bindings.len();
        for (_, mut binding) in self.bindings.drain() {
            binding.cancel();
        }
        debug!(count, "Cancelled all cell bindings");
    }

    pub fn binding(&self, cell: CellId) -> Option<&CellBinding> {
        self.bindings.get(&cell)
    }

    /// Current bindings ordered by cell id.
    pub fn bound_cells(&self) -> Vec<(CellId, usize, AssetId)> {
        let mut cells: Vec<_> = self
            .bindings
            .values()
            .map(|b| (b.cell, b.position, b.asset))
            .collect();
        cells.sort_by_key(|(cell, _, _)| *cell);
        cells
    }

    pub fn in_flight_count(&self) -> usize {
        self.bindings.values().filter(|b| b.is_loading()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::testing::{numbered_asset, numbered_snapshot, solid_thumbnail, ScriptedSource};

    struct Harness {
        source: Arc<ScriptedSource>,
        coordinator: ThumbnailLoadCoordinator,
        events: async_channel::Receiver<GridEvent>,
    }

    fn harness() -> Harness {
        let source = ScriptedSource::new(numbered_snapshot(0));
        let (tx, rx) = async_channel::unbounded();
        let coordinator = ThumbnailLoadCoordinator::new(source.clone(), tx, 256);
        Harness {
            source,
            coordinator,
            events: rx,
        }
    }

    /// Drain posted completions through the coordinator, returning what would be displayed.
    fn deliver(h: &mut Harness) -> Vec<(CellId, Thumbnail)> {
        let mut shown = Vec::new();
        while let Ok(event) = h.events.try_recv() {
            if let GridEvent::ThumbnailLoaded { cell, token, image } = event {
                if let Ok(Some(image)) = h.coordinator.complete(cell, token, image) {
                    shown.push((cell, image));
                }
            }
        }
        shown
    }

    #[test]
    fn test_bind_issues_one_fetch() {
        let mut h = harness();
        let asset = numbered_asset(0, None);
        h.coordinator.bind(CellId(1), 0, &asset);

        assert_eq!(h.source.fetch_count(), 1);
        assert_eq!(h.source.fetch_asset(0), asset.id);
        assert!(h.coordinator.binding(CellId(1)).unwrap().is_loading());
    }

    #[test]
    fn test_rebind_cancels_previous_fetch_first() {
        let mut h = harness();
        h.coordinator.bind(CellId(1), 0, &numbered_asset(0, None));
        h.coordinator.bind(CellId(1), 1, &numbered_asset(1, None));

        assert!(h.source.is_cancelled(0));
        assert!(!h.source.is_cancelled(1));
        assert_eq!(h.coordinator.in_flight_count(), 1);
    }

    #[test]
    fn test_stale_completion_never_displays_old_asset() {
        // B finishes first, then A's late completion races past its cancel flag.
        let mut h = harness();
        h.coordinator.bind(CellId(1), 0, &numbered_asset(0, None));
        h.coordinator.bind(CellId(1), 1, &numbered_asset(1, None));

        h.source.complete(1, Some(solid_thumbnail(0xbb)));
        h.source.complete_racing(0, Some(solid_thumbnail(0xaa)));

        let shown = deliver(&mut h);
        assert_eq!(shown, vec![(CellId(1), solid_thumbnail(0xbb))]);
    }

    #[test]
    fn test_stale_completion_before_new_one() {
        let mut h = harness();
        h.coordinator.bind(CellId(1), 0, &numbered_asset(0, None));
        h.coordinator.bind(CellId(1), 1, &numbered_asset(1, None));

        h.source.complete_racing(0, Some(solid_thumbnail(0xaa)));
        assert!(deliver(&mut h).is_empty());

        h.source.complete(1, Some(solid_thumbnail(0xbb)));
        assert_eq!(deliver(&mut h), vec![(CellId(1), solid_thumbnail(0xbb))]);
        assert!(!h.coordinator.binding(CellId(1)).unwrap().is_loading());
    }

    #[test]
    fn test_cancelled_fetch_never_completes() {
        let mut h = harness();
        h.coordinator.bind(CellId(7), 0, &numbered_asset(0, None));
        h.coordinator.unbind(CellId(7));

        // A well-behaved source drops the reply...
        assert!(!h.source.complete(0, Some(solid_thumbnail(1))));
        // ...and a racing one is filtered by the token check.
        h.source.complete_racing(0, Some(solid_thumbnail(1)));
        assert!(deliver(&mut h).is_empty());
    }

    #[test]
    fn test_failed_fetch_clears_token() {
        let mut h = harness();
        let token = h.coordinator.bind(CellId(2), 0, &numbered_asset(0, None));
        assert_eq!(h.coordinator.complete(CellId(2), token, None).unwrap(), None);
        assert!(!h.coordinator.binding(CellId(2)).unwrap().is_loading());

        // A duplicate completion is stale
        assert!(matches!(
            h.coordinator.complete(CellId(2), token, None),
            Err(GalleryError::StaleCallback)
        ));
    }

    #[test]
    fn test_cancel_all() {
        let mut h = harness();
        for i in 0..4 {
            h.coordinator.bind(CellId(i), i as usize, &numbered_asset(i as usize, None));
        }
        h.coordinator.cancel_all();

        assert!((0..4).all(|i| h.source.is_cancelled(i)));
        assert!(h.coordinator.bound_cells().is_empty());
    }

    #[test]
    fn test_independent_cells_do_not_interfere() {
        let mut h = harness();
        h.coordinator.bind(CellId(1), 0, &numbered_asset(0, None));
        h.coordinator.bind(CellId(2), 1, &numbered_asset(1, None));

        h.source.complete(1, Some(solid_thumbnail(2)));
        h.source.complete(0, Some(solid_thumbnail(1)));

        let mut shown = deliver(&mut h);
        shown.sort_by_key(|(cell, _)| *cell);
        assert_eq!(
            shown,
            vec![
                (CellId(1), solid_thumbnail(1)),
                (CellId(2), solid_thumbnail(2)),
            ]
        );
        assert_eq!(
            h.coordinator.bound_cells(),
            vec![
                (CellId(1), 0, numbered_asset(0, None).id),
                (CellId(2), 1, numbered_asset(1, None).id),
            ]
        );
    }
}
