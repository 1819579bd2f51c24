use std::collections::HashMap;
use std::sync::Arc;

use super::asset::{Asset, AssetId};

/// Where a snapshot's assets were drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    PrimaryAlbum,
    AllAssets,
}

/// An immutable, ordered view of the library at one point in time.
///
/// Cloning is cheap. Positions are only meaningful against the snapshot they
/// were taken from; a library change produces a brand new snapshot.
#[derive(Debug, Clone)]
pub struct AssetSnapshot {
    assets: Arc<[Asset]>,
    index: Arc<HashMap<AssetId, usize>>,
    origin: SnapshotOrigin,
}

impl AssetSnapshot {
    pub fn new(assets: Vec<Asset>, origin: SnapshotOrigin) -> Self {
        let index = assets
            .iter()
            .enumerate()
            .map(|(position, asset)| (asset.id, position))
            .collect();
        Self {
            assets: assets.into(),
            index: Arc::new(index),
            origin,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), SnapshotOrigin::AllAssets)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Asset> {
        self.assets.get(position)
    }

    pub fn position_of(&self, id: AssetId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    /// Position of the newest asset, given the oldest-first ordering contract.
    pub fn last_position(&self) -> usize {
        self.assets.len().saturating_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }
}
