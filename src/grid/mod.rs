//! Toolkit-agnostic gallery grid.
//!
//! - `SelectionModel` - Ordered picks with dense ranks
//! - `ThumbnailLoadCoordinator` - At most one in-flight thumbnail per cell
//! - `AssetGridController` - Access, loading, reconciliation and selection
//!
//! Background work reports back through [`GridEvent`]s; the controller answers
//! every call with [`ViewUpdate`]s for the front-end to apply.

pub mod controller;
pub mod coordinator;
pub mod layout;
pub mod selection;

use std::fmt;

use crate::error::GalleryResult;
use crate::models::{AssetId, AssetSnapshot};
use crate::thumbnails::Thumbnail;

pub use controller::{AssetGridController, GridState};
pub use coordinator::{CellBinding, RequestToken, ThumbnailLoadCoordinator};
pub use layout::CellInsets;
pub use selection::SelectionModel;

/// Identity of one reusable grid cell widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    Single,
    Multi,
}

impl GridMode {
    pub fn title(self) -> &'static str {
        match self {
            Self::Single => "Gallery",
            Self::Multi => "Gallery Multiselection",
        }
    }
}

/// Messages posted from background contexts to the UI thread.
#[derive(Debug)]
pub enum GridEvent {
    SnapshotLoaded {
        generation: u64,
        result: GalleryResult<AssetSnapshot>,
    },
    LibraryChanged {
        generation: u64,
        snapshot: AssetSnapshot,
    },
    ThumbnailLoaded {
        cell: CellId,
        token: RequestToken,
        image: Option<Thumbnail>,
    },
}

/// Everything a bound cell shows apart from its image.
#[derive(Debug, Clone, PartialEq)]
pub struct CellContent {
    pub position: usize,
    pub asset: AssetId,
    pub insets: CellInsets,
    /// `m:ss` label, hidden when `None`.
    pub duration_label: Option<String>,
    /// Selection badge; always `None` in single-select mode.
    pub rank: Option<usize>,
}

/// Instructions for the front-end, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// Library access was refused; offer the settings bridge.
    PermissionDenied,
    LoadFailed(String),
    /// The grid now has `count` items.
    Reload { count: usize },
    ScrollTo(usize),
    /// Show `content` with a placeholder image.
    Cell { cell: CellId, content: CellContent },
    Thumbnail { cell: CellId, image: Thumbnail },
    Badge {
        cell: CellId,
        rank: Option<usize>,
        animate: bool,
    },
    /// The cell no longer shows any asset.
    Clear { cell: CellId },
}
