//! Error taxonomy for the library and grid layers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by asset sources and the grid controller.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The library cannot be read. Terminal until the user fixes access and retries.
    #[error("access to media library {root:?} was denied")]
    PermissionDenied { root: PathBuf },

    /// A single thumbnail could not be produced. The cell keeps its placeholder.
    #[error("thumbnail fetch failed for {path:?}: {reason}")]
    FetchFailed { path: PathBuf, reason: String },

    /// A callback arrived after its originating context was replaced or torn down.
    #[error("stale callback discarded")]
    StaleCallback,

    #[error("media library {root:?} is unavailable")]
    LibraryUnavailable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch media library: {0}")]
    Watch(#[from] notify::Error),
}

pub type GalleryResult<T> = Result<T, GalleryError>;
