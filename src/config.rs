//! Runtime configuration assembled from defaults, `PHOTOPICK_*` environment
//! variables and the optional library path given on the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};

const DEFAULT_ALBUM: &str = "DCIM";
const DEFAULT_THUMB_SIZE: u32 = 256;
const DEFAULT_WORKERS: usize = 2;
const MAX_WORKERS: usize = 4;
const DEFAULT_CACHE_MB: usize = 192;
const MIN_CACHE_MB: usize = 64;
const MAX_CACHE_MB: usize = 512;
const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Root directory of the media library.
    pub library_root: PathBuf,
    /// Album directory (relative to the root) preferred over the whole library.
    pub primary_album: String,
    /// Edge length of the square thumbnails requested for grid cells.
    pub thumb_size: u32,
    /// Thumbnail worker threads.
    pub workers: usize,
    /// Memory budget for decoded thumbnails.
    pub cache_mb: usize,
    /// Quiet period before a burst of filesystem events triggers a rescan.
    pub watch_debounce: Duration,
    /// Disk cache directory for generated thumbnails.
    pub cache_dir: PathBuf,
}

impl GalleryConfig {
    /// Load configuration from the environment, letting `library_override` win.
    pub fn load(library_override: Option<&Path>) -> Result<Self> {
        let library_root = match library_override {
            Some(path) => path.to_path_buf(),
            None => env_path("PHOTOPICK_LIBRARY")
                .or_else(default_library_root)
                .context("Failed to determine a media library directory")?,
        };

        Ok(Self {
            library_root,
            primary_album: std::env::var("PHOTOPICK_ALBUM")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_ALBUM.to_string()),
            thumb_size: env_number("PHOTOPICK_THUMB_SIZE").unwrap_or(DEFAULT_THUMB_SIZE),
            workers: env_number("PHOTOPICK_WORKERS")
                .unwrap_or(DEFAULT_WORKERS)
                .clamp(1, MAX_WORKERS),
            cache_mb: env_number("PHOTOPICK_CACHE_MB")
                .unwrap_or(DEFAULT_CACHE_MB)
                .clamp(MIN_CACHE_MB, MAX_CACHE_MB),
            watch_debounce: Duration::from_millis(
                env_number("PHOTOPICK_WATCH_DEBOUNCE_MS").unwrap_or(DEFAULT_WATCH_DEBOUNCE_MS),
            ),
            cache_dir: default_cache_dir()?,
        })
    }

    /// Configuration rooted at `library_root` with default tuning, caching under `cache_dir`.
    pub fn for_library(library_root: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            library_root,
            primary_album: DEFAULT_ALBUM.to_string(),
            thumb_size: DEFAULT_THUMB_SIZE,
            workers: DEFAULT_WORKERS,
            cache_mb: DEFAULT_CACHE_MB,
            watch_debounce: Duration::from_millis(DEFAULT_WATCH_DEBOUNCE_MS),
            cache_dir,
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_number<T: std::str::FromStr + PartialOrd + Default>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

fn default_library_root() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(
        dirs.picture_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dirs.home_dir().to_path_buf()),
    )
}

/// `XDG_CACHE_HOME/photopick/thumbs`.
pub fn default_cache_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "photopick")
        .context("Failed to determine project directories")?;
    Ok(proj_dirs.cache_dir().join("thumbs"))
}
