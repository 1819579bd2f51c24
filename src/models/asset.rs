use std::fmt;
use std::path::{Path, PathBuf};

use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif" => Some(Self::Image),
            "webm" | "mp4" | "mkv" | "avi" | "mov" | "m4v" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Stable identity of an asset across snapshots.
///
/// Derived from the asset's path, so a file keeps its id while it moves
/// around inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

impl AssetId {
    pub fn from_path(path: &Path) -> Self {
        Self(xxh3_64(path.to_string_lossy().as_bytes()))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: AssetId,
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Modification time in seconds since the epoch; doubles as capture time.
    pub mtime: i64,
    pub size: i64,
    /// Playback length in seconds, `None` for stills.
    pub duration: Option<f64>,
}

impl Asset {
    pub fn new(path: PathBuf, kind: MediaKind, mtime: i64, size: i64) -> Self {
        Self {
            id: AssetId::from_path(&path),
            path,
            kind,
            mtime,
            size,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("JPG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("mov"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("txt"), None);
        assert_eq!(
            MediaKind::from_path(Path::new("/a/clip.MP4")),
            Some(MediaKind::Video)
        );
        assert_eq!(MediaKind::from_path(Path::new("/a/noext")), None);
    }

    #[test]
    fn test_asset_id_is_stable_per_path() {
        let a = Asset::new("/p/a.jpg".into(), MediaKind::Image, 1, 10);
        let b = Asset::new("/p/a.jpg".into(), MediaKind::Image, 99, 20);
        let c = Asset::new("/p/c.jpg".into(), MediaKind::Image, 1, 10);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.to_string().len(), 16);
    }
}
