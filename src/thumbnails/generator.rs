//! Thumbnail generation using the image crate.
//!
//! Grid cells are square, so thumbnails are rendered aspect-fill: the source
//! is scaled to cover the target square and the overflow is cropped away.
//! Video assets are rendered from a poster frame extracted with ffmpeg.

use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

use super::Thumbnail;
use crate::models::MediaKind;

/// JPEG quality for thumbnail encoding (0-100).
const JPEG_QUALITY: u8 = 85;

/// Thumbnail generator that creates square, cropped previews.
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    /// Render a thumbnail for `path` no larger than `target` on each side.
    pub fn render(path: &Path, kind: MediaKind, target: u32) -> Result<Thumbnail> {
        debug!(?path, target, "Generating thumbnail");

        let img = Self::load_source(path, kind)?;
        let thumbnail = Self::fill_square(&img, target);
        let (width, height) = thumbnail.dimensions();

        Ok(Thumbnail::new(
            thumbnail.to_rgba8().into_raw(),
            width.max(1),
            height.max(1),
        ))
    }

    /// Load the image to thumbnail, using a poster frame for videos.
    fn load_source(path: &Path, kind: MediaKind) -> Result<DynamicImage> {
        match kind {
            MediaKind::Image => {
                image::open(path).with_context(|| format!("Failed to load image: {:?}", path))
            }
            MediaKind::Video => Self::decode_video_frame(path)
                .ok_or_else(|| anyhow!("Failed to extract video frame: {:?}", path)),
        }
    }

    /// Scale `img` to cover a square and crop the overflow, never upscaling.
    fn fill_square(img: &DynamicImage, target: u32) -> DynamicImage {
        let (src_width, src_height) = img.dimensions();
        let edge = Self::fill_edge(src_width, src_height, target);
        img.resize_to_fill(edge, edge, FilterType::CatmullRom)
    }

    /// Edge length of the square thumbnail for a source of the given size.
    fn fill_edge(src_width: u32, src_height: u32, target: u32) -> u32 {
        let shortest = src_width.min(src_height);
        if shortest == 0 {
            return target.max(1);
        }
        target.min(shortest).max(1)
    }

    fn decode_video_frame(path: &Path) -> Option<DynamicImage> {
        // Many clips open on a black frame, so try one second in first.
        Self::ffmpeg_extract_frame(path, "00:00:01.000")
            .or_else(|| Self::ffmpeg_extract_frame(path, "00:00:00.000"))
    }

    fn ffmpeg_extract_frame(path: &Path, timestamp: &str) -> Option<DynamicImage> {
        let output = Command::new("ffmpeg")
            .arg("-v")
            .arg("error")
            .arg("-ss")
            .arg(timestamp)
            .arg("-i")
            .arg(path)
            .arg("-frames:v")
            .arg("1")
            .arg("-f")
            .arg("image2pipe")
            .arg("-vcodec")
            .arg("png")
            .arg("-")
            .output()
            .ok()?;

        if !output.status.success() || output.stdout.is_empty() {
            return None;
        }

        image::load_from_memory(&output.stdout).ok()
    }

    /// Save a thumbnail to disk as JPEG for the disk cache layer.
    pub fn save_jpeg(thumbnail: &Thumbnail, dst: &Path) -> Result<()> {
        use image::codecs::jpeg::JpegEncoder;
        use std::fs::File;
        use std::io::BufWriter;

        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create thumbnail directory: {:?}", parent))?;
        }

        let rgba = image::RgbaImage::from_raw(
            thumbnail.width,
            thumbnail.height,
            thumbnail.rgba.to_vec(),
        )
        .ok_or_else(|| anyhow!("Thumbnail buffer does not match its dimensions"))?;

        let file = File::create(dst)
            .with_context(|| format!("Failed to create thumbnail file: {:?}", dst))?;
        let mut writer = BufWriter::new(file);

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        rgb.write_with_encoder(encoder)
            .with_context(|| format!("Failed to encode thumbnail: {:?}", dst))?;

        debug!(?dst, "Saved thumbnail");
        Ok(())
    }

    /// Load a previously saved thumbnail.
    pub fn load_jpeg(src: &Path) -> Result<Thumbnail> {
        let img =
            image::open(src).with_context(|| format!("Failed to load thumbnail: {:?}", src))?;
        let (width, height) = img.dimensions();
        Ok(Thumbnail::new(img.to_rgba8().into_raw(), width, height))
    }
}
