//! Video metadata probing via ffprobe.

use std::path::Path;
use std::process::Command;

use tracing::trace;

/// Duration of a video in seconds, or `None` when ffprobe is unavailable or
/// the container does not report one.
pub fn video_duration(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        trace!(?path, "ffprobe reported no duration");
        return None;
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("65.250000\n"), Some(65.25));
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration("0.000000"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_missing_file_has_no_duration() {
        assert_eq!(video_duration(Path::new("/no/such/clip.mp4")), None);
    }
}
