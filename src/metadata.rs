//! Capture-date extraction for photos and videos.
//!
//! Photos are read with `kamadak-exif` (`DateTimeOriginal`), videos through
//! an external `ffprobe` process (`format.tags.creation_time`). Both fall
//! back to the filesystem timestamp, so callers always get a date.

use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Tag, Value};
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

/// Format of the EXIF `DateTimeOriginal` tag.
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Format of ffprobe's `creation_time` tag (UTC, fractional seconds).
pub const FFPROBE_CREATION_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Default name of the probing program, looked up on `PATH`.
pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// Source of capture timestamps.
///
/// Implementations never fail: when nothing better is available they return
/// the filesystem timestamp.
pub trait MetadataReader {
    /// Capture time of a photo.
    fn image_timestamp(&self, path: &Path) -> NaiveDateTime;

    /// Creation time of a video.
    fn video_timestamp(&self, path: &Path) -> NaiveDateTime;
}

/// Reads EXIF tags directly and asks `ffprobe` about videos.
#[derive(Debug, Clone)]
pub struct MediaMetadataReader {
    ffprobe: PathBuf,
}

impl MediaMetadataReader {
    /// Creates a reader that runs the given ffprobe program.
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    fn container_creation_time(&self, path: &Path) -> Result<NaiveDateTime, String> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| format!("failed to run {}: {}", self.ffprobe.display(), e))?;

        if !output.status.success() {
            return Err(format!("{} exited with {}", self.ffprobe.display(), output.status));
        }

        parse_ffprobe_output(&output.stdout)
    }
}

impl Default for MediaMetadataReader {
    fn default() -> Self {
        Self::new(DEFAULT_FFPROBE)
    }
}

impl MetadataReader for MediaMetadataReader {
    fn image_timestamp(&self, path: &Path) -> NaiveDateTime {
        match read_exif_datetime(path) {
            Ok(timestamp) => {
                trace!(path = %path.display(), %timestamp, "using EXIF capture date");
                timestamp
            }
            Err(reason) => {
                debug!(path = %path.display(), %reason, "no EXIF capture date, using filesystem time");
                filesystem_timestamp(path)
            }
        }
    }

    fn video_timestamp(&self, path: &Path) -> NaiveDateTime {
        match self.container_creation_time(path) {
            Ok(timestamp) => {
                trace!(path = %path.display(), %timestamp, "using container creation time");
                timestamp
            }
            Err(reason) => {
                debug!(path = %path.display(), %reason, "no container creation time, using filesystem time");
                filesystem_timestamp(path)
            }
        }
    }
}

/// Reads and parses the EXIF `DateTimeOriginal` tag of an image.
pub fn read_exif_datetime(path: &Path) -> Result<NaiveDateTime, String> {
    let file = File::open(path).map_err(|e| format!("failed to open file: {}", e))?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| format!("failed to read EXIF data: {}", e))?;

    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .ok_or_else(|| "DateTimeOriginal tag missing".to_string())?;

    match &field.value {
        Value::Ascii(values) => {
            let raw = values
                .first()
                .ok_or_else(|| "DateTimeOriginal tag is empty".to_string())?;
            let text = std::str::from_utf8(raw)
                .map_err(|e| format!("DateTimeOriginal is not text: {}", e))?;
            parse_exif_datetime(text)
        }
        other => Err(format!("unexpected DateTimeOriginal value: {:?}", other)),
    }
}

/// Parses an EXIF date such as `2023:05:14 10:30:00`.
///
/// # Examples
///
/// ```
/// use mediasort::metadata::parse_exif_datetime;
///
/// let timestamp = parse_exif_datetime("2023:05:14 10:30:00").unwrap();
/// assert_eq!(timestamp.format("%Y/%m").to_string(), "2023/05");
/// ```
pub fn parse_exif_datetime(text: &str) -> Result<NaiveDateTime, String> {
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(text, EXIF_DATETIME_FORMAT)
        .map_err(|e| format!("invalid EXIF date '{}': {}", text, e))
}

/// Extracts `format.tags.creation_time` from ffprobe's JSON output.
pub fn parse_ffprobe_output(stdout: &[u8]) -> Result<NaiveDateTime, String> {
    let json: JsonValue =
        serde_json::from_slice(stdout).map_err(|e| format!("JSON parse error: {}", e))?;

    let creation_time = json["format"]["tags"]["creation_time"]
        .as_str()
        .ok_or_else(|| "missing 'format.tags.creation_time'".to_string())?;

    NaiveDateTime::parse_from_str(creation_time, FFPROBE_CREATION_TIME_FORMAT)
        .map_err(|e| format!("invalid creation_time '{}': {}", creation_time, e))
}

/// Creation time of a file, in local time.
///
/// Uses the modification time on filesystems without a creation time, and
/// the current time if the file's metadata cannot be read at all.
pub fn filesystem_timestamp(path: &Path) -> NaiveDateTime {
    let time = std::fs::metadata(path).and_then(|meta| meta.created().or_else(|_| meta.modified()));

    match time {
        Ok(time) => DateTime::<Local>::from(time).naive_local(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no filesystem timestamp, using current time");
            Local::now().naive_local()
        }
    }
}
