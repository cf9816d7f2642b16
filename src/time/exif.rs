//! EXIF time extraction for images

use super::{Confidence, RawTimestamp, TimestampSource};
use crate::config::MediaFamily;
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{trace, warn};

/// EXIF tags to try for date extraction, in priority order
const DATE_TAGS: &[Tag] = &[
    Tag::DateTimeOriginal, // When the original image was taken
    Tag::DateTime,         // File modification date/time
];

/// Accepted EXIF date layouts
const EXIF_FORMATS: &[&str] = &["%Y:%m:%d %H:%M:%S", "%Y:%m:%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Reads the capture time embedded in an image's EXIF block
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifSource;

impl TimestampSource for ExifSource {
    fn name(&self) -> &'static str {
        "exif"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Exif
    }

    fn applies_to(&self, family: MediaFamily) -> bool {
        family == MediaFamily::Image
    }

    fn read(&self, path: &Path) -> Result<Option<RawTimestamp>> {
        Ok(extract_exif_time(path)?.map(RawTimestamp::Naive))
    }
}

/// Extract creation time from EXIF metadata
///
/// Returns `Ok(None)` when the image has no EXIF block or no parseable date tag.
pub fn extract_exif_time(path: &Path) -> Result<Option<NaiveDateTime>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(container)) => {
            trace!(?path, container, "No EXIF block");
            return Ok(None);
        }
        Err(e) => {
            return Err(Error::ExifRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    };

    for tag in DATE_TAGS {
        let Some(field) = exif.get_field(*tag, In::PRIMARY) else {
            continue;
        };
        let Some(raw) = ascii_value(&field.value) else {
            warn!(?path, %tag, "EXIF date tag is not a text value");
            continue;
        };
        match parse_exif_datetime(&raw) {
            Some(datetime) => {
                trace!(?path, %tag, %datetime, "Found EXIF date");
                return Ok(Some(datetime));
            }
            None => warn!(?path, %tag, value = %raw, "Unsupported EXIF datetime format"),
        }
    }

    Ok(None)
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Parse an EXIF datetime string such as "2024:01:15 14:30:00"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches(|c| c == '"' || c == '\0');

    EXIF_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{exif_jpeg, naive};
    use chrono::{Datelike, Timelike};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_exif_datetime() {
        // Standard EXIF format
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);

        // Without seconds
        let dt = parse_exif_datetime("2024:01:15 14:30").unwrap();
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);

        // With quotes
        let dt = parse_exif_datetime("\"2024:01:15 14:30:00\"").unwrap();
        assert_eq!(dt.year(), 2024);

        // Dash-delimited date
        let dt = parse_exif_datetime("2024-01-15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);

        // Invalid format
        assert!(parse_exif_datetime("invalid").is_none());
        assert!(parse_exif_datetime("    :  :     :  :  ").is_none());
        assert!(parse_exif_datetime("2024-01-15T14:30:00").is_none());
    }

    #[test]
    fn test_prefers_date_time_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("both.jpg");
        fs::write(
            &path,
            exif_jpeg(Some("2021:05:05 05:05:05"), Some("2020:01:02 10:00:00")),
        )
        .unwrap();

        let dt = extract_exif_time(&path).unwrap().unwrap();
        assert_eq!(dt, naive(2020, 1, 2, 10, 0, 0));
    }

    #[test]
    fn test_malformed_original_falls_back_to_date_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd.jpg");
        fs::write(
            &path,
            exif_jpeg(Some("2021:05:05 05:05:05"), Some("sometime in May")),
        )
        .unwrap();

        let dt = extract_exif_time(&path).unwrap().unwrap();
        assert_eq!(dt, naive(2021, 5, 5, 5, 5, 5));
    }

    #[test]
    fn test_jpeg_without_exif() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.jpg");
        fs::write(&path, [0xff, 0xd8, 0xff, 0xd9]).unwrap();

        assert!(extract_exif_time(&path).unwrap().is_none());
    }

    #[test]
    fn test_unreadable_image_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("text.png");
        fs::write(&path, b"definitely not an image").unwrap();

        assert!(matches!(
            extract_exif_time(&path),
            Err(Error::ExifRead { .. })
        ));
    }

    #[test]
    fn test_source_reports_naive_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, exif_jpeg(Some("2020:01:02 10:00:00"), None)).unwrap();

        let raw = ExifSource.read(&path).unwrap();
        assert_eq!(raw, Some(RawTimestamp::Naive(naive(2020, 1, 2, 10, 0, 0))));
        assert!(ExifSource.applies_to(MediaFamily::Image));
        assert!(!ExifSource.applies_to(MediaFamily::Video));
    }
}
