//! Container metadata extraction via FFprobe
//!
//! Only the container-level ("format") tags are consulted; per-stream tags
//! are ignored so that a track's encoding date never overrides the file's
//! own creation date.

use super::zone::parse_offset;
use super::{Confidence, RawTimestamp, TimestampSource};
use crate::config::MediaFamily;
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace, warn};

/// Metadata keys to try for creation date, in priority order
const CREATION_DATE_KEYS: &[&str] = &[
    "com.apple.quicktime.creationdate",
    "creation_time",
    "encoded_date",
    "tagged_date",
    "file_creation_date",
    "file_modification_date",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Reads creation dates from media container metadata with `ffprobe`
#[derive(Debug, Clone)]
pub struct ContainerSource {
    program: PathBuf,
    available: bool,
}

impl ContainerSource {
    /// Probe `program` once; an unavailable ffprobe disables this tier
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let available = Command::new(&program).arg("-version").output().is_ok();
        if !available {
            warn!(
                program = %program.display(),
                error = %Error::FfprobeNotFound,
                "Container metadata tier disabled"
            );
        }
        Self { program, available }
    }

    fn probe(&self, path: &Path) -> Result<serde_json::Value> {
        let output = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| Error::ContainerMetadata {
                path: path.to_path_buf(),
                message: format!("Failed to execute ffprobe: {}", e),
            })?;

        if !output.status.success() {
            return Err(Error::ContainerMetadata {
                path: path.to_path_buf(),
                message: format!(
                    "FFprobe failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        trace!(?path, "FFprobe output: {}", json_str);

        serde_json::from_str(&json_str).map_err(|e| Error::ContainerMetadata {
            path: path.to_path_buf(),
            message: format!("Failed to parse FFprobe JSON: {}", e),
        })
    }
}

impl TimestampSource for ContainerSource {
    fn name(&self) -> &'static str {
        "container"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Container
    }

    fn applies_to(&self, _family: MediaFamily) -> bool {
        true
    }

    fn read(&self, path: &Path) -> Result<Option<RawTimestamp>> {
        if !self.available {
            return Ok(None);
        }
        let json = self.probe(path)?;
        Ok(find_creation_time(&json, path))
    }
}

/// Tag names compare case-insensitively, ignoring punctuation
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Pick the first usable creation date from ffprobe's `format.tags`
pub fn find_creation_time(json: &serde_json::Value, path: &Path) -> Option<RawTimestamp> {
    let tags = json.get("format")?.get("tags")?.as_object()?;

    for key in CREATION_DATE_KEYS {
        let wanted = normalize_key(key);
        let Some(value) = tags
            .iter()
            .find(|(name, _)| normalize_key(name) == wanted)
            .and_then(|(_, value)| value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            continue;
        };

        match parse_container_datetime(value) {
            Some(timestamp) => {
                debug!(?path, key, value, "Found container creation time");
                return Some(timestamp);
            }
            None => warn!(?path, key, value, "Cannot parse container date, trying next field"),
        }
    }

    None
}

/// Parse an ISO-8601-like container date
///
/// Handles RFC 3339, `T` or space separators, optional fractional seconds,
/// `Z` / `±hh:mm` / `±hhmm` offsets, MediaInfo's `UTC ` prefix and bare dates.
pub fn parse_container_datetime(s: &str) -> Option<RawTimestamp> {
    let mut s = s.trim();
    let mut utc_marker = false;
    if let Some(rest) = s.strip_prefix("UTC ") {
        s = rest.trim();
        utc_marker = true;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(RawTimestamp::Zoned(dt));
    }

    if let Some(body) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return parse_naive(body.trim_end())
            .map(|naive| RawTimestamp::Zoned(naive.and_utc().fixed_offset()));
    }

    if let Some((body, offset)) = split_offset(s)
        && let Some(naive) = parse_naive(body)
    {
        return naive
            .and_local_timezone(offset)
            .single()
            .map(RawTimestamp::Zoned);
    }

    let naive = parse_naive(s)?;
    if utc_marker {
        Some(RawTimestamp::Zoned(naive.and_utc().fixed_offset()))
    } else {
        Some(RawTimestamp::Naive(naive))
    }
}

/// Split a trailing `±hh:mm` / `±hhmm` / `±hh` offset off a time value
fn split_offset(s: &str) -> Option<(&str, chrono::FixedOffset)> {
    // The offset sign must follow the time part, not the date dashes
    let time_start = s.find(['T', ' '])?;
    let sign_at = s[time_start..].rfind(['+', '-'])? + time_start;
    let offset = parse_offset(s[sign_at..].trim())?;
    Some((s[..sign_at].trim_end(), offset))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
