//! Shared fixtures for unit tests

use crate::config::MediaFamily;
use crate::error::{Error, Result};
use crate::time::container::parse_container_datetime;
use crate::time::{Confidence, RawTimestamp, TimestampSource};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::path::Path;

pub fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn set_mtime(path: &Path, when: DateTime<Utc>) {
    let time = filetime::FileTime::from_unix_time(when.timestamp(), 0);
    filetime::set_file_mtime(path, time).unwrap();
}

fn ascii(s: &str) -> Vec<u8> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

fn ifd_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(&kind.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&value.to_be_bytes());
}

/// Big-endian TIFF block with `DateTime` in IFD0 and
/// `DateTimeOriginal` in the Exif sub-IFD
fn exif_tiff(date_time: Option<&str>, original: Option<&str>) -> Vec<u8> {
    const ASCII: u16 = 2;
    const LONG: u16 = 4;

    let ifd0_offset = 8usize;
    let ifd0_count = usize::from(date_time.is_some()) + usize::from(original.is_some());
    let exif_ifd_offset = ifd0_offset + 2 + 12 * ifd0_count + 4;
    let exif_ifd_len = if original.is_some() { 2 + 12 + 4 } else { 0 };
    let mut data_offset = exif_ifd_offset + exif_ifd_len;

    let mut out = b"MM\x00\x2a".to_vec();
    out.extend_from_slice(&(ifd0_offset as u32).to_be_bytes());
    let mut data = Vec::new();

    out.extend_from_slice(&(ifd0_count as u16).to_be_bytes());
    if let Some(value) = date_time {
        let bytes = ascii(value);
        ifd_entry(&mut out, 0x0132, ASCII, bytes.len() as u32, data_offset as u32);
        data_offset += bytes.len();
        data.extend(bytes);
    }
    if original.is_some() {
        ifd_entry(&mut out, 0x8769, LONG, 1, exif_ifd_offset as u32);
    }
    out.extend_from_slice(&0u32.to_be_bytes());

    if let Some(value) = original {
        let bytes = ascii(value);
        out.extend_from_slice(&1u16.to_be_bytes());
        ifd_entry(&mut out, 0x9003, ASCII, bytes.len() as u32, data_offset as u32);
        out.extend_from_slice(&0u32.to_be_bytes());
        data.extend(bytes);
    }

    out.extend(data);
    out
}

/// Minimal JPEG carrying only an APP1 Exif segment
pub fn exif_jpeg(date_time: Option<&str>, original: Option<&str>) -> Vec<u8> {
    let tiff = exif_tiff(date_time, original);
    let mut out = vec![0xff, 0xd8, 0xff, 0xe1];
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend(tiff);
    out.extend_from_slice(&[0xff, 0xd9]);
    out
}

/// Scripted timestamp source keyed by file name
pub struct FakeSource {
    name: &'static str,
    confidence: Confidence,
    families: Vec<MediaFamily>,
    answers: HashMap<String, String>,
    fail: bool,
}

impl FakeSource {
    pub fn exif() -> Self {
        Self {
            name: "fake-exif",
            confidence: Confidence::Exif,
            families: vec![MediaFamily::Image],
            answers: HashMap::new(),
            fail: false,
        }
    }

    pub fn container() -> Self {
        Self {
            name: "fake-container",
            confidence: Confidence::Container,
            families: vec![MediaFamily::Image, MediaFamily::Video],
            answers: HashMap::new(),
            fail: false,
        }
    }

    pub fn answering(mut self, file_name: &str, value: &str) -> Self {
        self.answers.insert(file_name.to_string(), value.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl TimestampSource for FakeSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn confidence(&self) -> Confidence {
        self.confidence
    }

    fn applies_to(&self, family: MediaFamily) -> bool {
        self.families.contains(&family)
    }

    fn read(&self, path: &Path) -> Result<Option<RawTimestamp>> {
        if self.fail {
            return Err(Error::ContainerMetadata {
                path: path.to_path_buf(),
                message: "scripted failure".into(),
            });
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok(self
            .answers
            .get(name)
            .and_then(|value| parse_container_datetime(value)))
    }
}
