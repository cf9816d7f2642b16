//! Chronological ordering and per-bucket numbering

use crate::time::{Confidence, ResolvedTimestamp};
use std::path::Path;

/// Output category of a resolved file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// EXIF-dated photos
    Exif,
    /// Container or file system dated files
    Fallback,
}

impl Bucket {
    pub fn for_confidence(confidence: Confidence) -> Self {
        match confidence {
            Confidence::Exif => Bucket::Exif,
            Confidence::Container | Confidence::FileSystem => Bucket::Fallback,
        }
    }

    /// Prefix of generated file names
    pub fn prefix(&self) -> &'static str {
        match self {
            Bucket::Exif => "IMG",
            Bucket::Fallback => "RND",
        }
    }

    /// Subfolder of the output root
    pub fn folder_name(&self) -> &'static str {
        self.prefix()
    }
}

/// A file with its bucket and position in that bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPlan {
    pub record: ResolvedTimestamp,
    pub bucket: Bucket,
    pub sequence: usize,
}

impl PlacementPlan {
    /// `IMG_0007.jpg`; the index widens past four digits when needed
    pub fn file_name(&self) -> String {
        format!(
            "{}_{:04}{}",
            self.bucket.prefix(),
            self.sequence,
            lowercase_extension(&self.record.path)
        )
    }
}

/// Extension with its leading dot, lowercased; empty if there is none
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Order records by timestamp and number them within their bucket
///
/// The sort is stable: records with equal timestamps keep discovery order.
/// Plans are returned in global chronological order.
pub fn sequence(mut records: Vec<ResolvedTimestamp>) -> Vec<PlacementPlan> {
    records.sort_by_key(|record| record.timestamp);

    let mut exif_count = 0usize;
    let mut fallback_count = 0usize;

    records
        .into_iter()
        .map(|record| {
            let bucket = Bucket::for_confidence(record.confidence);
            let counter = match bucket {
                Bucket::Exif => &mut exif_count,
                Bucket::Fallback => &mut fallback_count,
            };
            let sequence = *counter;
            *counter += 1;
            PlacementPlan {
                record,
                bucket,
                sequence,
            }
        })
        .collect()
}
