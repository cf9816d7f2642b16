//! Capture time resolution
//!
//! Every candidate file gets exactly one UTC timestamp and a confidence tag.
//! Sources are tried in a fixed priority order, first success wins:
//! 1. EXIF metadata (images)
//! 2. Container metadata via FFprobe (images and videos)
//! 3. File system modification time
//!
//! A failing source never aborts a file; only a failed `stat` in the last
//! tier drops it from the run.

pub mod container;
pub mod exif;
pub mod zone;

pub use container::ContainerSource;
pub use exif::ExifSource;
pub use zone::{RawTimestamp, ZonePolicy};

use crate::config::{Config, MediaFamily};
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How much a resolved timestamp can be trusted, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    /// File system modification time
    FileSystem,
    /// Media container metadata
    Container,
    /// Embedded photo metadata
    Exif,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::FileSystem => "FILESYSTEM",
            Confidence::Container => "CONTAINER",
            Confidence::Exif => "EXIF",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file with its resolved capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub confidence: Confidence,
}

/// One metadata tier of the resolver
pub trait TimestampSource {
    /// Short name used in log events
    fn name(&self) -> &'static str;

    /// Confidence attached to timestamps from this source
    fn confidence(&self) -> Confidence;

    /// Whether files of this family are worth asking
    fn applies_to(&self, family: MediaFamily) -> bool;

    /// `Ok(None)` when the file carries no usable value,
    /// `Err` when the metadata could not be read at all
    fn read(&self, path: &Path) -> Result<Option<RawTimestamp>>;
}

/// Resolves capture timestamps through the prioritized sources
pub struct Resolver {
    config: Config,
    sources: Vec<Box<dyn TimestampSource>>,
    assumed_offset: FixedOffset,
}

impl Resolver {
    /// Build the standard EXIF → container → file system chain
    pub fn new(config: &Config) -> Result<Self> {
        let zone = config.zone_policy()?;
        let sources: Vec<Box<dyn TimestampSource>> = vec![
            Box::new(ExifSource),
            Box::new(ContainerSource::new(&config.ffprobe)),
        ];
        Ok(Self::with_sources(config, sources, zone))
    }

    /// Build a resolver over custom sources, highest confidence first
    pub fn with_sources(
        config: &Config,
        sources: Vec<Box<dyn TimestampSource>>,
        zone: ZonePolicy,
    ) -> Self {
        let assumed_offset = zone.assumed_offset();
        info!(
            zone = %zone,
            offset = %assumed_offset,
            "Timestamps without offset are read in this zone"
        );

        Self {
            config: config.clone(),
            sources,
            assumed_offset,
        }
    }

    /// Resolve one file; fails only if its modification time is unreadable
    pub fn resolve(&self, path: &Path) -> Result<ResolvedTimestamp> {
        if let Some(family) = self.config.family_of(path) {
            for source in self.sources.iter().filter(|s| s.applies_to(family)) {
                match source.read(path) {
                    Ok(Some(raw)) => {
                        let Some(timestamp) = zone::to_utc(raw, self.assumed_offset) else {
                            warn!(
                                ?path,
                                source = source.name(),
                                ?raw,
                                "Timestamp out of range, falling back"
                            );
                            continue;
                        };
                        debug!(
                            ?path,
                            source = source.name(),
                            %timestamp,
                            "Resolved capture time"
                        );
                        return Ok(ResolvedTimestamp {
                            path: path.to_path_buf(),
                            timestamp,
                            confidence: source.confidence(),
                        });
                    }
                    Ok(None) => {
                        debug!(?path, source = source.name(), "No timestamp found, falling back");
                    }
                    Err(e) => {
                        warn!(
                            ?path,
                            source = source.name(),
                            error = %e,
                            "Metadata unreadable, falling back"
                        );
                    }
                }
            }
        }

        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| Error::Stat {
                path: path.to_path_buf(),
                source: e,
            })?;
        let timestamp: DateTime<Utc> = modified.into();

        info!(?path, %timestamp, "Using file system modification time as fallback");

        Ok(ResolvedTimestamp {
            path: path.to_path_buf(),
            timestamp,
            confidence: Confidence::FileSystem,
        })
    }
}
