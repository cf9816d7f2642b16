//! Media Sorter - chronological photo and video organization
//!
//! This library moves media files into two numbered folders under an output
//! root, ordered by capture time:
//! - `IMG/IMG_0000.jpg`, ... for files dated by EXIF metadata
//! - `RND/RND_0000.mp4`, ... for files dated by container metadata or
//!   file system modification time
//!
//! Optional backups, dry-run simulation and removal of emptied input
//! folders are supported.

pub mod cli;
pub mod config;
pub mod error;
pub mod fsops;
pub mod place;
pub mod process;
pub mod scan;
pub mod sequence;
pub mod time;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use cli::Cli;
pub use config::{Config, ConfigError, MediaFamily};
pub use error::{Error, Result};
pub use process::{FileResult, ProcessingStatus, Processor, RunSummary};
pub use sequence::{Bucket, PlacementPlan};
pub use time::{Confidence, ResolvedTimestamp, Resolver, TimestampSource, ZonePolicy};
