//! Main file processor
//!
//! Handles the core logic of one run:
//! - Scanning the input directory
//! - Resolving capture timestamps
//! - Ordering and numbering files per confidence bucket
//! - Backing up and moving files to the output tree
//! - Removing input folders left empty

use crate::config::Config;
use crate::error::{Error, Result};
use crate::place::{Placer, remove_empty_dirs};
use crate::scan::scan_input_files;
use crate::sequence::{Bucket, sequence};
use crate::time::{Confidence, Resolver};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::{Level, error, info, span, warn};

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Source file path
    pub source: PathBuf,
    /// Destination file path (computed even when the move fails)
    pub destination: Option<PathBuf>,
    /// Where the original was backed up
    pub backup: Option<PathBuf>,
    /// Resolved capture time
    pub timestamp: Option<DateTime<Utc>>,
    /// Source of the capture time
    pub confidence: Option<Confidence>,
    /// Processing status
    pub status: ProcessingStatus,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl FileResult {
    fn skipped(source: PathBuf, status: ProcessingStatus, error: Option<String>) -> Self {
        Self {
            source,
            destination: None,
            backup: None,
            timestamp: None,
            confidence: None,
            status,
            error,
        }
    }
}

/// Status of file processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// File was moved to its destination
    Moved,
    /// Dry run - would have been moved
    DryRun,
    /// Move failed, file left in place
    Failed,
    /// Modification time unreadable, file dropped before sequencing
    Unreadable,
    /// Extension outside the supported families
    Unsupported,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files that received a timestamp and a placement
    pub total: usize,
    /// Files placed in the EXIF bucket
    pub exif: usize,
    /// Files placed in the fallback bucket
    pub fallback: usize,
    /// Files skipped for their extension
    pub unsupported: usize,
    /// Files dropped because their modification time was unreadable
    pub unreadable: usize,
    /// Files whose move failed
    pub failed: usize,
    /// Originals copied to the backup directory
    pub backups: usize,
    /// Originals whose backup was attempted but not made
    pub backup_failures: usize,
    /// Empty input folders removed
    pub removed_dirs: usize,
    /// Nothing was changed on disk
    pub dry_run: bool,
}

impl RunSummary {
    /// Files that did not end up at a destination
    pub fn skipped(&self) -> usize {
        self.unsupported + self.unreadable + self.failed
    }

    pub fn summary(&self) -> String {
        format!(
            "Total processed: {}, EXIF count: {}, fallback count: {}, skipped: {} (unsupported: {}, unreadable: {}, failed: {})",
            self.total,
            self.exif,
            self.fallback,
            self.skipped(),
            self.unsupported,
            self.unreadable,
            self.failed
        )
    }
}

/// Main processor for organizing media files
pub struct Processor {
    config: Config,
    resolver: Resolver,
    stats: RunSummary,
}

impl Processor {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let resolver = Resolver::new(&config)?;
        Ok(Self::with_resolver(config, resolver))
    }

    /// Create a processor around a prepared resolver
    pub fn with_resolver(config: Config, resolver: Resolver) -> Self {
        Self {
            config,
            resolver,
            stats: RunSummary::default(),
        }
    }

    /// Run the processing pipeline
    pub fn run(&mut self) -> Result<Vec<FileResult>> {
        let _span = span!(Level::INFO, "sort_run", dry_run = self.config.dry_run).entered();

        let mut stats = RunSummary {
            dry_run: self.config.dry_run,
            ..RunSummary::default()
        };
        let mut results = Vec::new();

        if !self.config.input_dir.is_dir() {
            return Err(Error::Config(format!(
                "input directory {} does not exist",
                self.config.input_dir.display()
            )));
        }

        info!(input = ?self.config.input_dir, "Scanning input directory...");
        let scan = scan_input_files(&self.config.input_dir, &self.config)?;
        info!(
            supported = scan.supported.len(),
            unsupported = scan.unsupported.len(),
            "Found files"
        );

        for path in scan.unsupported {
            warn!(?path, "Skipped due to unsupported extension");
            stats.unsupported += 1;
            results.push(FileResult::skipped(path, ProcessingStatus::Unsupported, None));
        }

        // Resolve timestamps
        let mut records = Vec::with_capacity(scan.supported.len());
        for path in scan.supported {
            match self.resolver.resolve(&path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    error!(?path, error = %e, "Cannot determine any timestamp, dropping file");
                    stats.unreadable += 1;
                    results.push(FileResult::skipped(
                        path,
                        ProcessingStatus::Unreadable,
                        Some(e.to_string()),
                    ));
                }
            }
        }

        let plans = sequence(records);
        stats.total = plans.len();
        stats.exif = plans.iter().filter(|p| p.bucket == Bucket::Exif).count();
        stats.fallback = stats.total - stats.exif;

        if !self.config.dry_run {
            for bucket in [Bucket::Exif, Bucket::Fallback] {
                fs::create_dir_all(self.config.output_dir.join(bucket.folder_name()))?;
            }
        }

        let backup_dir = self.config.active_backup_dir();
        let mut placer = Placer::new(&self.config.output_dir, backup_dir, self.config.dry_run);

        info!(count = plans.len(), "Placing files...");
        for plan in &plans {
            let result = placer.place(plan);
            if result.status == ProcessingStatus::Failed {
                stats.failed += 1;
            }
            if backup_dir.is_some() {
                if result.backup.is_some() {
                    stats.backups += 1;
                } else {
                    stats.backup_failures += 1;
                }
            }
            results.push(result);
        }

        if self.config.clean_empty {
            if self.config.dry_run {
                info!("[dry run] Skipping removal of empty input folders");
            } else {
                stats.removed_dirs = remove_empty_dirs(&self.config.input_dir);
            }
        }

        info!("{}", stats.summary());
        self.stats = stats;

        Ok(results)
    }

    /// Get the summary of the last run
    pub fn stats(&self) -> &RunSummary {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
