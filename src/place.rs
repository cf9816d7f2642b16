//! Destination naming, backup, move and dry-run simulation

use crate::fsops::{copy_preserving, move_file};
use crate::process::{FileResult, ProcessingStatus};
use crate::sequence::PlacementPlan;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Tracks which paths are taken, against the live file system
///
/// In dry-run mode the paths a real run would have created are remembered,
/// so simulated and real runs pick the same disambiguated names.
#[derive(Debug, Default)]
pub struct Occupancy {
    dry_run: bool,
    simulated: HashSet<PathBuf>,
}

impl Occupancy {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            simulated: HashSet::new(),
        }
    }

    /// Checked live on every call, never cached
    pub fn is_taken(&self, path: &Path) -> bool {
        self.simulated.contains(path) || fs::symlink_metadata(path).is_ok()
    }

    /// Record a path a dry run pretends to have written
    pub fn claim(&mut self, path: &Path) {
        if self.dry_run {
            self.simulated.insert(path.to_path_buf());
        }
    }

    /// `base` if free, else `{stem}_1{ext}`, `{stem}_2{ext}`, ... until one is free
    pub fn unique_path(&self, base: PathBuf) -> PathBuf {
        if !self.is_taken(&base) {
            return base;
        }

        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = base
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let parent = base.parent().map(Path::to_path_buf).unwrap_or_default();

        (1u64..)
            .map(|i| parent.join(format!("{}_{}{}", stem, i, extension)))
            .find(|candidate| !self.is_taken(candidate))
            .unwrap_or(base)
    }
}

/// Places planned files under the output root
pub struct Placer {
    output_dir: PathBuf,
    backup_dir: Option<PathBuf>,
    dry_run: bool,
    occupancy: Occupancy,
}

impl Placer {
    pub fn new(output_dir: &Path, backup_dir: Option<&Path>, dry_run: bool) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            backup_dir: backup_dir.map(Path::to_path_buf),
            dry_run,
            occupancy: Occupancy::new(dry_run),
        }
    }

    /// Back up (if enabled) and move one file; failures are logged, never returned
    pub fn place(&mut self, plan: &PlacementPlan) -> FileResult {
        let source = plan.record.path.as_path();
        let backup = self.backup(source);

        let base = self
            .output_dir
            .join(plan.bucket.folder_name())
            .join(plan.file_name());
        let destination = self.occupancy.unique_path(base);

        let mut result = FileResult {
            source: source.to_path_buf(),
            destination: Some(destination.clone()),
            backup,
            timestamp: Some(plan.record.timestamp),
            confidence: Some(plan.record.confidence),
            status: ProcessingStatus::DryRun,
            error: None,
        };

        if self.dry_run {
            info!(
                ?source,
                ?destination,
                confidence = %plan.record.confidence,
                "[dry run] Would move file"
            );
            self.occupancy.claim(&destination);
            return result;
        }

        match move_file(source, &destination) {
            Ok(()) => {
                info!(
                    ?source,
                    ?destination,
                    confidence = %plan.record.confidence,
                    timestamp = %plan.record.timestamp,
                    "Moved file"
                );
                result.status = ProcessingStatus::Moved;
            }
            Err(e) => {
                error!(?source, ?destination, error = %e, "Failed to move file, leaving it in place");
                result.status = ProcessingStatus::Failed;
                result.error = Some(e.to_string());
            }
        }
        result
    }

    /// Copy the original into the backup directory; `None` when skipped or failed
    fn backup(&mut self, source: &Path) -> Option<PathBuf> {
        let backup_dir = self.backup_dir.clone()?;
        let Some(name) = source.file_name() else {
            warn!(?source, "Source has no file name, skipping backup");
            return None;
        };

        if !self.dry_run
            && let Err(e) = fs::create_dir_all(&backup_dir)
        {
            error!(?backup_dir, error = %e, "Failed to create backup folder, skipping backup");
            return None;
        }

        let target = self.occupancy.unique_path(backup_dir.join(name));

        if self.dry_run {
            info!(?source, backup = ?target, "[dry run] Would back up file");
            self.occupancy.claim(&target);
            return Some(target);
        }

        match copy_preserving(source, &target) {
            Ok(()) => {
                info!(?source, backup = ?target, "Backed up file");
                Some(target)
            }
            Err(e) => {
                error!(?source, backup = ?target, error = %e, "Backup failed");
                let _ = fs::remove_file(&target);
                None
            }
        }
    }
}

/// Remove directories under `root` that are empty, deepest first
///
/// The root itself is kept. Returns the number of removed directories.
pub fn remove_empty_dirs(root: &Path) -> usize {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Cannot inspect directory entry during cleanup");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();

    dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));

    let mut removed = 0;
    for dir in dirs {
        match fs::read_dir(&dir).map(|mut entries| entries.next().is_none()) {
            Ok(true) => match fs::remove_dir(&dir) {
                Ok(()) => {
                    info!(?dir, "Removed empty folder");
                    removed += 1;
                }
                Err(e) => warn!(?dir, error = %e, "Failed to remove folder"),
            },
            Ok(false) => {}
            Err(e) => warn!(?dir, error = %e, "Failed to inspect folder"),
        }
    }
    removed
}
