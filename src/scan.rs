//! Input tree scanning

use crate::config::Config;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files found under the input root, split by extension support
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Candidate media files in discovery order
    pub supported: Vec<PathBuf>,
    /// Regular files with an extension outside both families
    pub unsupported: Vec<PathBuf>,
}

/// Walk `root` and classify every regular file
///
/// Symbolic links are neither followed nor returned. Entries are visited in
/// file-name order so discovery order is reproducible across runs.
pub fn scan_input_files(root: &Path, config: &Config) -> Result<ScanResult> {
    let mut result = ScanResult::default();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Cannot inspect path, skipping");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| config.is_supported(ext));

        if supported {
            result.supported.push(path);
        } else {
            result.unsupported.push(path);
        }
    }

    debug!(
        supported = result.supported.len(),
        unsupported = result.unsupported.len(),
        "Scanned input directory"
    );

    Ok(result)
}
