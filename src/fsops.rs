//! Byte-level file operations: metadata-preserving copy and safe move

use crate::error::Result;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Copy `source` to `dest`, keeping permissions and access/modification times
pub fn copy_preserving(source: &Path, dest: &Path) -> Result<()> {
    let metadata = fs::metadata(source)?;
    copy_file(source, dest)?;

    fs::set_permissions(dest, metadata.permissions())?;
    let atime = filetime::FileTime::from_last_access_time(&metadata);
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(dest, atime, mtime)?;
    Ok(())
}

/// Move `source` to `dest`
///
/// Tries an atomic rename first; when that fails (for example across file
/// systems) falls back to copy + delete.
pub fn move_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(?source, ?dest, error = %e, "Rename failed, copying instead");
            copy_then_delete(source, dest, |path| fs::remove_file(path))
        }
    }
}

/// Copy `source` to `dest`, then delete `source` with `remove_source`
///
/// On any failure `dest` is removed again, so the file exists in exactly
/// one place afterwards.
fn copy_then_delete<F>(source: &Path, dest: &Path, remove_source: F) -> Result<()>
where
    F: FnOnce(&Path) -> std::io::Result<()>,
{
    if let Err(e) = copy_preserving(source, dest) {
        let _ = fs::remove_file(dest);
        return Err(e);
    }
    if let Err(e) = remove_source(source) {
        warn!(?source, ?dest, error = %e, "Cannot delete source after copy, removing copy");
        if let Err(cleanup) = fs::remove_file(dest) {
            warn!(?dest, error = %cleanup, "Cannot remove copy, file now exists twice");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Copy file with buffered I/O for efficiency
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source)?;
    let dest_file = File::create(dest)?;

    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    let mut buffer = vec![0u8; 256 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    Ok(())
}
