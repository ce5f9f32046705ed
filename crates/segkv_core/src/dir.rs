//! Store directory layout.
//!
//! A store lives in a single directory:
//!
//! ```text
//! <dir>/
//! ├─ LOCK               # Advisory lock for exclusive access
//! ├─ segment-0001       # Segment files, zero-padded 4-digit numbers
//! ├─ segment-0002
//! └─ segment-0003.merge # Compaction temporary (ignored by scans)
//! ```

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Filename prefix shared by segment files and merge temporaries.
pub const SEGMENT_PREFIX: &str = "segment-";
/// Suffix marking a compaction temporary.
pub const MERGE_SUFFIX: &str = ".merge";
/// Advisory lock file.
const LOCK_FILE: &str = "LOCK";

/// Returns the path of the segment file with the given number.
#[must_use]
pub fn segment_path(dir: &Path, number: u32) -> PathBuf {
    dir.join(format!("{SEGMENT_PREFIX}{number:04}"))
}

/// Returns the path of the merge temporary with the given number.
#[must_use]
pub fn merge_path(dir: &Path, number: u32) -> PathBuf {
    dir.join(format!("{SEGMENT_PREFIX}{number:04}{MERGE_SUFFIX}"))
}

/// Parses the number out of a segment filename.
///
/// Merge temporaries and names that don't follow the segment naming scheme
/// yield `None` and are ignored by directory scans.
#[must_use]
pub fn parse_segment_number(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(SEGMENT_PREFIX)?;
    if digits.ends_with(MERGE_SUFFIX) {
        return None;
    }
    digits.parse().ok()
}

/// Lists segment files in the directory, ascending by number.
pub fn list_segments(dir: &Path) -> StoreResult<Vec<(u32, PathBuf)>> {
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(number) = parse_segment_number(name) {
            segments.push((number, entry.path()));
        }
    }
    segments.sort_by_key(|(number, _)| *number);
    Ok(segments)
}

/// Deletes merge temporaries left behind by an interrupted compaction.
pub fn remove_merge_residue(dir: &Path) -> StoreResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(SEGMENT_PREFIX) && name.ends_with(MERGE_SUFFIX) {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Acquires the exclusive advisory lock on the store directory.
///
/// The lock is released when the returned file handle is dropped.
pub fn lock_dir(dir: &Path) -> StoreResult<File> {
    let lock_path = dir.join(LOCK_FILE);
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(StoreError::Locked);
    }

    Ok(lock_file)
}
