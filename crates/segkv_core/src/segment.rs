//! Segment files.
//!
//! A segment is one append-only file, a contiguous slice of the write
//! history. The highest-numbered segment is the only one that receives
//! appends; all others are sealed until compaction deletes them.

use crate::dir;
use crate::error::StoreResult;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// An open segment with its single append handle.
///
/// Reads never go through this handle; each read opens a transient handle
/// on [`Segment::path`] instead.
#[derive(Debug)]
pub struct Segment {
    number: u32,
    path: PathBuf,
    file: File,
    append_offset: u64,
}

impl Segment {
    /// Creates (or reopens) the segment with the given number in `dir`.
    pub fn create(dir: &Path, number: u32) -> StoreResult<Self> {
        Self::open_at(number, dir::segment_path(dir, number))
    }

    /// Opens an existing segment file found by a directory scan.
    pub fn open_existing(number: u32, path: PathBuf) -> StoreResult<Self> {
        Self::open_at(number, path)
    }

    fn open_at(number: u32, path: PathBuf) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let append_offset = file.metadata()?.len();

        Ok(Self {
            number,
            path,
            file,
            append_offset,
        })
    }

    /// Appends encoded bytes, returning the offset they were written at.
    ///
    /// The append offset only advances after the write succeeds.
    pub fn append(&mut self, data: &[u8]) -> StoreResult<u64> {
        let offset = self.append_offset;
        self.file.write_all(data)?;
        self.append_offset += data.len() as u64;
        Ok(offset)
    }

    /// The segment number.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Path of the segment file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset of the next append.
    #[must_use]
    pub fn append_offset(&self) -> u64 {
        self.append_offset
    }

    /// Current size of the file on disk.
    pub fn disk_len(&self) -> StoreResult<u64> {
        Ok(self.file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_starts_empty() {
        let temp = tempdir().unwrap();
        let segment = Segment::create(temp.path(), 1).unwrap();

        assert_eq!(segment.number(), 1);
        assert_eq!(segment.append_offset(), 0);
        assert!(temp.path().join("segment-0001").exists());
    }

    #[test]
    fn append_advances_offset() {
        let temp = tempdir().unwrap();
        let mut segment = Segment::create(temp.path(), 1).unwrap();

        assert_eq!(segment.append(b"hello").unwrap(), 0);
        assert_eq!(segment.append(b" world").unwrap(), 5);
        assert_eq!(segment.append_offset(), 11);
        assert_eq!(segment.disk_len().unwrap(), 11);
    }

    #[test]
    fn reopen_resumes_at_end() {
        let temp = tempdir().unwrap();
        {
            let mut segment = Segment::create(temp.path(), 1).unwrap();
            segment.append(b"abc").unwrap();
        }

        let path = temp.path().join("segment-0001");
        let segment = Segment::open_existing(1, path).unwrap();
        assert_eq!(segment.append_offset(), 3);
    }
}
