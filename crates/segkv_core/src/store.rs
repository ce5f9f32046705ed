//! The store: open/recovery, write and read paths, compaction, close.
//!
//! ## Concurrency
//!
//! A single structural lock protects the segment list, the index, and the
//! active segment's append offset. It is held for the entirety of every
//! put, for the index-lookup phase of every get, for size, and for the
//! whole of a compaction merge. Gets release it before touching the
//! filesystem, so reads run in parallel with each other and with writes.
//!
//! A separate small lock guards the "compaction in progress" flag and
//! retains the background thread's join handle so [`Store::close`] can
//! wait for an in-flight merge.

use crate::config::Config;
use crate::dir;
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::segment::Segment;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info};

/// Location of the most recent record for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordPos {
    segment: u32,
    offset: u64,
}

/// Metadata snapshot of one segment, for inspection tooling.
#[derive(Debug, Clone)]
pub struct SegmentInfo {
    /// Segment number.
    pub number: u32,
    /// Path of the segment file.
    pub path: PathBuf,
    /// Current size on disk in bytes.
    pub size: u64,
}

/// State under the structural lock.
struct State {
    segments: Vec<Segment>,
    index: HashMap<String, RecordPos>,
    lock_file: Option<File>,
    closed: bool,
}

impl State {
    fn check_open(&self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::AlreadyClosed);
        }
        Ok(())
    }
}

#[derive(Default)]
struct CompactionState {
    running: bool,
    handle: Option<JoinHandle<()>>,
}

struct Inner {
    dir: PathBuf,
    max_segment_size: u64,
    state: Mutex<State>,
    compaction: Mutex<CompactionState>,
}

/// An append-only, log-structured key-value store for string keys and
/// values.
///
/// Writes append records to the highest-numbered segment file and update
/// an in-memory index from key to `(segment, offset)`. Reads resolve the
/// index and decode a single record from disk. [`Store::compact`] merges
/// sealed segments in the background, keeping only the latest value per
/// key.
///
/// `Store` is cheaply cloneable; clones share the same underlying state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Opens the store in `dir`, creating the directory if absent.
    ///
    /// Scans existing segment files in numeric order and rebuilds the
    /// index from every record on disk; later records win for the same
    /// key. Fails with [`StoreError::CorruptRecord`] if a segment holds a
    /// partial or malformed record, and with [`StoreError::Locked`] if
    /// another process has the directory open.
    pub fn open(dir: impl AsRef<Path>, max_segment_size: u64) -> StoreResult<Self> {
        Self::open_with_config(dir, Config::new().max_segment_size(max_segment_size))
    }

    /// Opens the store with a full [`Config`].
    pub fn open_with_config(dir: impl AsRef<Path>, config: Config) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        if config.create_if_missing {
            fs::create_dir_all(&dir)?;
        }

        dir::remove_merge_residue(&dir)?;
        let lock_file = dir::lock_dir(&dir)?;

        let mut state = State {
            segments: Vec::new(),
            index: HashMap::new(),
            lock_file: Some(lock_file),
            closed: false,
        };
        reload_state(&dir, &mut state)?;

        info!(
            dir = %dir.display(),
            segments = state.segments.len(),
            keys = state.index.len(),
            "store opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                dir,
                max_segment_size: config.max_segment_size,
                state: Mutex::new(state),
                compaction: Mutex::new(CompactionState::default()),
            }),
        })
    }

    /// Writes a key-value pair.
    ///
    /// Puts are serialized: at most one append proceeds at a time. If the
    /// active segment has reached the configured maximum size, a new
    /// segment is allocated before the write. The index is only updated
    /// after the underlying write succeeds; a write error leaves it
    /// unchanged and must be treated as fatal for the current process.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> StoreResult<()> {
        let record = Record::new(key, value);
        let encoded = record.encode();

        let mut state = self.inner.state.lock();
        state.check_open()?;

        let rollover = state
            .segments
            .last()
            .is_some_and(|active| active.append_offset() >= self.inner.max_segment_size);
        if rollover {
            let next = active_number(&state.segments) + 1;
            let segment = Segment::create(&self.inner.dir, next)?;
            debug!(number = next, "segment rollover");
            state.segments.push(segment);
        }

        let Some(active) = state.segments.last_mut() else {
            return Err(StoreError::SegmentMissing { number: 1 });
        };
        let number = active.number();
        let offset = active.append(&encoded)?;

        state.index.insert(record.key, RecordPos { segment: number, offset });
        Ok(())
    }

    /// Reads the most recently written value for `key`.
    ///
    /// Returns [`StoreError::NotFound`] for a key that was never written.
    /// The structural lock is released before any file I/O, so concurrent
    /// reads do not block each other or writers.
    pub fn get(&self, key: &str) -> StoreResult<String> {
        let (path, offset) = {
            let state = self.inner.state.lock();
            state.check_open()?;

            let pos = state.index.get(key).copied().ok_or(StoreError::NotFound)?;
            let segment = state
                .segments
                .iter()
                .find(|s| s.number() == pos.segment)
                .ok_or(StoreError::SegmentMissing { number: pos.segment })?;
            (segment.path().to_path_buf(), pos.offset)
        };

        read_record_at(&path, offset, key)
    }

    /// Total size on disk of all live segments.
    pub fn size(&self) -> StoreResult<u64> {
        let state = self.inner.state.lock();
        state.check_open()?;

        let mut total = 0;
        for segment in &state.segments {
            total += segment.disk_len()?;
        }
        Ok(total)
    }

    /// Number of live segments.
    pub fn segment_count(&self) -> usize {
        self.inner.state.lock().segments.len()
    }

    /// Number of distinct keys in the index.
    pub fn key_count(&self) -> usize {
        self.inner.state.lock().index.len()
    }

    /// Metadata of all live segments, ascending by number.
    pub fn segments(&self) -> StoreResult<Vec<SegmentInfo>> {
        let state = self.inner.state.lock();
        state.check_open()?;

        let mut infos = Vec::with_capacity(state.segments.len());
        for segment in &state.segments {
            infos.push(SegmentInfo {
                number: segment.number(),
                path: segment.path().to_path_buf(),
                size: segment.disk_len()?,
            });
        }
        Ok(infos)
    }

    /// Starts a background compaction; a no-op while one is in progress.
    ///
    /// Compaction merges all sealed segments into a single segment holding
    /// the latest value per key, renumbers the result to segment 1 and the
    /// surviving active segment to 2, and rebuilds the index. Failures are
    /// logged and leave reads and writes valid against the pre-compaction
    /// state.
    pub fn compact(&self) {
        let mut compaction = self.inner.compaction.lock();
        if compaction.running {
            info!("compaction already in progress, skipping request");
            return;
        }
        compaction.running = true;

        let inner = Arc::clone(&self.inner);
        let handle = std::thread::spawn(move || {
            info!("starting background compaction");
            match run_compaction(&inner) {
                Ok(true) => info!("background compaction completed"),
                Ok(false) => info!("compaction skipped: fewer than two segments"),
                Err(err) => error!(%err, "background compaction failed"),
            }
            inner.compaction.lock().running = false;
        });
        compaction.handle = Some(handle);
    }

    /// Whether a compaction is currently in progress.
    pub fn is_compacting(&self) -> bool {
        self.inner.compaction.lock().running
    }

    /// Blocks until the most recently started compaction has finished.
    pub fn wait_for_compaction(&self) {
        let handle = self.inner.compaction.lock().handle.take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Waits for any in-flight compaction, then releases all file handles
    /// and the directory lock.
    ///
    /// Subsequent operations return [`StoreError::AlreadyClosed`].
    pub fn close(&self) -> StoreResult<()> {
        self.wait_for_compaction();

        let mut state = self.inner.state.lock();
        state.check_open()?;
        state.closed = true;
        state.segments.clear();
        state.index.clear();
        state.lock_file = None;
        Ok(())
    }

    /// Path of the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }
}

fn active_number(segments: &[Segment]) -> u32 {
    segments.last().map_or(0, Segment::number)
}

/// Opens a transient read handle, decodes one record at `offset`, and
/// checks it against the requested key.
fn read_record_at(path: &Path, offset: u64, key: &str) -> StoreResult<String> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut reader = BufReader::new(file);

    let Some((record, _)) = Record::read_from(&mut reader)? else {
        return Err(StoreError::corrupt_record(format!(
            "no record at offset {offset} in {}",
            path.display()
        )));
    };

    if record.key != key {
        return Err(StoreError::InconsistentIndex {
            expected: key.to_string(),
            found: record.key,
        });
    }
    Ok(record.value)
}

/// Rebuilds segment list and index from whatever the directory holds.
///
/// Shared by open and the tail of compaction: enumerate segment files
/// ascending, open each for append, stream-decode every record so later
/// writes overwrite earlier index entries, and create an empty segment 1
/// if the directory has none.
fn reload_state(dir: &Path, state: &mut State) -> StoreResult<()> {
    state.segments.clear();
    state.index.clear();

    for (number, path) in dir::list_segments(dir)? {
        state.segments.push(Segment::open_existing(number, path)?);
    }
    if state.segments.is_empty() {
        state.segments.push(Segment::create(dir, 1)?);
    }

    let mut index = HashMap::new();
    for segment in &state.segments {
        scan_segment(segment, &mut index)?;
    }
    state.index = index;
    Ok(())
}

/// Streams every record of a segment into the index.
fn scan_segment(segment: &Segment, index: &mut HashMap<String, RecordPos>) -> StoreResult<()> {
    let file = File::open(segment.path())?;
    let mut reader = BufReader::new(file);
    let mut offset = 0u64;

    loop {
        let next = Record::read_from(&mut reader).map_err(|err| match err {
            StoreError::CorruptRecord { message } => StoreError::corrupt_record(format!(
                "segment {} at offset {offset}: {message}",
                segment.number()
            )),
            other => other,
        })?;
        let Some((record, consumed)) = next else {
            return Ok(());
        };

        index.insert(
            record.key,
            RecordPos {
                segment: segment.number(),
                offset,
            },
        );
        offset += consumed;
    }
}

/// Performs one compaction pass under the structural lock.
///
/// Returns `Ok(false)` when there was nothing to merge.
fn run_compaction(inner: &Inner) -> StoreResult<bool> {
    let mut state = inner.state.lock();
    state.check_open()?;
    if state.segments.len() < 2 {
        return Ok(false);
    }

    // Merge temporary named one past the highest live segment; open
    // ignores the suffix, so a crash here leaves the store untouched.
    let merge_number = active_number(&state.segments) + 1;
    let merge_path = dir::merge_path(&inner.dir, merge_number);

    // Latest value per key across all sealed segments, in segment order.
    let sealed = &state.segments[..state.segments.len() - 1];
    let mut survivors: HashMap<String, Record> = HashMap::new();
    for segment in sealed {
        collect_records(segment, &mut survivors)?;
    }

    if let Err(err) = write_merge_file(&merge_path, &survivors) {
        let _ = fs::remove_file(&merge_path);
        return Err(err);
    }

    // Destructive swap. From here on the in-memory state is rebuilt from
    // the directory no matter what, so a partial failure degrades to
    // whatever the recovery scan finds.
    let Some(active) = state.segments.pop() else {
        return Ok(false);
    };
    let sealed = std::mem::take(&mut state.segments);
    state.index.clear();

    let swapped = swap_in_merge(&inner.dir, &merge_path, sealed, active);
    let reloaded = reload_state(&inner.dir, &mut state);
    swapped?;
    reloaded?;
    Ok(true)
}

/// Reads every record of a segment into the survivor map; later calls for
/// higher-numbered segments overwrite earlier entries.
fn collect_records(segment: &Segment, survivors: &mut HashMap<String, Record>) -> StoreResult<()> {
    let file = File::open(segment.path())?;
    let mut reader = BufReader::new(file);

    while let Some((record, _)) = Record::read_from(&mut reader)? {
        survivors.insert(record.key.clone(), record);
    }
    Ok(())
}

/// Writes the surviving records to the merge temporary in sorted key
/// order, so compaction output is deterministic.
fn write_merge_file(path: &Path, survivors: &HashMap<String, Record>) -> StoreResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let mut entries: Vec<(&String, &Record)> = survivors.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (_, record) in entries {
        writer.write_all(&record.encode())?;
    }
    writer.flush()?;
    Ok(())
}

/// Deletes the merged sealed segments, renames the merge temporary to
/// segment 1, and renumbers the surviving active segment to 2.
fn swap_in_merge(
    dir: &Path,
    merge_path: &Path,
    sealed: Vec<Segment>,
    active: Segment,
) -> StoreResult<()> {
    for segment in sealed {
        let path = segment.path().to_path_buf();
        drop(segment);
        fs::remove_file(&path)?;
    }

    fs::rename(merge_path, dir::segment_path(dir, 1))?;

    let active_number = active.number();
    let active_path = active.path().to_path_buf();
    drop(active);
    if active_number != 2 {
        fs::rename(&active_path, dir::segment_path(dir, 2))?;
    }
    Ok(())
}
