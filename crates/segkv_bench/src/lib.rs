//! Shared helpers for the store benchmarks.

use segkv_core::Store;
use tempfile::TempDir;

/// Builds a value of the given size from a repeating pattern.
#[must_use]
pub fn value_of_size(size: usize) -> String {
    (0..size)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect()
}

/// Opens a store in a fresh temporary directory.
///
/// The directory guard must be kept alive for the store's lifetime.
pub fn temp_store(max_segment_size: u64) -> (TempDir, Store) {
    let dir = TempDir::new().expect("create temp dir");
    let store = Store::open(dir.path(), max_segment_size).expect("open store");
    (dir, store)
}

/// Fills a store with `keys` distinct keys, overwriting each `versions`
/// times so compaction has something to reclaim.
pub fn fill_store(store: &Store, keys: usize, versions: usize, value_size: usize) {
    let value = value_of_size(value_size);
    for version in 0..versions {
        for key in 0..keys {
            store
                .put(format!("key-{key}"), format!("{value}-{version}"))
                .expect("put");
        }
    }
}
