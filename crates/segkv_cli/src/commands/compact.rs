//! Compact command implementation.

use segkv_core::{Store, DEFAULT_MAX_SEGMENT_SIZE};
use std::path::Path;

/// Runs the compact command.
pub fn run(path: &Path, max_segment_size: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path, max_segment_size.unwrap_or(DEFAULT_MAX_SEGMENT_SIZE))?;

    let segments_before = store.segment_count();
    let size_before = store.size()?;

    if segments_before < 2 {
        println!("Nothing to compact: {segments_before} segment(s)");
        store.close()?;
        return Ok(());
    }

    println!("Compacting {} segment(s) at {}", segments_before, path.display());
    store.compact();
    store.wait_for_compaction();

    let segments_after = store.segment_count();
    let size_after = store.size()?;

    println!();
    println!("  Segments: {segments_before} -> {segments_after}");
    println!("  Size:     {size_before} -> {size_after} bytes");
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        size_before.saturating_sub(size_after),
        if size_before > 0 {
            (size_before.saturating_sub(size_after)) as f64 / size_before as f64 * 100.0
        } else {
            0.0
        }
    );
    println!("✓ Compaction complete");

    store.close()?;
    Ok(())
}
