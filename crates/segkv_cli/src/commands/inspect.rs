//! Inspect command implementation.

use segkv_core::{Store, DEFAULT_MAX_SEGMENT_SIZE};
use std::path::Path;

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path, DEFAULT_MAX_SEGMENT_SIZE)?;
    let segments = store.segments()?;
    let key_count = store.key_count();
    let total_size = store.size()?;

    match format {
        "json" => {
            let segments_json: Vec<serde_json::Value> = segments
                .iter()
                .map(|info| {
                    serde_json::json!({
                        "number": info.number,
                        "path": info.path.display().to_string(),
                        "size": info.size,
                    })
                })
                .collect();
            let report = serde_json::json!({
                "path": path.display().to_string(),
                "segments": segments_json,
                "segment_count": segments.len(),
                "key_count": key_count,
                "total_size": total_size,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!("Store at {}", path.display());
            println!();
            println!("Segments:");
            for info in &segments {
                let role = if info.number == segments.last().map_or(0, |last| last.number) {
                    "active"
                } else {
                    "sealed"
                };
                println!(
                    "  segment-{:04}  {:>10} bytes  {}",
                    info.number, info.size, role
                );
            }
            println!();
            println!("  Segment count: {}", segments.len());
            println!("  Keys indexed:  {key_count}");
            println!("  Total size:    {total_size} bytes");
        }
    }

    store.close()?;
    Ok(())
}
