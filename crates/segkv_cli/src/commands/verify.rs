//! Verify command implementation.
//!
//! Scans segment files directly rather than opening the store, so a
//! corrupt directory can still be reported instead of failing the open.

use segkv_core::{dir, Record};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let segments = dir::list_segments(path)?;
    if segments.is_empty() {
        println!("No segment files found at {}", path.display());
        return Ok(());
    }

    println!("Verifying {} segment(s) at {}", segments.len(), path.display());
    println!();

    let mut total_records = 0usize;
    let mut corrupt = false;

    for (number, segment_path) in segments {
        let file = File::open(&segment_path)?;
        let mut reader = BufReader::new(file);
        let mut records = 0usize;
        let mut offset = 0u64;
        let mut segment_corrupt = false;

        loop {
            match Record::read_from(&mut reader) {
                Ok(Some((_, consumed))) => {
                    records += 1;
                    offset += consumed;
                }
                Ok(None) => break,
                Err(err) => {
                    println!("  segment-{number:04}: CORRUPT at offset {offset}: {err}");
                    segment_corrupt = true;
                    corrupt = true;
                    break;
                }
            }
        }

        if !segment_corrupt {
            println!("  segment-{number:04}: {records} record(s), {offset} bytes");
        }
        total_records += records;
    }

    println!();
    if corrupt {
        println!("✗ Verification failed");
        return Err("store contains corrupt records".into());
    }
    println!("✓ {total_records} record(s) verified");
    Ok(())
}
