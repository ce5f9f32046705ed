//! # segkv core
//!
//! An embeddable, append-only, log-structured key-value store for string
//! keys and string values.
//!
//! All writes are persisted to a sequence of numbered segment files in a
//! single directory. An in-memory hash index maps each key to the on-disk
//! location of its most recent record, and a background compaction merges
//! sealed segments to reclaim space taken by superseded versions.
//!
//! ```no_run
//! use segkv_core::Store;
//!
//! # fn main() -> segkv_core::StoreResult<()> {
//! let store = Store::open("/var/lib/segkv", 10 * 1024 * 1024)?;
//! store.put("greeting", "hello")?;
//! assert_eq!(store.get("greeting")?, "hello");
//! store.compact();
//! store.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod dir;
mod error;
mod record;
mod segment;
mod store;

pub use config::{Config, DEFAULT_MAX_SEGMENT_SIZE};
pub use error::{StoreError, StoreResult};
pub use record::Record;
pub use store::{SegmentInfo, Store};

/// Current crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
