//! Error types for the store.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key has never been written.
    ///
    /// This is the only non-fatal error kind: callers are expected to
    /// branch on it.
    #[error("record does not exist")]
    NotFound,

    /// An I/O error from the filesystem or an underlying write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record failed to decode mid-segment, during recovery or a read.
    #[error("corrupt record: {message}")]
    CorruptRecord {
        /// Description of what failed to decode.
        message: String,
    },

    /// The record at an indexed offset decoded to a different key.
    #[error("index inconsistency: expected key {expected:?}, found {found:?}")]
    InconsistentIndex {
        /// The key that was looked up.
        expected: String,
        /// The key actually decoded at the indexed offset.
        found: String,
    },

    /// The index references a segment that is not in the live set.
    #[error("segment {number} not found in the live segment set")]
    SegmentMissing {
        /// The referenced segment number.
        number: u32,
    },

    /// The store has been closed.
    #[error("store is closed")]
    AlreadyClosed,

    /// Another process holds the store directory open.
    #[error("store locked: another process has exclusive access")]
    Locked,
}

impl StoreError {
    /// Creates a corrupt record error.
    pub fn corrupt_record(message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            message: message.into(),
        }
    }

    /// Returns true for the non-fatal not-found case.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
