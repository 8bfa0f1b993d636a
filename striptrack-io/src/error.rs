//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Memory mapping error.
    #[error("memory mapping error: {0}")]
    MmapError(String),

    /// A record violates the binary layout or the geometry.
    #[error("malformed record {record}: {reason}")]
    MalformedRecord {
        /// Zero-based position of the record in its file.
        record: usize,
        /// What was wrong.
        reason: String,
    },

    /// Input ended in the middle of a value.
    #[error("truncated input at byte {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Byte offset of the value being read.
        offset: usize,
        /// Bytes the value requires.
        needed: usize,
        /// Bytes left in the input.
        available: usize,
    },

    /// Bytes left over after the declared number of records.
    #[error("{0} trailing bytes after the last record")]
    TrailingBytes(usize),

    /// Setup file could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] striptrack_core::Error),
}

impl Error {
    pub(crate) fn malformed(record: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record,
            reason: reason.into(),
        }
    }
}
