//! Error types for the blobio encoding layer.
//!
//! Writes never fail: the buffer grows to fit whatever is written. Only
//! reads report errors, and a failed read leaves the cursor where it was.

use thiserror::Error;

/// Top-level error type for all operations in the crate.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: reading primitives from a bit buffer
/// - String table: resolving interned identifiers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Bit I/O operation failed (e.g., reading past the high-water mark)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// String table frame could not be resolved
    #[error("string table error: {0}")]
    StringTable(#[from] StringTableError),
}

/// Bit-level I/O errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitIoError {
    /// Attempted to read more bits than were written
    #[error("insufficient bits: requested {requested}, available {available}")]
    InsufficientBits { requested: usize, available: usize },

    /// Partial number width outside `1..32`
    #[error("invalid bit count: {0}")]
    InvalidBitCount(u32),

    /// String payload is not valid UTF-8
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

/// String table protocol errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StringTableError {
    /// A reference frame named an id this table never saw defined.
    ///
    /// The host and client tables have desynchronized; there is no recovery.
    #[error("unknown string id {0}: string tables are out of sync")]
    UnknownId(u16),
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
