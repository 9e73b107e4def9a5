//! blobio-core: bit-level binary encoding with string interning
//!
//! This library provides the pieces a sender and receiver need to agree on a
//! compact binary encoding:
//! - Packs primitive values at arbitrary bit offsets into a growable buffer
//! - Replaces repeated strings with 16-bit ids negotiated by a host table
//!
//! # Architecture
//!
//! - `bits`: Pure bit/byte index arithmetic
//! - `bitio`: `BitBuffer`, the bit-addressable read/write buffer
//! - `string_table`: Host/client string interning on top of `BitBuffer`
//! - `error`: Structured read errors
//!
//! # Design Principles
//!
//! - **Writes never fail**: storage grows to fit every write
//! - **Reads are atomic**: a failed read leaves the cursor untouched
//! - **No panics**: all read failures are structured and recoverable
//! - **Single owner**: no interior locking, `&mut self` for every mutation

pub mod bitio;
pub mod bits;
pub mod error;
pub mod string_table;

// Re-export commonly used types
pub use bitio::{BitBuffer, SeekMode};
pub use error::{BitIoError, Error, Result, StringTableError};
pub use string_table::{CaseSensitivity, FrameShape, Role, StringTable};
