//! Bit-addressable read/write buffer.
//!
//! `BitBuffer` packs primitive values at arbitrary bit offsets into a growable
//! byte vector. A single cursor serves both directions: writes push it forward
//! and raise the high-water mark, reads consume up to that mark and never past.
//!
//! # Layout
//! - Stream bit `k` is stored in byte `k / 8`, at bit `k % 8` counted from the
//!   least significant bit. An aligned byte write stores the byte verbatim.
//! - Multi-byte values (`short`, `int`, `long`, `float`) are big-endian.
//! - Floats are stored as their raw IEEE-754 bit pattern.
//! - Strings are a 16-bit byte length followed by the UTF-8 payload.
//! - Partial numbers store the low `width` bits, highest of those first.
//!
//! # Example
//! ```
//! use blobio_core::bitio::{BitBuffer, SeekMode};
//!
//! let mut buffer = BitBuffer::new();
//! buffer.write_bit(true).write_int(-42).write_string("hello");
//!
//! assert!(buffer.seek_bits(0, SeekMode::Begin));
//! assert!(buffer.try_read_bit().unwrap());
//! assert_eq!(buffer.try_read_int().unwrap(), -42);
//! assert_eq!(buffer.try_read_string().unwrap(), "hello");
//! assert!(buffer.try_read_bit().is_err());
//! ```

use crate::bits::{self, BITS_PER_BYTE, INT_SIZE_IN_BITS};
use crate::error::{BitIoError, Error, Result};

/// Width of the length prefix in front of every string.
pub const STRING_LENGTH_BITS: usize = 16;

/// Longest string payload the length prefix can describe.
pub const MAX_STRING_BYTES: usize = u16::MAX as usize;

/// Reference point for [`BitBuffer::seek_bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Absolute position from bit 0
    Begin,
    /// Relative to the current cursor
    Current,
    /// Backwards from the high-water mark
    End,
}

/// Growable bit buffer with a shared read/write cursor.
///
/// # Invariants
/// - `bytes.len() >= ceil(high_water_mark / 8)`
/// - `high_water_mark` only moves forward, and only through writes
/// - reads never return bits at or beyond `high_water_mark`
#[derive(Debug, Default)]
pub struct BitBuffer {
    /// Backing storage, grown to exactly the size a write needs
    bytes: Vec<u8>,
    /// Next bit to write or read
    position: usize,
    /// Furthest bit ever written
    high_water_mark: usize,
}

impl BitBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the written contents of `other` into a new buffer.
    ///
    /// Only the bytes up to `other`'s high-water mark are copied. The mark is
    /// inherited and the cursor starts at 0, ready for reading.
    pub fn from_buffer(other: &BitBuffer) -> Self {
        Self {
            bytes: other.as_bytes().to_vec(),
            position: 0,
            high_water_mark: other.high_water_mark,
        }
    }

    /// Wrap `bytes` without copying. Every byte counts as written.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let high_water_mark = bytes.len() * BITS_PER_BYTE;
        Self {
            bytes,
            position: 0,
            high_water_mark,
        }
    }

    /// Wrap a copy of `bytes`. Every byte counts as written.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::from_vec(bytes.to_vec())
    }

    /// Current cursor, in bits.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Furthest bit ever written.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Bits left to read between the cursor and the high-water mark.
    pub fn bits_remaining(&self) -> usize {
        self.high_water_mark.saturating_sub(self.position)
    }

    /// Size of the backing storage, in bits.
    pub fn capacity_bits(&self) -> usize {
        self.bytes.len() * BITS_PER_BYTE
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.high_water_mark == 0
    }

    /// The bytes covering everything written so far.
    pub fn as_bytes(&self) -> &[u8] {
        let len = bits::bit_size_to_byte_size(self.high_water_mark).min(self.bytes.len());
        &self.bytes[..len]
    }

    /// Consume the buffer, returning the bytes covering everything written.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bytes.truncate(bits::bit_size_to_byte_size(self.high_water_mark));
        self.bytes
    }

    /// Make room for at least `bits` bits of storage.
    pub fn ensure_bit_capacity(&mut self, bits: usize) {
        self.ensure_byte_capacity(bits::bit_size_to_byte_size(bits));
    }

    /// Make room for at least `bytes` bytes of storage.
    ///
    /// Grows to exactly `bytes`, keeping existing contents at offset 0.
    pub fn ensure_byte_capacity(&mut self, bytes: usize) {
        let current = self.bytes.len();
        if current < bytes {
            tracing::trace!(from = current, to = bytes, "growing bit buffer");
            self.bytes.reserve_exact(bytes - current);
            self.bytes.resize(bytes, 0);
        }
    }

    /// Shrink storage to exactly the bytes covering the high-water mark.
    pub fn trim(&mut self) -> &mut Self {
        self.bytes.truncate(bits::bit_size_to_byte_size(self.high_water_mark));
        self.bytes.shrink_to_fit();
        self
    }

    /// Detach the backing storage and reset the buffer to empty.
    ///
    /// The caller takes ownership of the bytes; the buffer can be reused for
    /// the next message without copying the previous one.
    pub fn release_array(&mut self) -> Vec<u8> {
        let bytes = std::mem::take(&mut self.bytes);
        self.position = 0;
        self.high_water_mark = 0;
        bytes
    }

    /// Discard all contents and reset the buffer to empty.
    pub fn clear(&mut self) -> &mut Self {
        self.bytes = Vec::new();
        self.position = 0;
        self.high_water_mark = 0;
        self
    }

    // === Cursor ===

    /// Move the cursor forward, raising the high-water mark if passed.
    fn advance(&mut self, bits: usize) {
        self.position += bits;
        if self.position > self.high_water_mark {
            self.high_water_mark = self.position;
        }
    }

    /// Put the cursor back to an earlier position after a failed read.
    pub(crate) fn rewind(&mut self, position: usize) {
        if position <= self.position {
            self.position = position;
        }
    }

    /// Reposition the cursor.
    ///
    /// Returns `false` and leaves the cursor alone when the target falls
    /// outside `[0, capacity_bits())`. Never changes the high-water mark.
    pub fn seek_bits(&mut self, amount: isize, mode: SeekMode) -> bool {
        let target = match mode {
            SeekMode::Begin => Some(amount),
            SeekMode::Current => isize::try_from(self.position)
                .ok()
                .and_then(|position| position.checked_add(amount)),
            SeekMode::End => isize::try_from(self.high_water_mark)
                .ok()
                .and_then(|mark| mark.checked_sub(amount)),
        };

        match target.and_then(|target| usize::try_from(target).ok()) {
            Some(target) if target < self.capacity_bits() => {
                self.position = target;
                true
            }
            _ => false,
        }
    }

    /// Reposition the cursor by whole bytes. See [`BitBuffer::seek_bits`].
    pub fn seek_bytes(&mut self, amount: isize, mode: SeekMode) -> bool {
        match amount.checked_mul(BITS_PER_BYTE as isize) {
            Some(bits) => self.seek_bits(bits, mode),
            None => false,
        }
    }

    /// Advance the cursor to the next byte boundary without touching data.
    pub fn skip_padding_bits(&mut self) -> &mut Self {
        self.position = bits::align_up(self.position);
        self
    }

    // === Writes ===

    fn put_bit(&mut self, state: bool) {
        let index = bits::bit_index_to_byte_index(self.position);
        let offset = bits::bit_offset_in_byte(self.position);
        self.bytes[index] = bits::set(self.bytes[index] as u32, offset, state) as u8;
        self.advance(1);
    }

    fn put_byte(&mut self, value: u8) {
        if bits::is_byte_aligned(self.position) {
            self.bytes[bits::bit_index_to_byte_index(self.position)] = value;
            self.advance(BITS_PER_BYTE);
        } else {
            for i in 0..BITS_PER_BYTE as u32 {
                self.put_bit(bits::get(value as u32, i));
            }
        }
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.put_byte(byte);
        }
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, state: bool) -> &mut Self {
        self.ensure_bit_capacity(self.position + 1);
        self.put_bit(state);
        self
    }

    /// Write 8 bits. Takes a single store when the cursor is byte-aligned.
    pub fn write_byte(&mut self, value: u8) -> &mut Self {
        self.ensure_bit_capacity(self.position + BITS_PER_BYTE);
        self.put_byte(value);
        self
    }

    /// Write a signed 16-bit value, big-endian.
    pub fn write_short(&mut self, value: i16) -> &mut Self {
        self.write_be(&value.to_be_bytes())
    }

    /// Write an unsigned 16-bit value, big-endian.
    pub fn write_ushort(&mut self, value: u16) -> &mut Self {
        self.write_be(&value.to_be_bytes())
    }

    /// Write a signed 32-bit value, big-endian.
    pub fn write_int(&mut self, value: i32) -> &mut Self {
        self.write_be(&value.to_be_bytes())
    }

    /// Write a signed 64-bit value, big-endian.
    pub fn write_long(&mut self, value: i64) -> &mut Self {
        self.write_be(&value.to_be_bytes())
    }

    /// Write the raw IEEE-754 bit pattern of `value`.
    pub fn write_float(&mut self, value: f32) -> &mut Self {
        self.write_be(&value.to_bits().to_be_bytes())
    }

    /// Write raw bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_be(bytes)
    }

    fn write_be(&mut self, bytes: &[u8]) -> &mut Self {
        self.ensure_bit_capacity(self.position + bytes.len() * BITS_PER_BYTE);
        self.put_bytes(bytes);
        self
    }

    /// Write a 16-bit length prefix followed by the UTF-8 bytes of `value`.
    ///
    /// An empty string writes only a zero prefix. Payloads longer than
    /// [`MAX_STRING_BYTES`] are cut at the last character boundary that fits.
    pub fn write_string(&mut self, value: &str) -> &mut Self {
        let payload = clip_to_prefix_limit(value);
        if payload.len() < value.len() {
            tracing::warn!(
                len = value.len(),
                kept = payload.len(),
                "string exceeds length prefix, truncating"
            );
        }

        self.ensure_bit_capacity(
            self.position + STRING_LENGTH_BITS + payload.len() * BITS_PER_BYTE,
        );
        self.put_bytes(&(payload.len() as u16).to_be_bytes());
        self.put_bytes(payload.as_bytes());
        self
    }

    /// Write the low `width` bits of `value`, highest of those bits first.
    ///
    /// `width` must be in `1..32`; any other width writes nothing.
    pub fn write_partial_number(&mut self, value: u32, width: u32) -> &mut Self {
        if width == 0 || width >= INT_SIZE_IN_BITS {
            tracing::trace!(width, "dropping partial number with out-of-range width");
            return self;
        }

        self.ensure_bit_capacity(self.position + width as usize);
        for i in (0..width).rev() {
            self.put_bit(bits::get(value, i));
        }
        self
    }

    // === Reads ===

    fn require(&self, requested: usize) -> Result<()> {
        let available = self.bits_remaining();
        if requested > available {
            return Err(BitIoError::InsufficientBits {
                requested,
                available,
            }
            .into());
        }
        Ok(())
    }

    fn take_bit(&mut self) -> bool {
        let byte = self.bytes[bits::bit_index_to_byte_index(self.position)];
        let state = bits::get(byte as u32, bits::bit_offset_in_byte(self.position));
        self.advance(1);
        state
    }

    fn take_byte(&mut self) -> u8 {
        if bits::is_byte_aligned(self.position) {
            let byte = self.bytes[bits::bit_index_to_byte_index(self.position)];
            self.advance(BITS_PER_BYTE);
            byte
        } else {
            let mut value = 0u32;
            for i in 0..BITS_PER_BYTE as u32 {
                value = bits::set(value, i, self.take_bit());
            }
            value as u8
        }
    }

    fn take_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        for byte in out.iter_mut() {
            *byte = self.take_byte();
        }
        out
    }

    fn try_read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.require(N * BITS_PER_BYTE)?;
        Ok(self.take_array())
    }

    /// Read a single bit.
    pub fn try_read_bit(&mut self) -> Result<bool> {
        self.require(1)?;
        Ok(self.take_bit())
    }

    /// Read 8 bits.
    pub fn try_read_byte(&mut self) -> Result<u8> {
        self.require(BITS_PER_BYTE)?;
        Ok(self.take_byte())
    }

    /// Read a signed big-endian 16-bit value.
    pub fn try_read_short(&mut self) -> Result<i16> {
        self.try_read_array().map(i16::from_be_bytes)
    }

    /// Read an unsigned big-endian 16-bit value.
    pub fn try_read_ushort(&mut self) -> Result<u16> {
        self.try_read_array().map(u16::from_be_bytes)
    }

    /// Read a signed big-endian 32-bit value.
    pub fn try_read_int(&mut self) -> Result<i32> {
        self.try_read_array().map(i32::from_be_bytes)
    }

    /// Read a signed big-endian 64-bit value.
    pub fn try_read_long(&mut self) -> Result<i64> {
        self.try_read_array().map(i64::from_be_bytes)
    }

    /// Read a float from its raw IEEE-754 bit pattern.
    pub fn try_read_float(&mut self) -> Result<f32> {
        self.try_read_array().map(|bytes| f32::from_bits(u32::from_be_bytes(bytes)))
    }

    /// Read `count` raw bytes.
    pub fn try_read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.require(count.saturating_mul(BITS_PER_BYTE))?;
        Ok((0..count).map(|_| self.take_byte()).collect())
    }

    /// Read a length-prefixed UTF-8 string.
    ///
    /// Fails without moving the cursor when the prefix or payload is cut
    /// short, or when the payload is not UTF-8.
    pub fn try_read_string(&mut self) -> Result<String> {
        self.require(STRING_LENGTH_BITS)?;
        let start = self.position;

        let len = u16::from_be_bytes(self.take_array()) as usize;
        if let Err(err) = self.require(len * BITS_PER_BYTE) {
            self.rewind(start);
            return Err(err);
        }

        let payload: Vec<u8> = (0..len).map(|_| self.take_byte()).collect();
        String::from_utf8(payload).map_err(|_| {
            self.rewind(start);
            Error::from(BitIoError::InvalidUtf8)
        })
    }

    /// Read a partial number of `width` bits written by
    /// [`BitBuffer::write_partial_number`].
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if `width` is not in `1..32`
    /// - `BitIoError::InsufficientBits` if fewer than `width` bits remain
    pub fn try_read_partial_number(&mut self, width: u32) -> Result<u32> {
        if width == 0 || width >= INT_SIZE_IN_BITS {
            return Err(BitIoError::InvalidBitCount(width).into());
        }
        self.require(width as usize)?;

        let mut value = 0u32;
        for i in (0..width).rev() {
            value = bits::set(value, i, self.take_bit());
        }
        Ok(value)
    }

    /// Read a bit, or `default` if none remain.
    pub fn read_bit_or(&mut self, default: bool) -> bool {
        self.try_read_bit().unwrap_or(default)
    }

    /// Read a byte, or `default` if it does not fit.
    pub fn read_byte_or(&mut self, default: u8) -> u8 {
        self.try_read_byte().unwrap_or(default)
    }

    /// Read a signed 16-bit value, or `default` if it does not fit.
    pub fn read_short_or(&mut self, default: i16) -> i16 {
        self.try_read_short().unwrap_or(default)
    }

    /// Read an unsigned 16-bit value, or `default` if it does not fit.
    pub fn read_ushort_or(&mut self, default: u16) -> u16 {
        self.try_read_ushort().unwrap_or(default)
    }

    /// Read a signed 32-bit value, or `default` if it does not fit.
    pub fn read_int_or(&mut self, default: i32) -> i32 {
        self.try_read_int().unwrap_or(default)
    }

    /// Read a signed 64-bit value, or `default` if it does not fit.
    pub fn read_long_or(&mut self, default: i64) -> i64 {
        self.try_read_long().unwrap_or(default)
    }

    /// Read a float, or `default` if it does not fit.
    pub fn read_float_or(&mut self, default: f32) -> f32 {
        self.try_read_float().unwrap_or(default)
    }

    /// Read a string, or a copy of `default` if it cannot be read.
    pub fn read_string_or(&mut self, default: &str) -> String {
        self.try_read_string().unwrap_or_else(|_| default.to_owned())
    }

    /// Read a partial number, or `default` if it cannot be read.
    pub fn read_partial_number_or(&mut self, width: u32, default: u32) -> u32 {
        self.try_read_partial_number(width).unwrap_or(default)
    }
}

impl From<Vec<u8>> for BitBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}

impl From<&[u8]> for BitBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_slice(bytes)
    }
}

/// Longest prefix of `value` that fits the 16-bit length and ends on a
/// character boundary.
fn clip_to_prefix_limit(value: &str) -> &str {
    if value.len() <= MAX_STRING_BYTES {
        return value;
    }
    let mut end = MAX_STRING_BYTES;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
