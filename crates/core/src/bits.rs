//! Bit cursor arithmetic.
//!
//! Pure helpers shared by the bit buffer: converting between bit and byte
//! positions, testing alignment, and flipping single bits inside an integer.
//! Bit index 0 is the least significant bit.

/// Number of bits in a byte.
pub const BITS_PER_BYTE: usize = 8;

/// Width of the largest integer a partial number may be cut from.
pub const INT_SIZE_IN_BITS: u32 = 32;

/// Number of bytes needed to hold `bit_size` bits (rounds up).
pub fn bit_size_to_byte_size(bit_size: usize) -> usize {
    bit_size.div_ceil(BITS_PER_BYTE)
}

/// Index of the byte containing bit `index`.
pub fn bit_index_to_byte_index(index: usize) -> usize {
    index >> 3
}

/// Offset of bit `index` within its byte.
pub fn bit_offset_in_byte(index: usize) -> u32 {
    (index & 7) as u32
}

/// True when `bits` falls on a byte boundary.
pub fn is_byte_aligned(bits: usize) -> bool {
    bits & 7 == 0
}

/// Round `bits` up to the next byte boundary.
pub fn align_up(bits: usize) -> usize {
    bit_size_to_byte_size(bits) * BITS_PER_BYTE
}

/// Read bit `index` of `value`.
pub fn get(value: u32, index: u32) -> bool {
    (value >> index) & 1 == 1
}

/// Return `value` with bit `index` set to `state`.
pub fn set(value: u32, index: u32, state: bool) -> u32 {
    if state {
        value | (1 << index)
    } else {
        value & !(1 << index)
    }
}

/// Smallest width that can hold `value` as a partial number.
///
/// Zero still needs one bit on the wire, so `used_bits(0)` is 1.
pub fn used_bits(value: u32) -> u32 {
    (INT_SIZE_IN_BITS - value.leading_zeros()).max(1)
}
