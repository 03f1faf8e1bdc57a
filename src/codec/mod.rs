//! # codec
//!
//! Bit-field pack/unpack primitives. Fields are 1 to 64 bits wide, start at any
//! bit offset and use either bit ordering of [`Endianness`]. Values travel as a
//! single `i128` so that the full unsigned and signed 64 bit ranges fit.
//!
//! Geometry that crosses the payload is reported as [`LayoutError`] and the
//! payload is left untouched.

mod layout;

pub use layout::BitLayout;

use crate::types::{
    errors::LayoutError,
    signal::{Endianness, Signedness},
};

/// Reads a field from `payload`.
///
/// ```rust
/// use can_kcd::codec;
/// use can_kcd::{Endianness, Signedness};
///
/// let data = [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xBA, 0xBE];
/// let v = codec::decode(&data, 0, 16, Endianness::Big, Signedness::Unsigned).unwrap();
/// assert_eq!(v, 0xDEAD);
/// ```
pub fn decode(
    payload: &[u8],
    bit_offset: u16,
    bit_length: u16,
    endian: Endianness,
    sign: Signedness,
) -> Result<i128, LayoutError> {
    BitLayout::compile(bit_offset, bit_length, endian)?.decode(payload, sign)
}

/// Writes `value` into a field of `payload` (read-modify-write).
///
/// Negative values are stored in two's complement; bits outside the field are kept.
pub fn encode(
    payload: &mut [u8],
    bit_offset: u16,
    bit_length: u16,
    endian: Endianness,
    sign: Signedness,
    value: i128,
) -> Result<(), LayoutError> {
    BitLayout::compile(bit_offset, bit_length, endian)?.encode(payload, sign, value)
}
