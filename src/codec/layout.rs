use crate::types::{
    errors::LayoutError,
    signal::{Endianness, Signedness},
};

/// The part of a field stored in one payload byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) byte_index: usize,
    /// Lowest payload bit of the run, native numbering (bit 0 = `0x01`).
    pub(crate) src_lsb: u8,
    /// Run length, 1 to 8 bits.
    pub(crate) width: u8,
    /// Where the run's lowest bit lands in the raw value.
    pub(crate) dst_lsb: u8,
}

impl Step {
    #[inline]
    fn mask(&self) -> u8 {
        low_mask(self.width as u16) as u8
    }
}

/// Precompiled byte-wise layout of a bit field.
///
/// Compiled once from offset, length and bit ordering; the same steps drive
/// both extraction and insertion, so the two are inverses by construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitLayout {
    pub(crate) steps: Vec<Step>,
    bit_length: u16,
    end_bit: usize,
}

impl BitLayout {
    /// Precomputes the extraction steps for a field of `bit_length` bits.
    pub fn compile(
        bit_offset: u16,
        bit_length: u16,
        endian: Endianness,
    ) -> Result<BitLayout, LayoutError> {
        if bit_length == 0 {
            return Err(LayoutError::ZeroBitLength);
        }
        if bit_length > 64 {
            return Err(LayoutError::TooWide { bit_length });
        }

        let steps: Vec<Step> = match endian {
            Endianness::Little => compile_little(bit_offset, bit_length),
            Endianness::Big => compile_big(bit_offset, bit_length),
        };

        Ok(BitLayout {
            steps,
            bit_length,
            end_bit: bit_offset as usize + bit_length as usize,
        })
    }

    #[inline]
    pub fn bit_length(&self) -> u16 {
        self.bit_length
    }

    /// Smallest payload size in bits that holds the field.
    #[inline]
    pub fn end_bit(&self) -> usize {
        self.end_bit
    }

    /// Checks the field against a payload of `capacity_bits` bits.
    pub fn check_fits(&self, capacity_bits: usize) -> Result<(), LayoutError> {
        if self.end_bit > capacity_bits {
            return Err(LayoutError::OutOfBounds {
                end_bit: self.end_bit,
                capacity_bits,
            });
        }
        Ok(())
    }

    /// Reads the field as an unsigned integer.
    pub fn extract(&self, payload: &[u8]) -> Result<u64, LayoutError> {
        self.check_fits(payload.len() * 8)?;
        let mut out: u64 = 0;
        for st in &self.steps {
            let chunk: u64 = ((payload[st.byte_index] >> st.src_lsb) & st.mask()) as u64;
            out |= chunk << st.dst_lsb;
        }
        Ok(out)
    }

    /// Writes the low `bit_length` bits of `raw` into the payload; other bits are kept.
    pub fn insert(&self, payload: &mut [u8], raw: u64) -> Result<(), LayoutError> {
        self.check_fits(payload.len() * 8)?;
        for st in &self.steps {
            let mask: u8 = st.mask();
            let chunk: u8 = ((raw >> st.dst_lsb) as u8) & mask;
            let byte: &mut u8 = &mut payload[st.byte_index];
            *byte = (*byte & !(mask << st.src_lsb)) | (chunk << st.src_lsb);
        }
        Ok(())
    }

    /// Extracts the field, sign-extending it when `sign` is signed.
    pub fn decode(&self, payload: &[u8], sign: Signedness) -> Result<i128, LayoutError> {
        let raw: u64 = self.extract(payload)?;
        if sign.is_signed() {
            Ok(sign_extend(raw, self.bit_length) as i128)
        } else {
            Ok(raw as i128)
        }
    }

    /// Stores the two's-complement low bits of `value` in the field.
    ///
    /// A value that does not fit the field is truncated.
    pub fn encode(&self, payload: &mut [u8], sign: Signedness, value: i128) -> Result<(), LayoutError> {
        if !value_fits(value, self.bit_length, sign) {
            tracing::debug!(
                value = %value,
                bit_length = self.bit_length,
                "value truncated to field width"
            );
        }
        self.insert(payload, (value as u64) & low_mask(self.bit_length))
    }
}

/// Splits the bit range `[bit_offset, bit_offset + bit_length)` at byte
/// boundaries, yielding `(first_bit, width)` per touched byte.
fn byte_runs(bit_offset: u16, bit_length: u16) -> impl Iterator<Item = (usize, u8)> {
    let end: usize = bit_offset as usize + bit_length as usize;
    let mut pos: usize = bit_offset as usize;
    std::iter::from_fn(move || {
        if pos >= end {
            return None;
        }
        let width: usize = ((pos | 7) + 1).min(end) - pos;
        let first: usize = pos;
        pos += width;
        Some((first, width as u8))
    })
}

/// Intel ordering: bit `n` is bit `n % 8` of byte `n / 8` and the offset is
/// the field's LSB, so runs fill the value from the bottom up.
fn compile_little(bit_offset: u16, bit_length: u16) -> Vec<Step> {
    byte_runs(bit_offset, bit_length)
        .map(|(first, width)| Step {
            byte_index: first / 8,
            src_lsb: (first % 8) as u8,
            width,
            dst_lsb: (first - bit_offset as usize) as u8,
        })
        .collect()
}

/// Motorola ordering with MSB-first numbering: bit `n` is bit `7 - n % 8` of
/// byte `n / 8` and the offset is the field's MSB, so runs fill the value from
/// the top down.
fn compile_big(bit_offset: u16, bit_length: u16) -> Vec<Step> {
    let end: usize = bit_offset as usize + bit_length as usize;
    byte_runs(bit_offset, bit_length)
        .map(|(first, width)| Step {
            byte_index: first / 8,
            src_lsb: 8 - (first % 8) as u8 - width,
            width,
            dst_lsb: (end - first - width as usize) as u8,
        })
        .collect()
}

#[inline]
pub(crate) fn low_mask(bit_length: u16) -> u64 {
    if bit_length >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_length) - 1
    }
}

/// Sign extension from bit `bit_length - 1`.
#[inline]
pub(crate) fn sign_extend(raw: u64, bit_length: u16) -> i64 {
    let n: u16 = bit_length.min(64);
    if n == 0 {
        return 0;
    }
    let sign_bit: u64 = 1u64 << (n - 1);
    if raw & sign_bit != 0 {
        (raw | !low_mask(n)) as i64
    } else {
        raw as i64
    }
}

/// `true` if `value` is representable in `bit_length` bits with the given sign.
pub(crate) fn value_fits(value: i128, bit_length: u16, sign: Signedness) -> bool {
    let n: u32 = bit_length.min(64) as u32;
    if sign.is_signed() {
        let half: i128 = 1i128 << (n - 1);
        (-half..half).contains(&value)
    } else {
        (0..(1i128 << n)).contains(&value)
    }
}
