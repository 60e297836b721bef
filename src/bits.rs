//! Integer bit-field helpers for fields that pack sub-byte flags.

use crate::error::{Error, Result};

/// A mask with the low `width` bits set. `width` above 64 saturates.
pub fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Extracts `width` bits starting at bit `offset` (bit 0 is the least significant).
pub fn get_bits(value: u64, offset: u32, width: u32) -> u64 {
    if offset >= 64 {
        return 0;
    }
    (value >> offset) & mask(width)
}

/// Returns `value` with the `width`-bit field at `offset` replaced by `field`.
/// Bits of `field` above `width` are discarded.
pub fn set_bits(value: u64, offset: u32, width: u32, field: u64) -> u64 {
    if offset >= 64 {
        return value;
    }
    let m = mask(width) << offset;
    (value & !m) | ((field << offset) & m)
}

pub fn test_bit(value: u64, bit: u32) -> bool {
    get_bits(value, bit, 1) == 1
}

pub fn with_bit(value: u64, bit: u32, on: bool) -> u64 {
    set_bits(value, bit, 1, on as u64)
}

/// Splits a full-record leading word into its 8-bit version and 24-bit flags.
pub fn split_version_flags(word: u32) -> (u8, u32) {
    let w = word as u64;
    (get_bits(w, 24, 8) as u8, get_bits(w, 0, 24) as u32)
}

/// Inverse of [`split_version_flags`]; flag bits above 24 are dropped.
pub fn join_version_flags(version: u8, flags: u32) -> u32 {
    set_bits(flags as u64 & mask(24), 24, 8, version as u64) as u32
}

/// Largest value a 4-byte synchsafe integer can carry.
pub const SYNCHSAFE_MAX: u32 = (1 << 28) - 1;

/// Decodes a 4-byte synchsafe integer (7 significant bits per byte).
pub fn decode_synchsafe(raw: u32) -> u32 {
    let raw = raw as u64;
    let mut out = 0u64;
    for i in 0..4 {
        out = set_bits(out, i * 7, 7, get_bits(raw, i * 8, 7));
    }
    out as u32
}

/// Encodes `value` as a 4-byte synchsafe integer.
pub fn encode_synchsafe(value: u32) -> Result<u32> {
    if value > SYNCHSAFE_MAX {
        return Err(Error::layout(format!(
            "{value} does not fit a synchsafe integer"
        )));
    }
    let value = value as u64;
    let mut out = 0u64;
    for i in 0..4 {
        out = set_bits(out, i * 8, 7, get_bits(value, i * 7, 7));
    }
    Ok(out as u32)
}

/// Whether all bytes of a big-endian 32-bit word have their top bit clear.
pub fn is_synchsafe(raw: u32) -> bool {
    raw & 0x8080_8080 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_and_flags_split() {
        let (v, f) = split_version_flags(0x0100_0005);
        assert_eq!(v, 1);
        assert_eq!(f, 5);
        assert_eq!(join_version_flags(v, f), 0x0100_0005);
        assert_eq!(join_version_flags(0xFF, 0xFFFF_FFFF), 0xFFFF_FFFF);
    }

    #[test]
    fn set_and_get_fields() {
        let v = set_bits(0, 4, 3, 0b101);
        assert_eq!(v, 0b101_0000);
        assert_eq!(get_bits(v, 4, 3), 0b101);
        assert!(test_bit(v, 4));
        assert!(!test_bit(v, 5));
        assert_eq!(with_bit(v, 5, true), 0b111_0000);
        assert_eq!(mask(64), u64::MAX);
        assert_eq!(mask(0), 0);
    }

    #[test]
    fn synchsafe_round_trip() {
        assert_eq!(encode_synchsafe(257).unwrap(), 0x0000_0201);
        assert_eq!(decode_synchsafe(0x0000_0201), 257);
        assert_eq!(decode_synchsafe(encode_synchsafe(SYNCHSAFE_MAX).unwrap()), SYNCHSAFE_MAX);
        assert!(encode_synchsafe(SYNCHSAFE_MAX + 1).is_err());
        assert!(is_synchsafe(0x7F7F_7F7F));
        assert!(!is_synchsafe(0x0000_0080));
    }
}
