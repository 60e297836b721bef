use mediabox::bits::{SYNCHSAFE_MAX, decode_synchsafe, encode_synchsafe, get_bits, is_synchsafe, set_bits};
use mediabox::primitives::{Endian, decode_int, decode_uint, encode_int, encode_uint};
use mediabox::splice::shift_tail;
use mediabox::Pattern;
use proptest::prelude::*;
use std::io::Cursor;

fn endian() -> impl Strategy<Value = Endian> {
    prop_oneof![Just(Endian::Big), Just(Endian::Little)]
}

proptest! {
    #[test]
    fn synchsafe_round_trips(v in 0..=SYNCHSAFE_MAX) {
        let raw = encode_synchsafe(v).unwrap();
        prop_assert!(is_synchsafe(raw));
        prop_assert_eq!(decode_synchsafe(raw), v);
    }

    #[test]
    fn synchsafe_rejects_29_bits(v in (SYNCHSAFE_MAX + 1)..=u32::MAX) {
        prop_assert!(encode_synchsafe(v).is_err());
    }

    #[test]
    fn uint_codec_round_trips(width in 1usize..=8, seed: u64, e in endian()) {
        let value = if width == 8 { seed } else { seed & ((1u64 << (width * 8)) - 1) };
        let bytes = encode_uint(value, width, e).unwrap();
        prop_assert_eq!(bytes.len(), width);
        prop_assert_eq!(decode_uint(&bytes, e).unwrap(), value);
    }

    #[test]
    fn int_codec_round_trips(width in 1usize..=8, seed: i64, e in endian()) {
        let shift = 64 - width as u32 * 8;
        let value = (seed << shift) >> shift;
        let bytes = encode_int(value, width, e).unwrap();
        prop_assert_eq!(decode_int(&bytes, e).unwrap(), value);
    }

    #[test]
    fn set_then_get_bits(value: u64, offset in 0u32..64, width in 1u32..=64, field: u64) {
        let width = width.min(64 - offset);
        let updated = set_bits(value, offset, width, field);
        let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
        prop_assert_eq!(get_bits(updated, offset, width), field & mask);
    }

    #[test]
    fn shifting_the_tail_preserves_both_sides(
        len in 0usize..3000,
        at_frac in 0.0f64..=1.0,
        delta in -1500i64..1500,
        block in 1usize..700,
    ) {
        let at = (len as f64 * at_frac) as usize;
        prop_assume!(delta >= 0 || (delta.unsigned_abs() as usize) <= at);
        let before: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
        let mut s = Cursor::new(before.clone());
        let new_len = shift_tail(&mut s, at as u64, delta, block).unwrap();
        let after = s.into_inner();
        prop_assert_eq!(new_len as usize, after.len());
        prop_assert_eq!(after.len() as i64, len as i64 + delta);
        let moved_to = (at as i64 + delta) as usize;
        prop_assert_eq!(&after[moved_to..], &before[at..]);
        let kept = at.min(moved_to);
        prop_assert_eq!(&after[..kept], &before[..kept]);
    }

    #[test]
    fn star_matches_everything(text in "[a-zA-Z0-9 ]{0,12}") {
        prop_assert!(Pattern::new("*").unwrap().matches(&text));
        prop_assert!(Pattern::new(&text).unwrap().matches(&text.to_uppercase()));
    }
}

#[test]
fn uint_boundaries_round_trip_at_every_width() {
    for width in 1..=8usize {
        let max = if width == 8 { u64::MAX } else { (1u64 << (width * 8)) - 1 };
        for e in [Endian::Big, Endian::Little] {
            for v in [0, max] {
                let bytes = encode_uint(v, width, e).unwrap();
                assert_eq!(decode_uint(&bytes, e).unwrap(), v, "width {width}");
            }
            if width < 8 {
                assert!(encode_uint(max + 1, width, e).is_err(), "width {width}");
            }
        }
    }
}

#[test]
fn int_boundaries_round_trip_at_every_width() {
    for width in 1..=8usize {
        let shift = 64 - width as u32 * 8;
        let (min, max) = (i64::MIN >> shift, i64::MAX >> shift);
        for e in [Endian::Big, Endian::Little] {
            for v in [0, -1, min, max] {
                let bytes = encode_int(v, width, e).unwrap();
                assert_eq!(bytes.len(), width);
                assert_eq!(decode_int(&bytes, e).unwrap(), v, "width {width}");
            }
            if width < 8 {
                assert!(encode_int(max + 1, width, e).is_err(), "width {width}");
                assert!(encode_int(min - 1, width, e).is_err(), "width {width}");
            }
        }
    }
}
