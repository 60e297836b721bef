//! String codecs: Latin-1, UTF-8 and UTF-16 with byte-order-mark detection.

use crate::error::{Error, Result};
use crate::primitives::Endian;
use encoding_rs::{UTF_16BE, UTF_16LE};
use log::debug;
use serde::Serialize;

/// Decodes ISO-8859-1; every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub fn encode_latin1(s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|c| {
            u8::try_from(c as u32)
                .map_err(|_| Error::InvalidText(format!("{c:?} is not representable in Latin-1")))
        })
        .collect()
}

/// Decodes UTF-16, honouring a leading byte-order mark and falling back to
/// `default` when none is present. Malformed sequences become U+FFFD.
pub fn decode_utf16(bytes: &[u8], default: Endian) -> String {
    let (encoding, body) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
        [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
        _ => match default {
            Endian::Little => (UTF_16LE, bytes),
            Endian::Big => (UTF_16BE, bytes),
        },
    };
    let (text, malformed) = encoding.decode_without_bom_handling(body);
    if malformed {
        debug!("malformed UTF-16 in {} bytes, replaced", bytes.len());
    }
    text.into_owned()
}

pub fn encode_utf16(s: &str, endian: Endian, bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() * 2 + 2);
    let push = |out: &mut Vec<u8>, unit: u16| match endian {
        Endian::Big => out.extend_from_slice(&unit.to_be_bytes()),
        Endian::Little => out.extend_from_slice(&unit.to_le_bytes()),
    };
    if bom {
        push(&mut out, 0xFEFF);
    }
    for unit in s.encode_utf16() {
        push(&mut out, unit);
    }
    out
}

/// Strips trailing NUL code points, the usual string padding in all three formats.
pub fn trim_nul(s: &str) -> &str {
    s.trim_end_matches('\0')
}

/// The text-encoding selector byte that prefixes many ID3v2 frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    Latin1,
    /// UTF-16 with byte-order mark.
    Utf16,
    Utf16Be,
    Utf8,
}

impl TextEncoding {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(TextEncoding::Latin1),
            1 => Ok(TextEncoding::Utf16),
            2 => Ok(TextEncoding::Utf16Be),
            3 => Ok(TextEncoding::Utf8),
            other => Err(Error::InvalidText(format!("unknown text encoding {other}"))),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            TextEncoding::Latin1 => 0,
            TextEncoding::Utf16 => 1,
            TextEncoding::Utf16Be => 2,
            TextEncoding::Utf8 => 3,
        }
    }

    pub fn terminator(self) -> &'static [u8] {
        match self {
            TextEncoding::Utf16 | TextEncoding::Utf16Be => &[0, 0],
            TextEncoding::Latin1 | TextEncoding::Utf8 => &[0],
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Latin1 => decode_latin1(bytes),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf16 => decode_utf16(bytes, Endian::Little),
            TextEncoding::Utf16Be => decode_utf16(bytes, Endian::Big),
        }
    }

    /// Encodes without a terminator. The BOM-carrying variant always starts
    /// with a little-endian BOM, even for an empty string.
    pub fn encode(self, s: &str) -> Result<Vec<u8>> {
        Ok(match self {
            TextEncoding::Latin1 => encode_latin1(s)?,
            TextEncoding::Utf8 => s.as_bytes().to_vec(),
            TextEncoding::Utf16 => encode_utf16(s, Endian::Little, true),
            TextEncoding::Utf16Be => encode_utf16(s, Endian::Big, false),
        })
    }

    /// Encodes followed by the terminator.
    pub fn encode_terminated(self, s: &str) -> Result<Vec<u8>> {
        let mut out = self.encode(s)?;
        out.extend_from_slice(self.terminator());
        Ok(out)
    }

    /// Splits `bytes` at the first terminator, returning the text before it
    /// and the remainder after it. Without a terminator the whole slice is text.
    pub fn split_terminated(self, bytes: &[u8]) -> (&[u8], &[u8]) {
        let width = self.terminator().len();
        let mut i = 0;
        while i + width <= bytes.len() {
            if bytes[i..i + width].iter().all(|&b| b == 0) {
                return (&bytes[..i], &bytes[i + width..]);
            }
            i += width;
        }
        (bytes, &[])
    }

    /// Decodes one terminated string from the front of `bytes`.
    pub fn take_string(self, bytes: &[u8]) -> (String, &[u8]) {
        let (text, rest) = self.split_terminated(bytes);
        (self.decode(text), rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_bom_detection() {
        let le = [0xFF, 0xFE, b'h', 0, b'i', 0];
        let be = [0xFE, 0xFF, 0, b'h', 0, b'i'];
        assert_eq!(decode_utf16(&le, Endian::Big), "hi");
        assert_eq!(decode_utf16(&be, Endian::Little), "hi");
        assert_eq!(decode_utf16(&[0, b'h'], Endian::Big), "h");
        assert_eq!(decode_utf16(&[b'h', 0], Endian::Little), "h");
    }

    #[test]
    fn utf16_encode_emits_bom_only_for_bom_variant() {
        assert_eq!(TextEncoding::Utf16.encode("a").unwrap(), vec![0xFF, 0xFE, b'a', 0]);
        assert_eq!(TextEncoding::Utf16Be.encode("a").unwrap(), vec![0, b'a']);
        assert_eq!(TextEncoding::Utf16.encode("").unwrap(), vec![0xFF, 0xFE]);
        assert_eq!(TextEncoding::Utf16.encode_terminated("").unwrap(), vec![0xFF, 0xFE, 0, 0]);
    }

    #[test]
    fn latin1_round_trip() {
        let bytes = encode_latin1("caf\u{e9}").unwrap();
        assert_eq!(bytes, vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(decode_latin1(&bytes), "caf\u{e9}");
        assert!(encode_latin1("\u{263a}").is_err());
    }

    #[test]
    fn split_respects_unit_alignment() {
        // "a\0" as UTF-16LE is 61 00 00 00: the first zero pair at odd offset 1 must be skipped.
        let bytes = [0x61, 0x00, 0x00, 0x00, 0x62, 0x00];
        let (text, rest) = TextEncoding::Utf16Be.split_terminated(&bytes);
        assert_eq!(text, &[0x61, 0x00]);
        assert_eq!(rest, &[0x62, 0x00]);
        let (text, rest) = TextEncoding::Latin1.split_terminated(b"ab\0cd");
        assert_eq!(text, b"ab");
        assert_eq!(rest, b"cd");
    }
}
