//! Identifier types: FourCC for ISO-14496 boxes, GUID for ASF objects and
//! short ASCII ids for ID3v2 frames.

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn new(b: &[u8; 4]) -> Self {
        FourCC(*b)
    }

    /// Parses four Latin-1 characters, so `"©nam"` maps to `A9 6E 61 6D`.
    pub fn from_str(s: &str) -> Option<Self> {
        let bytes: Vec<u8> = s
            .chars()
            .map(|c| u8::try_from(c as u32).ok())
            .collect::<Option<_>>()?;
        let b: [u8; 4] = bytes.try_into().ok()?;
        Some(FourCC(b))
    }

    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| {
                if (32..=126).contains(&c) || c >= 0xA0 {
                    c as char
                } else {
                    '.'
                }
            })
            .collect()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}
impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}
impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_str_lossy())
    }
}

/// A 16-byte GUID in the on-disk (mixed-endian) layout used by ASF: the
/// first three groups are little-endian, the last eight bytes are verbatim.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub const fn from_fields(d1: u32, d2: u16, d3: u16, d4: [u8; 8]) -> Self {
        let a = d1.to_le_bytes();
        let b = d2.to_le_bytes();
        let c = d3.to_le_bytes();
        Guid([
            a[0], a[1], a[2], a[3], b[0], b[1], c[0], c[1], d4[0], d4[1], d4[2], d4[3], d4[4],
            d4[5], d4[6], d4[7],
        ])
    }

    /// Parses the canonical `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX` form.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 5 || parts.iter().map(|p| p.len()).ne([8, 4, 4, 4, 12]) {
            return None;
        }
        let d1 = u32::from_str_radix(parts[0], 16).ok()?;
        let d2 = u16::from_str_radix(parts[1], 16).ok()?;
        let d3 = u16::from_str_radix(parts[2], 16).ok()?;
        let tail = hex::decode(format!("{}{}", parts[3], parts[4])).ok()?;
        Some(Guid::from_fields(d1, d2, d3, tail.try_into().ok()?))
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        let d1 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let d2 = u16::from_le_bytes([b[4], b[5]]);
        let d3 = u16::from_le_bytes([b[6], b[7]]);
        write!(
            f,
            "{d1:08X}-{d2:04X}-{d3:04X}-{}-{}",
            hex::encode_upper(&b[8..10]),
            hex::encode_upper(&b[10..16])
        )
    }
}
impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// An ID3v2 frame identifier: three characters in v2.2, four afterwards.
/// The tag itself uses `ID3`, padding uses the lowercase pseudo-id `padding`.
#[derive(Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct FrameId(String);

impl FrameId {
    pub fn new(id: impl Into<String>) -> Self {
        FrameId(id.into())
    }

    pub fn tag() -> Self {
        FrameId::new("ID3")
    }

    pub fn padding() -> Self {
        FrameId::new("padding")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Frame ids are uppercase letters and digits only.
    pub fn is_valid_frame(bytes: &[u8]) -> bool {
        !bytes.is_empty()
            && bytes
                .iter()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
impl From<&str> for FrameId {
    fn from(s: &str) -> Self {
        FrameId::new(s)
    }
}
