//! ISO-14496 box headers and typed box records.

use crate::bits::{get_bits, join_version_flags, set_bits, split_version_flags, test_bit};
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::format::{NodeHeader, Record};
use crate::ids::FourCC;
use crate::node::Raw;
use crate::util::{serialize_hex, serialize_hex_opt};
use byteorder::{BigEndian, WriteBytesExt};
use serde::{Serialize, Serializer};
use std::fmt;

type BE = BigEndian;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoxKey {
    FourCC(FourCC),
    Uuid([u8; 16]),
}

impl BoxKey {
    pub const fn cc(b: &[u8; 4]) -> Self {
        BoxKey::FourCC(FourCC(*b))
    }

    pub fn fourcc(&self) -> Option<FourCC> {
        match self {
            BoxKey::FourCC(cc) => Some(*cc),
            BoxKey::Uuid(_) => None,
        }
    }

    pub fn is(&self, b: &[u8; 4]) -> bool {
        matches!(self, BoxKey::FourCC(cc) if cc.0 == *b)
    }
}

impl fmt::Display for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxKey::FourCC(cc) => write!(f, "{cc}"),
            BoxKey::Uuid(u) => write!(f, "uuid:{}", hex::encode(u)),
        }
    }
}

impl Serialize for BoxKey {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Size field width of an encoded box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    /// 32-bit size.
    Compact,
    /// size == 1 followed by a 64-bit size.
    Large,
    /// size == 0: the box runs to the end of its parent.
    ToEnd,
    /// No header at all; bytes after the last box of a container.
    Bare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxHeader {
    pub key: BoxKey,
    pub size: u64,
    pub field: SizeField,
}

impl BoxHeader {
    /// A header for a box built in memory; its size is set by recomputation.
    pub fn new(key: BoxKey) -> Self {
        let mut h = Self {
            key,
            size: 0,
            field: SizeField::Compact,
        };
        h.size = h.header_len();
        h
    }

    pub fn bare(len: u64) -> Self {
        Self {
            key: BoxKey::cc(&[0; 4]),
            size: len,
            field: SizeField::Bare,
        }
    }

    /// Reads a header at the cursor. Fewer than 8 bytes before `limit` is
    /// the end of the box list.
    pub fn read(cur: &mut ByteCursor, limit: u64) -> Result<Option<Self>> {
        let start = cur.tell();
        let avail = limit.saturating_sub(start);
        if avail < 8 {
            return Ok(None);
        }
        let size32 = cur.read_u32::<BE>()?;
        let typ = cur.read_fourcc()?;
        let (size, field) = match size32 {
            0 => (avail, SizeField::ToEnd),
            1 => (cur.read_u64::<BE>()?, SizeField::Large),
            n => (n as u64, SizeField::Compact),
        };
        let key = if typ.0 == *b"uuid" {
            BoxKey::Uuid(cur.read_array::<16>()?)
        } else {
            BoxKey::FourCC(typ)
        };
        let header = Self { key, size, field };
        if size < header.header_len() {
            return Err(Error::header(
                start,
                format!("{} declares {size} bytes, less than its header", header.key),
            ));
        }
        Ok(Some(header))
    }
}

impl NodeHeader for BoxHeader {
    type Id = BoxKey;

    fn id(&self) -> &BoxKey {
        &self.key
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn header_len(&self) -> u64 {
        let base = match self.field {
            SizeField::Bare => return 0,
            SizeField::Large => 16,
            SizeField::Compact | SizeField::ToEnd => 8,
        };
        match self.key {
            BoxKey::Uuid(_) => base + 16,
            BoxKey::FourCC(_) => base,
        }
    }

    fn resize(&mut self, content_len: u64) -> Result<()> {
        if self.field == SizeField::Compact && self.header_len() + content_len > u32::MAX as u64 {
            self.field = SizeField::Large;
        }
        self.size = self.header_len() + content_len;
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self.field {
            SizeField::Bare => return Ok(()),
            SizeField::Compact => {
                let size = u32::try_from(self.size)
                    .map_err(|_| Error::layout(format!("{} too large for a 32-bit size", self.key)))?;
                out.write_u32::<BE>(size)?;
            }
            SizeField::ToEnd => out.write_u32::<BE>(0)?,
            SizeField::Large => out.write_u32::<BE>(1)?,
        }
        match &self.key {
            BoxKey::FourCC(cc) => out.extend_from_slice(&cc.0),
            BoxKey::Uuid(_) => out.extend_from_slice(b"uuid"),
        }
        if self.field == SizeField::Large {
            out.write_u64::<BE>(self.size)?;
        }
        if let BoxKey::Uuid(u) = &self.key {
            out.extend_from_slice(u);
        }
        Ok(())
    }
}

/// The version + flags word in front of a full box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FullHeader {
    pub version: u8,
    pub flags: u32,
}

impl FullHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let (version, flags) = split_version_flags(cur.read_u32::<BE>()?);
        Ok(Self { version, flags })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u32::<BE>(join_version_flags(self.version, self.flags))?;
        Ok(())
    }

    fn has(&self, bit: u32) -> bool {
        self.flags & bit != 0
    }

    fn set(&mut self, bit: u32, on: bool) {
        if on {
            self.flags |= bit;
        } else {
            self.flags &= !bit;
        }
    }
}

fn check_version(what: &'static str, full: &FullHeader, max: u8) -> Result<()> {
    if full.version > max {
        return Err(Error::UnsupportedVersion {
            what,
            version: full.version as u32,
        });
    }
    Ok(())
}

/// Reads `count` table entries, refusing counts the remaining bytes cannot hold.
fn read_table<T>(
    cur: &mut ByteCursor,
    count: u32,
    entry_len: u64,
    mut read: impl FnMut(&mut ByteCursor) -> Result<T>,
) -> Result<Vec<T>> {
    let needed = count as u64 * entry_len;
    if needed > cur.remaining() {
        return Err(Error::TruncatedInput {
            offset: cur.tell(),
            needed,
            available: cur.remaining(),
        });
    }
    (0..count).map(|_| read(cur)).collect()
}

fn table_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::layout("table has more than 2^32 entries"))
}

/// Times and durations that are 32-bit in version 0 and 64-bit in version 1.
fn read_versioned(cur: &mut ByteCursor, version: u8) -> Result<u64> {
    if version == 1 {
        cur.read_u64::<BE>()
    } else {
        Ok(cur.read_u32::<BE>()? as u64)
    }
}

/// Composition offsets are unsigned in version 0 and signed from version 1.
fn write_composition_offset(out: &mut Vec<u8>, version: u8, value: i64) -> Result<()> {
    if version == 0 {
        let v = u32::try_from(value)
            .map_err(|_| Error::layout(format!("composition offset {value} needs a version 1 box")))?;
        out.write_u32::<BE>(v)?;
    } else {
        let v = i32::try_from(value)
            .map_err(|_| Error::layout(format!("composition offset {value} does not fit 32 bits")))?;
        out.write_i32::<BE>(v)?;
    }
    Ok(())
}

fn write_versioned(out: &mut Vec<u8>, version: u8, value: u64) -> Result<()> {
    if version == 1 {
        out.write_u64::<BE>(value)?;
    } else {
        let v = u32::try_from(value)
            .map_err(|_| Error::layout(format!("{value} needs a version 1 box")))?;
        out.write_u32::<BE>(v)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileType {
    pub major_brand: FourCC,
    pub minor_version: u32,
    pub compatible_brands: Vec<FourCC>,
}

impl FileType {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let major_brand = cur.read_fourcc()?;
        let minor_version = cur.read_u32::<BE>()?;
        let mut compatible_brands = Vec::new();
        while cur.remaining() >= 4 {
            compatible_brands.push(cur.read_fourcc()?);
        }
        Ok(Self {
            major_brand,
            minor_version,
            compatible_brands,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.major_brand.0);
        out.write_u32::<BE>(self.minor_version)?;
        for b in &self.compatible_brands {
            out.extend_from_slice(&b.0);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieHeader {
    #[serde(flatten)]
    pub full: FullHeader,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    /// 16.16 fixed point.
    pub rate: i32,
    /// 8.8 fixed point.
    pub volume: i16,
    pub matrix: [i32; 9],
    pub next_track_id: u32,
}

impl MovieHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        check_version("mvhd", &full, 1)?;
        let creation_time = read_versioned(cur, full.version)?;
        let modification_time = read_versioned(cur, full.version)?;
        let timescale = cur.read_u32::<BE>()?;
        let duration = read_versioned(cur, full.version)?;
        let rate = cur.read_i32::<BE>()?;
        let volume = cur.read_i16::<BE>()?;
        cur.skip(10)?;
        let mut matrix = [0i32; 9];
        for m in &mut matrix {
            *m = cur.read_i32::<BE>()?;
        }
        cur.skip(24)?;
        let next_track_id = cur.read_u32::<BE>()?;
        Ok(Self {
            full,
            creation_time,
            modification_time,
            timescale,
            duration,
            rate,
            volume,
            matrix,
            next_track_id,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        write_versioned(out, self.full.version, self.creation_time)?;
        write_versioned(out, self.full.version, self.modification_time)?;
        out.write_u32::<BE>(self.timescale)?;
        write_versioned(out, self.full.version, self.duration)?;
        out.write_i32::<BE>(self.rate)?;
        out.write_i16::<BE>(self.volume)?;
        out.extend_from_slice(&[0; 10]);
        for m in self.matrix {
            out.write_i32::<BE>(m)?;
        }
        out.extend_from_slice(&[0; 24]);
        out.write_u32::<BE>(self.next_track_id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackHeader {
    #[serde(flatten)]
    pub full: FullHeader,
    pub creation_time: u64,
    pub modification_time: u64,
    pub track_id: u32,
    pub duration: u64,
    pub layer: i16,
    pub alternate_group: i16,
    pub volume: i16,
    pub matrix: [i32; 9],
    /// 16.16 fixed point.
    pub width: u32,
    pub height: u32,
}

impl TrackHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        check_version("tkhd", &full, 1)?;
        let creation_time = read_versioned(cur, full.version)?;
        let modification_time = read_versioned(cur, full.version)?;
        let track_id = cur.read_u32::<BE>()?;
        cur.skip(4)?;
        let duration = read_versioned(cur, full.version)?;
        cur.skip(8)?;
        let layer = cur.read_i16::<BE>()?;
        let alternate_group = cur.read_i16::<BE>()?;
        let volume = cur.read_i16::<BE>()?;
        cur.skip(2)?;
        let mut matrix = [0i32; 9];
        for m in &mut matrix {
            *m = cur.read_i32::<BE>()?;
        }
        let width = cur.read_u32::<BE>()?;
        let height = cur.read_u32::<BE>()?;
        Ok(Self {
            full,
            creation_time,
            modification_time,
            track_id,
            duration,
            layer,
            alternate_group,
            volume,
            matrix,
            width,
            height,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        write_versioned(out, self.full.version, self.creation_time)?;
        write_versioned(out, self.full.version, self.modification_time)?;
        out.write_u32::<BE>(self.track_id)?;
        out.write_u32::<BE>(0)?;
        write_versioned(out, self.full.version, self.duration)?;
        out.extend_from_slice(&[0; 8]);
        out.write_i16::<BE>(self.layer)?;
        out.write_i16::<BE>(self.alternate_group)?;
        out.write_i16::<BE>(self.volume)?;
        out.write_u16::<BE>(0)?;
        for m in self.matrix {
            out.write_i32::<BE>(m)?;
        }
        out.write_u32::<BE>(self.width)?;
        out.write_u32::<BE>(self.height)?;
        Ok(())
    }
}

/// Unpacks an ISO-639-2/T code stored as three 5-bit letters. Zero is "".
pub fn language_from_u16(code: u16) -> String {
    if code == 0 {
        return String::new();
    }
    (0..3)
        .rev()
        .map(|i| (get_bits(code as u64, i * 5, 5) as u8 + 0x60) as char)
        .collect()
}

pub fn language_to_u16(lang: &str) -> Result<u16> {
    if lang.is_empty() {
        return Ok(0);
    }
    let chars: Vec<char> = lang.chars().collect();
    if chars.len() != 3 || chars.iter().any(|c| !('\u{60}'..='\u{7f}').contains(c)) {
        return Err(Error::InvalidText(format!("{lang:?} is not a packed language code")));
    }
    let mut code = 0u64;
    for (i, c) in chars.iter().enumerate() {
        code = set_bits(code, (2 - i as u32) * 5, 5, *c as u64 - 0x60);
    }
    Ok(code as u16)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaHeader {
    #[serde(flatten)]
    pub full: FullHeader,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub language: String,
    pub quality: u16,
}

impl MediaHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        check_version("mdhd", &full, 1)?;
        Ok(Self {
            full,
            creation_time: read_versioned(cur, full.version)?,
            modification_time: read_versioned(cur, full.version)?,
            timescale: cur.read_u32::<BE>()?,
            duration: read_versioned(cur, full.version)?,
            language: language_from_u16(cur.read_u16::<BE>()?),
            quality: cur.read_u16::<BE>()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        write_versioned(out, self.full.version, self.creation_time)?;
        write_versioned(out, self.full.version, self.modification_time)?;
        out.write_u32::<BE>(self.timescale)?;
        write_versioned(out, self.full.version, self.duration)?;
        out.write_u16::<BE>(language_to_u16(&self.language)?)?;
        out.write_u16::<BE>(self.quality)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Handler {
    #[serde(flatten)]
    pub full: FullHeader,
    /// QuickTime component type (`mhlr`/`dhlr`); zero in ISO files.
    pub pre_defined: u32,
    pub handler_type: FourCC,
    pub reserved: [u32; 3],
    pub name: String,
    /// Whether the name ends with a NUL on disk.
    #[serde(skip)]
    pub terminated: bool,
}

impl Handler {
    /// The handler an iTunes-style `meta` box carries.
    pub fn metadata() -> Self {
        Self {
            full: FullHeader::default(),
            pre_defined: 0,
            handler_type: FourCC(*b"mdir"),
            reserved: [u32::from_be_bytes(*b"appl"), 0, 0],
            name: String::new(),
            terminated: true,
        }
    }

    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let pre_defined = cur.read_u32::<BE>()?;
        let handler_type = cur.read_fourcc()?;
        let mut reserved = [0u32; 3];
        for r in &mut reserved {
            *r = cur.read_u32::<BE>()?;
        }
        let mut rest = cur.read_to_limit()?;
        let terminated = rest.last() == Some(&0);
        if terminated {
            rest.pop();
        }
        Ok(Self {
            full,
            pre_defined,
            handler_type,
            reserved,
            name: String::from_utf8_lossy(&rest).into_owned(),
            terminated,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(self.pre_defined)?;
        out.extend_from_slice(&self.handler_type.0);
        for r in self.reserved {
            out.write_u32::<BE>(r)?;
        }
        out.extend_from_slice(self.name.as_bytes());
        if self.terminated {
            out.push(0);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMediaHeader {
    #[serde(flatten)]
    pub full: FullHeader,
    pub graphics_mode: u16,
    pub opcolor: [u16; 3],
}

impl VideoMediaHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let graphics_mode = cur.read_u16::<BE>()?;
        let mut opcolor = [0u16; 3];
        for c in &mut opcolor {
            *c = cur.read_u16::<BE>()?;
        }
        Ok(Self {
            full,
            graphics_mode,
            opcolor,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u16::<BE>(self.graphics_mode)?;
        for c in self.opcolor {
            out.write_u16::<BE>(c)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundMediaHeader {
    #[serde(flatten)]
    pub full: FullHeader,
    /// 8.8 fixed point.
    pub balance: i16,
}

impl SoundMediaHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let balance = cur.read_i16::<BE>()?;
        cur.skip(2)?;
        Ok(Self { full, balance })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_i16::<BE>(self.balance)?;
        out.write_u16::<BE>(0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditEntry {
    pub segment_duration: u64,
    pub media_time: i64,
    pub media_rate_integer: i16,
    pub media_rate_fraction: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditList {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entries: Vec<EditEntry>,
}

impl EditList {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        check_version("elst", &full, 1)?;
        let count = cur.read_u32::<BE>()?;
        let entry_len = if full.version == 1 { 20 } else { 12 };
        let entries = read_table(cur, count, entry_len, |c| {
            let (segment_duration, media_time) = if full.version == 1 {
                (c.read_u64::<BE>()?, c.read_i64::<BE>()?)
            } else {
                (c.read_u32::<BE>()? as u64, c.read_i32::<BE>()? as i64)
            };
            Ok(EditEntry {
                segment_duration,
                media_time,
                media_rate_integer: c.read_i16::<BE>()?,
                media_rate_fraction: c.read_i16::<BE>()?,
            })
        })?;
        Ok(Self { full, entries })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(table_len(self.entries.len())?)?;
        for e in &self.entries {
            if self.full.version == 1 {
                out.write_u64::<BE>(e.segment_duration)?;
                out.write_i64::<BE>(e.media_time)?;
            } else {
                write_versioned(out, 0, e.segment_duration)?;
                let t = i32::try_from(e.media_time)
                    .map_err(|_| Error::layout("media time needs a version 1 elst"))?;
                out.write_i32::<BE>(t)?;
            }
            out.write_i16::<BE>(e.media_rate_integer)?;
            out.write_i16::<BE>(e.media_rate_fraction)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeToSample {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entries: Vec<SttsEntry>,
}

impl TimeToSample {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let count = cur.read_u32::<BE>()?;
        let entries = read_table(cur, count, 8, |c| {
            Ok(SttsEntry {
                sample_count: c.read_u32::<BE>()?,
                sample_delta: c.read_u32::<BE>()?,
            })
        })?;
        Ok(Self { full, entries })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(table_len(self.entries.len())?)?;
        for e in &self.entries {
            out.write_u32::<BE>(e.sample_count)?;
            out.write_u32::<BE>(e.sample_delta)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CttsEntry {
    pub sample_count: u32,
    /// Unsigned in version 0, signed in version 1.
    pub sample_offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionOffsets {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entries: Vec<CttsEntry>,
}

impl CompositionOffsets {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        check_version("ctts", &full, 1)?;
        let count = cur.read_u32::<BE>()?;
        let entries = read_table(cur, count, 8, |c| {
            let sample_count = c.read_u32::<BE>()?;
            let sample_offset = if full.version == 1 {
                c.read_i32::<BE>()? as i64
            } else {
                c.read_u32::<BE>()? as i64
            };
            Ok(CttsEntry {
                sample_count,
                sample_offset,
            })
        })?;
        Ok(Self { full, entries })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(table_len(self.entries.len())?)?;
        for e in &self.entries {
            out.write_u32::<BE>(e.sample_count)?;
            write_composition_offset(out, self.full.version, e.sample_offset)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StscEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleToChunk {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entries: Vec<StscEntry>,
}

impl SampleToChunk {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let count = cur.read_u32::<BE>()?;
        let entries = read_table(cur, count, 12, |c| {
            Ok(StscEntry {
                first_chunk: c.read_u32::<BE>()?,
                samples_per_chunk: c.read_u32::<BE>()?,
                sample_description_index: c.read_u32::<BE>()?,
            })
        })?;
        Ok(Self { full, entries })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(table_len(self.entries.len())?)?;
        for e in &self.entries {
            out.write_u32::<BE>(e.first_chunk)?;
            out.write_u32::<BE>(e.samples_per_chunk)?;
            out.write_u32::<BE>(e.sample_description_index)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSizes {
    #[serde(flatten)]
    pub full: FullHeader,
    /// Common size of every sample, or 0 when `entries` lists them.
    pub sample_size: u32,
    pub sample_count: u32,
    pub entries: Vec<u32>,
}

impl SampleSizes {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let sample_size = cur.read_u32::<BE>()?;
        let sample_count = cur.read_u32::<BE>()?;
        let entries = if sample_size == 0 {
            read_table(cur, sample_count, 4, |c| c.read_u32::<BE>())?
        } else {
            Vec::new()
        };
        Ok(Self {
            full,
            sample_size,
            sample_count,
            entries,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(self.sample_size)?;
        if self.sample_size == 0 {
            out.write_u32::<BE>(table_len(self.entries.len())?)?;
            for e in &self.entries {
                out.write_u32::<BE>(*e)?;
            }
        } else {
            out.write_u32::<BE>(self.sample_count)?;
        }
        Ok(())
    }
}

/// A full box holding a counted table of `u32` (`stss`) or chunk offsets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct U32Table {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entries: Vec<u32>,
}

impl U32Table {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let count = cur.read_u32::<BE>()?;
        let entries = read_table(cur, count, 4, |c| c.read_u32::<BE>())?;
        Ok(Self { full, entries })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(table_len(self.entries.len())?)?;
        for e in &self.entries {
            out.write_u32::<BE>(*e)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct U64Table {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entries: Vec<u64>,
}

impl U64Table {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let count = cur.read_u32::<BE>()?;
        let entries = read_table(cur, count, 8, |c| c.read_u64::<BE>())?;
        Ok(Self { full, entries })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(table_len(self.entries.len())?)?;
        for e in &self.entries {
            out.write_u64::<BE>(*e)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieExtendsHeader {
    #[serde(flatten)]
    pub full: FullHeader,
    pub fragment_duration: u64,
}

impl MovieExtendsHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        check_version("mehd", &full, 1)?;
        let fragment_duration = read_versioned(cur, full.version)?;
        Ok(Self {
            full,
            fragment_duration,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        write_versioned(out, self.full.version, self.fragment_duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackExtends {
    #[serde(flatten)]
    pub full: FullHeader,
    pub track_id: u32,
    pub default_sample_description_index: u32,
    pub default_sample_duration: u32,
    pub default_sample_size: u32,
    pub default_sample_flags: u32,
}

impl TrackExtends {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            full: FullHeader::read(cur)?,
            track_id: cur.read_u32::<BE>()?,
            default_sample_description_index: cur.read_u32::<BE>()?,
            default_sample_duration: cur.read_u32::<BE>()?,
            default_sample_size: cur.read_u32::<BE>()?,
            default_sample_flags: cur.read_u32::<BE>()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(self.track_id)?;
        out.write_u32::<BE>(self.default_sample_description_index)?;
        out.write_u32::<BE>(self.default_sample_duration)?;
        out.write_u32::<BE>(self.default_sample_size)?;
        out.write_u32::<BE>(self.default_sample_flags)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieFragmentHeader {
    #[serde(flatten)]
    pub full: FullHeader,
    pub sequence_number: u32,
}

impl MovieFragmentHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            full: FullHeader::read(cur)?,
            sequence_number: cur.read_u32::<BE>()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(self.sequence_number)?;
        Ok(())
    }
}

pub const TFHD_BASE_DATA_OFFSET: u32 = 0x01;
pub const TFHD_SAMPLE_DESCRIPTION_INDEX: u32 = 0x02;
pub const TFHD_DEFAULT_DURATION: u32 = 0x08;
pub const TFHD_DEFAULT_SIZE: u32 = 0x10;
pub const TFHD_DEFAULT_FLAGS: u32 = 0x20;

/// `tfhd`. Optional fields are present exactly when their flag bit is set;
/// recomputation brings the flags in line with the fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackFragmentHeader {
    #[serde(flatten)]
    pub full: FullHeader,
    pub track_id: u32,
    pub base_data_offset: Option<u64>,
    pub sample_description_index: Option<u32>,
    pub default_sample_duration: Option<u32>,
    pub default_sample_size: Option<u32>,
    pub default_sample_flags: Option<u32>,
}

impl TrackFragmentHeader {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let track_id = cur.read_u32::<BE>()?;
        let opt32 = |c: &mut ByteCursor, bit: u32| -> Result<Option<u32>> {
            if full.has(bit) { Ok(Some(c.read_u32::<BE>()?)) } else { Ok(None) }
        };
        let base_data_offset = if full.has(TFHD_BASE_DATA_OFFSET) {
            Some(cur.read_u64::<BE>()?)
        } else {
            None
        };
        Ok(Self {
            full,
            track_id,
            base_data_offset,
            sample_description_index: opt32(cur, TFHD_SAMPLE_DESCRIPTION_INDEX)?,
            default_sample_duration: opt32(cur, TFHD_DEFAULT_DURATION)?,
            default_sample_size: opt32(cur, TFHD_DEFAULT_SIZE)?,
            default_sample_flags: opt32(cur, TFHD_DEFAULT_FLAGS)?,
        })
    }

    pub(crate) fn sync_flags(&mut self) {
        self.full.set(TFHD_BASE_DATA_OFFSET, self.base_data_offset.is_some());
        self.full.set(TFHD_SAMPLE_DESCRIPTION_INDEX, self.sample_description_index.is_some());
        self.full.set(TFHD_DEFAULT_DURATION, self.default_sample_duration.is_some());
        self.full.set(TFHD_DEFAULT_SIZE, self.default_sample_size.is_some());
        self.full.set(TFHD_DEFAULT_FLAGS, self.default_sample_flags.is_some());
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(self.track_id)?;
        if let Some(b) = self.base_data_offset {
            out.write_u64::<BE>(b)?;
        }
        for v in [
            self.sample_description_index,
            self.default_sample_duration,
            self.default_sample_size,
            self.default_sample_flags,
        ]
        .into_iter()
        .flatten()
        {
            out.write_u32::<BE>(v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackFragmentDecodeTime {
    #[serde(flatten)]
    pub full: FullHeader,
    pub base_media_decode_time: u64,
}

impl TrackFragmentDecodeTime {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        check_version("tfdt", &full, 1)?;
        let base_media_decode_time = read_versioned(cur, full.version)?;
        Ok(Self {
            full,
            base_media_decode_time,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        write_versioned(out, self.full.version, self.base_media_decode_time)
    }
}

pub const TRUN_DATA_OFFSET: u32 = 0x001;
pub const TRUN_FIRST_SAMPLE_FLAGS: u32 = 0x004;
pub const TRUN_SAMPLE_DURATION: u32 = 0x100;
pub const TRUN_SAMPLE_SIZE: u32 = 0x200;
pub const TRUN_SAMPLE_FLAGS: u32 = 0x400;
pub const TRUN_SAMPLE_CTO: u32 = 0x800;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrunSample {
    pub duration: u32,
    pub size: u32,
    pub flags: u32,
    pub composition_time_offset: i64,
}

/// `trun`. Per-sample fields are read and written according to the flag
/// bits; fields whose bit is clear are zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRun {
    #[serde(flatten)]
    pub full: FullHeader,
    pub data_offset: Option<i32>,
    pub first_sample_flags: Option<u32>,
    pub samples: Vec<TrunSample>,
}

impl TrackRun {
    fn sample_len(full: &FullHeader) -> u64 {
        [TRUN_SAMPLE_DURATION, TRUN_SAMPLE_SIZE, TRUN_SAMPLE_FLAGS, TRUN_SAMPLE_CTO]
            .iter()
            .filter(|&&b| full.has(b))
            .count() as u64
            * 4
    }

    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let count = cur.read_u32::<BE>()?;
        let data_offset = if full.has(TRUN_DATA_OFFSET) {
            Some(cur.read_i32::<BE>()?)
        } else {
            None
        };
        let first_sample_flags = if full.has(TRUN_FIRST_SAMPLE_FLAGS) {
            Some(cur.read_u32::<BE>()?)
        } else {
            None
        };
        let samples = read_table(cur, count, Self::sample_len(&full), |c| {
            let mut s = TrunSample::default();
            if full.has(TRUN_SAMPLE_DURATION) {
                s.duration = c.read_u32::<BE>()?;
            }
            if full.has(TRUN_SAMPLE_SIZE) {
                s.size = c.read_u32::<BE>()?;
            }
            if full.has(TRUN_SAMPLE_FLAGS) {
                s.flags = c.read_u32::<BE>()?;
            }
            if full.has(TRUN_SAMPLE_CTO) {
                s.composition_time_offset = if full.version == 0 {
                    c.read_u32::<BE>()? as i64
                } else {
                    c.read_i32::<BE>()? as i64
                };
            }
            Ok(s)
        })?;
        Ok(Self {
            full,
            data_offset,
            first_sample_flags,
            samples,
        })
    }

    pub(crate) fn sync_flags(&mut self) {
        self.full.set(TRUN_DATA_OFFSET, self.data_offset.is_some());
        self.full.set(TRUN_FIRST_SAMPLE_FLAGS, self.first_sample_flags.is_some());
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(table_len(self.samples.len())?)?;
        if let Some(d) = self.data_offset {
            out.write_i32::<BE>(d)?;
        }
        if let Some(f) = self.first_sample_flags {
            out.write_u32::<BE>(f)?;
        }
        for s in &self.samples {
            if self.full.has(TRUN_SAMPLE_DURATION) {
                out.write_u32::<BE>(s.duration)?;
            }
            if self.full.has(TRUN_SAMPLE_SIZE) {
                out.write_u32::<BE>(s.size)?;
            }
            if self.full.has(TRUN_SAMPLE_FLAGS) {
                out.write_u32::<BE>(s.flags)?;
            }
            if self.full.has(TRUN_SAMPLE_CTO) {
                write_composition_offset(out, self.full.version, s.composition_time_offset)?;
            }
        }
        Ok(())
    }
}

/// `url `: flag 1 means the media is in this file and no location follows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataEntryUrl {
    #[serde(flatten)]
    pub full: FullHeader,
    pub location: Option<String>,
}

impl DataEntryUrl {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let location = if cur.has_remaining() {
            Some(String::from_utf8_lossy(&cur.read_cstring()?).into_owned())
        } else {
            None
        };
        Ok(Self { full, location })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        if let Some(loc) = &self.location {
            out.extend_from_slice(loc.as_bytes());
            out.push(0);
        }
        Ok(())
    }

    pub fn is_self_contained(&self) -> bool {
        test_bit(self.full.flags as u64, 0)
    }
}

/// The value of an item-list `data` box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataValue {
    Text(String),
    Bytes(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
}

pub const DATA_TYPE_UTF8: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemData {
    /// Well-known type: 1 UTF-8, 13 JPEG, 14 PNG, 21 signed integer, 0 implicit.
    pub data_type: u32,
    pub locale: u32,
    pub value: DataValue,
}

impl ItemData {
    pub fn text(s: &str) -> Self {
        Self {
            data_type: DATA_TYPE_UTF8,
            locale: 0,
            value: DataValue::Text(s.to_string()),
        }
    }

    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let data_type = cur.read_u32::<BE>()?;
        let locale = cur.read_u32::<BE>()?;
        let bytes = cur.read_to_limit()?;
        let value = if data_type == DATA_TYPE_UTF8 {
            match String::from_utf8(bytes) {
                Ok(s) => DataValue::Text(s),
                Err(e) => DataValue::Bytes(e.into_bytes()),
            }
        } else {
            DataValue::Bytes(bytes)
        };
        Ok(Self {
            data_type,
            locale,
            value,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u32::<BE>(self.data_type)?;
        out.write_u32::<BE>(self.locale)?;
        match &self.value {
            DataValue::Text(s) => out.extend_from_slice(s.as_bytes()),
            DataValue::Bytes(b) => out.extend_from_slice(b),
        }
        Ok(())
    }
}

/// `mean` / `name` inside a freeform (`----`) item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemString {
    #[serde(flatten)]
    pub full: FullHeader,
    pub value: String,
}

impl ItemString {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let full = FullHeader::read(cur)?;
        let value = String::from_utf8_lossy(&cur.read_to_limit()?).into_owned();
        Ok(Self { full, value })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.extend_from_slice(self.value.as_bytes());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryContainer {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
}

impl EntryContainer {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            full: FullHeader::read(cur)?,
            entry_count: cur.read_u32::<BE>()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full.encode(out)?;
        out.write_u32::<BE>(self.entry_count)?;
        Ok(())
    }
}

/// `meta` is a full box in ISO files but a plain container in QuickTime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub full: Option<FullHeader>,
}

impl Meta {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        if cur.remaining() >= 8 && &cur.peek(8)?[4..8] == b"hdlr" {
            return Ok(Self { full: None });
        }
        Ok(Self {
            full: Some(FullHeader::read(cur)?),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match &self.full {
            Some(f) => f.encode(out),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualSampleEntry {
    pub data_reference_index: u16,
    pub width: u16,
    pub height: u16,
    /// 16.16 fixed point.
    pub horizresolution: u32,
    pub vertresolution: u32,
    pub frame_count: u16,
    pub compressor_name: String,
    pub depth: u16,
}

impl VisualSampleEntry {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        cur.skip(6)?;
        let data_reference_index = cur.read_u16::<BE>()?;
        cur.skip(16)?;
        let width = cur.read_u16::<BE>()?;
        let height = cur.read_u16::<BE>()?;
        let horizresolution = cur.read_u32::<BE>()?;
        let vertresolution = cur.read_u32::<BE>()?;
        cur.skip(4)?;
        let frame_count = cur.read_u16::<BE>()?;
        let name = cur.read_array::<32>()?;
        let len = (name[0] as usize).min(31);
        let compressor_name = crate::text::decode_latin1(&name[1..1 + len]);
        let depth = cur.read_u16::<BE>()?;
        cur.skip(2)?;
        Ok(Self {
            data_reference_index,
            width,
            height,
            horizresolution,
            vertresolution,
            frame_count,
            compressor_name,
            depth,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&[0; 6]);
        out.write_u16::<BE>(self.data_reference_index)?;
        out.extend_from_slice(&[0; 16]);
        out.write_u16::<BE>(self.width)?;
        out.write_u16::<BE>(self.height)?;
        out.write_u32::<BE>(self.horizresolution)?;
        out.write_u32::<BE>(self.vertresolution)?;
        out.write_u32::<BE>(0)?;
        out.write_u16::<BE>(self.frame_count)?;
        let mut name = [0u8; 32];
        let bytes = crate::text::encode_latin1(&self.compressor_name)?;
        let len = bytes.len().min(31);
        name[0] = len as u8;
        name[1..1 + len].copy_from_slice(&bytes[..len]);
        out.extend_from_slice(&name);
        out.write_u16::<BE>(self.depth)?;
        out.write_i16::<BE>(-1)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioSampleEntry {
    pub data_reference_index: u16,
    /// Zero in ISO files; 1 or 2 in QuickTime files, which then carry
    /// extra fields kept in `qt_extension`.
    pub version: u16,
    pub revision: u16,
    pub vendor: u32,
    pub channel_count: u16,
    pub sample_size: u16,
    pub compression_id: i16,
    pub packet_size: u16,
    /// 16.16 fixed point.
    pub sample_rate: u32,
    #[serde(serialize_with = "serialize_hex_opt")]
    pub qt_extension: Option<Vec<u8>>,
}

impl AudioSampleEntry {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        cur.skip(6)?;
        let data_reference_index = cur.read_u16::<BE>()?;
        let version = cur.read_u16::<BE>()?;
        let revision = cur.read_u16::<BE>()?;
        let vendor = cur.read_u32::<BE>()?;
        let channel_count = cur.read_u16::<BE>()?;
        let sample_size = cur.read_u16::<BE>()?;
        let compression_id = cur.read_i16::<BE>()?;
        let packet_size = cur.read_u16::<BE>()?;
        let sample_rate = cur.read_u32::<BE>()?;
        let qt_extension = match version {
            0 => None,
            1 => Some(cur.read(16)?),
            2 => Some(cur.read(36)?),
            v => {
                return Err(Error::UnsupportedVersion {
                    what: "audio sample entry",
                    version: v as u32,
                });
            }
        };
        Ok(Self {
            data_reference_index,
            version,
            revision,
            vendor,
            channel_count,
            sample_size,
            compression_id,
            packet_size,
            sample_rate,
            qt_extension,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&[0; 6]);
        out.write_u16::<BE>(self.data_reference_index)?;
        out.write_u16::<BE>(self.version)?;
        out.write_u16::<BE>(self.revision)?;
        out.write_u32::<BE>(self.vendor)?;
        out.write_u16::<BE>(self.channel_count)?;
        out.write_u16::<BE>(self.sample_size)?;
        out.write_i16::<BE>(self.compression_id)?;
        out.write_u16::<BE>(self.packet_size)?;
        out.write_u32::<BE>(self.sample_rate)?;
        if let Some(ext) = &self.qt_extension {
            out.extend_from_slice(ext);
        }
        Ok(())
    }
}

/// `free` / `skip` / `wide`: unused space. Rewritten as zeros.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Free {
    pub len: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Mp4Record {
    Container,
    Meta(Meta),
    Entries(EntryContainer),
    FileType(FileType),
    MovieHeader(MovieHeader),
    TrackHeader(TrackHeader),
    MediaHeader(MediaHeader),
    Handler(Handler),
    VideoMediaHeader(VideoMediaHeader),
    SoundMediaHeader(SoundMediaHeader),
    EditList(EditList),
    TimeToSample(TimeToSample),
    CompositionOffsets(CompositionOffsets),
    SampleToChunk(SampleToChunk),
    SampleSizes(SampleSizes),
    SyncSamples(U32Table),
    ChunkOffsets(U32Table),
    ChunkOffsets64(U64Table),
    MovieExtendsHeader(MovieExtendsHeader),
    TrackExtends(TrackExtends),
    MovieFragmentHeader(MovieFragmentHeader),
    TrackFragmentHeader(TrackFragmentHeader),
    TrackFragmentDecodeTime(TrackFragmentDecodeTime),
    TrackRun(TrackRun),
    DataEntryUrl(DataEntryUrl),
    ItemData(ItemData),
    ItemString(ItemString),
    VisualSampleEntry(VisualSampleEntry),
    AudioSampleEntry(AudioSampleEntry),
    Free(Free),
    Opaque(Raw),
}

impl Record for Mp4Record {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Mp4Record::Container => Ok(()),
            Mp4Record::Meta(r) => r.encode(out),
            Mp4Record::Entries(r) => r.encode(out),
            Mp4Record::FileType(r) => r.encode(out),
            Mp4Record::MovieHeader(r) => r.encode(out),
            Mp4Record::TrackHeader(r) => r.encode(out),
            Mp4Record::MediaHeader(r) => r.encode(out),
            Mp4Record::Handler(r) => r.encode(out),
            Mp4Record::VideoMediaHeader(r) => r.encode(out),
            Mp4Record::SoundMediaHeader(r) => r.encode(out),
            Mp4Record::EditList(r) => r.encode(out),
            Mp4Record::TimeToSample(r) => r.encode(out),
            Mp4Record::CompositionOffsets(r) => r.encode(out),
            Mp4Record::SampleToChunk(r) => r.encode(out),
            Mp4Record::SampleSizes(r) => r.encode(out),
            Mp4Record::SyncSamples(r) | Mp4Record::ChunkOffsets(r) => r.encode(out),
            Mp4Record::ChunkOffsets64(r) => r.encode(out),
            Mp4Record::MovieExtendsHeader(r) => r.encode(out),
            Mp4Record::TrackExtends(r) => r.encode(out),
            Mp4Record::MovieFragmentHeader(r) => r.encode(out),
            Mp4Record::TrackFragmentHeader(r) => r.encode(out),
            Mp4Record::TrackFragmentDecodeTime(r) => r.encode(out),
            Mp4Record::TrackRun(r) => r.encode(out),
            Mp4Record::DataEntryUrl(r) => r.encode(out),
            Mp4Record::ItemData(r) => r.encode(out),
            Mp4Record::ItemString(r) => r.encode(out),
            Mp4Record::VisualSampleEntry(r) => r.encode(out),
            Mp4Record::AudioSampleEntry(r) => r.encode(out),
            Mp4Record::Free(f) => {
                out.resize(out.len() + f.len as usize, 0);
                Ok(())
            }
            Mp4Record::Opaque(raw) => match raw.bytes() {
                Some(b) => {
                    out.extend_from_slice(b);
                    Ok(())
                }
                None => Err(Error::layout("deferred payload must be copied from the source")),
            },
        }
    }

    fn raw(&self) -> Option<&Raw> {
        match self {
            Mp4Record::Opaque(raw) => Some(raw),
            _ => None,
        }
    }

    fn raw_mut(&mut self) -> Option<&mut Raw> {
        match self {
            Mp4Record::Opaque(raw) => Some(raw),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Mp4Record::Container => "container",
            Mp4Record::Meta(_) => "meta",
            Mp4Record::Entries(_) => "entries",
            Mp4Record::FileType(_) => "file_type",
            Mp4Record::MovieHeader(_) => "movie_header",
            Mp4Record::TrackHeader(_) => "track_header",
            Mp4Record::MediaHeader(_) => "media_header",
            Mp4Record::Handler(_) => "handler",
            Mp4Record::VideoMediaHeader(_) => "video_media_header",
            Mp4Record::SoundMediaHeader(_) => "sound_media_header",
            Mp4Record::EditList(_) => "edit_list",
            Mp4Record::TimeToSample(_) => "time_to_sample",
            Mp4Record::CompositionOffsets(_) => "composition_offsets",
            Mp4Record::SampleToChunk(_) => "sample_to_chunk",
            Mp4Record::SampleSizes(_) => "sample_sizes",
            Mp4Record::SyncSamples(_) => "sync_samples",
            Mp4Record::ChunkOffsets(_) => "chunk_offsets",
            Mp4Record::ChunkOffsets64(_) => "chunk_offsets64",
            Mp4Record::MovieExtendsHeader(_) => "movie_extends_header",
            Mp4Record::TrackExtends(_) => "track_extends",
            Mp4Record::MovieFragmentHeader(_) => "movie_fragment_header",
            Mp4Record::TrackFragmentHeader(_) => "track_fragment_header",
            Mp4Record::TrackFragmentDecodeTime(_) => "track_fragment_decode_time",
            Mp4Record::TrackRun(_) => "track_run",
            Mp4Record::DataEntryUrl(_) => "data_entry_url",
            Mp4Record::ItemData(_) => "item_data",
            Mp4Record::ItemString(_) => "item_string",
            Mp4Record::VisualSampleEntry(_) => "visual_sample_entry",
            Mp4Record::AudioSampleEntry(_) => "audio_sample_entry",
            Mp4Record::Free(_) => "free",
            Mp4Record::Opaque(_) => "opaque",
        }
    }
}
