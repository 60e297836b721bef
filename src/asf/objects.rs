//! ASF object headers and typed object records. Everything is little-endian.

use super::guids;
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::format::{NodeHeader, Record};
use crate::ids::Guid;
use crate::node::Raw;
use crate::primitives::Endian;
use crate::text::{decode_utf16, encode_utf16, trim_nul};
use crate::util::serialize_hex;
use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;

type LE = LittleEndian;

pub const OBJECT_HEADER_LEN: u64 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    pub guid: Guid,
    pub size: u64,
    /// Headerless leftover bytes at the end of a container.
    pub bare: bool,
}

impl ObjectHeader {
    pub fn new(guid: Guid) -> Self {
        Self {
            guid,
            size: OBJECT_HEADER_LEN,
            bare: false,
        }
    }

    pub fn bare(len: u64) -> Self {
        Self {
            guid: Guid::default(),
            size: len,
            bare: true,
        }
    }

    pub fn read(cur: &mut ByteCursor, limit: u64) -> Result<Option<Self>> {
        let start = cur.tell();
        if limit.saturating_sub(start) < OBJECT_HEADER_LEN {
            return Ok(None);
        }
        let guid = cur.read_guid()?;
        let size = cur.read_u64::<LE>()?;
        if size < OBJECT_HEADER_LEN {
            return Err(Error::header(start, format!("object {guid} declares {size} bytes")));
        }
        Ok(Some(Self {
            guid,
            size,
            bare: false,
        }))
    }
}

impl NodeHeader for ObjectHeader {
    type Id = Guid;

    fn id(&self) -> &Guid {
        &self.guid
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn header_len(&self) -> u64 {
        if self.bare { 0 } else { OBJECT_HEADER_LEN }
    }

    fn resize(&mut self, content_len: u64) -> Result<()> {
        self.size = self.header_len() + content_len;
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        if !self.bare {
            out.extend_from_slice(&self.guid.0);
            out.write_u64::<LE>(self.size)?;
        }
        Ok(())
    }
}

/// UTF-16LE bytes including the two-byte terminator.
pub(crate) fn utf16z(s: &str) -> Vec<u8> {
    let mut out = encode_utf16(s, Endian::Little, false);
    out.extend_from_slice(&[0, 0]);
    out
}

fn read_utf16z(cur: &mut ByteCursor, len: u64) -> Result<String> {
    let bytes = cur.read(len)?;
    Ok(trim_nul(&decode_utf16(&bytes, Endian::Little)).to_string())
}

fn len16<T>(items: &[T], what: &str) -> Result<u16> {
    u16::try_from(items.len()).map_err(|_| Error::layout(format!("{what} too long for a 16-bit length")))
}

fn len32<T>(items: &[T], what: &str) -> Result<u32> {
    u32::try_from(items.len()).map_err(|_| Error::layout(format!("{what} too long for a 32-bit length")))
}

/// Counted records: rejects counts that cannot fit in the remaining bytes.
fn read_counted<T>(
    cur: &mut ByteCursor,
    count: u64,
    min_len: u64,
    mut read: impl FnMut(&mut ByteCursor) -> Result<T>,
) -> Result<Vec<T>> {
    if count * min_len > cur.remaining() {
        return Err(Error::TruncatedInput {
            offset: cur.tell(),
            needed: count * min_len,
            available: cur.remaining(),
        });
    }
    (0..count).map(|_| read(cur)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderObject {
    pub object_count: u32,
    pub reserved1: u8,
    pub reserved2: u8,
}

impl HeaderObject {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            object_count: cur.read_u32::<LE>()?,
            reserved1: cur.read_u8()?,
            reserved2: cur.read_u8()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u32::<LE>(self.object_count)?;
        out.push(self.reserved1);
        out.push(self.reserved2);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderExtension {
    pub reserved1: Guid,
    pub reserved2: u16,
    pub data_size: u32,
}

impl HeaderExtension {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            reserved1: cur.read_guid()?,
            reserved2: cur.read_u16::<LE>()?,
            data_size: cur.read_u32::<LE>()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.reserved1.0);
        out.write_u16::<LE>(self.reserved2)?;
        out.write_u32::<LE>(self.data_size)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileProperties {
    pub file_id: Guid,
    /// Size of the whole file; kept in step with write-backs.
    pub file_size: u64,
    /// 100-ns units since 1601-01-01.
    pub creation_date: u64,
    pub data_packets_count: u64,
    pub play_duration: u64,
    pub send_duration: u64,
    pub preroll: u64,
    pub flags: u32,
    pub min_data_packet_size: u32,
    pub max_data_packet_size: u32,
    pub max_bitrate: u32,
}

impl FileProperties {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            file_id: cur.read_guid()?,
            file_size: cur.read_u64::<LE>()?,
            creation_date: cur.read_u64::<LE>()?,
            data_packets_count: cur.read_u64::<LE>()?,
            play_duration: cur.read_u64::<LE>()?,
            send_duration: cur.read_u64::<LE>()?,
            preroll: cur.read_u64::<LE>()?,
            flags: cur.read_u32::<LE>()?,
            min_data_packet_size: cur.read_u32::<LE>()?,
            max_data_packet_size: cur.read_u32::<LE>()?,
            max_bitrate: cur.read_u32::<LE>()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.file_id.0);
        for v in [
            self.file_size,
            self.creation_date,
            self.data_packets_count,
            self.play_duration,
            self.send_duration,
            self.preroll,
        ] {
            out.write_u64::<LE>(v)?;
        }
        for v in [
            self.flags,
            self.min_data_packet_size,
            self.max_data_packet_size,
            self.max_bitrate,
        ] {
            out.write_u32::<LE>(v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamProperties {
    pub stream_type: Guid,
    pub error_correction_type: Guid,
    pub time_offset: u64,
    /// Stream number in the low 7 bits, encrypted-content flag in bit 15.
    pub flags: u16,
    pub reserved: u32,
    #[serde(serialize_with = "serialize_hex")]
    pub type_specific_data: Vec<u8>,
    #[serde(serialize_with = "serialize_hex")]
    pub error_correction_data: Vec<u8>,
}

impl StreamProperties {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let stream_type = cur.read_guid()?;
        let error_correction_type = cur.read_guid()?;
        let time_offset = cur.read_u64::<LE>()?;
        let type_len = cur.read_u32::<LE>()?;
        let ec_len = cur.read_u32::<LE>()?;
        let flags = cur.read_u16::<LE>()?;
        let reserved = cur.read_u32::<LE>()?;
        Ok(Self {
            stream_type,
            error_correction_type,
            time_offset,
            flags,
            reserved,
            type_specific_data: cur.read(type_len as u64)?,
            error_correction_data: cur.read(ec_len as u64)?,
        })
    }

    pub fn stream_number(&self) -> u16 {
        self.flags & 0x7F
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.stream_type.0);
        out.extend_from_slice(&self.error_correction_type.0);
        out.write_u64::<LE>(self.time_offset)?;
        out.write_u32::<LE>(len32(&self.type_specific_data, "type-specific data")?)?;
        out.write_u32::<LE>(len32(&self.error_correction_data, "error correction data")?)?;
        out.write_u16::<LE>(self.flags)?;
        out.write_u32::<LE>(self.reserved)?;
        out.extend_from_slice(&self.type_specific_data);
        out.extend_from_slice(&self.error_correction_data);
        Ok(())
    }
}

/// The five fixed strings of the content description object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentDescription {
    pub title: String,
    pub author: String,
    pub copyright: String,
    pub description: String,
    pub rating: String,
}

impl ContentDescription {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let mut lens = [0u16; 5];
        for l in &mut lens {
            *l = cur.read_u16::<LE>()?;
        }
        let mut fields = Vec::with_capacity(5);
        for l in lens {
            fields.push(read_utf16z(cur, l as u64)?);
        }
        let [title, author, copyright, description, rating]: [String; 5] = fields
            .try_into()
            .map_err(|_| Error::layout("content description needs five strings"))?;
        Ok(Self {
            title,
            author,
            copyright,
            description,
            rating,
        })
    }

    fn fields(&self) -> [&str; 5] {
        [
            self.title.as_str(),
            self.author.as_str(),
            self.copyright.as_str(),
            self.description.as_str(),
            self.rating.as_str(),
        ]
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        // An empty field has length 0 and no terminator.
        let encoded: Vec<Vec<u8>> = self
            .fields()
            .iter()
            .map(|s| if s.is_empty() { Vec::new() } else { utf16z(s) })
            .collect();
        for e in &encoded {
            out.write_u16::<LE>(len16(e, "content description field")?)?;
        }
        for e in &encoded {
            out.extend_from_slice(e);
        }
        Ok(())
    }
}

pub const VALUE_UNICODE: u16 = 0;
pub const VALUE_BYTES: u16 = 1;
pub const VALUE_BOOL: u16 = 2;
pub const VALUE_DWORD: u16 = 3;
pub const VALUE_QWORD: u16 = 4;
pub const VALUE_WORD: u16 = 5;
pub const VALUE_GUID: u16 = 6;

/// A typed attribute value. Booleans are four bytes wide in the extended
/// content description and two bytes wide in the metadata objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AsfValue {
    Unicode(String),
    Bytes(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    Bool(bool),
    Dword(u32),
    Qword(u64),
    Word(u16),
    Guid(Guid),
}

impl AsfValue {
    pub fn decode(data_type: u16, bytes: Vec<u8>) -> Result<Self> {
        let mut c = ByteCursor::from_bytes(bytes);
        Ok(match data_type {
            VALUE_UNICODE => {
                let len = c.remaining();
                AsfValue::Unicode(read_utf16z(&mut c, len)?)
            }
            VALUE_BYTES => AsfValue::Bytes(c.read_to_limit()?),
            VALUE_BOOL => {
                let len = c.remaining();
                AsfValue::Bool(c.read_uint::<LE>(len.clamp(1, 4) as usize)? != 0)
            }
            VALUE_DWORD => AsfValue::Dword(c.read_u32::<LE>()?),
            VALUE_QWORD => AsfValue::Qword(c.read_u64::<LE>()?),
            VALUE_WORD => AsfValue::Word(c.read_u16::<LE>()?),
            VALUE_GUID => AsfValue::Guid(c.read_guid()?),
            other => return Err(Error::Unsupported(format!("attribute data type {other}"))),
        })
    }

    pub fn data_type(&self) -> u16 {
        match self {
            AsfValue::Unicode(_) => VALUE_UNICODE,
            AsfValue::Bytes(_) => VALUE_BYTES,
            AsfValue::Bool(_) => VALUE_BOOL,
            AsfValue::Dword(_) => VALUE_DWORD,
            AsfValue::Qword(_) => VALUE_QWORD,
            AsfValue::Word(_) => VALUE_WORD,
            AsfValue::Guid(_) => VALUE_GUID,
        }
    }

    pub fn encode(&self, bool_width: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            AsfValue::Unicode(s) => out = utf16z(s),
            AsfValue::Bytes(b) => out.extend_from_slice(b),
            AsfValue::Bool(b) => out.write_uint::<LE>(*b as u64, bool_width)?,
            AsfValue::Dword(v) => out.write_u32::<LE>(*v)?,
            AsfValue::Qword(v) => out.write_u64::<LE>(*v)?,
            AsfValue::Word(v) => out.write_u16::<LE>(*v)?,
            AsfValue::Guid(g) => out.extend_from_slice(&g.0),
        }
        Ok(out)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AsfValue::Unicode(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub name: String,
    pub value: AsfValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtendedContentDescription {
    pub descriptors: Vec<Descriptor>,
}

impl ExtendedContentDescription {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let count = cur.read_u16::<LE>()?;
        let descriptors = read_counted(cur, count as u64, 6, |c| {
            let name_len = c.read_u16::<LE>()?;
            let name = read_utf16z(c, name_len as u64)?;
            let data_type = c.read_u16::<LE>()?;
            let value_len = c.read_u16::<LE>()?;
            let value = AsfValue::decode(data_type, c.read(value_len as u64)?)?;
            Ok(Descriptor { name, value })
        })?;
        Ok(Self { descriptors })
    }

    pub fn get(&self, name: &str) -> Option<&AsfValue> {
        self.descriptors.iter().find(|d| d.name == name).map(|d| &d.value)
    }

    /// Replaces the first descriptor called `name`, or appends one.
    pub fn set(&mut self, name: &str, value: AsfValue) {
        match self.descriptors.iter_mut().find(|d| d.name == name) {
            Some(d) => d.value = value,
            None => self.descriptors.push(Descriptor {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let count = u16::try_from(self.descriptors.len())
            .map_err(|_| Error::layout("more than 65535 content descriptors"))?;
        out.write_u16::<LE>(count)?;
        for d in &self.descriptors {
            let name = utf16z(&d.name);
            let value = d.value.encode(4)?;
            out.write_u16::<LE>(len16(&name, "descriptor name")?)?;
            out.extend_from_slice(&name);
            out.write_u16::<LE>(d.value.data_type())?;
            out.write_u16::<LE>(len16(&value, "descriptor value")?)?;
            out.extend_from_slice(&value);
        }
        Ok(())
    }
}

/// One record of the metadata or metadata library object. The metadata
/// object stores a reserved zero where the library stores the language index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataRecord {
    pub language_index: u16,
    pub stream_number: u16,
    pub name: String,
    pub value: AsfValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataList {
    pub records: Vec<MetadataRecord>,
}

impl MetadataList {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let count = cur.read_u16::<LE>()?;
        let records = read_counted(cur, count as u64, 12, |c| {
            let language_index = c.read_u16::<LE>()?;
            let stream_number = c.read_u16::<LE>()?;
            let name_len = c.read_u16::<LE>()?;
            let data_type = c.read_u16::<LE>()?;
            let data_len = c.read_u32::<LE>()?;
            let name = read_utf16z(c, name_len as u64)?;
            let value = AsfValue::decode(data_type, c.read(data_len as u64)?)?;
            Ok(MetadataRecord {
                language_index,
                stream_number,
                name,
                value,
            })
        })?;
        Ok(Self { records })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let count =
            u16::try_from(self.records.len()).map_err(|_| Error::layout("more than 65535 metadata records"))?;
        out.write_u16::<LE>(count)?;
        for r in &self.records {
            let name = utf16z(&r.name);
            let value = r.value.encode(2)?;
            out.write_u16::<LE>(r.language_index)?;
            out.write_u16::<LE>(r.stream_number)?;
            out.write_u16::<LE>(len16(&name, "metadata name")?)?;
            out.write_u16::<LE>(r.value.data_type())?;
            out.write_u32::<LE>(len32(&value, "metadata value")?)?;
            out.extend_from_slice(&name);
            out.extend_from_slice(&value);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodecEntry {
    pub codec_type: u16,
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "serialize_hex")]
    pub information: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodecList {
    pub reserved: Guid,
    pub entries: Vec<CodecEntry>,
}

impl CodecList {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let reserved = cur.read_guid()?;
        let count = cur.read_u32::<LE>()?;
        let entries = read_counted(cur, count as u64, 8, |c| {
            let codec_type = c.read_u16::<LE>()?;
            // Name and description lengths count UTF-16 characters.
            let name_chars = c.read_u16::<LE>()?;
            let name = read_utf16z(c, name_chars as u64 * 2)?;
            let desc_chars = c.read_u16::<LE>()?;
            let description = read_utf16z(c, desc_chars as u64 * 2)?;
            let info_len = c.read_u16::<LE>()?;
            Ok(CodecEntry {
                codec_type,
                name,
                description,
                information: c.read(info_len as u64)?,
            })
        })?;
        Ok(Self { reserved, entries })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.reserved.0);
        out.write_u32::<LE>(len32(&self.entries, "codec list")?)?;
        for e in &self.entries {
            out.write_u16::<LE>(e.codec_type)?;
            for s in [&e.name, &e.description] {
                let bytes = utf16z(s);
                out.write_u16::<LE>(len16(&bytes, "codec string")? / 2)?;
                out.extend_from_slice(&bytes);
            }
            out.write_u16::<LE>(len16(&e.information, "codec information")?)?;
            out.extend_from_slice(&e.information);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamBitrate {
    pub flags: u16,
    pub average_bitrate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamBitrateProperties {
    pub records: Vec<StreamBitrate>,
}

impl StreamBitrateProperties {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let count = cur.read_u16::<LE>()?;
        let records = read_counted(cur, count as u64, 6, |c| {
            Ok(StreamBitrate {
                flags: c.read_u16::<LE>()?,
                average_bitrate: c.read_u32::<LE>()?,
            })
        })?;
        Ok(Self { records })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u16::<LE>(len16(&self.records, "bitrate records")?)?;
        for r in &self.records {
            out.write_u16::<LE>(r.flags)?;
            out.write_u32::<LE>(r.average_bitrate)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageList {
    pub languages: Vec<String>,
}

impl LanguageList {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let count = cur.read_u16::<LE>()?;
        let languages = read_counted(cur, count as u64, 1, |c| {
            let len = c.read_u8()?;
            read_utf16z(c, len as u64)
        })?;
        Ok(Self { languages })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u16::<LE>(len16(&self.languages, "language list")?)?;
        for l in &self.languages {
            let bytes = utf16z(l);
            let len = u8::try_from(bytes.len()).map_err(|_| Error::layout("language id longer than 255 bytes"))?;
            out.push(len);
            out.extend_from_slice(&bytes);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamPriority {
    pub stream_number: u16,
    pub flags: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamPrioritization {
    pub records: Vec<StreamPriority>,
}

impl StreamPrioritization {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let count = cur.read_u16::<LE>()?;
        let records = read_counted(cur, count as u64, 4, |c| {
            Ok(StreamPriority {
                stream_number: c.read_u16::<LE>()?,
                flags: c.read_u16::<LE>()?,
            })
        })?;
        Ok(Self { records })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u16::<LE>(len16(&self.records, "priority records")?)?;
        for r in &self.records {
            out.write_u16::<LE>(r.stream_number)?;
            out.write_u16::<LE>(r.flags)?;
        }
        Ok(())
    }
}

/// The fixed part of an extended stream properties object. Stream names,
/// payload extension systems and an embedded stream properties object
/// follow it and are preserved as the node's tail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedStreamProperties {
    pub start_time: u64,
    pub end_time: u64,
    pub data_bitrate: u32,
    pub buffer_size: u32,
    pub initial_buffer_fullness: u32,
    pub alternate_data_bitrate: u32,
    pub alternate_buffer_size: u32,
    pub alternate_initial_buffer_fullness: u32,
    pub maximum_object_size: u32,
    pub flags: u32,
    pub stream_number: u16,
    pub stream_language_index: u16,
    pub average_time_per_frame: u64,
    pub stream_name_count: u16,
    pub payload_extension_system_count: u16,
}

impl ExtendedStreamProperties {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            start_time: cur.read_u64::<LE>()?,
            end_time: cur.read_u64::<LE>()?,
            data_bitrate: cur.read_u32::<LE>()?,
            buffer_size: cur.read_u32::<LE>()?,
            initial_buffer_fullness: cur.read_u32::<LE>()?,
            alternate_data_bitrate: cur.read_u32::<LE>()?,
            alternate_buffer_size: cur.read_u32::<LE>()?,
            alternate_initial_buffer_fullness: cur.read_u32::<LE>()?,
            maximum_object_size: cur.read_u32::<LE>()?,
            flags: cur.read_u32::<LE>()?,
            stream_number: cur.read_u16::<LE>()?,
            stream_language_index: cur.read_u16::<LE>()?,
            average_time_per_frame: cur.read_u64::<LE>()?,
            stream_name_count: cur.read_u16::<LE>()?,
            payload_extension_system_count: cur.read_u16::<LE>()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u64::<LE>(self.start_time)?;
        out.write_u64::<LE>(self.end_time)?;
        for v in [
            self.data_bitrate,
            self.buffer_size,
            self.initial_buffer_fullness,
            self.alternate_data_bitrate,
            self.alternate_buffer_size,
            self.alternate_initial_buffer_fullness,
            self.maximum_object_size,
            self.flags,
        ] {
            out.write_u32::<LE>(v)?;
        }
        out.write_u16::<LE>(self.stream_number)?;
        out.write_u16::<LE>(self.stream_language_index)?;
        out.write_u64::<LE>(self.average_time_per_frame)?;
        out.write_u16::<LE>(self.stream_name_count)?;
        out.write_u16::<LE>(self.payload_extension_system_count)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AsfRecord {
    Header(HeaderObject),
    HeaderExtension(HeaderExtension),
    FileProperties(FileProperties),
    StreamProperties(StreamProperties),
    ContentDescription(ContentDescription),
    ExtendedContentDescription(ExtendedContentDescription),
    CodecList(CodecList),
    StreamBitrateProperties(StreamBitrateProperties),
    /// Unused space; rewritten as zeros.
    Padding { len: u64 },
    Metadata(MetadataList),
    MetadataLibrary(MetadataList),
    LanguageList(LanguageList),
    StreamPrioritization(StreamPrioritization),
    ExtendedStreamProperties(ExtendedStreamProperties),
    Opaque(Raw),
}

impl Record for AsfRecord {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            AsfRecord::Header(r) => r.encode(out),
            AsfRecord::HeaderExtension(r) => r.encode(out),
            AsfRecord::FileProperties(r) => r.encode(out),
            AsfRecord::StreamProperties(r) => r.encode(out),
            AsfRecord::ContentDescription(r) => r.encode(out),
            AsfRecord::ExtendedContentDescription(r) => r.encode(out),
            AsfRecord::CodecList(r) => r.encode(out),
            AsfRecord::StreamBitrateProperties(r) => r.encode(out),
            AsfRecord::Padding { len } => {
                out.resize(out.len() + *len as usize, 0);
                Ok(())
            }
            AsfRecord::Metadata(r) | AsfRecord::MetadataLibrary(r) => r.encode(out),
            AsfRecord::LanguageList(r) => r.encode(out),
            AsfRecord::StreamPrioritization(r) => r.encode(out),
            AsfRecord::ExtendedStreamProperties(r) => r.encode(out),
            AsfRecord::Opaque(raw) => match raw.bytes() {
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
            AsfRecord::Opaque(raw) => Some(raw),
            _ => None,
        }
    }

    fn raw_mut(&mut self) -> Option<&mut Raw> {
        match self {
            AsfRecord::Opaque(raw) => Some(raw),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AsfRecord::Header(_) => "header",
            AsfRecord::HeaderExtension(_) => "header_extension",
            AsfRecord::FileProperties(_) => "file_properties",
            AsfRecord::StreamProperties(_) => "stream_properties",
            AsfRecord::ContentDescription(_) => "content_description",
            AsfRecord::ExtendedContentDescription(_) => "extended_content_description",
            AsfRecord::CodecList(_) => "codec_list",
            AsfRecord::StreamBitrateProperties(_) => "stream_bitrate_properties",
            AsfRecord::Padding { .. } => "padding",
            AsfRecord::Metadata(_) => "metadata",
            AsfRecord::MetadataLibrary(_) => "metadata_library",
            AsfRecord::LanguageList(_) => "language_list",
            AsfRecord::StreamPrioritization(_) => "stream_prioritization",
            AsfRecord::ExtendedStreamProperties(_) => "extended_stream_properties",
            AsfRecord::Opaque(_) => "opaque",
        }
    }
}

impl HeaderExtension {
    pub fn empty() -> Self {
        Self {
            reserved1: guids::RESERVED_1,
            reserved2: 6,
            data_size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_description_empty_fields_have_no_terminator() {
        let cd = ContentDescription {
            title: "Hi".into(),
            ..Default::default()
        };
        let mut out = Vec::new();
        cd.encode(&mut out).unwrap();
        assert_eq!(&out[..10], &[6, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&out[10..], &[b'H', 0, b'i', 0, 0, 0]);
        let back = ContentDescription::read(&mut ByteCursor::from_bytes(out)).unwrap();
        assert_eq!(back, cd);
    }

    #[test]
    fn bool_width_depends_on_object() {
        assert_eq!(AsfValue::Bool(true).encode(4).unwrap(), vec![1, 0, 0, 0]);
        assert_eq!(AsfValue::Bool(true).encode(2).unwrap(), vec![1, 0]);
        assert_eq!(AsfValue::decode(VALUE_BOOL, vec![1, 0]).unwrap(), AsfValue::Bool(true));
    }
}
