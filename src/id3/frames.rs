//! ID3v2 tag and frame headers, and the typed frame bodies.

use crate::bits::{SYNCHSAFE_MAX, decode_synchsafe, encode_synchsafe, is_synchsafe};
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::format::{NodeHeader, Record};
use crate::ids::FrameId;
use crate::node::Raw;
use crate::text::{TextEncoding, decode_latin1, encode_latin1, trim_nul};
use crate::util::{serialize_hex, serialize_hex_opt};
use byteorder::{BigEndian, WriteBytesExt};
use log::warn;
use serde::Serialize;

type BE = BigEndian;

pub const TAG_HEADER_LEN: u64 = 10;

/// Tag header flags.
pub const TAG_UNSYNC: u8 = 0x80;
pub const TAG_EXTENDED: u8 = 0x40;
/// v2.2 only: the whole tag is compressed.
pub const TAG_COMPRESSED_V22: u8 = 0x40;
pub const TAG_FOOTER: u8 = 0x10;

/// v2.3 frame flags.
pub const V23_COMPRESSION: u16 = 0x0080;
pub const V23_ENCRYPTION: u16 = 0x0040;
pub const V23_GROUPING: u16 = 0x0020;

/// v2.4 frame flags.
pub const V24_GROUPING: u16 = 0x0040;
pub const V24_COMPRESSION: u16 = 0x0008;
pub const V24_ENCRYPTION: u16 = 0x0004;
pub const V24_UNSYNC: u16 = 0x0002;
pub const V24_DATA_LENGTH: u16 = 0x0001;

/// Removes the `00` inserted after every `FF` by unsynchronisation.
pub fn undo_unsync(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut prev_ff = false;
    for &b in bytes {
        if !(prev_ff && b == 0) {
            out.push(b);
        }
        prev_ff = b == 0xFF;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderKind {
    Tag,
    Frame,
    /// Zero bytes after the last frame; no header.
    Padding,
    /// Bytes outside any tag (the audio stream); no header.
    Data,
}

/// The 10-byte tag header, a frame header, or nothing for padding and
/// audio data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Id3Header {
    pub id: FrameId,
    pub kind: HeaderKind,
    /// Major version of the enclosing tag.
    pub major: u8,
    pub revision: u8,
    pub flags: u16,
    pub size: u64,
}

impl Id3Header {
    pub fn tag(major: u8) -> Self {
        Self {
            id: FrameId::tag(),
            kind: HeaderKind::Tag,
            major,
            revision: 0,
            flags: 0,
            size: TAG_HEADER_LEN,
        }
    }

    pub fn frame(id: impl Into<FrameId>, major: u8) -> Self {
        let mut h = Self {
            id: id.into(),
            kind: HeaderKind::Frame,
            major,
            revision: 0,
            flags: 0,
            size: 0,
        };
        h.size = h.header_len();
        h
    }

    pub fn padding(len: u64) -> Self {
        Self {
            id: FrameId::padding(),
            kind: HeaderKind::Padding,
            major: 0,
            revision: 0,
            flags: 0,
            size: len,
        }
    }

    pub fn data(len: u64) -> Self {
        Self {
            id: FrameId::new("audio"),
            kind: HeaderKind::Data,
            major: 0,
            revision: 0,
            flags: 0,
            size: len,
        }
    }

    pub fn frame_id_len(major: u8) -> usize {
        if major == 2 { 3 } else { 4 }
    }

    /// Reads a tag header at the start of a file. Anything without the
    /// `ID3` signature ends the top level.
    pub fn read_tag(cur: &mut ByteCursor, limit: u64) -> Result<Option<Self>> {
        let start = cur.tell();
        if limit.saturating_sub(start) < TAG_HEADER_LEN {
            return Ok(None);
        }
        let head = cur.read_array::<10>()?;
        if &head[..3] != b"ID3" {
            return Ok(None);
        }
        let raw = u32::from_be_bytes([head[6], head[7], head[8], head[9]]);
        if !is_synchsafe(raw) {
            warn!("id3: tag at {start} has a size that is not synchsafe; treating it as audio");
            return Ok(None);
        }
        Ok(Some(Self {
            id: FrameId::tag(),
            kind: HeaderKind::Tag,
            major: head[3],
            revision: head[4],
            flags: head[5] as u16,
            size: TAG_HEADER_LEN + decode_synchsafe(raw) as u64,
        }))
    }

    /// Reads a frame header inside a tag of version `major`. Not enough
    /// room, a zero byte or an id with characters outside `A-Z0-9` marks
    /// the start of padding.
    pub fn read_frame(cur: &mut ByteCursor, major: u8, limit: u64) -> Result<Option<Self>> {
        let start = cur.tell();
        let id_len = Self::frame_id_len(major);
        let header_len = if major == 2 { 6 } else { 10 };
        if limit.saturating_sub(start) < header_len {
            return Ok(None);
        }
        let id = cur.read(id_len as u64)?;
        if id[0] == 0 || !FrameId::is_valid_frame(&id) {
            return Ok(None);
        }
        let (size, flags) = match major {
            2 => (cur.read_u24::<BE>()?, 0),
            3 => (cur.read_u32::<BE>()?, cur.read_u16::<BE>()?),
            _ => {
                let raw = cur.read_u32::<BE>()?;
                // Some v2.4 writers store plain sizes.
                let size = if is_synchsafe(raw) { decode_synchsafe(raw) } else { raw };
                (size, cur.read_u16::<BE>()?)
            }
        };
        Ok(Some(Self {
            id: FrameId::new(decode_latin1(&id)),
            kind: HeaderKind::Frame,
            major,
            revision: 0,
            flags,
            size: header_len + size as u64,
        }))
    }
}

impl NodeHeader for Id3Header {
    type Id = FrameId;

    fn id(&self) -> &FrameId {
        &self.id
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn header_len(&self) -> u64 {
        match self.kind {
            HeaderKind::Tag => TAG_HEADER_LEN,
            HeaderKind::Frame if self.major == 2 => 6,
            HeaderKind::Frame => 10,
            HeaderKind::Padding | HeaderKind::Data => 0,
        }
    }

    fn resize(&mut self, content_len: u64) -> Result<()> {
        let max = match self.kind {
            HeaderKind::Tag => SYNCHSAFE_MAX as u64,
            HeaderKind::Frame => match self.major {
                2 => 0xFF_FFFF,
                3 => u32::MAX as u64,
                _ => SYNCHSAFE_MAX as u64,
            },
            HeaderKind::Padding | HeaderKind::Data => u64::MAX,
        };
        if content_len > max {
            return Err(Error::layout(format!("{} cannot hold {content_len} bytes", self.id)));
        }
        self.size = self.header_len() + content_len;
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let body = self.size - self.header_len();
        match self.kind {
            HeaderKind::Tag => {
                out.extend_from_slice(b"ID3");
                out.push(self.major);
                out.push(self.revision);
                // Rewritten tags never carry unsynchronisation, an
                // extended header or a footer.
                out.push(self.flags as u8 & !(TAG_UNSYNC | TAG_EXTENDED | TAG_FOOTER));
                out.write_u32::<BE>(encode_synchsafe(body as u32)?)?;
            }
            HeaderKind::Frame => {
                let id = self.id.as_str().as_bytes();
                if id.len() != Self::frame_id_len(self.major) {
                    return Err(Error::layout(format!(
                        "frame id {} does not fit an ID3v2.{} tag",
                        self.id, self.major
                    )));
                }
                out.extend_from_slice(id);
                match self.major {
                    2 => out.write_u24::<BE>(body as u32)?,
                    3 => {
                        out.write_u32::<BE>(body as u32)?;
                        out.write_u16::<BE>(self.flags)?;
                    }
                    _ => {
                        out.write_u32::<BE>(encode_synchsafe(body as u32)?)?;
                        out.write_u16::<BE>(self.flags)?;
                    }
                }
            }
            HeaderKind::Padding | HeaderKind::Data => {}
        }
        Ok(())
    }
}

/// Fields of the tag node itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub major: u8,
    pub revision: u8,
    pub flags: u8,
    /// The extended header as read (size field included). It is not
    /// written back.
    #[serde(serialize_with = "serialize_hex_opt")]
    pub extended: Option<Vec<u8>>,
}

impl TagRecord {
    pub fn new(major: u8) -> Self {
        Self {
            major,
            revision: 0,
            flags: 0,
            extended: None,
        }
    }

    pub fn unsynchronised(&self) -> bool {
        self.flags & TAG_UNSYNC != 0
    }

    /// Reads the extended header at the start of the tag body.
    pub fn read_extended(&mut self, cur: &mut ByteCursor) -> Result<()> {
        if self.major < 3 || self.flags & TAG_EXTENDED == 0 {
            return Ok(());
        }
        let raw = cur.read_u32::<BE>()?;
        let rest = match self.major {
            3 => raw as u64,
            _ => (decode_synchsafe(raw) as u64).checked_sub(4).ok_or_else(|| {
                Error::header(cur.tell() - 4, "extended header shorter than its size field")
            })?,
        };
        let mut ext = raw.to_be_bytes().to_vec();
        ext.extend_from_slice(&cur.read(rest)?);
        self.extended = Some(ext);
        Ok(())
    }
}

/// Reads one encoded string up to its terminator (or the end of the payload).
fn read_encoded(cur: &mut ByteCursor, enc: TextEncoding) -> Result<String> {
    let width = enc.terminator().len() as u64;
    let mut bytes = Vec::new();
    while cur.remaining() >= width {
        let unit = cur.read(width)?;
        if unit.iter().all(|&b| b == 0) {
            return Ok(enc.decode(&bytes));
        }
        bytes.extend_from_slice(&unit);
    }
    // A dangling odd byte of a UTF-16 string.
    cur.read_to_limit()?;
    Ok(enc.decode(&bytes))
}

fn read_rest(cur: &mut ByteCursor, enc: TextEncoding) -> Result<String> {
    let bytes = cur.read_to_limit()?;
    Ok(trim_nul(&enc.decode(&bytes)).to_string())
}

fn read_latin1z(cur: &mut ByteCursor) -> Result<String> {
    Ok(decode_latin1(&cur.read_cstring()?))
}

fn put_latin1z(out: &mut Vec<u8>, s: &str) -> Result<()> {
    out.extend_from_slice(&encode_latin1(s)?);
    out.push(0);
    Ok(())
}

/// Reads a big-endian counter of four or more bytes.
fn read_counter(cur: &mut ByteCursor) -> Result<Option<u64>> {
    let bytes = cur.read_to_limit()?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let tail = &bytes[bytes.len().saturating_sub(8)..];
    Ok(Some(tail.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)))
}

fn put_counter(out: &mut Vec<u8>, value: u64) -> Result<()> {
    match u32::try_from(value) {
        Ok(v) => out.write_u32::<BE>(v)?,
        Err(_) => out.write_u64::<BE>(value)?,
    }
    Ok(())
}

/// `T???` text frames. v2.4 separates multiple values with the encoding's
/// terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextFrame {
    pub encoding: TextEncoding,
    pub values: Vec<String>,
}

impl TextFrame {
    pub fn new(encoding: TextEncoding, value: impl Into<String>) -> Self {
        Self {
            encoding,
            values: vec![value.into()],
        }
    }

    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let encoding = TextEncoding::from_byte(cur.read_u8()?)?;
        let mut values = Vec::new();
        while cur.has_remaining() {
            values.push(read_encoded(cur, encoding)?);
        }
        if values.len() > 1 && values.last().is_some_and(String::is_empty) {
            values.pop();
        }
        Ok(Self { encoding, values })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.encoding.as_byte());
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(self.encoding.terminator());
            }
            out.extend_from_slice(&self.encoding.encode(v)?);
        }
        Ok(())
    }

    pub fn joined(&self) -> String {
        self.values.join("/")
    }
}

/// `TXXX`: a described text value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTextFrame {
    pub encoding: TextEncoding,
    pub description: String,
    pub values: Vec<String>,
}

impl UserTextFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let encoding = TextEncoding::from_byte(cur.read_u8()?)?;
        let description = read_encoded(cur, encoding)?;
        let mut values = Vec::new();
        while cur.has_remaining() {
            values.push(read_encoded(cur, encoding)?);
        }
        if values.is_empty() {
            values.push(String::new());
        }
        Ok(Self {
            encoding,
            description,
            values,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.encoding.as_byte());
        out.extend_from_slice(&self.encoding.encode_terminated(&self.description)?);
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(self.encoding.terminator());
            }
            out.extend_from_slice(&self.encoding.encode(v)?);
        }
        Ok(())
    }
}

/// `W???` link frames; the URL is always Latin-1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlFrame {
    pub url: String,
}

impl UrlFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            url: read_rest(cur, TextEncoding::Latin1)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&encode_latin1(&self.url)?);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUrlFrame {
    pub encoding: TextEncoding,
    pub description: String,
    pub url: String,
}

impl UserUrlFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let encoding = TextEncoding::from_byte(cur.read_u8()?)?;
        let description = read_encoded(cur, encoding)?;
        Ok(Self {
            encoding,
            description,
            url: read_rest(cur, TextEncoding::Latin1)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.encoding.as_byte());
        out.extend_from_slice(&self.encoding.encode_terminated(&self.description)?);
        out.extend_from_slice(&encode_latin1(&self.url)?);
        Ok(())
    }
}

/// Body shared by comments and unsynchronised lyrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LangTextFrame {
    pub encoding: TextEncoding,
    /// ISO-639-2 code, e.g. `eng`.
    pub language: String,
    pub description: String,
    pub text: String,
}

impl LangTextFrame {
    pub fn new(language: &str, description: &str, text: &str) -> Self {
        let encoding = if [language, description, text].iter().all(|s| encode_latin1(s).is_ok()) {
            TextEncoding::Latin1
        } else {
            TextEncoding::Utf16
        };
        Self {
            encoding,
            language: language.to_string(),
            description: description.to_string(),
            text: text.to_string(),
        }
    }

    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let encoding = TextEncoding::from_byte(cur.read_u8()?)?;
        let language = decode_latin1(&cur.read(3)?);
        let description = read_encoded(cur, encoding)?;
        Ok(Self {
            encoding,
            language: trim_nul(&language).to_string(),
            description,
            text: read_rest(cur, encoding)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.encoding.as_byte());
        let mut lang = encode_latin1(&self.language)?;
        if lang.len() > 3 {
            return Err(Error::InvalidText(format!("language {:?} is longer than 3 bytes", self.language)));
        }
        lang.resize(3, 0);
        out.extend_from_slice(&lang);
        out.extend_from_slice(&self.encoding.encode_terminated(&self.description)?);
        out.extend_from_slice(&self.encoding.encode(&self.text)?);
        Ok(())
    }
}

/// `APIC` (and v2.2 `PIC`, whose MIME type is a three-letter image format).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureFrame {
    pub encoding: TextEncoding,
    pub mime: String,
    pub picture_type: u8,
    pub description: String,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
    #[serde(skip)]
    pub v22: bool,
}

impl PictureFrame {
    pub fn read(cur: &mut ByteCursor, major: u8) -> Result<Self> {
        let encoding = TextEncoding::from_byte(cur.read_u8()?)?;
        let v22 = major == 2;
        let mime = if v22 {
            decode_latin1(&cur.read(3)?)
        } else {
            read_latin1z(cur)?
        };
        let picture_type = cur.read_u8()?;
        let description = read_encoded(cur, encoding)?;
        Ok(Self {
            encoding,
            mime,
            picture_type,
            description,
            data: cur.read_to_limit()?,
            v22,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.encoding.as_byte());
        if self.v22 {
            let mut fmt = encode_latin1(&self.mime)?;
            fmt.resize(3, b' ');
            out.extend_from_slice(&fmt);
        } else {
            put_latin1z(out, &self.mime)?;
        }
        out.push(self.picture_type);
        out.extend_from_slice(&self.encoding.encode_terminated(&self.description)?);
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularimeterFrame {
    pub email: String,
    pub rating: u8,
    pub counter: Option<u64>,
}

impl PopularimeterFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let email = read_latin1z(cur)?;
        let rating = cur.read_u8()?;
        Ok(Self {
            email,
            rating,
            counter: read_counter(cur)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        put_latin1z(out, &self.email)?;
        out.push(self.rating);
        if let Some(c) = self.counter {
            put_counter(out, c)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedDataFrame {
    pub owner: String,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl OwnedDataFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            owner: read_latin1z(cur)?,
            data: cur.read_to_limit()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        put_latin1z(out, &self.owner)?;
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

/// `GEOB`: an encapsulated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectFrame {
    pub encoding: TextEncoding,
    pub mime: String,
    pub filename: String,
    pub description: String,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl ObjectFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let encoding = TextEncoding::from_byte(cur.read_u8()?)?;
        let mime = read_latin1z(cur)?;
        let filename = read_encoded(cur, encoding)?;
        let description = read_encoded(cur, encoding)?;
        Ok(Self {
            encoding,
            mime,
            filename,
            description,
            data: cur.read_to_limit()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.encoding.as_byte());
        put_latin1z(out, &self.mime)?;
        out.extend_from_slice(&self.encoding.encode_terminated(&self.filename)?);
        out.extend_from_slice(&self.encoding.encode_terminated(&self.description)?);
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

/// `SYTC`: tempo codes with a time-stamp format byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncedTempoFrame {
    pub time_format: u8,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl SyncedTempoFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            time_format: cur.read_u8()?,
            data: cur.read_to_limit()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.time_format);
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

/// Marker for "offset not used" in chapter frames.
pub const NO_OFFSET: u32 = 0xFFFF_FFFF;

/// `CHAP`: a chapter whose sub-frames follow as children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterFrame {
    pub element_id: String,
    pub start_time: u32,
    pub end_time: u32,
    /// Byte offsets into the file, or [`NO_OFFSET`].
    pub start_offset: u32,
    pub end_offset: u32,
}

impl ChapterFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Self {
            element_id: read_latin1z(cur)?,
            start_time: cur.read_u32::<BE>()?,
            end_time: cur.read_u32::<BE>()?,
            start_offset: cur.read_u32::<BE>()?,
            end_offset: cur.read_u32::<BE>()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        put_latin1z(out, &self.element_id)?;
        out.write_u32::<BE>(self.start_time)?;
        out.write_u32::<BE>(self.end_time)?;
        out.write_u32::<BE>(self.start_offset)?;
        out.write_u32::<BE>(self.end_offset)?;
        Ok(())
    }
}

/// `CTOC`: a table of contents listing chapter element ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocFrame {
    pub element_id: String,
    pub top_level: bool,
    pub ordered: bool,
    pub child_ids: Vec<String>,
}

impl TocFrame {
    pub fn read(cur: &mut ByteCursor) -> Result<Self> {
        let element_id = read_latin1z(cur)?;
        let flags = cur.read_u8()?;
        let count = cur.read_u8()?;
        let mut child_ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            child_ids.push(read_latin1z(cur)?);
        }
        Ok(Self {
            element_id,
            top_level: flags & 0x02 != 0,
            ordered: flags & 0x01 != 0,
            child_ids,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        put_latin1z(out, &self.element_id)?;
        out.push(((self.top_level as u8) << 1) | self.ordered as u8);
        let count = u8::try_from(self.child_ids.len())
            .map_err(|_| Error::layout("table of contents lists more than 255 entries"))?;
        out.push(count);
        for id in &self.child_ids {
            put_latin1z(out, id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Id3Record {
    Tag(TagRecord),
    Text(TextFrame),
    UserText(UserTextFrame),
    Url(UrlFrame),
    UserUrl(UserUrlFrame),
    Comment(LangTextFrame),
    Lyrics(LangTextFrame),
    Picture(PictureFrame),
    Popularimeter(PopularimeterFrame),
    PlayCounter { count: u64 },
    SyncedTempo(SyncedTempoFrame),
    UniqueFileId(OwnedDataFrame),
    Private(OwnedDataFrame),
    Object(ObjectFrame),
    CdId {
        #[serde(serialize_with = "serialize_hex")]
        toc: Vec<u8>,
    },
    Chapter(ChapterFrame),
    TableOfContents(TocFrame),
    Padding { len: u64 },
    Opaque(Raw),
}

impl Id3Record {
    pub fn play_counter(cur: &mut ByteCursor) -> Result<Self> {
        Ok(Id3Record::PlayCounter {
            count: read_counter(cur)?.unwrap_or(0),
        })
    }
}

impl Record for Id3Record {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Id3Record::Tag(_) => Ok(()),
            Id3Record::Text(r) => r.encode(out),
            Id3Record::UserText(r) => r.encode(out),
            Id3Record::Url(r) => r.encode(out),
            Id3Record::UserUrl(r) => r.encode(out),
            Id3Record::Comment(r) | Id3Record::Lyrics(r) => r.encode(out),
            Id3Record::Picture(r) => r.encode(out),
            Id3Record::Popularimeter(r) => r.encode(out),
            Id3Record::PlayCounter { count } => put_counter(out, *count),
            Id3Record::SyncedTempo(r) => r.encode(out),
            Id3Record::UniqueFileId(r) | Id3Record::Private(r) => r.encode(out),
            Id3Record::Object(r) => r.encode(out),
            Id3Record::CdId { toc } => {
                out.extend_from_slice(toc);
                Ok(())
            }
            Id3Record::Chapter(r) => r.encode(out),
            Id3Record::TableOfContents(r) => r.encode(out),
            Id3Record::Padding { len } => {
                out.resize(out.len() + *len as usize, 0);
                Ok(())
            }
            Id3Record::Opaque(raw) => match raw.bytes() {
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
            Id3Record::Opaque(raw) => Some(raw),
            _ => None,
        }
    }

    fn raw_mut(&mut self) -> Option<&mut Raw> {
        match self {
            Id3Record::Opaque(raw) => Some(raw),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Id3Record::Tag(_) => "tag",
            Id3Record::Text(_) => "text",
            Id3Record::UserText(_) => "user_text",
            Id3Record::Url(_) => "url",
            Id3Record::UserUrl(_) => "user_url",
            Id3Record::Comment(_) => "comment",
            Id3Record::Lyrics(_) => "lyrics",
            Id3Record::Picture(_) => "picture",
            Id3Record::Popularimeter(_) => "popularimeter",
            Id3Record::PlayCounter { .. } => "play_counter",
            Id3Record::SyncedTempo(_) => "synced_tempo",
            Id3Record::UniqueFileId(_) => "unique_file_id",
            Id3Record::Private(_) => "private",
            Id3Record::Object(_) => "object",
            Id3Record::CdId { .. } => "cd_id",
            Id3Record::Chapter(_) => "chapter",
            Id3Record::TableOfContents(_) => "table_of_contents",
            Id3Record::Padding { .. } => "padding",
            Id3Record::Opaque(_) => "opaque",
        }
    }
}
