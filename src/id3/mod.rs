//! ID3v2 tags (v2.2 to v2.4) and the ID3v1 trailer.
//!
//! A tree holds the tag as a top-level container whose children are
//! frames, with any zero bytes after the last frame modelled as a
//! `padding` node. Everything after the tag is kept as one opaque `audio`
//! node.

pub mod frames;
pub mod genres;
pub mod v1;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::format::{Format, NodeHeader, Scope, shift_offset};
use crate::ids::FrameId;
use crate::node::{NodeId, Raw, Tree};
use crate::parser::expect_header;
use crate::registry::{Decoded, NodeDecoder, Registry};
use crate::text::{TextEncoding, encode_latin1};
use log::debug;
use std::sync::OnceLock;

pub use frames::{
    ChapterFrame, HeaderKind, Id3Header, Id3Record, LangTextFrame, PictureFrame, TagRecord, TextFrame, TocFrame,
};
pub use genres::{genre_name, resolve_tcon};
pub use v1::{Id3v1, read_v1, write_v1};

use frames::*;

#[derive(Debug, Clone, Copy)]
pub struct Id3;

/// Inherited decode state: the major version of the enclosing tag, or 0 at
/// the top level of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Id3Ctx {
    pub major: u8,
}

type Out = Result<Decoded<Id3Record>>;

pub struct TagDecoder;

impl NodeDecoder<Id3> for TagDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<Id3Ctx>) -> Out {
        let header = expect_header::<Id3>(cur, scope)?;
        let major = header.major;
        if !(2..=4).contains(&major) {
            return Err(Error::UnsupportedVersion {
                what: "ID3v2",
                version: major as u32,
            });
        }
        let mut record = TagRecord {
            major,
            revision: header.revision,
            flags: header.flags as u8,
            extended: None,
        };
        if major == 2 && record.flags & TAG_COMPRESSED_V22 != 0 {
            return Err(Error::Unsupported("compressed ID3v2.2 tag".into()));
        }
        // v2.4 unsynchronises frame by frame instead.
        if major < 4 && record.unsynchronised() {
            let mut body = ByteCursor::from_bytes(undo_unsync(&cur.read_to_limit()?));
            record.read_extended(&mut body)?;
            return Ok(Decoded::Rebased(Id3Record::Tag(record), body));
        }
        record.read_extended(cur)?;
        Ok(Decoded::Container(Id3Record::Tag(record)))
    }
}

fn check_frame_flags(header: &Id3Header) -> Result<()> {
    let blocked = match header.major {
        3 => V23_COMPRESSION | V23_ENCRYPTION | V23_GROUPING,
        4 => V24_COMPRESSION | V24_ENCRYPTION | V24_GROUPING,
        _ => 0,
    };
    if header.flags & blocked != 0 {
        return Err(Error::Unsupported(format!(
            "{} frame flags {:#06x}",
            header.id, header.flags
        )));
    }
    Ok(())
}

/// The frame body with the data length indicator skipped and frame-level
/// unsynchronisation undone.
fn frame_payload(cur: &mut ByteCursor, header: &Id3Header) -> Result<ByteCursor> {
    check_frame_flags(header)?;
    let v24 = header.major == 4;
    if v24 && header.flags & V24_DATA_LENGTH != 0 {
        cur.skip(4)?;
    }
    let bytes = cur.read_to_limit()?;
    let bytes = if v24 && header.flags & V24_UNSYNC != 0 {
        undo_unsync(&bytes)
    } else {
        bytes
    };
    Ok(ByteCursor::from_bytes(bytes))
}

/// Leaf frames decoded from their payload by a single function taking the
/// tag's major version.
pub struct FrameDecoder(pub fn(&mut ByteCursor, u8) -> Result<Id3Record>);

impl NodeDecoder<Id3> for FrameDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<Id3Ctx>) -> Out {
        let header = expect_header::<Id3>(cur, scope)?;
        let mut payload = frame_payload(cur, &header)?;
        Ok(Decoded::Leaf((self.0)(&mut payload, header.major)?))
    }
}

/// `CHAP` and `CTOC`: fixed fields followed by embedded frames.
pub struct ChapterDecoder;

impl NodeDecoder<Id3> for ChapterDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<Id3Ctx>) -> Out {
        let header = expect_header::<Id3>(cur, scope)?;
        check_frame_flags(&header)?;
        if header.major == 4 && header.flags & (V24_UNSYNC | V24_DATA_LENGTH) != 0 {
            return Err(Error::Unsupported(format!("{} with transformed body", header.id)));
        }
        let record = match header.id.as_str() {
            "CHAP" => Id3Record::Chapter(ChapterFrame::read(cur)?),
            _ => Id3Record::TableOfContents(TocFrame::read(cur)?),
        };
        Ok(Decoded::Container(record))
    }
}

type ReadFn = fn(&mut ByteCursor, u8) -> Result<Id3Record>;

fn is_text(parent: Option<&FrameId>, id: &FrameId) -> bool {
    let s = id.as_str();
    parent.is_some() && s.starts_with('T') && s != "TXXX" && s != "TXX"
}

fn is_url(parent: Option<&FrameId>, id: &FrameId) -> bool {
    let s = id.as_str();
    parent.is_some() && s.starts_with('W') && s != "WXXX" && s != "WXX"
}

/// The registry `Tree::<Id3>::open` decodes with. Frames are registered
/// under both their v2.2 and v2.3+ ids.
pub fn default_registry() -> Registry<Id3> {
    let leaves: [(&[&str], &str, ReadFn); 11] = [
        (&["TXXX", "TXX"], "user text", |c, _| Ok(Id3Record::UserText(UserTextFrame::read(c)?))),
        (&["WXXX", "WXX"], "user url", |c, _| Ok(Id3Record::UserUrl(UserUrlFrame::read(c)?))),
        (&["COMM", "COM"], "comment", |c, _| Ok(Id3Record::Comment(LangTextFrame::read(c)?))),
        (&["USLT", "ULT"], "lyrics", |c, _| Ok(Id3Record::Lyrics(LangTextFrame::read(c)?))),
        (&["APIC", "PIC"], "picture", |c, major| {
            Ok(Id3Record::Picture(PictureFrame::read(c, major)?))
        }),
        (&["POPM", "POP"], "popularimeter", |c, _| {
            Ok(Id3Record::Popularimeter(PopularimeterFrame::read(c)?))
        }),
        (&["PCNT", "CNT"], "play counter", |c, _| Id3Record::play_counter(c)),
        (&["SYTC", "STC"], "synced tempo", |c, _| Ok(Id3Record::SyncedTempo(SyncedTempoFrame::read(c)?))),
        (&["UFID", "UFI"], "unique file id", |c, _| Ok(Id3Record::UniqueFileId(OwnedDataFrame::read(c)?))),
        (&["GEOB", "GEO"], "object", |c, _| Ok(Id3Record::Object(ObjectFrame::read(c)?))),
        (&["MCDI", "MCI"], "cd id", |c, _| Ok(Id3Record::CdId { toc: c.read_to_limit()? })),
    ];
    let mut reg = Registry::new()
        .with_rule("text", is_text, Box::new(FrameDecoder(|c, _| Ok(Id3Record::Text(TextFrame::read(c)?)))))
        .with_rule("url", is_url, Box::new(FrameDecoder(|c, _| Ok(Id3Record::Url(UrlFrame::read(c)?)))))
        .with_decoder(FrameId::tag(), "tag", Box::new(TagDecoder))
        .with_decoder(FrameId::new("PRIV"), "private", Box::new(FrameDecoder(|c, _| {
            Ok(Id3Record::Private(OwnedDataFrame::read(c)?))
        })))
        .with_decoder(FrameId::new("CHAP"), "chapter", Box::new(ChapterDecoder))
        .with_decoder(FrameId::new("CTOC"), "table of contents", Box::new(ChapterDecoder));
    for (ids, name, read) in leaves {
        for id in ids {
            reg = reg.with_decoder(FrameId::new(*id), name, Box::new(FrameDecoder(read)));
        }
    }
    reg
}

const SHORTHANDS: &[(&str, &str)] = &[
    ("tag", "ID3"),
    ("padding", "padding"),
    ("audio", "audio"),
    ("title", "TIT2"),
    ("subtitle", "TIT3"),
    ("artist", "TPE1"),
    ("album_artist", "TPE2"),
    ("album", "TALB"),
    ("composer", "TCOM"),
    ("genre", "TCON"),
    ("track", "TRCK"),
    ("disc", "TPOS"),
    ("year", "TYER"),
    ("date", "TDRC"),
    ("bpm", "TBPM"),
    ("comment", "COMM"),
    ("lyrics", "USLT"),
    ("picture", "APIC"),
    ("chapter", "CHAP"),
];

const DESCRIPTIONS: &[(&str, &str)] = &[
    ("ID3", "ID3v2 tag"),
    ("padding", "Padding"),
    ("audio", "Audio data"),
    ("TIT1", "Content group description"),
    ("TIT2", "Title"),
    ("TIT3", "Subtitle"),
    ("TPE1", "Lead performer"),
    ("TPE2", "Band / album artist"),
    ("TPE3", "Conductor"),
    ("TPE4", "Remixed by"),
    ("TALB", "Album"),
    ("TCOM", "Composer"),
    ("TCON", "Content type"),
    ("TRCK", "Track number"),
    ("TPOS", "Part of a set"),
    ("TYER", "Year"),
    ("TDRC", "Recording time"),
    ("TBPM", "Beats per minute"),
    ("TLEN", "Length"),
    ("TENC", "Encoded by"),
    ("TSSE", "Encoder settings"),
    ("TCOP", "Copyright"),
    ("TPUB", "Publisher"),
    ("TXXX", "User defined text"),
    ("WXXX", "User defined URL"),
    ("COMM", "Comments"),
    ("USLT", "Unsynchronised lyrics"),
    ("APIC", "Attached picture"),
    ("POPM", "Popularimeter"),
    ("PCNT", "Play counter"),
    ("PRIV", "Private frame"),
    ("UFID", "Unique file identifier"),
    ("GEOB", "General encapsulated object"),
    ("MCDI", "Music CD identifier"),
    ("SYTC", "Synchronised tempo codes"),
    ("CHAP", "Chapter"),
    ("CTOC", "Table of contents"),
    ("TT2", "Title"),
    ("TP1", "Lead performer"),
    ("TAL", "Album"),
    ("COM", "Comments"),
    ("PIC", "Attached picture"),
];

fn shift_u32(value: &mut u32, pivot: u64, delta: i64) -> Result<bool> {
    if *value == NO_OFFSET || (*value as u64) < pivot {
        return Ok(false);
    }
    let shifted = shift_offset(*value as u64, delta)?;
    *value = u32::try_from(shifted).map_err(|_| Error::layout(format!("chapter offset {shifted} exceeds 32 bits")))?;
    Ok(true)
}

impl Format for Id3 {
    type Id = FrameId;
    type Header = Id3Header;
    type Record = Id3Record;
    type Context = Id3Ctx;

    const NAME: &'static str = "id3";

    fn read_header(cur: &mut ByteCursor, ctx: Id3Ctx, limit: u64) -> Result<Option<Id3Header>> {
        match ctx.major {
            0 => Id3Header::read_tag(cur, limit),
            major => Id3Header::read_frame(cur, major, limit),
        }
    }

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<Id3>> = OnceLock::new();
        REGISTRY.get_or_init(default_registry)
    }

    fn opaque(raw: Raw) -> Id3Record {
        Id3Record::Opaque(raw)
    }

    fn child_context(record: &Id3Record, ctx: Id3Ctx) -> Id3Ctx {
        match record {
            Id3Record::Tag(t) => Id3Ctx { major: t.major },
            _ => ctx,
        }
    }

    /// Inside a tag the rest is padding (kept raw if it is not all zero);
    /// at the top level it is the audio stream.
    fn trailing(
        cur: &mut ByteCursor,
        parent: Option<&FrameId>,
        _ctx: Id3Ctx,
        end: u64,
        inline_limit: u64,
    ) -> Result<Option<(Id3Header, Id3Record)>> {
        let start = cur.tell();
        if start >= end {
            return Ok(None);
        }
        let raw = Raw::capture(cur, start, end, inline_limit)?;
        let len = raw.len();
        if parent.is_none() {
            return Ok(Some((Id3Header::data(len), Id3Record::Opaque(raw))));
        }
        let zeroed = raw.bytes().is_some_and(|b| b.iter().all(|&x| x == 0));
        let record = if zeroed {
            Id3Record::Padding { len }
        } else {
            Id3Record::Opaque(raw)
        };
        Ok(Some((Id3Header::padding(len), record)))
    }

    /// Re-encoded frames are written without the transformations undone on
    /// read, and a rewritten tag drops its extended header.
    fn finalize(header: &mut Id3Header, record: &mut Id3Record, _child_count: usize, _children_len: u64) {
        match record {
            Id3Record::Tag(t) => {
                t.flags &= !(TAG_UNSYNC | TAG_EXTENDED | TAG_FOOTER);
                t.extended = None;
                header.flags = t.flags as u16;
            }
            Id3Record::Opaque(_) => {}
            _ if header.kind == HeaderKind::Frame && header.major == 4 => {
                header.flags &= !(V24_UNSYNC | V24_DATA_LENGTH);
            }
            _ => {}
        }
    }

    fn shorthand(name: &str) -> Option<FrameId> {
        SHORTHANDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, id)| FrameId::new(*id))
    }

    fn describe(id: &FrameId) -> Option<&'static str> {
        DESCRIPTIONS
            .iter()
            .find(|(i, _)| *i == id.as_str())
            .map(|(_, d)| *d)
    }

    /// Chapter frames may point at byte positions in the file.
    fn repair_offsets(record: &mut Id3Record, pivot: u64, delta: i64) -> Result<bool> {
        match record {
            Id3Record::Chapter(c) => {
                let a = shift_u32(&mut c.start_offset, pivot, delta)?;
                let b = shift_u32(&mut c.end_offset, pivot, delta)?;
                Ok(a || b)
            }
            _ => Ok(false),
        }
    }

    /// Frames are always written as part of their whole tag, which owns
    /// the padding.
    fn write_root(tree: &Tree<Self>, id: NodeId) -> NodeId {
        tree.top_ancestor(id)
    }

    fn prepare_write(tree: &mut Tree<Self>, target: NodeId) -> Result<()> {
        fit_padding(tree, target)
    }
}

/// Padding given to a tag that has outgrown its space: 1 KiB steps that
/// widen logarithmically with the tag size, so repeated growth rarely
/// moves the audio again.
pub fn growth_padding(needed: u64) -> u64 {
    1024 * (1 + (needed / 1024 + 1).ilog2() as u64)
}

/// Sizes the padding of a dirty tag so the tag keeps its on-disk length
/// when the frames still fit, and grows by [`growth_padding`] otherwise.
/// The padding node always ends up last.
fn fit_padding(tree: &mut Tree<Id3>, tag: NodeId) -> Result<()> {
    let node = tree.node(tag);
    if node.header().kind != HeaderKind::Tag || !node.is_dirty() || Id3::is_opaque(node.record()) {
        return Ok(());
    }
    let kids: Vec<NodeId> = node.children().map(|c| c.ids().collect()).unwrap_or_default();
    let pads: Vec<NodeId> = kids
        .iter()
        .copied()
        .filter(|&k| tree.node(k).header().kind == HeaderKind::Padding)
        .collect();
    let keep = match pads.as_slice() {
        [p] if kids.last() == Some(p) => Some(*p),
        _ => None,
    };
    for &p in &pads {
        if Some(p) != keep {
            tree.remove(p)?;
        }
    }

    let mut used = TAG_HEADER_LEN;
    for &k in kids.iter().filter(|k| !pads.contains(k)) {
        used += tree.recompute(k)?;
    }
    let span = tree.node(tag).span().unwrap_or(0);
    let len = if used <= span { span - used } else { growth_padding(used) };
    debug!("id3: {used} bytes of frames in a {span}-byte tag, {len} bytes of padding");

    let padding = Id3Record::Padding { len };
    match keep {
        Some(p) if tree.node(p).record() == &padding => {}
        Some(p) => tree.set_record(p, padding),
        None if len > 0 => {
            tree.add_leaf(Some(tag), Id3Header::padding(len), padding)?;
        }
        None => {}
    }
    Ok(())
}

/// The first decodable tag of the file.
pub fn tag(tree: &Tree<Id3>) -> Option<NodeId> {
    tree.top()
        .get_all(&FrameId::tag())
        .into_iter()
        .find(|&t| !Id3::is_opaque(tree.node(t).record()))
}

/// The tag, creating an empty one of version `major` at the start of the
/// file if there is none.
pub fn ensure_tag(tree: &mut Tree<Id3>, major: u8) -> Result<NodeId> {
    if let Some(t) = tag(tree) {
        return Ok(t);
    }
    if tree.top().has(&FrameId::tag()) {
        return Err(Error::NotWritable("the file's ID3v2 tag cannot be decoded".into()));
    }
    if !(2..=4).contains(&major) {
        return Err(Error::UnsupportedVersion {
            what: "ID3v2",
            version: major as u32,
        });
    }
    let base = tree.source.as_ref().map_or(0, ByteCursor::base);
    Ok(tree.insert_placeholder(
        0,
        base,
        Id3Header::tag(major),
        Id3Record::Tag(TagRecord::new(major)),
        true,
    ))
}

fn major_of(tree: &Tree<Id3>, tag: NodeId) -> u8 {
    match tree.node(tag).record() {
        Id3Record::Tag(t) => t.major,
        _ => 4,
    }
}

/// Every frame with this id directly under the tag, in file order.
pub fn frames(tree: &Tree<Id3>, id: &str) -> Vec<NodeId> {
    tag(tree)
        .and_then(|t| tree.node(t).children())
        .map(|c| c.get_all(&FrameId::new(id)))
        .unwrap_or_default()
}

/// Text of the first frame with this id, multiple values joined with `/`.
pub fn text(tree: &Tree<Id3>, id: &str) -> Option<String> {
    frames(tree, id).into_iter().find_map(|f| match tree.node(f).record() {
        Id3Record::Text(t) => Some(t.joined()),
        _ => None,
    })
}

fn encoding_for(value: &str, major: u8) -> TextEncoding {
    if encode_latin1(value).is_ok() {
        TextEncoding::Latin1
    } else if major == 4 {
        TextEncoding::Utf8
    } else {
        TextEncoding::Utf16
    }
}

fn check_id(id: &str, major: u8) -> Result<()> {
    if id.len() != Id3Header::frame_id_len(major) || !FrameId::is_valid_frame(id.as_bytes()) {
        return Err(Error::InvalidText(format!("{id:?} is not an ID3v2.{major} frame id")));
    }
    Ok(())
}

/// Sets a text frame such as `TIT2`, replacing the first existing one.
/// Creates a v2.4 tag if the file has none. Returns the frame node.
pub fn set_text(tree: &mut Tree<Id3>, id: &str, value: &str) -> Result<NodeId> {
    if !id.starts_with('T') || id == "TXXX" || id == "TXX" {
        return Err(Error::InvalidText(format!("{id:?} is not a plain text frame")));
    }
    let tag = ensure_tag(tree, 4)?;
    let major = major_of(tree, tag);
    check_id(id, major)?;
    let record = Id3Record::Text(TextFrame::new(encoding_for(value, major), value));
    match frames(tree, id).first() {
        Some(&f) => {
            tree.set_record(f, record);
            Ok(f)
        }
        None => tree.add_leaf(Some(tag), Id3Header::frame(id, major), record),
    }
}

/// Appends a comment frame; comments may repeat.
pub fn add_comment(tree: &mut Tree<Id3>, language: &str, description: &str, value: &str) -> Result<NodeId> {
    let tag = ensure_tag(tree, 4)?;
    let major = major_of(tree, tag);
    let id = if major == 2 { "COM" } else { "COMM" };
    let frame = LangTextFrame::new(language, description, value);
    tree.add_leaf(Some(tag), Id3Header::frame(id, major), Id3Record::Comment(frame))
}

/// Every comment, in file order.
pub fn comments(tree: &Tree<Id3>) -> Vec<&LangTextFrame> {
    ["COMM", "COM"]
        .iter()
        .flat_map(|id| frames(tree, id))
        .filter_map(|f| match tree.node(f).record() {
            Id3Record::Comment(c) => Some(c),
            _ => None,
        })
        .collect()
}

/// Genre names of the `TCON` (or v2.2 `TCO`) frame, with numeric
/// references resolved.
pub fn genres(tree: &Tree<Id3>) -> Vec<String> {
    ["TCON", "TCO"]
        .iter()
        .flat_map(|id| frames(tree, id))
        .filter_map(|f| match tree.node(f).record() {
            Id3Record::Text(t) => Some(t.values.clone()),
            _ => None,
        })
        .flatten()
        .flat_map(|v| resolve_tcon(&v))
        .collect()
}

/// Bytes of a tag header, for callers assembling tags by hand.
pub fn encode_tag_header(major: u8, body_len: u64) -> Result<Vec<u8>> {
    let mut h = Id3Header::tag(major);
    h.resize(body_len)?;
    let mut out = Vec::new();
    h.encode(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_padding_steps() {
        assert_eq!(growth_padding(100), 1024);
        assert_eq!(growth_padding(1023), 1024);
        assert_eq!(growth_padding(1024), 2048);
        assert_eq!(growth_padding(3 * 1024), 3072);
        assert_eq!(growth_padding(100_000), 1024 * 7);
    }

    #[test]
    fn text_and_url_rules() {
        let tag = FrameId::tag();
        assert!(is_text(Some(&tag), &FrameId::new("TIT2")));
        assert!(!is_text(Some(&tag), &FrameId::new("TXXX")));
        assert!(!is_text(None, &FrameId::new("TIT2")));
        assert!(is_url(Some(&tag), &FrameId::new("WOAR")));
        assert!(!is_url(Some(&tag), &FrameId::new("WXX")));
    }

    #[test]
    fn v24_frames_drop_transform_flags_on_rewrite() {
        let mut header = Id3Header::frame("TIT2", 4);
        header.flags = V24_UNSYNC | V24_DATA_LENGTH | 0x4000;
        let mut record = Id3Record::Text(TextFrame::new(TextEncoding::Latin1, "x"));
        Id3::finalize(&mut header, &mut record, 0, 0);
        assert_eq!(header.flags, 0x4000);
    }

    #[test]
    fn chapter_offsets_shift() {
        let mut rec = Id3Record::Chapter(ChapterFrame {
            element_id: "ch1".into(),
            start_time: 0,
            end_time: 1000,
            start_offset: 5000,
            end_offset: NO_OFFSET,
        });
        assert!(Id3::repair_offsets(&mut rec, 100, 24).unwrap());
        match rec {
            Id3Record::Chapter(c) => {
                assert_eq!(c.start_offset, 5024);
                assert_eq!(c.end_offset, NO_OFFSET);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn tag_header_bytes() {
        assert_eq!(encode_tag_header(3, 257).unwrap(), vec![b'I', b'D', b'3', 3, 0, 0, 0, 0, 2, 1]);
    }
}
