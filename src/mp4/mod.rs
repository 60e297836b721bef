//! ISO-14496 (MP4 / QuickTime) boxes.

pub mod boxes;
pub mod decoders;
pub mod items;
pub mod known;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::format::{Format, shift_offset};
use crate::node::{NodeId, Raw, Tree};
use crate::registry::Registry;
use std::sync::OnceLock;

pub use boxes::{BoxHeader, BoxKey, FullHeader, Mp4Record};
pub use decoders::default_registry;
pub use items::{item_list, item_list_mut, set_text_item, text_item};

#[derive(Debug, Clone, Copy)]
pub struct Mp4;

const SHORTHANDS: &[(&str, &[u8; 4])] = &[
    ("file_type", b"ftyp"),
    ("movie", b"moov"),
    ("media_data", b"mdat"),
    ("header", b"mvhd"),
    ("movie_header", b"mvhd"),
    ("track", b"trak"),
    ("track_header", b"tkhd"),
    ("edits", b"edts"),
    ("edit_list", b"elst"),
    ("media", b"mdia"),
    ("media_header", b"mdhd"),
    ("handler", b"hdlr"),
    ("media_info", b"minf"),
    ("sample_table", b"stbl"),
    ("sample_descriptions", b"stsd"),
    ("time_to_sample", b"stts"),
    ("sample_to_chunk", b"stsc"),
    ("sample_sizes", b"stsz"),
    ("chunk_offsets", b"stco"),
    ("chunk_offsets64", b"co64"),
    ("user_data", b"udta"),
    ("metadata", b"meta"),
    ("item_list", b"ilst"),
    ("fragment", b"moof"),
    ("track_fragment", b"traf"),
];

fn shift_u32(value: u32, delta: i64) -> Result<u32> {
    let shifted = shift_offset(value as u64, delta)?;
    u32::try_from(shifted).map_err(|_| Error::layout(format!("chunk offset {shifted} no longer fits stco; use co64")))
}

impl Format for Mp4 {
    type Id = BoxKey;
    type Header = BoxHeader;
    type Record = Mp4Record;
    type Context = ();

    const NAME: &'static str = "mp4";

    fn read_header(cur: &mut ByteCursor, _ctx: (), limit: u64) -> Result<Option<BoxHeader>> {
        BoxHeader::read(cur, limit)
    }

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<Mp4>> = OnceLock::new();
        REGISTRY.get_or_init(default_registry)
    }

    fn opaque(raw: Raw) -> Mp4Record {
        Mp4Record::Opaque(raw)
    }

    /// Fewer than eight bytes cannot hold a box; they are kept as a
    /// headerless node so the container still round-trips.
    fn trailing(
        cur: &mut ByteCursor,
        _parent: Option<&BoxKey>,
        _ctx: (),
        end: u64,
        inline_limit: u64,
    ) -> Result<Option<(BoxHeader, Mp4Record)>> {
        let start = cur.tell();
        if start >= end {
            return Ok(None);
        }
        let raw = Raw::capture(cur, start, end, inline_limit)?;
        Ok(Some((BoxHeader::bare(end - start), Mp4Record::Opaque(raw))))
    }

    fn finalize(_header: &mut BoxHeader, record: &mut Mp4Record, child_count: usize, _children_len: u64) {
        match record {
            Mp4Record::Entries(e) => e.entry_count = child_count as u32,
            Mp4Record::TrackFragmentHeader(t) => t.sync_flags(),
            Mp4Record::TrackRun(t) => t.sync_flags(),
            _ => {}
        }
    }

    fn shorthand(name: &str) -> Option<BoxKey> {
        SHORTHANDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, cc)| BoxKey::cc(cc))
    }

    fn describe(id: &BoxKey) -> Option<&'static str> {
        known::full_name(id)
    }

    fn repair_offsets(record: &mut Mp4Record, pivot: u64, delta: i64) -> Result<bool> {
        let mut changed = false;
        match record {
            Mp4Record::ChunkOffsets(t) => {
                for e in t.entries.iter_mut().filter(|e| **e as u64 >= pivot) {
                    *e = shift_u32(*e, delta)?;
                    changed = true;
                }
            }
            Mp4Record::ChunkOffsets64(t) => {
                for e in t.entries.iter_mut().filter(|e| **e >= pivot) {
                    *e = shift_offset(*e, delta)?;
                    changed = true;
                }
            }
            Mp4Record::TrackFragmentHeader(t) => {
                if let Some(b) = t.base_data_offset.as_mut()
                    && *b >= pivot
                {
                    *b = shift_offset(*b, delta)?;
                    changed = true;
                }
            }
            _ => {}
        }
        Ok(changed)
    }

    /// Entry counts of `stsd` and `dref` live in the parent's record, so a
    /// change below one of them rewrites it whole.
    fn write_root(tree: &Tree<Self>, id: NodeId) -> NodeId {
        tree.ancestors(id)
            .into_iter()
            .rev()
            .find(|&a| matches!(tree.node(a).record(), Mp4Record::Entries(_)))
            .unwrap_or(id)
    }
}
