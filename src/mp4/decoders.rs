//! Box decoders and the default ISO-14496 registry.

use super::Mp4;
use super::boxes::*;
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::format::Scope;
use crate::parser::expect_header;
use crate::registry::{Decoded, NodeDecoder, Registry};

type Out = Result<Decoded<Mp4Record>>;

/// A box whose payload is nothing but child boxes.
pub struct ContainerDecoder;

impl NodeDecoder<Mp4> for ContainerDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Mp4>(cur, scope)?;
        Ok(Decoded::Container(Mp4Record::Container))
    }
}

/// A full box with an entry count followed by child boxes (`stsd`, `dref`).
pub struct EntriesDecoder;

impl NodeDecoder<Mp4> for EntriesDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Mp4>(cur, scope)?;
        Ok(Decoded::Container(Mp4Record::Entries(EntryContainer::read(cur)?)))
    }
}

pub struct MetaDecoder;

impl NodeDecoder<Mp4> for MetaDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Mp4>(cur, scope)?;
        Ok(Decoded::Container(Mp4Record::Meta(Meta::read(cur)?)))
    }
}

/// Leaf boxes decoded by a single read function.
pub struct LeafDecoder(pub fn(&mut ByteCursor) -> Result<Mp4Record>);

impl NodeDecoder<Mp4> for LeafDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Mp4>(cur, scope)?;
        Ok(Decoded::Leaf((self.0)(cur)?))
    }
}

pub struct FreeDecoder;

impl NodeDecoder<Mp4> for FreeDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Mp4>(cur, scope)?;
        let len = cur.remaining();
        cur.seek_to(scope.limit)?;
        Ok(Decoded::Leaf(Mp4Record::Free(Free { len })))
    }
}

/// Video sample entries; codec configuration boxes (`avcC`, `pasp`, ...) follow as children.
pub struct VisualEntryDecoder;

impl NodeDecoder<Mp4> for VisualEntryDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Mp4>(cur, scope)?;
        Ok(Decoded::Container(Mp4Record::VisualSampleEntry(VisualSampleEntry::read(cur)?)))
    }
}

pub struct AudioEntryDecoder;

impl NodeDecoder<Mp4> for AudioEntryDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Mp4>(cur, scope)?;
        Ok(Decoded::Container(Mp4Record::AudioSampleEntry(AudioSampleEntry::read(cur)?)))
    }
}

const VISUAL_ENTRIES: &[&[u8; 4]] = &[
    b"avc1", b"avc2", b"avc3", b"avc4", b"hvc1", b"hev1", b"av01", b"vp08", b"vp09", b"mp4v",
    b"encv",
];

const AUDIO_ENTRIES: &[&[u8; 4]] = &[
    b"mp4a", b"alac", b"ac-3", b"ec-3", b"Opus", b"fLaC", b"samr", b"sawb", b"enca",
];

fn under(parent: Option<&BoxKey>, cc: &[u8; 4]) -> bool {
    parent.is_some_and(|p| p.is(cc))
}

fn is_visual_entry(parent: Option<&BoxKey>, id: &BoxKey) -> bool {
    under(parent, b"stsd") && VISUAL_ENTRIES.iter().any(|cc| id.is(cc))
}

fn is_audio_entry(parent: Option<&BoxKey>, id: &BoxKey) -> bool {
    under(parent, b"stsd") && AUDIO_ENTRIES.iter().any(|cc| id.is(cc))
}

/// Every box directly inside `ilst` is an item holding `data` (and, for
/// freeform `----` items, `mean` and `name`).
fn is_list_item(parent: Option<&BoxKey>, _id: &BoxKey) -> bool {
    under(parent, b"ilst")
}

const CONTAINERS: &[&[u8; 4]] = &[
    b"moov", b"trak", b"mdia", b"minf", b"stbl", b"edts", b"udta", b"dinf", b"mvex", b"moof",
    b"traf", b"mfra", b"ilst", b"sinf", b"schi", b"tref", b"iprp", b"ipco",
];

fn leaf(cc: &[u8; 4], read: fn(&mut ByteCursor) -> Result<Mp4Record>) -> (BoxKey, String, LeafDecoder) {
    (BoxKey::cc(cc), String::from_utf8_lossy(cc).into_owned(), LeafDecoder(read))
}

/// The registry `Tree::<Mp4>::open` decodes with.
pub fn default_registry() -> Registry<Mp4> {
    let mut reg = Registry::new()
        .with_rule("visual sample entry", is_visual_entry, Box::new(VisualEntryDecoder))
        .with_rule("audio sample entry", is_audio_entry, Box::new(AudioEntryDecoder))
        .with_rule("item list entry", is_list_item, Box::new(ContainerDecoder))
        .with_decoder(BoxKey::cc(b"meta"), "meta", Box::new(MetaDecoder))
        .with_decoder(BoxKey::cc(b"stsd"), "stsd", Box::new(EntriesDecoder))
        .with_decoder(BoxKey::cc(b"dref"), "dref", Box::new(EntriesDecoder));
    for cc in CONTAINERS {
        reg = reg.with_decoder(BoxKey::cc(cc), &String::from_utf8_lossy(*cc), Box::new(ContainerDecoder));
    }
    for cc in [b"free", b"skip", b"wide"] {
        reg = reg.with_decoder(BoxKey::cc(cc), &String::from_utf8_lossy(cc), Box::new(FreeDecoder));
    }
    let leaves = [
        leaf(b"ftyp", |c| Ok(Mp4Record::FileType(FileType::read(c)?))),
        leaf(b"styp", |c| Ok(Mp4Record::FileType(FileType::read(c)?))),
        leaf(b"mvhd", |c| Ok(Mp4Record::MovieHeader(MovieHeader::read(c)?))),
        leaf(b"tkhd", |c| Ok(Mp4Record::TrackHeader(TrackHeader::read(c)?))),
        leaf(b"mdhd", |c| Ok(Mp4Record::MediaHeader(MediaHeader::read(c)?))),
        leaf(b"hdlr", |c| Ok(Mp4Record::Handler(Handler::read(c)?))),
        leaf(b"vmhd", |c| Ok(Mp4Record::VideoMediaHeader(VideoMediaHeader::read(c)?))),
        leaf(b"smhd", |c| Ok(Mp4Record::SoundMediaHeader(SoundMediaHeader::read(c)?))),
        leaf(b"elst", |c| Ok(Mp4Record::EditList(EditList::read(c)?))),
        leaf(b"stts", |c| Ok(Mp4Record::TimeToSample(TimeToSample::read(c)?))),
        leaf(b"ctts", |c| Ok(Mp4Record::CompositionOffsets(CompositionOffsets::read(c)?))),
        leaf(b"stsc", |c| Ok(Mp4Record::SampleToChunk(SampleToChunk::read(c)?))),
        leaf(b"stsz", |c| Ok(Mp4Record::SampleSizes(SampleSizes::read(c)?))),
        leaf(b"stss", |c| Ok(Mp4Record::SyncSamples(U32Table::read(c)?))),
        leaf(b"stco", |c| Ok(Mp4Record::ChunkOffsets(U32Table::read(c)?))),
        leaf(b"co64", |c| Ok(Mp4Record::ChunkOffsets64(U64Table::read(c)?))),
        leaf(b"mehd", |c| Ok(Mp4Record::MovieExtendsHeader(MovieExtendsHeader::read(c)?))),
        leaf(b"trex", |c| Ok(Mp4Record::TrackExtends(TrackExtends::read(c)?))),
        leaf(b"mfhd", |c| Ok(Mp4Record::MovieFragmentHeader(MovieFragmentHeader::read(c)?))),
        leaf(b"tfhd", |c| Ok(Mp4Record::TrackFragmentHeader(TrackFragmentHeader::read(c)?))),
        leaf(b"tfdt", |c| {
            Ok(Mp4Record::TrackFragmentDecodeTime(TrackFragmentDecodeTime::read(c)?))
        }),
        leaf(b"trun", |c| Ok(Mp4Record::TrackRun(TrackRun::read(c)?))),
        leaf(b"url ", |c| Ok(Mp4Record::DataEntryUrl(DataEntryUrl::read(c)?))),
        leaf(b"data", |c| Ok(Mp4Record::ItemData(ItemData::read(c)?))),
        leaf(b"mean", |c| Ok(Mp4Record::ItemString(ItemString::read(c)?))),
        leaf(b"name", |c| Ok(Mp4Record::ItemString(ItemString::read(c)?))),
    ];
    for (key, name, dec) in leaves {
        reg = reg.with_decoder(key, &name, Box::new(dec));
    }
    reg
}
