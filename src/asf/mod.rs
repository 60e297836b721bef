//! ASF (Advanced Systems Format) objects.

pub mod content;
pub mod guids;
pub mod objects;

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::format::{Format, Scope, shift_offset};
use crate::ids::Guid;
use crate::node::{NodeId, Raw, Tree};
use crate::parser::expect_header;
use crate::registry::{Decoded, NodeDecoder, Registry};
use std::sync::OnceLock;

pub use content::{ContentField, content_field, extended_text, set_content_field, set_extended_text};
pub use objects::{AsfRecord, AsfValue, ObjectHeader};

use objects::*;

#[derive(Debug, Clone, Copy)]
pub struct Asf;

type Out = Result<Decoded<AsfRecord>>;

pub struct HeaderDecoder;

impl NodeDecoder<Asf> for HeaderDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Asf>(cur, scope)?;
        Ok(Decoded::Container(AsfRecord::Header(HeaderObject::read(cur)?)))
    }
}

pub struct HeaderExtensionDecoder;

impl NodeDecoder<Asf> for HeaderExtensionDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Asf>(cur, scope)?;
        Ok(Decoded::Container(AsfRecord::HeaderExtension(HeaderExtension::read(cur)?)))
    }
}

pub struct PaddingDecoder;

impl NodeDecoder<Asf> for PaddingDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Asf>(cur, scope)?;
        let len = cur.remaining();
        cur.seek_to(scope.limit)?;
        Ok(Decoded::Leaf(AsfRecord::Padding { len }))
    }
}

/// Leaf objects decoded by a single read function; bytes it leaves unread
/// become the node's tail.
pub struct ObjectDecoder(pub fn(&mut ByteCursor) -> Result<AsfRecord>);

impl NodeDecoder<Asf> for ObjectDecoder {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<()>) -> Out {
        expect_header::<Asf>(cur, scope)?;
        Ok(Decoded::Leaf((self.0)(cur)?))
    }
}

/// The registry `Tree::<Asf>::open` decodes with. The data object and the
/// index objects have no decoder and stay opaque.
pub fn default_registry() -> Registry<Asf> {
    let leaves: [(Guid, &str, fn(&mut ByteCursor) -> Result<AsfRecord>); 11] = [
        (guids::FILE_PROPERTIES, "file properties", |c| {
            Ok(AsfRecord::FileProperties(FileProperties::read(c)?))
        }),
        (guids::STREAM_PROPERTIES, "stream properties", |c| {
            Ok(AsfRecord::StreamProperties(StreamProperties::read(c)?))
        }),
        (guids::CONTENT_DESCRIPTION, "content description", |c| {
            Ok(AsfRecord::ContentDescription(ContentDescription::read(c)?))
        }),
        (guids::EXTENDED_CONTENT_DESCRIPTION, "extended content description", |c| {
            Ok(AsfRecord::ExtendedContentDescription(ExtendedContentDescription::read(c)?))
        }),
        (guids::CODEC_LIST, "codec list", |c| Ok(AsfRecord::CodecList(CodecList::read(c)?))),
        (guids::STREAM_BITRATE_PROPERTIES, "stream bitrate properties", |c| {
            Ok(AsfRecord::StreamBitrateProperties(StreamBitrateProperties::read(c)?))
        }),
        (guids::METADATA, "metadata", |c| Ok(AsfRecord::Metadata(MetadataList::read(c)?))),
        (guids::METADATA_LIBRARY, "metadata library", |c| {
            Ok(AsfRecord::MetadataLibrary(MetadataList::read(c)?))
        }),
        (guids::LANGUAGE_LIST, "language list", |c| {
            Ok(AsfRecord::LanguageList(LanguageList::read(c)?))
        }),
        (guids::STREAM_PRIORITIZATION, "stream prioritization", |c| {
            Ok(AsfRecord::StreamPrioritization(StreamPrioritization::read(c)?))
        }),
        (guids::EXTENDED_STREAM_PROPERTIES, "extended stream properties", |c| {
            Ok(AsfRecord::ExtendedStreamProperties(ExtendedStreamProperties::read(c)?))
        }),
    ];
    let mut reg = Registry::new()
        .with_decoder(guids::HEADER, "header", Box::new(HeaderDecoder))
        .with_decoder(guids::HEADER_EXTENSION, "header extension", Box::new(HeaderExtensionDecoder))
        .with_decoder(guids::PADDING, "padding", Box::new(PaddingDecoder));
    for (guid, name, read) in leaves {
        reg = reg.with_decoder(guid, name, Box::new(ObjectDecoder(read)));
    }
    reg
}

const SHORTHANDS: &[(&str, Guid)] = &[
    ("header", guids::HEADER),
    ("data", guids::DATA),
    ("simple_index", guids::SIMPLE_INDEX),
    ("file_properties", guids::FILE_PROPERTIES),
    ("stream_properties", guids::STREAM_PROPERTIES),
    ("header_extension", guids::HEADER_EXTENSION),
    ("codec_list", guids::CODEC_LIST),
    ("content_description", guids::CONTENT_DESCRIPTION),
    ("extended_content_description", guids::EXTENDED_CONTENT_DESCRIPTION),
    ("stream_bitrate_properties", guids::STREAM_BITRATE_PROPERTIES),
    ("padding", guids::PADDING),
    ("metadata", guids::METADATA),
    ("metadata_library", guids::METADATA_LIBRARY),
    ("language_list", guids::LANGUAGE_LIST),
    ("stream_prioritization", guids::STREAM_PRIORITIZATION),
    ("extended_stream_properties", guids::EXTENDED_STREAM_PROPERTIES),
];

impl Format for Asf {
    type Id = Guid;
    type Header = ObjectHeader;
    type Record = AsfRecord;
    type Context = ();

    const NAME: &'static str = "asf";

    fn read_header(cur: &mut ByteCursor, _ctx: (), limit: u64) -> Result<Option<ObjectHeader>> {
        ObjectHeader::read(cur, limit)
    }

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<Asf>> = OnceLock::new();
        REGISTRY.get_or_init(default_registry)
    }

    fn opaque(raw: Raw) -> AsfRecord {
        AsfRecord::Opaque(raw)
    }

    fn trailing(
        cur: &mut ByteCursor,
        _parent: Option<&Guid>,
        _ctx: (),
        end: u64,
        inline_limit: u64,
    ) -> Result<Option<(ObjectHeader, AsfRecord)>> {
        let start = cur.tell();
        if start >= end {
            return Ok(None);
        }
        let raw = Raw::capture(cur, start, end, inline_limit)?;
        Ok(Some((ObjectHeader::bare(end - start), AsfRecord::Opaque(raw))))
    }

    fn finalize(_header: &mut ObjectHeader, record: &mut AsfRecord, child_count: usize, children_len: u64) {
        match record {
            AsfRecord::Header(h) => h.object_count = child_count as u32,
            AsfRecord::HeaderExtension(x) => x.data_size = children_len as u32,
            _ => {}
        }
    }

    fn shorthand(name: &str) -> Option<Guid> {
        SHORTHANDS.iter().find(|(n, _)| *n == name).map(|(_, g)| *g)
    }

    fn describe(id: &Guid) -> Option<&'static str> {
        guids::name_of(id)
    }

    /// The file size recorded in the file properties object follows every
    /// change in length.
    fn repair_offsets(record: &mut AsfRecord, pivot: u64, delta: i64) -> Result<bool> {
        if let AsfRecord::FileProperties(fp) = record
            && fp.file_size >= pivot
        {
            fp.file_size = shift_offset(fp.file_size, delta)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Header children carry counts and sizes in their parents' records, so
    /// the whole top-level object is rewritten.
    fn write_root(tree: &Tree<Self>, id: NodeId) -> NodeId {
        tree.top_ancestor(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Guid;

    #[test]
    fn file_size_tracks_growth() {
        let mut rec = AsfRecord::FileProperties(FileProperties {
            file_id: Guid::default(),
            file_size: 1000,
            creation_date: 0,
            data_packets_count: 0,
            play_duration: 0,
            send_duration: 0,
            preroll: 0,
            flags: 0,
            min_data_packet_size: 0,
            max_data_packet_size: 0,
            max_bitrate: 0,
        });
        assert!(Asf::repair_offsets(&mut rec, 300, 40).unwrap());
        match rec {
            AsfRecord::FileProperties(fp) => assert_eq!(fp.file_size, 1040),
            _ => unreachable!(),
        }
    }
}
