mod common;

use common::*;
use mediabox::mp4::{BoxHeader, BoxKey, Mp4Record};
use mediabox::{Error, Format, Mp4, NodeHeader, Tree};

fn key(cc: &[u8; 4]) -> BoxKey {
    BoxKey::cc(cc)
}

#[test]
fn decodes_top_level_and_nested_boxes() {
    let tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    let ids: Vec<String> = tree.roots().iter().map(|n| n.key().to_string()).collect();
    assert_eq!(ids, vec!["ftyp", "moov", "mdat"]);

    let ftyp = tree.first(&key(b"ftyp")).expect("ftyp");
    assert_eq!(ftyp.offset(), Some(0));
    assert_eq!(ftyp.size(), 24);
    match ftyp.record() {
        Mp4Record::FileType(f) => {
            assert_eq!(&f.major_brand.0, b"isom");
            assert_eq!(f.minor_version, 512);
            assert_eq!(f.compatible_brands.len(), 2);
        }
        other => panic!("unexpected record {other:?}"),
    }

    let stco = tree.find_path("moov.trak.mdia.minf.stbl.stco").expect("stco");
    match stco.record() {
        Mp4Record::ChunkOffsets(t) => {
            let mdat = tree.first(&key(b"mdat")).expect("mdat");
            assert_eq!(t.entries, vec![(mdat.offset().unwrap() + 8) as u32]);
        }
        other => panic!("unexpected record {other:?}"),
    }
    assert!(stco.ancestor(&key(b"trak")).is_some());
}

#[test]
fn wildcard_matches_in_insertion_order() {
    let tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    let stbl = tree.find_path("moov.*.mdia.minf.stbl").expect("stbl");
    let hits: Vec<String> = stbl.get_matching("st??").iter().map(|n| n.key().to_string()).collect();
    assert_eq!(hits, vec!["stsd", "stsz", "stco"]);
    assert!(stbl.get_matching("xy*").is_empty());
    assert_eq!(stbl.get_matching("ST*").len(), 3);
}

#[test]
fn query_resolves_fields_then_shorthands() {
    let tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    let moov = tree.query("movie").expect("movie shorthand");
    assert_eq!(moov.key(), &key(b"moov"));

    let stsz = tree.find_path("moov.trak.mdia.minf.stbl.stsz").expect("stsz");
    let count = stsz.query("sample_count").expect("field").into_field();
    assert_eq!(count, Some(serde_json::json!(4)));
    assert_eq!(stsz.query("size").unwrap().into_field(), Some(serde_json::json!(36)));

    let stbl = stsz.parent().expect("parent");
    let stco = stbl.query("chunk_offsets").expect("child").into_node().expect("node");
    assert_eq!(stco.key(), &key(b"stco"));

    assert!(matches!(stbl.query("no_such_thing"), Err(Error::NotFound(_))));
    assert!(matches!(tree.query("fragment"), Err(Error::NotFound(_))));
}

#[test]
fn children_cover_declared_size() {
    let tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    for id in tree.reachable() {
        let node = tree.node(id);
        if let Some(kids) = node.children() {
            let own = match node.record() {
                Mp4Record::Entries(_) => 8,
                _ => 0,
            };
            let sum: u64 = kids.ids().map(|k| tree.node(k).size()).sum();
            assert_eq!(node.header().header_len() + own + sum, node.size(), "{}", node.id());
        }
    }
}

#[test]
fn unknown_and_uuid_boxes_round_trip() {
    let mut uuid_payload = [0x11u8; 16].to_vec();
    uuid_payload.extend_from_slice(b"opaque payload");
    let mut uuid_box = Vec::new();
    uuid_box.extend_from_slice(&(8 + uuid_payload.len() as u32).to_be_bytes());
    uuid_box.extend_from_slice(b"uuid");
    uuid_box.extend_from_slice(&uuid_payload);

    let bytes = [sample_mp4(), mp4_box(b"zzzz", b"future box"), uuid_box].concat();
    let mut tree = Tree::<Mp4>::from_bytes(bytes.clone()).expect("parse");
    let zzzz = tree.first(&key(b"zzzz")).expect("unknown box");
    assert!(Mp4::is_opaque(zzzz.record()));
    let uuid = tree.first(&BoxKey::Uuid([0x11; 16])).expect("uuid box");
    assert_eq!(uuid.key().to_string(), format!("uuid:{}", "11".repeat(16)));
    assert_eq!(uuid.header().header_len(), 24);
    assert_eq!(tree.to_bytes().expect("serialize"), bytes);
}

#[test]
fn corrupt_table_falls_back_to_opaque() {
    // An stco claiming 1000 entries with room for one.
    let bad = full_box(b"stco", 0, 0, &be32(&[1000, 42]));
    let stbl = mp4_box(b"stbl", &[full_box(b"stsz", 0, 0, &be32(&[512, 3])), bad].concat());
    let bytes = [ftyp(), mp4_box(b"moov", &stbl)].concat();
    let mut tree = Tree::<Mp4>::from_bytes(bytes.clone()).expect("container still decodes");
    let stco = tree.find_path("moov.stbl.stco").expect("stco node kept");
    assert!(Mp4::is_opaque(stco.record()));
    let stsz = tree.find_path("moov.stbl.stsz").expect("sibling decoded");
    assert!(matches!(stsz.record(), Mp4Record::SampleSizes(s) if s.sample_size == 512 && s.sample_count == 3));
    assert_eq!(tree.to_bytes().unwrap(), bytes);
}

#[test]
fn truncated_box_is_fatal() {
    let mut bytes = ftyp();
    bytes.extend_from_slice(&100u32.to_be_bytes());
    bytes.extend_from_slice(b"moov");
    bytes.extend_from_slice(&[0; 10]);
    match Tree::<Mp4>::from_bytes(bytes) {
        Err(Error::TruncatedInput { needed, available, .. }) => {
            assert_eq!(needed, 100);
            assert_eq!(available, 18);
        }
        other => panic!("expected truncation, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn short_trailing_bytes_become_bare_node() {
    let bytes = [ftyp(), vec![1, 2, 3]].concat();
    let mut tree = Tree::<Mp4>::from_bytes(bytes.clone()).expect("parse");
    assert_eq!(tree.top().len(), 2);
    let tail = tree.top().ids().last().unwrap();
    assert_eq!(tree.node(tail).header().header_len(), 0);
    assert_eq!(tree.node(tail).size(), 3);
    assert_eq!(tree.to_bytes().unwrap(), bytes);
}

#[test]
fn size_recomputed_after_adding_a_child() {
    let mut tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    let moov = tree.top().first(&key(b"moov")).unwrap();
    let before = tree.node(moov).size();
    let stsd = tree.find_path("moov.trak.mdia.minf.stbl.stsd").unwrap().id();
    tree.add_container(Some(stsd), BoxHeader::new(key(b"mp4a")), Mp4Record::Container)
        .expect("add");
    tree.recompute_sizes().expect("recompute");
    assert_eq!(tree.node(moov).size(), before + 8);
    match tree.node(stsd).record() {
        Mp4Record::Entries(e) => assert_eq!(e.entry_count, 1),
        other => panic!("unexpected record {other:?}"),
    }

    let bytes = tree.to_bytes().expect("serialize");
    let reparsed = Tree::<Mp4>::from_bytes(bytes).expect("reparse");
    let stsd = reparsed.find_path("moov.trak.mdia.minf.stbl.stsd").unwrap();
    assert_eq!(stsd.children().len(), 1);
    assert_eq!(stsd.children()[0].key(), &key(b"mp4a"));
}

#[test]
fn adding_under_a_leaf_is_rejected() {
    let mut tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    let ftyp = tree.top().first(&key(b"ftyp")).unwrap();
    let err = tree.add_leaf(Some(ftyp), BoxHeader::new(key(b"free")), Mp4Record::Container);
    assert!(matches!(err, Err(Error::InvalidLayout(_))));
}

#[test]
fn stts_entries_decode() {
    let stts = full_box(b"stts", 0, 0, &be32(&[2, 100, 1024, 1, 512]));
    let tree = Tree::<Mp4>::from_bytes(stts).expect("parse");
    let node = tree.first(&key(b"stts")).unwrap();
    match node.record() {
        Mp4Record::TimeToSample(t) => {
            assert_eq!(t.entries.len(), 2);
            assert_eq!(t.entries[0].sample_count, 100);
            assert_eq!(t.entries[0].sample_delta, 1024);
            assert_eq!(t.entries[1].sample_delta, 512);
        }
        other => panic!("unexpected record {other:?}"),
    }
}
