mod common;

use common::*;
use mediabox::mp4::{BoxKey, Mp4Record};
use mediabox::{Mp4, Tree};

fn decode_one(bytes: Vec<u8>) -> Mp4Record {
    let tree = Tree::<Mp4>::from_bytes(bytes).expect("parse");
    tree.roots()[0].record().clone()
}

#[test]
fn stsc_entries() {
    let stsc = full_box(b"stsc", 0, 0, &be32(&[2, 1, 5, 1, 10, 3, 1]));
    match decode_one(stsc) {
        Mp4Record::SampleToChunk(t) => {
            assert_eq!(t.entries.len(), 2);
            assert_eq!(t.entries[0].first_chunk, 1);
            assert_eq!(t.entries[0].samples_per_chunk, 5);
            assert_eq!(t.entries[1].first_chunk, 10);
            assert_eq!(t.entries[1].sample_description_index, 1);
        }
        other => panic!("unexpected record {other:?}"),
    }
}

#[test]
fn ctts_offsets_are_signed_in_version_1() {
    let payload = be32(&[3, 5, 256, 2, (-256i32) as u32, 1, 512]);
    match decode_one(full_box(b"ctts", 1, 0, &payload)) {
        Mp4Record::CompositionOffsets(t) => {
            assert_eq!(t.full.version, 1);
            let offsets: Vec<i64> = t.entries.iter().map(|e| e.sample_offset).collect();
            assert_eq!(offsets, vec![256, -256, 512]);
        }
        other => panic!("unexpected record {other:?}"),
    }
    match decode_one(full_box(b"ctts", 0, 0, &payload)) {
        Mp4Record::CompositionOffsets(t) => assert_eq!(t.entries[1].sample_offset, 0xFFFF_FF00),
        other => panic!("unexpected record {other:?}"),
    }
}

#[test]
fn stss_sample_numbers() {
    match decode_one(full_box(b"stss", 0, 0, &be32(&[4, 1, 15, 30, 45]))) {
        Mp4Record::SyncSamples(t) => assert_eq!(t.entries, vec![1, 15, 30, 45]),
        other => panic!("unexpected record {other:?}"),
    }
}

#[test]
fn co64_offsets() {
    let mut payload = be32(&[2]);
    payload.extend_from_slice(&10_000u64.to_be_bytes());
    payload.extend_from_slice(&6_000_000_000u64.to_be_bytes());
    match decode_one(full_box(b"co64", 0, 0, &payload)) {
        Mp4Record::ChunkOffsets64(t) => assert_eq!(t.entries, vec![10_000, 6_000_000_000]),
        other => panic!("unexpected record {other:?}"),
    }
}

fn avc1_entry() -> Vec<u8> {
    let mut p = vec![0; 6];
    p.extend_from_slice(&1u16.to_be_bytes());
    p.extend_from_slice(&[0; 16]);
    p.extend_from_slice(&1920u16.to_be_bytes());
    p.extend_from_slice(&1080u16.to_be_bytes());
    p.extend_from_slice(&be32(&[0x0048_0000, 0x0048_0000, 0]));
    p.extend_from_slice(&1u16.to_be_bytes());
    let mut name = [0u8; 32];
    name[0] = 4;
    name[1..5].copy_from_slice(b"x264");
    p.extend_from_slice(&name);
    p.extend_from_slice(&24u16.to_be_bytes());
    p.extend_from_slice(&[0xFF, 0xFF]);
    mp4_box(b"avc1", &p)
}

fn mp4a_entry() -> Vec<u8> {
    let mut p = vec![0; 6];
    p.extend_from_slice(&1u16.to_be_bytes());
    p.extend_from_slice(&[0; 8]);
    p.extend_from_slice(&2u16.to_be_bytes());
    p.extend_from_slice(&16u16.to_be_bytes());
    p.extend_from_slice(&[0; 4]);
    p.extend_from_slice(&(44_100u32 << 16).to_be_bytes());
    mp4_box(b"mp4a", &p)
}

#[test]
fn sample_descriptions_hold_typed_entries() {
    let mut payload = be32(&[2]);
    payload.extend_from_slice(&avc1_entry());
    payload.extend_from_slice(&mp4a_entry());
    let bytes = full_box(b"stsd", 0, 0, &payload);
    let mut tree = Tree::<Mp4>::from_bytes(bytes.clone()).expect("parse");

    let stsd = tree.roots()[0];
    match stsd.record() {
        Mp4Record::Entries(e) => assert_eq!(e.entry_count, 2),
        other => panic!("unexpected record {other:?}"),
    }
    let entries = stsd.children();
    assert_eq!(entries.len(), 2);
    match entries[0].record() {
        Mp4Record::VisualSampleEntry(v) => {
            assert_eq!((v.width, v.height), (1920, 1080));
            assert_eq!(v.compressor_name, "x264");
            assert_eq!(v.depth, 24);
        }
        other => panic!("unexpected record {other:?}"),
    }
    match entries[1].record() {
        Mp4Record::AudioSampleEntry(a) => {
            assert_eq!(a.channel_count, 2);
            assert_eq!(a.sample_rate >> 16, 44_100);
            assert_eq!(a.qt_extension, None);
        }
        other => panic!("unexpected record {other:?}"),
    }
    assert_eq!(tree.to_bytes().unwrap(), bytes);
}

#[test]
fn sample_entry_ids_outside_stsd_stay_opaque() {
    let tree = Tree::<Mp4>::from_bytes(avc1_entry()).expect("parse");
    let node = tree.first(&BoxKey::cc(b"avc1")).unwrap();
    assert!(matches!(node.record(), Mp4Record::Opaque(_)));
}

#[test]
fn leftover_bytes_in_stsd_keep_the_entry_count() {
    let mut payload = be32(&[1]);
    payload.extend_from_slice(&avc1_entry());
    payload.extend_from_slice(&[5, 5, 5]);
    let mut tree = Tree::<Mp4>::from_bytes(full_box(b"stsd", 0, 0, &payload)).expect("parse");
    let entry = tree.roots()[0].children()[0].id();
    match tree.record_mut(entry) {
        Mp4Record::VisualSampleEntry(v) => v.width = 1280,
        other => panic!("unexpected record {other:?}"),
    }

    let reparsed = Tree::<Mp4>::from_bytes(tree.to_bytes().unwrap()).expect("reparse");
    let stsd = reparsed.roots()[0];
    match stsd.record() {
        Mp4Record::Entries(e) => assert_eq!(e.entry_count, 1),
        other => panic!("unexpected record {other:?}"),
    }
    assert_eq!(stsd.children().len(), 2);
    match stsd.children()[0].record() {
        Mp4Record::VisualSampleEntry(v) => assert_eq!(v.width, 1280),
        other => panic!("unexpected record {other:?}"),
    }
}
