mod common;

use common::*;
use mediabox::mp4::boxes::Free;
use mediabox::mp4::{BoxKey, Mp4Record, set_text_item, text_item};
use mediabox::writer::WriteOptions;
use mediabox::{Error, Mp4, Tree};

fn key(cc: &[u8; 4]) -> BoxKey {
    BoxKey::cc(cc)
}

/// A 100-byte `free` box followed by a 9,900-byte `mdat`.
fn padded_file() -> Vec<u8> {
    let free = mp4_box(b"free", &[0; 92]);
    let mdat = mp4_box(b"mdat", &media_payload(9892));
    let bytes = [free, mdat].concat();
    assert_eq!(bytes.len(), 10_000);
    bytes
}

#[test]
fn growing_a_leading_box_moves_the_rest() {
    let original = padded_file();
    let file = write_temp(&original);
    let mut tree = Tree::<Mp4>::open(file.path()).expect("open");
    let free = tree.top().first(&key(b"free")).unwrap();
    tree.set_record(free, Mp4Record::Free(Free { len: 242 }));
    let report = tree
        .write_back_with(free, &WriteOptions { block_size: 333 })
        .expect("write back");
    assert_eq!((report.old_len, report.new_len, report.delta), (100, 250, 150));

    let written = std::fs::read(file.path()).unwrap();
    assert_eq!(written.len(), original.len() + 150);
    assert_eq!(&written[250..], &original[100..]);
    assert_eq!(&written[350..], &original[200..]);
    assert!(written[8..250].iter().all(|&b| b == 0));

    // The tree tracks the new layout.
    let mdat = tree.first(&key(b"mdat")).unwrap();
    assert_eq!(mdat.offset(), Some(250));
    assert!(!tree.node(free).is_dirty());
}

#[test]
fn shrinking_a_leading_box_truncates_the_file() {
    let original = padded_file();
    let file = write_temp(&original);
    let mut tree = Tree::<Mp4>::open(file.path()).expect("open");
    let free = tree.top().first(&key(b"free")).unwrap();
    tree.set_record(free, Mp4Record::Free(Free { len: 2 }));
    tree.write_back(free).expect("write back");

    let written = std::fs::read(file.path()).unwrap();
    assert_eq!(written.len(), original.len() - 90);
    assert_eq!(&written[10..], &original[100..]);

    let reopened = Tree::<Mp4>::open(file.path()).expect("reopen");
    assert_eq!(reopened.first(&key(b"mdat")).unwrap().offset(), Some(10));
}

#[test]
fn chunk_offsets_follow_upstream_growth() {
    let moov_len = movie(0).len();
    // Put the first chunk at exactly 500.
    let free_len = 500 - 8 - moov_len;
    let bytes = [
        mp4_box(b"free", &vec![0; free_len - 8]),
        movie(500),
        mp4_box(b"mdat", &media_payload(64)),
    ]
    .concat();
    let file = write_temp(&bytes);
    let mut tree = Tree::<Mp4>::open(file.path()).expect("open");
    let free = tree.top().first(&key(b"free")).unwrap();
    tree.set_record(free, Mp4Record::Free(Free { len: (free_len - 8 + 150) as u64 }));
    let report = tree.write_back(free).expect("write back");
    assert_eq!(report.delta, 150);
    assert_eq!(report.repaired, 1);

    let reopened = Tree::<Mp4>::open(file.path()).expect("reopen");
    let stco = reopened.find_path("moov.trak.mdia.minf.stbl.stco").unwrap();
    match stco.record() {
        Mp4Record::ChunkOffsets(t) => assert_eq!(t.entries, vec![650]),
        other => panic!("unexpected record {other:?}"),
    }
    let written = std::fs::read(file.path()).unwrap();
    assert_eq!(&written[650..650 + 64], &media_payload(64)[..]);
}

#[test]
fn metadata_item_round_trips_through_save() {
    let original = sample_mp4();
    let file = write_temp(&original);
    let mut tree = Tree::<Mp4>::open(file.path()).expect("open");
    set_text_item(&mut tree, "\u{a9}nam", "A title").expect("set item");
    let reports = tree.save().expect("save");
    assert_eq!(reports.len(), 1);
    assert!(reports[0].delta > 0);

    let reopened = Tree::<Mp4>::open(file.path()).expect("reopen");
    assert_eq!(text_item(&reopened, "\u{a9}nam").as_deref(), Some("A title"));
    let mdat = reopened.first(&key(b"mdat")).unwrap();
    let stco = reopened.find_path("moov.trak.mdia.minf.stbl.stco").unwrap();
    match stco.record() {
        Mp4Record::ChunkOffsets(t) => assert_eq!(t.entries, vec![(mdat.offset().unwrap() + 8) as u32]),
        other => panic!("unexpected record {other:?}"),
    }
    let written = std::fs::read(file.path()).unwrap();
    let payload_at = mdat.offset().unwrap() as usize + 8;
    assert_eq!(&written[payload_at..], &media_payload(40)[..]);
}

#[test]
fn unchanged_node_is_a_no_op() {
    let file = write_temp(&sample_mp4());
    let mut tree = Tree::<Mp4>::open(file.path()).expect("open");
    let moov = tree.top().first(&key(b"moov")).unwrap();
    let report = tree.write_back(moov).expect("write back");
    assert_eq!(report.delta, 0);
    assert_eq!(report.old_len, report.new_len);
    assert_eq!(std::fs::read(file.path()).unwrap(), sample_mp4());
}

#[test]
fn in_memory_tree_is_not_writable() {
    let mut tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    let moov = tree.top().first(&key(b"moov")).unwrap();
    assert!(matches!(tree.write_back(moov), Err(Error::NotWritable(_))));
}

#[test]
fn pending_changes_elsewhere_block_a_partial_write() {
    let file = write_temp(&padded_file());
    let mut tree = Tree::<Mp4>::open(file.path()).expect("open");
    let free = tree.top().first(&key(b"free")).unwrap();
    let mdat = tree.top().first(&key(b"mdat")).unwrap();
    tree.set_record(free, Mp4Record::Free(Free { len: 10 }));
    assert!(matches!(tree.write_back(mdat), Err(Error::InvalidLayout(_))));
    assert_eq!(std::fs::read(file.path()).unwrap(), padded_file());
}

fn chunk_offsets(tree: &Tree<Mp4>) -> Vec<u32> {
    match tree.find_path("moov.trak.mdia.minf.stbl.stco").unwrap().record() {
        Mp4Record::ChunkOffsets(t) => t.entries.clone(),
        other => panic!("unexpected record {other:?}"),
    }
}

#[test]
fn failed_open_leaves_tree_and_file_untouched() {
    let moov_len = movie(0).len();
    let free_len = 500 - 8 - moov_len;
    let bytes = [
        mp4_box(b"free", &vec![0; free_len - 8]),
        movie(500),
        mp4_box(b"mdat", &media_payload(64)),
    ]
    .concat();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movie.mp4");
    let moved = dir.path().join("moved.mp4");
    std::fs::write(&path, &bytes).unwrap();

    let mut tree = Tree::<Mp4>::open(&path).expect("open");
    let free = tree.top().first(&key(b"free")).unwrap();
    tree.set_record(free, Mp4Record::Free(Free { len: (free_len - 8 + 150) as u64 }));

    std::fs::rename(&path, &moved).unwrap();
    assert!(matches!(tree.write_back(free), Err(Error::NotWritable(_))));
    std::fs::rename(&moved, &path).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), bytes);
    assert_eq!(chunk_offsets(&tree), vec![500]);
    let moov = tree.top().first(&key(b"moov")).unwrap();
    assert!(!tree.node(moov).is_dirty());

    let report = tree.write_back(free).expect("retry");
    assert_eq!(report.delta, 150);
    assert_eq!(chunk_offsets(&tree), vec![650]);
    let reopened = Tree::<Mp4>::open(&path).expect("reopen");
    assert_eq!(chunk_offsets(&reopened), vec![650]);
}

#[test]
fn unrepairable_offset_rolls_back() {
    // A chunk offset near u32::MAX cannot move 150 bytes further.
    let moov_len = movie(0).len();
    let free_len = 500 - 8 - moov_len;
    let bytes = [
        mp4_box(b"free", &vec![0; free_len - 8]),
        movie(u32::MAX - 10),
        mp4_box(b"mdat", &media_payload(64)),
    ]
    .concat();
    let file = write_temp(&bytes);
    let mut tree = Tree::<Mp4>::open(file.path()).expect("open");
    let free = tree.top().first(&key(b"free")).unwrap();
    tree.set_record(free, Mp4Record::Free(Free { len: (free_len - 8 + 150) as u64 }));

    assert!(matches!(tree.write_back(free), Err(Error::InvalidLayout(_))));
    assert_eq!(std::fs::read(file.path()).unwrap(), bytes);
    assert_eq!(chunk_offsets(&tree), vec![u32::MAX - 10]);
    let moov = tree.top().first(&key(b"moov")).unwrap();
    assert!(!tree.node(moov).is_dirty());
}
