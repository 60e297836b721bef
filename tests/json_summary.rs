mod common;

use common::*;
use mediabox::json_api::{hex_range, summarize, to_json};
use mediabox::{Id3, Mp4, Tree};
use serde_json::Value;

#[test]
fn summary_serializes_to_json() {
    let tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    let json = to_json(&tree, true).expect("serialize to JSON failed");
    let v: Value = serde_json::from_str(&json).expect("parse JSON failed");
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 3);

    let first = &arr[0];
    assert_eq!(first["id"], "ftyp");
    assert_eq!(first["full_name"], "File Type Box");
    assert_eq!(first["offset"], 0);
    assert_eq!(first["size"], 24);
    assert_eq!(first["header_size"], 8);
    assert_eq!(first["kind"], "leaf");
    assert_eq!(first["record"], "file_type");
    assert_eq!(first["fields"]["major_brand"], "isom");

    let moov = &arr[1];
    assert_eq!(moov["kind"], "container");
    assert_eq!(moov["children"][0]["id"], "trak");
    assert_eq!(arr[2]["kind"], "opaque");
}

#[test]
fn geometry_only_summary_skips_fields() {
    let tree = Tree::<Mp4>::from_bytes(sample_mp4()).expect("parse");
    let summary = summarize(&tree, false);
    assert!(summary.iter().all(|s| s.fields.is_none()));
    assert_eq!(summary[2].id, "mdat");
    assert!(summary[2].children.is_none());
}

#[test]
fn id3_frames_summarize_with_descriptions() {
    let frames = id3_frame_v3(b"TIT2", 0, &latin1_text("Song"));
    let tree = Tree::<Id3>::from_bytes(id3_tag(3, 0, &frames, 5)).expect("parse");
    let summary = summarize(&tree, true);
    let tag = &summary[0];
    assert_eq!(tag.full_name.as_deref(), Some("ID3v2 tag"));
    let kids = tag.children.as_ref().unwrap();
    assert_eq!(kids[0].id, "TIT2");
    assert_eq!(kids[0].full_name.as_deref(), Some("Title"));
    assert_eq!(kids[0].fields.as_ref().unwrap()["values"][0], "Song");
    assert_eq!(kids[1].id, "padding");
    assert_eq!(kids[1].header_size, 0);
}

#[test]
fn hex_range_reads_within_bounds() {
    let data = mp4_box(b"free", &(8u8..64).collect::<Vec<_>>());
    let mut tree = Tree::<Mp4>::from_bytes(data).expect("parse");
    let dump = hex_range(&mut tree, 16, 16).expect("hex_range failed");
    assert_eq!(dump.offset, 16);
    assert_eq!(dump.length, 16);
    assert!(dump.hex.starts_with("00000010  10 11 12"));
}

#[test]
fn hex_range_clamps_to_eof() {
    let data = mp4_box(b"free", &(8u8..32).collect::<Vec<_>>());
    let file = write_temp(&data);
    let mut tree = Tree::<Mp4>::open(file.path()).expect("open");
    let dump = hex_range(&mut tree, 24, 32).expect("hex_range failed");
    assert_eq!(dump.offset, 24);
    assert_eq!(dump.length, 8);

    let past = hex_range(&mut tree, 100, 8).expect("hex_range failed");
    assert_eq!(past.length, 0);
    assert!(past.hex.is_empty());
}

#[test]
fn hex_range_needs_a_source() {
    let mut tree = Tree::<Mp4>::new();
    assert!(hex_range(&mut tree, 0, 8).is_err());
}
