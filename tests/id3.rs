mod common;

use common::*;
use mediabox::id3::{self, HeaderKind, Id3Record, Id3v1, growth_padding};
use mediabox::{FrameId, Format, Id3, Tree};

fn frame(id: &str) -> FrameId {
    FrameId::new(id)
}

/// A v2.3 tag of exactly 100 bytes followed by 500 bytes of audio.
fn tagged_file() -> Vec<u8> {
    let frames = [
        id3_frame_v3(b"TIT2", 0, &latin1_text("Song")),
        id3_frame_v3(b"COMM", 0, &comment(b"eng", "", "first")),
        id3_frame_v3(b"COMM", 0, &comment(b"eng", "x", "second")),
    ]
    .concat();
    let padding = 90 - frames.len();
    let tag = id3_tag(3, 0, &frames, padding);
    assert_eq!(tag.len(), 100);
    [tag, media_payload(500)].concat()
}

fn padding_len(tree: &Tree<Id3>) -> u64 {
    let tag = id3::tag(tree).expect("tag");
    let pad = tree.node(tag).children().unwrap().first(&FrameId::padding()).expect("padding");
    match tree.node(pad).record() {
        Id3Record::Padding { len } => *len,
        other => panic!("unexpected record {other:?}"),
    }
}

#[test]
fn frames_padding_and_audio() {
    let tree = Tree::<Id3>::from_bytes(tagged_file()).expect("parse");
    let roots: Vec<String> = tree.roots().iter().map(|n| n.key().to_string()).collect();
    assert_eq!(roots, vec!["ID3", "audio"]);

    let tag = tree.first(&FrameId::tag()).unwrap();
    let keys: Vec<String> = tag.children().iter().map(|n| n.key().to_string()).collect();
    assert_eq!(keys, vec!["TIT2", "COMM", "COMM", "padding"]);
    assert_eq!(tag.get_all(&frame("COMM")).len(), 2);

    assert_eq!(id3::text(&tree, "TIT2").as_deref(), Some("Song"));
    let comments = id3::comments(&tree);
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].text, "first");
    assert_eq!(comments[1].description, "x");
    assert_eq!(comments[1].language, "eng");

    let audio = tree.first(&frame("audio")).unwrap();
    assert_eq!(audio.offset(), Some(100));
    assert_eq!(audio.header().kind, HeaderKind::Data);
}

#[test]
fn shorthand_queries() {
    let tree = Tree::<Id3>::from_bytes(tagged_file()).expect("parse");
    let tag = tree.query("tag").expect("tag");
    let title = tag.query("title").unwrap().into_node().expect("TIT2");
    assert_eq!(title.key(), &frame("TIT2"));
    assert_eq!(title.query("values").unwrap().into_field(), Some(serde_json::json!(["Song"])));
    assert_eq!(tag.query("major").unwrap().into_field(), Some(serde_json::json!(3)));
}

#[test]
fn small_edit_is_absorbed_by_padding() {
    let original = tagged_file();
    let file = write_temp(&original);
    let mut tree = Tree::<Id3>::open(file.path()).expect("open");
    let before = padding_len(&tree);
    id3::set_text(&mut tree, "TIT2", "Song 2").expect("set");
    let reports = tree.save().expect("save");
    assert_eq!(reports[0].delta, 0);

    let written = std::fs::read(file.path()).unwrap();
    assert_eq!(written.len(), original.len());
    assert_eq!(&written[100..], &original[100..]);

    let reopened = Tree::<Id3>::open(file.path()).expect("reopen");
    assert_eq!(id3::text(&reopened, "TIT2").as_deref(), Some("Song 2"));
    assert_eq!(padding_len(&reopened), before - 2);
    assert_eq!(id3::comments(&reopened).len(), 2);
}

#[test]
fn outgrown_tag_gets_fresh_padding() {
    let original = tagged_file();
    let file = write_temp(&original);
    let mut tree = Tree::<Id3>::open(file.path()).expect("open");
    let long = "x".repeat(300);
    id3::set_text(&mut tree, "TALB", &long).expect("set");
    tree.save().expect("save");

    let reopened = Tree::<Id3>::open(file.path()).expect("reopen");
    let tag = reopened.first(&FrameId::tag()).unwrap();
    let frames_len: u64 = tag
        .children()
        .iter()
        .filter(|n| n.header().kind == HeaderKind::Frame)
        .map(|n| n.size())
        .sum();
    let used = 10 + frames_len;
    assert_eq!(padding_len(&reopened), growth_padding(used));
    assert_eq!(tag.size(), used + growth_padding(used));

    let written = std::fs::read(file.path()).unwrap();
    assert_eq!(&written[tag.size() as usize..], &original[100..]);
    assert_eq!(id3::text(&reopened, "TALB"), Some(long));
    assert_eq!(id3::text(&reopened, "TIT2").as_deref(), Some("Song"));
}

#[test]
fn tag_is_created_for_untagged_audio() {
    let audio = media_payload(300);
    let file = write_temp(&audio);
    let mut tree = Tree::<Id3>::open(file.path()).expect("open");
    assert!(id3::tag(&tree).is_none());
    id3::set_text(&mut tree, "TPE1", "Band").expect("set");
    tree.save().expect("save");

    let written = std::fs::read(file.path()).unwrap();
    assert_eq!(&written[..4], b"ID3\x04");
    let reopened = Tree::<Id3>::open(file.path()).expect("reopen");
    let tag = reopened.first(&FrameId::tag()).unwrap();
    assert_eq!(&written[tag.size() as usize..], &audio[..]);
    assert_eq!(id3::text(&reopened, "TPE1").as_deref(), Some("Band"));
}

#[test]
fn genre_references_resolve() {
    let frames = id3_frame_v3(b"TCON", 0, &latin1_text("(17)(255)"));
    let tree = Tree::<Id3>::from_bytes(id3_tag(3, 0, &frames, 0)).expect("parse");
    assert_eq!(id3::genres(&tree), vec!["Rock", "Unknown"]);
}

#[test]
fn v1_trailer_genre_fallback() {
    let trailer = Id3v1 {
        title: "Song".into(),
        genre: 200,
        ..Default::default()
    }
    .encode()
    .unwrap();
    let bytes = [media_payload(64), trailer].concat();
    let mut cur = mediabox::ByteCursor::from_bytes(bytes);
    let v1 = id3::read_v1(&mut cur).unwrap().expect("trailer");
    assert_eq!(v1.title, "Song");
    assert_eq!(v1.genre_name(), "Unknown");
}

#[test]
fn v1_trailer_written_in_place() {
    let file = write_temp(&media_payload(200));
    let tag = Id3v1 {
        artist: "Band".into(),
        track: Some(3),
        ..Default::default()
    };
    id3::write_v1(file.path(), &tag).unwrap();
    id3::write_v1(file.path(), &tag).unwrap();
    let written = std::fs::read(file.path()).unwrap();
    assert_eq!(written.len(), 328);
    let mut cur = mediabox::ByteCursor::from_bytes(written);
    assert_eq!(id3::read_v1(&mut cur).unwrap(), Some(tag));
}

#[test]
fn unsynchronised_v23_tag_is_decoded_detached() {
    // TIT2 holding the single Latin-1 character 0xFF, stored unsynchronised.
    let mut body = b"TIT2".to_vec();
    body.extend_from_slice(&[0, 0, 0, 2, 0, 0]);
    body.extend_from_slice(&[0x00, 0xFF, 0x00]);
    let bytes = [id3_tag(3, 0x80, &body, 0), media_payload(20)].concat();
    let mut tree = Tree::<Id3>::from_bytes(bytes).expect("parse");

    let tag = id3::tag(&tree).unwrap();
    assert!(tree.node(tag).is_dirty());
    let title = id3::frames(&tree, "TIT2")[0];
    assert_eq!(tree.node(title).offset(), None);
    assert_eq!(id3::text(&tree, "TIT2").as_deref(), Some("\u{ff}"));

    // Rewritten without the unsynchronisation flag.
    let out = tree.to_bytes().unwrap();
    assert_eq!(out[5], 0);
    let reparsed = Tree::<Id3>::from_bytes(out).unwrap();
    assert_eq!(id3::text(&reparsed, "TIT2").as_deref(), Some("\u{ff}"));
}

#[test]
fn v24_data_length_indicator_is_skipped() {
    let mut payload = synchsafe(5).to_vec();
    payload.extend_from_slice(&latin1_text("Name"));
    let frames = [
        id3_frame_v4(b"TIT2", 0x0001, &payload),
        id3_frame_v4(b"TCON", 0, b"\x03Rock\x00Jazz"),
    ]
    .concat();
    let tree = Tree::<Id3>::from_bytes(id3_tag(4, 0, &frames, 10)).expect("parse");
    assert_eq!(id3::text(&tree, "TIT2").as_deref(), Some("Name"));
    assert_eq!(id3::genres(&tree), vec!["Rock", "Jazz"]);
}

#[test]
fn unsupported_frames_stay_opaque_and_round_trip() {
    let frames = [
        id3_frame_v3(b"TIT2", 0x0080, b"\x00\x00\x00\x10compressed"),
        id3_frame_v3(b"XYZW", 0, b"future frame"),
        id3_frame_v3(b"TPE1", 0, &latin1_text("Band")),
    ]
    .concat();
    let bytes = [id3_tag(3, 0, &frames, 16), media_payload(32)].concat();
    let mut tree = Tree::<Id3>::from_bytes(bytes.clone()).expect("parse");
    let tit2 = id3::frames(&tree, "TIT2")[0];
    let xyzw = id3::frames(&tree, "XYZW")[0];
    assert!(Id3::is_opaque(tree.node(tit2).record()));
    assert!(Id3::is_opaque(tree.node(xyzw).record()));
    assert_eq!(id3::text(&tree, "TPE1").as_deref(), Some("Band"));
    assert_eq!(tree.to_bytes().unwrap(), bytes);
}

#[test]
fn unknown_major_version_keeps_the_tag_raw() {
    let bytes = [id3_tag(5, 0, b"whatever", 0), media_payload(8)].concat();
    let mut tree = Tree::<Id3>::from_bytes(bytes.clone()).expect("parse");
    let tag = tree.top().first(&FrameId::tag()).unwrap();
    assert!(Id3::is_opaque(tree.node(tag).record()));
    assert!(id3::tag(&tree).is_none());
    assert!(id3::set_text(&mut tree, "TIT2", "x").is_err());
    assert_eq!(tree.to_bytes().unwrap(), bytes);
}
