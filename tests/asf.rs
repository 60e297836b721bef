mod common;

use common::*;
use mediabox::asf::objects::AsfRecord;
use mediabox::asf::{ContentField, content_field, extended_text, guids, set_content_field, set_extended_text};
use mediabox::{Asf, Format, NodeHeader, Tree};

fn file_properties(file_size: u64) -> Vec<u8> {
    let mut p = vec![0x42; 16];
    p.extend_from_slice(&file_size.to_le_bytes());
    for v in [0u64, 3, 1_000_000, 1_000_000, 3000] {
        p.extend_from_slice(&v.to_le_bytes());
    }
    for v in [2u32, 1024, 1024, 128_000] {
        p.extend_from_slice(&v.to_le_bytes());
    }
    asf_object(&guids::FILE_PROPERTIES, &p)
}

fn content_description(title: &str) -> Vec<u8> {
    let title = utf16z(title);
    let mut p = (title.len() as u16).to_le_bytes().to_vec();
    p.extend_from_slice(&[0; 8]);
    p.extend_from_slice(&title);
    asf_object(&guids::CONTENT_DESCRIPTION, &p)
}

fn header(children: &[Vec<u8>]) -> Vec<u8> {
    let mut p = (children.len() as u32).to_le_bytes().to_vec();
    p.extend_from_slice(&[1, 2]);
    for c in children {
        p.extend_from_slice(c);
    }
    asf_object(&guids::HEADER, &p)
}

/// Header with file properties and a title, then a data object. The file
/// size field matches the total length.
fn sample_asf(title: &str) -> Vec<u8> {
    let data = asf_object(&guids::DATA, &media_payload(200));
    let probe = header(&[file_properties(0), content_description(title)]);
    let total = (probe.len() + data.len()) as u64;
    [header(&[file_properties(total), content_description(title)]), data].concat()
}

fn recorded_file_size(tree: &Tree<Asf>) -> u64 {
    let fp = tree.query("header").unwrap().query("file_properties").unwrap().into_node().unwrap();
    match fp.record() {
        AsfRecord::FileProperties(p) => p.file_size,
        other => panic!("unexpected record {other:?}"),
    }
}

#[test]
fn header_objects_decode() {
    let bytes = sample_asf("Old");
    let tree = Tree::<Asf>::from_bytes(bytes.clone()).expect("parse");
    let roots: Vec<_> = tree.roots().iter().map(|n| *n.key()).collect();
    assert_eq!(roots, vec![guids::HEADER, guids::DATA]);

    let head = tree.query("header").expect("header");
    assert_eq!(head.query("object_count").unwrap().into_field(), Some(serde_json::json!(2)));
    assert_eq!(head.children().len(), 2);
    assert_eq!(content_field(&tree, ContentField::Title).as_deref(), Some("Old"));
    assert_eq!(content_field(&tree, ContentField::Author).as_deref(), Some(""));
    assert_eq!(recorded_file_size(&tree), bytes.len() as u64);

    let data = tree.query("data").unwrap();
    assert!(Asf::is_opaque(data.record()));
}

#[test]
fn longer_title_moves_data_and_updates_file_size() {
    let original = sample_asf("Old");
    let file = write_temp(&original);
    let mut tree = Tree::<Asf>::open(file.path()).expect("open");
    let old_header = tree.query("header").unwrap().size();
    set_content_field(&mut tree, ContentField::Title, "A much longer title").expect("set");
    let reports = tree.save().expect("save");
    assert_eq!(reports.len(), 1);
    let delta = reports[0].delta;
    assert_eq!(delta, 2 * ("A much longer title".len() as i64 - "Old".len() as i64));

    let written = std::fs::read(file.path()).unwrap();
    assert_eq!(written.len() as i64, original.len() as i64 + delta);
    let reopened = Tree::<Asf>::open(file.path()).expect("reopen");
    assert_eq!(recorded_file_size(&reopened), written.len() as u64);
    assert_eq!(
        content_field(&reopened, ContentField::Title).as_deref(),
        Some("A much longer title")
    );
    let new_header = reopened.query("header").unwrap().size();
    assert_eq!(&written[new_header as usize..], &original[old_header as usize..]);
}

#[test]
fn missing_content_description_is_added() {
    let data = asf_object(&guids::DATA, &media_payload(50));
    let bytes = [header(&[file_properties(0)]), data].concat();
    let mut tree = Tree::<Asf>::from_bytes(bytes).expect("parse");
    assert_eq!(content_field(&tree, ContentField::Author), None);
    set_content_field(&mut tree, ContentField::Author, "Someone").expect("set");

    let reparsed = Tree::<Asf>::from_bytes(tree.to_bytes().unwrap()).expect("reparse");
    let head = reparsed.query("header").unwrap();
    assert_eq!(head.query("object_count").unwrap().into_field(), Some(serde_json::json!(2)));
    assert_eq!(content_field(&reparsed, ContentField::Author).as_deref(), Some("Someone"));
    assert_eq!(content_field(&reparsed, ContentField::Title).as_deref(), Some(""));
}

#[test]
fn extended_attributes_round_trip() {
    let mut tree = Tree::<Asf>::from_bytes(sample_asf("Old")).expect("parse");
    set_extended_text(&mut tree, "WM/AlbumTitle", "Record").expect("set");
    set_extended_text(&mut tree, "WM/Genre", "Jazz").expect("set");
    set_extended_text(&mut tree, "WM/AlbumTitle", "Other record").expect("replace");

    let reparsed = Tree::<Asf>::from_bytes(tree.to_bytes().unwrap()).expect("reparse");
    assert_eq!(extended_text(&reparsed, "WM/AlbumTitle").as_deref(), Some("Other record"));
    assert_eq!(extended_text(&reparsed, "WM/Genre").as_deref(), Some("Jazz"));
    assert_eq!(extended_text(&reparsed, "WM/Year"), None);
}

#[test]
fn unknown_objects_and_leftovers_are_preserved() {
    let unknown = mediabox::Guid([0x5A; 16]);
    let bytes = [
        header(&[file_properties(0), asf_object(&unknown, b"vendor data")]),
        vec![9; 7],
    ]
    .concat();
    let mut tree = Tree::<Asf>::from_bytes(bytes.clone()).expect("parse");
    let head = tree.query("header").unwrap();
    let vendor = head.first(&unknown).expect("unknown child");
    assert!(Asf::is_opaque(vendor.record()));

    let tail = *tree.top().ids().collect::<Vec<_>>().last().unwrap();
    assert_eq!(tree.node(tail).header().header_len(), 0);
    assert_eq!(tree.node(tail).size(), 7);
    assert_eq!(tree.to_bytes().unwrap(), bytes);
}

#[test]
fn leftover_bytes_inside_header_are_not_counted() {
    let mut p = 2u32.to_le_bytes().to_vec();
    p.extend_from_slice(&[1, 2]);
    p.extend_from_slice(&file_properties(0));
    p.extend_from_slice(&content_description("Old"));
    p.extend_from_slice(&[7, 7, 7]);
    let mut tree = Tree::<Asf>::from_bytes(asf_object(&guids::HEADER, &p)).expect("parse");
    assert_eq!(tree.query("header").unwrap().children().len(), 3);
    set_content_field(&mut tree, ContentField::Title, "Newer").expect("set");

    let reparsed = Tree::<Asf>::from_bytes(tree.to_bytes().unwrap()).expect("reparse");
    let head = reparsed.query("header").unwrap();
    assert_eq!(head.query("object_count").unwrap().into_field(), Some(serde_json::json!(2)));
    assert_eq!(content_field(&reparsed, ContentField::Title).as_deref(), Some("Newer"));
    assert_eq!(head.children().len(), 3);
}
