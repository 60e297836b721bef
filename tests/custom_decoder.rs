mod common;

use common::*;
use mediabox::format::Scope;
use mediabox::mp4::boxes::Free;
use mediabox::mp4::{BoxKey, Mp4Record, default_registry};
use mediabox::parser::expect_header;
use mediabox::registry::FnDecoder;
use mediabox::{ByteCursor, Decoded, Mp4, ParseOptions, Parser, Registry, Result};

/// Reads the first payload byte as a length of zeros, keeping the rest as tail.
fn counted_zeros(cur: &mut ByteCursor, scope: Scope<()>) -> Result<Decoded<Mp4Record>> {
    expect_header::<Mp4>(cur, scope)?;
    let len = cur.read_u8()? as u64;
    Ok(Decoded::Leaf(Mp4Record::Free(Free { len })))
}

#[test]
fn registry_invokes_added_decoder() {
    let reg = Registry::<Mp4>::new().with_decoder(BoxKey::cc(b"cust"), "custom", Box::new(FnDecoder(counted_zeros)));
    assert!(reg.contains(None, &BoxKey::cc(b"cust")));
    assert_eq!(reg.lookup(None, &BoxKey::cc(b"cust")).map(|(n, _)| n), Some("custom"));
    assert!(reg.lookup(None, &BoxKey::cc(b"moov")).is_none());

    let bytes = mp4_box(b"cust", &[3, 1, 2, 3]);
    let tree = Parser::new(&reg, ParseOptions::default())
        .parse(ByteCursor::from_bytes(bytes))
        .expect("parse");
    let node = tree.first(&BoxKey::cc(b"cust")).unwrap();
    assert_eq!(node.record(), &Mp4Record::Free(Free { len: 3 }));
    assert_eq!(node.node().tail().map(|t| t.len()), Some(3));
}

#[test]
fn extended_default_registry_keeps_builtin_decoders() {
    let reg = default_registry().with_decoder(BoxKey::cc(b"cust"), "custom", Box::new(FnDecoder(counted_zeros)));
    let bytes = [ftyp(), mp4_box(b"cust", &[0])].concat();
    let mut tree = Parser::new(&reg, ParseOptions::default())
        .parse(ByteCursor::from_bytes(bytes.clone()))
        .expect("parse");
    assert!(matches!(tree.roots()[0].record(), Mp4Record::FileType(_)));
    assert!(matches!(tree.roots()[1].record(), Mp4Record::Free(Free { len: 0 })));
    assert_eq!(tree.to_bytes().unwrap(), bytes);
}

#[test]
fn depth_limit_keeps_deep_containers_raw() {
    let mut nested = mp4_box(b"moov", &[]);
    for _ in 0..4 {
        nested = mp4_box(b"trak", &nested);
    }
    let bytes = mp4_box(b"moov", &nested);
    let opts = ParseOptions {
        max_depth: 2,
        ..ParseOptions::default()
    };
    let tree = Parser::new(&default_registry(), opts)
        .parse(ByteCursor::from_bytes(bytes))
        .expect("parse");
    let top = tree.first(&BoxKey::cc(b"moov")).unwrap();
    let decoded = top.find_path("trak").unwrap();
    assert!(matches!(decoded.record(), Mp4Record::Container));
    let deepest = decoded.find_path("trak").unwrap();
    assert!(matches!(deepest.record(), Mp4Record::Opaque(_)));
    assert!(deepest.children().is_empty());
}
