//! iTunes-style metadata items (`moov/udta/meta/ilst`).

use super::Mp4;
use super::boxes::{BoxHeader, BoxKey, DataValue, FullHeader, Handler, ItemData, Meta, Mp4Record};
use crate::error::{Error, Result};
use crate::ids::FourCC;
use crate::node::{NodeId, Tree};

fn child(tree: &Tree<Mp4>, parent: NodeId, cc: &[u8; 4]) -> Option<NodeId> {
    tree.node(parent).children()?.first(&BoxKey::cc(cc))
}

fn item_key(key: &str) -> Result<BoxKey> {
    FourCC::from_str(key)
        .map(BoxKey::FourCC)
        .ok_or_else(|| Error::InvalidText(format!("{key:?} is not a four-character item key")))
}

/// The `ilst` box, if the file has one.
pub fn item_list(tree: &Tree<Mp4>) -> Option<NodeId> {
    let moov = tree.top().first(&BoxKey::cc(b"moov"))?;
    let udta = child(tree, moov, b"udta")?;
    let meta = child(tree, udta, b"meta")?;
    child(tree, meta, b"ilst")
}

/// The `ilst` box, creating `udta`, `meta` (with its `mdir` handler) and
/// `ilst` as needed. Fails with `NotFound` when there is no `moov`.
pub fn item_list_mut(tree: &mut Tree<Mp4>) -> Result<NodeId> {
    let moov = tree
        .top()
        .first(&BoxKey::cc(b"moov"))
        .ok_or_else(|| Error::NotFound("moov".into()))?;
    let udta = match child(tree, moov, b"udta") {
        Some(id) => id,
        None => tree.add_container(Some(moov), BoxHeader::new(BoxKey::cc(b"udta")), Mp4Record::Container)?,
    };
    let meta = match child(tree, udta, b"meta") {
        Some(id) => id,
        None => {
            let meta = tree.add_container(
                Some(udta),
                BoxHeader::new(BoxKey::cc(b"meta")),
                Mp4Record::Meta(Meta {
                    full: Some(FullHeader::default()),
                }),
            )?;
            tree.add_leaf(
                Some(meta),
                BoxHeader::new(BoxKey::cc(b"hdlr")),
                Mp4Record::Handler(Handler::metadata()),
            )?;
            meta
        }
    };
    match child(tree, meta, b"ilst") {
        Some(id) => Ok(id),
        None => tree.add_container(Some(meta), BoxHeader::new(BoxKey::cc(b"ilst")), Mp4Record::Container),
    }
}

/// Sets a UTF-8 text item such as `©nam` or `©ART`, replacing the value
/// of an existing item. Returns the item box.
pub fn set_text_item(tree: &mut Tree<Mp4>, key: &str, value: &str) -> Result<NodeId> {
    let key = item_key(key)?;
    let ilst = item_list_mut(tree)?;
    let existing = tree.node(ilst).children().and_then(|c| c.first(&key));
    let item = match existing {
        Some(id) => id,
        None => tree.add_container(Some(ilst), BoxHeader::new(key), Mp4Record::Container)?,
    };
    let record = Mp4Record::ItemData(ItemData::text(value));
    match child(tree, item, b"data") {
        Some(data) => tree.set_record(data, record),
        None => {
            tree.add_leaf(Some(item), BoxHeader::new(BoxKey::cc(b"data")), record)?;
        }
    }
    Ok(item)
}

/// The text of an item's first `data` box.
pub fn text_item(tree: &Tree<Mp4>, key: &str) -> Option<String> {
    let key = item_key(key).ok()?;
    let item = tree.node(item_list(tree)?).children()?.first(&key)?;
    let data = child(tree, item, b"data")?;
    match tree.node(data).record() {
        Mp4Record::ItemData(ItemData {
            value: DataValue::Text(s),
            ..
        }) => Some(s.clone()),
        _ => None,
    }
}
