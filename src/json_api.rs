use crate::{
    format::{Format, NodeHeader, Record},
    node::{NodeId, Tree},
    util::hex_dump,
};
use serde::Serialize;

/// A JSON-serializable summary of one node and its subtree.
///
/// This is designed for dump tools and UIs that want the tree without
/// linking against the typed record enums.
#[derive(Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub full_name: Option<String>,
    pub offset: Option<u64>,
    pub size: u64,
    pub header_size: u64,
    pub kind: &'static str,
    pub record: &'static str,
    pub fields: Option<serde_json::Value>,
    pub children: Option<Vec<NodeSummary>>,
}

/// Builds summaries for the top-level nodes. With `decode` unset only the
/// geometry is reported.
pub fn summarize<F: Format>(tree: &Tree<F>, decode: bool) -> Vec<NodeSummary> {
    tree.top()
        .ids()
        .map(|id| summarize_node(tree, id, decode))
        .collect()
}

fn summarize_node<F: Format>(tree: &Tree<F>, id: NodeId, decode: bool) -> NodeSummary {
    let node = tree.node(id);
    let kind = if F::is_opaque(node.record()) {
        "opaque"
    } else if node.is_container() {
        "container"
    } else {
        "leaf"
    };
    let fields = if decode {
        serde_json::to_value(node.record()).ok()
    } else {
        None
    };
    let children = node.children().map(|kids| {
        kids.ids()
            .map(|c| summarize_node(tree, c, decode))
            .collect()
    });
    NodeSummary {
        id: node.id().to_string(),
        full_name: F::describe(node.id()).map(str::to_string),
        offset: node.offset(),
        size: node.size(),
        header_size: node.header().header_len(),
        kind,
        record: node.record().kind(),
        fields,
        children,
    }
}

pub fn to_json<F: Format>(tree: &Tree<F>, decode: bool) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&summarize(tree, decode))?)
}

#[derive(Serialize)]
pub struct HexDump {
    pub offset: u64,
    pub length: u64,
    pub hex: String,
}

/// Hex-dump a range of the tree's source bytes.
///
/// `max_len` controls the maximum number of bytes to read. This function
/// never reads past the end of the source; the returned length may be
/// smaller than `max_len`.
pub fn hex_range<F: Format>(tree: &mut Tree<F>, offset: u64, max_len: u64) -> anyhow::Result<HexDump> {
    let Some(src) = tree.source_mut() else {
        anyhow::bail!("tree has no byte source");
    };
    let available = src.len().saturating_sub(offset);
    let to_read = available.min(max_len);
    if to_read == 0 {
        return Ok(HexDump {
            offset,
            length: 0,
            hex: String::new(),
        });
    }
    let data = src.read_at(offset, to_read)?;
    Ok(HexDump {
        offset,
        length: to_read,
        hex: hex_dump(&data, offset),
    })
}
