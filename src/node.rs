//! The generic node tree: an arena of nodes owned by a [`Tree`], with
//! parents referenced by index only.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::format::{Format, NodeHeader, shift_offset};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

/// Payload bytes preserved verbatim.
///
/// Small payloads are held in memory; large ones (media data) stay in the
/// source and are copied from there when serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Raw {
    Inline(Vec<u8>),
    Deferred { offset: u64, len: u64 },
}

impl Raw {
    pub fn capture(cur: &mut ByteCursor, start: u64, end: u64, inline_limit: u64) -> Result<Raw> {
        let len = end.saturating_sub(start);
        if len <= inline_limit {
            Ok(Raw::Inline(cur.read_at(start, len)?))
        } else {
            Ok(Raw::Deferred { offset: start, len })
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Raw::Inline(b) => b.len() as u64,
            Raw::Deferred { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bytes, when held in memory.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Raw::Inline(b) => Some(b),
            Raw::Deferred { .. } => None,
        }
    }

    pub(crate) fn load(&self, source: Option<&mut ByteCursor>) -> Result<Vec<u8>> {
        match self {
            Raw::Inline(b) => Ok(b.clone()),
            Raw::Deferred { offset, len } => source
                .ok_or_else(|| Error::layout("deferred payload without a byte source"))?
                .read_at(*offset, *len),
        }
    }

    pub(crate) fn shift(&mut self, pivot: u64, delta: i64) -> Result<()> {
        if let Raw::Deferred { offset, .. } = self
            && *offset >= pivot
        {
            *offset = shift_offset(*offset, delta)?;
        }
        Ok(())
    }

    pub(crate) fn place(&mut self, at: u64) {
        if let Raw::Deferred { offset, .. } = self {
            *offset = at;
        }
    }
}

impl Serialize for Raw {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("Raw", 2)?;
        st.serialize_field("len", &self.len())?;
        match self {
            Raw::Inline(b) if b.len() <= 64 => st.serialize_field("hex", &hex::encode(b))?,
            _ => st.skip_field("hex")?,
        }
        st.end()
    }
}

/// The ordered children of a container.
///
/// Physical order is kept as a flat list; per-identifier sequences are
/// derived from it, so identifiers may repeat and key iteration follows
/// first appearance.
#[derive(Debug, Clone)]
pub struct Children<K> {
    entries: Vec<(K, NodeId)>,
}

impl<K> Default for Children<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Clone + PartialEq> Children<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|(_, id)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, NodeId)> + '_ {
        self.entries.iter().map(|(k, id)| (k, *id))
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.entries.iter().position(|(_, n)| *n == id)
    }

    pub(crate) fn push(&mut self, key: K, id: NodeId) {
        self.entries.push((key, id));
    }

    pub(crate) fn insert(&mut self, index: usize, key: K, id: NodeId) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, (key, id));
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        match self.position(id) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn has(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Every child with exactly this identifier, in physical order.
    pub fn get_all(&self, key: &K) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn first(&self, key: &K) -> Option<NodeId> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, id)| *id)
    }

    /// Distinct identifiers in order of first appearance.
    pub fn keys(&self) -> Vec<&K> {
        let mut out: Vec<&K> = Vec::new();
        for (k, _) in &self.entries {
            if !out.contains(&k) {
                out.push(k);
            }
        }
        out
    }
}

/// One record in the tree.
#[derive(Debug)]
pub struct Node<F: Format> {
    pub(crate) header: F::Header,
    pub(crate) record: F::Record,
    pub(crate) children: Option<Children<F::Id>>,
    /// Bytes after the decoded fields of a leaf that its decoder did not consume.
    pub(crate) tail: Option<Raw>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) offset: Option<u64>,
    pub(crate) span: Option<u64>,
    pub(crate) disk_header_len: u64,
    pub(crate) dirty: bool,
}

impl<F: Format> Node<F> {
    pub(crate) fn new(
        header: F::Header,
        record: F::Record,
        children: Option<Children<F::Id>>,
    ) -> Self {
        Self {
            header,
            record,
            children,
            tail: None,
            parent: None,
            offset: None,
            span: None,
            disk_header_len: 0,
            dirty: true,
        }
    }

    /// A node decoded from `[offset, offset + size)` of the source.
    pub(crate) fn on_disk(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self.span = Some(self.header.size());
        self.disk_header_len = self.header.header_len();
        self.dirty = false;
        self
    }

    pub(crate) fn with_tail(mut self, tail: Option<Raw>) -> Self {
        self.tail = tail;
        self
    }

    pub fn id(&self) -> &F::Id {
        self.header.id()
    }

    pub fn header(&self) -> &F::Header {
        &self.header
    }

    pub fn record(&self) -> &F::Record {
        &self.record
    }

    pub fn children(&self) -> Option<&Children<F::Id>> {
        self.children.as_ref()
    }

    pub fn tail(&self) -> Option<&Raw> {
        self.tail.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    pub fn size(&self) -> u64 {
        self.header.size()
    }

    /// Position in the host file, `None` until the node has been written.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Bytes the node currently occupies in the host file.
    pub fn span(&self) -> Option<u64> {
        self.span
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// A decoded (or freshly built) node tree together with its byte source.
pub struct Tree<F: Format> {
    pub(crate) nodes: Vec<Node<F>>,
    pub(crate) top: Children<F::Id>,
    pub(crate) source: Option<ByteCursor>,
    pub(crate) path: Option<PathBuf>,
}

impl<F: Format> Default for Tree<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Format> Tree<F> {
    /// An empty tree with no backing source.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            top: Children::new(),
            source: None,
            path: None,
        }
    }

    /// Decodes the file at `path` with the format's default registry. The
    /// tree keeps the file open for reading and can write back into it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let cur = ByteCursor::open(path.as_ref())?;
        let mut tree = Self::read(cur)?;
        tree.path = Some(path.as_ref().to_path_buf());
        Ok(tree)
    }

    /// Decodes any byte source with the format's default registry.
    pub fn read(cur: ByteCursor) -> Result<Self> {
        crate::parser::Parser::new(F::registry(), Default::default()).parse(cur)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::read(ByteCursor::from_bytes(bytes))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_file_backed(&self) -> bool {
        self.path.is_some()
    }

    pub fn source_mut(&mut self) -> Option<&mut ByteCursor> {
        self.source.as_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node<F> {
        &self.nodes[id]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<F>> {
        self.nodes.get(id)
    }

    pub fn top(&self) -> &Children<F::Id> {
        &self.top
    }

    /// Children of `parent`, or the top-level nodes for `None`.
    pub fn children_of(&self, parent: Option<NodeId>) -> Option<&Children<F::Id>> {
        match parent {
            None => Some(&self.top),
            Some(p) => self.nodes[p].children.as_ref(),
        }
    }

    fn children_of_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Children<F::Id>> {
        match parent {
            None => Some(&mut self.top),
            Some(p) => self.nodes[p].children.as_mut(),
        }
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.nodes[p].parent;
        }
        out
    }

    pub fn top_ancestor(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Whether `id` is `root` or one of its descendants.
    pub fn is_within(&self, id: NodeId, root: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == root {
                return true;
            }
            cur = self.nodes[n].parent;
        }
        false
    }

    /// `root` and its descendants in pre-order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            out.push(n);
            if let Some(kids) = &self.nodes[n].children {
                let ids: Vec<NodeId> = kids.ids().collect();
                stack.extend(ids.into_iter().rev());
            }
        }
        out
    }

    /// Every node reachable from the top level, in pre-order.
    pub fn reachable(&self) -> Vec<NodeId> {
        self.top
            .ids()
            .flat_map(|id| self.descendants(id))
            .collect()
    }

    pub(crate) fn attach(&mut self, parent: Option<NodeId>, index: Option<usize>, mut node: Node<F>) -> NodeId {
        let id = self.nodes.len();
        let key = node.header.id().clone();
        node.parent = parent;
        self.nodes.push(node);
        if let Some(kids) = self.children_of_mut(parent) {
            match index {
                Some(i) => kids.insert(i, key, id),
                None => kids.push(key, id),
            }
        }
        id
    }

    /// Drops every node from `mark` onwards; used to undo a failed subtree decode.
    pub(crate) fn rollback(&mut self, parent: Option<NodeId>, mark: NodeId) {
        self.nodes.truncate(mark);
        if let Some(kids) = self.children_of_mut(parent) {
            kids.entries.retain(|(_, id)| *id < mark);
        }
    }

    /// Marks `id` and all its ancestors as needing size recomputation.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            self.nodes[n].dirty = true;
            cur = self.nodes[n].parent;
        }
    }

    fn check_parent(&self, parent: Option<NodeId>) -> Result<()> {
        if let Some(p) = parent
            && !self.nodes[p].is_container()
        {
            return Err(Error::layout(format!(
                "{} {} is not a container",
                F::NAME,
                self.nodes[p].id()
            )));
        }
        Ok(())
    }

    /// Inserts a new node at `index` among `parent`'s children (or the top level).
    pub fn insert_node(
        &mut self,
        parent: Option<NodeId>,
        index: Option<usize>,
        header: F::Header,
        record: F::Record,
        container: bool,
    ) -> Result<NodeId> {
        self.check_parent(parent)?;
        let children = container.then(Children::new);
        let id = self.attach(parent, index, Node::new(header, record, children));
        self.mark_dirty(id);
        Ok(id)
    }

    pub fn add_leaf(&mut self, parent: Option<NodeId>, header: F::Header, record: F::Record) -> Result<NodeId> {
        self.insert_node(parent, None, header, record, false)
    }

    pub fn add_container(
        &mut self,
        parent: Option<NodeId>,
        header: F::Header,
        record: F::Record,
    ) -> Result<NodeId> {
        self.insert_node(parent, None, header, record, true)
    }

    /// Inserts a top-level node that owns a zero-length span at `offset` of
    /// the host file, so that writing it back splices it in there.
    pub(crate) fn insert_placeholder(
        &mut self,
        index: usize,
        offset: u64,
        header: F::Header,
        record: F::Record,
        container: bool,
    ) -> NodeId {
        let mut node = Node::new(header, record, container.then(Children::new));
        node.offset = Some(offset);
        node.span = Some(0);
        self.attach(None, Some(index), node)
    }

    /// Detaches `id` from its parent. Top-level nodes already on disk cannot
    /// be removed because no enclosing node would absorb the freed span.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let parent = self.nodes[id].parent;
        if parent.is_none() && self.nodes[id].offset.is_some() {
            return Err(Error::layout(format!(
                "top-level {} {} is on disk; empty it instead",
                F::NAME,
                self.nodes[id].id()
            )));
        }
        if let Some(kids) = self.children_of_mut(parent) {
            kids.remove(id);
        }
        if let Some(p) = parent {
            self.mark_dirty(p);
        }
        Ok(())
    }

    /// Mutable access to a node's record; marks it and its ancestors dirty.
    pub fn record_mut(&mut self, id: NodeId) -> &mut F::Record {
        self.mark_dirty(id);
        &mut self.nodes[id].record
    }

    pub fn set_record(&mut self, id: NodeId, record: F::Record) {
        *self.record_mut(id) = record;
    }
}
