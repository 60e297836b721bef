//! Read-only navigation: identifier lookups, wildcard matching, dotted
//! paths and symbolic shorthand names.

use crate::error::{Error, Result};
use crate::format::{Format, NodeHeader};
use crate::node::{Children, Node, NodeId, Tree};
use log::warn;
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// A glob over identifiers: `*` matches any run, `?` exactly one
/// character. Matching is anchored and case-insensitive.
#[derive(Debug, Clone)]
pub struct Pattern {
    glob: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(glob: &str) -> Result<Self> {
        let mut source = String::from("(?is)^");
        for c in glob.chars() {
            match c {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                c => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        source.push('$');
        Ok(Self {
            glob: glob.to_string(),
            regex: Regex::new(&source)?,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.glob == other.glob
    }
}

impl Eq for Pattern {}

impl<K: Clone + PartialEq + fmt::Display> Children<K> {
    /// Children whose identifier matches `pattern`, grouped by identifier in
    /// order of first appearance.
    pub fn get_matching(&self, pattern: &str) -> Vec<NodeId> {
        let pattern = match Pattern::new(pattern) {
            Ok(p) => p,
            Err(e) => {
                warn!("pattern {pattern:?} rejected: {e}");
                return Vec::new();
            }
        };
        self.keys()
            .into_iter()
            .filter(|k| pattern.matches(&k.to_string()))
            .flat_map(|k| self.get_all(k))
            .collect()
    }
}

/// The result of [`NodeRef::query`].
#[derive(Debug)]
pub enum Resolved<'t, F: Format> {
    Field(Value),
    Node(NodeRef<'t, F>),
}

impl<'t, F: Format> Resolved<'t, F> {
    pub fn into_field(self) -> Option<Value> {
        match self {
            Resolved::Field(v) => Some(v),
            Resolved::Node(_) => None,
        }
    }

    pub fn into_node(self) -> Option<NodeRef<'t, F>> {
        match self {
            Resolved::Node(n) => Some(n),
            Resolved::Field(_) => None,
        }
    }
}

/// A borrowed handle on one node of a tree.
pub struct NodeRef<'t, F: Format> {
    tree: &'t Tree<F>,
    id: NodeId,
}

impl<F: Format> Clone for NodeRef<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<F: Format> Copy for NodeRef<'_, F> {}

impl<F: Format> fmt::Debug for NodeRef<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("key", self.key())
            .finish()
    }
}

impl<'t, F: Format> NodeRef<'t, F> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t Tree<F> {
        self.tree
    }

    pub fn node(&self) -> &'t Node<F> {
        self.tree.node(self.id)
    }

    pub fn key(&self) -> &'t F::Id {
        self.node().id()
    }

    pub fn header(&self) -> &'t F::Header {
        self.node().header()
    }

    pub fn record(&self) -> &'t F::Record {
        self.node().record()
    }

    pub fn size(&self) -> u64 {
        self.node().size()
    }

    pub fn offset(&self) -> Option<u64> {
        self.node().offset()
    }

    pub fn parent(&self) -> Option<NodeRef<'t, F>> {
        self.node().parent().map(|id| self.tree.get_ref(id))
    }

    fn wrap(&self, ids: Vec<NodeId>) -> Vec<NodeRef<'t, F>> {
        ids.into_iter().map(|id| self.tree.get_ref(id)).collect()
    }

    pub fn children(&self) -> Vec<NodeRef<'t, F>> {
        match self.node().children() {
            Some(kids) => self.wrap(kids.ids().collect()),
            None => Vec::new(),
        }
    }

    pub fn has(&self, key: &F::Id) -> bool {
        self.node().children().is_some_and(|k| k.has(key))
    }

    pub fn get_all(&self, key: &F::Id) -> Vec<NodeRef<'t, F>> {
        match self.node().children() {
            Some(kids) => self.wrap(kids.get_all(key)),
            None => Vec::new(),
        }
    }

    pub fn first(&self, key: &F::Id) -> Option<NodeRef<'t, F>> {
        let id = self.node().children()?.first(key)?;
        Some(self.tree.get_ref(id))
    }

    pub fn get_matching(&self, pattern: &str) -> Vec<NodeRef<'t, F>> {
        match self.node().children() {
            Some(kids) => self.wrap(kids.get_matching(pattern)),
            None => Vec::new(),
        }
    }

    /// Nearest enclosing node with identifier `key`.
    pub fn ancestor(&self, key: &F::Id) -> Option<NodeRef<'t, F>> {
        self.tree
            .ancestors(self.id)
            .into_iter()
            .find(|&a| self.tree.node(a).id() == key)
            .map(|a| self.tree.get_ref(a))
    }

    /// Follows a dotted path of identifier patterns below this node; see
    /// [`Tree::find_path`].
    pub fn find_path(&self, path: &str) -> Option<NodeRef<'t, F>> {
        self.tree.walk(self.node().children()?, path)
    }

    /// Resolves `name` as a built-in attribute (`size`, `offset`,
    /// `header_size`, `id`), then as a typed record field, then as a
    /// shorthand for a child node.
    pub fn query(&self, name: &str) -> Result<Resolved<'t, F>> {
        let node = self.node();
        let builtin = match name {
            "size" => Some(Value::from(node.size())),
            "offset" => Some(node.offset().map_or(Value::Null, Value::from)),
            "header_size" => Some(Value::from(node.header().header_len())),
            "id" => Some(Value::from(node.id().to_string())),
            _ => None,
        };
        if let Some(v) = builtin {
            return Ok(Resolved::Field(v));
        }
        if let Some(v) = crate::format::Record::field(node.record(), name) {
            return Ok(Resolved::Field(v));
        }
        F::shorthand(name)
            .and_then(|key| self.first(&key))
            .map(Resolved::Node)
            .ok_or_else(|| Error::NotFound(format!("{name} on {} {}", F::NAME, node.id())))
    }
}

impl<F: Format> Tree<F> {
    pub fn get_ref(&self, id: NodeId) -> NodeRef<'_, F> {
        NodeRef { tree: self, id }
    }

    pub fn roots(&self) -> Vec<NodeRef<'_, F>> {
        self.top.ids().map(|id| self.get_ref(id)).collect()
    }

    pub fn has(&self, key: &F::Id) -> bool {
        self.top.has(key)
    }

    pub fn get_all(&self, key: &F::Id) -> Vec<NodeRef<'_, F>> {
        self.top.get_all(key).into_iter().map(|id| self.get_ref(id)).collect()
    }

    pub fn first(&self, key: &F::Id) -> Option<NodeRef<'_, F>> {
        self.top.first(key).map(|id| self.get_ref(id))
    }

    pub fn get_matching(&self, pattern: &str) -> Vec<NodeRef<'_, F>> {
        self.top
            .get_matching(pattern)
            .into_iter()
            .map(|id| self.get_ref(id))
            .collect()
    }

    /// Resolves a shorthand name against the top level.
    pub fn query(&self, name: &str) -> Result<NodeRef<'_, F>> {
        F::shorthand(name)
            .and_then(|key| self.first(&key))
            .ok_or_else(|| Error::NotFound(format!("{name} in {} tree", F::NAME)))
    }

    /// Follows a dotted path such as `moov.trak[1].mdia.hdlr`. Each segment
    /// is a pattern; an optional `[n]` picks the n-th match (default 0).
    pub fn find_path(&self, path: &str) -> Option<NodeRef<'_, F>> {
        self.walk(&self.top, path)
    }

    fn walk<'t>(&'t self, start: &'t Children<F::Id>, path: &str) -> Option<NodeRef<'t, F>> {
        let mut level = Some(start);
        let mut found = None;
        for segment in path.split('.') {
            let (pattern, index) = match segment.strip_suffix(']').and_then(|s| s.split_once('[')) {
                Some((p, i)) => (p, i.parse::<usize>().ok()?),
                None => (segment, 0),
            };
            let id = *level?.get_matching(pattern).get(index)?;
            found = Some(id);
            level = self.node(id).children();
        }
        found.map(|id| self.get_ref(id))
    }
}
