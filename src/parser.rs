//! The recursive decode engine shared by every format.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::format::{Format, NodeHeader, Scope};
use crate::node::{Children, Node, NodeId, Raw, Tree};
use crate::registry::{Decoded, Registry};
use log::{debug, trace, warn};

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Payloads up to this many bytes are copied into memory; larger ones are
    /// referenced by position and streamed from the source when needed.
    pub inline_limit: u64,
    /// Containers nested deeper than this are kept opaque.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            inline_limit: 1 << 20,
            max_depth: 64,
        }
    }
}

/// Re-reads the header at the cursor; decoders call this first.
pub fn expect_header<F: Format>(cur: &mut ByteCursor, scope: Scope<F::Context>) -> Result<F::Header> {
    let at = cur.tell();
    F::read_header(cur, scope.ctx, scope.limit)?
        .ok_or_else(|| Error::header(at, format!("expected a {} header", F::NAME)))
}

#[derive(Clone, Copy)]
struct Level<C> {
    parent: Option<NodeId>,
    end: u64,
    ctx: C,
    depth: usize,
    /// Decoding from a substitute stream: nothing gets an on-disk position.
    detached: bool,
}

pub struct Parser<'r, F: Format> {
    registry: &'r Registry<F>,
    options: ParseOptions,
}

impl<'r, F: Format> Parser<'r, F> {
    pub fn new(registry: &'r Registry<F>, options: ParseOptions) -> Self {
        Self { registry, options }
    }

    /// Decodes the whole source into a tree that keeps the cursor for
    /// later verbatim copies.
    pub fn parse(&self, mut cur: ByteCursor) -> Result<Tree<F>> {
        let mut tree = Tree::new();
        cur.seek_to(cur.base())?;
        let level = Level {
            parent: None,
            end: cur.len(),
            ctx: F::Context::default(),
            depth: 0,
            detached: false,
        };
        self.parse_children(&mut tree, &mut cur, level)?;
        debug!("{}: decoded {} nodes from {} bytes", F::NAME, tree.len(), cur.len());
        tree.source = Some(cur);
        Ok(tree)
    }

    fn inline_limit(&self, level: &Level<F::Context>) -> u64 {
        if level.detached {
            u64::MAX
        } else {
            self.options.inline_limit
        }
    }

    fn parent_id(tree: &Tree<F>, level: &Level<F::Context>) -> Option<F::Id> {
        level.parent.map(|p| tree.nodes[p].header.id().clone())
    }

    fn place(node: Node<F>, start: u64, level: &Level<F::Context>) -> Node<F> {
        if level.detached { node } else { node.on_disk(start) }
    }

    fn parse_children(&self, tree: &mut Tree<F>, cur: &mut ByteCursor, level: Level<F::Context>) -> Result<()> {
        while cur.tell() < level.end {
            cur.set_limit(level.end);
            if self.parse_node(tree, cur, level)?.is_some() {
                continue;
            }
            let start = cur.tell();
            let parent = Self::parent_id(tree, &level);
            if let Some((header, record)) =
                F::trailing(cur, parent.as_ref(), level.ctx, level.end, self.inline_limit(&level))?
            {
                trace!("{}: trailing {} at {start}", F::NAME, header.id());
                let node = Self::place(Node::new(header, record, None), start, &level);
                tree.attach(level.parent, None, node);
            }
            cur.seek_to(level.end)?;
            break;
        }
        Ok(())
    }

    /// Decodes the node at the cursor. `Ok(None)` means the format saw its
    /// end-of-nodes sentinel.
    fn parse_node(
        &self,
        tree: &mut Tree<F>,
        cur: &mut ByteCursor,
        level: Level<F::Context>,
    ) -> Result<Option<NodeId>> {
        let start = cur.tell();
        let Some(header) = F::read_header(cur, level.ctx, level.end)? else {
            cur.seek_to(start)?;
            return Ok(None);
        };
        let size = header.size();
        let end = start
            .checked_add(size)
            .filter(|e| *e <= level.end)
            .ok_or(Error::TruncatedInput {
                offset: start,
                needed: size,
                available: level.end - start,
            })?;
        let key = header.id().clone();
        let parent = Self::parent_id(tree, &level);
        let inline = self.inline_limit(&level);

        let decoded = match self.registry.lookup(parent.as_ref(), &key) {
            Some((name, decoder)) => {
                trace!("{}: {key} at {start} ({size} bytes) via {name}", F::NAME);
                cur.seek_to(start)?;
                cur.set_limit(end);
                match decoder.decode(cur, Scope { ctx: level.ctx, limit: end }) {
                    Ok(d) => Some(d),
                    Err(Error::Io(e)) => return Err(Error::Io(e)),
                    Err(e) => {
                        warn!("{}: {key} at {start}: {e}; keeping raw bytes", F::NAME);
                        None
                    }
                }
            }
            None => {
                trace!("{}: {key} at {start} ({size} bytes) has no decoder", F::NAME);
                None
            }
        };

        let mark = tree.nodes.len();
        let id = match decoded {
            Some(Decoded::Leaf(record)) => {
                let consumed = cur.tell().max(start + header.header_len());
                let tail = if consumed < end {
                    Some(Raw::capture(cur, consumed, end, inline)?)
                } else {
                    None
                };
                let node = Node::new(header, record, None).with_tail(tail);
                tree.attach(level.parent, None, Self::place(node, start, &level))
            }
            Some(Decoded::Container(record)) => {
                let ctx = F::child_context(&record, level.ctx);
                let node = Self::place(Node::new(header.clone(), record, Some(Children::new())), start, &level);
                let id = tree.attach(level.parent, None, node);
                let inner = Level {
                    parent: Some(id),
                    end,
                    ctx,
                    depth: level.depth + 1,
                    detached: level.detached,
                };
                match self.descend(tree, cur, inner) {
                    Ok(()) => id,
                    Err(Error::Io(e)) => return Err(Error::Io(e)),
                    Err(e) => {
                        warn!("{}: children of {key} at {start}: {e}; keeping raw bytes", F::NAME);
                        tree.rollback(level.parent, mark);
                        self.attach_opaque(tree, cur, header, start, end, level)?
                    }
                }
            }
            Some(Decoded::Rebased(record, mut body)) => {
                let ctx = F::child_context(&record, level.ctx);
                let mut node = Self::place(Node::new(header.clone(), record, Some(Children::new())), start, &level);
                // Children will be re-encoded in their canonical form.
                node.dirty = true;
                let id = tree.attach(level.parent, None, node);
                let inner = Level {
                    parent: Some(id),
                    end: body.len(),
                    ctx,
                    depth: level.depth + 1,
                    detached: true,
                };
                match self.descend(tree, &mut body, inner) {
                    Ok(()) => id,
                    Err(Error::Io(e)) => return Err(Error::Io(e)),
                    Err(e) => {
                        warn!("{}: children of {key} at {start}: {e}; keeping raw bytes", F::NAME);
                        tree.rollback(level.parent, mark);
                        self.attach_opaque(tree, cur, header, start, end, level)?
                    }
                }
            }
            None => self.attach_opaque(tree, cur, header, start, end, level)?,
        };

        cur.set_limit(level.end);
        cur.seek_to(end)?;
        Ok(Some(id))
    }

    fn descend(&self, tree: &mut Tree<F>, cur: &mut ByteCursor, level: Level<F::Context>) -> Result<()> {
        if level.depth > self.options.max_depth {
            return Err(Error::layout(format!("nesting deeper than {}", self.options.max_depth)));
        }
        self.parse_children(tree, cur, level)
    }

    fn attach_opaque(
        &self,
        tree: &mut Tree<F>,
        cur: &mut ByteCursor,
        header: F::Header,
        start: u64,
        end: u64,
        level: Level<F::Context>,
    ) -> Result<NodeId> {
        let body = start + header.header_len();
        let raw = Raw::capture(cur, body, end, self.inline_limit(&level))?;
        let node = Node::new(header, F::opaque(raw), None);
        Ok(tree.attach(level.parent, None, Self::place(node, start, &level)))
    }
}
