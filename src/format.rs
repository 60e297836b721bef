//! The seam between the generic engine and a format family.

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::node::{NodeId, Raw, Tree};
use crate::registry::Registry;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;

/// The fixed header in front of every node.
pub trait NodeHeader: Clone + fmt::Debug {
    type Id;

    fn id(&self) -> &Self::Id;

    /// Declared size, header included.
    fn size(&self) -> u64;

    /// Width of the encoded header itself.
    fn header_len(&self) -> u64;

    /// Updates the declared size from the length of everything after the
    /// header. May widen the header (e.g. an ISO box switching to a 64-bit
    /// size) when the new size does not fit.
    fn resize(&mut self, content_len: u64) -> Result<()>;

    fn encode(&self, out: &mut Vec<u8>) -> Result<()>;
}

/// The typed fields of one node (everything between header and children).
pub trait Record: fmt::Debug + Clone + Serialize {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()>;

    /// Opaque records expose their preserved bytes instead of encoding.
    fn raw(&self) -> Option<&Raw> {
        None
    }

    fn raw_mut(&mut self) -> Option<&mut Raw> {
        None
    }

    /// A short name for the record kind, used in summaries.
    fn kind(&self) -> &'static str;

    /// Looks up a typed field by name through the record's serialized form.
    fn field(&self, name: &str) -> Option<serde_json::Value> {
        match serde_json::to_value(self).ok()? {
            serde_json::Value::Object(mut map) => map.remove(name),
            _ => None,
        }
    }
}

/// Where a decoder is running: the format context and the end of the
/// enclosing range.
#[derive(Debug, Clone, Copy)]
pub struct Scope<C> {
    pub ctx: C,
    pub limit: u64,
}

/// A format family: header layout, record variants and engine hooks.
pub trait Format: Sized + 'static {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display;
    type Header: NodeHeader<Id = Self::Id>;
    type Record: Record;
    /// State inherited from ancestors (e.g. the ID3v2 major version).
    type Context: Copy + Default + fmt::Debug;

    const NAME: &'static str;

    /// Reads one header at the cursor. `Ok(None)` is the end-of-nodes
    /// sentinel (not enough room left, padding reached, no signature).
    fn read_header(
        cur: &mut ByteCursor,
        ctx: Self::Context,
        limit: u64,
    ) -> Result<Option<Self::Header>>;

    fn registry() -> &'static Registry<Self>;

    /// The record stored for unknown identifiers and failed decodes.
    fn opaque(raw: Raw) -> Self::Record;

    fn is_opaque(record: &Self::Record) -> bool {
        record.raw().is_some()
    }

    fn child_context(record: &Self::Record, ctx: Self::Context) -> Self::Context {
        let _ = record;
        ctx
    }

    /// Models bytes left after the sentinel inside `parent` as an explicit
    /// node. `None` leaves them unmodelled (only sensible at top level).
    fn trailing(
        cur: &mut ByteCursor,
        parent: Option<&Self::Id>,
        ctx: Self::Context,
        end: u64,
        inline_limit: u64,
    ) -> Result<Option<(Self::Header, Self::Record)>> {
        let _ = (cur, parent, ctx, end, inline_limit);
        Ok(None)
    }

    /// Brings derived fields (entry counts, data sizes, flag bits) in line
    /// with the node's current content before its size is recomputed.
    /// `child_count` leaves out header-less leftover bytes.
    fn finalize(
        header: &mut Self::Header,
        record: &mut Self::Record,
        child_count: usize,
        children_len: u64,
    ) {
        let _ = (header, record, child_count, children_len);
    }

    /// Symbolic name to identifier, used by [`crate::query::NodeRef::query`].
    fn shorthand(name: &str) -> Option<Self::Id> {
        let _ = name;
        None
    }

    /// Human-readable name of an identifier.
    fn describe(id: &Self::Id) -> Option<&'static str> {
        let _ = id;
        None
    }

    /// Shifts stored absolute offsets at or beyond `pivot` by `delta`.
    /// Returns whether the record changed.
    fn repair_offsets(record: &mut Self::Record, pivot: u64, delta: i64) -> Result<bool> {
        let _ = (record, pivot, delta);
        Ok(false)
    }

    /// The node a write-back of `id` should actually rewrite.
    fn write_root(tree: &Tree<Self>, id: NodeId) -> NodeId {
        let _ = tree;
        id
    }

    /// Runs before sizes are recomputed for a write-back of `target`.
    fn prepare_write(tree: &mut Tree<Self>, target: NodeId) -> Result<()> {
        let _ = (tree, target);
        Ok(())
    }
}

/// Applies `delta` to an absolute offset, failing if the result is negative.
pub fn shift_offset(value: u64, delta: i64) -> Result<u64> {
    value
        .checked_add_signed(delta)
        .ok_or_else(|| crate::error::Error::layout(format!("offset {value} shifted by {delta}")))
}
