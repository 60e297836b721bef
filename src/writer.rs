//! Serialization and in-place write-back.
//!
//! A write-back of node `N` runs these steps in order:
//! recompute the sizes of dirty nodes bottom-up, serialize `N`, compare with
//! the span it occupies on disk, move the rest of the file by the
//! difference, repair absolute offsets stored in other records, then patch
//! the headers of `N`'s ancestors and commit the new layout to the tree.

use crate::error::{Error, Result};
use crate::format::{Format, NodeHeader, Record};
use crate::node::{NodeId, Raw, Tree};
use crate::splice;
use log::debug;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;

#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Granularity of the tail move.
    pub block_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            block_size: splice::BLOCK_SIZE,
        }
    }
}

/// What one write-back did to the host file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub offset: u64,
    pub old_len: u64,
    pub new_len: u64,
    pub delta: i64,
    /// Records outside the rewritten node whose stored offsets were shifted.
    pub repaired: usize,
}

/// Geometry of one write-back, fixed before the file is touched.
struct Plan {
    target: NodeId,
    ancestors: Vec<NodeId>,
    old_offset: u64,
    new_len: u64,
    delta: i64,
    pivot: u64,
}

/// Length of a record's own bytes (fields or preserved payload).
pub(crate) fn record_len<R: Record>(record: &R) -> Result<u64> {
    match record.raw() {
        Some(raw) => Ok(raw.len()),
        None => {
            let mut buf = Vec::new();
            record.encode(&mut buf)?;
            Ok(buf.len() as u64)
        }
    }
}

impl<F: Format> Tree<F> {
    /// Recomputes declared sizes of every dirty node, children first.
    pub fn recompute_sizes(&mut self) -> Result<()> {
        let tops: Vec<NodeId> = self.top.ids().collect();
        for id in tops {
            self.recompute(id)?;
        }
        Ok(())
    }

    /// Recomputes `id` and its dirty descendants; returns its declared size.
    pub(crate) fn recompute(&mut self, id: NodeId) -> Result<u64> {
        if !self.nodes[id].dirty {
            return Ok(self.nodes[id].header.size());
        }
        let kids: Vec<NodeId> = self.nodes[id]
            .children
            .as_ref()
            .map(|c| c.ids().collect())
            .unwrap_or_default();
        let mut children_len = 0;
        let mut counted = 0;
        for &k in &kids {
            children_len += self.recompute(k)?;
            if self.nodes[k].header.header_len() > 0 {
                counted += 1;
            }
        }
        let node = &mut self.nodes[id];
        F::finalize(&mut node.header, &mut node.record, counted, children_len);
        let tail = node.tail.as_ref().map_or(0, Raw::len);
        let content = record_len(&node.record)? + tail + children_len;
        node.header.resize(content)?;
        Ok(node.header.size())
    }

    /// The node's bytes as they would be written now. Unchanged nodes that
    /// came from the source are copied verbatim.
    pub fn serialize(&mut self, id: NodeId) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize_into(id, &mut out)?;
        Ok(out)
    }

    fn serialize_into(&mut self, id: NodeId, out: &mut Vec<u8>) -> Result<()> {
        let node = &self.nodes[id];
        if !node.dirty
            && let (Some(offset), Some(span)) = (node.offset, node.span)
        {
            let bytes = self.source_or_err()?.read_at(offset, span)?;
            out.extend_from_slice(&bytes);
            return Ok(());
        }
        node.header.encode(out)?;
        match node.record.raw().cloned() {
            Some(raw) => self.emit_raw(&raw, out)?,
            None => self.nodes[id].record.encode(out)?,
        }
        if let Some(tail) = self.nodes[id].tail.clone() {
            self.emit_raw(&tail, out)?;
        }
        let kids: Vec<NodeId> = self.nodes[id]
            .children
            .as_ref()
            .map(|c| c.ids().collect())
            .unwrap_or_default();
        for k in kids {
            self.serialize_into(k, out)?;
        }
        Ok(())
    }

    fn source_or_err(&mut self) -> Result<&mut crate::cursor::ByteCursor> {
        self.source
            .as_mut()
            .ok_or_else(|| Error::layout("tree has no byte source to copy from"))
    }

    fn emit_raw(&mut self, raw: &Raw, out: &mut Vec<u8>) -> Result<()> {
        match raw {
            Raw::Inline(b) => out.extend_from_slice(b),
            Raw::Deferred { .. } => out.extend_from_slice(&raw.load(self.source.as_mut())?),
        }
        Ok(())
    }

    /// Serializes the whole tree to `w` (save-as). Stored absolute offsets
    /// are written as they are; the output is only consistent when no node
    /// changed size ahead of data those offsets point at.
    pub fn write_to<W: Write>(&mut self, w: &mut W) -> Result<u64> {
        self.recompute_sizes()?;
        let tops: Vec<NodeId> = self.top.ids().collect();
        let mut total = 0;
        for id in tops {
            let bytes = self.serialize(id)?;
            w.write_all(&bytes)?;
            total += bytes.len() as u64;
        }
        Ok(total)
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Writes every changed top-level node back into the host file.
    pub fn save(&mut self) -> Result<Vec<WriteReport>> {
        let mut reports = Vec::new();
        loop {
            let next = self.top.ids().find(|&id| self.nodes[id].dirty);
            let Some(id) = next else {
                break;
            };
            reports.push(self.write_back(id)?);
        }
        Ok(reports)
    }

    pub fn write_back(&mut self, id: NodeId) -> Result<WriteReport> {
        self.write_back_with(id, &WriteOptions::default())
    }

    /// Rewrites node `id` (or the node the format designates for it) inside
    /// the host file, growing or shrinking the file as needed.
    ///
    /// The file is opened for writing before anything in the tree changes.
    /// If a stored offset cannot be repaired the call fails with
    /// `InvalidLayout`, the file is left unchanged, and repaired records
    /// are restored so the write can be retried.
    pub fn write_back_with(&mut self, id: NodeId, opts: &WriteOptions) -> Result<WriteReport> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| Error::NotWritable("tree was not opened from a file".into()))?;
        let target = self.on_disk_target(F::write_root(self, id))?;
        self.check_pending(target)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::NotWritable(format!("{}: {e}", path.display())))?;
        F::prepare_write(self, target)?;

        let top = self.top_ancestor(target);
        self.recompute(top)?;
        let (old_offset, old_len) = match (self.nodes[target].offset, self.nodes[target].span) {
            (Some(o), Some(s)) => (o, s),
            _ => return Err(Error::layout("write-back target has no on-disk span")),
        };
        let new_len = self.nodes[target].header.size();
        let plan = Plan {
            target,
            ancestors: self.ancestors(target),
            old_offset,
            new_len,
            delta: new_len as i64 - old_len as i64,
            pivot: old_offset + old_len,
        };

        if !self.nodes[target].dirty {
            debug!("{}: {} unchanged, nothing to write", F::NAME, self.nodes[target].id());
            return Ok(WriteReport {
                offset: old_offset,
                old_len,
                new_len,
                delta: 0,
                repaired: 0,
            });
        }

        for &a in &plan.ancestors {
            let n = &self.nodes[a];
            if n.header.header_len() != n.disk_header_len {
                return Err(Error::layout(format!(
                    "header of {} {} would change width",
                    F::NAME,
                    n.id()
                )));
            }
        }

        let dirty: Vec<bool> = self.nodes.iter().map(|n| n.dirty).collect();
        let mut originals = Vec::new();
        let outside = match self.splice_into(&mut file, &plan, opts, &mut originals) {
            Ok(n) => n,
            Err(e) => {
                for (n, record) in originals {
                    self.nodes[n].record = record;
                }
                for (node, was) in self.nodes.iter_mut().zip(dirty) {
                    node.dirty = was;
                }
                return Err(e);
            }
        };

        self.relocate(plan.pivot, plan.delta, target)?;
        self.layout(target, old_offset)?;
        for &a in &plan.ancestors {
            let n = &mut self.nodes[a];
            n.span = Some(n.header.size());
            n.disk_header_len = n.header.header_len();
        }
        for n in self.reachable() {
            self.nodes[n].dirty = false;
        }
        if let Some(src) = self.source.as_mut() {
            src.refresh()?;
        }
        debug!(
            "{}: wrote {} at {old_offset}: {old_len} -> {new_len} bytes, {outside} offsets repaired",
            F::NAME,
            self.nodes[target].id()
        );
        Ok(WriteReport {
            offset: old_offset,
            old_len,
            new_len,
            delta: plan.delta,
            repaired: outside,
        })
    }

    /// Repairs stored offsets, serializes the target and patches, then
    /// moves the tail and writes. Every record changed by the repair is
    /// pushed to `originals` with its previous value first.
    fn splice_into(
        &mut self,
        file: &mut File,
        plan: &Plan,
        opts: &WriteOptions,
        originals: &mut Vec<(NodeId, F::Record)>,
    ) -> Result<usize> {
        let Plan {
            target,
            old_offset,
            new_len,
            delta,
            pivot,
            ..
        } = *plan;
        if delta != 0 {
            self.repair_offsets(pivot, delta, originals)?;
        }
        let repaired: Vec<NodeId> = originals.iter().map(|(n, _)| *n).collect();

        let bytes = self.serialize(target)?;
        if bytes.len() as u64 != new_len {
            return Err(Error::layout(format!(
                "serialized {} bytes for a node declaring {new_len}",
                bytes.len()
            )));
        }
        let mut patches: Vec<(u64, Vec<u8>)> = Vec::new();
        for &a in &plan.ancestors {
            let mut head = Vec::new();
            self.nodes[a].header.encode(&mut head)?;
            if let Some(at) = self.nodes[a].offset {
                patches.push((at, head));
            }
        }
        let mut outside = 0;
        for &r in &repaired {
            if self.is_within(r, target) || plan.ancestors.contains(&r) {
                continue;
            }
            let Some(at) = self.nodes[r].offset else {
                continue;
            };
            let at = if at >= pivot {
                crate::format::shift_offset(at, delta)?
            } else {
                at
            };
            patches.push((at, self.serialize(r)?));
            outside += 1;
        }

        splice::shift_tail(file, pivot, delta, opts.block_size)?;
        splice::write_at(file, old_offset, &bytes)?;
        for (at, b) in &patches {
            splice::write_at(file, *at, b)?;
        }
        file.flush()?;
        Ok(outside)
    }

    fn on_disk_target(&self, id: NodeId) -> Result<NodeId> {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if self.nodes[n].offset.is_some() {
                return Ok(n);
            }
            cur = self.nodes[n].parent;
        }
        Err(Error::layout(format!(
            "{} {} has no on-disk ancestor to write into",
            F::NAME,
            self.nodes[id].id()
        )))
    }

    /// Changes outside the target subtree would be lost by a partial write.
    fn check_pending(&self, target: NodeId) -> Result<()> {
        let ancestors = self.ancestors(target);
        for n in self.reachable() {
            if self.nodes[n].dirty && !ancestors.contains(&n) && !self.is_within(n, target) {
                return Err(Error::layout(format!(
                    "{} {} has pending changes outside the node being written",
                    F::NAME,
                    self.nodes[n].id()
                )));
            }
        }
        Ok(())
    }

    fn repair_offsets(&mut self, pivot: u64, delta: i64, originals: &mut Vec<(NodeId, F::Record)>) -> Result<()> {
        for n in self.reachable() {
            let mut record = self.nodes[n].record.clone();
            if F::repair_offsets(&mut record, pivot, delta)? {
                let old = std::mem::replace(&mut self.nodes[n].record, record);
                originals.push((n, old));
                self.mark_dirty(n);
            }
        }
        Ok(())
    }

    /// Shifts recorded positions of everything at or after `pivot` outside `target`.
    fn relocate(&mut self, pivot: u64, delta: i64, target: NodeId) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        for n in self.reachable() {
            if self.is_within(n, target) {
                continue;
            }
            let node = &mut self.nodes[n];
            if let Some(off) = node.offset
                && off >= pivot
            {
                node.offset = Some(crate::format::shift_offset(off, delta)?);
            }
            if let Some(raw) = node.record.raw_mut() {
                raw.shift(pivot, delta)?;
            }
            if let Some(tail) = node.tail.as_mut() {
                tail.shift(pivot, delta)?;
            }
        }
        Ok(())
    }

    /// Assigns fresh positions to `id` and its subtree laid out from `offset`.
    fn layout(&mut self, id: NodeId, offset: u64) -> Result<()> {
        let record_len = record_len(&self.nodes[id].record)?;
        let node = &mut self.nodes[id];
        let header_len = node.header.header_len();
        node.offset = Some(offset);
        node.span = Some(node.header.size());
        node.disk_header_len = header_len;
        let mut pos = offset + header_len;
        if let Some(raw) = node.record.raw_mut() {
            raw.place(pos);
        }
        pos += record_len;
        if let Some(tail) = node.tail.as_mut() {
            tail.place(pos);
            pos += tail.len();
        }
        let kids: Vec<NodeId> = node.children.as_ref().map(|c| c.ids().collect()).unwrap_or_default();
        for k in kids {
            self.layout(k, pos)?;
            pos += self.nodes[k].header.size();
        }
        Ok(())
    }
}
