//! Decoder registry: maps a node identifier (optionally qualified by its
//! parent's identifier) to the decoder that turns its bytes into a record.

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::format::{Format, Scope};
use std::collections::HashMap;

/// What a decoder produced.
pub enum Decoded<R> {
    /// A record with no children. Bytes the decoder left unread are kept as
    /// the node's tail.
    Leaf(R),
    /// A record whose children follow at the cursor, up to the node's end.
    Container(R),
    /// A container whose children must be decoded from a substitute byte
    /// stream (e.g. an ID3v2.3 body after undoing unsynchronisation).
    /// Children decoded this way have no on-disk position.
    Rebased(R, ByteCursor),
}

/// Trait for node decoders.
///
/// The decoder is handed a cursor positioned at the start of the node's
/// header and limited to the node's end; it re-reads the header and then
/// its own fields.
pub trait NodeDecoder<F: Format>: Send + Sync {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<F::Context>) -> Result<Decoded<F::Record>>;
}

/// Plain function decoders.
pub struct FnDecoder<F: Format>(pub fn(&mut ByteCursor, Scope<F::Context>) -> Result<Decoded<F::Record>>);

impl<F: Format> NodeDecoder<F> for FnDecoder<F> {
    fn decode(&self, cur: &mut ByteCursor, scope: Scope<F::Context>) -> Result<Decoded<F::Record>> {
        (self.0)(cur, scope)
    }
}

/// Matches on the parent identifier (if any) and the node's own identifier.
pub type Rule<F> = fn(Option<&<F as Format>::Id>, &<F as Format>::Id) -> bool;

struct DecoderEntry<F: Format> {
    inner: Box<dyn NodeDecoder<F>>,
    name: String,
}

/// Registry of decoders keyed by identifier, plus ordered rules for
/// decoders that depend on where a node sits.
///
/// Rules are consulted first, so a parent-qualified entry (e.g. `data`
/// inside an item-list entry) wins over a plain identifier entry.
pub struct Registry<F: Format> {
    map: HashMap<F::Id, DecoderEntry<F>>,
    rules: Vec<(Rule<F>, DecoderEntry<F>)>,
}

impl<F: Format> Registry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            rules: Vec::new(),
        }
    }

    /// Return a new registry with the given decoder added.
    ///
    /// `name` is human-readable and used only for logging.
    pub fn with_decoder(mut self, key: F::Id, name: &str, dec: Box<dyn NodeDecoder<F>>) -> Self {
        self.map.insert(
            key,
            DecoderEntry {
                inner: dec,
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_rule(mut self, name: &str, rule: Rule<F>, dec: Box<dyn NodeDecoder<F>>) -> Self {
        self.rules.push((
            rule,
            DecoderEntry {
                inner: dec,
                name: name.to_string(),
            },
        ));
        self
    }

    /// Finds the decoder for `id` under `parent`, with its registered name.
    pub fn lookup(&self, parent: Option<&F::Id>, id: &F::Id) -> Option<(&str, &dyn NodeDecoder<F>)> {
        self.rules
            .iter()
            .find(|(rule, _)| rule(parent, id))
            .map(|(_, e)| e)
            .or_else(|| self.map.get(id))
            .map(|e| (e.name.as_str(), e.inner.as_ref()))
    }

    pub fn contains(&self, parent: Option<&F::Id>, id: &F::Id) -> bool {
        self.lookup(parent, id).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len() + self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes one node with its registered decoder.
    ///
    /// Returns `None` if no decoder exists for the given identifier.
    pub fn decode(
        &self,
        parent: Option<&F::Id>,
        id: &F::Id,
        cur: &mut ByteCursor,
        scope: Scope<F::Context>,
    ) -> Option<Result<Decoded<F::Record>>> {
        self.lookup(parent, id).map(|(_, d)| d.decode(cur, scope))
    }
}

impl<F: Format> Default for Registry<F> {
    fn default() -> Self {
        Self::new()
    }
}
