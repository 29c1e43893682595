//! Storage backends behind a node.
//!
//! A node keeps its slots in one of three interchangeable backends:
//!
//! - [`ArrayContainer`]: an index-addressed sequence.
//! - [`MapContainer`]: an ordered, string-keyed table.
//! - [`TombstoneMap`]: a [`MapContainer`] that remembers erasures. Erasing a
//!   key leaves a tombstone (an empty value carrying the erase time) so that
//!   history scans can report "erased at T".
//!
//! The set is closed, so [`Container`] is an enum and every operation is an
//! exhaustive match. All mutators accept a [`ChangeGate`]: a predicate
//! consulted with `(key, from, to)` right before a change is committed. A gate
//! returning `false` rejects the change and leaves the slot untouched.

mod array;
mod map;
mod tombstones;

pub use array::ArrayContainer;
pub use map::MapContainer;
pub use tombstones::TombstoneMap;

use crate::key::Key;
use crate::node::NodeKind;
use crate::timed::TimedValue;

/// Per-change veto hook: `(key, from, to) -> allowed`.
pub type ChangeGate<'a> = Option<&'a dyn Fn(&Key, &TimedValue, &TimedValue) -> bool>;

/// Result of a mutating-scan callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EachAction {
    Next,
    Erase,
    EraseStop,
    Stop,
}

impl EachAction {
    pub fn is_erase(self) -> bool {
        matches!(self, EachAction::Erase | EachAction::EraseStop)
    }

    pub fn is_stop(self) -> bool {
        matches!(self, EachAction::Stop | EachAction::EraseStop)
    }
}

/// Result of a read-traversal callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAction {
    Skip,
    Take,
    TakeStop,
    Stop,
}

impl CopyAction {
    pub fn is_take(self) -> bool {
        matches!(self, CopyAction::Take | CopyAction::TakeStop)
    }

    pub fn is_stop(self) -> bool {
        matches!(self, CopyAction::Stop | CopyAction::TakeStop)
    }
}

/// Outcome of an insert-if-absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Emplaced {
    pub succeeded: bool,
    /// Where the value landed, or the key that was attempted.
    pub key: Key,
    /// The occupant that blocked the insert, if any.
    pub existing: TimedValue,
}

impl Emplaced {
    pub(crate) fn ok(key: Key) -> Self {
        Self {
            succeeded: true,
            key,
            existing: TimedValue::default(),
        }
    }

    pub(crate) fn failed(key: Key, existing: TimedValue) -> Self {
        Self {
            succeeded: false,
            key,
            existing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Array,
    Map,
}

/// One of the three storage backends.
#[derive(Debug, Clone)]
pub enum Container {
    Array(ArrayContainer),
    Map(MapContainer),
    Tombstones(TombstoneMap),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Container::Array($inner) => $body,
            Container::Map($inner) => $body,
            Container::Tombstones($inner) => $body,
        }
    };
}

impl Container {
    /// Default backend for a node kind: maps remember erasures.
    pub fn for_node(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Map => Container::Tombstones(TombstoneMap::default()),
            NodeKind::Array => Container::Array(ArrayContainer::default()),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Array(_) => ContainerKind::Array,
            Container::Map(_) | Container::Tombstones(_) => ContainerKind::Map,
        }
    }

    pub fn is_key_valid(&self, key: &Key) -> bool {
        dispatch!(self, c => c.is_key_valid(key))
    }

    /// Visible entries (tombstones excluded).
    pub fn len(&self) -> usize {
        dispatch!(self, c => c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw slot lookup; a tombstone is returned as-is.
    pub fn get(&self, key: &Key) -> Option<&TimedValue> {
        dispatch!(self, c => c.get(key))
    }

    /// Stable scan over visible entries. The callback returns `true` to stop.
    ///
    /// Returns `false` if the container is empty or `from` is not present.
    pub fn scan<F>(&self, from: Option<&Key>, on_item: F) -> bool
    where
        F: FnMut(&Key, &TimedValue) -> bool,
    {
        dispatch!(self, c => c.scan(from, on_item))
    }

    /// Like [`Container::scan`] but including tombstones.
    pub fn scan_history<F>(&self, from: Option<&Key>, on_item: F) -> bool
    where
        F: FnMut(&Key, &TimedValue) -> bool,
    {
        match self {
            Container::Tombstones(c) => c.scan_history(from, on_item),
            Container::Array(c) => c.scan(from, on_item),
            Container::Map(c) => c.scan(from, on_item),
        }
    }

    /// Mutating scan. The callback may edit the value in place or ask for
    /// erasure; every such change passes through `gate` before it is kept.
    pub fn for_each_mut<F>(&mut self, from: Option<&Key>, on_item: F, gate: ChangeGate<'_>) -> bool
    where
        F: FnMut(&Key, &mut TimedValue) -> EachAction,
    {
        dispatch!(self, c => c.for_each_mut(from, on_item, gate))
    }

    /// Overwrite (or create) a slot. Returns whether the slot changed and the
    /// previous value; on failure the second element is the current value.
    pub fn set(&mut self, key: &Key, value: TimedValue, gate: ChangeGate<'_>) -> (bool, TimedValue) {
        dispatch!(self, c => c.set(key, value, gate))
    }

    /// Insert only if the slot is vacant.
    pub fn emplace(&mut self, key: &Key, value: TimedValue, gate: ChangeGate<'_>) -> Emplaced {
        dispatch!(self, c => c.emplace(key, value, gate))
    }

    pub fn erase(&mut self, key: &Key, gate: ChangeGate<'_>) -> Option<TimedValue> {
        dispatch!(self, c => c.erase(key, gate))
    }

    pub fn clear(&mut self) {
        dispatch!(self, c => c.clear())
    }
}

/// Run `gate` if there is one.
pub(crate) fn gate_allows(gate: ChangeGate<'_>, key: &Key, from: &TimedValue, to: &TimedValue) -> bool {
    gate.is_none_or(|allow| allow(key, from, to))
}
