//! Structural checks: duplicate children and parent cycles.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::{Node, NodeKind, NodeRef};
use crate::constants::MAX_TREE_DEPTH;
use crate::container::{ChangeGate, Container, EachAction};
use crate::key::Key;
use crate::timed::TimedValue;
use crate::value::Value;

/// How a node kind detects a child stored more than once.
///
/// Map slots are addressed by the child's own name, so a child can only ever
/// sit under one key and there is nothing to find. Array slots are not, so
/// the whole sequence has to be scanned.
pub trait DuplicatePolicy: Send + Sync + fmt::Debug {
    /// The slot already holding `node`, if any.
    fn find_duplicate(&self, slots: &Container, node: &NodeRef) -> Option<(Key, TimedValue)>;

    /// Erase every slot holding `node` except the one written with timestamp
    /// `keep`. Returns the key that slot sits under once the others are gone,
    /// or `None` when nothing was scanned or no such slot exists, in which
    /// case nothing is erased.
    fn remove_duplicates(
        &self,
        slots: &mut Container,
        node: &NodeRef,
        keep: i64,
        gate: ChangeGate<'_>,
    ) -> Option<Key>;
}

#[derive(Debug, Default)]
pub struct UniqueKeys;

impl DuplicatePolicy for UniqueKeys {
    fn find_duplicate(&self, _slots: &Container, _node: &NodeRef) -> Option<(Key, TimedValue)> {
        None
    }

    fn remove_duplicates(
        &self,
        _slots: &mut Container,
        _node: &NodeRef,
        _keep: i64,
        _gate: ChangeGate<'_>,
    ) -> Option<Key> {
        None
    }
}

#[derive(Debug, Default)]
pub struct LinearScan;

impl DuplicatePolicy for LinearScan {
    fn find_duplicate(&self, slots: &Container, node: &NodeRef) -> Option<(Key, TimedValue)> {
        let mut found = None;
        slots.scan(None, |key, value| {
            if value.owns(node) {
                found = Some((key.clone(), value.clone()));
                return true;
            }
            false
        });
        found
    }

    fn remove_duplicates(
        &self,
        slots: &mut Container,
        node: &NodeRef,
        keep: i64,
        gate: ChangeGate<'_>,
    ) -> Option<Key> {
        // Positions shift as slots are erased, so the survivor is picked by
        // its write timestamp and its key read during the same pass.
        let kept = |value: &TimedValue| value.owns(node) && value.timestamp() == keep;
        let mut present = false;
        slots.scan(None, |_, value| {
            present = kept(value);
            present
        });
        if !present {
            return None;
        }

        let mut landed = None;
        slots.for_each_mut(
            None,
            |key, value| {
                if !value.owns(node) {
                    return EachAction::Next;
                }
                if landed.is_none() && kept(value) {
                    landed = Some(key.clone());
                    return EachAction::Next;
                }
                EachAction::Erase
            },
            gate,
        );
        landed
    }
}

pub(crate) fn policy_for(kind: NodeKind) -> Box<dyn DuplicatePolicy> {
    match kind {
        NodeKind::Map => Box::new(UniqueKeys),
        NodeKind::Array => Box::new(LinearScan),
    }
}

/// Key of the slot owning `node`, found by identity.
pub(crate) fn find_owning(slots: &Container, node: &NodeRef) -> Option<Key> {
    if let Some(name) = node.name() {
        let key = Key::Name(name);
        if slots.get(&key).is_some_and(|value| value.owns(node)) {
            return Some(key);
        }
    }
    let mut found = None;
    slots.scan(None, |key, value| {
        if value.owns(node) {
            found = Some(key.clone());
            return true;
        }
        false
    });
    found
}

impl Node {
    /// Key `node` sits under after its write under `key`, stamped `stamp`,
    /// had every other slot holding it erased. `None` once that write has
    /// itself been overwritten.
    pub(crate) fn settle(
        &self,
        slots: &mut Container,
        node: &NodeRef,
        key: &Key,
        stamp: i64,
        gate: ChangeGate<'_>,
    ) -> Option<Key> {
        if let Some(landed) = self.validator.remove_duplicates(slots, node, stamp, gate) {
            return Some(landed);
        }
        match self.kind {
            NodeKind::Map => slots.get(key).filter(|value| value.owns(node)).map(|_| key.clone()),
            NodeKind::Array => None,
        }
    }

    /// Whether `candidate` may become this node's parent: it must not be this
    /// node or one of its descendants.
    pub(crate) fn is_valid_parent(&self, candidate: &NodeRef) -> bool {
        let mut check = Some(Arc::clone(candidate));
        let mut depth = 0usize;
        while let Some(node) = check {
            if std::ptr::eq(Arc::as_ptr(&node), self) {
                return false;
            }
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                warn!(node = self.uid(), depth, "parent chain too deep, refusing parent");
                return false;
            }
            check = node.parent();
            if check.as_ref().is_some_and(|next| Arc::ptr_eq(next, candidate)) {
                return false;
            }
        }
        true
    }

    /// Whether `value` may be stored here: a node reference (owning or alias)
    /// must not point at this node or any of its ancestors. Returns the owning
    /// reference, if `value` is one.
    pub(crate) fn is_valid_child(&self, value: &Value) -> (bool, Option<NodeRef>) {
        let Some(target) = value.node_ptr() else {
            return (true, None);
        };
        let child = value.as_node().cloned();

        let mut check = self.this.upgrade();
        let mut depth = 0usize;
        while let Some(node) = check {
            if std::ptr::eq(Arc::as_ptr(&node), target) {
                return (false, child);
            }
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                warn!(node = self.uid(), depth, "parent chain too deep, refusing child");
                return (false, child);
            }
            check = node.parent();
            if check.as_ref().is_some_and(|next| std::ptr::eq(Arc::as_ptr(next), self)) {
                return (false, child);
            }
        }
        (true, child)
    }
}
