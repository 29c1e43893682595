//! Crate-internal half of the parent/child bookkeeping.
//!
//! The public operations update both sides of a relationship: storing a child
//! sets its parent, setting a parent stores the child. These calls update one
//! side only, so each public operation can drive the other side without
//! recursing back into itself.

use std::sync::{Arc, Weak};

use tracing::{debug, trace, warn};

use super::{InsertOutcome, Node, NodeError, NodeKind, NodeRef};
use crate::container::{Container, EachAction};
use crate::key::Key;
use crate::timed::TimedValue;
use crate::value::Value;
use crate::Result;

pub(crate) trait NodePrivate {
    /// Replace the name without touching the parent. Returns the old name
    /// (empty if there was none).
    fn private_name_set(&self, name: &str) -> String;

    /// Swap the parent pointer (and optionally the name) without touching any
    /// container. Fails for a cycle, an unchanged parent, or an unnamed node
    /// joining a map. Returns success and the previous parent.
    fn private_parent_set(&self, parent: Option<&NodeRef>, name: Option<&str>) -> (bool, Option<NodeRef>);

    /// Clear the parent pointer if it still points at `parent`.
    fn private_release(&self, parent: &Node) -> bool;

    /// Erase the slot owning `child`, without detaching it. Returns the
    /// erased key, or `Key::Empty` if `child` was not held here.
    fn private_erase(&self, child: &NodeRef) -> Key;

    /// Write a slot without touching the stored node's parent pointer.
    fn private_set(&self, key: &Key, value: Value) -> Result<(bool, TimedValue)>;

    /// Insert into a vacant slot without touching the stored node's parent
    /// pointer.
    fn private_insert(&self, key: &Key, value: Value) -> Result<InsertOutcome>;
}

impl Node {
    fn check_private_key(&self, slots: &Container, key: &Key) -> Result<()> {
        if slots.is_key_valid(key) {
            return Ok(());
        }
        Err(NodeError::InvalidKey {
            key: key.to_string(),
            reason: format!("not addressable in a {} node", self.kind),
        }
        .into())
    }

    /// Make this node the parent of `child`, which was just stored under
    /// `name` (map) or an index (`None`), and vacate its previous slot.
    pub(crate) fn adopt(&self, child: &NodeRef, name: Option<&str>) -> bool {
        let Some(me) = self.this.upgrade() else {
            return false;
        };

        let (attached, prev) = child.private_parent_set(Some(&me), name);
        if attached {
            if let Some(prev) = prev {
                prev.private_erase(child);
            }
            trace!(node = self.uid, child = child.uid(), "adopted child");
            return true;
        }

        if !child.parent().is_some_and(|parent| Arc::ptr_eq(&parent, &me)) {
            warn!(node = self.uid, child = child.uid(), "stored child could not be adopted");
            return false;
        }

        // Already ours; a new map key means the child moved within this node.
        if let Some(name) = name {
            let old = child.private_name_set(name);
            if !old.is_empty() && old != name {
                self.release_slot(&Key::Name(old), child);
            }
        }
        true
    }

    /// Erase `key` if it still owns `child`.
    fn release_slot(&self, key: &Key, child: &NodeRef) -> bool {
        let mut slots = self.write_slots();
        if !slots.get(key).is_some_and(|value| value.owns(child)) {
            return false;
        }
        let relocate = self.notify_gate(true);
        slots.erase(key, Some(&relocate)).is_some()
    }
}

impl NodePrivate for Node {
    fn private_name_set(&self, name: &str) -> String {
        let mut lineage = self.write_lineage();
        let name = (!name.is_empty()).then(|| name.to_string());
        std::mem::replace(&mut lineage.name, name).unwrap_or_default()
    }

    fn private_parent_set(&self, parent: Option<&NodeRef>, name: Option<&str>) -> (bool, Option<NodeRef>) {
        if let Some(candidate) = parent {
            if !self.is_valid_parent(candidate) {
                debug!(node = self.uid, parent = candidate.uid(), "refusing parent: cycle");
                return (false, Some(Arc::clone(candidate)));
            }
        }

        let mut lineage = self.write_lineage();
        let prev = lineage.parent.upgrade();
        let unchanged = match (&prev, parent) {
            (Some(prev), Some(next)) => Arc::ptr_eq(prev, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return (false, prev);
        }

        if let Some(candidate) = parent {
            let effective = name.or(lineage.name.as_deref()).unwrap_or_default();
            if candidate.kind == NodeKind::Map && effective.is_empty() {
                debug!(node = self.uid, parent = candidate.uid(), "refusing map parent: no name");
                return (false, None);
            }
        }

        if let Some(name) = name {
            lineage.name = (!name.is_empty()).then(|| name.to_string());
        }
        lineage.parent = parent.map(Arc::downgrade).unwrap_or_default();
        (true, prev)
    }

    fn private_release(&self, parent: &Node) -> bool {
        let mut lineage = self.write_lineage();
        if !std::ptr::eq(lineage.parent.as_ptr(), parent) {
            return false;
        }
        lineage.parent = Weak::new();
        true
    }

    fn private_erase(&self, child: &NodeRef) -> Key {
        let mut slots = self.write_slots();
        let relocate = self.notify_gate(true);

        if let Some(name) = child.name() {
            let key = Key::Name(name);
            if slots.get(&key).is_some_and(|value| value.owns(child))
                && slots.erase(&key, Some(&relocate)).is_some()
            {
                return key;
            }
        }

        let mut erased = Key::Empty;
        slots.for_each_mut(
            None,
            |key, value| {
                if value.owns(child) {
                    erased = key.clone();
                    return EachAction::EraseStop;
                }
                EachAction::Next
            },
            Some(&relocate),
        );
        erased
    }

    fn private_set(&self, key: &Key, value: Value) -> Result<(bool, TimedValue)> {
        let child = value.as_node().cloned();
        let (changed, replaced) = {
            let mut slots = self.write_slots();
            self.check_private_key(&slots, key)?;
            let relocate = self.notify_gate(true);
            let written = TimedValue::new(value);
            let stamp = written.timestamp();
            let (changed, replaced) = slots.set(key, written, Some(&relocate));
            if changed {
                if let Some(child) = &child {
                    self.validator.remove_duplicates(&mut slots, child, stamp, Some(&relocate));
                }
            }
            (changed, replaced)
        };
        if changed {
            self.release_replaced(&replaced, child.as_ref());
        }
        Ok((changed, replaced))
    }

    fn private_insert(&self, key: &Key, value: Value) -> Result<InsertOutcome> {
        let mut slots = self.write_slots();
        self.check_private_key(&slots, key)?;
        if let Some(child) = value.as_node() {
            if let Some((dup_key, existing)) = self.validator.find_duplicate(&slots, child) {
                return Ok(InsertOutcome::failed(dup_key, existing));
            }
        }
        let relocate = self.notify_gate(true);
        Ok(slots.emplace(key, TimedValue::new(value), Some(&relocate)))
    }
}
