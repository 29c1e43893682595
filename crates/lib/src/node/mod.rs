//! Tree nodes.
//!
//! A [`Node`] pairs a [`Container`] of timestamped slots with a weak
//! back-reference to its parent, an optional name, and a registry of change
//! listeners. Nodes are always handled through [`NodeRef`] (`Arc<Node>`);
//! the parent pointer is a `Weak`, so dropping the last owning reference frees
//! the node regardless of its position in the tree.
//!
//! # Ownership
//!
//! Storing a [`Value::Node`] in a slot makes the holder that node's parent,
//! and the node is removed from wherever it lived before. [`Value::Alias`]
//! links are readable only and never touch the parent bookkeeping.
//!
//! # Locking
//!
//! Each node has two locks: one over its slots and one over its name and
//! parent pointer. Operations that touch two nodes (moving a child between
//! parents) lock them one after the other, never together, so a racing reader
//! may briefly see a child whose parent pointer is ahead of the parent's
//! slots. `ops::parents_check` reports such mismatches.
//!
//! Listeners run while the slot lock is held exclusively and must not call
//! back into the node that notified them.
//!
//! ```
//! use arbor::{Node, NodeKind};
//!
//! let root = Node::named(NodeKind::Map, "root");
//! let child = Node::new(NodeKind::Array);
//! assert!(root.set("items", &child).0);
//! assert_eq!(child.name().as_deref(), Some("items"));
//! assert!(std::sync::Arc::ptr_eq(&child.parent().unwrap(), &root));
//! ```

mod adapt;
mod atomic;
mod bulk;
pub mod errors;
mod listeners;
mod private;
mod validate;
mod view;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::{debug, trace, warn};

pub use errors::NodeError;
pub use listeners::{Listener, Listeners, Reason};
pub(crate) use private::NodePrivate;
pub use validate::{DuplicatePolicy, LinearScan, UniqueKeys};
pub use view::NodeView;

pub(crate) use adapt::container_key;

use crate::constants::MAX_TREE_DEPTH;
use crate::container::{Container, EachAction};
use crate::key::Key;
use crate::timed::TimedValue;
use crate::value::Value;
use crate::Result;

pub use crate::container::Emplaced as InsertOutcome;

/// Owning handle to a node.
pub type NodeRef = Arc<Node>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Map,
    Array,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Map => write!(f, "map"),
            NodeKind::Array => write!(f, "array"),
        }
    }
}

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Next process-wide node id.
pub fn next_uid() -> u64 {
    NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Default)]
struct Lineage {
    parent: Weak<Node>,
    name: Option<String>,
}

pub struct Node {
    uid: u64,
    kind: NodeKind,
    this: Weak<Node>,
    slots: RwLock<Container>,
    lineage: RwLock<Lineage>,
    listeners: Listeners,
    validator: Box<dyn DuplicatePolicy>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("uid", &self.uid)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Create a node. A `uid` of 0 draws the next process-wide id; an empty
    /// name is the same as none.
    pub fn create(kind: NodeKind, name: Option<&str>, uid: u64) -> NodeRef {
        let uid = if uid == 0 { next_uid() } else { uid };
        let name = name.filter(|n| !n.is_empty()).map(str::to_string);
        Arc::new_cyclic(|this| Node {
            uid,
            kind,
            this: this.clone(),
            slots: RwLock::new(Container::for_node(kind)),
            lineage: RwLock::new(Lineage {
                parent: Weak::new(),
                name,
            }),
            listeners: Listeners::default(),
            validator: validate::policy_for(kind),
        })
    }

    pub fn new(kind: NodeKind) -> NodeRef {
        Self::create(kind, None, 0)
    }

    pub fn named(kind: NodeKind, name: &str) -> NodeRef {
        Self::create(kind, Some(name), 0)
    }

    fn read_slots(&self) -> RwLockReadGuard<'_, Container> {
        self.slots.read().unwrap_or_else(|poisoned| {
            warn!(node = self.uid, "slot lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, Container> {
        self.slots.write().unwrap_or_else(|poisoned| {
            warn!(node = self.uid, "slot lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_lineage(&self) -> RwLockReadGuard<'_, Lineage> {
        self.lineage.read().unwrap_or_else(|poisoned| {
            warn!(node = self.uid, "lineage lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_lineage(&self) -> RwLockWriteGuard<'_, Lineage> {
        self.lineage.write().unwrap_or_else(|poisoned| {
            warn!(node = self.uid, "lineage lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Gate that runs this node's listeners.
    fn notify_gate(&self, no_discard: bool) -> impl Fn(&Key, &TimedValue, &TimedValue) -> bool + '_ {
        move |key: &Key, from: &TimedValue, to: &TimedValue| {
            self.listeners.notify(self, key, from, to, no_discard)
        }
    }

    /// Resolve the start key of a scan; `Key::Empty` scans from the beginning.
    fn start_key(slots: &Container, from: &Key) -> Option<Key> {
        (!from.is_empty()).then(|| container_key(slots, from, true))
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn name(&self) -> Option<String> {
        self.read_lineage().name.clone()
    }

    /// `true` if the node is named `name`; an empty `name` matches an unnamed
    /// node.
    pub fn is_name(&self, name: &str) -> bool {
        match &self.read_lineage().name {
            Some(current) => current == name,
            None => name.is_empty(),
        }
    }

    /// Rename the node.
    ///
    /// While attached to a map the name is also the parent's key: with
    /// `update_parent` the parent slot is moved to the new key, otherwise the
    /// rename is refused. Returns success and the previous name.
    pub fn set_name(&self, name: &str, update_parent: bool) -> (bool, String) {
        let mut lineage = self.write_lineage();
        let current = lineage.name.clone().unwrap_or_default();
        if current == name {
            return (true, current);
        }
        if lineage.name.is_none() {
            lineage.name = Some(name.to_string());
            return (true, String::new());
        }

        let parent = lineage.parent.upgrade();
        if let Some(parent) = parent.filter(|p| p.kind == NodeKind::Map) {
            if !update_parent {
                debug!(node = self.uid, name, "rename refused while attached to a map");
                return (false, current);
            }
            drop(lineage);
            return match parent.key_change(&Key::from(current.as_str()), &Key::from(name)) {
                Ok(moved) => (moved, current),
                Err(err) => {
                    warn!(node = self.uid, name, error = %err, "rename left the parent inconsistent");
                    (false, current)
                }
            };
        }

        lineage.name = (!name.is_empty()).then(|| name.to_string());
        (true, current)
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.read_lineage().parent.upgrade()
    }

    /// Key of the slot holding an owning reference to `child`, if any.
    pub fn key_of(&self, child: &NodeRef) -> Option<Key> {
        validate::find_owning(&self.read_slots(), child)
    }

    /// Move this node under `parent` (or detach it with `None`).
    ///
    /// `name` overrides the node's name first. A map parent stores the node
    /// under its name, so an unnamed node cannot join one; an array parent
    /// appends it. The node is then erased from its previous parent. Returns
    /// success and the previous parent.
    pub fn set_parent(&self, parent: Option<&NodeRef>, name: Option<&str>) -> (bool, Option<NodeRef>) {
        let (changed, prev) = self.private_parent_set(parent, name);
        if !changed {
            return (false, prev);
        }
        let Some(me) = self.this.upgrade() else {
            return (false, prev);
        };

        if let Some(prev) = &prev {
            prev.private_erase(&me);
        }

        if let Some(parent) = parent {
            let attached = match parent.kind {
                NodeKind::Map => {
                    let key = Key::from(self.name().unwrap_or_default());
                    parent.private_set(&key, Value::Node(Arc::clone(&me))).map(|(ok, _)| ok)
                }
                NodeKind::Array => parent
                    .private_insert(&Key::end(), Value::Node(Arc::clone(&me)))
                    .map(|outcome| outcome.succeeded),
            };
            match attached {
                Ok(true) => trace!(node = self.uid, parent = parent.uid, "attached to parent"),
                Ok(false) => warn!(node = self.uid, parent = parent.uid, "parent pointer set but slot not written"),
                Err(err) => warn!(node = self.uid, parent = parent.uid, error = %err, "attach failed"),
            }
        }
        (true, prev)
    }

    /// Remove this node from its parent. Returns the former parent.
    pub fn detach(&self) -> Option<NodeRef> {
        self.set_parent(None, None).1
    }

    /// Number of ancestors above this node.
    pub fn depth(&self) -> Result<usize> {
        let mut depth = 0usize;
        let mut check = self.parent();
        while let Some(node) = check {
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(NodeError::DepthExceeded { depth: MAX_TREE_DEPTH }.into());
            }
            check = node.parent();
        }
        Ok(depth)
    }

    /// Move the value at `from` to the vacant slot `to` (same key kind).
    ///
    /// A moved node under a name key takes the new name. `Ok(false)` when the
    /// keys are unusable, `to` is occupied, or a listener refused the erase.
    pub fn key_change(&self, from: &Key, to: &Key) -> Result<bool> {
        let unusable = |key: &Key| key.is_empty() || key.as_name().is_some_and(str::is_empty);
        if unusable(from) || unusable(to) || !from.same_kind(to) {
            return Ok(false);
        }

        let moved = {
            let mut slots = self.write_slots();
            let key_to = container_key(&slots, to, false);
            if !slots.is_key_valid(&key_to) {
                return Ok(false);
            }
            if slots.get(&key_to).is_some_and(|v| !v.is_tombstone()) {
                debug!(node = self.uid, %from, %to, "key change target occupied");
                return Ok(false);
            }

            let key_from = container_key(&slots, from, true);
            let notify = self.notify_gate(false);
            let Some(moved) = slots.erase(&key_from, Some(&notify)) else {
                return Ok(false);
            };

            let relocate = self.notify_gate(true);
            let (written, _) = slots.set(&key_to, moved.clone(), Some(&relocate));
            if !written && moved.is_set() {
                return Err(NodeError::Inconsistent {
                    reason: format!("value erased from '{from}' could not be written to '{to}'"),
                }
                .into());
            }
            moved
        };

        if let (Some(node), Some(name)) = (moved.as_node(), to.as_name()) {
            node.private_name_set(name);
        }
        trace!(node = self.uid, %from, %to, "key changed");
        Ok(true)
    }

    /// Register a change listener. An `id` of 0 picks a fresh id.
    pub fn on_change_add<F>(&self, id: u64, listener: F) -> u64
    where
        F: Fn(Reason, &Node, &Key, &TimedValue, &TimedValue) -> Option<bool> + Send + Sync + 'static,
    {
        self.listeners.add(id, listener)
    }

    pub fn on_change_remove(&self, id: u64) -> bool {
        self.listeners.remove(id)
    }

    pub fn on_change_reset(&self) -> usize {
        self.listeners.reset()
    }

    pub fn is_key_valid(&self, key: &Key) -> bool {
        let slots = self.read_slots();
        slots.is_key_valid(&container_key(&slots, key, true))
    }

    /// Drop every slot, detaching owned children. Listeners are not consulted.
    pub fn clear(&self) {
        let mut owned = Vec::new();
        {
            let mut slots = self.write_slots();
            slots.scan(None, |_, value| {
                owned.extend(value.as_node().cloned());
                false
            });
            slots.clear();
        }
        for child in owned {
            child.private_release(self);
        }
    }

    pub fn len(&self) -> usize {
        self.read_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The slot at `key`; a default (absent) value if there is none. An index
    /// on a map addresses the n-th entry.
    pub fn get(&self, key: impl Into<Key>) -> TimedValue {
        let key = key.into();
        let slots = self.read_slots();
        slots
            .get(&container_key(&slots, &key, true))
            .cloned()
            .unwrap_or_default()
    }

    /// Read-only scan including erased entries (tombstones), starting at
    /// `from` (`Key::Empty` for the beginning). The callback returns `true`
    /// to stop.
    pub fn for_patch<F>(&self, from: &Key, on_item: F) -> bool
    where
        F: FnMut(&Key, &TimedValue) -> bool,
    {
        let slots = self.read_slots();
        let start = Self::start_key(&slots, from);
        slots.scan_history(start.as_ref(), on_item)
    }

    /// Mutating scan. Edits and erasures made by the callback go through the
    /// listeners; nodes that leave this container are detached and nodes that
    /// arrive are adopted afterwards. Storing an ancestor is silently undone.
    pub fn for_each<F>(&self, from: &Key, mut on_item: F) -> bool
    where
        F: FnMut(&Key, &mut TimedValue) -> EachAction,
    {
        let mut released: Vec<NodeRef> = Vec::new();
        let mut stored: Vec<(NodeRef, Key, i64)> = Vec::new();
        let mut adopted: Vec<(NodeRef, Key)> = Vec::new();

        let found = {
            let mut slots = self.write_slots();
            let start = Self::start_key(&slots, from);
            let notify = self.notify_gate(false);
            let found = slots.for_each_mut(
                start.as_ref(),
                |key, value| {
                    let before = value.clone();
                    let action = on_item(key, value);
                    if action.is_erase() {
                        released.extend(before.as_node().cloned());
                    } else if *value != before {
                        if !self.is_valid_child(value).0 {
                            debug!(node = self.uid, %key, "refusing to store an ancestor");
                            *value = before;
                            return action;
                        }
                        released.extend(before.as_node().cloned());
                        let edited = value.value().clone();
                        value.assign(edited);
                        if let Some(node) = value.as_node() {
                            stored.push((Arc::clone(node), key.clone(), value.timestamp()));
                        }
                    }
                    action
                },
                Some(&notify),
            );

            // Only what the listeners let through.
            released.retain(|node| validate::find_owning(&slots, node).is_none());
            let relocate = self.notify_gate(true);
            // A node stored twice in one pass keeps its last slot.
            while let Some((node, key, stamp)) = stored.pop() {
                for (_, earlier, _) in stored.iter().filter(|(other, _, _)| Arc::ptr_eq(other, &node)) {
                    // Arrays drop these by stamp in `settle`.
                    if self.kind == NodeKind::Map && slots.get(earlier).is_some_and(|value| value.owns(&node)) {
                        slots.erase(earlier, Some(&relocate));
                    }
                }
                stored.retain(|(other, _, _)| !Arc::ptr_eq(other, &node));
                if let Some(landed) = self.settle(&mut slots, &node, &key, stamp, Some(&relocate)) {
                    adopted.push((node, landed));
                }
            }
            found
        };

        for node in released {
            node.private_release(self);
        }
        for (node, key) in adopted {
            self.adopt(&node, key.as_name());
        }
        found
    }

    /// Overwrite the slot at `key`. Returns whether it changed and the
    /// previous value (the current value when nothing changed).
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> (bool, TimedValue) {
        let key = key.into();
        let value = value.into();
        let (valid, child) = self.is_valid_child(&value);
        if !valid {
            debug!(node = self.uid, %key, "refusing to store an ancestor");
            return (false, TimedValue::default());
        }

        let (key_set, replaced) = {
            let mut slots = self.write_slots();
            let mut key_set = container_key(&slots, &key, true);
            let notify = self.notify_gate(false);
            let written = TimedValue::new(value);
            let stamp = written.timestamp();
            let (changed, replaced) = slots.set(&key_set, written, Some(&notify));
            if !changed {
                debug!(node = self.uid, %key, "set rejected");
                return (false, replaced);
            }
            if let Some(child) = &child {
                let relocate = self.notify_gate(true);
                if let Some(landed) = self.validator.remove_duplicates(&mut slots, child, stamp, Some(&relocate)) {
                    key_set = landed;
                }
            }
            (key_set, replaced)
        };
        trace!(node = self.uid, key = %key_set, "set");

        self.release_replaced(&replaced, child.as_ref());
        if let Some(child) = child {
            self.adopt(&child, key_set.as_name());
        }
        (true, replaced)
    }

    /// Store `value` only if the slot is vacant.
    ///
    /// An empty key appends on arrays and uses the value's node name on maps.
    /// An owning reference already held by this array is refused and the
    /// outcome carries the key it sits under.
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) -> InsertOutcome {
        let key = key.into();
        let value = value.into();
        let (valid, child) = self.is_valid_child(&value);
        if !valid {
            debug!(node = self.uid, %key, "refusing to insert an ancestor");
            return InsertOutcome::failed(key, TimedValue::default());
        }
        let key = self.insert_key(key, &value);

        let outcome = {
            let mut slots = self.write_slots();
            if let Some(child) = &child {
                if let Some((dup_key, _)) = self.validator.find_duplicate(&slots, child) {
                    debug!(node = self.uid, key = %dup_key, "node already stored");
                    return InsertOutcome::failed(dup_key, TimedValue::default());
                }
            }
            let notify = self.notify_gate(false);
            let key_insert = container_key(&slots, &key, false);
            slots.emplace(&key_insert, TimedValue::new(value), Some(&notify))
        };
        if !outcome.succeeded {
            debug!(node = self.uid, %key, "insert rejected");
            return outcome;
        }
        trace!(node = self.uid, key = %outcome.key, "inserted");

        if let Some(child) = child {
            self.adopt(&child, outcome.key.as_name());
        }
        outcome
    }

    fn insert_key(&self, key: Key, value: &Value) -> Key {
        if !key.is_empty() {
            return key;
        }
        match self.kind {
            NodeKind::Array => Key::end(),
            NodeKind::Map => value
                .as_node_view()
                .and_then(|view| view.name())
                .map(Key::Name)
                .unwrap_or_default(),
        }
    }

    /// Erase the slot at `key`, returning what it held (absent if nothing was
    /// erased). An erased owning reference is detached.
    pub fn erase(&self, key: impl Into<Key>) -> TimedValue {
        let key = key.into();
        let erased = {
            let mut slots = self.write_slots();
            let key_erase = container_key(&slots, &key, true);
            let notify = self.notify_gate(false);
            slots.erase(&key_erase, Some(&notify))
        };
        let Some(erased) = erased else {
            debug!(node = self.uid, %key, "nothing erased");
            return TimedValue::default();
        };
        trace!(node = self.uid, %key, "erased");

        if let Some(child) = erased.as_node() {
            child.private_release(self);
        }
        erased
    }

    /// Detach a node that was overwritten, unless it is being stored again.
    fn release_replaced(&self, replaced: &TimedValue, keep: Option<&NodeRef>) {
        if let Some(old) = replaced.as_node() {
            if !keep.is_some_and(|keep| Arc::ptr_eq(keep, old)) {
                old.private_release(self);
            }
        }
    }

    /// Read-only handle to this node.
    pub fn view(self: &Arc<Self>) -> NodeView {
        NodeView::new(Arc::clone(self))
    }
}
