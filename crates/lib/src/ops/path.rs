//! Path walkers and the slot operations built on them.

use std::sync::Arc;

use tracing::{debug, trace};

use super::kind_for_key;
use crate::container::CopyAction;
use crate::constants::MAX_TREE_DEPTH;
use crate::key::Key;
use crate::node::{InsertOutcome, Node, NodeError, NodeKind, NodeRef, NodeView};
use crate::path::Path;
use crate::timed::TimedValue;
use crate::value::Value;
use crate::Result;

/// Store `child` under `parent`.
///
/// An empty `key` means the child's name for a map parent and the end for an
/// array. With `replace`, an existing value at `key` is overwritten;
/// otherwise the call only fills a vacant slot.
pub fn node_insert(parent: &NodeRef, child: &NodeRef, replace: bool, key: &Key) -> InsertOutcome {
    let key = default_key(parent, key, || child.name());
    store(parent, Value::Node(Arc::clone(child)), replace, key)
}

/// [`node_insert`] for a read-only link.
pub fn node_insert_alias(parent: &NodeRef, child: &NodeView, replace: bool, key: &Key) -> InsertOutcome {
    let key = default_key(parent, key, || child.name());
    store(parent, Value::Alias(child.clone()), replace, key)
}

fn default_key(parent: &NodeRef, key: &Key, name: impl FnOnce() -> Option<String>) -> Key {
    if !key.is_empty() {
        return key.clone();
    }
    match parent.kind() {
        NodeKind::Map => Key::from(name().unwrap_or_default()),
        NodeKind::Array => Key::end(),
    }
}

fn store(parent: &NodeRef, value: Value, replace: bool, key: Key) -> InsertOutcome {
    if !parent.is_key_valid(&key) {
        return InsertOutcome::failed(key, TimedValue::default());
    }
    if !replace || key == Key::end() {
        return parent.insert(key, value);
    }
    let child = value.as_node().cloned();
    let (updated, current) = parent.set(key.clone(), value);
    // A node moved within the same array lands wherever the shift left it.
    let key = match (updated, child) {
        (true, Some(child)) => parent.key_of(&child).unwrap_or(key),
        _ => key,
    };
    InsertOutcome {
        succeeded: updated,
        existing: if updated { TimedValue::default() } else { current },
        key,
    }
}

/// The node stored at `key`.
///
/// With `kind` set, a missing slot (or one holding an empty value) gets a
/// fresh node of that kind; `convert` also replaces a non-node value or a
/// node of the other kind. The replacement is a compare-exchange against the
/// value just read, retried until it lands or the slot stops changing.
/// Without `kind`, any owning node is returned and nothing is created.
pub fn node_get_by_key(node: &NodeRef, key: &Key, kind: Option<NodeKind>, convert: bool) -> Option<NodeRef> {
    let mut current = node.get(key.clone()).into_value();
    let mut fresh: Option<NodeRef> = None;
    loop {
        if let Value::Node(found) = &current {
            if kind.is_none_or(|kind| kind == found.kind()) {
                return Some(Arc::clone(found));
            }
        }
        let kind = kind?;
        if !current.is_empty() && !convert {
            return None;
        }

        let candidate = Arc::clone(fresh.get_or_insert_with(|| Node::new(kind)));
        let (swapped, now) = node.compare_exchange(key.clone(), &current, &candidate);
        if swapped {
            trace!(node = node.uid(), %key, %kind, "created node on walk");
            return Some(candidate);
        }
        let now = now.into_value();
        if now == current {
            debug!(node = node.uid(), %key, "node creation refused");
            return None;
        }
        current = now;
    }
}

/// The node at `key` seen through `view`, owning or aliased.
pub fn node_view_get_by_key(view: &NodeView, key: &Key) -> Option<NodeView> {
    view.get(key.clone()).as_node_view()
}

/// Walk `path` from `node`.
///
/// With `kind` set, missing intermediate nodes are created with the kind
/// implied by the key that follows them, and the final node with `kind`.
/// An empty path yields `node` itself.
pub fn node_get(node: &NodeRef, path: &Path, kind: Option<NodeKind>, convert: bool) -> Option<NodeRef> {
    let mut rest = path.clone();
    let mut dest = Arc::clone(node);
    while rest.len() > 1 {
        let key = rest.pop_front();
        let next = kind.map(|_| kind_for_key(rest.front()));
        dest = node_get_by_key(&dest, &key, next, false)?;
    }
    if rest.is_empty() {
        return Some(dest);
    }
    node_get_by_key(&dest, rest.back(), kind, convert)
}

/// Read-only [`node_get`]; never creates anything.
pub fn node_view_get(view: &NodeView, path: &Path) -> Option<NodeView> {
    let mut dest = view.clone();
    for key in path {
        dest = node_view_get_by_key(&dest, key)?;
    }
    Some(dest)
}

/// Parent of the slot `path` addresses, created on demand if `create`.
fn slot_parent(node: &NodeRef, path: &Path, create: bool) -> Option<(NodeRef, Key)> {
    let (parent, last) = path.split_last();
    if parent.is_empty() {
        return Some((Arc::clone(node), last));
    }
    let kind = create.then(|| kind_for_key(&last));
    node_get(node, &parent, kind, false).map(|dest| (dest, last))
}

/// Value at `path`; empty if any step is missing.
pub fn at(node: &NodeRef, path: &Path) -> TimedValue {
    slot_parent(node, path, false)
        .map(|(dest, key)| dest.get(key))
        .unwrap_or_default()
}

/// Read-only [`at`].
pub fn view_at(view: &NodeView, path: &Path) -> TimedValue {
    let (parent, last) = path.split_last();
    node_view_get(view, &parent)
        .map(|dest| dest.get(last))
        .unwrap_or_default()
}

/// [`Node::set`] at `path`, creating intermediate nodes.
pub fn set_at(node: &NodeRef, path: &Path, value: impl Into<Value>) -> (bool, TimedValue) {
    match slot_parent(node, path, true) {
        Some((dest, key)) => dest.set(key, value),
        None => (false, TimedValue::default()),
    }
}

/// [`Node::insert`] at `path`, creating intermediate nodes.
pub fn insert_at(node: &NodeRef, path: &Path, value: impl Into<Value>) -> InsertOutcome {
    match slot_parent(node, path, true) {
        Some((dest, key)) => dest.insert(key, value),
        None => InsertOutcome::failed(path.back().clone(), TimedValue::default()),
    }
}

/// [`Node::erase`] at `path`. Nothing is created.
pub fn erase_at(node: &NodeRef, path: &Path) -> TimedValue {
    slot_parent(node, path, false)
        .map(|(dest, key)| dest.erase(key))
        .unwrap_or_default()
}

/// [`Node::increment`] at `path`, creating intermediate nodes.
pub fn increment_at(node: &NodeRef, path: &Path, delta: impl Into<Value>) -> TimedValue {
    slot_parent(node, path, true)
        .map(|(dest, key)| dest.increment(key, delta))
        .unwrap_or_default()
}

/// Append `value` to the array at `path`.
///
/// A missing slot becomes a new array. A slot holding anything else is
/// turned into an array whose first element is the previous value. Returns
/// the array's length afterwards, or 0 if no array could be reached.
pub fn emplace_to_array(node: &NodeRef, path: &Path, value: impl Into<Value>) -> usize {
    let Some((dest, key)) = slot_parent(node, path, true) else {
        return 0;
    };
    let existing = dest.get(key.clone()).into_value();
    let Some(array) = node_get_by_key(&dest, &key, Some(NodeKind::Array), true) else {
        return 0;
    };
    if existing.is_set() && !existing.owns(&array) {
        array.insert(Key::end(), existing);
    }
    array.insert(Key::end(), value);
    array.len()
}

/// Values under `path`: every element of an array, the value itself for a
/// scalar, nothing for a map or a missing slot.
pub fn values_list(view: &NodeView, path: &Path) -> Vec<TimedValue> {
    let found = view_at(view, path);
    match found.as_node_view() {
        Some(array) if array.kind() == NodeKind::Array => {
            array.entries().into_iter().map(|(_, value)| value).collect()
        }
        Some(_) => Vec::new(),
        None if found.is_set() => vec![found],
        None => Vec::new(),
    }
}

/// Node-valued slots of the node at `path`; aliases too with
/// `include_aliases`.
pub fn nodes_list(node: &NodeRef, include_aliases: bool, path: &Path) -> Vec<(Key, TimedValue)> {
    let Some(dest) = node_get(node, path, None, false) else {
        return Vec::new();
    };
    dest.bulk_get_all(&Key::Empty, |_, value| match value.value() {
        Value::Node(_) => CopyAction::Take,
        Value::Alias(_) if include_aliases => CopyAction::Take,
        _ => CopyAction::Skip,
    })
}

/// Read-only [`nodes_list`]; everything comes back as aliases.
pub fn node_views_list(view: &NodeView, path: &Path) -> Vec<(Key, TimedValue)> {
    let Some(dest) = node_view_get(view, path) else {
        return Vec::new();
    };
    dest.bulk_get_all(&Key::Empty, |_, value| {
        if value.is_node() {
            CopyAction::Take
        } else {
            CopyAction::Skip
        }
    })
}

/// Keys from the root of `node`'s tree down to `node`.
pub fn path_of(node: &NodeRef) -> Result<Path> {
    let mut path = Path::new();
    let mut current = Arc::clone(node);
    while let Some(parent) = current.parent() {
        if path.len() >= MAX_TREE_DEPTH {
            return Err(NodeError::DepthExceeded { depth: MAX_TREE_DEPTH }.into());
        }
        let key = parent.key_of(&current).ok_or_else(|| NodeError::Inconsistent {
            reason: format!("node {} is not held by its parent {}", current.uid(), parent.uid()),
        })?;
        path.push_front(key);
        current = parent;
    }
    Ok(path)
}
