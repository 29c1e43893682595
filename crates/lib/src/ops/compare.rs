//! Structural comparison and tree-to-tree copying.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, trace};

use super::clone_node;
use crate::constants::MAX_TREE_DEPTH;
use crate::container::CopyAction;
use crate::key::Key;
use crate::node::{NodeRef, NodeView};
use crate::timed::TimedValue;
use crate::value::Value;

/// Called for each differing slot with the left node, the key and both
/// values (`Value::Empty` on the side that lacks the key). Returning `true`
/// accepts the difference as the result; `false` ignores it and continues.
pub type DifferenceHook<'a> = &'a mut dyn FnMut(&NodeView, &Key, &Value, &Value) -> bool;

/// Compare two nodes slot by slot in key order.
///
/// Nodes of different kinds order by kind. A key present only on the left
/// makes the left greater; only on the right, smaller. With `unwrap_nodes`,
/// two nested nodes of the same kind are compared recursively once the
/// current level is done; otherwise they compare by identity.
pub fn compare(left: &NodeView, right: &NodeView, unwrap_nodes: bool, on_difference: DifferenceHook<'_>) -> Ordering {
    compare_at_depth(left, right, unwrap_nodes, on_difference, 0)
}

/// [`compare`] that unwraps nested nodes and stops at the first difference.
pub fn compare_strict(left: &NodeView, right: &NodeView) -> Ordering {
    compare(left, right, true, &mut |_, _, _, _| true)
}

fn set_entries(view: &NodeView) -> Vec<(Key, TimedValue)> {
    view.bulk_get_all(&Key::Empty, |_, value| {
        if value.is_set() {
            CopyAction::Take
        } else {
            CopyAction::Skip
        }
    })
}

fn compare_at_depth(
    left: &NodeView,
    right: &NodeView,
    unwrap_nodes: bool,
    on_difference: DifferenceHook<'_>,
    depth: usize,
) -> Ordering {
    if left == right {
        return Ordering::Equal;
    }
    if left.kind() != right.kind() {
        return left.kind().cmp(&right.kind());
    }
    if depth > MAX_TREE_DEPTH {
        debug!(left = left.uid(), right = right.uid(), "comparison too deep, using identity");
        return left.uid().cmp(&right.uid());
    }

    let mut deferred: Vec<(NodeView, NodeView)> = Vec::new();
    let mut rights = set_entries(right).into_iter().peekable();
    for (key, lv) in set_entries(left) {
        while let Some((rkey, rv)) = rights.next_if(|(rkey, _)| *rkey < key) {
            if on_difference(left, &rkey, &Value::Empty, rv.value()) {
                return Ordering::Less;
            }
        }
        let Some((_, rv)) = rights.next_if(|(rkey, _)| *rkey == key) else {
            if on_difference(left, &key, lv.value(), &Value::Empty) {
                return Ordering::Greater;
            }
            continue;
        };
        if lv.value() == rv.value() {
            continue;
        }
        if unwrap_nodes {
            if let (Some(l), Some(r)) = (lv.as_node_view(), rv.as_node_view()) {
                if l.kind() == r.kind() {
                    deferred.push((l, r));
                    continue;
                }
            }
        }
        let ord = lv.value().compare(rv.value());
        if ord != Ordering::Equal && on_difference(left, &key, lv.value(), rv.value()) {
            return ord;
        }
    }
    for (rkey, rv) in rights {
        if on_difference(left, &rkey, &Value::Empty, rv.value()) {
            return Ordering::Less;
        }
    }

    for (l, r) in deferred {
        let ord = compare_at_depth(&l, &r, unwrap_nodes, on_difference, depth + 1);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Apply `patch` onto `target`.
///
/// A null in the patch erases the key; a nested node meeting a node of the
/// same kind is applied recursively; a nested node anywhere else is stored
/// as a deep copy; everything else is set. Aliases in the patch are set as
/// aliases. Returns the number of values written and erased.
pub fn patch_apply(target: &NodeRef, patch: &NodeView) -> (usize, usize) {
    if patch.is_view_of(target) {
        return (0, 0);
    }
    let (mut added, mut erased) = (0, 0);
    for (key, value) in patch.node().entries() {
        let value = value.into_value();
        if value.is_null() {
            if target.erase(key).is_set() {
                erased += 1;
            }
            continue;
        }

        let value = match value {
            Value::Node(nested) => {
                let current = target.get(key.clone());
                if let Some(existing) = current.as_node().filter(|node| node.kind() == nested.kind()) {
                    let (a, e) = patch_apply(existing, &nested.view());
                    added += a;
                    erased += e;
                    continue;
                }
                match clone_node(&Value::Node(nested), true, None, None, 0) {
                    Some(copy) => Value::Node(copy),
                    None => continue,
                }
            }
            other => other,
        };
        if target.set(key, value).0 {
            added += 1;
        }
    }
    trace!(target = target.uid(), patch = patch.uid(), added, erased, "patch applied");
    (added, erased)
}

/// Copy the slots of `source` into `dest`.
///
/// Keys already set in `dest` are left alone unless `overwrite`. Where both
/// sides hold a node, the copy descends while `depth` allows. A source node
/// landing on a non-node is stored as an alias with `nodes_as_aliases`,
/// otherwise as a deep copy. Returns the number of slots written.
pub fn copy_to(source: &NodeView, dest: &NodeRef, overwrite: bool, nodes_as_aliases: bool, depth: usize) -> usize {
    if source.is_view_of(dest) {
        return 0;
    }
    let mut copied = 0;
    let mut descend: Vec<(NodeRef, NodeView)> = Vec::new();
    for (key, value) in source.node().entries() {
        let current = dest.get(key.clone());
        if current.is_set() && !overwrite {
            continue;
        }

        let value = value.into_value();
        let source_node = match &value {
            Value::Node(node) => Some(node.view()),
            Value::Alias(view) => Some(view.clone()),
            _ => None,
        };
        let Some(source_node) = source_node else {
            if dest.set(key, value).0 {
                copied += 1;
            }
            continue;
        };

        if let Some(existing) = current.as_node() {
            if depth > 0 {
                descend.push((Arc::clone(existing), source_node));
            }
            continue;
        }
        let stored = if nodes_as_aliases {
            Value::Alias(source_node)
        } else {
            match clone_node(&Value::Alias(source_node), true, None, None, 0) {
                Some(copy) => Value::Node(copy),
                None => continue,
            }
        };
        if dest.set(key, stored).0 {
            copied += 1;
        }
    }

    for (next_dest, next_source) in descend {
        copied += copy_to(&next_source, &next_dest, overwrite, nodes_as_aliases, depth - 1);
    }
    copied
}
