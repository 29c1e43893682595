use std::sync::Arc;

use tracing::trace;

use super::create;
use crate::constants::MAX_TREE_DEPTH;
use crate::container::CopyAction;
use crate::key::Key;
use crate::node::{NodeRef, NodeView};
use crate::value::Value;

/// Per-slot hook for [`clone_node`]: may rewrite the value before it is
/// copied, skip it, or stop the copy.
pub type CloneHook<'a> = &'a mut dyn FnMut(&NodeView, &Key, &mut Value) -> CopyAction;

/// Copy the node `value` refers to (owning or alias) into a new node.
///
/// With `deep`, nested owning nodes are cloned recursively (nested clones get
/// no name and a fresh uid); otherwise they are copied as aliases. Aliases
/// stay aliases either way. Returns `None` if `value` is not a node.
pub fn clone_node(
    value: &Value,
    deep: bool,
    mut on_item: Option<CloneHook<'_>>,
    name: Option<&str>,
    uid: u64,
) -> Option<NodeRef> {
    let source = match value {
        Value::Node(node) => Arc::clone(node),
        Value::Alias(view) => Arc::clone(view.node()),
        _ => return None,
    };
    Some(clone_at_depth(&source, deep, &mut on_item, name, uid, 0))
}

/// Deep copy of `node` keeping its name; the copy has a fresh uid.
pub fn clone_tree(node: &NodeRef) -> NodeRef {
    let name = node.name();
    clone_at_depth(node, true, &mut None, name.as_deref(), 0, 0)
}

fn clone_at_depth(
    source: &NodeRef,
    deep: bool,
    on_item: &mut Option<CloneHook<'_>>,
    name: Option<&str>,
    uid: u64,
    depth: usize,
) -> NodeRef {
    let view = source.view();
    let mut values: Vec<(Key, Value)> = Vec::with_capacity(source.len());
    for (key, timed) in source.entries() {
        let mut value = timed.into_value();
        let action = match on_item.as_deref_mut() {
            Some(hook) => hook(&view, &key, &mut value),
            None => CopyAction::Take,
        };
        if !action.is_take() {
            if action.is_stop() {
                break;
            }
            continue;
        }
        let copied = match value {
            Value::Node(child) if deep && depth < MAX_TREE_DEPTH => {
                Value::Node(clone_at_depth(&child, deep, on_item, None, 0, depth + 1))
            }
            Value::Node(child) => Value::Alias(child.view()),
            other => other,
        };
        values.push((key, copied));
        if action.is_stop() {
            break;
        }
    }

    let copy = create(source.kind(), name, uid);
    let stored = copy.bulk_insert(&mut values);
    trace!(source = source.uid(), copy = copy.uid(), stored, "cloned node");
    copy
}
