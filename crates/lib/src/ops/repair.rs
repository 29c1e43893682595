//! Detection and repair of children whose parent pointer disagrees with the
//! node that holds them.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::container::CopyAction;
use crate::key::Key;
use crate::node::{Node, NodeError, NodePrivate, NodeRef};
use crate::value::Value;
use crate::Result;

/// A child held by `holder` under `key` whose parent pointer is elsewhere.
#[derive(Debug, Clone)]
pub struct Misparented {
    pub child: NodeRef,
    pub holder: NodeRef,
    pub key: Key,
}

/// Walk the tree under `root` and report every owned child whose parent
/// pointer does not name its holder. With `include_aliases` the walk also
/// descends through aliased nodes. Each node is visited once.
pub fn parents_check(root: &NodeRef, include_aliases: bool) -> Vec<Misparented> {
    let mut found = Vec::new();
    let mut seen: HashSet<*const Node> = HashSet::new();
    seen.insert(Arc::as_ptr(root));
    let mut pending = vec![Arc::clone(root)];

    while let Some(holder) = pending.pop() {
        let children = holder.bulk_get_all(&Key::Empty, |_, value| match value.value() {
            Value::Node(_) => CopyAction::Take,
            Value::Alias(_) if include_aliases => CopyAction::Take,
            _ => CopyAction::Skip,
        });
        for (key, value) in children {
            let (child, owned) = match value.into_value() {
                Value::Node(child) => (child, true),
                Value::Alias(view) => (Arc::clone(view.node()), false),
                _ => continue,
            };
            if owned && !child.parent().is_some_and(|parent| Arc::ptr_eq(&parent, &holder)) {
                debug!(child = child.uid(), holder = holder.uid(), %key, "parent pointer mismatch");
                found.push(Misparented {
                    child: Arc::clone(&child),
                    holder: Arc::clone(&holder),
                    key,
                });
            }
            if seen.insert(Arc::as_ptr(&child)) {
                pending.push(child);
            }
        }
    }
    found
}

/// Point each reported child back at its holder. Returns the number of
/// pointers changed; fails on the first child that cannot be re-attached.
pub fn parents_fix(misparented: &[Misparented]) -> Result<usize> {
    let mut fixed = 0;
    for entry in misparented {
        if entry.child.parent().is_some_and(|parent| Arc::ptr_eq(&parent, &entry.holder)) {
            continue;
        }
        let (changed, _) = entry
            .child
            .private_parent_set(Some(&entry.holder), entry.key.as_name());
        if !changed {
            return Err(NodeError::Inconsistent {
                reason: format!(
                    "node {} cannot be re-attached to {} under '{}'",
                    entry.child.uid(),
                    entry.holder.uid(),
                    entry.key
                ),
            }
            .into());
        }
        fixed += 1;
    }
    if fixed > 0 {
        info!(fixed, "repaired parent pointers");
    }
    Ok(fixed)
}
