use std::fmt;
use std::sync::Arc;

use super::{Node, NodeKind, NodeRef};
use crate::container::CopyAction;
use crate::key::Key;
use crate::path::Path;
use crate::timed::TimedValue;
use crate::Result;

/// Read-only handle to a node.
///
/// A view never mutates and never takes part in parent bookkeeping, which is
/// why [`Value::Alias`](crate::Value::Alias) can hold one in any number of
/// slots. Owning references read through a view come back as aliases, so
/// nothing reachable from a view is writable.
///
/// Two views are equal when they point at the same node.
#[derive(Clone)]
pub struct NodeView {
    node: NodeRef,
}

fn read_only((key, value): (Key, TimedValue)) -> (Key, TimedValue) {
    let timestamp = value.timestamp();
    (key, TimedValue::with_timestamp(value.to_read_only(), timestamp))
}

impl NodeView {
    pub fn new(node: NodeRef) -> Self {
        Self { node }
    }

    pub(crate) fn as_ptr(&self) -> *const Node {
        Arc::as_ptr(&self.node)
    }

    /// True if this view shows `node`.
    pub fn is_view_of(&self, node: &NodeRef) -> bool {
        Arc::ptr_eq(&self.node, node)
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    pub fn uid(&self) -> u64 {
        self.node.uid()
    }

    pub fn name(&self) -> Option<String> {
        self.node.name()
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.node.is_name(name)
    }

    pub fn parent(&self) -> Option<NodeView> {
        self.node.parent().map(NodeView::new)
    }

    pub fn len(&self) -> usize {
        self.node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    pub fn is_key_valid(&self, key: &Key) -> bool {
        self.node.is_key_valid(key)
    }

    pub fn get(&self, key: impl Into<Key>) -> TimedValue {
        let value = self.node.get(key);
        let timestamp = value.timestamp();
        TimedValue::with_timestamp(value.to_read_only(), timestamp)
    }

    pub fn for_patch<F>(&self, from: &Key, mut on_item: F) -> bool
    where
        F: FnMut(&Key, &TimedValue) -> bool,
    {
        self.node.for_patch(from, |key, value| {
            let timestamp = value.timestamp();
            on_item(key, &TimedValue::with_timestamp(value.to_read_only(), timestamp))
        })
    }

    pub fn bulk_get(&self, keys: &[Key]) -> Vec<(Key, TimedValue)> {
        self.node.bulk_get(keys).into_iter().map(read_only).collect()
    }

    pub fn bulk_get_all<F>(&self, from: &Key, on_item: F) -> Vec<(Key, TimedValue)>
    where
        F: FnMut(&Key, &TimedValue) -> CopyAction,
    {
        self.node
            .bulk_get_all(from, on_item)
            .into_iter()
            .map(read_only)
            .collect()
    }

    pub fn entries(&self) -> Vec<(Key, TimedValue)> {
        self.bulk_get_all(&Key::Empty, |_, _| CopyAction::Take)
    }

    /// Keys from the root of the viewed node's tree down to it.
    pub fn path(&self) -> Result<Path> {
        crate::ops::path_of(&self.node)
    }

    /// The viewed node, for crate-internal walkers that need identity or
    /// private bookkeeping.
    pub(crate) fn node(&self) -> &NodeRef {
        &self.node
    }
}

impl From<&NodeRef> for NodeView {
    fn from(node: &NodeRef) -> Self {
        NodeView::new(Arc::clone(node))
    }
}

impl PartialEq for NodeView {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for NodeView {}

impl fmt::Debug for NodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("uid", &self.uid())
            .field("kind", &self.kind())
            .finish()
    }
}
