use tracing::warn;

use super::{kind_for_key, set_at};
use crate::key::Key;
use crate::node::{Node, NodeKind, NodeRef};
use crate::path::Path;
use crate::value::Value;

/// Create an empty node; a `uid` of 0 picks the next process-wide id.
pub fn create(kind: NodeKind, name: Option<&str>, uid: u64) -> NodeRef {
    Node::create(kind, name, uid)
}

/// An array holding `values` in order. Values that cannot be stored (for
/// example a node that is an ancestor of nothing but itself) are skipped.
pub fn create_array(mut values: Vec<Value>, name: Option<&str>, uid: u64) -> NodeRef {
    let node = create(NodeKind::Array, name, uid);
    if let Err(err) = node.bulk_insert_at(&Key::end(), &mut values) {
        warn!(node = node.uid(), error = %err, "array fill failed");
    }
    node
}

/// A map holding `pairs`.
pub fn create_map(mut pairs: Vec<(Key, Value)>, name: Option<&str>, uid: u64) -> NodeRef {
    let node = create(NodeKind::Map, name, uid);
    node.bulk_set(&mut pairs);
    node
}

/// A tree built by setting each value at its path, creating intermediate
/// nodes on the way. The root is an array if the first path starts with an
/// index, a map otherwise.
pub fn create_complex(path_values: Vec<(Path, Value)>, name: Option<&str>, uid: u64) -> NodeRef {
    let kind = path_values
        .first()
        .map_or(NodeKind::Map, |(path, _)| kind_for_key(path.front()));
    let node = create(kind, name, uid);
    for (path, value) in path_values {
        set_at(&node, &path, value);
    }
    node
}
