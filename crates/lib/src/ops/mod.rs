//! Whole-tree operations built on the node API.
//!
//! Nothing here reaches into a node's internals except [`repair`], which
//! needs the one-sided parent updates to put a parent pointer back.
//!
//! Path operations walk one segment at a time and each step is its own
//! critical section: a concurrent writer can restructure the tree between
//! two steps of the same walk.

mod clone;
mod compare;
mod create;
mod path;
mod repair;

pub use clone::{CloneHook, clone_node, clone_tree};
pub use compare::{DifferenceHook, compare, compare_strict, copy_to, patch_apply};
pub use create::{create, create_array, create_complex, create_map};
pub use path::{
    at, emplace_to_array, erase_at, increment_at, insert_at, node_get, node_get_by_key, node_insert,
    node_insert_alias, node_view_get, node_view_get_by_key, node_views_list, nodes_list, path_of, set_at,
    values_list, view_at,
};
pub use repair::{Misparented, parents_check, parents_fix};

use crate::key::Key;
use crate::node::NodeKind;
use crate::value::Value;

/// What kind of node, if any, a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    NotNode,
    Map,
    ConstMap,
    Array,
    ConstArray,
}

pub fn node_type(value: &Value) -> NodeType {
    match value {
        Value::Node(node) => match node.kind() {
            NodeKind::Map => NodeType::Map,
            NodeKind::Array => NodeType::Array,
        },
        Value::Alias(view) => match view.kind() {
            NodeKind::Map => NodeType::ConstMap,
            NodeKind::Array => NodeType::ConstArray,
        },
        _ => NodeType::NotNode,
    }
}

/// Node kind addressed by a key: indices live in arrays, names in maps.
pub fn kind_for_key(key: &Key) -> NodeKind {
    match key {
        Key::Index(_) => NodeKind::Array,
        _ => NodeKind::Map,
    }
}
