use arbor::{Key, Node, NodeKind, Value, ops, path};

use crate::helpers::child;

#[test]
fn compare_exchange_only_on_match() {
    let map = Node::new(NodeKind::Map);
    map.set("state", "idle");

    let (swapped, current) = map.compare_exchange("state", &Value::from("busy"), "done");
    assert!(!swapped);
    assert!(current == "idle");
    assert!(map.get("state") == "idle");

    let (swapped, previous) = map.compare_exchange("state", &Value::from("idle"), "busy");
    assert!(swapped);
    assert!(previous == "idle");
    assert!(map.get("state") == "busy");
}

#[test]
fn compare_exchange_inserts_into_vacant_slots() {
    let array = Node::new(NodeKind::Array);
    assert!(array.compare_exchange(0usize, &Value::Null, 1i64).0);
    assert!(array.get(0usize) == 1i64);

    let map = Node::new(NodeKind::Map);
    map.set("gone", 1i64);
    map.erase("gone");
    assert!(map.compare_exchange("gone", &Value::from(""), 2i64).0);
    assert!(map.get("gone") == 2i64);
}

#[test]
fn compare_exchange_replacing_a_node_releases_it() {
    let map = Node::new(NodeKind::Map);
    let old = Node::new(NodeKind::Map);
    let new = Node::new(NodeKind::Map);
    map.set("slot", &old);

    assert!(map.compare_exchange("slot", &Value::from(&old), &new).0);
    assert!(old.parent().is_none());
    assert!(std::sync::Arc::ptr_eq(&child(&map, "slot"), &new));
    assert!(new.is_name("slot"));
}

#[test]
fn append_and_increment_through_paths() {
    let root = Node::new(NodeKind::Map);
    ops::increment_at(&root, &path!["stats", "hits"], 1i64);
    ops::increment_at(&root, &path!["stats", "hits"], 2i64);
    assert!(ops::at(&root, &path!["stats", "hits"]) == 3i64);

    let stats = child(&root, "stats");
    assert!(stats.append("log", "a") == "a");
    assert!(stats.append("log", "b") == "ab");
}

#[test]
fn increment_on_text_parses_the_prefix() {
    let map = Node::new(NodeKind::Map);
    map.set("n", "41 apples");
    assert!(map.increment("n", 1i64) == 42i64);
    map.set("d", "0.5");
    assert_eq!(*map.increment("d", 0.25).value(), Value::Double(0.75));
}

#[test]
fn increment_appends_on_arrays() {
    let array = Node::new(NodeKind::Array);
    array.increment(Key::end(), 1i64);
    array.increment(Key::end(), 1i64);
    assert_eq!(array.len(), 2);
    array.increment(Key::last(), 10i64);
    assert!(array.get(1usize) == 11i64);
}
