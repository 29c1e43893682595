use std::sync::Arc;

use arbor::{EachAction, Key, Node, NodeKind, Value, ops};

use crate::helpers::{assert_parent, child, owning_slots, sample_tree};

#[test]
fn storing_a_node_moves_it() {
    let first = Node::new(NodeKind::Map);
    let second = Node::new(NodeKind::Array);
    let item = Node::named(NodeKind::Map, "item");

    assert!(first.set("item", &item).0);
    assert_parent(&item, &first);

    assert!(second.insert(Key::end(), &item).succeeded);
    assert_parent(&item, &second);
    assert_eq!(owning_slots(&first, &item), 0);
    assert_eq!(owning_slots(&second, &item), 1);
    // The name survives a move into an array.
    assert!(item.is_name("item"));
}

#[test]
fn aliases_do_not_take_ownership() {
    let root = sample_tree();
    let db = child(&root, "db");
    let other = Node::new(NodeKind::Map);
    assert!(other.set("link", db.view()).0);
    assert!(other.set("again", db.view()).0);
    assert_parent(&db, &root);
    assert_eq!(owning_slots(&root, &db), 1);
    assert_eq!(owning_slots(&other, &db), 0);
    assert!(matches!(other.get("link").value(), Value::Alias(view) if view.is_view_of(&db)));
}

#[test]
fn cycles_are_refused_at_every_depth() {
    let root = sample_tree();
    let db = child(&root, "db");
    let inner = Node::named(NodeKind::Array, "inner");
    db.set("inner", &inner);

    assert!(!inner.set_parent(Some(&inner), None).0);
    assert!(!db.set_parent(Some(&inner), None).0);
    assert!(!root.set_parent(Some(&inner), None).0);
    assert!(!inner.insert(Key::end(), &root).succeeded);
    assert!(!inner.set(0usize, db.view()).0);
    assert!(!inner.compare_exchange(Key::end(), &Value::Empty, &root).0);
    assert!(root.parent().is_none());
}

#[test]
fn set_parent_moves_between_kinds() {
    let map = Node::new(NodeKind::Map);
    let array = Node::new(NodeKind::Array);
    let node = Node::new(NodeKind::Map);

    // A map parent needs a name.
    assert!(!node.set_parent(Some(&map), None).0);
    let (moved, prev) = node.set_parent(Some(&map), Some("n"));
    assert!(moved);
    assert!(prev.is_none());
    assert!(map.get("n").owns(&node));

    let (moved, prev) = node.set_parent(Some(&array), None);
    assert!(moved);
    assert!(Arc::ptr_eq(&prev.unwrap(), &map));
    assert!(map.is_empty());
    assert!(array.get(0usize).owns(&node));

    assert!(Arc::ptr_eq(&node.detach().unwrap(), &array));
    assert!(array.is_empty());
    assert!(node.parent().is_none());
}

#[test]
fn renaming_moves_the_parent_slot() {
    let root = sample_tree();
    let db = child(&root, "db");

    assert!(!db.set_name("database", false).0);
    let (renamed, old) = db.set_name("database", true);
    assert!(renamed);
    assert_eq!(old, "db");
    assert!(!root.get("db").is_set());
    assert!(root.get("database").owns(&db));

    // Occupied target keys are refused.
    assert!(!db.set_name("debug", true).0);
    assert!(db.is_name("database"));
}

#[test]
fn key_change_relocates_values() {
    let map = Node::new(NodeKind::Map);
    let node = Node::new(NodeKind::Array);
    map.set("from", &node);
    map.set("taken", 1i64);

    assert!(!map.key_change(&Key::from("from"), &Key::from("taken")).unwrap());
    assert!(map.key_change(&Key::from("from"), &Key::from("to")).unwrap());
    assert!(node.is_name("to"));
    assert!(map.get("to").owns(&node));
    assert!(!map.key_change(&Key::from("to"), &Key::from(0usize)).unwrap());
}

#[test]
fn depth_counts_ancestors() {
    let root = sample_tree();
    let leaf = Node::new(NodeKind::Map);
    child(&root, "db").set("leaf", &leaf);
    assert_eq!(root.depth().unwrap(), 0);
    assert_eq!(leaf.depth().unwrap(), 2);
}

#[test]
fn dropping_the_root_frees_the_tree() {
    let root = sample_tree();
    let db = child(&root, "db");
    let weak = Arc::downgrade(&root);
    drop(root);
    assert!(weak.upgrade().is_none());
    assert!(db.parent().is_none());
}

#[test]
fn clear_detaches_children() {
    let root = sample_tree();
    let db = child(&root, "db");
    root.clear();
    assert!(root.is_empty());
    assert!(db.parent().is_none());
}

#[test]
fn set_through_the_last_key_overwrites_only_that_slot() {
    let array = Node::new(NodeKind::Array);
    array.insert(Key::Empty, 1i64);
    array.insert(Key::Empty, 2i64);
    let item = Node::new(NodeKind::Map);

    assert!(array.set(Key::last(), &item).0);
    assert_eq!(array.len(), 2);
    assert_eq!(array.get(Key::Index(0)).value(), &Value::from(1i64));
    assert!(array.get(Key::last()).owns(&item));
    assert_parent(&item, &array);
}

#[test]
fn set_through_the_last_key_moves_a_held_node() {
    let array = Node::new(NodeKind::Array);
    let item = Node::new(NodeKind::Map);
    array.insert(Key::Empty, &item);
    array.insert(Key::Empty, 1i64);
    array.insert(Key::Empty, 2i64);

    assert!(array.set(Key::last(), &item).0);
    assert_eq!(array.len(), 2);
    assert_eq!(array.get(Key::Index(0)).value(), &Value::from(1i64));
    assert!(array.get(Key::Index(1)).owns(&item));
    assert_eq!(owning_slots(&array, &item), 1);
    assert_parent(&item, &array);
}

#[test]
fn moving_to_a_higher_index_reports_where_it_landed() {
    let array = Node::new(NodeKind::Array);
    let item = Node::new(NodeKind::Map);
    array.insert(Key::Empty, 0i64);
    array.insert(Key::Empty, &item);
    array.insert(Key::Empty, 2i64);
    array.insert(Key::Empty, 3i64);

    let outcome = ops::node_insert(&array, &item, true, &Key::Index(3));
    assert!(outcome.succeeded);
    assert_eq!(outcome.key, Key::Index(2));
    assert!(array.get(outcome.key.clone()).owns(&item));
    assert_eq!(array.key_of(&item), Some(Key::Index(2)));
    assert_eq!(array.len(), 3);
    assert_parent(&item, &array);
}

#[test]
fn bulk_moves_within_an_array_keep_one_slot() {
    let array = Node::new(NodeKind::Array);
    let item = Node::new(NodeKind::Map);
    array.insert(Key::Empty, &item);
    for n in 1..4i64 {
        array.insert(Key::Empty, n);
    }

    let mut batch = vec![
        (Key::Index(3), Value::from(&item)),
        (Key::Index(1), Value::from(9i64)),
    ];
    assert_eq!(array.bulk_set(&mut batch), 2);
    assert!(batch.is_empty());
    assert_eq!(array.len(), 3);
    assert_eq!(array.get(Key::Index(0)).value(), &Value::from(9i64));
    assert!(array.get(Key::Index(2)).owns(&item));
    assert_parent(&item, &array);
    assert!(ops::parents_check(&array, false).is_empty());
}

#[test]
fn mutating_scan_moves_within_an_array() {
    let array = Node::new(NodeKind::Array);
    let item = Node::new(NodeKind::Map);
    array.insert(Key::Empty, &item);
    array.insert(Key::Empty, 1i64);
    array.insert(Key::Empty, 2i64);

    array.for_each(&Key::Empty, |key, value| {
        if *key == Key::Index(2) {
            value.assign(&item);
        }
        EachAction::Next
    });
    assert_eq!(array.len(), 2);
    assert_eq!(array.get(Key::Index(0)).value(), &Value::from(1i64));
    assert_eq!(array.key_of(&item), Some(Key::Index(1)));
    assert_parent(&item, &array);
}

#[test]
fn mutating_scan_moves_within_a_map() {
    let map = Node::new(NodeKind::Map);
    let item = Node::new(NodeKind::Map);
    map.set("a", &item);
    map.set("b", 1i64);

    map.for_each(&Key::Empty, |key, value| {
        if *key == Key::from("b") {
            value.assign(&item);
        }
        EachAction::Next
    });
    assert_eq!(map.len(), 1);
    assert!(map.get("b").owns(&item));
    assert!(item.is_name("b"));
    assert_eq!(owning_slots(&map, &item), 1);
}
