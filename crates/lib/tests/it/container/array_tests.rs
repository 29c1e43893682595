use arbor::constants::MAX_AUTO_GROW;
use arbor::{Key, Node, NodeKind};

use crate::helpers::{child, int_array, owning_slots};

#[test]
fn auto_grow_is_capped() {
    let array = Node::new(NodeKind::Array);
    assert!(array.set(MAX_AUTO_GROW - 1, "tail").0);
    assert_eq!(array.len(), MAX_AUTO_GROW);
    assert!(!array.get(0usize).is_set());

    assert!(!array.set(array.len() + MAX_AUTO_GROW, "too far").0);
    assert_eq!(array.len(), MAX_AUTO_GROW);
}

#[test]
fn end_and_last_sentinels() {
    let array = int_array(3);
    assert!(array.get(Key::last()) == 2i64);
    assert!(!array.get(Key::end()).is_set());
    assert!(!array.set(Key::end(), 9i64).0);

    // Inserting at the last position goes in front of the final element.
    let outcome = array.insert(Key::last(), 7i64);
    assert!(outcome.succeeded);
    assert_eq!(outcome.key, Key::Index(2));
    assert!(array.get(3usize) == 2i64);
}

#[test]
fn insert_shifts_and_erase_closes_gaps() {
    let array = int_array(3);
    assert!(array.insert(0usize, -1i64).succeeded);
    assert!(array.get(0usize) == -1i64);
    assert!(array.get(3usize) == 2i64);

    assert!(array.erase(0usize) == -1i64);
    assert_eq!(array.len(), 3);
    assert!(array.get(0usize) == 0i64);
}

#[test]
fn same_node_cannot_be_inserted_twice() {
    let array = Node::new(NodeKind::Array);
    let item = Node::new(NodeKind::Map);
    array.insert(Key::end(), 1i64);
    assert!(array.insert(Key::end(), &item).succeeded);

    let second = array.insert(Key::end(), &item);
    assert!(!second.succeeded);
    assert_eq!(second.key, Key::Index(1));
    assert_eq!(array.len(), 2);
    assert_eq!(owning_slots(&array, &item), 1);
}

#[test]
fn set_moves_a_node_within_an_array() {
    let array = Node::new(NodeKind::Array);
    let item = Node::new(NodeKind::Map);
    array.insert(Key::end(), &item);
    array.insert(Key::end(), "x");
    array.insert(Key::end(), "y");

    assert!(array.set(2usize, &item).0);
    assert_eq!(owning_slots(&array, &item), 1);
    assert_eq!(array.len(), 2);
    assert!(array.get(0usize) == "x");
    assert!(std::sync::Arc::ptr_eq(&child(&array, 1usize), &item));
}

#[test]
fn arrays_refuse_names() {
    let array = Node::new(NodeKind::Array);
    assert!(!array.set("name", 1i64).0);
    assert!(!array.insert("name", 1i64).succeeded);
    assert!(array.is_empty());
}
