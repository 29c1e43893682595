use std::sync::Arc;

use arbor::{CopyAction, Key, Node, NodeKind, Value};

use crate::helpers::{int_array, keys_of, owning_slots};

#[test]
fn bulk_get_keeps_request_order() {
    let map = Node::new(NodeKind::Map);
    map.set("a", 1i64);
    map.set("b", 2i64);
    let got = map.bulk_get(&[Key::from("b"), Key::from("missing"), Key::from("a")]);
    assert_eq!(got.len(), 3);
    assert_eq!(got[0].0, Key::from("b"));
    assert!(got[0].1 == 2i64);
    assert!(!got[1].1.is_set());
    assert!(got[2].1 == 1i64);
}

#[test]
fn bulk_get_all_visitor_controls_the_walk() {
    let array = int_array(10);
    let odd = array.bulk_get_all(&Key::Empty, |_, value| {
        if value.as_i64(0) % 2 == 1 {
            CopyAction::Take
        } else {
            CopyAction::Skip
        }
    });
    assert_eq!(odd.len(), 5);

    let head = array.bulk_get_all(&Key::from(7usize), |key, _| {
        if *key == 8usize {
            CopyAction::TakeStop
        } else {
            CopyAction::Take
        }
    });
    assert_eq!(head.len(), 2);
    assert!(head[1].1 == 8i64);
}

#[test]
fn bulk_set_leaves_failures_behind() {
    let map = Node::new(NodeKind::Map);
    let mut batch = vec![
        (Key::from("a"), Value::from(1i64)),
        (Key::from(""), Value::from(2i64)),
        (Key::from("b"), Value::from(3i64)),
    ];
    assert_eq!(map.bulk_set(&mut batch), 2);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].0, Key::from(""));
    assert_eq!(keys_of(&map), vec![Key::from("a"), Key::from("b")]);
}

#[test]
fn bulk_set_vetoed_entries_stay_in_the_batch() {
    let map = Node::new(NodeKind::Map);
    map.on_change_add(0, |_, _, _, _, to| Some(to.as_i64(0) >= 0));
    let mut batch = vec![
        (Key::from("ok"), Value::from(1i64)),
        (Key::from("neg"), Value::from(-1i64)),
    ];
    assert_eq!(map.bulk_set(&mut batch), 1);
    assert_eq!(batch[0].0, Key::from("neg"));
    assert!(!map.get("neg").is_set());
}

#[test]
fn bulk_set_moves_a_node_between_keys() {
    let map = Node::new(NodeKind::Map);
    let item = Node::new(NodeKind::Array);
    map.set("old", &item);
    let mut batch = vec![(Key::from("new"), Value::from(&item))];
    assert_eq!(map.bulk_set(&mut batch), 1);
    assert_eq!(owning_slots(&map, &item), 1);
    assert!(map.get("new").owns(&item));
    assert!(item.is_name("new"));
}

#[test]
fn bulk_insert_reports_occupied_slots() {
    let map = Node::new(NodeKind::Map);
    map.set("taken", "old");
    let mut batch = vec![
        (Key::from("taken"), Value::from("new")),
        (Key::from("free"), Value::from("new")),
    ];
    assert_eq!(map.bulk_insert(&mut batch), 1);
    assert_eq!(batch.len(), 1);
    assert!(batch[0].1 == "old");
    assert!(map.get("taken") == "old");
}

#[test]
fn bulk_insert_at_appends_and_refuses_maps() {
    let array = int_array(2);
    let mut values = vec![Value::from("x"), Value::from("y")];
    let (inserted, last) = array.bulk_insert_at(&Key::end(), &mut values).unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(last, Key::Index(3));
    assert!(array.get(Key::last()) == "y");

    let map = Node::new(NodeKind::Map);
    let err = map.bulk_insert_at(&Key::end(), &mut vec![Value::Null]).unwrap_err();
    assert_eq!(err.module(), "node");
}

#[test]
fn bulk_erase_uses_indices_from_before_the_call() {
    let array = int_array(6);
    let erased = array.bulk_erase(&[Key::from(1usize), Key::from(4usize), Key::from(1usize), Key::from(9usize)]);
    assert_eq!(erased.len(), 2);
    assert_eq!(erased[0].0, Key::from(1usize));
    assert!(erased[0].1 == 1i64);
    assert!(erased[1].1 == 4i64);
    let left: Vec<i64> = array.entries().iter().map(|(_, v)| v.as_i64(-1)).collect();
    assert_eq!(left, [0, 2, 3, 5]);
}

#[test]
fn bulk_erase_detaches_nodes() {
    let map = Node::new(NodeKind::Map);
    let item = Node::new(NodeKind::Map);
    map.set("item", &item);
    map.set("n", 1i64);
    let erased = map.bulk_erase(&[Key::from("item"), Key::from("n")]);
    assert_eq!(erased.len(), 2);
    assert!(item.parent().is_none());
    assert!(Arc::ptr_eq(erased[0].1.as_node().unwrap(), &item));
}
