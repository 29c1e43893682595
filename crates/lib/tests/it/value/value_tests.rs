use std::cmp::Ordering;

use arbor::{Key, Node, NodeKind, Value, ValueKind};

#[test]
fn cross_kind_order_follows_variants() {
    let ordered = [
        Value::Empty,
        Value::Null,
        Value::from(true),
        Value::from(1.5),
        Value::from("text"),
    ];
    for pair in ordered.windows(2) {
        assert_eq!(pair[0].compare(&pair[1]), Ordering::Less, "{:?} < {:?}", pair[0], pair[1]);
    }
    assert!(ValueKind::Alias < ValueKind::Node);
}

#[test]
fn nodes_compare_by_identity() {
    let a = Node::new(NodeKind::Map);
    let b = Node::new(NodeKind::Map);
    assert_eq!(Value::from(&a), Value::from(a.view()));
    assert_ne!(Value::from(&a), Value::from(&b));
}

#[test]
fn conversions_are_lenient() {
    let map = Node::new(NodeKind::Map);
    map.set("n", "42abc");
    map.set("f", "2.5");
    map.set("b", "true");
    assert_eq!(map.get("n").as_i64(0), 42);
    assert_eq!(map.get("f").as_f64(0.0), 2.5);
    assert!(map.get("b").as_bool(false));
    assert_eq!(map.get("missing").as_i64(-1), -1);
    assert_eq!(map.get("n").to_string_or(""), "42abc");
}

#[test]
fn empty_like_values() {
    assert!(Value::Empty.is_empty());
    assert!(Value::Null.is_empty());
    assert!(Value::from("").is_empty());
    assert!(Value::Null.is_set());
    assert!(!Value::from(0i64).is_empty());
}

#[test]
fn keys_order_indices_before_names() {
    let mut keys = vec![Key::from("b"), Key::from(3usize), Key::Empty, Key::from("a"), Key::from(1usize)];
    keys.sort();
    assert_eq!(
        keys,
        vec![Key::Empty, Key::from(1usize), Key::from(3usize), Key::from("a"), Key::from("b")]
    );
}
