use std::cmp::Ordering;

use arbor::ops::{self, CloneHook};
use arbor::{CopyAction, Key, Node, NodeKind, NodeView, Value, path};

use crate::helpers::{child, sample_tree};

#[test]
fn modified_clone_differs_where_it_was_changed() {
    let original = sample_tree();
    let copy = ops::clone_tree(&original);
    assert_eq!(ops::compare_strict(&original.view(), &copy.view()), Ordering::Equal);

    copy.set("debug", true);
    ops::set_at(&copy, &path!["hosts", 1usize], "z");

    let mut diffs: Vec<(Option<String>, Key)> = Vec::new();
    let ord = ops::compare(&original.view(), &copy.view(), true, &mut |node, key, _, _| {
        diffs.push((node.name(), key.clone()));
        false
    });
    assert_eq!(ord, Ordering::Equal);
    assert_eq!(
        diffs,
        vec![
            (Some("cfg".to_string()), Key::from("debug")),
            (Some("hosts".to_string()), Key::Index(1)),
        ]
    );
    assert_eq!(ops::compare_strict(&original.view(), &copy.view()), Ordering::Less);
}

#[test]
fn copy_to_brings_a_tree_up_to_date() {
    let stale = sample_tree();
    let fresh = ops::clone_tree(&stale);
    ops::set_at(&fresh, &path!["db", "port"], 6000i64);
    ops::set_at(&fresh, &path!["cache", "ttl"], 30i64);

    let written = ops::copy_to(&fresh.view(), &stale, true, false, 4);
    assert_eq!(written, 2);
    assert_eq!(ops::compare_strict(&stale.view(), &fresh.view()), Ordering::Equal);

    // The copied subtree is independent of its source.
    ops::set_at(&fresh, &path!["cache", "ttl"], 1i64);
    assert!(ops::at(&stale, &path!["cache", "ttl"]) == 30i64);
}

#[test]
fn patch_brings_a_tree_to_the_patched_state() {
    let target = sample_tree();
    let patch = ops::create_complex(
        vec![
            (path!["db", "host"], Value::Null),
            (path!["db", "user"], Value::from("admin")),
            (path!["debug"], Value::Null),
        ],
        None,
        0,
    );
    let (added, erased) = ops::patch_apply(&target, &patch.view());
    assert_eq!((added, erased), (1, 2));

    let expected = Node::new(NodeKind::Map);
    ops::set_at(&expected, &path!["db", "port"], 5432i64);
    ops::set_at(&expected, &path!["db", "user"], "admin");
    expected.set("hosts", ops::create_array(vec!["a".into(), "b".into(), "c".into()], None, 0));
    assert_eq!(ops::compare_strict(&target.view(), &expected.view()), Ordering::Equal);
}

#[test]
fn patch_keeps_aliases_as_aliases() {
    let target = Node::new(NodeKind::Map);
    let shared = Node::named(NodeKind::Map, "shared");
    shared.set("x", 1i64);
    let patch = Node::new(NodeKind::Map);
    patch.set("link", shared.view());

    ops::patch_apply(&target, &patch.view());
    assert!(matches!(target.get("link").value(), Value::Alias(view) if view.is_view_of(&shared)));
    assert!(shared.parent().is_none());
}

#[test]
fn clone_hook_can_stop_early() {
    let source = ops::create_array((0..10i64).map(Value::from).collect(), None, 0);
    let mut take_until_five = |_: &NodeView, _: &Key, value: &mut Value| {
        if value.as_i64(0) == 5 {
            CopyAction::TakeStop
        } else {
            CopyAction::Take
        }
    };
    let hook: CloneHook<'_> = &mut take_until_five;
    let copy = ops::clone_node(&Value::from(&source), false, Some(hook), None, 0).unwrap();
    assert_eq!(copy.len(), 6);
    assert!(copy.get(Key::last()) == 5i64);
}

#[test]
fn shallow_clone_shares_children() {
    let original = sample_tree();
    let copy = ops::clone_node(&Value::from(&original), false, None, Some("copy"), 0).unwrap();
    let db = child(&original, "db");
    ops::set_at(&original, &path!["db", "port"], 1i64);
    assert!(ops::view_at(&copy.view(), &path!["db", "port"]) == 1i64);
    assert!(copy.get("db").as_node_view().unwrap().is_view_of(&db));
}
