use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arbor::{Key, Node, NodeKind, Reason, Value};

use crate::helpers::{Call, CallLog, recording_listener};

fn call(listener: &'static str, reason: Reason, key: &str, from: Value, to: Value) -> Call {
    Call {
        listener,
        reason,
        key: Key::from(key),
        from,
        to,
    }
}

#[test]
fn veto_rolls_back_earlier_listeners() {
    let map = Node::new(NodeKind::Map);
    let log = CallLog::default();
    recording_listener(&map, 1, "L1", &log, |_| true);
    recording_listener(&map, 2, "L2", &log, |to| to.as_i64(0) <= 10);

    assert!(map.set("n", 1i64).0);
    assert_eq!(log.lock().unwrap().len(), 2);
    log.lock().unwrap().clear();

    let (changed, current) = map.set("n", 11i64);
    assert!(!changed);
    assert!(current == 1i64);
    assert!(map.get("n") == 1i64);

    let calls = log.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            call("L1", Reason::Changes, "n", Value::from(1i64), Value::from(11i64)),
            call("L2", Reason::Changes, "n", Value::from(1i64), Value::from(11i64)),
            call("L1", Reason::Rollback, "n", Value::from(11i64), Value::from(1i64)),
        ]
    );
}

#[test]
fn listeners_run_in_id_order() {
    let array = Node::new(NodeKind::Array);
    let log = CallLog::default();
    recording_listener(&array, 30, "third", &log, |_| true);
    recording_listener(&array, 10, "first", &log, |_| true);
    recording_listener(&array, 20, "second", &log, |_| true);

    array.insert(Key::end(), "x");
    let order: Vec<_> = log.lock().unwrap().iter().map(|c| c.listener).collect();
    assert_eq!(order, ["first", "second", "third"]);
}

#[test]
fn veto_blocks_every_kind_of_write() {
    let map = Node::new(NodeKind::Map);
    map.set("keep", 1i64);
    map.on_change_add(0, |_, _, _, _, _| Some(false));

    assert!(!map.set("keep", 2i64).0);
    assert!(!map.insert("new", 1i64).succeeded);
    assert!(!map.erase("keep").is_set());
    assert!(map.increment("keep", 5i64) == 1i64);
    assert!(!map.compare_exchange("keep", &Value::from(1i64), 3i64).0);
    assert!(!map.key_change(&Key::from("keep"), &Key::from("moved")).unwrap());
    assert!(map.get("keep") == 1i64);
    assert_eq!(map.len(), 1);
}

#[test]
fn removed_and_expired_listeners_stop_firing() {
    let map = Node::new(NodeKind::Map);
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let id = map.on_change_add(0, move |_, _, _, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Some(true)
    });
    map.set("a", 1i64);
    assert!(map.on_change_remove(id));
    assert!(!map.on_change_remove(id));
    map.set("a", 2i64);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let counter = Arc::clone(&calls);
    map.on_change_add(0, move |_, _, _, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        None
    });
    map.set("a", 3i64);
    map.set("a", 4i64);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(map.on_change_reset(), 0);
}

#[test]
fn expired_listener_still_sees_the_rollback() {
    let map = Node::new(NodeKind::Map);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let record = Arc::clone(&seen);
    map.on_change_add(1, move |reason, _, _, _, _| {
        record.lock().unwrap().push(reason);
        None
    });
    map.on_change_add(2, |_, _, _, _, _| Some(false));

    assert!(!map.set("n", 1i64).0);
    assert!(map.is_empty());
    assert_eq!(*seen.lock().unwrap(), vec![Reason::Changes, Reason::Rollback]);
    // Gone once the pass is over.
    assert_eq!(map.on_change_reset(), 1);
}

#[test]
fn moving_a_child_out_cannot_be_vetoed() {
    let old_home = Node::new(NodeKind::Map);
    let new_home = Node::new(NodeKind::Map);
    let item = Node::new(NodeKind::Array);
    old_home.set("item", &item);

    let reasons = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&reasons);
    old_home.on_change_add(0, move |reason, node, key, _, _| {
        seen.lock().unwrap().push((reason, node.uid(), key.clone()));
        Some(false)
    });

    assert!(new_home.set("item", &item).0);
    assert!(!old_home.get("item").is_set());
    let reasons = reasons.lock().unwrap();
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].0, Reason::ChangesNoDiscard);
    assert_eq!(reasons[0].1, old_home.uid());
    assert_eq!(reasons[0].2, Key::from("item"));
}

#[test]
fn for_each_edits_pass_through_listeners() {
    let map = Node::new(NodeKind::Map);
    for (k, v) in [("a", 1i64), ("b", 50), ("c", 3)] {
        map.set(k, v);
    }
    map.on_change_add(0, |_, _, _, _, to| Some(to.as_i64(0) < 100));

    map.for_each(&Key::Empty, |_, value| {
        let doubled = value.as_i64(0) * 2;
        value.assign(doubled);
        arbor::EachAction::Next
    });
    assert!(map.get("a") == 2i64);
    assert!(map.get("b") == 50i64);
    assert!(map.get("c") == 6i64);
}
