use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use arbor::{Key, Node, NodeKind, NodeRef, ops, path};

use crate::helpers::{child, owning_slots};

const THREADS: usize = 6;

fn run_threads<F>(f: F)
where
    F: Fn(usize) + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let f = Arc::clone(&f);
            thread::spawn(move || f(t))
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
}

#[test]
fn writers_on_distinct_keys_all_land() {
    let map = Node::new(NodeKind::Map);
    let shared = Arc::clone(&map);
    run_threads(move |t| {
        for i in 0..200 {
            shared.set(format!("t{t}-{i}"), i as i64);
        }
    });
    assert_eq!(map.len(), THREADS * 200);
    assert!(map.get("t3-199") == 199i64);
}

#[test]
fn readers_never_see_torn_values() {
    let map = Node::new(NodeKind::Map);
    map.set("pair", "0:0");
    let shared = Arc::clone(&map);
    run_threads(move |t| {
        for i in 0..300 {
            if t % 2 == 0 {
                shared.set("pair", format!("{i}:{i}"));
            } else {
                let text = shared.get("pair").to_string_or("");
                let (left, right) = text.split_once(':').expect("pair has a separator");
                assert_eq!(left, right);
            }
        }
    });
}

#[test]
fn concurrent_path_creation_builds_one_branch() {
    let root = Node::new(NodeKind::Map);
    let shared = Arc::clone(&root);
    run_threads(move |t| {
        ops::set_at(&shared, &path!["shared", "workers", format!("t{t}")], t as i64);
    });
    assert_eq!(root.len(), 1);
    let workers = child(&child(&root, "shared"), "workers");
    assert_eq!(workers.len(), THREADS);
}

#[test]
fn threads_moving_their_own_items_keep_ownership_single() {
    let root = Node::named(NodeKind::Map, "root");
    let left = Node::new(NodeKind::Map);
    let right = Node::new(NodeKind::Array);
    root.set("left", &left);
    root.set("right", &right);

    let items: Vec<Vec<NodeRef>> = (0..THREADS)
        .map(|t| {
            (0..8)
                .map(|i| {
                    let item = Node::named(NodeKind::Map, &format!("t{t}-{i}"));
                    left.set(format!("t{t}-{i}"), &item);
                    item
                })
                .collect()
        })
        .collect();
    let items = Arc::new(items);

    let (l, r, shared) = (Arc::clone(&left), Arc::clone(&right), Arc::clone(&items));
    run_threads(move |t| {
        for round in 0..40 {
            for (i, item) in shared[t].iter().enumerate() {
                if round % 2 == 0 {
                    r.insert(Key::end(), item);
                } else {
                    l.set(format!("t{t}-{i}"), item);
                }
            }
        }
    });

    // 40 rounds end with every item back on the left.
    for item in items.iter().flatten() {
        assert_eq!(owning_slots(&left, item) + owning_slots(&right, item), 1);
        assert!(Arc::ptr_eq(&item.parent().unwrap(), &left));
    }
    assert_eq!(left.len(), THREADS * 8);
    assert!(right.is_empty());
    assert!(ops::parents_check(&root, true).is_empty());
}

#[test]
fn listeners_fire_once_per_increment() {
    let counter = Node::new(NodeKind::Map);
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    counter.on_change_add(0, move |_, _, _, _, _| {
        seen.fetch_add(1, Ordering::Relaxed);
        Some(true)
    });

    let shared = Arc::clone(&counter);
    run_threads(move |_| {
        for _ in 0..100 {
            shared.increment("hits", 1i64);
        }
    });
    assert!(counter.get("hits") == (THREADS * 100) as i64);
    assert_eq!(calls.load(Ordering::Relaxed), THREADS * 100);
}
