use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use arbor::{Node, NodeKind, TimedValue, clock};

#[test]
fn writes_from_many_threads_get_distinct_stamps() {
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let stamps = Arc::clone(&stamps);
            thread::spawn(move || {
                let node = Node::new(NodeKind::Array);
                let mut local = Vec::with_capacity(250);
                for i in 0..250i64 {
                    node.insert(arbor::Key::end(), i * t);
                    local.push(node.get(i as usize).timestamp());
                }
                stamps.lock().unwrap().extend(local);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stamps = stamps.lock().unwrap();
    let unique: HashSet<_> = stamps.iter().copied().collect();
    assert_eq!(stamps.len(), 1000);
    assert_eq!(unique.len(), 1000);
}

#[test]
fn elapsed_time_is_bounded_below_by_sleep() {
    let value = TimedValue::new(1i64);
    thread::sleep(Duration::from_millis(20));
    assert!(value.time_elapsed() >= TimedValue::msec_to_ticks(20.0));
    assert!(TimedValue::default().time_is_absent());
    assert_eq!(TimedValue::default().time_elapsed(), 0);
}

#[test]
fn clock_is_strictly_increasing() {
    let mut last = clock::timestamp();
    for _ in 0..10_000 {
        let next = clock::timestamp();
        assert!(next > last);
        last = next;
    }
}

#[test]
fn overwrite_restamps() {
    let map = Node::new(NodeKind::Map);
    map.set("k", 1i64);
    let first = map.get("k").timestamp();
    map.set("k", 2i64);
    assert!(map.get("k").timestamp() > first);
}
