//! Read-modify-write operations that run inside one critical section.

use tracing::{debug, trace};

use super::{Node, container_key};
use crate::container::{EachAction, gate_allows};
use crate::key::Key;
use crate::timed::TimedValue;
use crate::value::Value;

impl Node {
    /// Append `suffix` to the textual form of the slot at `key`, creating the
    /// slot if it is vacant. Returns the slot's value afterwards.
    pub fn append(&self, key: impl Into<Key>, suffix: &str) -> TimedValue {
        let key = key.into();
        self.modify(&key, Value::from(suffix), |current| {
            Value::from(current.to_string_or("") + suffix)
        })
    }

    /// Add `delta` to the slot at `key`, creating it with `delta` if vacant.
    ///
    /// The delta's kind picks the arithmetic: a double delta yields a double,
    /// an unsigned delta an unsigned (wrapping) sum, anything else a signed
    /// (wrapping) sum. Returns the slot's value afterwards.
    pub fn increment(&self, key: impl Into<Key>, delta: impl Into<Value>) -> TimedValue {
        let key = key.into();
        let delta = delta.into();
        let initial = delta.clone();
        self.modify(&key, initial, |current| match &delta {
            Value::Double(d) => Value::Double(current.as_f64(0.0) + d),
            Value::UInt(d) => Value::UInt(current.as_u64(0, 0).wrapping_add(*d)),
            other => Value::Int(current.as_i64(0).wrapping_add(other.as_i64(0))),
        })
    }

    fn modify<F>(&self, key: &Key, initial: Value, mut update: F) -> TimedValue
    where
        F: FnMut(&Value) -> Value,
    {
        let mut slots = self.write_slots();
        let notify = self.notify_gate(false);
        let key_found = container_key(&slots, key, true);

        let found = slots.for_each_mut(
            Some(&key_found),
            |_, value| {
                let next = update(value.value());
                value.assign(next);
                EachAction::Stop
            },
            Some(&notify),
        );
        if found {
            trace!(node = self.uid, %key, "modified in place");
            return slots.get(&key_found).cloned().unwrap_or_default();
        }

        let key_insert = container_key(&slots, key, false);
        let outcome = slots.emplace(&key_insert, TimedValue::new(initial), Some(&notify));
        if !outcome.succeeded {
            debug!(node = self.uid, %key, "create-on-modify rejected");
            return outcome.existing;
        }
        slots.get(&outcome.key).cloned().unwrap_or_default()
    }

    /// Replace the slot at `key` with `new` only if it currently equals
    /// `expected`.
    ///
    /// A vacant slot matches an empty `expected` (`Empty`, `Null` or `""`), in
    /// which case the call inserts. Returns success and the previous value;
    /// on a mismatch, the current value.
    pub fn compare_exchange(
        &self,
        key: impl Into<Key>,
        expected: &Value,
        new: impl Into<Value>,
    ) -> (bool, TimedValue) {
        let key = key.into();
        let new = TimedValue::new(new);
        let stamp = new.timestamp();
        let (valid, child) = self.is_valid_child(&new);
        if !valid {
            debug!(node = self.uid, %key, "refusing to store an ancestor");
            return (false, TimedValue::default());
        }

        let (key_set, previous) = {
            let mut slots = self.write_slots();
            let notify = self.notify_gate(false);
            let mut key_set = container_key(&slots, &key, true);

            let mut mismatch = None;
            let mut previous = None;
            let found = slots.for_each_mut(
                Some(&key_set),
                |key, value| {
                    if value.value() == expected && gate_allows(Some(&notify), key, value, &new) {
                        previous = Some(std::mem::replace(value, new.clone()));
                    } else {
                        mismatch = Some(value.clone());
                    }
                    EachAction::Stop
                },
                None,
            );

            if let Some(current) = mismatch {
                debug!(node = self.uid, %key, "compare-exchange mismatch");
                return (false, current);
            }
            let previous = match previous {
                Some(previous) => previous,
                None if found => return (false, TimedValue::default()),
                None if !expected.is_empty() => {
                    debug!(node = self.uid, %key, "compare-exchange expected a value, slot vacant");
                    return (false, TimedValue::default());
                }
                None => {
                    let (changed, previous) = slots.set(&key_set, new, Some(&notify));
                    if !changed {
                        return (false, previous);
                    }
                    previous
                }
            };

            if let Some(child) = &child {
                let relocate = self.notify_gate(true);
                if let Some(landed) = self.validator.remove_duplicates(&mut slots, child, stamp, Some(&relocate)) {
                    key_set = landed;
                }
            }
            (key_set, previous)
        };
        trace!(node = self.uid, key = %key_set, "compare-exchange committed");

        self.release_replaced(&previous, child.as_ref());
        if let Some(child) = child {
            self.adopt(&child, key_set.as_name());
        }
        (true, previous)
    }
}
