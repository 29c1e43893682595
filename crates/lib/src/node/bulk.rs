//! Batched reads and writes.
//!
//! The writers take the caller's batch by `&mut Vec` and remove every entry
//! they processed, so whatever is left afterwards is exactly what failed and
//! can be inspected or retried.

use std::sync::Arc;

use tracing::{debug, trace};

use super::{Node, NodeError, NodeKind, NodePrivate, NodeRef, container_key, validate};
use crate::constants::{IDX_END, IDX_LAST};
use crate::container::CopyAction;
use crate::key::Key;
use crate::timed::TimedValue;
use crate::value::Value;
use crate::Result;

impl Node {
    /// Values at `keys`, in order. Missing slots come back absent.
    pub fn bulk_get(&self, keys: &[Key]) -> Vec<(Key, TimedValue)> {
        let slots = self.read_slots();
        keys.iter()
            .map(|key| {
                let value = slots
                    .get(&container_key(&slots, key, true))
                    .cloned()
                    .unwrap_or_default();
                (key.clone(), value)
            })
            .collect()
    }

    /// Copy out visible entries from `from` onward (`Key::Empty` for all),
    /// letting `on_item` choose which to take and when to stop.
    pub fn bulk_get_all<F>(&self, from: &Key, mut on_item: F) -> Vec<(Key, TimedValue)>
    where
        F: FnMut(&Key, &TimedValue) -> CopyAction,
    {
        let mut taken = Vec::new();
        let slots = self.read_slots();
        let start = Self::start_key(&slots, from);
        slots.scan(start.as_ref(), |key, value| {
            let action = on_item(key, value);
            if action.is_take() {
                taken.push((key.clone(), value.clone()));
            }
            action.is_stop()
        });
        taken
    }

    /// Every visible entry.
    pub fn entries(&self) -> Vec<(Key, TimedValue)> {
        self.bulk_get_all(&Key::Empty, |_, _| CopyAction::Take)
    }

    /// Owning references in `values` that would create a cycle.
    fn invalid_children<'a, I>(&self, values: I) -> Vec<*const Node>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        values
            .into_iter()
            .filter(|value| !self.is_valid_child(value).0)
            .filter_map(Value::node_ptr)
            .collect()
    }

    /// `set` for each entry. Returns how many were stored; those are removed
    /// from `values`.
    ///
    /// A node listed twice ends up under its last key only.
    pub fn bulk_set(&self, values: &mut Vec<(Key, Value)>) -> usize {
        let invalid = self.invalid_children(values.iter().map(|(_, value)| value));
        let mut replaced: Vec<NodeRef> = Vec::new();
        let mut stored: Vec<(NodeRef, Key, i64)> = Vec::new();
        let mut succeeded = 0;

        {
            let mut slots = self.write_slots();
            let notify = self.notify_gate(false);
            let relocate = self.notify_gate(true);

            let mut idx = 0;
            while idx < values.len() {
                let (key, value) = &values[idx];
                if value.node_ptr().is_some_and(|ptr| invalid.contains(&ptr)) {
                    idx += 1;
                    continue;
                }
                let child = value.as_node().cloned();

                // Map keys stay put; array duplicates go by write stamp below.
                if let Some(child) = &child {
                    if let Some(pos) = stored.iter().position(|(node, _, _)| Arc::ptr_eq(node, child)) {
                        if self.kind == NodeKind::Map && slots.erase(&stored[pos].1, Some(&relocate)).is_none() {
                            idx += 1;
                            continue;
                        }
                        stored.remove(pos);
                    }
                }

                let key_set = container_key(&slots, key, true);
                let written = TimedValue::new(value.clone());
                let stamp = written.timestamp();
                let (changed, previous) = slots.set(&key_set, written, Some(&notify));
                if !changed {
                    debug!(node = self.uid, %key, "bulk set entry rejected");
                    idx += 1;
                    continue;
                }

                if let Some(old) = previous.as_node() {
                    if !child.as_ref().is_some_and(|child| Arc::ptr_eq(child, old)) {
                        replaced.push(Arc::clone(old));
                    }
                }
                if let Some(child) = child {
                    stored.push((child, key_set, stamp));
                }
                values.remove(idx);
                succeeded += 1;
            }

            // Erasures shift array slots, so every landing key is read back.
            stored.retain_mut(|(node, key, stamp)| match self.settle(&mut slots, node, key, *stamp, Some(&relocate)) {
                Some(landed) => {
                    *key = landed;
                    true
                }
                None => false,
            });
            replaced.retain(|node| validate::find_owning(&slots, node).is_none());
        }
        trace!(node = self.uid, succeeded, "bulk set");

        for old in replaced {
            old.private_release(self);
        }
        for (node, key, _) in stored {
            self.adopt(&node, key.as_name());
        }
        succeeded
    }

    /// `insert` for each entry. Returns how many were stored; those are
    /// removed from `values`.
    ///
    /// A left-over entry whose node is already held here gets the key it sits
    /// under; one refused because its slot is taken gets the occupant as its
    /// value.
    pub fn bulk_insert(&self, values: &mut Vec<(Key, Value)>) -> usize {
        let invalid = self.invalid_children(values.iter().map(|(_, value)| value));
        let mut inserted: Vec<(NodeRef, Key)> = Vec::new();
        let mut succeeded = 0;

        {
            let mut slots = self.write_slots();
            let notify = self.notify_gate(false);

            let mut idx = 0;
            while idx < values.len() {
                if values[idx].1.node_ptr().is_some_and(|ptr| invalid.contains(&ptr)) {
                    idx += 1;
                    continue;
                }
                let child = values[idx].1.as_node().cloned();

                if let Some(child) = &child {
                    if inserted.iter().any(|(node, _)| Arc::ptr_eq(node, child)) {
                        idx += 1;
                        continue;
                    }
                    if let Some((dup_key, _)) = self.validator.find_duplicate(&slots, child) {
                        values[idx].0 = dup_key;
                        idx += 1;
                        continue;
                    }
                }

                let key = self.insert_key(values[idx].0.clone(), &values[idx].1);
                let key_insert = container_key(&slots, &key, false);
                let outcome = slots.emplace(&key_insert, TimedValue::new(values[idx].1.clone()), Some(&notify));
                if !outcome.succeeded {
                    values[idx].1 = outcome.existing.into_value();
                    idx += 1;
                    continue;
                }

                if let Some(child) = child {
                    inserted.push((child, outcome.key));
                }
                values.remove(idx);
                succeeded += 1;
            }
        }
        trace!(node = self.uid, succeeded, "bulk insert");

        for (node, key) in inserted {
            self.adopt(&node, key.as_name());
        }
        succeeded
    }

    /// Insert `values` into an array starting at `pos`, keeping their order.
    ///
    /// `IDX_END` appends each value; `IDX_LAST` inserts each before the final
    /// element. A name `pos` inserts nothing. Returns how many were inserted
    /// and the key of the last one; those are removed from `values`.
    pub fn bulk_insert_at(&self, pos: &Key, values: &mut Vec<Value>) -> Result<(usize, Key)> {
        if pos.is_name() {
            return Ok((0, pos.clone()));
        }
        if self.kind != NodeKind::Array {
            return Err(NodeError::KindMismatch {
                expected: NodeKind::Array.to_string(),
                actual: self.kind.to_string(),
            }
            .into());
        }

        let invalid = self.invalid_children(values.iter());
        let mut inserted: Vec<NodeRef> = Vec::new();
        let mut succeeded = 0;
        let mut last = Key::Empty;
        let mut at = pos.as_index().unwrap_or(IDX_END);

        {
            let mut slots = self.write_slots();
            let notify = self.notify_gate(false);

            let mut idx = 0;
            while idx < values.len() {
                let value = &values[idx];
                if value.node_ptr().is_some_and(|ptr| invalid.contains(&ptr)) {
                    idx += 1;
                    continue;
                }
                let child = value.as_node().cloned();
                if let Some(child) = &child {
                    let batched = inserted.iter().any(|node| Arc::ptr_eq(node, child));
                    if batched || self.validator.find_duplicate(&slots, child).is_some() {
                        idx += 1;
                        continue;
                    }
                }

                let outcome = slots.emplace(&Key::Index(at), TimedValue::new(value.clone()), Some(&notify));
                if !outcome.succeeded {
                    idx += 1;
                    continue;
                }

                last = outcome.key;
                inserted.extend(child);
                if at != IDX_END && at != IDX_LAST {
                    at += 1;
                }
                values.remove(idx);
                succeeded += 1;
            }
        }
        trace!(node = self.uid, succeeded, "bulk insert at");

        for node in inserted {
            self.adopt(&node, None);
        }
        Ok((succeeded, last))
    }

    /// Erase every key in `keys`. Returns the erased entries in the order
    /// given; keys that erased nothing are left out.
    ///
    /// All keys are resolved before anything is erased, so array indices
    /// address the elements they named at the time of the call.
    pub fn bulk_erase(&self, keys: &[Key]) -> Vec<(Key, TimedValue)> {
        let mut erased: Vec<(usize, Key, TimedValue)> = Vec::new();
        {
            let mut slots = self.write_slots();
            let notify = self.notify_gate(false);

            let mut resolved: Vec<(usize, Key)> = keys
                .iter()
                .enumerate()
                .map(|(order, key)| (order, container_key(&slots, key, true)))
                .collect();
            if self.kind == NodeKind::Array {
                // Highest index first so earlier removals don't shift later ones.
                resolved.sort_by(|a, b| b.1.cmp(&a.1));
                resolved.dedup_by(|a, b| a.1 == b.1);
            }

            for (order, key) in resolved {
                if let Some(value) = slots.erase(&key, Some(&notify)) {
                    erased.push((order, key, value));
                }
            }
        }
        erased.sort_by_key(|(order, _, _)| *order);

        for (_, _, value) in &erased {
            if let Some(child) = value.as_node() {
                child.private_release(self);
            }
        }
        trace!(node = self.uid, erased = erased.len(), "bulk erase");
        erased
            .into_iter()
            .map(|(order, _, value)| (keys[order].clone(), value))
            .collect()
    }
}
