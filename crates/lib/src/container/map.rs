use std::collections::BTreeMap;
use std::ops::Bound;

use super::{ChangeGate, EachAction, Emplaced, gate_allows};
use crate::key::Key;
use crate::timed::TimedValue;

/// Ordered string-keyed table. Only non-empty [`Key::Name`] keys are valid.
#[derive(Debug, Clone, Default)]
pub struct MapContainer {
    values: BTreeMap<String, TimedValue>,
}

fn name_of(key: &Key) -> Option<&str> {
    key.as_name().filter(|name| !name.is_empty())
}

impl MapContainer {
    pub fn is_key_valid(&self, key: &Key) -> bool {
        name_of(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&TimedValue> {
        self.values.get(name_of(key)?)
    }

    /// Entries from `from` (inclusive) onwards, or all of them. `None` if
    /// `from` is given but absent.
    fn range_from<'a>(
        &'a self,
        from: Option<&'a Key>,
    ) -> Option<impl Iterator<Item = (&'a String, &'a TimedValue)>> {
        match from {
            Some(key) => {
                let name = name_of(key)?;
                if !self.values.contains_key(name) {
                    return None;
                }
                Some(self.values.range::<str, _>((Bound::Included(name), Bound::Unbounded)))
            }
            None => Some(self.values.range::<str, _>((Bound::Unbounded, Bound::Unbounded))),
        }
    }

    pub fn scan<F>(&self, from: Option<&Key>, mut on_item: F) -> bool
    where
        F: FnMut(&Key, &TimedValue) -> bool,
    {
        let Some(entries) = self.range_from(from) else {
            return false;
        };
        let mut any = false;
        for (name, value) in entries {
            any = true;
            if on_item(&Key::Name(name.clone()), value) {
                break;
            }
        }
        any
    }

    /// Keys at and after `from`, snapshotted so the table can be edited
    /// while walking it.
    pub(crate) fn keys_from(&self, from: Option<&Key>) -> Option<Vec<String>> {
        self.range_from(from)
            .map(|entries| entries.map(|(name, _)| name.clone()).collect())
    }

    pub fn for_each_mut<F>(&mut self, from: Option<&Key>, mut on_item: F, gate: ChangeGate<'_>) -> bool
    where
        F: FnMut(&Key, &mut TimedValue) -> EachAction,
    {
        let Some(names) = self.keys_from(from) else {
            return false;
        };
        if names.is_empty() {
            return false;
        }

        for name in names {
            let key = Key::Name(name.clone());
            let Some(current) = self.values.get(&name) else {
                continue;
            };
            let mut edited = current.clone();
            let action = on_item(&key, &mut edited);

            if action.is_erase() {
                if gate_allows(gate, &key, current, &TimedValue::default()) {
                    self.values.remove(&name);
                }
            } else if edited != *current && gate_allows(gate, &key, current, &edited) {
                self.values.insert(name, edited);
            }

            if action.is_stop() {
                break;
            }
        }
        true
    }

    pub fn set(&mut self, key: &Key, value: TimedValue, gate: ChangeGate<'_>) -> (bool, TimedValue) {
        let Some(name) = name_of(key) else {
            return (false, TimedValue::default());
        };

        match self.values.get_mut(name) {
            Some(current) => {
                if *current == value || !gate_allows(gate, key, current, &value) {
                    return (false, current.clone());
                }
                (true, std::mem::replace(current, value))
            }
            None => {
                let vacant = TimedValue::default();
                if vacant == value || !gate_allows(gate, key, &vacant, &value) {
                    return (false, vacant);
                }
                self.values.insert(name.to_string(), value);
                (true, vacant)
            }
        }
    }

    pub fn emplace(&mut self, key: &Key, value: TimedValue, gate: ChangeGate<'_>) -> Emplaced {
        let Some(name) = name_of(key) else {
            return Emplaced::failed(key.clone(), TimedValue::default());
        };
        if let Some(existing) = self.values.get(name) {
            return Emplaced::failed(key.clone(), existing.clone());
        }
        if !gate_allows(gate, key, &TimedValue::default(), &value) {
            return Emplaced::failed(key.clone(), TimedValue::default());
        }
        self.values.insert(name.to_string(), value);
        Emplaced::ok(key.clone())
    }

    pub fn erase(&mut self, key: &Key, gate: ChangeGate<'_>) -> Option<TimedValue> {
        let name = name_of(key)?;
        let current = self.values.get(name)?;
        if !gate_allows(gate, key, current, &TimedValue::default()) {
            return None;
        }
        self.values.remove(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
