use std::collections::VecDeque;

use super::{ChangeGate, EachAction, Emplaced, gate_allows};
use crate::constants::{IDX_END, IDX_LAST, MAX_AUTO_GROW};
use crate::key::Key;
use crate::timed::TimedValue;

/// Index-addressed sequence.
///
/// `IDX_END` means "append" and never addresses an element; `IDX_LAST`
/// addresses the final element, or index 0 when there is at most one.
/// `set` past the end grows the sequence with empty slots, at most
/// [`MAX_AUTO_GROW`] per call.
#[derive(Debug, Clone, Default)]
pub struct ArrayContainer {
    values: VecDeque<TimedValue>,
}

impl ArrayContainer {
    fn index_of(&self, key: &Key) -> Option<usize> {
        match key.as_index()? {
            IDX_LAST => Some(if self.values.len() > 1 {
                self.values.len() - 1
            } else {
                0
            }),
            idx => Some(idx),
        }
    }

    /// Index of an existing element.
    fn find(&self, key: &Key) -> Option<usize> {
        self.index_of(key)
            .filter(|&idx| idx != IDX_END && idx < self.values.len())
    }

    pub fn is_key_valid(&self, key: &Key) -> bool {
        key.is_index()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&TimedValue> {
        self.find(key).map(|idx| &self.values[idx])
    }

    pub fn scan<F>(&self, from: Option<&Key>, mut on_item: F) -> bool
    where
        F: FnMut(&Key, &TimedValue) -> bool,
    {
        let start = match from {
            Some(key) => match self.find(key) {
                Some(idx) => idx,
                None => return false,
            },
            None => 0,
        };
        if start >= self.values.len() {
            return false;
        }

        for (idx, value) in self.values.iter().enumerate().skip(start) {
            if on_item(&Key::Index(idx), value) {
                break;
            }
        }
        true
    }

    pub fn for_each_mut<F>(&mut self, from: Option<&Key>, mut on_item: F, gate: ChangeGate<'_>) -> bool
    where
        F: FnMut(&Key, &mut TimedValue) -> EachAction,
    {
        let mut idx = match from {
            Some(key) => match self.find(key) {
                Some(idx) => idx,
                None => return false,
            },
            None => 0,
        };
        if idx >= self.values.len() {
            return false;
        }

        while idx < self.values.len() {
            let key = Key::Index(idx);
            let mut edited = self.values[idx].clone();
            let action = on_item(&key, &mut edited);

            if action.is_erase() && gate_allows(gate, &key, &self.values[idx], &TimedValue::default()) {
                self.values.remove(idx);
            } else {
                if edited != self.values[idx] && gate_allows(gate, &key, &self.values[idx], &edited) {
                    self.values[idx] = edited;
                }
                idx += 1;
            }

            if action.is_stop() {
                break;
            }
        }
        true
    }

    pub fn set(&mut self, key: &Key, value: TimedValue, gate: ChangeGate<'_>) -> (bool, TimedValue) {
        let Some(idx) = self.index_of(key) else {
            return (false, TimedValue::default());
        };
        if idx == IDX_END {
            return (false, TimedValue::default());
        }

        let len = self.values.len();
        if idx >= len && idx - len >= MAX_AUTO_GROW {
            return (false, TimedValue::default());
        }

        let vacant = TimedValue::default();
        let current = self.values.get(idx).unwrap_or(&vacant);
        if *current == value {
            return (false, current.clone());
        }
        if !gate_allows(gate, key, current, &value) {
            return (false, current.clone());
        }

        if idx >= len {
            self.values.resize_with(idx, TimedValue::default);
            self.values.push_back(value);
            return (true, TimedValue::default());
        }
        (true, std::mem::replace(&mut self.values[idx], value))
    }

    pub fn emplace(&mut self, key: &Key, value: TimedValue, gate: ChangeGate<'_>) -> Emplaced {
        let pos = match key {
            Key::Empty => self.values.len(),
            Key::Index(_) => match self.index_of(key) {
                Some(idx) if idx < self.values.len() => idx,
                _ => self.values.len(),
            },
            Key::Name(_) => return Emplaced::failed(key.clone(), TimedValue::default()),
        };

        let landing = Key::Index(pos);
        let vacant = TimedValue::default();
        let current = self.values.get(pos).unwrap_or(&vacant);
        if !gate_allows(gate, &landing, current, &value) {
            return Emplaced::failed(key.clone(), current.clone());
        }

        self.values.insert(pos, value);
        Emplaced::ok(landing)
    }

    pub fn erase(&mut self, key: &Key, gate: ChangeGate<'_>) -> Option<TimedValue> {
        let idx = self.find(key)?;
        if !gate_allows(gate, &Key::Index(idx), &self.values[idx], &TimedValue::default()) {
            return None;
        }
        self.values.remove(idx)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
