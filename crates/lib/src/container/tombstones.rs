use std::cell::Cell;

use super::{ChangeGate, EachAction, Emplaced, MapContainer, gate_allows};
use crate::key::Key;
use crate::timed::TimedValue;

/// A [`MapContainer`] that remembers erasures.
///
/// Erasing writes a tombstone instead of removing the slot. Every write goes
/// through a gate wrapper that watches for slots moving into or out of the
/// tombstone state, so `len()` stays exact in O(1).
#[derive(Debug, Clone, Default)]
pub struct TombstoneMap {
    map: MapContainer,
    erased: usize,
}

/// Wrap `gate` so that allowed transitions are tallied into `delta`.
fn detect_erase<'g>(
    gate: ChangeGate<'g>,
    delta: &'g Cell<isize>,
) -> impl Fn(&Key, &TimedValue, &TimedValue) -> bool + 'g {
    move |key: &Key, from: &TimedValue, to: &TimedValue| {
        let allowed = gate_allows(gate, key, from, to);
        if allowed {
            match (from.is_tombstone(), to.is_tombstone()) {
                (false, true) => delta.set(delta.get() + 1),
                (true, false) => delta.set(delta.get() - 1),
                _ => {}
            }
        }
        allowed
    }
}

impl TombstoneMap {
    fn apply(&mut self, delta: &Cell<isize>) {
        let erased = self.erased as isize + delta.get();
        debug_assert!(erased >= 0 && erased as usize <= self.map.len());
        self.erased = erased.max(0) as usize;
    }

    pub fn is_key_valid(&self, key: &Key) -> bool {
        self.map.is_key_valid(key)
    }

    /// Visible entries: raw entries minus tombstones.
    pub fn len(&self) -> usize {
        self.map.len() - self.erased
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of remembered erasures.
    pub fn tombstones(&self) -> usize {
        self.erased
    }

    pub fn get(&self, key: &Key) -> Option<&TimedValue> {
        self.map.get(key)
    }

    /// Visible entries only. Returns `false` if none was visited.
    pub fn scan<F>(&self, from: Option<&Key>, mut on_item: F) -> bool
    where
        F: FnMut(&Key, &TimedValue) -> bool,
    {
        let mut visited = false;
        self.map.scan(from, |key, value| {
            if value.is_tombstone() {
                return false;
            }
            visited = true;
            on_item(key, value)
        });
        visited
    }

    /// Every entry, tombstones included.
    pub fn scan_history<F>(&self, from: Option<&Key>, on_item: F) -> bool
    where
        F: FnMut(&Key, &TimedValue) -> bool,
    {
        self.map.scan(from, on_item)
    }

    pub fn for_each_mut<F>(&mut self, from: Option<&Key>, mut on_item: F, gate: ChangeGate<'_>) -> bool
    where
        F: FnMut(&Key, &mut TimedValue) -> EachAction,
    {
        let delta = Cell::new(0);
        let detect = detect_erase(gate, &delta);
        let mut found = false;

        self.map.for_each_mut(
            from,
            |key, value| {
                if value.is_tombstone() {
                    if !found && from == Some(key) {
                        return EachAction::Stop;
                    }
                    return EachAction::Next;
                }
                found = true;

                let action = on_item(key, value);
                if action.is_erase() {
                    *value = TimedValue::tombstone();
                    return if action.is_stop() {
                        EachAction::Stop
                    } else {
                        EachAction::Next
                    };
                }
                action
            },
            Some(&detect),
        );

        self.apply(&delta);
        found
    }

    pub fn set(&mut self, key: &Key, value: TimedValue, gate: ChangeGate<'_>) -> (bool, TimedValue) {
        let delta = Cell::new(0);
        let result = self.map.set(key, value, Some(&detect_erase(gate, &delta)));
        self.apply(&delta);
        result
    }

    /// A tombstoned key counts as vacant.
    pub fn emplace(&mut self, key: &Key, value: TimedValue, gate: ChangeGate<'_>) -> Emplaced {
        let delta = Cell::new(0);
        let detect = detect_erase(gate, &delta);

        let result = if self.map.get(key).is_some_and(TimedValue::is_tombstone) {
            match self.map.set(key, value, Some(&detect)) {
                (true, _) => Emplaced::ok(key.clone()),
                (false, _) => Emplaced::failed(key.clone(), TimedValue::default()),
            }
        } else {
            self.map.emplace(key, value, Some(&detect))
        };

        self.apply(&delta);
        result
    }

    /// Replace the slot with a tombstone. Fails for absent or already
    /// erased keys.
    pub fn erase(&mut self, key: &Key, gate: ChangeGate<'_>) -> Option<TimedValue> {
        let (ok, prev) = self.set(key, TimedValue::tombstone(), gate);
        ok.then_some(prev)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.erased = 0;
    }
}
