//! Change listeners with commit/rollback replay.
//!
//! Listeners are kept in ascending id order. A notification runs in two
//! phases:
//!
//! 1. Every listener is called with [`Reason::Changes`] and `(from, to)`.
//!    Returning `Some(false)` vetoes the change and ends the phase.
//! 2. On a veto, every listener called before the vetoing one is called
//!    again, in the same order, with [`Reason::Rollback`] and `(to, from)`.
//!
//! A listener returning `None` is unregistered once the registry lock is
//! released. In [`Reason::ChangesNoDiscard`] mode every listener runs and
//! its verdict is ignored.
//!
//! Listeners run while the node's slot lock is held exclusively. They must
//! not call back into the same node (or its listener registry).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace};

use super::{Node, next_uid};
use crate::key::Key;
use crate::timed::TimedValue;

/// Why a listener is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// A change that the listener may veto.
    Changes,
    /// A change that will be applied regardless of the verdict.
    ChangesNoDiscard,
    /// A change this listener already accepted was vetoed by a later one;
    /// `from` and `to` are swapped.
    Rollback,
}

/// Listener callback: `Some(true)` allows, `Some(false)` vetoes, `None`
/// unregisters the listener.
pub type Listener =
    Arc<dyn Fn(Reason, &Node, &Key, &TimedValue, &TimedValue) -> Option<bool> + Send + Sync>;

#[derive(Default)]
pub struct Listeners {
    map: RwLock<BTreeMap<u64, Listener>>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

impl Listeners {
    /// Register `listener` under `id`, or under a fresh id above every
    /// existing one when `id` is 0. Re-using an id replaces the listener.
    pub fn add<F>(&self, id: u64, listener: F) -> u64
    where
        F: Fn(Reason, &Node, &Key, &TimedValue, &TimedValue) -> Option<bool> + Send + Sync + 'static,
    {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        let id = match (id, map.last_key_value()) {
            (0, Some((last, _))) => (last + 1).max(next_uid()),
            (0, None) => next_uid(),
            (id, _) => id,
        };
        map.insert(id, Arc::new(listener));
        trace!(listener = id, "registered change listener");
        id
    }

    pub fn remove(&self, id: u64) -> bool {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Drop every listener, returning how many there were.
    pub fn reset(&self) -> usize {
        std::mem::take(&mut *self.map.write().unwrap_or_else(PoisonError::into_inner)).len()
    }

    pub fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the notification protocol. Returns `false` if the change was vetoed.
    ///
    /// On a veto, every listener ahead of the vetoing one gets a rollback,
    /// including one that expired earlier in the same pass; it is removed
    /// afterwards.
    pub fn notify(
        &self,
        node: &Node,
        key: &Key,
        from: &TimedValue,
        to: &TimedValue,
        no_discard: bool,
    ) -> bool {
        let reason = if no_discard {
            Reason::ChangesNoDiscard
        } else {
            Reason::Changes
        };

        let mut expired = Vec::new();
        let mut vetoed_by = None;
        {
            let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
            if map.is_empty() {
                return true;
            }

            for (&id, listener) in map.iter() {
                match listener(reason, node, key, from, to) {
                    None => expired.push(id),
                    Some(false) if !no_discard => {
                        vetoed_by = Some(id);
                        break;
                    }
                    Some(_) => {}
                }
            }

            if let Some(veto) = vetoed_by {
                debug!(node = node.uid(), %key, listener = veto, "change vetoed, rolling back");
                for (_, listener) in map.range(..veto) {
                    listener(Reason::Rollback, node, key, to, from);
                }
            }
        }

        if !expired.is_empty() {
            let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
            for id in expired {
                map.remove(&id);
            }
        }

        vetoed_by.is_none()
    }
}
