//! Translation of node-level keys into container keys.

use crate::constants::IDX_LAST;
use crate::container::{Container, ContainerKind};
use crate::key::Key;

/// Map `key` onto the addressing of `slots`.
///
/// With `positional` set, an index addressing a map selects the name of the
/// n-th visible entry (`IDX_LAST` the final one) and resolves to
/// [`Key::Empty`] when out of range. Everything else passes through.
pub(crate) fn container_key(slots: &Container, key: &Key, positional: bool) -> Key {
    let Key::Index(idx) = key else {
        return key.clone();
    };
    if !positional || slots.kind() != ContainerKind::Map {
        return key.clone();
    }

    let len = slots.len();
    let mut remaining = if *idx == IDX_LAST && len > 0 {
        len - 1
    } else if *idx >= len {
        return Key::Empty;
    } else {
        *idx
    };

    let mut found = Key::Empty;
    slots.scan(None, |name, _| {
        if remaining == 0 {
            found = name.clone();
            return true;
        }
        remaining -= 1;
        false
    });
    found
}
