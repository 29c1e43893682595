//! Values carrying their write timestamp.
//!
//! Every slot in a container holds a [`TimedValue`]: the [`Value`] plus the
//! logical tick it was written at. A default-constructed `TimedValue` carries
//! [`ABSENT_TIMESTAMP`] ("never written"); an *empty* value with a real
//! timestamp is a tombstone, the marker an erased slot leaves behind in a
//! map that remembers erasures.

use std::ops::Deref;

use chrono::{DateTime, Utc};

use crate::clock;
use crate::constants::{ABSENT_TIMESTAMP, TICKS_PER_SECOND};
use crate::value::{Value, impl_primitive_eq};

/// A [`Value`] plus its write tick.
///
/// Equality compares the values only; timestamps are ignored.
#[derive(Debug, Clone)]
pub struct TimedValue {
    value: Value,
    timestamp: i64,
}

impl TimedValue {
    /// Wrap `value`, stamping it with the next unique tick.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            timestamp: clock::timestamp(),
        }
    }

    pub fn with_timestamp(value: impl Into<Value>, timestamp: i64) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }

    /// An empty value stamped now: the erasure marker.
    pub fn tombstone() -> Self {
        Self::new(Value::Empty)
    }

    pub fn is_tombstone(&self) -> bool {
        !self.value.is_set() && !self.time_is_absent()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn time_is_absent(&self) -> bool {
        self.timestamp == ABSENT_TIMESTAMP
    }

    /// Ticks since this value was written; `0` if it never was.
    ///
    /// Measured against a fresh unique tick, so the result is strictly
    /// positive for any written value.
    pub fn time_elapsed(&self) -> i64 {
        if self.time_is_absent() {
            0
        } else {
            clock::timestamp() - self.timestamp
        }
    }

    /// Re-stamp as if written `elapsed` ticks from now (negative values move
    /// the stamp into the past). Passing [`ABSENT_TIMESTAMP`] clears it.
    ///
    /// Returns the elapsed time of the previous stamp, or
    /// [`ABSENT_TIMESTAMP`] if there was none.
    pub fn time_reset(&mut self, elapsed: i64) -> i64 {
        let next = if elapsed == ABSENT_TIMESTAMP {
            ABSENT_TIMESTAMP
        } else {
            clock::timestamp() + elapsed
        };
        let prev = std::mem::replace(&mut self.timestamp, next);
        if prev == ABSENT_TIMESTAMP {
            prev
        } else {
            clock::timestamp() - prev
        }
    }

    /// Replace the value and take a fresh stamp.
    pub fn assign(&mut self, value: impl Into<Value>) {
        self.value = value.into();
        self.timestamp = clock::timestamp();
    }

    /// Wall-clock time of the write, if the stamp is present and representable.
    pub fn written_at(&self) -> Option<DateTime<Utc>> {
        if self.time_is_absent() {
            return None;
        }
        DateTime::from_timestamp_micros(self.timestamp / 10)
    }

    pub fn ticks_per_second() -> i64 {
        TICKS_PER_SECOND
    }

    pub fn msec_to_ticks(msec: f64) -> i64 {
        (msec * TICKS_PER_SECOND as f64 / 1000.0) as i64
    }

    pub fn ticks_to_msec(ticks: i64) -> f64 {
        ticks as f64 / TICKS_PER_SECOND as f64 * 1000.0
    }
}

impl Default for TimedValue {
    fn default() -> Self {
        Self {
            value: Value::Empty,
            timestamp: ABSENT_TIMESTAMP,
        }
    }
}

impl Deref for TimedValue {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.value
    }
}

impl AsRef<Value> for TimedValue {
    fn as_ref(&self) -> &Value {
        &self.value
    }
}

impl PartialEq for TimedValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<Value> for TimedValue {
    fn eq(&self, other: &Value) -> bool {
        self.value == *other
    }
}

impl PartialEq<TimedValue> for Value {
    fn eq(&self, other: &TimedValue) -> bool {
        *self == other.value
    }
}

impl From<Value> for TimedValue {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl_primitive_eq!(TimedValue);
