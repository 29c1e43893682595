//! Logical clock for write timestamps
//!
//! Every write into a container is stamped with a tick taken from a
//! process-wide [`UniqueClock`]. Ticks are 100 ns units since the Unix epoch,
//! and the clock guarantees each call returns a value strictly greater than
//! every value returned before it, from any thread.
//!
//! The [`Clock`] trait abstracts over the underlying time source, allowing
//! production code to use the system time while tests can use a
//! controllable [`FixedClock`] (feature `testing`).
//!
//! # Example
//!
//! ```
//! use arbor::clock;
//!
//! let a = clock::timestamp();
//! let b = clock::timestamp();
//! assert!(b > a);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(any(test, feature = "testing"))]
use std::sync::{Mutex, PoisonError};

use crate::constants::TICKS_PER_SECOND;

/// A time provider measured in 100 ns ticks.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as ticks since the Unix epoch.
    fn now_ticks(&self) -> i64;

    /// Returns the current time as milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64 {
        self.now_ticks() / (TICKS_PER_SECOND / 1000)
    }
}

/// Production clock using the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ticks(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_nanos() / 100) as i64)
            .unwrap_or(0)
    }
}

/// Lock-free monotonic sequencer.
///
/// `next(t)` returns `t` when it is ahead of everything issued so far, and
/// otherwise the smallest value above the last issued one. Uniqueness holds
/// across threads: each call first reserves a slot with `fetch_add` and then
/// publishes its result with a compare-and-swap retry loop.
#[derive(Debug)]
pub struct Monotonic {
    prev: AtomicI64,
}

impl Monotonic {
    pub const fn new() -> Self {
        Self {
            prev: AtomicI64::new(i64::MIN),
        }
    }

    pub fn next(&self, t: i64) -> i64 {
        let mut expected = self.prev.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        let mut candidate = t.max(expected);
        loop {
            match self.prev.compare_exchange_weak(
                expected,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return candidate,
                Err(actual) => {
                    expected = actual;
                    candidate = candidate.max(actual.wrapping_add(1));
                }
            }
        }
    }

    /// Last value handed out (or `i64::MIN` before the first call).
    pub fn last(&self) -> i64 {
        self.prev.load(Ordering::SeqCst)
    }
}

impl Default for Monotonic {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Clock`] paired with a [`Monotonic`] sequencer.
///
/// The result of [`UniqueClock::timestamp`] follows the wall clock when it
/// moves forward and never repeats or goes backwards when it does not.
#[derive(Debug)]
pub struct UniqueClock<C: Clock = SystemClock> {
    clock: C,
    sequence: Monotonic,
}

impl UniqueClock<SystemClock> {
    pub const fn system() -> Self {
        Self {
            clock: SystemClock,
            sequence: Monotonic::new(),
        }
    }
}

impl<C: Clock> UniqueClock<C> {
    /// Wrap an arbitrary clock, e.g. a [`FixedClock`] in tests.
    #[cfg(any(test, feature = "testing"))]
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            sequence: Monotonic::new(),
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.sequence.next(self.clock.now_ticks())
    }

    /// The underlying time source.
    pub fn source(&self) -> &C {
        &self.clock
    }
}

impl Default for UniqueClock<SystemClock> {
    fn default() -> Self {
        Self::system()
    }
}

static GLOBAL: UniqueClock<SystemClock> = UniqueClock::system();

/// Next process-wide unique tick.
pub fn timestamp() -> i64 {
    GLOBAL.timestamp()
}

/// Current wall-clock tick, without reserving a unique value.
pub fn now() -> i64 {
    GLOBAL.source().now_ticks()
}

/// Test clock with auto-advancing time.
///
/// This clock auto-advances by one tick on each `now_ticks()` call. Use
/// `hold()` to temporarily freeze it for tests needing stable readings.
///
/// # Example
///
/// ```
/// # #[cfg(feature = "testing")] {
/// use arbor::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1000);
/// let t1 = clock.now_ticks();
/// let t2 = clock.now_ticks();
/// assert!(t2 > t1);
///
/// {
///     let _hold = clock.hold();
///     assert_eq!(clock.now_ticks(), clock.now_ticks());
/// }
/// # }
/// ```
#[cfg(any(test, feature = "testing"))]
pub struct FixedClock {
    state: Mutex<FixedClockState>,
}

#[cfg(any(test, feature = "testing"))]
struct FixedClockState {
    ticks: i64,
    held: bool,
}

/// RAII guard that freezes a [`FixedClock`] while held.
#[cfg(any(test, feature = "testing"))]
pub struct ClockHold<'a>(&'a FixedClock);

#[cfg(any(test, feature = "testing"))]
impl Drop for ClockHold<'_> {
    fn drop(&mut self) {
        self.0.state().held = false;
    }
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    pub fn new(ticks: i64) -> Self {
        Self {
            state: Mutex::new(FixedClockState { ticks, held: false }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FixedClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold the clock, preventing auto-advance until the guard is dropped.
    pub fn hold(&self) -> ClockHold<'_> {
        self.state().held = true;
        ClockHold(self)
    }

    pub fn advance(&self, ticks: i64) {
        self.state().ticks += ticks;
    }

    pub fn set(&self, ticks: i64) {
        self.state().ticks = ticks;
    }

    /// Get the current time without advancing (even if not held).
    pub fn get(&self) -> i64 {
        self.state().ticks
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now_ticks(&self) -> i64 {
        let mut state = self.state();
        if state.held {
            state.ticks
        } else {
            let t = state.ticks;
            state.ticks += 1;
            t
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200 * TICKS_PER_SECOND)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("FixedClock")
            .field("ticks", &state.ticks)
            .field("held", &state.held)
            .finish()
    }
}
