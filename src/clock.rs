//! Time sources
//!
//! The scheduler never reads wall-clock time directly; it goes through the
//! `Clock` trait so tests can drive a virtual clock deterministically.
//! Times are monotonic seconds as `f64`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// A monotonic time source.
pub trait Clock {
    /// Seconds since an arbitrary fixed origin. Never decreases.
    fn now(&self) -> f64;
}

/// Real time, measured from construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually-advanced time for tests.
///
/// Clones share the same underlying instant, so a test can hold one handle
/// to advance time while the scheduler owns another.
#[derive(Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<f64>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `secs`.
    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }

    /// Jump to an absolute time. Only moves forward.
    pub fn set(&self, secs: f64) {
        if secs > self.now.get() {
            self.now.set(secs);
        }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
