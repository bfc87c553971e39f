//! Test-only helpers. Not gated behind `#[cfg(test)]` because integration
//! tests under `tests/` need them too, same as the teacher crates expose
//! `init_test_logging()`-style helpers from their main tree.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::clock::Clock;

/// A [`Clock`] that only moves when told to. Used to exercise reap behavior
/// without sleeping a real thread for the timeout duration.
pub struct FakeClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}
