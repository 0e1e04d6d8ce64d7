//! Single process-wide time source.
//!
//! Every timestamp recorded in a `History` comes from one `Clock`, set
//! exactly once before the first call into `ExecutionContext::run`. A second
//! registration attempt is a `Bug`, not a silent overwrite — the engine has
//! no notion of switching clocks mid-run.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::error::Bug;

/// A point in time, relative to the moment the clock was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(Duration);

impl Time {
    pub fn since_epoch(&self) -> Duration {
        self.0
    }
}

/// Supplies `Time::now()` readings. The default implementation wraps
/// `std::time::Instant`; tests substitute a deterministic source.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Time;
}

struct RealClock {
    epoch: Instant,
}

impl TimeSource for RealClock {
    fn now(&self) -> Time {
        Time(self.epoch.elapsed())
    }
}

static CLOCK: OnceLock<Box<dyn TimeSource>> = OnceLock::new();

/// Registers the process-wide clock. Must be called at most once.
pub fn set_clock(source: Box<dyn TimeSource>) -> Result<(), Bug> {
    CLOCK
        .set(source)
        .map_err(|_| Bug::new("clock already registered"))
}

/// Registers the default wall-clock source. Convenience wrapper around
/// `set_clock` for callers that don't need a fake.
pub fn set_real_clock() -> Result<(), Bug> {
    set_clock(Box::new(RealClock {
        epoch: Instant::now(),
    }))
}

/// Reads the current time. Panics (as a `Bug` would) if no clock has been
/// registered — this is an engine setup error, not a recoverable one.
pub fn now() -> Time {
    CLOCK
        .get()
        .expect("clock not registered: call set_clock/set_real_clock before run()")
        .now()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::Cell;
    use std::sync::Mutex;

    /// A clock that advances by a fixed step on every read, for tests that
    /// need monotonic-but-controlled timestamps without real sleeps.
    pub struct SteppingClock {
        next: Mutex<Cell<Duration>>,
        step: Duration,
    }

    impl SteppingClock {
        pub fn new(step: Duration) -> Self {
            SteppingClock {
                next: Mutex::new(Cell::new(Duration::ZERO)),
                step,
            }
        }
    }

    impl TimeSource for SteppingClock {
        fn now(&self) -> Time {
            let guard = self.next.lock().unwrap();
            let t = guard.get();
            guard.set(t + self.step);
            Time(t)
        }
    }
}
