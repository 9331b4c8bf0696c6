//! Microsecond time source for the receive deadline.

use std::cell::Cell;
use std::time::Instant;

pub trait Clock {
    /// Microseconds since an arbitrary fixed origin; wraps like a hardware counter.
    fn now_us(&self) -> u64;
}

/// Wall clock based on `Instant`.
#[derive(Debug, Clone, Copy)]
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
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Deterministic clock: every reading advances by a fixed tick.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    tick: u64,
}

impl ManualClock {
    pub fn new(start_us: u64, tick_us: u64) -> Self {
        Self {
            now: Cell::new(start_us),
            tick: tick_us,
        }
    }

    pub fn advance(&self, us: u64) {
        self.now.set(self.now.get().wrapping_add(us));
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.tick));
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}
