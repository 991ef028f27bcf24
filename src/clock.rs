//! Time sources and the shared countdown tick.
//!
//! Every countdown on screen is driven by one [`Ticker`]; items never own
//! timers of their own.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use time::OffsetDateTime;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: time::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, at: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    pub seq: u64,
    pub at: OffsetDateTime,
}

/// Periodic tick polled from the UI loop.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next_due: Instant,
    seq: u64,
}

impl Ticker {
    pub fn new(start: Instant) -> Self {
        Self::with_period(start, TICK_PERIOD)
    }

    pub fn with_period(start: Instant, period: Duration) -> Self {
        Self {
            period,
            next_due: start,
            seq: 0,
        }
    }

    /// Yields at most one tick per call. A loop that fell behind gets a single
    /// tick and is rescheduled from `instant`, never a burst of catch-up ticks.
    pub fn poll(&mut self, instant: Instant, clock: &dyn Clock) -> Option<Tick> {
        if instant < self.next_due {
            return None;
        }
        self.seq += 1;
        self.next_due += self.period;
        if self.next_due <= instant {
            self.next_due = instant + self.period;
        }
        Some(Tick {
            seq: self.seq,
            at: clock.now(),
        })
    }

    pub fn until_next(&self, instant: Instant) -> Duration {
        self.next_due.saturating_duration_since(instant)
    }

    pub fn ticks(&self) -> u64 {
        self.seq
    }
}

#[cfg(test)]
#[path = "tests/clock_tests.rs"]
mod tests;
