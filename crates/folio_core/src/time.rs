//! Clocks and timing windows
//!
//! Timers are modelled as plain state machines over a monotonic [`Clock`]
//! instead of callbacks. The frame driver polls them with the current time,
//! which makes every debounce, interval and audit window deterministic under a
//! [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic time source, measured from an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Shared clock handle injected into providers and services
pub type SharedClock = Rc<dyn Clock>;

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, to: Duration) {
        if to > self.now.get() {
            self.now.set(to);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Trailing-edge debounce: fires once `wait` after the last trigger
#[derive(Debug, Clone, Copy)]
pub struct Debounce {
    wait: Duration,
    deadline: Option<Duration>,
}

impl Debounce {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            deadline: None,
        }
    }

    /// (Re)start the wait window
    pub fn trigger(&mut self, now: Duration) {
        self.deadline = Some(now + self.wait);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once when the window has elapsed
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Fixed-period repeating timer
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period: Duration,
    next: Option<Duration>,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub fn start(&mut self, now: Duration) {
        self.next = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of periods that elapsed since the last poll
    pub fn poll(&mut self, now: Duration) -> u32 {
        let Some(mut next) = self.next else {
            return 0;
        };
        if self.period.is_zero() {
            return 0;
        }

        let mut fired = 0;
        while now >= next {
            fired += 1;
            next += self.period;
        }
        self.next = Some(next);
        fired
    }
}

/// Audit window: the first value opens a window, the latest
/// value seen inside it is released when the window closes.
#[derive(Debug, Clone)]
pub struct Audit<T> {
    window: Duration,
    pending: Option<(Duration, T)>,
}

impl<T> Audit<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Duration) {
        match &mut self.pending {
            Some((_, slot)) => *slot = value,
            None => self.pending = Some((now, value)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self, now: Duration) -> Option<T> {
        match &self.pending {
            Some((opened, _)) if now >= *opened + self.window => {
                self.pending.take().map(|(_, value)| value)
            }
            _ => None,
        }
    }
}
