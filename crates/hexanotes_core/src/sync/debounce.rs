//! Debounce timer with an injectable clock.
//!
//! # Responsibility
//! - Coalesce bursts of mutations into one push after a quiet period.
//!
//! # Invariants
//! - Scheduling again before the delay elapses restarts the timer.
//! - The pending deadline is the only cancellable unit in the sync layer.

use std::time::{Duration, Instant};

/// Time source abstraction so tests can drive the debounce deterministically.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Timer owning the push delay deadline.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms (or re-arms) the timer relative to `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drops any pending deadline.
    pub fn cancel_pending(&mut self) {
        self.deadline = None;
    }

    /// Returns whether a deadline is armed.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns whether the quiet period has elapsed.
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }
}
